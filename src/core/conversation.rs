//! Conversation state for a single session.
//!
//! The log keeps one replaceable system instruction plus the ordered
//! user/assistant turns. Providers always see `[system, *turns]`; the system
//! message is never stored among the turns, so it can not be duplicated.

use crate::core::message::{Message, Role};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are an expert coding assistant helping developers with terminal-based tasks. Provide clear, concise, and accurate code solutions.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    system_instruction: String,
    turns: Vec<Message>,
}

/// On-disk shape of a saved conversation.
#[derive(Debug, Serialize, Deserialize)]
struct ConversationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    system_message: Option<String>,
    #[serde(default)]
    messages: Vec<Message>,
}

#[derive(Debug)]
pub enum ConversationError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// The record parsed but holds something a conversation can not contain.
    Format { path: PathBuf, message: String },
}

impl fmt::Display for ConversationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationError::Io { path, source } => {
                write!(f, "Failed to access {}: {}", path.display(), source)
            }
            ConversationError::Parse { path, source } => {
                write!(f, "Failed to parse {}: {}", path.display(), source)
            }
            ConversationError::Format { path, message } => {
                write!(f, "Invalid conversation in {}: {}", path.display(), message)
            }
        }
    }
}

impl StdError for ConversationError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConversationError::Io { source, .. } => Some(source),
            ConversationError::Parse { source, .. } => Some(source),
            ConversationError::Format { .. } => None,
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::with_system_instruction(DEFAULT_SYSTEM_INSTRUCTION)
    }

    pub fn with_system_instruction(instruction: impl Into<String>) -> Self {
        Self {
            system_instruction: instruction.into(),
            turns: Vec::new(),
        }
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn set_system_instruction(&mut self, instruction: impl Into<String>) {
        self.system_instruction = instruction.into();
    }

    pub fn add_user(&mut self, content: impl Into<String>) {
        self.turns.push(Message::user(content));
    }

    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Message::assistant(content));
    }

    /// Turns in chronological order, without the system message.
    pub fn turns(&self) -> &[Message] {
        &self.turns
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Full sequence handed to a provider: the system message followed by every turn.
    pub fn messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.turns.len() + 1);
        messages.push(Message::system(self.system_instruction.clone()));
        messages.extend(self.turns.iter().cloned());
        messages
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Pops the most recent turn. Only used to roll back a failed generation.
    pub fn remove_last(&mut self) -> Option<Message> {
        self.turns.pop()
    }

    pub fn save(&self, path: &Path) -> Result<(), ConversationError> {
        let io_error = |source| ConversationError::Io {
            path: path.to_path_buf(),
            source,
        };

        let record = ConversationRecord {
            system_message: Some(self.system_instruction.clone()),
            messages: self.turns.clone(),
        };
        let contents =
            serde_json::to_string_pretty(&record).map_err(|source| ConversationError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());
        if let Some(dir) = parent {
            fs::create_dir_all(dir).map_err(io_error)?;
        }

        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new_in("."),
        }
        .map_err(io_error)?;
        temp_file.write_all(contents.as_bytes()).map_err(io_error)?;
        temp_file.as_file_mut().sync_all().map_err(io_error)?;
        temp_file
            .persist(path)
            .map_err(|err| io_error(err.error))?;
        Ok(())
    }

    /// Replaces this conversation with the record stored at `path`.
    ///
    /// Nothing is modified unless the whole record is valid.
    pub fn load(&mut self, path: &Path) -> Result<(), ConversationError> {
        let contents = fs::read_to_string(path).map_err(|source| ConversationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let record: ConversationRecord =
            serde_json::from_str(&contents).map_err(|source| ConversationError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(position) = record.messages.iter().position(|m| m.role == Role::System) {
            return Err(ConversationError::Format {
                path: path.to_path_buf(),
                message: format!("message {} has the system role", position + 1),
            });
        }

        if let Some(system_message) = record.system_message {
            self.system_instruction = system_message;
        }
        self.turns = record.messages;
        Ok(())
    }
}
