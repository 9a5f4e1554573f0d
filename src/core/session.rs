//! Session controller.
//!
//! Reads one input at a time, runs slash commands, and sends chat turns to the
//! active adapter. A failed generation removes the user turn that triggered it
//! so the conversation never holds a question without an answer.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::commands::{process_input, ParsedInput, SlashCommand};
use crate::core::adapters::{ChatProvider, ProviderError};
use crate::core::conversation::Conversation;
use crate::core::providers::{ProviderResolver, ResolveError};

/// One read from the input source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    /// The user pressed Ctrl-C while typing.
    Interrupted,
    /// No more input will arrive.
    Eof,
}

pub trait InputSource {
    fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent>;
}

/// Where the session reports to. Every call must reach the user before the
/// next one, and [`fragment`](OutputSink::fragment) must flush.
pub trait OutputSink {
    fn info(&mut self, text: &str);
    fn success(&mut self, text: &str);
    fn warning(&mut self, text: &str);
    fn error(&mut self, text: &str);
    fn markdown(&mut self, text: &str);
    fn assistant_header(&mut self, provider: &str, model: &str);
    fn fragment(&mut self, text: &str);
    fn end_response(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingInput,
    Dispatching,
    Generating,
    Ended,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub provider: String,
    /// Model named at startup; reused when switching providers.
    pub model: Option<String>,
    pub streaming: bool,
    pub conversation: Conversation,
}

impl SessionOptions {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: None,
            streaming: true,
            conversation: Conversation::new(),
        }
    }
}

pub const PROMPT: &str = "You: ";
const EXIT_REMINDER: &str = "Use /exit or /quit to leave the session.";

pub struct Session<R: ProviderResolver> {
    resolver: R,
    conversation: Conversation,
    provider: String,
    model_override: Option<String>,
    adapter: Box<dyn ChatProvider>,
    streaming: bool,
    state: SessionState,
}

impl<R: ProviderResolver> Session<R> {
    /// Resolves the initial provider. Failure here is fatal for the caller.
    pub fn start(resolver: R, options: SessionOptions) -> Result<Self, ResolveError> {
        let provider = options.provider.trim().to_lowercase();
        let model_override = options.model.filter(|model| !model.trim().is_empty());
        let adapter = resolver.resolve(&provider, model_override.as_deref())?;
        debug!(provider = %provider, model = adapter.model(), streaming = options.streaming, "Session started");

        Ok(Self {
            resolver,
            conversation: options.conversation,
            provider,
            model_override,
            adapter,
            streaming: options.streaming,
            state: SessionState::AwaitingInput,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn model(&self) -> &str {
        self.adapter.model()
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Runs until an exit command or end of input.
    pub async fn run(
        &mut self,
        input: &mut dyn InputSource,
        output: &mut dyn OutputSink,
    ) -> io::Result<()> {
        while self.state != SessionState::Ended {
            let event = input.read_line(PROMPT)?;
            self.handle_event(event, output).await;
        }
        Ok(())
    }

    pub async fn handle_event(&mut self, event: InputEvent, output: &mut dyn OutputSink) {
        match event {
            InputEvent::Line(line) => self.handle_line(&line, output).await,
            InputEvent::Interrupted => output.warning(EXIT_REMINDER),
            InputEvent::Eof => {
                debug!("Input closed");
                self.state = SessionState::Ended;
            }
        }
    }

    pub async fn handle_line(&mut self, line: &str, output: &mut dyn OutputSink) {
        match process_input(line) {
            ParsedInput::Empty => {}
            ParsedInput::Chat(text) => self.chat_turn(text, output).await,
            ParsedInput::Command(command) => {
                self.state = SessionState::Dispatching;
                self.dispatch(command, output);
            }
            ParsedInput::Usage(err) => output.error(&err.to_string()),
            ParsedInput::Unknown(name) => output.error(&format!(
                "Unknown command: {name}. Type /help for available commands."
            )),
        }

        if self.state != SessionState::Ended {
            self.state = SessionState::AwaitingInput;
        }
    }

    fn dispatch(&mut self, command: SlashCommand, output: &mut dyn OutputSink) {
        debug!(?command, "Dispatching command");
        match command {
            SlashCommand::Exit => self.state = SessionState::Ended,
            SlashCommand::Help => output.markdown(&crate::ui::help::help_md()),
            SlashCommand::Clear => {
                self.conversation.clear();
                output.success("Conversation cleared.");
            }
            SlashCommand::Provider(name) => self.switch_provider(&name, output),
            SlashCommand::Model(model) => self.switch_model(&model, output),
            SlashCommand::System(None) => {
                output.info(&format!(
                    "System instruction: {}",
                    self.conversation.system_instruction()
                ));
            }
            SlashCommand::System(Some(text)) => {
                self.conversation.set_system_instruction(text);
                output.success("System instruction updated.");
            }
            SlashCommand::Save(path) => {
                let path = path.unwrap_or_else(default_save_path);
                self.save(&path, output);
            }
            SlashCommand::Load(path) => self.load(&path, output),
            SlashCommand::Status => self.report_status(output),
        }
    }

    fn switch_provider(&mut self, name: &str, output: &mut dyn OutputSink) {
        match self.resolver.resolve(name, self.model_override.as_deref()) {
            Ok(adapter) => {
                self.provider = name.to_string();
                self.adapter = adapter;
                output.success(&format!(
                    "Switched to provider {} (model: {})",
                    self.provider,
                    self.adapter.model()
                ));
            }
            Err(err) => {
                warn!(provider = name, error = %err, "Provider switch failed");
                output.error(&err.to_string());
            }
        }
    }

    fn switch_model(&mut self, model: &str, output: &mut dyn OutputSink) {
        match self.resolver.resolve(&self.provider, Some(model)) {
            Ok(adapter) => {
                self.adapter = adapter;
                output.success(&format!("Switched to model {}", self.adapter.model()));
            }
            Err(err) => output.error(&err.to_string()),
        }
    }

    fn save(&self, path: &Path, output: &mut dyn OutputSink) {
        match self.conversation.save(path) {
            Ok(()) => output.success(&format!("Conversation saved to {}", path.display())),
            Err(err) => output.error(&format!("Could not save conversation: {err}")),
        }
    }

    fn load(&mut self, path: &Path, output: &mut dyn OutputSink) {
        match self.conversation.load(path) {
            Ok(()) => output.success(&format!(
                "Loaded {} messages from {}",
                self.conversation.turn_count(),
                path.display()
            )),
            Err(err) => output.error(&format!("Could not load conversation: {err}")),
        }
    }

    fn report_status(&self, output: &mut dyn OutputSink) {
        let mode = if self.streaming { "streaming" } else { "blocking" };
        output.info(&format!(
            "Provider: {} | Model: {} | Mode: {} | Messages: {}",
            self.provider,
            self.adapter.model(),
            mode,
            self.conversation.turn_count()
        ));
    }

    async fn chat_turn(&mut self, text: String, output: &mut dyn OutputSink) {
        let turns_before = self.conversation.turn_count();
        self.conversation.add_user(text);
        self.state = SessionState::Generating;

        match self.generate(output).await {
            Ok(reply) => self.conversation.add_assistant(reply),
            Err(err) => {
                warn!(provider = %self.provider, error = %err, "Generation failed, rolling back turn");
                self.conversation.remove_last();
                debug_assert_eq!(self.conversation.turn_count(), turns_before);
                output.error(&format!("Error: {err}"));
            }
        }
    }

    async fn generate(&self, output: &mut dyn OutputSink) -> Result<String, ProviderError> {
        let messages = self.conversation.messages();

        if !self.streaming {
            let reply = self.adapter.generate_response(&messages).await?;
            output.assistant_header(&self.provider, self.adapter.model());
            output.markdown(&reply);
            return Ok(reply);
        }

        let mut stream = self.adapter.generate_stream(&messages).await?;
        output.assistant_header(&self.provider, self.adapter.model());
        let mut reply = String::new();
        let mut failure = None;
        while let Some(fragment) = stream.next().await {
            match fragment {
                Ok(fragment) => {
                    output.fragment(&fragment);
                    reply.push_str(&fragment);
                }
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        drop(stream);
        output.end_response();

        match failure {
            Some(err) => Err(err),
            None => Ok(reply),
        }
    }
}

fn default_save_path() -> PathBuf {
    PathBuf::from(format!(
        "awb-conversation-{}.json",
        Local::now().format("%Y-%m-%d")
    ))
}
