//! Single-line terminal editor used as the session's input source.
//!
//! On a terminal the editor runs in raw mode with history, word deletion,
//! and bracketed paste. Otherwise lines are read from stdin as they come.

use crate::core::session::{InputEvent, InputSource};
use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::io::{self, BufRead, IsTerminal, Write};
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineEditorState {
    pub text: String,
    pub cursor: usize,
    /// Position in history while browsing with Up/Down.
    pub history_index: Option<usize>,
    /// Text typed before history browsing began.
    pub draft: String,
}

impl LineEditorState {
    pub fn with_text(text: String) -> Self {
        let cursor = text.chars().count();
        Self {
            text,
            cursor,
            ..Self::default()
        }
    }

    fn replace_text(&mut self, text: String) {
        self.cursor = text.chars().count();
        self.text = text;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEditAction {
    Insert(char),
    Backspace,
    Delete,
    MoveLeft,
    MoveRight,
    MoveStart,
    MoveEnd,
    DeleteToEnd,
    DeleteWord,
    ClearAll,
    HistoryPrev,
    HistoryNext,
    Paste(String),
    Submit,
    Interrupt,
    EndOfInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEditOutcome {
    Continue { redraw: bool },
    Submit(String),
    Interrupted,
    Eof,
}

/// Interactive input with in-memory history.
#[derive(Debug, Default)]
pub struct LineEditor {
    history: Vec<String>,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    fn remember(&mut self, line: &str) {
        if line.trim().is_empty() || self.history.last().is_some_and(|last| last == line) {
            return;
        }
        self.history.push(line.to_string());
    }

    fn read_interactive(&mut self, prompt: &str) -> io::Result<InputEvent> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, event::EnableBracketedPaste)?;

        let result = (|| -> io::Result<InputEvent> {
            let mut state = LineEditorState::default();
            let mut needs_redraw = true;

            loop {
                if needs_redraw {
                    redraw_line(prompt, &state)?;
                    needs_redraw = false;
                }

                if !event::poll(Duration::from_millis(100))? {
                    continue;
                }
                let action = match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        map_key_event_to_action(&key)
                    }
                    Event::Paste(text) => Some(LineEditAction::Paste(sanitize_text_input(&text))),
                    _ => None,
                };
                let Some(action) = action else {
                    continue;
                };

                match apply_line_edit_action(&mut state, action, &self.history) {
                    LineEditOutcome::Continue { redraw } => needs_redraw = redraw,
                    LineEditOutcome::Submit(value) => break Ok(InputEvent::Line(value)),
                    LineEditOutcome::Interrupted => break Ok(InputEvent::Interrupted),
                    LineEditOutcome::Eof => break Ok(InputEvent::Eof),
                }
            }
        })();

        let disable_raw_result = disable_raw_mode();
        let disable_paste_result = execute!(stdout, event::DisableBracketedPaste);
        println!();

        let event = result?;
        disable_raw_result?;
        disable_paste_result?;

        if let InputEvent::Line(line) = &event {
            self.remember(line);
        }
        Ok(event)
    }
}

impl InputSource for LineEditor {
    fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent> {
        if io::stdin().is_terminal() && io::stdout().is_terminal() {
            return self.read_interactive(prompt);
        }
        read_plain_line(&mut io::stdin().lock())
    }
}

/// Reads one line from a non-interactive source.
pub fn read_plain_line<R: BufRead>(reader: &mut R) -> io::Result<InputEvent> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(InputEvent::Eof);
    }
    let line = line.trim_end_matches(['\n', '\r']).to_string();
    Ok(InputEvent::Line(line))
}

/// Normalizes pasted text: tabs become spaces, control characters are dropped.
pub fn sanitize_text_input(text: &str) -> String {
    let mut sanitized = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\t' => sanitized.push_str("    "),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\r' | '\n' => sanitized.push('\n'),
            _ if !c.is_control() => sanitized.push(c),
            _ => {}
        }
    }
    sanitized
}

/// Marker drawn in place of a pasted line break; one column wide so cursor
/// math stays per-character.
const NEWLINE_MARKER: char = '↵';

fn redraw_line(prompt: &str, state: &LineEditorState) -> io::Result<()> {
    let prefix: String = state
        .text
        .chars()
        .take(state.cursor)
        .map(|c| if c == '\n' { NEWLINE_MARKER } else { c })
        .collect();
    let prompt_width = UnicodeWidthStr::width(prompt);
    let prefix_width = UnicodeWidthStr::width(prefix.as_str());

    let shown: String = state
        .text
        .chars()
        .map(|c| if c == '\n' { NEWLINE_MARKER } else { c })
        .collect();
    print!("\r\x1b[K{}{}", prompt, shown);

    let cursor_columns = prompt_width + prefix_width;
    if cursor_columns > 0 {
        print!("\r\x1b[{}C", cursor_columns);
    } else {
        print!("\r");
    }

    io::stdout().flush()
}

pub fn map_key_event_to_action(key: &event::KeyEvent) -> Option<LineEditAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => Some(LineEditAction::Submit),
        KeyCode::Backspace => Some(LineEditAction::Backspace),
        KeyCode::Delete => Some(LineEditAction::Delete),
        KeyCode::Left => Some(LineEditAction::MoveLeft),
        KeyCode::Right => Some(LineEditAction::MoveRight),
        KeyCode::Home => Some(LineEditAction::MoveStart),
        KeyCode::End => Some(LineEditAction::MoveEnd),
        KeyCode::Up => Some(LineEditAction::HistoryPrev),
        KeyCode::Down => Some(LineEditAction::HistoryNext),
        KeyCode::Char('a') if ctrl => Some(LineEditAction::MoveStart),
        KeyCode::Char('e') if ctrl => Some(LineEditAction::MoveEnd),
        KeyCode::Char('k') if ctrl => Some(LineEditAction::DeleteToEnd),
        KeyCode::Char('w') if ctrl => Some(LineEditAction::DeleteWord),
        KeyCode::Char('u') if ctrl => Some(LineEditAction::ClearAll),
        KeyCode::Char('p') if ctrl => Some(LineEditAction::HistoryPrev),
        KeyCode::Char('n') if ctrl => Some(LineEditAction::HistoryNext),
        KeyCode::Char('c') if ctrl => Some(LineEditAction::Interrupt),
        KeyCode::Char('d') if ctrl => Some(LineEditAction::EndOfInput),
        KeyCode::Char(c) if !ctrl => {
            if c == '\n' || c == '\r' {
                Some(LineEditAction::Submit)
            } else {
                Some(LineEditAction::Insert(c))
            }
        }
        _ => None,
    }
}

pub fn apply_line_edit_action(
    state: &mut LineEditorState,
    action: LineEditAction,
    history: &[String],
) -> LineEditOutcome {
    match action {
        LineEditAction::Insert(c) => {
            insert_char_at_cursor(&mut state.text, state.cursor, c);
            state.cursor += 1;
            LineEditOutcome::Continue { redraw: true }
        }
        LineEditAction::Backspace => {
            let removed = remove_char_before_cursor(&mut state.text, state.cursor);
            if removed {
                state.cursor -= 1;
            }
            LineEditOutcome::Continue { redraw: removed }
        }
        LineEditAction::Delete => LineEditOutcome::Continue {
            redraw: remove_char_at_cursor(&mut state.text, state.cursor),
        },
        LineEditAction::MoveLeft => {
            let moved = state.cursor > 0;
            if moved {
                state.cursor -= 1;
            }
            LineEditOutcome::Continue { redraw: moved }
        }
        LineEditAction::MoveRight => {
            let moved = state.cursor < state.text.chars().count();
            if moved {
                state.cursor += 1;
            }
            LineEditOutcome::Continue { redraw: moved }
        }
        LineEditAction::MoveStart => {
            let moved = state.cursor != 0;
            state.cursor = 0;
            LineEditOutcome::Continue { redraw: moved }
        }
        LineEditAction::MoveEnd => {
            let end = state.text.chars().count();
            let moved = state.cursor != end;
            state.cursor = end;
            LineEditOutcome::Continue { redraw: moved }
        }
        LineEditAction::DeleteToEnd => {
            let byte_idx = char_to_byte_index(&state.text, state.cursor);
            if byte_idx >= state.text.len() {
                LineEditOutcome::Continue { redraw: false }
            } else {
                state.text.truncate(byte_idx);
                LineEditOutcome::Continue { redraw: true }
            }
        }
        LineEditAction::DeleteWord => {
            if state.cursor == 0 {
                LineEditOutcome::Continue { redraw: false }
            } else {
                state.cursor = delete_word_before_cursor(&mut state.text, state.cursor);
                LineEditOutcome::Continue { redraw: true }
            }
        }
        LineEditAction::ClearAll => {
            if state.text.is_empty() {
                LineEditOutcome::Continue { redraw: false }
            } else {
                state.text.clear();
                state.cursor = 0;
                LineEditOutcome::Continue { redraw: true }
            }
        }
        LineEditAction::HistoryPrev => {
            let next_index = match state.history_index {
                Some(0) => return LineEditOutcome::Continue { redraw: false },
                Some(index) => index - 1,
                None if history.is_empty() => {
                    return LineEditOutcome::Continue { redraw: false }
                }
                None => {
                    state.draft = state.text.clone();
                    history.len() - 1
                }
            };
            state.history_index = Some(next_index);
            state.replace_text(history[next_index].clone());
            LineEditOutcome::Continue { redraw: true }
        }
        LineEditAction::HistoryNext => {
            let Some(index) = state.history_index else {
                return LineEditOutcome::Continue { redraw: false };
            };
            if index + 1 < history.len() {
                state.history_index = Some(index + 1);
                state.replace_text(history[index + 1].clone());
            } else {
                state.history_index = None;
                let draft = std::mem::take(&mut state.draft);
                state.replace_text(draft);
            }
            LineEditOutcome::Continue { redraw: true }
        }
        LineEditAction::Paste(text) => {
            if text.is_empty() {
                return LineEditOutcome::Continue { redraw: false };
            }
            insert_str_at_cursor(&mut state.text, state.cursor, &text);
            state.cursor += text.chars().count();
            LineEditOutcome::Continue { redraw: true }
        }
        LineEditAction::Submit => LineEditOutcome::Submit(state.text.clone()),
        LineEditAction::Interrupt => LineEditOutcome::Interrupted,
        LineEditAction::EndOfInput => {
            if state.text.is_empty() {
                LineEditOutcome::Eof
            } else {
                LineEditOutcome::Continue {
                    redraw: remove_char_at_cursor(&mut state.text, state.cursor),
                }
            }
        }
    }
}

fn insert_char_at_cursor(input: &mut String, cursor: usize, c: char) {
    let byte_idx = char_to_byte_index(input, cursor);
    input.insert(byte_idx, c);
}

fn insert_str_at_cursor(input: &mut String, cursor: usize, text: &str) {
    let byte_idx = char_to_byte_index(input, cursor);
    input.insert_str(byte_idx, text);
}

fn remove_char_before_cursor(input: &mut String, cursor: usize) -> bool {
    if cursor == 0 {
        return false;
    }
    let end = char_to_byte_index(input, cursor);
    let start = char_to_byte_index(input, cursor - 1);
    input.replace_range(start..end, "");
    true
}

fn remove_char_at_cursor(input: &mut String, cursor: usize) -> bool {
    let start = char_to_byte_index(input, cursor);
    if start >= input.len() {
        return false;
    }
    let end = char_to_byte_index(input, cursor + 1);
    input.replace_range(start..end, "");
    true
}

fn delete_word_before_cursor(input: &mut String, cursor: usize) -> usize {
    let mut chars: Vec<char> = input.chars().collect();
    let end = cursor.min(chars.len());
    let mut idx = end;
    while idx > 0 && chars[idx - 1] == ' ' {
        idx -= 1;
    }
    while idx > 0 && chars[idx - 1] != ' ' {
        idx -= 1;
    }
    chars.drain(idx..end);
    *input = chars.into_iter().collect();
    idx
}

fn char_to_byte_index(input: &str, char_index: usize) -> usize {
    input
        .char_indices()
        .nth(char_index)
        .map(|(idx, _)| idx)
        .unwrap_or(input.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn history() -> Vec<String> {
        vec!["first".to_string(), "second".to_string()]
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn insert_and_move_cursor() {
        let mut state = LineEditorState::default();
        assert_eq!(
            apply_line_edit_action(&mut state, LineEditAction::Insert('a'), &[]),
            LineEditOutcome::Continue { redraw: true }
        );
        apply_line_edit_action(&mut state, LineEditAction::MoveLeft, &[]);
        apply_line_edit_action(&mut state, LineEditAction::Insert('é'), &[]);
        assert_eq!(state.text, "éa");
        assert_eq!(state.cursor, 1);
    }

    #[test]
    fn ctrl_w_deletes_previous_word() {
        let mut state = LineEditorState::with_text("explain  borrow checker".to_string());
        apply_line_edit_action(&mut state, LineEditAction::DeleteWord, &[]);
        assert_eq!(state.text, "explain  borrow ");
        apply_line_edit_action(&mut state, LineEditAction::DeleteWord, &[]);
        assert_eq!(state.text, "explain  ");
        assert_eq!(state.cursor, 9);
    }

    #[test]
    fn ctrl_c_interrupts_and_ctrl_d_ends_only_on_empty_line() {
        assert_eq!(
            map_key_event_to_action(&ctrl('c')),
            Some(LineEditAction::Interrupt)
        );
        assert_eq!(
            map_key_event_to_action(&ctrl('d')),
            Some(LineEditAction::EndOfInput)
        );

        let mut state = LineEditorState::default();
        assert_eq!(
            apply_line_edit_action(&mut state, LineEditAction::EndOfInput, &[]),
            LineEditOutcome::Eof
        );

        let mut state = LineEditorState::with_text("ab".to_string());
        state.cursor = 0;
        assert_eq!(
            apply_line_edit_action(&mut state, LineEditAction::EndOfInput, &[]),
            LineEditOutcome::Continue { redraw: true }
        );
        assert_eq!(state.text, "b");
        assert_eq!(
            apply_line_edit_action(&mut state, LineEditAction::Interrupt, &[]),
            LineEditOutcome::Interrupted
        );
    }

    #[test]
    fn history_browsing_restores_draft() {
        let history = history();
        let mut state = LineEditorState::with_text("dra".to_string());

        apply_line_edit_action(&mut state, LineEditAction::HistoryPrev, &history);
        assert_eq!(state.text, "second");
        apply_line_edit_action(&mut state, LineEditAction::HistoryPrev, &history);
        assert_eq!(state.text, "first");
        assert_eq!(
            apply_line_edit_action(&mut state, LineEditAction::HistoryPrev, &history),
            LineEditOutcome::Continue { redraw: false }
        );

        apply_line_edit_action(&mut state, LineEditAction::HistoryNext, &history);
        assert_eq!(state.text, "second");
        apply_line_edit_action(&mut state, LineEditAction::HistoryNext, &history);
        assert_eq!(state.text, "dra");
        assert_eq!(state.cursor, 3);
        assert_eq!(state.history_index, None);
    }

    #[test]
    fn history_keys_map_to_actions() {
        let up = KeyEvent::new(KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(
            map_key_event_to_action(&up),
            Some(LineEditAction::HistoryPrev)
        );
        assert_eq!(
            map_key_event_to_action(&ctrl('n')),
            Some(LineEditAction::HistoryNext)
        );
    }

    #[test]
    fn multi_line_paste_stays_in_the_buffer_until_enter() {
        let mut state = LineEditorState::with_text("look: ".to_string());
        let outcome = apply_line_edit_action(
            &mut state,
            LineEditAction::Paste(sanitize_text_input(
                "fn main() {\r\n    println!(\"hi\");\r\n}",
            )),
            &[],
        );
        assert_eq!(outcome, LineEditOutcome::Continue { redraw: true });

        let outcome = apply_line_edit_action(&mut state, LineEditAction::Submit, &[]);
        assert_eq!(
            outcome,
            LineEditOutcome::Submit("look: fn main() {\n    println!(\"hi\");\n}".to_string())
        );
    }

    #[test]
    fn sanitize_normalizes_line_endings_and_tabs() {
        assert_eq!(sanitize_text_input("a\r\nb\rc\td\u{7}"), "a\nb\nc    d");
    }

    #[test]
    fn editor_history_skips_blanks_and_repeats() {
        let mut editor = LineEditor::new();
        editor.remember("hello");
        editor.remember("hello");
        editor.remember("   ");
        editor.remember("/help");
        assert_eq!(editor.history(), ["hello", "/help"]);
    }

    #[test]
    fn plain_reader_yields_lines_then_eof() {
        let mut reader = io::Cursor::new("first line\r\nsecond\n".as_bytes());
        assert_eq!(
            read_plain_line(&mut reader).unwrap(),
            InputEvent::Line("first line".to_string())
        );
        assert_eq!(
            read_plain_line(&mut reader).unwrap(),
            InputEvent::Line("second".to_string())
        );
        assert_eq!(read_plain_line(&mut reader).unwrap(), InputEvent::Eof);
    }
}
