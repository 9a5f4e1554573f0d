//! Terminal output for interactive sessions.

use std::io::{self, IsTerminal, Write};

use ratatui::crossterm::terminal;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use tracing::debug;

use crate::core::session::OutputSink;
use crate::ui::markdown::{line_to_ansi, render_markdown};

/// [`OutputSink`] writing to a terminal or any other writer.
pub struct ConsoleSink<W: Write> {
    out: W,
    color: bool,
    width: Option<usize>,
    at_line_start: bool,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        let stdout = io::stdout();
        let color = stdout.is_terminal();
        let width = terminal::size().ok().map(|(w, _)| w as usize);
        Self::new(stdout, color, width)
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, color: bool, width: Option<usize>) -> Self {
        Self {
            out,
            color,
            width,
            at_line_start: true,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_lines(&mut self, lines: &[Line<'_>]) {
        let mut text = String::new();
        for line in lines {
            text.push_str(&line_to_ansi(line, self.color));
            text.push('\n');
        }
        self.write_raw(&text);
    }

    fn write_raw(&mut self, text: &str) {
        let result = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush());
        if let Err(err) = result {
            debug!(error = %err, "Failed to write to console");
        }
        if let Some(last) = text.chars().last() {
            self.at_line_start = last == '\n';
        }
    }

    fn notice(&mut self, icon: &str, text: &str, style: Style) {
        if !self.at_line_start {
            self.write_raw("\n");
        }
        let lines: Vec<Line<'_>> = text
            .lines()
            .enumerate()
            .map(|(index, line)| {
                let lead = if index == 0 { icon } else { "   " };
                Line::from(vec![Span::raw(lead), Span::styled(line, style)])
            })
            .collect();
        self.write_lines(&lines);
    }
}

impl<W: Write> OutputSink for ConsoleSink<W> {
    fn info(&mut self, text: &str) {
        self.notice("", text, Style::default().fg(Color::Cyan));
    }

    fn success(&mut self, text: &str) {
        self.notice("✅ ", text, Style::default().fg(Color::Green));
    }

    fn warning(&mut self, text: &str) {
        self.notice("⚠️  ", text, Style::default().fg(Color::Yellow));
    }

    fn error(&mut self, text: &str) {
        self.notice("❌ ", text, Style::default().fg(Color::LightRed));
    }

    fn markdown(&mut self, text: &str) {
        let lines = render_markdown(text, self.width);
        self.write_lines(&lines);
    }

    fn assistant_header(&mut self, provider: &str, model: &str) {
        let header = Line::from(vec![
            Span::styled(
                "Assistant",
                Style::default()
                    .fg(Color::LightMagenta)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" ({provider} · {model})"),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        if !self.at_line_start {
            self.write_raw("\n");
        }
        self.write_lines(&[header]);
    }

    fn fragment(&mut self, text: &str) {
        self.write_raw(text);
    }

    fn end_response(&mut self) {
        if !self.at_line_start {
            self.write_raw("\n");
        }
        self.write_raw("\n");
    }
}
