//! Light markdown rendering for complete assistant replies.
//!
//! Markdown is parsed with `pulldown-cmark` into styled ratatui [`Line`]s,
//! which [`line_to_ansi`] turns into escape sequences for a plain terminal.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::crossterm::style::{
    Attribute, Color as CrosstermColor, ContentStyle, StyledContent,
};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

const CODE_INDENT: &str = "    ";
const QUOTE_PREFIX: &str = "│ ";
const DEFAULT_RULE_WIDTH: usize = 40;

fn heading_style(level: HeadingLevel) -> Style {
    let style = Style::default().add_modifier(Modifier::BOLD);
    match level {
        HeadingLevel::H1 => style.fg(Color::LightCyan).add_modifier(Modifier::UNDERLINED),
        HeadingLevel::H2 => style.fg(Color::LightCyan),
        _ => style.fg(Color::Cyan),
    }
}

fn code_style() -> Style {
    Style::default().fg(Color::LightYellow)
}

fn marker_style() -> Style {
    Style::default().fg(Color::Yellow)
}

fn quote_style() -> Style {
    Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC)
}

fn link_style() -> Style {
    Style::default()
        .fg(Color::LightBlue)
        .add_modifier(Modifier::UNDERLINED)
}

#[derive(Clone, Copy)]
enum ListKind {
    Unordered,
    Ordered(u64),
}

struct MarkdownRenderer {
    lines: Vec<Line<'static>>,
    current_spans: Vec<Span<'static>>,
    style_stack: Vec<Style>,
    list_stack: Vec<ListKind>,
    quote_depth: usize,
    code_block: Option<String>,
    pending_link: Option<String>,
    rule_width: usize,
}

impl MarkdownRenderer {
    fn new(rule_width: usize) -> Self {
        Self {
            lines: Vec::new(),
            current_spans: Vec::new(),
            style_stack: Vec::new(),
            list_stack: Vec::new(),
            quote_depth: 0,
            code_block: None,
            pending_link: None,
            rule_width,
        }
    }

    fn current_style(&self) -> Style {
        self.style_stack.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, modifier: impl FnOnce(Style) -> Style) {
        let style = modifier(self.current_style());
        self.style_stack.push(style);
    }

    fn push_span(&mut self, span: Span<'static>) {
        if self.current_spans.is_empty() && self.quote_depth > 0 {
            self.current_spans
                .push(Span::styled(QUOTE_PREFIX.repeat(self.quote_depth), quote_style()));
        }
        self.current_spans.push(span);
    }

    fn flush(&mut self) {
        if !self.current_spans.is_empty() {
            let spans = std::mem::take(&mut self.current_spans);
            self.lines.push(Line::from(spans));
        }
    }

    fn blank_line(&mut self) {
        if self.lines.last().is_some_and(|line| line.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn list_indent(&self) -> String {
        "  ".repeat(self.list_stack.len().saturating_sub(1))
    }

    fn finish_code_block(&mut self) {
        let Some(code) = self.code_block.take() else {
            return;
        };
        for line in code.trim_end_matches('\n').split('\n') {
            self.lines.push(Line::from(vec![
                Span::raw(CODE_INDENT),
                Span::styled(line.replace('\t', "    "), code_style()),
            ]));
        }
        self.blank_line();
    }

    fn render(mut self, content: &str) -> Vec<Line<'static>> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        for event in Parser::new_ext(content, options) {
            match event {
                Event::Start(tag) => self.start(tag),
                Event::End(tag) => self.end(tag),
                Event::Text(text) => {
                    if let Some(code) = self.code_block.as_mut() {
                        code.push_str(&text);
                    } else {
                        let style = self.current_style();
                        self.push_span(Span::styled(text.into_string(), style));
                    }
                }
                Event::Code(code) => {
                    self.push_span(Span::styled(code.into_string(), code_style()));
                }
                Event::SoftBreak => self.push_span(Span::raw(" ")),
                Event::HardBreak => {
                    self.flush();
                    if !self.list_stack.is_empty() {
                        let indent = format!("{}  ", self.list_indent());
                        self.push_span(Span::raw(indent));
                    }
                }
                Event::Rule => {
                    self.flush();
                    self.lines.push(Line::styled(
                        "─".repeat(self.rule_width),
                        Style::default().fg(Color::DarkGray),
                    ));
                    self.blank_line();
                }
                Event::TaskListMarker(checked) => {
                    let marker = if checked { "[x] " } else { "[ ] " };
                    self.push_span(Span::styled(marker, marker_style()));
                }
                Event::Html(html) | Event::InlineHtml(html) => {
                    let style = self.current_style();
                    self.push_span(Span::styled(html.trim_end().to_string(), style));
                }
                _ => {}
            }
        }

        self.flush();
        while self.lines.last().is_some_and(|line| line.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                self.style_stack.push(heading_style(level));
            }
            Tag::BlockQuote(_) => {
                self.flush();
                self.quote_depth += 1;
                self.style_stack.push(quote_style());
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        self.lines.push(Line::styled(
                            format!("{CODE_INDENT}{lang}"),
                            Style::default().fg(Color::DarkGray),
                        ));
                    }
                }
                self.code_block = Some(String::new());
            }
            Tag::List(start) => {
                self.flush();
                self.list_stack.push(match start {
                    Some(n) => ListKind::Ordered(n),
                    None => ListKind::Unordered,
                });
            }
            Tag::Item => {
                self.flush();
                let marker = match self.list_stack.last_mut() {
                    Some(ListKind::Ordered(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                let indent = self.list_indent();
                self.push_span(Span::raw(indent));
                self.push_span(Span::styled(marker, marker_style()));
            }
            Tag::Emphasis => self.push_style(|style| style.add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(|style| style.add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(|style| style.add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => {
                self.pending_link = Some(dest_url.into_string());
                self.style_stack.push(link_style());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush();
                if self.list_stack.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Heading(_) => {
                self.flush();
                self.style_stack.pop();
                self.blank_line();
            }
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.style_stack.pop();
                self.blank_line();
            }
            TagEnd::CodeBlock => self.finish_code_block(),
            TagEnd::List(_) => {
                self.flush();
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.style_stack.pop();
            }
            TagEnd::Link | TagEnd::Image => {
                self.style_stack.pop();
                if let Some(url) = self.pending_link.take() {
                    let shown = self
                        .current_spans
                        .last()
                        .is_some_and(|span| span.content.as_ref() == url);
                    if !shown && !url.is_empty() {
                        self.push_span(Span::styled(
                            format!(" ({url})"),
                            Style::default().fg(Color::DarkGray),
                        ));
                    }
                }
            }
            _ => {}
        }
    }
}

/// Renders markdown into styled lines. `width` bounds horizontal rules.
pub fn render_markdown(content: &str, width: Option<usize>) -> Vec<Line<'static>> {
    let rule_width = width
        .map(|w| w.clamp(1, 80))
        .unwrap_or(DEFAULT_RULE_WIDTH);
    MarkdownRenderer::new(rule_width).render(content)
}

fn to_crossterm_color(color: Color) -> CrosstermColor {
    match color {
        Color::Reset => CrosstermColor::Reset,
        Color::Black => CrosstermColor::Black,
        Color::Red => CrosstermColor::DarkRed,
        Color::Green => CrosstermColor::DarkGreen,
        Color::Yellow => CrosstermColor::DarkYellow,
        Color::Blue => CrosstermColor::DarkBlue,
        Color::Magenta => CrosstermColor::DarkMagenta,
        Color::Cyan => CrosstermColor::DarkCyan,
        Color::Gray => CrosstermColor::Grey,
        Color::DarkGray => CrosstermColor::DarkGrey,
        Color::LightRed => CrosstermColor::Red,
        Color::LightGreen => CrosstermColor::Green,
        Color::LightYellow => CrosstermColor::Yellow,
        Color::LightBlue => CrosstermColor::Blue,
        Color::LightMagenta => CrosstermColor::Magenta,
        Color::LightCyan => CrosstermColor::Cyan,
        Color::White => CrosstermColor::White,
        Color::Rgb(r, g, b) => CrosstermColor::Rgb { r, g, b },
        Color::Indexed(i) => CrosstermColor::AnsiValue(i),
    }
}

fn to_content_style(style: Style) -> ContentStyle {
    let mut content_style = ContentStyle::new();
    content_style.foreground_color = style.fg.map(to_crossterm_color);
    content_style.background_color = style.bg.map(to_crossterm_color);

    let modifiers = style.add_modifier - style.sub_modifier;
    for (modifier, attribute) in [
        (Modifier::BOLD, Attribute::Bold),
        (Modifier::DIM, Attribute::Dim),
        (Modifier::ITALIC, Attribute::Italic),
        (Modifier::UNDERLINED, Attribute::Underlined),
        (Modifier::REVERSED, Attribute::Reverse),
        (Modifier::CROSSED_OUT, Attribute::CrossedOut),
    ] {
        if modifiers.contains(modifier) {
            content_style.attributes.set(attribute);
        }
    }
    content_style
}

/// Renders a styled line as text. With `color` off, styling is dropped.
pub fn line_to_ansi(line: &Line<'_>, color: bool) -> String {
    let mut rendered = String::new();
    for span in &line.spans {
        let style = line.style.patch(span.style);
        if color && style != Style::default() {
            let styled = StyledContent::new(to_content_style(style), span.content.as_ref());
            rendered.push_str(&styled.to_string());
        } else {
            rendered.push_str(&span.content);
        }
    }
    rendered
}

/// Display width of a rendered line, ignoring styling.
pub fn line_width(line: &Line<'_>) -> usize {
    line.spans
        .iter()
        .map(|span| UnicodeWidthStr::width(span.content.as_ref()))
        .sum()
}
