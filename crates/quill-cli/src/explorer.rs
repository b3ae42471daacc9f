//! Terminal explorer: move a cursor through a template and watch how the
//! position classifies and maps into each generated document.

use std::io::Stdout;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use quill_engine::{
    CodeDocument, DefaultDocumentMappingService, DocumentMappingService, SourceText, TargetKind,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

pub struct Entry {
    pub name: String,
    pub document: Result<CodeDocument, String>,
}

pub struct Explorer {
    entries: Vec<Entry>,
    list_state: ListState,
    cursor: usize,
    right_associative: bool,
}

impl Explorer {
    pub fn new(entries: Vec<Entry>) -> Self {
        let mut list_state = ListState::default();
        if !entries.is_empty() {
            list_state.select(Some(0));
        }
        Self {
            entries,
            list_state,
            cursor: 0,
            right_associative: true,
        }
    }

    fn selected(&self) -> Option<&Entry> {
        self.list_state.selected().and_then(|i| self.entries.get(i))
    }

    fn document(&self) -> Option<&CodeDocument> {
        self.selected().and_then(|entry| entry.document.as_ref().ok())
    }

    fn next_file(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1) % self.entries.len(),
            None => 0,
        };
        self.list_state.select(Some(i));
        self.cursor = 0;
    }

    fn previous_file(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => self.entries.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
        self.cursor = 0;
    }

    fn move_cursor(&mut self, movement: Movement) {
        if let Some(document) = self.document() {
            self.cursor = movement.apply(document.source(), self.cursor);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Movement {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
}

impl Movement {
    fn apply(self, source: &SourceText, cursor: usize) -> usize {
        let text = source.text();
        let Ok(location) = source.location(cursor) else {
            return 0;
        };
        let line = location.line_index;
        let line_range = |line: usize| source.line_range(line).unwrap_or(cursor..cursor);
        match self {
            Self::Left => text[..cursor]
                .chars()
                .next_back()
                .map_or(cursor, |c| cursor - c.len_utf8()),
            Self::Right => text[cursor..]
                .chars()
                .next()
                .map_or(cursor, |c| cursor + c.len_utf8()),
            Self::Up if line == 0 => cursor,
            Self::Up => column_in(&text, line_range(line - 1), location.character_index),
            Self::Down if line + 1 >= source.line_count() => cursor,
            Self::Down => column_in(&text, line_range(line + 1), location.character_index),
            Self::LineStart => line_range(line).start,
            Self::LineEnd => line_range(line).end,
        }
    }
}

/// The offset `column` bytes into `line`, clamped to the line and moved
/// back onto a character boundary.
fn column_in(text: &str, line: std::ops::Range<usize>, column: usize) -> usize {
    let mut offset = (line.start + column).min(line.end);
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// What the explorer knows about one cursor position.
pub fn describe(document: &CodeDocument, cursor: usize, right_associative: bool) -> Vec<String> {
    let service = DefaultDocumentMappingService;
    let source = document.source();
    let mut lines = Vec::new();

    if let Ok(location) = source.location(cursor) {
        lines.push(format!(
            "Position   {}:{} (offset {cursor})",
            location.line_index + 1,
            location.character_index + 1
        ));
    }
    let association = if right_associative { "right" } else { "left" };
    lines.push(format!(
        "Language   {:?} ({association}-associative)",
        service.get_language_kind(document, cursor, right_associative)
    ));
    lines.push(String::new());

    for kind in TargetKind::ALL {
        let generated = document.generated_document(kind);
        match service.try_map_to_generated_range(document, kind, cursor..cursor) {
            Some(span) => {
                let text = generated.text();
                let line = text.line_range(span.line_index).unwrap_or(0..0);
                lines.push(format!(
                    "{kind:<9}  {}:{} (offset {})",
                    span.line_index + 1,
                    span.character_index + 1,
                    span.absolute_index
                ));
                lines.push(format!(
                    "           {}",
                    text.slice(line).unwrap_or_default().trim()
                ));
            }
            None => lines.push(format!("{kind:<9}  not mapped")),
        }
    }

    lines.push(String::new());
    lines.push(format!("Diagnostics ({})", document.diagnostics().len()));
    lines.extend(document.diagnostics().iter().map(ToString::to_string));
    lines
}

pub fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut Explorer) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Char('j') | KeyCode::Tab => app.next_file(),
                KeyCode::Char('k') | KeyCode::BackTab => app.previous_file(),
                KeyCode::Char('r') => app.right_associative = !app.right_associative,
                KeyCode::Left => app.move_cursor(Movement::Left),
                KeyCode::Right => app.move_cursor(Movement::Right),
                KeyCode::Up => app.move_cursor(Movement::Up),
                KeyCode::Down => app.move_cursor(Movement::Down),
                KeyCode::Home => app.move_cursor(Movement::LineStart),
                KeyCode::End => app.move_cursor(Movement::LineEnd),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut Explorer) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(45),
            Constraint::Percentage(35),
        ])
        .split(rows[0]);

    let file_items: Vec<ListItem> = app
        .entries
        .iter()
        .map(|entry| {
            let marker = match &entry.document {
                Ok(document) if document.has_errors() => "✗ ",
                Ok(_) => "  ",
                Err(_) => "! ",
            };
            ListItem::new(Line::from(format!("{marker}{}", entry.name)))
        })
        .collect();
    let files = List::new(file_items)
        .block(Block::default().borders(Borders::ALL).title("Templates"))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));
    f.render_stateful_widget(files, columns[0], &mut app.list_state);

    let (source_lines, info_lines, scroll): (Vec<Line>, Vec<Line>, u16) =
        match app.selected().map(|e| &e.document) {
            Some(Ok(document)) => {
                let source = document.source();
                let cursor_line = source
                    .location(app.cursor)
                    .map_or(0, |location| location.line_index);
                let height = usize::from(columns[1].height.saturating_sub(2));
                let scroll = cursor_line.saturating_sub(height / 2);
                (
                    source_view(source, app.cursor),
                    describe(document, app.cursor, app.right_associative)
                        .into_iter()
                        .map(Line::from)
                        .collect(),
                    u16::try_from(scroll).unwrap_or(u16::MAX),
                )
            }
            Some(Err(error)) => (Vec::new(), vec![Line::from(error.clone())], 0),
            None => (
                vec![Line::from("No templates to show")],
                Vec::new(),
                0,
            ),
        };

    let title = app.selected().map_or("Source", |entry| entry.name.as_str());
    let source = Paragraph::new(source_lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((scroll, 0));
    f.render_widget(source, columns[1]);

    let info = Paragraph::new(info_lines)
        .block(Block::default().borders(Borders::ALL).title("Cursor"))
        .wrap(Wrap { trim: false });
    f.render_widget(info, columns[2]);

    let help = Paragraph::new(Line::from(vec![
        Span::raw("q: Quit | "),
        Span::raw("j/k Tab: File | "),
        Span::raw("←↑↓→ Home/End: Cursor | "),
        Span::raw("r: Toggle association"),
    ]));
    f.render_widget(help, rows[1]);
}

/// Source lines with the character under the cursor highlighted.
fn source_view(source: &SourceText, cursor: usize) -> Vec<Line<'static>> {
    let text = source.text();
    let highlight = Style::default().add_modifier(Modifier::REVERSED);
    (0..source.line_count())
        .filter_map(|line| source.line_range(line).ok())
        .map(|range| {
            let content = text[range.clone()].to_string();
            if !(range.start..=range.end).contains(&cursor) {
                return Line::from(content);
            }
            let at = cursor - range.start;
            let rest = &content[at..];
            let width = rest.chars().next().map_or(0, char::len_utf8);
            let under = if width == 0 { " " } else { &rest[..width] };
            Line::from(vec![
                Span::raw(content[..at].to_string()),
                Span::styled(under.to_string(), highlight),
                Span::raw(rest[width..].to_string()),
            ])
        })
        .collect()
}
