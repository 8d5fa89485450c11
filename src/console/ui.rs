//! Common UI styles and helpers for the console

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::schema::{BadgeTone, CellContent};
use crate::toast::ToastKind;

/// Common UI styles
pub struct Styles;

impl Styles {
    pub fn default() -> Style {
        Style::default()
    }

    pub fn selected() -> Style {
        Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error() -> Style {
        Style::default().fg(Color::Red)
    }

    pub fn success() -> Style {
        Style::default().fg(Color::Green)
    }

    pub fn warning() -> Style {
        Style::default().fg(Color::Yellow)
    }

    pub fn info() -> Style {
        Style::default().fg(Color::Cyan)
    }

    pub fn inactive() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn active_border() -> Style {
        Style::default().fg(Color::Yellow)
    }

    pub fn inactive_border() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn badge(tone: BadgeTone) -> Style {
        let color = match tone {
            BadgeTone::Positive => Color::Green,
            BadgeTone::Neutral => Color::Gray,
            BadgeTone::Negative => Color::Red,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    pub fn email() -> Style {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::UNDERLINED)
    }

    pub fn cell(content: &CellContent) -> Style {
        match content {
            CellContent::Text(_) => Styles::default(),
            CellContent::Badge { tone, .. } => Styles::badge(*tone),
            CellContent::Email(_) => Styles::email(),
        }
    }

    pub fn toast(kind: ToastKind) -> Style {
        match kind {
            ToastKind::Success => Styles::success(),
            ToastKind::Error => Styles::error(),
            ToastKind::Info => Styles::info(),
        }
    }
}

/// Single-line text buffer with a cursor, counted in chars
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.chars().count(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = value.chars().count();
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn delete_char_forward(&mut self) {
        if self.cursor < self.value.chars().count() {
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.value.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn move_cursor_to_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_to_end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Display columns before the cursor
    pub fn cursor_offset(&self) -> u16 {
        self.value
            .chars()
            .take(self.cursor)
            .map(|c| c.width().unwrap_or(0))
            .sum::<usize>() as u16
    }

    pub fn display_width(&self) -> usize {
        self.value.width()
    }

    /// Cursor line and column for multi-line values, ignoring wrapping
    pub fn cursor_line_col(&self) -> (u16, u16) {
        let before: String = self.value.chars().take(self.cursor).collect();
        let line = before.matches('\n').count() as u16;
        let col = before.rsplit('\n').next().unwrap_or("").width() as u16;
        (line, col)
    }
}

/// Center a rectangle within another rectangle
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Top-right corner box of a given size, clipped to the area
pub fn top_right_rect(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    Rect {
        x: r.x + r.width - width,
        y: r.y,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_input_handles_multibyte() {
        let mut input = TextInput::with_value("Zoë");
        input.delete_char();
        assert_eq!(input.value(), "Zo");
        input.insert_char('é');
        input.move_cursor_to_start();
        input.insert_char('¡');
        assert_eq!(input.value(), "¡Zoé");
        input.delete_char_forward();
        assert_eq!(input.value(), "¡oé");
        assert_eq!(input.cursor_offset(), 1);
    }

    #[test]
    fn test_cursor_offset_counts_display_columns() {
        let mut input = TextInput::with_value("日本");
        assert_eq!(input.cursor_offset(), 4);
        input.move_cursor_left();
        assert_eq!(input.cursor_offset(), 2);
    }

    #[test]
    fn test_cursor_line_col() {
        let mut input = TextInput::with_value("first\nsecond");
        assert_eq!(input.cursor_line_col(), (1, 6));
        input.move_cursor_to_start();
        assert_eq!(input.cursor_line_col(), (0, 0));
    }

    #[test]
    fn test_top_right_rect() {
        let area = Rect::new(0, 0, 100, 30);
        assert_eq!(top_right_rect(40, 6, area), Rect::new(60, 0, 40, 6));
        assert_eq!(top_right_rect(200, 60, area), area);
    }
}
