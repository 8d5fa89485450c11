//! Scrollable read-only popup for record details and chat history

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::console::ui::Styles;
use crate::models::RecordDetail;

const PAGE_SCROLL: u16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailAction {
    None,
    Close,
}

pub struct DetailView {
    title: String,
    detail: Option<RecordDetail>,
    scroll_offset: u16,
}

impl DetailView {
    /// An empty view waiting for its data
    pub fn loading(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: None,
            scroll_offset: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.detail.is_none()
    }

    pub fn detail(&self) -> Option<&RecordDetail> {
        self.detail.as_ref()
    }

    pub fn set_detail(&mut self, detail: RecordDetail) {
        self.detail = Some(detail);
        self.scroll_offset = 0;
    }

    fn max_scroll(&self) -> u16 {
        let lines = self.detail.as_ref().map_or(0, RecordDetail::line_count);
        u16::try_from(lines.saturating_sub(1)).unwrap_or(u16::MAX)
    }

    fn scroll_by(&mut self, delta: i32) {
        let next = (i32::from(self.scroll_offset) + delta).clamp(0, i32::from(self.max_scroll()));
        self.scroll_offset = u16::try_from(next).unwrap_or(0);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> DetailAction {
        match key.code {
            KeyCode::Esc | KeyCode::Backspace => return DetailAction::Close,
            KeyCode::Up | KeyCode::Char('k') => self.scroll_by(-1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_by(1),
            KeyCode::PageUp => self.scroll_by(-i32::from(PAGE_SCROLL)),
            KeyCode::PageDown => self.scroll_by(i32::from(PAGE_SCROLL)),
            KeyCode::Home => self.scroll_offset = 0,
            KeyCode::End => self.scroll_offset = self.max_scroll(),
            _ => {}
        }
        DetailAction::None
    }

    fn lines(&self) -> Vec<Line<'_>> {
        let Some(detail) = &self.detail else {
            return vec![Line::from(Span::styled("Loading...", Styles::info()))];
        };

        let mut lines = Vec::with_capacity(detail.line_count());
        for section in &detail.sections {
            lines.push(Line::from(Span::styled(section.heading.as_str(), Styles::title())));
            if section.lines.is_empty() {
                lines.push(Line::from(Span::styled("No data found", Styles::inactive())));
            }
            for line in &section.lines {
                let mut spans = Vec::with_capacity(2);
                if let Some(label) = &line.label {
                    spans.push(Span::styled(format!("{}: ", label), Styles::info()));
                }
                spans.push(Span::raw(line.text.as_str()));
                lines.push(Line::from(spans));
            }
            lines.push(Line::from(""));
        }
        lines
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let title = match &self.detail {
            Some(detail) => format!("{} - ↑/↓ scroll, ESC close", detail.title),
            None => self.title.clone(),
        };
        let paragraph = Paragraph::new(self.lines())
            .wrap(Wrap { trim: false })
            .scroll((self.scroll_offset, 0))
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(Styles::active_border()),
            );
        f.render_widget(Clear, area);
        f.render_widget(paragraph, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DetailLine, DetailSection};
    use crossterm::event::KeyModifiers;
    use ratatui::{backend::TestBackend, Terminal};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn chat_detail() -> RecordDetail {
        RecordDetail {
            title: "Engine noise".to_string(),
            sections: vec![DetailSection {
                heading: "Messages".to_string(),
                lines: vec![
                    DetailLine::labelled("user", "It rattles"),
                    DetailLine::labelled("assistant", "Check the heat shield"),
                ],
            }],
        }
    }

    fn screen_text(view: &DetailView) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 10)).unwrap();
        terminal.draw(|f| view.render(f, f.size())).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_loading_then_lines() {
        let mut view = DetailView::loading("Engine noise");
        assert!(view.is_loading());
        assert!(screen_text(&view).contains("Loading..."));

        view.set_detail(chat_detail());
        let text = screen_text(&view);
        assert!(text.contains("Messages"));
        assert!(text.contains("user: It rattles"));
        assert!(text.contains("assistant: Check the heat shield"));
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut view = DetailView::loading("x");
        view.set_detail(chat_detail());
        // heading + 2 lines + blank
        assert_eq!(view.handle_key(key(KeyCode::PageDown)), DetailAction::None);
        assert_eq!(view.scroll_offset, 3);
        view.handle_key(key(KeyCode::Up));
        assert_eq!(view.scroll_offset, 2);
        view.handle_key(key(KeyCode::Home));
        view.handle_key(key(KeyCode::Up));
        assert_eq!(view.scroll_offset, 0);
        assert_eq!(view.handle_key(key(KeyCode::Esc)), DetailAction::Close);
    }
}
