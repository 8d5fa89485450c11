//! Toast overlay in the top-right corner

use ratatui::{
    layout::Rect,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::console::ui::{top_right_rect, Styles};
use crate::toast::Toast;

const MAX_TOAST_LINES: u16 = 3;

pub struct ToastDisplay {
    pub width: u16,
    pub max_visible: usize,
    pub show_timestamp: bool,
}

impl Default for ToastDisplay {
    fn default() -> Self {
        Self {
            width: 48,
            max_visible: 5,
            show_timestamp: false,
        }
    }
}

impl ToastDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timestamps(mut self) -> Self {
        self.show_timestamp = true;
        self
    }

    /// Format toast for display
    pub fn format_toast(&self, toast: &Toast) -> String {
        if self.show_timestamp {
            format!(
                "{} [{}] {}",
                toast.kind.icon(),
                toast.timestamp.format("%H:%M:%S"),
                toast.message
            )
        } else {
            format!("{} {}", toast.kind.icon(), toast.message)
        }
    }

    fn height_for(&self, text: &str, inner_width: u16) -> u16 {
        if inner_width == 0 {
            return 3;
        }
        let lines = (text.width() as u16).div_ceil(inner_width).clamp(1, MAX_TOAST_LINES);
        lines + 2
    }

    /// Stack the newest toasts downwards from the top-right corner
    pub fn render(&self, f: &mut Frame, area: Rect, toasts: &[Toast]) {
        let skip = toasts.len().saturating_sub(self.max_visible);
        let mut y = area.y;
        for toast in &toasts[skip..] {
            let text = self.format_toast(toast);
            let width = self.width.min(area.width);
            let height = self.height_for(&text, width.saturating_sub(2));
            if y + height > area.y + area.height {
                break;
            }
            let rect = top_right_rect(width, height, Rect { y, ..area });
            let style = Styles::toast(toast.kind);
            let paragraph = Paragraph::new(text)
                .style(style)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).border_style(style));
            f.render_widget(Clear, rect);
            f.render_widget(paragraph, rect);
            y += height;
        }
    }
}
