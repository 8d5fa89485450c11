//! Main menu: one entry per admin resource

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::console::{traits::ScreenAction, ui::Styles};
use crate::models::Resource;

/// Main menu options
#[derive(Debug, Clone)]
pub struct MenuOption {
    pub resource: Resource,
    pub shortcut: char,
}

/// Main menu screen state
pub struct MainMenuScreen {
    pub menu_state: ListState,
    pub menu_options: Vec<MenuOption>,
    pub api_url: String,
}

impl MainMenuScreen {
    pub fn new(api_url: &str) -> Self {
        let menu_options = Resource::ALL
            .iter()
            .zip('1'..='9')
            .map(|(resource, shortcut)| MenuOption {
                resource: *resource,
                shortcut,
            })
            .collect();

        let mut menu_state = ListState::default();
        menu_state.select(Some(0));

        Self {
            menu_state,
            menu_options,
            api_url: api_url.to_string(),
        }
    }

    pub fn selected_resource(&self) -> Option<Resource> {
        self.menu_state
            .selected()
            .and_then(|i| self.menu_options.get(i))
            .map(|option| option.resource)
    }

    /// Handle key events for the main menu
    pub fn handle_key(&mut self, key: KeyEvent) -> ScreenAction {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                let selected = self.menu_state.selected().unwrap_or(0);
                let new_selected = if selected == 0 {
                    self.menu_options.len() - 1
                } else {
                    selected - 1
                };
                self.menu_state.select(Some(new_selected));
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let selected = self.menu_state.selected().unwrap_or(0);
                let new_selected = (selected + 1) % self.menu_options.len();
                self.menu_state.select(Some(new_selected));
            }
            KeyCode::Enter => {
                if let Some(resource) = self.selected_resource() {
                    return ScreenAction::Open(resource);
                }
            }
            KeyCode::Char('L') => return ScreenAction::Logout,
            KeyCode::Char(c) => {
                if let Some(option) = self.menu_options.iter().find(|o| o.shortcut == c) {
                    return ScreenAction::Open(option.resource);
                }
            }
            _ => {}
        }
        ScreenAction::None
    }

    /// Draw the main menu screen
    pub fn draw(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Min(0),    // Menu
                Constraint::Length(4), // Instructions
            ])
            .split(area);

        self.draw_title(f, chunks[0]);
        self.draw_menu(f, chunks[1]);
        self.draw_instructions(f, chunks[2]);
    }

    fn draw_title(&self, f: &mut Frame, area: Rect) {
        let title = Paragraph::new(Line::from(vec![
            Span::styled("Marketplace Admin", Styles::title()),
            Span::styled(format!("  {}", self.api_url), Styles::inactive()),
        ]))
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(title, area);
    }

    fn draw_menu(&mut self, f: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .menu_options
            .iter()
            .enumerate()
            .map(|(i, option)| {
                let selected = Some(i) == self.menu_state.selected();
                let style = if selected {
                    Styles::selected()
                } else {
                    Style::default()
                };

                let content = vec![
                    Line::from(vec![
                        Span::styled(format!("[{}] ", option.shortcut), Styles::info()),
                        Span::styled(option.resource.title(), style.add_modifier(Modifier::BOLD)),
                    ]),
                    Line::from(Span::styled(
                        format!("     {}", option.resource.description()),
                        if selected { style } else { Styles::inactive() },
                    )),
                ];

                ListItem::new(content)
            })
            .collect();

        let menu = List::new(items).block(
            Block::default()
                .title("Resources")
                .borders(Borders::ALL)
                .border_style(Styles::active_border()),
        );

        f.render_stateful_widget(menu, area, &mut self.menu_state);
    }

    fn draw_instructions(&self, f: &mut Frame, area: Rect) {
        let instructions = vec![
            Line::from(vec![
                Span::styled("Navigation: ", Styles::info()),
                Span::raw("↑/↓ to move, "),
                Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" or 1-7 to open"),
            ]),
            Line::from(vec![
                Span::styled("Other: ", Styles::info()),
                Span::raw("L sign out, F1/? help, q quit"),
            ]),
        ];

        let paragraph = Paragraph::new(instructions).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Styles::inactive_border()),
        );
        f.render_widget(paragraph, area);
    }
}
