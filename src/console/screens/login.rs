//! Login screen

use crossterm::event::KeyEvent;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use serde_json::Map;

use crate::console::{
    components::{DynamicForm, FormAction},
    traits::ScreenAction,
    ui::{centered_rect, Styles},
};
use crate::schema::{FieldDescriptor, FieldType, SchemaError};

pub struct LoginScreen {
    form: DynamicForm,
    api_url: String,
}

fn login_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("username", "Username", FieldType::Text).required(),
        FieldDescriptor::new("password", "Password", FieldType::Password).required(),
    ]
}

impl LoginScreen {
    pub fn new(api_url: &str) -> Result<Self, SchemaError> {
        Ok(Self {
            form: DynamicForm::new("Sign in", login_fields(), &Map::new())?,
            api_url: api_url.to_string(),
        })
    }

    /// Fresh, empty form
    pub fn reset(&mut self) -> Result<(), SchemaError> {
        self.form = DynamicForm::new("Sign in", login_fields(), &Map::new())?;
        Ok(())
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.form.set_loading(loading);
    }

    pub fn is_loading(&self) -> bool {
        self.form.is_loading()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ScreenAction {
        match self.form.handle_key(key) {
            FormAction::Submit(values) => {
                let field = |name: &str| {
                    values
                        .get(name)
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string()
                };
                self.form.set_loading(true);
                ScreenAction::Login {
                    username: field("username"),
                    password: field("password"),
                }
            }
            FormAction::Cancel => ScreenAction::Quit,
            FormAction::None => ScreenAction::None,
        }
    }

    pub fn draw(&mut self, f: &mut Frame, area: Rect) {
        let popup = centered_rect(50, 60, area);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(0)])
            .split(popup);

        let header = Paragraph::new(vec![
            Line::from(Span::styled("Marketplace Admin", Styles::title())),
            Line::from(Span::styled(self.api_url.clone(), Styles::inactive())),
        ]);
        f.render_widget(header, chunks[0]);
        self.form.render(f, chunks[1]);
    }
}
