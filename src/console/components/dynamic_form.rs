//! Schema-driven form component

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use serde_json::{Map, Value};

use super::dynamic_table::edit_input;
use crate::console::traits::FormHandler;
use crate::console::ui::{Styles, TextInput};
use crate::schema::{
    check_constraints, validate_fields, Control, FieldChange, FieldDescriptor, FormState,
    SchemaError,
};

const MAX_LIST_HEIGHT: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    None,
    /// The whole state mapping, verbatim
    Submit(Map<String, Value>),
    Cancel,
}

/// One drawn field
#[derive(Debug, Clone)]
pub struct FormInput {
    pub descriptor: FieldDescriptor,
    pub input: TextInput,
    pub option_cursor: usize,
    pub is_focused: bool,
    pub validation_error: Option<String>,
}

impl FormInput {
    fn new(descriptor: FieldDescriptor, state: &FormState) -> Self {
        let text = state.text(&descriptor.name);
        let option_cursor = match descriptor.control() {
            Control::Dropdown => descriptor
                .options
                .iter()
                .position(|option| option.value == text)
                .unwrap_or(0),
            _ => 0,
        };
        Self {
            input: TextInput::with_value(&text),
            descriptor,
            option_cursor,
            is_focused: false,
            validation_error: None,
        }
    }

    fn option_up(&mut self) {
        let len = self.descriptor.options.len();
        if len > 0 {
            self.option_cursor = if self.option_cursor == 0 { len - 1 } else { self.option_cursor - 1 };
        }
    }

    fn option_down(&mut self) {
        let len = self.descriptor.options.len();
        if len > 0 {
            self.option_cursor = (self.option_cursor + 1) % len;
        }
    }

    fn cursor_value(&self) -> Option<String> {
        self.descriptor
            .options
            .get(self.option_cursor)
            .map(|option| option.value.clone())
    }

    fn height(&self) -> u16 {
        let list_height = |len: usize| (len.min(MAX_LIST_HEIGHT) + 2) as u16;
        match self.descriptor.control() {
            Control::MultiLine => 5,
            Control::Dropdown if self.is_focused => list_height(self.descriptor.options.len()),
            Control::MultiChoice => list_height(self.descriptor.options.len()),
            _ => 3,
        }
    }

    fn border_style(&self) -> Style {
        if self.is_focused {
            Styles::active_border()
        } else if self.validation_error.is_some() {
            Styles::error()
        } else {
            Styles::inactive_border()
        }
    }

    fn block(&self) -> Block<'static> {
        let label = if self.descriptor.required {
            format!("{} *", self.descriptor.label)
        } else {
            self.descriptor.label.clone()
        };
        let title = match &self.validation_error {
            Some(error) => format!("{} - Error: {}", label, error),
            None => label,
        };
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(self.border_style())
    }

    fn placeholder(&self) -> String {
        match (&self.descriptor.placeholder, self.descriptor.control()) {
            (Some(placeholder), _) => placeholder.clone(),
            (None, Control::FilePath) => "Path to a file".to_string(),
            (None, Control::Dropdown) => "Select...".to_string(),
            _ => String::new(),
        }
    }

    fn render(&self, f: &mut Frame, area: Rect, state: &FormState) {
        let name = self.descriptor.name.as_str();
        match self.descriptor.control() {
            Control::SingleLine { masked } => {
                let shown = if masked {
                    "•".repeat(self.input.value().chars().count())
                } else {
                    self.input.value().to_string()
                };
                self.render_text(f, area, shown);
                if self.is_focused {
                    self.place_cursor(f, area, 0, self.input.cursor_offset());
                }
            }
            Control::FilePath => {
                self.render_text(f, area, self.input.value().to_string());
                if self.is_focused {
                    self.place_cursor(f, area, 0, self.input.cursor_offset());
                }
            }
            Control::MultiLine => {
                self.render_text(f, area, self.input.value().to_string());
                if self.is_focused {
                    let (line, col) = self.input.cursor_line_col();
                    self.place_cursor(f, area, line, col);
                }
            }
            Control::Toggle => {
                let mark = if state.is_checked(name) { "[x]" } else { "[ ]" };
                let block = Block::default()
                    .borders(Borders::ALL)
                    .border_style(self.border_style());
                let mut spans = vec![Span::raw(format!("{} {}", mark, self.descriptor.label))];
                if let Some(error) = &self.validation_error {
                    spans.push(Span::styled(format!("  {}", error), Styles::error()));
                }
                f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
            }
            Control::Dropdown if self.is_focused => {
                let current = state.text(name);
                let items = self.descriptor.options.iter().map(|option| {
                    let mark = if option.value == current { "(•)" } else { "( )" };
                    format!("{} {}", mark, option.label)
                });
                self.render_options(f, area, items.collect());
            }
            Control::Dropdown => {
                let current = state.text(name);
                let label = self
                    .descriptor
                    .option_label(&current)
                    .unwrap_or(current.as_str())
                    .to_string();
                self.render_text(f, area, label);
            }
            Control::MultiChoice => {
                let selected = state.selected(name);
                let items = self.descriptor.options.iter().map(|option| {
                    let mark = if selected.contains(&option.value) { "[x]" } else { "[ ]" };
                    format!("{} {}", mark, option.label)
                });
                self.render_options(f, area, items.collect());
            }
            Control::None => {}
        }
    }

    fn render_text(&self, f: &mut Frame, area: Rect, text: String) {
        let (text, style) = if text.is_empty() {
            (self.placeholder(), Styles::inactive())
        } else {
            (text, Styles::default())
        };
        let paragraph = Paragraph::new(text)
            .style(style)
            .wrap(Wrap { trim: false })
            .block(self.block());
        f.render_widget(paragraph, area);
    }

    fn render_options(&self, f: &mut Frame, area: Rect, items: Vec<String>) {
        let items: Vec<ListItem> = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                let style = if self.is_focused && i == self.option_cursor {
                    Styles::selected()
                } else {
                    Styles::default()
                };
                ListItem::new(item).style(style)
            })
            .collect();
        let mut state = ListState::default();
        if self.is_focused {
            state.select(Some(self.option_cursor));
        }
        f.render_stateful_widget(List::new(items).block(self.block()), area, &mut state);
    }

    fn place_cursor(&self, f: &mut Frame, area: Rect, line: u16, col: u16) {
        let x = area.x + 1 + col;
        let y = area.y + 1 + line;
        if x < area.x + area.width.saturating_sub(1) && y < area.y + area.height.saturating_sub(1) {
            f.set_cursor(x, y);
        }
    }
}

pub struct DynamicForm {
    pub title: String,
    fields: Vec<FieldDescriptor>,
    inputs: Vec<FormInput>,
    state: FormState,
    current_field: usize,
    scroll: usize,
    loading: bool,
}

impl DynamicForm {
    /// Build a form over `fields`, seeded from `initial`. Bad field lists are
    /// rejected here rather than at draw time.
    pub fn new(
        title: &str,
        fields: Vec<FieldDescriptor>,
        initial: &Map<String, Value>,
    ) -> Result<Self, SchemaError> {
        validate_fields(&fields)?;
        let state = FormState::seeded(initial);
        let inputs = fields
            .iter()
            .filter(|field| field.control() != Control::None)
            .map(|field| FormInput::new(field.clone(), &state))
            .collect();
        let mut form = Self {
            title: title.to_string(),
            fields,
            inputs,
            state,
            current_field: 0,
            scroll: 0,
            loading: false,
        };
        form.update_focus();
        Ok(form)
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn values(&self) -> &Map<String, Value> {
        self.state.values()
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn current_input(&self) -> Option<&FormInput> {
        self.inputs.get(self.current_field)
    }

    pub fn error_for(&self, name: &str) -> Option<&str> {
        self.inputs
            .iter()
            .find(|input| input.descriptor.name == name)
            .and_then(|input| input.validation_error.as_deref())
    }

    fn update_focus(&mut self) {
        for (i, input) in self.inputs.iter_mut().enumerate() {
            input.is_focused = i == self.current_field;
        }
    }

    /// Apply the native constraints. Violations are attached to their fields.
    pub fn validate_all(&mut self) -> bool {
        let violations = check_constraints(&self.fields, &self.state);
        for input in &mut self.inputs {
            input.validation_error = violations
                .iter()
                .find(|v| v.field == input.descriptor.name)
                .map(|v| v.message.clone());
        }
        if let Some(first) = self.inputs.iter().position(|i| i.validation_error.is_some()) {
            self.set_current_index(first);
        }
        violations.is_empty()
    }

    pub fn submit(&mut self) -> FormAction {
        if self.loading || !self.validate_all() {
            return FormAction::None;
        }
        FormAction::Submit(self.state.values().clone())
    }

    fn sync_text(&mut self) {
        if let Some(input) = self.inputs.get(self.current_field) {
            self.state
                .apply(FieldChange::from_input(&input.descriptor, input.input.value()));
        }
    }

    fn is_last_field(&self) -> bool {
        self.current_field + 1 >= self.inputs.len()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            return self.submit();
        }
        match key.code {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Tab => {
                self.next_field();
                return FormAction::None;
            }
            KeyCode::BackTab => {
                self.previous_field();
                return FormAction::None;
            }
            _ => {}
        }

        let Some(control) = self.current_input().map(|input| input.descriptor.control()) else {
            return FormAction::None;
        };
        let index = self.current_field;

        match control {
            Control::SingleLine { .. } | Control::FilePath => match key.code {
                KeyCode::Enter if self.is_last_field() => return self.submit(),
                KeyCode::Enter | KeyCode::Down => self.next_field(),
                KeyCode::Up => self.previous_field(),
                _ => {
                    if edit_input(&mut self.inputs[index].input, key) {
                        self.sync_text();
                    }
                }
            },
            Control::MultiLine => match key.code {
                KeyCode::Enter => {
                    self.inputs[index].input.insert_char('\n');
                    self.sync_text();
                }
                KeyCode::Down => self.next_field(),
                KeyCode::Up => self.previous_field(),
                _ => {
                    if edit_input(&mut self.inputs[index].input, key) {
                        self.sync_text();
                    }
                }
            },
            Control::Toggle => match key.code {
                KeyCode::Char(' ') => {
                    let name = self.inputs[index].descriptor.name.clone();
                    self.state.toggle_checkbox(&name);
                }
                KeyCode::Enter if self.is_last_field() => return self.submit(),
                KeyCode::Enter | KeyCode::Down => self.next_field(),
                KeyCode::Up => self.previous_field(),
                _ => {}
            },
            Control::Dropdown => match key.code {
                KeyCode::Up => self.inputs[index].option_up(),
                KeyCode::Down => self.inputs[index].option_down(),
                KeyCode::Char(' ') | KeyCode::Enter => {
                    let input = &self.inputs[index];
                    if let Some(value) = input.cursor_value() {
                        self.state
                            .apply(FieldChange::new(input.descriptor.name.clone(), Value::String(value)));
                    }
                    if key.code == KeyCode::Enter {
                        self.next_field();
                    }
                }
                _ => {}
            },
            Control::MultiChoice => match key.code {
                KeyCode::Up => self.inputs[index].option_up(),
                KeyCode::Down => self.inputs[index].option_down(),
                KeyCode::Char(' ') => {
                    let input = &self.inputs[index];
                    if let Some(value) = input.cursor_value() {
                        let name = input.descriptor.name.clone();
                        self.state.toggle_selection(&name, &value);
                    }
                }
                KeyCode::Enter => self.next_field(),
                _ => {}
            },
            Control::None => {}
        }
        FormAction::None
    }

    /// Keep the focused field inside the drawn window
    fn adjust_scroll(&mut self, height: u16) {
        if self.current_field < self.scroll {
            self.scroll = self.current_field;
        }
        loop {
            let used: u16 = self.inputs[self.scroll..=self.current_field]
                .iter()
                .map(FormInput::height)
                .sum();
            if used <= height || self.scroll >= self.current_field {
                break;
            }
            self.scroll += 1;
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(self.title.clone())
            .borders(Borders::ALL)
            .border_style(Styles::active_border());
        let inner = block.inner(area);
        f.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(inner);

        if !self.inputs.is_empty() {
            self.adjust_scroll(chunks[0].height);
            let mut y = chunks[0].y;
            let bottom = chunks[0].y + chunks[0].height;
            for input in &self.inputs[self.scroll..] {
                let height = input.height();
                if y + height > bottom {
                    break;
                }
                let field_area = Rect::new(chunks[0].x, y, chunks[0].width, height);
                input.render(f, field_area, &self.state);
                y += height;
            }
        }

        let footer = if self.loading {
            Line::from(Span::styled("Saving...", Styles::warning()))
        } else {
            Line::from(Span::styled(
                "Tab/Shift-Tab: move  Space: toggle/select  Ctrl-S: save  Esc: cancel",
                Styles::inactive(),
            ))
        };
        f.render_widget(Paragraph::new(footer), chunks[1]);
    }
}

impl FormHandler for DynamicForm {
    fn field_count(&self) -> usize {
        self.inputs.len()
    }

    fn current_index(&self) -> usize {
        self.current_field
    }

    fn set_current_index(&mut self, index: usize) {
        if index < self.inputs.len() {
            self.current_field = index;
            self.update_focus();
        }
    }
}
