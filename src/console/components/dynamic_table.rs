//! Schema-driven table component
//!
//! Rows are kept raw; the visible rows come from [`TableViewState::apply`]
//! on every draw and key press, then get paged.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::console::ui::{Styles, TextInput};
use crate::report::{pad_to_width, truncate_to_width};
use crate::schema::{
    BodyState, CellContent, ColumnDescriptor, TableRow, TableViewState, ViewOptions,
};

const MAX_COLUMN_WIDTH: usize = 30;
const COLUMN_GAP: &str = " | ";

/// Configuration for table display and the actions it offers
#[derive(Debug, Clone)]
pub struct DynamicTableConfig {
    pub title: String,
    pub searchable: bool,
    pub filterable: bool,
    pub allow_add: bool,
    pub allow_edit: bool,
    pub allow_delete: bool,
    pub items_per_page: usize,
}

impl Default for DynamicTableConfig {
    fn default() -> Self {
        Self {
            title: "Records".to_string(),
            searchable: true,
            filterable: true,
            allow_add: false,
            allow_edit: false,
            allow_delete: false,
            items_per_page: 20,
        }
    }
}

impl DynamicTableConfig {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }

    pub fn with_actions(mut self, add: bool, edit: bool, delete: bool) -> Self {
        self.allow_add = add;
        self.allow_edit = edit;
        self.allow_delete = delete;
        self
    }

    pub fn with_pagination(mut self, items_per_page: usize) -> Self {
        self.items_per_page = items_per_page.max(1);
        self
    }

    fn view_options(&self) -> ViewOptions {
        ViewOptions {
            searchable: self.searchable,
            filterable: self.filterable,
        }
    }

    fn has_row_actions(&self) -> bool {
        self.allow_edit || self.allow_delete
    }
}

/// What a key press on the table asks the owner to do
#[derive(Debug, Clone, PartialEq)]
pub enum TableAction<R> {
    None,
    Add,
    Edit(R),
    Delete(R),
    Refresh,
    /// Keys the table has no meaning for
    Unhandled(KeyEvent),
}

#[derive(Debug, Clone, Default, PartialEq)]
enum InputMode {
    #[default]
    Browse,
    Search(TextInput),
    Filter { column: usize, input: TextInput },
}

pub struct DynamicTable<R: TableRow> {
    rows: Vec<R>,
    columns: Vec<ColumnDescriptor<R>>,
    view: TableViewState<R::Key>,
    pub config: DynamicTableConfig,
    state: ListState,
    pub current_page: usize,
    selected: usize,
    loading: bool,
    loaded: bool,
    mode: InputMode,
}

impl<R: TableRow + Clone> DynamicTable<R> {
    pub fn new(columns: Vec<ColumnDescriptor<R>>, config: DynamicTableConfig) -> Self {
        Self {
            rows: Vec::new(),
            columns,
            view: TableViewState::new(),
            config,
            state: ListState::default(),
            current_page: 0,
            selected: 0,
            loading: false,
            loaded: false,
            mode: InputMode::Browse,
        }
    }

    /// Replace the rows, keeping the view settings and position where possible
    pub fn set_rows(&mut self, rows: Vec<R>) {
        self.rows = rows;
        self.loading = false;
        self.loaded = true;
        self.clamp_position();
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn columns(&self) -> &[ColumnDescriptor<R>] {
        &self.columns
    }

    pub fn view(&self) -> &TableViewState<R::Key> {
        &self.view
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_capturing_input(&self) -> bool {
        self.mode != InputMode::Browse
    }

    /// Rows after search, filters and sort
    pub fn visible(&self) -> Vec<&R> {
        self.view.apply(&self.rows, self.config.view_options())
    }

    pub fn body_state(&self) -> BodyState {
        BodyState::resolve(self.loading, self.visible().len())
    }

    /// Get total number of pages
    pub fn get_total_pages(&self) -> usize {
        let count = self.visible().len();
        if count == 0 {
            1
        } else {
            (count + self.config.items_per_page - 1) / self.config.items_per_page
        }
    }

    /// Get rows for current page
    pub fn get_current_page_rows(&self) -> Vec<&R> {
        let visible = self.visible();
        let start_idx = self.current_page * self.config.items_per_page;
        let end_idx = std::cmp::min(start_idx + self.config.items_per_page, visible.len());

        if start_idx < visible.len() {
            visible[start_idx..end_idx].to_vec()
        } else {
            Vec::new()
        }
    }

    /// Get currently selected row
    pub fn selected_row(&self) -> Option<&R> {
        self.get_current_page_rows().get(self.selected).copied()
    }

    pub fn next_page(&mut self) {
        if self.current_page + 1 < self.get_total_pages() {
            self.current_page += 1;
            self.selected = 0;
        }
    }

    pub fn previous_page(&mut self) {
        if self.current_page > 0 {
            self.current_page -= 1;
            self.selected = 0;
        }
    }

    /// Navigate up within current page
    pub fn navigate_up(&mut self) {
        let len = self.get_current_page_rows().len();
        if len == 0 {
            return;
        }
        self.selected = if self.selected == 0 {
            len - 1
        } else {
            self.selected - 1
        };
    }

    /// Navigate down within current page
    pub fn navigate_down(&mut self) {
        let len = self.get_current_page_rows().len();
        if len == 0 {
            return;
        }
        self.selected = (self.selected + 1) % len;
    }

    /// Toggle sort on the column at `index`. Returns whether it applied.
    pub fn sort_by_index(&mut self, index: usize) -> bool {
        let applied = match self.columns.get(index) {
            Some(column) => self.view.request_sort(column),
            None => false,
        };
        if applied {
            self.reset_position();
        }
        applied
    }

    pub fn clear_view(&mut self) {
        self.view.set_search("");
        self.view.clear_filters();
        self.reset_position();
    }

    fn reset_position(&mut self) {
        self.current_page = 0;
        self.selected = 0;
    }

    fn clamp_position(&mut self) {
        let pages = self.get_total_pages();
        if self.current_page >= pages {
            self.current_page = pages - 1;
        }
        let len = self.get_current_page_rows().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> TableAction<R> {
        match std::mem::take(&mut self.mode) {
            InputMode::Browse => self.handle_browse_key(key),
            InputMode::Search(input) => {
                self.handle_search_key(input, key);
                TableAction::None
            }
            InputMode::Filter { column, input } => {
                self.handle_filter_key(column, input, key);
                TableAction::None
            }
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> TableAction<R> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.navigate_up(),
            KeyCode::Down | KeyCode::Char('j') => self.navigate_down(),
            KeyCode::PageDown | KeyCode::Right => self.next_page(),
            KeyCode::PageUp | KeyCode::Left => self.previous_page(),
            KeyCode::Home => self.selected = 0,
            KeyCode::Char('/') if self.config.searchable => {
                self.mode = InputMode::Search(TextInput::with_value(self.view.search()));
            }
            KeyCode::Char('f') if self.config.filterable && !self.columns.is_empty() => {
                self.mode = self.filter_mode(0);
            }
            KeyCode::Char('c') => self.clear_view(),
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                self.sort_by_index(index);
            }
            KeyCode::Char('a') if self.config.allow_add => return TableAction::Add,
            KeyCode::Char('e') | KeyCode::Enter if self.config.allow_edit => {
                if let Some(row) = self.selected_row() {
                    return TableAction::Edit(row.clone());
                }
            }
            KeyCode::Char('d') if self.config.allow_delete => {
                if let Some(row) = self.selected_row() {
                    return TableAction::Delete(row.clone());
                }
            }
            KeyCode::Char('r') => return TableAction::Refresh,
            _ => return TableAction::Unhandled(key),
        }
        TableAction::None
    }

    fn handle_search_key(&mut self, mut input: TextInput, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {}
            KeyCode::Esc => {
                self.view.set_search("");
                self.reset_position();
            }
            _ => {
                edit_input(&mut input, key);
                self.view.set_search(input.value());
                self.reset_position();
                self.mode = InputMode::Search(input);
            }
        }
    }

    fn filter_mode(&self, column: usize) -> InputMode {
        let value = self
            .columns
            .get(column)
            .map(|c| self.view.filter(c.key))
            .unwrap_or("");
        InputMode::Filter {
            column,
            input: TextInput::with_value(value),
        }
    }

    fn handle_filter_key(&mut self, column: usize, mut input: TextInput, key: KeyEvent) {
        let count = self.columns.len();
        match key.code {
            KeyCode::Enter => {}
            KeyCode::Tab => self.mode = self.filter_mode((column + 1) % count),
            KeyCode::BackTab => {
                self.mode = self.filter_mode(if column == 0 { count - 1 } else { column - 1 })
            }
            KeyCode::Esc => {
                if let Some(c) = self.columns.get(column) {
                    self.view.set_filter(c.key, "");
                }
                self.reset_position();
            }
            _ => {
                edit_input(&mut input, key);
                if let Some(c) = self.columns.get(column) {
                    self.view.set_filter(c.key, input.value());
                }
                self.reset_position();
                self.mode = InputMode::Filter { column, input };
            }
        }
    }

    fn header_label(&self, column: &ColumnDescriptor<R>) -> String {
        match self.view.sort() {
            Some((key, direction)) if key == column.key => {
                format!("{} {}", column.label, direction.arrow())
            }
            _ => column.label.clone(),
        }
    }

    fn actions_label(&self) -> String {
        let mut actions = Vec::new();
        if self.config.allow_edit {
            actions.push("[e]dit");
        }
        if self.config.allow_delete {
            actions.push("[d]elete");
        }
        actions.join(" ")
    }

    fn title(&self, page_len: usize, visible_len: usize) -> String {
        let mut title = if visible_len == 0 {
            format!("{} (Empty)", self.config.title)
        } else {
            format!(
                "{} ({}/{} - Page {}/{})",
                self.config.title,
                page_len,
                visible_len,
                self.current_page + 1,
                self.get_total_pages()
            )
        };
        if visible_len != self.rows.len() {
            title.push_str(&format!(" [{} total]", self.rows.len()));
        }
        title
    }

    fn footer(&self) -> Line<'static> {
        match &self.mode {
            InputMode::Search(input) => Line::from(vec![
                Span::styled("Search: ", Styles::title()),
                Span::raw(input.value().to_string()),
            ]),
            InputMode::Filter { column, input } => {
                let label = self
                    .columns
                    .get(*column)
                    .map(|c| c.label.clone())
                    .unwrap_or_default();
                Line::from(vec![
                    Span::styled(format!("Filter {}: ", label), Styles::title()),
                    Span::raw(input.value().to_string()),
                    Span::styled("  (Tab: next column, Enter: done)", Styles::inactive()),
                ])
            }
            InputMode::Browse => {
                let mut parts = Vec::new();
                if !self.view.search().is_empty() {
                    parts.push(format!("search \"{}\"", self.view.search()));
                }
                for column in &self.columns {
                    let value = self.view.filter(column.key);
                    if !value.is_empty() {
                        parts.push(format!("{}~\"{}\"", column.label, value));
                    }
                }
                if parts.is_empty() {
                    Line::from(Span::styled(
                        "/ search  f filter  1-9 sort  r refresh",
                        Styles::inactive(),
                    ))
                } else {
                    Line::from(vec![
                        Span::styled("Showing: ", Styles::info()),
                        Span::raw(parts.join(", ")),
                        Span::styled("  (c: clear)", Styles::inactive()),
                    ])
                }
            }
        }
    }

    /// Render the table
    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        let visible_len = self.visible().len();
        let page: Vec<Vec<CellContent>> = self
            .get_current_page_rows()
            .into_iter()
            .map(|row| self.columns.iter().map(|c| c.render_cell(row)).collect())
            .collect();

        let mut headers: Vec<String> = self.columns.iter().map(|c| self.header_label(c)).collect();
        let actions = self.actions_label();
        if self.config.has_row_actions() {
            headers.push("Actions".to_string());
        }

        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let cells = page
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.plain().width());
                let actions_width = if i == self.columns.len() { actions.width() } else { 0 };
                cells
                    .chain([header.width(), actions_width])
                    .max()
                    .unwrap_or(0)
                    .min(MAX_COLUMN_WIDTH)
            })
            .collect();

        let block = Block::default()
            .title(self.title(page.len(), visible_len))
            .borders(Borders::ALL)
            .border_style(Styles::active_border());
        let inner = block.inner(area);
        f.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(inner);

        let mut header_spans = Vec::new();
        for (i, (header, width)) in headers.iter().zip(&widths).enumerate() {
            if i > 0 {
                header_spans.push(Span::styled(COLUMN_GAP, Styles::title()));
            }
            header_spans.push(Span::styled(
                pad_to_width(&truncate_to_width(header, *width), *width),
                Styles::title(),
            ));
        }
        f.render_widget(Paragraph::new(Line::from(header_spans)), chunks[0]);

        match BodyState::resolve(self.loading, visible_len) {
            BodyState::Loading => {
                f.render_widget(
                    Paragraph::new("Loading...").style(Styles::info()),
                    chunks[1],
                );
            }
            BodyState::Empty => {
                f.render_widget(
                    Paragraph::new("No data found").style(Styles::inactive()),
                    chunks[1],
                );
            }
            BodyState::Rows(_) => {
                let items: Vec<ListItem> = page
                    .iter()
                    .enumerate()
                    .map(|(index, cells)| {
                        let selected = index == self.selected;
                        let mut spans = Vec::new();
                        for (i, (cell, width)) in cells.iter().zip(&widths).enumerate() {
                            if i > 0 {
                                spans.push(Span::raw(COLUMN_GAP));
                            }
                            let text = truncate_to_width(&cell.plain().replace('\n', " "), *width);
                            let style = if selected { Styles::selected() } else { Styles::cell(cell) };
                            spans.push(Span::styled(pad_to_width(&text, *width), style));
                        }
                        if self.config.has_row_actions() {
                            spans.push(Span::raw(COLUMN_GAP));
                            let style = if selected { Styles::selected() } else { Styles::inactive() };
                            spans.push(Span::styled(actions.clone(), style));
                        }
                        ListItem::new(Line::from(spans))
                    })
                    .collect();

                self.state.select(Some(self.selected));
                f.render_stateful_widget(List::new(items), chunks[1], &mut self.state);
            }
        }

        f.render_widget(Paragraph::new(self.footer()), chunks[2]);
        match &self.mode {
            InputMode::Search(input) => {
                let x = chunks[2].x + "Search: ".width() as u16 + input.cursor_offset();
                f.set_cursor(x, chunks[2].y);
            }
            InputMode::Filter { column, input } => {
                let label = self.columns.get(*column).map(|c| c.label.as_str()).unwrap_or("");
                let prefix = format!("Filter {}: ", label);
                let x = chunks[2].x + prefix.width() as u16 + input.cursor_offset();
                f.set_cursor(x, chunks[2].y);
            }
            InputMode::Browse => {}
        }
    }
}

/// Apply an editing key to a single-line input. Returns whether it was used.
pub fn edit_input(input: &mut TextInput, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => input.insert_char(c),
        KeyCode::Char('u') => input.clear(),
        KeyCode::Backspace => input.delete_char(),
        KeyCode::Delete => input.delete_char_forward(),
        KeyCode::Left => input.move_cursor_left(),
        KeyCode::Right => input.move_cursor_right(),
        KeyCode::Home => input.move_cursor_to_start(),
        KeyCode::End => input.move_cursor_to_end(),
        _ => return false,
    }
    true
}
