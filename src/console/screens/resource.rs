//! Generic screen for one admin resource: table, form popup, delete
//! confirmation and the read-only detail popup

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use serde_json::Value;
use tracing::{debug, warn};

use super::help;
use crate::api::ApiResult;
use crate::console::{
    components::{
        DetailAction, DetailView, DynamicForm, DynamicTable, DynamicTableConfig, FormAction,
        TableAction,
    },
    events::{MutationKind, TaskContext},
    traits::{ResourceView, ScreenAction},
    ui::{centered_rect, Styles},
};
use crate::models::{decode_list, AdminResource, RecordDetail, Resource};
use crate::schema::{CellValue, ColumnKey, TableRow};
use crate::toast::ToastKind;

/// Open form and the record it edits, if any
struct FormPopup {
    form: DynamicForm,
    editing: Option<String>,
}

pub struct ResourceScreen<R: AdminResource> {
    table: DynamicTable<R>,
    popup: Option<FormPopup>,
    confirm_delete: Option<R>,
    detail: Option<DetailView>,
}

impl<R: AdminResource> ResourceScreen<R> {
    pub fn new(page_size: usize) -> Self {
        let resource = R::RESOURCE;
        let config = DynamicTableConfig::new(resource.title())
            .with_actions(resource.can_create(), resource.can_update(), resource.can_delete())
            .with_pagination(page_size);
        Self {
            table: DynamicTable::new(R::columns(), config),
            popup: None,
            confirm_delete: None,
            detail: None,
        }
    }

    pub fn table(&self) -> &DynamicTable<R> {
        &self.table
    }

    pub fn is_form_open(&self) -> bool {
        self.popup.is_some()
    }

    pub fn pending_delete(&self) -> Option<&R> {
        self.confirm_delete.as_ref()
    }

    pub fn detail(&self) -> Option<&DetailView> {
        self.detail.as_ref()
    }

    /// Detail popup for the selected row
    fn open_detail(&mut self) -> ScreenAction {
        let Some(row) = self.table.selected_row() else {
            return ScreenAction::None;
        };
        let title = row.display_name();
        let requests = R::RESOURCE.detail_requests(&row.row_id());
        self.detail = Some(DetailView::loading(format!("{} - loading...", title)));
        ScreenAction::OpenDetail {
            resource: R::RESOURCE,
            title,
            requests,
        }
    }

    fn open_summary(&mut self) -> ScreenAction {
        let title = format!("{} summary", R::RESOURCE.title());
        self.detail = Some(DetailView::loading(format!("{} - loading...", title)));
        ScreenAction::OpenDetail {
            resource: R::RESOURCE,
            title,
            requests: R::RESOURCE.summary_requests(),
        }
    }

    fn open_form(&mut self, editing: Option<&R>) -> ScreenAction {
        let (title, seed, id) = match editing {
            Some(row) => (
                format!("Edit {}", R::RESOURCE.noun()),
                row.edit_form_data(),
                Some(row.row_id()),
            ),
            None => (
                format!("Add {}", R::RESOURCE.noun()),
                R::new_form_data(),
                None,
            ),
        };
        match DynamicForm::new(&title, R::form_fields(), &seed) {
            Ok(form) => {
                self.popup = Some(FormPopup { form, editing: id });
                ScreenAction::None
            }
            Err(e) => {
                warn!("Cannot build {} form: {}", R::RESOURCE, e);
                ScreenAction::Toast(ToastKind::Error, format!("Cannot open form: {}", e))
            }
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent, ctx: &TaskContext) -> ScreenAction {
        let Some(popup) = self.popup.as_mut() else {
            return ScreenAction::None;
        };
        match popup.form.handle_key(key) {
            FormAction::Submit(submission) => {
                debug!("Submitting {} form ({} keys)", R::RESOURCE, submission.len());
                popup.form.set_loading(true);
                ctx.spawn_submit::<R>(popup.editing.clone(), popup.form.fields().to_vec(), submission);
            }
            FormAction::Cancel => self.popup = None,
            FormAction::None => {}
        }
        ScreenAction::None
    }

    fn handle_confirm_key(&mut self, key: KeyEvent, ctx: &TaskContext) -> ScreenAction {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                if let Some(row) = self.confirm_delete.take() {
                    ctx.spawn_delete(R::RESOURCE, row.row_id());
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.confirm_delete = None;
            }
            _ => {}
        }
        ScreenAction::None
    }

    /// `v` on a row with an `is_verified` flag flips it
    fn toggle_verification(&self, ctx: &TaskContext) -> ScreenAction {
        let Some(row) = self.table.selected_row() else {
            return ScreenAction::None;
        };
        let Some(key) = R::Key::from_name("is_verified") else {
            return ScreenAction::None;
        };
        let verify = !matches!(row.cell(key), CellValue::Bool(true));
        ctx.spawn_verify(row.row_id(), verify);
        ScreenAction::Toast(
            ToastKind::Info,
            format!(
                "{} {}...",
                if verify { "Verifying" } else { "Unverifying" },
                row.display_name()
            ),
        )
    }

    fn draw_confirm(&self, f: &mut Frame, area: Rect, row: &R) {
        let popup_area = centered_rect(50, 20, area);
        let text = vec![
            Line::from(format!(
                "Delete {} \"{}\"?",
                R::RESOURCE.noun().to_lowercase(),
                row.display_name()
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("y", Styles::title()),
                Span::raw(" confirm   "),
                Span::styled("n", Styles::title()),
                Span::raw(" cancel"),
            ]),
        ];
        let paragraph = Paragraph::new(text).wrap(Wrap { trim: true }).block(
            Block::default()
                .title("Confirm Delete")
                .borders(Borders::ALL)
                .border_style(Styles::error()),
        );
        f.render_widget(Clear, popup_area);
        f.render_widget(paragraph, popup_area);
    }
}

impl<R: AdminResource> ResourceView for ResourceScreen<R> {
    fn resource(&self) -> Resource {
        R::RESOURCE
    }

    fn draw(&mut self, f: &mut Frame, area: Rect) {
        self.table.render(f, area);

        if let Some(row) = &self.confirm_delete {
            self.draw_confirm(f, area, row);
        }

        if let Some(popup) = self.popup.as_mut() {
            let popup_area = centered_rect(70, 85, area);
            f.render_widget(Clear, popup_area);
            popup.form.render(f, popup_area);
        }

        if let Some(detail) = &self.detail {
            detail.render(f, centered_rect(75, 80, area));
        }
    }

    fn handle_key(&mut self, key: KeyEvent, ctx: &TaskContext) -> ScreenAction {
        if self.popup.is_some() {
            return self.handle_form_key(key, ctx);
        }
        if self.confirm_delete.is_some() {
            return self.handle_confirm_key(key, ctx);
        }
        if let Some(detail) = self.detail.as_mut() {
            if detail.handle_key(key) == DetailAction::Close {
                self.detail = None;
            }
            return ScreenAction::None;
        }

        match self.table.handle_key(key) {
            TableAction::Add => self.open_form(None),
            TableAction::Edit(row) => self.open_form(Some(&row)),
            TableAction::Delete(row) => {
                self.confirm_delete = Some(row);
                ScreenAction::None
            }
            TableAction::Refresh => ScreenAction::Refresh(R::RESOURCE),
            TableAction::Unhandled(key) => match key.code {
                KeyCode::Char('v') if R::RESOURCE.can_verify() => self.toggle_verification(ctx),
                KeyCode::Char('i') if R::RESOURCE.has_details() => self.open_detail(),
                // Enter opens the detail only where it is not taken by edit
                KeyCode::Enter if R::RESOURCE.has_details() => self.open_detail(),
                KeyCode::Char('s') if R::RESOURCE.has_summary() => self.open_summary(),
                KeyCode::Esc | KeyCode::Backspace => ScreenAction::Back,
                _ => ScreenAction::None,
            },
            TableAction::None => ScreenAction::None,
        }
    }

    fn set_loading(&mut self, loading: bool) {
        self.table.set_loading(loading);
    }

    fn has_loaded(&self) -> bool {
        self.table.has_loaded()
    }

    fn apply_rows(&mut self, result: ApiResult<Value>) -> Option<String> {
        let decoded = result.and_then(|value| decode_list::<R>(value, R::RESOURCE.list_wrappers()));
        match decoded {
            Ok(rows) => {
                debug!("Loaded {} {} rows", rows.len(), R::RESOURCE);
                self.table.set_rows(rows);
                None
            }
            Err(e) => {
                warn!("Failed to load {}: {}", R::RESOURCE, e);
                self.table.set_loading(false);
                Some(format!("Failed to load {}: {}", R::RESOURCE.title().to_lowercase(), e))
            }
        }
    }

    fn apply_detail(&mut self, result: ApiResult<RecordDetail>) -> Option<String> {
        match result {
            Ok(detail) => {
                match self.detail.as_mut() {
                    Some(view) => view.set_detail(detail),
                    None => debug!("Detail for {} arrived after its popup closed", R::RESOURCE),
                }
                None
            }
            Err(e) => {
                warn!("Failed to load {} detail: {}", R::RESOURCE, e);
                self.detail = None;
                Some(format!("Failed to load details: {}", e))
            }
        }
    }

    fn close_detail(&mut self) {
        self.detail = None;
    }

    fn mutation_finished(&mut self, kind: MutationKind, succeeded: bool) {
        match kind {
            MutationKind::Create | MutationKind::Update => {
                if succeeded {
                    self.popup = None;
                } else if let Some(popup) = self.popup.as_mut() {
                    popup.form.set_loading(false);
                }
            }
            MutationKind::Delete | MutationKind::Verify(_) => {}
        }
    }

    fn is_capturing_input(&self) -> bool {
        self.popup.is_some() || self.table.is_capturing_input()
    }

    fn help(&self) -> String {
        help::resource_help(R::RESOURCE)
    }
}
