//! Traits shared by console screens

use crossterm::event::KeyEvent;
use ratatui::{layout::Rect, Frame};
use serde_json::Value;

use super::events::{MutationKind, TaskContext};
use crate::api::ApiResult;
use crate::models::{DetailRequest, RecordDetail, Resource};
use crate::toast::ToastKind;

/// Actions that screens can request
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenAction {
    None,
    Quit,
    /// Back to the main menu
    Back,
    Open(Resource),
    Refresh(Resource),
    /// Load a read-only detail popup for the current screen
    OpenDetail {
        resource: Resource,
        title: String,
        requests: Vec<DetailRequest>,
    },
    Toast(ToastKind, String),
    Login { username: String, password: String },
    Logout,
}

/// A resource screen with its row type erased, so the app can keep one per
/// resource
pub trait ResourceView: Send {
    fn resource(&self) -> Resource;

    fn draw(&mut self, f: &mut Frame, area: Rect);

    fn handle_key(&mut self, key: KeyEvent, ctx: &TaskContext) -> ScreenAction;

    fn set_loading(&mut self, loading: bool);

    fn has_loaded(&self) -> bool;

    /// Decode a list response into rows. Returns the message to show when
    /// the response cannot be used.
    fn apply_rows(&mut self, result: ApiResult<Value>) -> Option<String>;

    /// Fill the open detail popup. Returns the message to show on failure.
    fn apply_detail(&mut self, result: ApiResult<RecordDetail>) -> Option<String>;

    fn close_detail(&mut self);

    fn mutation_finished(&mut self, kind: MutationKind, succeeded: bool);

    /// Whether keys are going to a text input
    fn is_capturing_input(&self) -> bool;

    fn help(&self) -> String;
}

/// Field navigation for forms
pub trait FormHandler {
    fn field_count(&self) -> usize;

    fn current_index(&self) -> usize;

    fn set_current_index(&mut self, index: usize);

    fn next_field(&mut self) {
        let count = self.field_count();
        if count > 0 {
            self.set_current_index((self.current_index() + 1) % count);
        }
    }

    fn previous_field(&mut self) {
        let count = self.field_count();
        if count > 0 {
            let current = self.current_index();
            self.set_current_index(if current == 0 { count - 1 } else { current - 1 });
        }
    }
}
