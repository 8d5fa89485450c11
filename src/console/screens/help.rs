//! Context help shown in the F1 popup

use crate::models::Resource;

pub const GLOBAL_HELP: &str = "Global Shortcuts:\n\
    ESC - Go back / close popup\n\
    q - Quit application (outside text input)\n\
    Ctrl-C - Quit application\n\
    F1 / ? - Toggle this help\n\n";

pub const LOGIN_HELP: &str = "Sign In:\n\
    Tab / Shift+Tab - Move between fields\n\
    Enter - Next field, or sign in from the last one\n\
    Ctrl-S - Sign in\n\
    ESC - Quit";

pub const MAIN_MENU_HELP: &str = "Main Menu:\n\
    ↑/↓ - Navigate resources\n\
    Enter - Open resource\n\
    1-7 - Open resource directly\n\
    L - Sign out";

const TABLE_HELP: &str = "Table:\n\
    ↑/↓ - Select row\n\
    PgUp/PgDn - Previous / next page\n\
    / - Search all fields\n\
    f - Filter by column (Tab cycles columns)\n\
    c - Clear search and filters\n\
    1-9 - Toggle sort on column N\n\
    r - Refresh";

const FORM_HELP: &str = "Form:\n\
    Tab / Shift+Tab - Move between fields\n\
    ↑/↓ - Move through options\n\
    Space - Toggle checkbox / pick option\n\
    Ctrl-S - Save\n\
    ESC - Cancel";

/// Keys for a resource screen, limited to what the resource allows
pub fn resource_help(resource: Resource) -> String {
    let mut actions = Vec::new();
    if resource.can_create() {
        actions.push("a - Add");
    }
    if resource.can_update() {
        actions.push("e / Enter - Edit selected");
    }
    if resource.can_delete() {
        actions.push("d - Delete selected (asks first)");
    }
    if resource.can_verify() {
        actions.push("v - Verify / unverify selected");
    }
    if resource.has_details() {
        actions.push(if resource.can_update() {
            "i - Details of selected"
        } else {
            "i / Enter - Details of selected"
        });
    }
    if resource.has_summary() {
        actions.push("s - Summary");
    }

    let mut help = format!("{}\n\n{}", resource.title(), TABLE_HELP);
    if !actions.is_empty() {
        help.push_str("\n\nActions:\n");
        help.push_str(&actions.join("\n"));
    }
    if resource.can_create() || resource.can_update() {
        help.push_str("\n\n");
        help.push_str(FORM_HELP);
    }
    help
}
