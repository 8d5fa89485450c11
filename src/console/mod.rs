//! Interactive admin console
//!
//! Sign in, pick a resource from the main menu, then browse, search, filter
//! and sort its rows and run whatever mutations the API allows for it. API
//! calls run on tokio tasks and report back through [`AppEvent`]s that the
//! event loop drains every tick.

pub mod app;
pub mod components;
pub mod events;
pub mod screens;
pub mod traits;
pub mod ui;

pub use app::App;
pub use events::AppEvent;

use std::io;

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use crate::api::ApiClient;
use crate::config::Config;

/// Take over the terminal, run the console until the user quits, and restore
/// the terminal even when the loop fails
pub async fn run(config: Config, client: ApiClient) -> Result<()> {
    let mut app = App::new(config, client)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!("Starting console loop");
    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!("Console loop finished");
    result
}
