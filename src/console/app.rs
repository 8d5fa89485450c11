//! Main console application state and event loop

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info, warn};

use super::components::ToastDisplay;
use super::events::{AppEvent, TaskContext};
use super::screens::{help, LoginScreen, MainMenuScreen, ResourceScreen};
use super::traits::{ResourceView, ScreenAction};
use super::ui::centered_rect;
use crate::api::ApiClient;
use crate::config::Config;
use crate::models::{
    AuditLog, ChatSession, Feedback, Mechanic, Resource, ServiceRequest, User, Vehicle,
};
use crate::query::RequestSequencer;
use crate::toast::ToastStore;

const TICK_RATE: Duration = Duration::from_millis(100);

/// Application screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    MainMenu,
    Resource(Resource),
}

impl Screen {
    fn name(&self) -> &'static str {
        match self {
            Screen::Login => "Sign In",
            Screen::MainMenu => "Main Menu",
            Screen::Resource(resource) => resource.title(),
        }
    }
}

fn resource_screens(page_size: usize) -> HashMap<Resource, Box<dyn ResourceView>> {
    let screens: Vec<Box<dyn ResourceView>> = vec![
        Box::new(ResourceScreen::<User>::new(page_size)),
        Box::new(ResourceScreen::<Mechanic>::new(page_size)),
        Box::new(ResourceScreen::<Vehicle>::new(page_size)),
        Box::new(ResourceScreen::<ServiceRequest>::new(page_size)),
        Box::new(ResourceScreen::<Feedback>::new(page_size)),
        Box::new(ResourceScreen::<ChatSession>::new(page_size)),
        Box::new(ResourceScreen::<AuditLog>::new(page_size)),
    ];
    screens
        .into_iter()
        .map(|screen| (screen.resource(), screen))
        .collect()
}

/// Main console application state
pub struct App {
    /// Current active screen
    pub current_screen: Screen,
    /// Previous screen for navigation
    pub previous_screen: Option<Screen>,
    /// Application configuration
    pub config: Config,

    client: ApiClient,
    ctx: TaskContext,
    events: UnboundedReceiver<AppEvent>,
    sequencer: RequestSequencer,
    pub toasts: ToastStore,
    toast_display: ToastDisplay,

    // Screen states
    pub login: LoginScreen,
    pub main_menu: MainMenuScreen,
    resources: HashMap<Resource, Box<dyn ResourceView>>,

    // Global application state
    pub should_quit: bool,
    pub show_help_popup: bool,
    pub status_message: Option<String>,
}

impl App {
    /// Create the application. Starts at the login screen unless a token is
    /// already stored.
    pub fn new(config: Config, client: ApiClient) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let ctx = TaskContext::new(Arc::new(client.clone()), tx);

        let mut toasts = ToastStore::new(config.toast_timeout());
        toasts.subscribe(|current| debug!("{} toast(s) showing", current.len()));

        let current_screen = if client.is_authenticated() {
            Screen::MainMenu
        } else {
            Screen::Login
        };

        Ok(Self {
            current_screen,
            previous_screen: None,
            login: LoginScreen::new(&config.api_url)?,
            main_menu: MainMenuScreen::new(&config.api_url),
            resources: resource_screens(config.ui.page_size),
            config,

            client,
            ctx,
            events: rx,
            sequencer: RequestSequencer::new(),
            toasts,
            toast_display: ToastDisplay::new(),

            should_quit: false,
            show_help_popup: false,
            status_message: None,
        })
    }

    /// Run the main application loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        if self.config.api_url_is_fallback {
            self.toasts
                .info(format!("MECHDESK_API_URL not set, using {}", self.config.api_url));
        }

        loop {
            terminal.draw(|f| self.draw(f))?;

            if event::poll(TICK_RATE)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key_event(key);
                }
            }

            self.tick();

            if self.should_quit {
                break;
            }
        }

        self.toasts.dispose();
        Ok(())
    }

    /// Apply finished background work and expire old toasts
    pub fn tick(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_app_event(event);
        }
        self.toasts.prune_expired(Instant::now());
    }

    pub fn resource_view(&self, resource: Resource) -> Option<&dyn ResourceView> {
        self.resources.get(&resource).map(|screen| screen.as_ref())
    }

    fn is_capturing_input(&self) -> bool {
        match self.current_screen {
            Screen::Login => true,
            Screen::MainMenu => false,
            Screen::Resource(resource) => self
                .resources
                .get(&resource)
                .is_some_and(|screen| screen.is_capturing_input()),
        }
    }

    /// Handle keyboard input events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        // Global shortcuts
        let capturing = self.is_capturing_input();
        match key.code {
            KeyCode::F(1) => {
                self.show_help_popup = !self.show_help_popup;
                return;
            }
            KeyCode::Char('?') if !capturing => {
                self.show_help_popup = !self.show_help_popup;
                return;
            }
            KeyCode::Esc if self.show_help_popup => {
                self.show_help_popup = false;
                return;
            }
            KeyCode::Char('q') if !capturing => {
                self.should_quit = true;
                return;
            }
            _ => {}
        }

        if self.show_help_popup {
            return;
        }

        let action = match self.current_screen {
            Screen::Login => self.login.handle_key(key),
            Screen::MainMenu => self.main_menu.handle_key(key),
            Screen::Resource(resource) => match self.resources.get_mut(&resource) {
                Some(screen) => screen.handle_key(key, &self.ctx),
                None => ScreenAction::None,
            },
        };
        self.apply_action(action);
    }

    fn apply_action(&mut self, action: ScreenAction) {
        match action {
            ScreenAction::None => {}
            ScreenAction::Quit => self.should_quit = true,
            ScreenAction::Back => self.navigate_to_screen(Screen::MainMenu),
            ScreenAction::Open(resource) => {
                self.navigate_to_screen(Screen::Resource(resource));
                self.refresh(resource);
            }
            ScreenAction::Refresh(resource) => self.refresh(resource),
            ScreenAction::OpenDetail {
                resource,
                title,
                requests,
            } => {
                let ticket = self.sequencer.issue(resource.detail_key());
                debug!("Fetching {} detail '{}' (seq {})", resource, title, ticket.seq);
                self.ctx.spawn_detail(resource, ticket, title, requests);
            }
            ScreenAction::Toast(kind, message) => {
                self.toasts.publish(kind, message);
            }
            ScreenAction::Login { username, password } => {
                info!("Signing in as {}", username);
                self.set_status("Signing in...".to_string());
                self.ctx.spawn_login(self.client.clone(), username, password);
            }
            ScreenAction::Logout => {
                match self.client.logout() {
                    Ok(()) => {
                        info!("Signed out");
                        self.toasts.info("Signed out");
                    }
                    Err(e) => {
                        warn!("Failed to clear token: {}", e);
                        self.toasts.error(format!("Failed to sign out: {}", e));
                    }
                }
                self.show_login();
            }
        }
    }

    /// Fetch a resource list. Any response to an older fetch of the same
    /// resource is dropped when it arrives.
    fn refresh(&mut self, resource: Resource) {
        let ticket = self.sequencer.issue(resource.key());
        debug!("Fetching {} (seq {})", resource, ticket.seq);
        if let Some(screen) = self.resources.get_mut(&resource) {
            screen.set_loading(true);
        }
        self.ctx.spawn_list(resource, ticket);
    }

    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ListLoaded {
                ticket,
                resource,
                result,
            } => {
                if !self.sequencer.accept(&ticket) {
                    return;
                }
                let Some(screen) = self.resources.get_mut(&resource) else {
                    return;
                };
                match result {
                    Err(e) if e.is_unauthorized() => {
                        screen.set_loading(false);
                        self.session_expired(&e.to_string());
                    }
                    result => {
                        if let Some(message) = screen.apply_rows(result) {
                            self.toasts.error(message);
                        }
                    }
                }
            }
            AppEvent::DetailLoaded {
                ticket,
                resource,
                result,
            } => {
                if !self.sequencer.accept(&ticket) {
                    return;
                }
                let Some(screen) = self.resources.get_mut(&resource) else {
                    return;
                };
                match result {
                    Err(e) if e.is_unauthorized() => {
                        screen.close_detail();
                        self.session_expired(&e.to_string());
                    }
                    result => {
                        if let Some(message) = screen.apply_detail(result) {
                            self.toasts.error(message);
                        }
                    }
                }
            }
            AppEvent::MutationFinished {
                resource,
                kind,
                result,
            } => {
                let succeeded = result.is_ok();
                if let Some(screen) = self.resources.get_mut(&resource) {
                    screen.mutation_finished(kind, succeeded);
                }
                match result {
                    Ok(_) => {
                        info!("{} {}", resource.noun(), kind.past_tense());
                        self.toasts.success(format!(
                            "{} {} successfully",
                            resource.noun(),
                            kind.past_tense()
                        ));
                        self.refresh(resource);
                    }
                    Err(e) if e.is_unauthorized() => self.session_expired(&e.to_string()),
                    Err(e) => {
                        warn!("{} mutation failed: {}", resource, e);
                        self.toasts.error(e.to_string());
                    }
                }
            }
            AppEvent::LoginFinished(result) => {
                self.clear_messages();
                match result {
                    Ok(_) => {
                        info!("Signed in to {}", self.config.api_url);
                        self.toasts.success("Signed in");
                        if let Err(e) = self.login.reset() {
                            warn!("Cannot reset login form: {}", e);
                        }
                        self.navigate_to_screen(Screen::MainMenu);
                    }
                    Err(e) => {
                        warn!("Sign in failed: {}", e);
                        self.login.set_loading(false);
                        self.toasts.error(format!("Sign in failed: {}", e));
                    }
                }
            }
        }
    }

    /// A 401 anywhere sends the user back to sign in. The stored token is
    /// left in place.
    fn session_expired(&mut self, message: &str) {
        warn!("Unauthorized response: {}", message);
        self.toasts.error(format!("Session expired: {}", message));
        self.show_login();
    }

    /// Responses still in flight belong to the old session and are dropped
    fn show_login(&mut self) {
        for resource in Resource::ALL {
            self.sequencer.invalidate(resource.key());
            self.sequencer.invalidate(&resource.detail_key());
        }
        for screen in self.resources.values_mut() {
            screen.close_detail();
        }
        if let Err(e) = self.login.reset() {
            warn!("Cannot reset login form: {}", e);
        }
        self.navigate_to_screen(Screen::Login);
    }

    /// Draw the UI
    pub fn draw(&mut self, f: &mut Frame) {
        let size = f.size();

        // Main layout: status bar at bottom, content area above
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        match self.current_screen {
            Screen::Login => self.login.draw(f, chunks[0]),
            Screen::MainMenu => self.main_menu.draw(f, chunks[0]),
            Screen::Resource(resource) => {
                if let Some(screen) = self.resources.get_mut(&resource) {
                    screen.draw(f, chunks[0]);
                }
            }
        }

        self.draw_status_bar(f, chunks[1]);
        self.toast_display.render(f, chunks[0], self.toasts.current());

        if self.show_help_popup {
            self.draw_help_popup(f, size);
        }
    }

    /// Draw status bar with current screen info and shortcuts
    fn draw_status_bar(&self, f: &mut Frame, area: Rect) {
        let (status_text, style) = match &self.status_message {
            Some(msg) => (format!("Status: {}", msg), Style::default().fg(Color::Green)),
            None => (
                format!(
                    "mechdesk - {} | {} | ESC: Back | q: Quit | F1/?: Help",
                    self.current_screen.name(),
                    self.config.api_url
                ),
                Style::default().fg(Color::Gray),
            ),
        };

        let status_bar = Paragraph::new(status_text)
            .style(style)
            .block(Block::default().borders(Borders::ALL));

        f.render_widget(status_bar, area);
    }

    /// Draw help popup with context-sensitive shortcuts
    fn draw_help_popup(&self, f: &mut Frame, area: Rect) {
        let popup_area = centered_rect(80, 70, area);

        f.render_widget(Clear, popup_area);

        let help_popup = Paragraph::new(self.get_context_help())
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title("Help - Context Shortcuts")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Yellow)),
            )
            .style(Style::default().fg(Color::White));

        f.render_widget(help_popup, popup_area);
    }

    /// Get context-sensitive help content
    fn get_context_help(&self) -> String {
        let screen_help = match self.current_screen {
            Screen::Login => help::LOGIN_HELP.to_string(),
            Screen::MainMenu => help::MAIN_MENU_HELP.to_string(),
            Screen::Resource(resource) => self
                .resources
                .get(&resource)
                .map(|screen| screen.help())
                .unwrap_or_default(),
        };
        format!("{}{}", help::GLOBAL_HELP, screen_help)
    }

    /// Navigate to a specific screen
    pub fn navigate_to_screen(&mut self, screen: Screen) {
        self.previous_screen = Some(self.current_screen);
        self.current_screen = screen;
        self.clear_messages();
    }

    /// Set status message
    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
    }

    /// Clear status message
    pub fn clear_messages(&mut self) {
        self.status_message = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, MemoryTokenStore, TokenResponse};
    use crate::config::{HttpConfig, UiConfig};
    use crate::console::events::MutationKind;
    use crate::query::RequestTicket;
    use crate::toast::ToastKind;
    use serde_json::json;
    use std::path::PathBuf;

    // Nothing listens here, so spawned requests fail fast
    const DEAD_URL: &str = "http://127.0.0.1:9";

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app(token: Option<&str>) -> App {
        let config = Config {
            api_url: DEAD_URL.to_string(),
            api_url_is_fallback: false,
            token_path: PathBuf::from("unused-session.json"),
            http: HttpConfig::default(),
            ui: UiConfig::default(),
        };
        let store = match token {
            Some(token) => MemoryTokenStore::with_token(token),
            None => MemoryTokenStore::new(),
        };
        let client = ApiClient::with_base_url(DEAD_URL, Arc::new(store)).unwrap();
        App::new(config, client).unwrap()
    }

    fn unauthorized() -> ApiError {
        ApiError::Status {
            status: 401,
            message: "Not authenticated".to_string(),
        }
    }

    fn last_toast(app: &App) -> Option<(ToastKind, String)> {
        app.toasts
            .current()
            .last()
            .map(|toast| (toast.kind, toast.message.clone()))
    }

    #[tokio::test]
    async fn test_start_screen_follows_stored_token() {
        assert_eq!(app(None).current_screen, Screen::Login);
        assert_eq!(app(Some("t")).current_screen, Screen::MainMenu);
    }

    #[tokio::test]
    async fn test_stale_list_responses_are_dropped() {
        let mut app = app(Some("t"));
        app.handle_key_event(key(KeyCode::Enter));
        assert_eq!(app.current_screen, Screen::Resource(Resource::Users));
        app.handle_key_event(key(KeyCode::Char('r')));

        let rows = json!([{"_id": "u1", "name": "Alice"}]);
        app.handle_app_event(AppEvent::ListLoaded {
            ticket: RequestTicket { key: "users".to_string(), seq: 1 },
            resource: Resource::Users,
            result: Ok(rows.clone()),
        });
        assert!(!app.resource_view(Resource::Users).unwrap().has_loaded());

        app.handle_app_event(AppEvent::ListLoaded {
            ticket: RequestTicket { key: "users".to_string(), seq: 2 },
            resource: Resource::Users,
            result: Ok(rows),
        });
        assert!(app.resource_view(Resource::Users).unwrap().has_loaded());
    }

    #[tokio::test]
    async fn test_unauthorized_returns_to_login_and_keeps_token() {
        let mut app = app(Some("t"));
        app.apply_action(ScreenAction::Open(Resource::Mechanics));
        let ticket = RequestTicket { key: "mechanics".to_string(), seq: 1 };

        app.handle_app_event(AppEvent::ListLoaded {
            ticket,
            resource: Resource::Mechanics,
            result: Err(unauthorized()),
        });

        assert_eq!(app.current_screen, Screen::Login);
        assert_eq!(
            last_toast(&app),
            Some((ToastKind::Error, "Session expired: Not authenticated".to_string()))
        );
        assert!(app.client.is_authenticated());
    }

    #[tokio::test]
    async fn test_mutation_results_become_toasts() {
        let mut app = app(Some("t"));
        app.apply_action(ScreenAction::Open(Resource::Users));

        app.handle_app_event(AppEvent::MutationFinished {
            resource: Resource::Users,
            kind: MutationKind::Create,
            result: Ok(json!({})),
        });
        assert_eq!(
            last_toast(&app),
            Some((ToastKind::Success, "User created successfully".to_string()))
        );
        // The list is fetched again, so the first fetch is now stale
        let first = RequestTicket { key: "users".to_string(), seq: 1 };
        assert!(!app.sequencer.is_current(&first));

        app.handle_app_event(AppEvent::MutationFinished {
            resource: Resource::Users,
            kind: MutationKind::Delete,
            result: Err(ApiError::Status {
                status: 409,
                message: "User has open service requests".to_string(),
            }),
        });
        assert_eq!(
            last_toast(&app),
            Some((ToastKind::Error, "User has open service requests".to_string()))
        );
        assert_eq!(app.current_screen, Screen::Resource(Resource::Users));
    }

    #[tokio::test]
    async fn test_login_result_moves_to_menu() {
        let mut app = app(None);
        app.handle_app_event(AppEvent::LoginFinished(Err(unauthorized())));
        assert_eq!(app.current_screen, Screen::Login);
        assert_eq!(last_toast(&app).map(|(kind, _)| kind), Some(ToastKind::Error));

        app.handle_app_event(AppEvent::LoginFinished(Ok(TokenResponse {
            access_token: "abc".to_string(),
            token_type: Some("bearer".to_string()),
        })));
        assert_eq!(app.current_screen, Screen::MainMenu);
    }

    #[tokio::test]
    async fn test_quit_and_help_keys() {
        let mut signed_out = app(None);
        // On the login form `q` is text
        signed_out.handle_key_event(key(KeyCode::Char('q')));
        assert!(!signed_out.should_quit);

        signed_out.handle_key_event(key(KeyCode::F(1)));
        assert!(signed_out.show_help_popup);
        assert!(signed_out.get_context_help().contains("Sign In:"));
        signed_out.handle_key_event(key(KeyCode::Esc));
        assert!(!signed_out.show_help_popup);

        let mut signed_in = app(Some("t"));
        signed_in.handle_key_event(key(KeyCode::Char('q')));
        assert!(signed_in.should_quit);
    }

    #[tokio::test]
    async fn test_expired_toasts_are_pruned_on_tick() {
        let mut app = app(Some("t"));
        app.toasts
            .publish_at(ToastKind::Info, "old", Instant::now() - Duration::from_secs(10));
        app.toasts.info("fresh");
        app.tick();
        let messages: Vec<&str> = app.toasts.current().iter().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, vec!["fresh"]);
    }

    #[tokio::test]
    async fn test_responses_from_before_logout_are_dropped() {
        let mut app = app(Some("t"));
        app.apply_action(ScreenAction::Open(Resource::Users));
        app.apply_action(ScreenAction::Logout);
        assert_eq!(app.current_screen, Screen::Login);
        assert!(!app.client.is_authenticated());

        app.handle_app_event(AppEvent::ListLoaded {
            ticket: RequestTicket { key: "users".to_string(), seq: 1 },
            resource: Resource::Users,
            result: Ok(json!([{"_id": "u1", "name": "Alice"}])),
        });
        assert!(!app.resource_view(Resource::Users).unwrap().has_loaded());
    }

    #[tokio::test]
    async fn test_detail_results_follow_the_newest_request() {
        let mut app = app(Some("t"));
        app.apply_action(ScreenAction::Open(Resource::Chats));
        let open_detail = || ScreenAction::OpenDetail {
            resource: Resource::Chats,
            title: "Brake squeal".to_string(),
            requests: Resource::Chats.detail_requests("c1"),
        };
        app.apply_action(open_detail());
        app.apply_action(open_detail());
        let toasts_before = app.toasts.current().len();

        let failed = |seq| AppEvent::DetailLoaded {
            ticket: RequestTicket { key: "chats:detail".to_string(), seq },
            resource: Resource::Chats,
            result: Err(ApiError::Payload("bad body".to_string())),
        };
        app.handle_app_event(failed(2));
        assert_eq!(app.toasts.current().len(), toasts_before);

        app.handle_app_event(failed(3));
        assert_eq!(
            last_toast(&app),
            Some((ToastKind::Error, "Failed to load details: Invalid request payload: bad body".to_string()))
        );

        app.apply_action(open_detail());
        app.handle_app_event(AppEvent::DetailLoaded {
            ticket: RequestTicket { key: "chats:detail".to_string(), seq: 4 },
            resource: Resource::Chats,
            result: Err(unauthorized()),
        });
        assert_eq!(app.current_screen, Screen::Login);
    }
}
