//! Console screens

pub mod help;
pub mod login;
pub mod main_menu;
pub mod resource;

pub use login::LoginScreen;
pub use main_menu::MainMenuScreen;
pub use resource::ResourceScreen;
