//! CLI command implementations.

mod bot;
mod config;
mod define;
mod doctor;
mod session;
mod words;

pub use bot::run_bot;
pub use config::run_config;
pub use define::run_define;
pub use doctor::run_doctor;
pub use session::run_session;
pub use words::run_words;
