// Library surface for the binary and the integration tests.
// Terminal setup and key handling stay in main.rs.
pub mod api;
pub mod app_dirs;
pub mod chat;
pub mod clock;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod game;
pub mod keystroke;
pub mod progress;
pub mod runtime;
pub mod session;
pub mod ui;
pub mod util;
pub mod view;
pub mod wpm;
