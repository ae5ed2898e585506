// Declare all modules as public so they can be used by a UI shell and tests.
pub mod app;
pub mod config;
pub mod core;
pub mod host;
pub mod thumbnail;
pub mod utils;
