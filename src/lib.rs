// Library surface for the binary and for headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod question;
pub mod results;
pub mod runtime;
pub mod session;
pub mod source;
pub mod store;
pub mod timer;
pub mod ui;
pub mod util;
