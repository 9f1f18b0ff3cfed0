//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Logging backends
//! - Input events and container geometry

pub mod input;

pub use input::{ContainerRect, InputEvent};

/// Install the log backend for this platform
///
/// Native builds use `env_logger` (configure with `RUST_LOG`); the browser gets
/// `console_log` plus a panic hook that prints to the console. Safe to call
/// more than once.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}
