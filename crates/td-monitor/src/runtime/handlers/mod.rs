//! Effect handlers for the monitor runtime.
//!
//! Handlers perform I/O and never touch state. Most are pure async
//! functions returning the `UiEvent` that reports their outcome; the runtime
//! spawns them with `spawn_effect` and forwards the result to the inbox.
//! Database calls are blocking and run on `spawn_blocking` threads.
//!
//! ```ignore
//! // Handler: pure async, returns UiEvent
//! pub async fn fetch_stats(db: Arc<dyn Database>) -> UiEvent { ... }
//!
//! // Runtime: spawns and sends to inbox
//! self.spawn_effect(move || handlers::fetch_stats(db));
//! ```

pub mod data;
pub mod details;
pub mod editor;
pub mod mutations;
pub mod ui;

use anyhow::{Context, Result};
pub use data::*;
pub use details::*;
pub use editor::*;
pub use mutations::*;
pub use ui::*;

/// Runs a blocking closure off the async workers.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("Blocking task failed")?
}

/// Errors cross the reducer boundary as display strings.
pub(crate) fn error_text(error: &anyhow::Error) -> String {
    format!("{error:#}")
}
