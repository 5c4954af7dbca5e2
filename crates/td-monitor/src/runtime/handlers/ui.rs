//! Small UI side effects: pane persistence, clipboard, toast timer.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use td_core::ConfigStore;

use super::{blocking, error_text};
use crate::common::Clipboard;
use crate::events::UiEvent;

pub async fn save_pane_heights(config: Arc<dyn ConfigStore>, heights: [f64; 3]) -> UiEvent {
    let result = blocking(move || {
        config
            .set_pane_heights(heights)
            .context("Failed to save pane heights")
    })
    .await;
    UiEvent::PaneHeightsSaved(result.map_err(|e| error_text(&e)))
}

pub async fn copy_to_clipboard(text: String, label: String) -> UiEvent {
    let result = blocking(move || Ok(Clipboard::copy(&text)?)).await;
    if let Err(error) = &result {
        tracing::debug!(%label, error = %error, "clipboard_copy_failed");
    }
    UiEvent::ClipboardFinished {
        label,
        result: result.map_err(|e| error_text(&e)),
    }
}

pub async fn clear_status_after(generation: u64, after: Duration) -> UiEvent {
    tokio::time::sleep(after).await;
    UiEvent::ClearStatus { generation }
}

#[cfg(test)]
mod tests {
    use td_core::FileConfig;
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn test_pane_heights_round_trip_through_config() {
        let dir = tempdir().unwrap();
        let config: Arc<dyn ConfigStore> = Arc::new(FileConfig::new(dir.path()));
        let event = save_pane_heights(Arc::clone(&config), [0.2, 0.5, 0.3]).await;
        assert!(matches!(event, UiEvent::PaneHeightsSaved(Ok(()))));
        assert_eq!(config.get_pane_heights().unwrap(), Some([0.2, 0.5, 0.3]));
    }

    #[tokio::test]
    async fn test_copy_reports_label() {
        // OSC 52 goes to the captured test stdout, so the copy succeeds.
        let event = copy_to_clipboard("td-abc123".into(), "td-abc123".into()).await;
        let UiEvent::ClipboardFinished { label, result } = event else {
            panic!("expected clipboard result");
        };
        assert_eq!(label, "td-abc123");
        assert!(result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_status_waits() {
        let start = tokio::time::Instant::now();
        let event = clear_status_after(4, Duration::from_secs(2)).await;
        assert!(matches!(event, UiEvent::ClearStatus { generation: 4 }));
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
