//! Terminal resize watcher.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::control::{ControlPlane, TerminalSize};

/// Consume resize events and forward each as a control-plane call.
///
/// Resize is best-effort and runs out of band relative to the data path: a
/// failed call is logged and the watcher keeps going. The task ends when
/// the event source closes.
pub(crate) fn spawn_resize_watcher(
    control: Arc<dyn ControlPlane>,
    container_id: String,
    mut resize: mpsc::Receiver<TerminalSize>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(size) = resize.recv().await {
            tracing::debug!(
                container_id = %container_id,
                width = size.width,
                height = size.height,
                "Got a resize event"
            );
            if let Err(error) = control.set_window_size(&container_id, size).await {
                tracing::warn!(
                    container_id = %container_id,
                    %error,
                    "Failed to resize container terminal"
                );
            }
        }
        tracing::debug!(container_id = %container_id, "Resize event source closed");
    })
}
