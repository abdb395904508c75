use std::future::Future;

use tokio::sync::mpsc;

use crate::camera::{CameraChoice, CameraDescriptor};

/// Camera failure as reported by the platform.
///
/// `name` carries the platform's error identifier (for browsers, the
/// `DOMException` name such as `NotAllowedError`) when one is available.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {message}", .name.as_deref().unwrap_or("Error"))]
pub struct CameraError {
    pub name: Option<String>,
    pub message: String,
}

impl CameraError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            message: message.into(),
        }
    }

    pub fn unnamed(message: impl Into<String>) -> Self {
        Self {
            name: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("clipboard unavailable: {0}")]
pub struct ClipboardError(pub String);

/// Identifies one camera binding; decode results carry it so results from a
/// replaced binding can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(pub(crate) u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Decoded {
    pub binding: BindingId,
    pub text: String,
}

/// The single result handler registered for a camera binding.
#[derive(Debug, Clone)]
pub struct DecodeSink {
    binding: BindingId,
    tx: mpsc::UnboundedSender<Decoded>,
}

impl DecodeSink {
    pub(crate) fn new(binding: BindingId, tx: mpsc::UnboundedSender<Decoded>) -> Self {
        Self { binding, tx }
    }

    pub fn binding(&self) -> BindingId {
        self.binding
    }

    /// Hand a decoded payload to the session. Returns `false` once the
    /// session is gone.
    pub fn deliver(&self, text: impl Into<String>) -> bool {
        self.tx
            .send(Decoded {
                binding: self.binding,
                text: text.into(),
            })
            .is_ok()
    }
}

/// Camera and decoder capability driving a scan session.
///
/// Implementations own the platform stream. `start` is only called when no
/// stream is active; `stop` releases the stream and must drop the sink it
/// was given.
pub trait CameraBackend: Send + 'static {
    /// Enumerate video inputs. Called once per session start.
    fn list_cameras(&mut self) -> impl Future<Output = Result<Vec<CameraDescriptor>, CameraError>> + Send;

    /// Acquire `camera` and begin decoding, delivering payloads to `sink`.
    fn start(
        &mut self,
        camera: &CameraChoice,
        sink: DecodeSink,
    ) -> impl Future<Output = Result<(), CameraError>> + Send;

    /// Release the active stream.
    fn stop(&mut self) -> impl Future<Output = ()> + Send;
}

/// System clipboard access for copying scan results.
pub trait Clipboard: Send + Sync + 'static {
    fn write_text(&self, text: &str) -> impl Future<Output = Result<(), ClipboardError>> + Send;
}
