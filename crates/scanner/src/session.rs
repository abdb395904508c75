use std::sync::{Arc, Weak};
use std::time::SystemTime;

use serde::Serialize;
use tokio::sync::{Mutex, mpsc, watch};

use crate::backend::{BindingId, CameraBackend, Clipboard, DecodeSink, Decoded};
use crate::camera::{CameraChoice, CameraSelector, FacingMode};
use crate::failure::ScanFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Facing mode bound first when the platform offers a choice.
    pub preferred_facing: FacingMode,
    /// Whether the page runs in a secure context (https or localhost).
    pub secure_context: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preferred_facing: FacingMode::Environment,
            secure_context: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "failure", rename_all = "snake_case")]
pub enum ScanState {
    Idle,
    /// Waiting for the camera; there is no timeout on this state.
    Initializing,
    Scanning,
    /// A result is on screen and capture is stopped.
    Paused,
    Error(ScanFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub text: String,
    pub captured_at: SystemTime,
}

/// Everything a view needs to render the scan page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub state: ScanState,
    pub result: Option<ScanResult>,
    /// Switcher entries; empty when the switcher is hidden.
    pub switcher: Vec<CameraChoice>,
    pub active_camera: Option<CameraChoice>,
    pub dialog_open: bool,
}

impl SessionSnapshot {
    fn idle() -> Self {
        Self {
            state: ScanState::Idle,
            result: None,
            switcher: Vec::new(),
            active_camera: None,
            dialog_open: false,
        }
    }

    pub fn loading(&self) -> bool {
        self.state == ScanState::Initializing
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Mount,
    Decoded { binding: BindingId, text: String },
    CloseDialog,
    SwitchCamera(CameraChoice),
    CopyResult,
    Unmount,
}

struct Inner<B> {
    backend: B,
    state: ScanState,
    selector: Option<CameraSelector>,
    active: Option<CameraChoice>,
    binding: Option<BindingId>,
    next_binding: u64,
    result: Option<ScanResult>,
}

impl<B> Inner<B> {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state.clone(),
            result: self.result.clone(),
            switcher: self
                .selector
                .as_ref()
                .filter(|selector| selector.show_switcher())
                .map(|selector| selector.choices().to_vec())
                .unwrap_or_default(),
            active_camera: self.active.clone(),
            dialog_open: self.state == ScanState::Paused,
        }
    }
}

/// Camera scanning state machine.
///
/// All transitions go through [`ScanSession::dispatch`], which holds the
/// session lock across the backend's stop/start calls. Concurrent requests
/// therefore run one after another, and at most one stream is ever bound.
///
/// Successful decodes stop capture; closing the result dialog restarts it.
pub struct ScanSession<B, C> {
    inner: Mutex<Inner<B>>,
    clipboard: C,
    config: SessionConfig,
    decoded_tx: mpsc::UnboundedSender<Decoded>,
    snapshot: watch::Sender<SessionSnapshot>,
}

impl<B: CameraBackend, C: Clipboard> ScanSession<B, C> {
    /// Create an idle session. Must be called from within a tokio runtime:
    /// a task is spawned to feed decode results back into the session.
    pub fn new(backend: B, clipboard: C, config: SessionConfig) -> Arc<Self> {
        let (decoded_tx, decoded_rx) = mpsc::unbounded_channel();
        let (snapshot, _) = watch::channel(SessionSnapshot::idle());
        let session = Arc::new(Self {
            inner: Mutex::new(Inner {
                backend,
                state: ScanState::Idle,
                selector: None,
                active: None,
                binding: None,
                next_binding: 0,
                result: None,
            }),
            clipboard,
            config,
            decoded_tx,
            snapshot,
        });
        tokio::spawn(forward_decoded(Arc::downgrade(&session), decoded_rx));
        session
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    pub async fn mount(&self) -> ScanState {
        self.dispatch(ScanEvent::Mount).await
    }

    pub async fn close_dialog(&self) -> ScanState {
        self.dispatch(ScanEvent::CloseDialog).await
    }

    pub async fn switch_camera(&self, choice: CameraChoice) -> ScanState {
        self.dispatch(ScanEvent::SwitchCamera(choice)).await
    }

    pub async fn copy_result(&self) -> ScanState {
        self.dispatch(ScanEvent::CopyResult).await
    }

    /// Release the camera and return to idle. Safe to call repeatedly.
    pub async fn stop(&self) -> ScanState {
        self.dispatch(ScanEvent::Unmount).await
    }

    /// Apply one event and return the resulting state.
    pub async fn dispatch(&self, event: ScanEvent) -> ScanState {
        let mut inner = self.inner.lock().await;
        match event {
            ScanEvent::Mount => self.on_mount(&mut inner).await,
            ScanEvent::Decoded { binding, text } => self.on_decoded(&mut inner, binding, text).await,
            ScanEvent::CloseDialog => {
                if inner.state == ScanState::Paused {
                    self.bind(&mut inner).await;
                }
            }
            ScanEvent::SwitchCamera(choice) => self.on_switch(&mut inner, choice).await,
            ScanEvent::CopyResult => {
                let text = inner.result.as_ref().map(|result| result.text.clone());
                self.on_copy(text).await;
            }
            ScanEvent::Unmount => {
                self.release(&mut inner).await;
                inner.state = ScanState::Idle;
                inner.selector = None;
                inner.active = None;
                inner.result = None;
            }
        }
        self.publish(&inner);
        inner.state.clone()
    }

    async fn on_mount(&self, inner: &mut Inner<B>) {
        if inner.state != ScanState::Idle {
            tracing::debug!(state = ?inner.state, "session already mounted");
            return;
        }
        inner.state = ScanState::Initializing;
        self.publish(inner);

        let cameras = match inner.backend.list_cameras().await {
            Ok(cameras) => cameras,
            Err(error) => {
                tracing::warn!(%error, "camera enumeration failed; using platform default");
                Vec::new()
            }
        };
        let selector = CameraSelector::from_descriptors(&cameras, self.config.preferred_facing);
        tracing::debug!(
            cameras = cameras.len(),
            strategy = ?selector.strategy(),
            "cameras enumerated"
        );
        inner.active = Some(selector.initial());
        inner.selector = Some(selector);

        self.bind(inner).await;
    }

    async fn on_decoded(&self, inner: &mut Inner<B>, binding: BindingId, text: String) {
        if inner.state != ScanState::Scanning || inner.binding != Some(binding) {
            tracing::debug!(?binding, "ignoring decode from inactive binding");
            return;
        }
        inner.result = Some(ScanResult {
            text,
            captured_at: SystemTime::now(),
        });
        self.release(inner).await;
        inner.state = ScanState::Paused;
    }

    async fn on_switch(&self, inner: &mut Inner<B>, choice: CameraChoice) {
        if inner.active.as_ref() == Some(&choice) {
            return;
        }
        if !inner
            .selector
            .as_ref()
            .is_some_and(|selector| selector.offers(&choice))
        {
            tracing::warn!(?choice, "camera not offered by this device");
            return;
        }

        match inner.state {
            ScanState::Scanning => {
                self.release(inner).await;
                inner.active = Some(choice);
                self.bind(inner).await;
            }
            ScanState::Error(_) => {
                inner.active = Some(choice);
                self.bind(inner).await;
            }
            // Used when the dialog closes.
            ScanState::Paused => inner.active = Some(choice),
            ScanState::Idle | ScanState::Initializing => {}
        }
    }

    async fn on_copy(&self, text: Option<String>) {
        let Some(text) = text else {
            return;
        };
        if let Err(error) = self.clipboard.write_text(&text).await {
            tracing::warn!(%error, "copy to clipboard failed");
        }
    }

    async fn bind(&self, inner: &mut Inner<B>) {
        debug_assert!(inner.binding.is_none(), "camera already bound");

        let choice = inner
            .active
            .clone()
            .unwrap_or(CameraChoice::Facing(self.config.preferred_facing));
        inner.next_binding += 1;
        let binding = BindingId(inner.next_binding);
        let sink = DecodeSink::new(binding, self.decoded_tx.clone());

        match inner.backend.start(&choice, sink).await {
            Ok(()) => {
                tracing::info!(camera = ?choice, "camera started");
                inner.binding = Some(binding);
                inner.state = ScanState::Scanning;
            }
            Err(error) => {
                let failure = ScanFailure::classify(&error, self.config.secure_context);
                tracing::warn!(%error, ?failure, "camera acquisition failed");
                inner.state = ScanState::Error(failure);
            }
        }
    }

    async fn release(&self, inner: &mut Inner<B>) {
        if let Some(binding) = inner.binding.take() {
            inner.backend.stop().await;
            tracing::debug!(?binding, "camera stopped");
        }
    }

    fn publish(&self, inner: &Inner<B>) {
        self.snapshot.send_replace(inner.snapshot());
    }
}

impl<B, C> Drop for ScanSession<B, C> {
    fn drop(&mut self) {
        if self.inner.get_mut().binding.is_some() {
            tracing::warn!("scan session dropped without stop; camera left to the backend");
        }
    }
}

async fn forward_decoded<B: CameraBackend, C: Clipboard>(
    session: Weak<ScanSession<B, C>>,
    mut decoded: mpsc::UnboundedReceiver<Decoded>,
) {
    while let Some(Decoded { binding, text }) = decoded.recv().await {
        let Some(session) = session.upgrade() else {
            break;
        };
        session.dispatch(ScanEvent::Decoded { binding, text }).await;
    }
}
