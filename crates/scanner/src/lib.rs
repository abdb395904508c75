//! Camera scan session for the QR reader page.
//!
//! The session owns camera binding and the scan result dialog; platform
//! capture and decoding sit behind [`CameraBackend`].

pub mod backend;
pub mod camera;
pub mod failure;
pub mod session;

pub use backend::{BindingId, CameraBackend, CameraError, Clipboard, ClipboardError, DecodeSink};
pub use camera::{CameraChoice, CameraDescriptor, CameraSelector, FacingMode, SelectionStrategy};
pub use failure::ScanFailure;
pub use session::{ScanEvent, ScanResult, ScanSession, ScanState, SessionConfig, SessionSnapshot};
