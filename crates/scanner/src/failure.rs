use serde::Serialize;

use crate::backend::CameraError;

const PERMISSION_ERRORS: [&str; 2] = ["NotAllowedError", "PermissionDeniedError"];
const UNSUPPORTED_ERROR: &str = "NotSupportedError";

/// User-facing classification of a camera acquisition failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanFailure {
    PermissionDenied,
    HttpsRequired,
    Generic { reason: String },
}

impl ScanFailure {
    /// Classify a platform error. `secure_context` is false when the page was
    /// served over plain http from anywhere but localhost.
    pub fn classify(error: &CameraError, secure_context: bool) -> Self {
        let name = error.name.as_deref().unwrap_or("Error");
        if PERMISSION_ERRORS.contains(&name) {
            ScanFailure::PermissionDenied
        } else if name == UNSUPPORTED_ERROR || !secure_context {
            ScanFailure::HttpsRequired
        } else {
            ScanFailure::Generic {
                reason: name.to_string(),
            }
        }
    }

    pub fn message_key(&self) -> &'static str {
        match self {
            ScanFailure::PermissionDenied => "camera.permissionDenied",
            ScanFailure::HttpsRequired => "camera.httpsRequired",
            ScanFailure::Generic { .. } => "camera.genericError",
        }
    }

    /// Localized message; the generic case appends the platform reason.
    pub fn describe(&self, translate: impl Fn(&str) -> String) -> String {
        let message = translate(self.message_key());
        match self {
            ScanFailure::Generic { reason } => format!("{message} ({reason})"),
            _ => message,
        }
    }
}
