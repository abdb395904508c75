use axum::http::{StatusCode, header};
use axum_core::response::{IntoResponse as AxumCoreIntoResponse, Response};
use eyre::Report;

#[derive(Debug, thiserror::Error)]
pub enum QrTransferError {
    #[error(transparent)]
    Unexpected(#[from] Report),
    #[error("Missing data")]
    InvalidInput,
    #[error("Data is too long to fit in a QR code: {0}")]
    EncodingCapacityExceeded(String),
    #[error("Failed to encode QR symbol: {0}")]
    Encoder(String),
}

impl From<qrcode::types::QrError> for QrTransferError {
    fn from(error: qrcode::types::QrError) -> Self {
        match error {
            qrcode::types::QrError::DataTooLong => Self::EncodingCapacityExceeded(error.to_string()),
            other => Self::Encoder(other.to_string()),
        }
    }
}

impl From<image::ImageError> for QrTransferError {
    fn from(error: image::ImageError) -> Self {
        Self::Unexpected(Report::new(error))
    }
}

/// Trait implementation to convert this error into a plain-text axum http response
impl AxumCoreIntoResponse for QrTransferError {
    fn into_response(self) -> Response {
        let plain_text = [(header::CONTENT_TYPE, "text/plain; charset=utf-8")];
        match self {
            invalid_input @ QrTransferError::InvalidInput => {
                (StatusCode::BAD_REQUEST, plain_text, invalid_input.to_string()).into_response()
            }
            capacity_error @ QrTransferError::EncodingCapacityExceeded(_) => {
                (StatusCode::BAD_REQUEST, plain_text, capacity_error.to_string()).into_response()
            }
            other => {
                tracing::error!(error = %other, "QR generation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    plain_text,
                    "Failed to generate QR code.",
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_returns_400() {
        let error = QrTransferError::InvalidInput;
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn capacity_exceeded_returns_400() {
        let error = QrTransferError::EncodingCapacityExceeded("data too long".into());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn encoder_error_returns_500() {
        let error = QrTransferError::Encoder("invalid version".into());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unexpected_error_returns_500() {
        let error = QrTransferError::Unexpected(eyre::eyre!("png writer failed"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn data_too_long_maps_to_capacity_error() {
        let error = QrTransferError::from(qrcode::types::QrError::DataTooLong);
        assert!(matches!(error, QrTransferError::EncodingCapacityExceeded(_)));
    }

    #[test]
    fn responses_are_plain_text() {
        let response = QrTransferError::InvalidInput.into_response();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }
}
