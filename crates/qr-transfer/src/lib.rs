pub mod server;
pub mod fragment;
pub mod pages;
pub mod error;
pub mod i18n;
pub mod qr;

pub use server::{AppState, run, router};
pub use error::QrTransferError;
pub use i18n::{Lang, Translator};
pub use qr::{EncodeRequest, EncodedImage, ImageFormat, encode};
