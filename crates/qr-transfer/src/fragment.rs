use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

use crate::error::QrTransferError;
use crate::i18n::{Lang, Translator};
use crate::qr::{self, ImageFormat};
use crate::server::request::RequestOrigin;

/// Path of the scanning page the "reading" QR points at.
pub const READ_PAGE_PATH: &str = "/readqr";

/// Format requested by the page flow, whatever the query says.
pub const FRAGMENT_FORMAT: ImageFormat = ImageFormat::Png;

/// Which QR the dialog shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DialogTab {
    #[default]
    Data,
    Reading,
}

impl DialogTab {
    pub fn as_str(self) -> &'static str {
        match self {
            DialogTab::Data => "data",
            DialogTab::Reading => "reading",
        }
    }
}

/// Partial view returned to the encode page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Nothing to show; the data field was blank.
    Empty,
    /// The QR dialog with both image URLs.
    Dialog(String),
    /// Inline alert when the data cannot be encoded.
    Failure(String),
}

impl IntoResponse for Fragment {
    fn into_response(self) -> Response {
        match self {
            Fragment::Empty => Html(String::new()).into_response(),
            Fragment::Dialog(markup) | Fragment::Failure(markup) => Html(markup).into_response(),
        }
    }
}

/// Image URLs for the two QR codes shown in the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogImages {
    pub data_qr_url: String,
    pub reading_qr_url: String,
}

impl DialogImages {
    pub fn build(origin: &RequestOrigin, data: &str, size: u32) -> Result<Self, QrTransferError> {
        let reading_url = origin.url(READ_PAGE_PATH);
        Ok(Self {
            data_qr_url: image_url(origin, data, size)?,
            reading_qr_url: image_url(origin, &reading_url, size)?,
        })
    }
}

fn image_url(origin: &RequestOrigin, data: &str, size: u32) -> Result<String, QrTransferError> {
    let size = size.to_string();
    let query = serde_urlencoded::to_string(vec![
        ("data", data),
        ("size", size.as_str()),
        ("format", FRAGMENT_FORMAT.as_str()),
    ])
    .map_err(|e| eyre::eyre!("encoding image query: {e}"))?;
    Ok(origin.url(&format!("/api/qr?{query}")))
}

/// Render the QR dialog for `data`, or nothing when it is blank.
pub fn render_fragment(
    translator: &Translator,
    lang: Lang,
    origin: &RequestOrigin,
    data: Option<&str>,
    size: Option<&str>,
) -> Result<Fragment, QrTransferError> {
    let data = data.unwrap_or_default().trim();
    if data.is_empty() {
        return Ok(Fragment::Empty);
    }

    let size = qr::effective_size(size);

    match qr::ensure_encodable(data) {
        Ok(()) => {}
        Err(QrTransferError::EncodingCapacityExceeded(reason)) => {
            tracing::warn!(%reason, bytes = data.len(), "fragment data does not fit in a QR code");
            return Ok(Fragment::Failure(failure_markup(translator, lang)));
        }
        Err(other) => return Err(other),
    }

    let images = DialogImages::build(origin, data, size)?;
    Ok(Fragment::Dialog(dialog_markup(
        translator,
        lang,
        &images,
        DialogTab::default(),
    )))
}

fn failure_markup(translator: &Translator, lang: Lang) -> String {
    html! {
        p.error #qr-error role="alert" { (translator.t(lang, "qrError")) }
    }
    .into_string()
}

fn tab_button(tab: DialogTab, label: &str) -> Markup {
    let name = tab.as_str();
    html! {
        button type="button"
            x-bind:aria-pressed={ "tab === '" (name) "'" }
            x-bind:class={ "tab === '" (name) "' ? 'primary' : 'secondary'" }
            x-on:click={ "tab = '" (name) "'" } { (label) }
    }
}

fn tab_panel(tab: DialogTab, url: &str, alt: &str) -> Markup {
    html! {
        div x-show={ "tab === '" (tab.as_str()) "'" } style="text-align: center;" {
            img src=(url) alt=(alt) loading="lazy" width="360" height="360" style="display: block; margin: 0 auto;";
        }
    }
}

fn dialog_markup(translator: &Translator, lang: Lang, images: &DialogImages, tab: DialogTab) -> String {
    let t = |key: &str| translator.t(lang, key).to_owned();
    html! {
        dialog #qr-dialog x-data={ "{ tab: '" (tab.as_str()) "' }" } {
            article {
                header {
                    button aria-label=(t("close")) rel="prev" x-on:click="$el.closest('dialog')?.close()" {}
                    p { strong { (t("readingMessage")) } }
                }
                nav aria-label="QR tabs" role="tablist" {
                    div role="group" {
                        (tab_button(DialogTab::Data, &t("dataQRTab")))
                        (tab_button(DialogTab::Reading, &t("readingQRTab")))
                    }
                }
                (tab_panel(DialogTab::Data, &images.data_qr_url, "QR Code"))
                (tab_panel(DialogTab::Reading, &images.reading_qr_url, "Reading Screen QR Code"))
            }
        }
    }
    .into_string()
}
