pub mod request;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::error::QrTransferError;
use crate::fragment::{READ_PAGE_PATH, render_fragment};
use crate::i18n::Translator;
use crate::pages;
use crate::qr::{self, EncodeRequest, ImageFormat};
use request::{PageLang, RequestOrigin};

const IMAGE_CACHE_CONTROL: &str = "public, max-age=3600";

#[derive(Clone)]
pub struct AppState {
    pub translator: Arc<Translator>,
    /// Pre-fills the data field on the encode page.
    pub url_prefix: Arc<str>,
}

impl AppState {
    pub fn new(translator: Translator, url_prefix: impl Into<Arc<str>>) -> Self {
        Self {
            translator: Arc::new(translator),
            url_prefix: url_prefix.into(),
        }
    }
}

/// Query parameters shared by the fragment and image endpoints.
///
/// Everything stays a string so bad values fall back to defaults instead of
/// being rejected by the extractor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QrQuery {
    pub data: Option<String>,
    pub size: Option<String>,
    pub format: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route(READ_PAGE_PATH, get(read_handler))
        .route("/fragments/qr", get(fragment_handler))
        .route("/api/qr", get(image_handler))
        .route("/healthcheck", get(|| async move { (StatusCode::OK, "Ok").into_response() }))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run(host: String, port: u16, state: AppState) -> Result<()> {
    let address = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    tracing::info!(%address, "listening");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("serving http")?;

    Ok(())
}

async fn home_handler(State(state): State<AppState>, PageLang(lang): PageLang) -> Html<String> {
    Html(pages::home_page(&state.translator, lang, &state.url_prefix))
}

async fn read_handler(State(state): State<AppState>, PageLang(lang): PageLang) -> Html<String> {
    Html(pages::read_page(&state.translator, lang))
}

async fn fragment_handler(
    State(state): State<AppState>,
    PageLang(lang): PageLang,
    origin: RequestOrigin,
    Query(params): Query<QrQuery>,
) -> Result<Response, QrTransferError> {
    let fragment = render_fragment(
        &state.translator,
        lang,
        &origin,
        params.data.as_deref(),
        params.size.as_deref(),
    )?;
    Ok(fragment.into_response())
}

async fn image_handler(Query(params): Query<QrQuery>) -> Result<Response, QrTransferError> {
    let data = params
        .data
        .filter(|data| !data.is_empty())
        .ok_or(QrTransferError::InvalidInput)?;
    let size = qr::effective_size(params.size.as_deref());
    let format = ImageFormat::from_query(params.format.as_deref());

    let request = EncodeRequest::new(data, size as i64, format)?;
    let image = tokio::task::spawn_blocking(move || qr::encode(&request))
        .await
        .map_err(|e| eyre::eyre!("image task failed: {e}"))??;

    Ok((
        [
            (header::CONTENT_TYPE, image.format().content_type()),
            (header::CACHE_CONTROL, IMAGE_CACHE_CONTROL),
        ],
        image.into_bytes(),
    )
        .into_response())
}

async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html(pages::not_found_page()))
}
