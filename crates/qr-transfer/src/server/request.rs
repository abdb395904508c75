use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use crate::i18n::Lang;

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
const X_FORWARDED_HOST: &str = "x-forwarded-host";
const X_FORWARDED_PREFIX: &str = "x-forwarded-prefix";

/// Page language negotiated from the `Accept-Language` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLang(pub Lang);

impl<S> FromRequestParts<S> for PageLang
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = header_str(&parts.headers, header::ACCEPT_LANGUAGE.as_str());
        Ok(Self(Lang::from_accept_language(header)))
    }
}

/// Scheme, host and path prefix the client used to reach us, so absolute
/// links stay valid behind proxies and under sub-paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    pub scheme: String,
    pub host: String,
    pub prefix: String,
}

impl RequestOrigin {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let scheme = first_value(header_str(headers, X_FORWARDED_PROTO))
            .unwrap_or("http")
            .to_ascii_lowercase();
        let host = first_value(header_str(headers, X_FORWARDED_HOST))
            .or_else(|| first_value(header_str(headers, header::HOST.as_str())))
            .unwrap_or("localhost")
            .to_string();
        let prefix = header_str(headers, X_FORWARDED_PREFIX)
            .map(|prefix| prefix.trim().trim_end_matches('/'))
            .filter(|prefix| !prefix.is_empty())
            .map(|prefix| {
                if prefix.starts_with('/') {
                    prefix.to_string()
                } else {
                    format!("/{prefix}")
                }
            })
            .unwrap_or_default();

        Self {
            scheme,
            host,
            prefix,
        }
    }

    /// Absolute URL for an application path such as `/readqr`.
    pub fn url(&self, path: &str) -> String {
        format!("{}://{}{}{}", self.scheme, self.host, self.prefix, path)
    }
}

impl<S> FromRequestParts<S> for RequestOrigin
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// First entry of a comma-separated proxy header.
fn first_value(value: Option<&str>) -> Option<&str> {
    value
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
