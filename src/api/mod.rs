pub mod hypixel;
pub mod mojang;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::HouseRecord;
use crate::rank::PlayerResponse;

pub use hypixel::HypixelClient;
pub use mojang::MojangClient;

pub const DEFAULT_HYPIXEL_URL: &str = "https://api.hypixel.net/v2";
pub const DEFAULT_PROFILE_URL: &str = "https://api.mojang.com/users/profiles/minecraft";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to build http client: {0}")]
    Client(String),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("request rejected: {cause}")]
    Rejected { cause: String },
}

/// Source of the active house listing.
#[async_trait]
pub trait HousingSource: Send + Sync {
    async fn active_houses(&self) -> Result<Vec<HouseRecord>, ApiError>;
}

/// Identifier to display name lookup. `Ok(None)` means the profile does not exist.
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    async fn profile_name(&self, identifier: &str) -> Result<Option<String>, ApiError>;
}

#[async_trait]
pub trait PlayerSource: Send + Sync {
    async fn player(&self, name: &str) -> Result<PlayerResponse, ApiError>;
}

#[derive(Clone, Debug)]
pub struct HttpSettings {
    pub timeout_seconds: u64,
    pub proxy: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            proxy: None,
        }
    }
}

pub fn build_http_client(settings: &HttpSettings) -> Result<reqwest::Client, ApiError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        )),
    );
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    let builder = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .timeout(Duration::from_secs(settings.timeout_seconds.max(1)));

    let builder = match settings.proxy.as_deref().map(str::trim) {
        Some(proxy) if !proxy.is_empty() => {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| ApiError::Client(format!("could not set up proxy: {e}")))?;
            builder.proxy(proxy)
        }
        _ => builder,
    };

    builder.build().map_err(|e| ApiError::Client(e.to_string()))
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
