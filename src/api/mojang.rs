use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{join_url, ApiError, ProfileLookup};

#[derive(Deserialize)]
struct ProfileBody {
    #[serde(default)]
    name: Option<String>,
}

/// Profile lookup against the Mojang API (or any relay exposing the same
/// `<base>/<identifier>` shape).
#[derive(Clone, Debug)]
pub struct MojangClient {
    http: reqwest::Client,
    base_url: String,
}

impl MojangClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl ProfileLookup for MojangClient {
    async fn profile_name(&self, identifier: &str) -> Result<Option<String>, ApiError> {
        let url = join_url(&self.base_url, identifier);
        debug!(%url, "GET");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;
        parse_profile(&url, status, &body)
    }
}

pub(crate) fn parse_profile(url: &str, status: u16, body: &str) -> Result<Option<String>, ApiError> {
    match status {
        204 | 404 => return Ok(None),
        s if !(200..300).contains(&s) => {
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
            })
        }
        _ => {}
    }
    if body.trim().is_empty() {
        return Ok(None);
    }
    let parsed: ProfileBody = serde_json::from_str(body).map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })?;
    Ok(parsed.name.filter(|n| !n.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://api.mojang.com/users/profiles/minecraft/abc";

    #[test]
    fn reads_name() {
        let body = r#"{"id":"069a79f444e94726a5befca90e38aaf5","name":"Notch"}"#;
        assert_eq!(parse_profile(URL, 200, body).unwrap().as_deref(), Some("Notch"));
    }

    #[test]
    fn missing_profile_is_none() {
        assert_eq!(parse_profile(URL, 204, "").unwrap(), None);
        assert_eq!(parse_profile(URL, 404, r#"{"error":"Not Found"}"#).unwrap(), None);
        assert_eq!(parse_profile(URL, 200, r#"{"id":"x"}"#).unwrap(), None);
    }

    #[test]
    fn throttled_is_error() {
        assert!(matches!(
            parse_profile(URL, 429, ""),
            Err(ApiError::Status { status: 429, .. })
        ));
    }
}
