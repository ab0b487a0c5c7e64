use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{join_url, ApiError, HousingSource, PlayerSource};
use crate::model::HouseRecord;
use crate::rank::PlayerResponse;

#[derive(Deserialize)]
#[serde(untagged)]
enum HousingPayload {
    Houses(Vec<HouseRecord>),
    Failure {
        #[serde(default)]
        cause: Option<String>,
    },
}

#[derive(Deserialize)]
struct FailureBody {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    cause: Option<String>,
}

#[derive(Clone, Debug)]
pub struct HypixelClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HypixelClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<(u16, String), ApiError> {
        let url = join_url(&self.base_url, path);
        debug!(%url, "GET");
        let response = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|source| transport(&url, source))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|source| transport(&url, source))?;
        Ok((status, body))
    }
}

/// reqwest errors carry the full request URL, `key` query included.
fn transport(url: &str, source: reqwest::Error) -> ApiError {
    ApiError::Transport {
        url: url.to_string(),
        source: source.without_url(),
    }
}

#[async_trait]
impl HousingSource for HypixelClient {
    async fn active_houses(&self) -> Result<Vec<HouseRecord>, ApiError> {
        let (status, body) = self.get("housing/active", &[]).await?;
        parse_housing(&join_url(&self.base_url, "housing/active"), status, &body)
    }
}

#[async_trait]
impl PlayerSource for HypixelClient {
    async fn player(&self, name: &str) -> Result<PlayerResponse, ApiError> {
        let (status, body) = self.get("player", &[("name", name)]).await?;
        parse_player(&join_url(&self.base_url, "player"), status, &body)
    }
}

pub(crate) fn parse_housing(url: &str, status: u16, body: &str) -> Result<Vec<HouseRecord>, ApiError> {
    if !(200..300).contains(&status) {
        return Err(rejection(url, status, body));
    }
    match serde_json::from_str::<HousingPayload>(body) {
        Ok(HousingPayload::Houses(houses)) => Ok(houses),
        Ok(HousingPayload::Failure { cause }) => Err(ApiError::Rejected {
            cause: cause.unwrap_or_else(|| "unknown cause".to_string()),
        }),
        Err(source) => Err(ApiError::Decode {
            url: url.to_string(),
            source,
        }),
    }
}

/// Error statuses still carry a `{success:false}` body, which reads as
/// "not found" rather than a failure.
pub(crate) fn parse_player(url: &str, status: u16, body: &str) -> Result<PlayerResponse, ApiError> {
    match serde_json::from_str::<PlayerResponse>(body) {
        Ok(parsed) => Ok(parsed),
        Err(_) if !(200..300).contains(&status) => Err(ApiError::Status {
            url: url.to_string(),
            status,
        }),
        Err(source) => Err(ApiError::Decode {
            url: url.to_string(),
            source,
        }),
    }
}

fn rejection(url: &str, status: u16, body: &str) -> ApiError {
    match serde_json::from_str::<FailureBody>(body) {
        Ok(FailureBody {
            success: false,
            cause: Some(cause),
        }) => ApiError::Rejected { cause },
        _ => ApiError::Status {
            url: url.to_string(),
            status,
        },
    }
}
