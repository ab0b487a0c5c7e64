use std::fmt;

use serde::Deserialize;
use tracing::error;

use crate::api::PlayerSource;

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRanks {
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub monthly_package_rank: Option<String>,
    #[serde(default)]
    pub new_package_rank: Option<String>,
    #[serde(default)]
    pub package_rank: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct PlayerResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub player: Option<PlayerRanks>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rank {
    None,
    Vip,
    VipPlus,
    Mvp,
    MvpPlus,
    MvpPlusPlus,
    /// Staff and special ranks, shown title-cased.
    Other(String),
}

impl Rank {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "VIP" => Self::Vip,
            "VIP_PLUS" => Self::VipPlus,
            "MVP" => Self::Mvp,
            "MVP_PLUS" => Self::MvpPlus,
            "MVP++" => Self::MvpPlusPlus,
            "" | "NONE" | "NORMAL" => Self::None,
            other => Self::Other(title_case(other)),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::None => "None",
            Self::Vip => "VIP",
            Self::VipPlus => "VIP+",
            Self::Mvp => "MVP",
            Self::MvpPlus => "MVP+",
            Self::MvpPlusPlus => "MVP++",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn title_case(code: &str) -> String {
    let mut chars = code.chars();
    let mut out = String::with_capacity(code.len());
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(&chars.as_str().to_lowercase());
    }
    out
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RankLookup {
    Found(Rank),
    NotFound,
    Failed,
}

impl fmt::Display for RankLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(rank) => write!(f, "{rank}"),
            Self::NotFound => f.write_str("Rank not found"),
            Self::Failed => f.write_str("Error fetching rank"),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Precedence: explicit non-`NORMAL` rank, then a monthly `SUPERSTAR`
/// package, then the new package rank, then the legacy package rank.
pub fn rank_of(ranks: &PlayerRanks) -> Rank {
    if let Some(rank) = present(&ranks.rank).filter(|r| *r != "NORMAL") {
        return Rank::from_code(rank);
    }
    if present(&ranks.monthly_package_rank) == Some("SUPERSTAR") {
        return Rank::MvpPlusPlus;
    }
    if let Some(rank) = present(&ranks.new_package_rank) {
        return Rank::from_code(rank);
    }
    if let Some(rank) = present(&ranks.package_rank) {
        return Rank::from_code(rank);
    }
    Rank::None
}

pub fn rank_from_response(response: &PlayerResponse) -> RankLookup {
    match (&response.player, response.success) {
        (Some(player), true) => RankLookup::Found(rank_of(player)),
        _ => RankLookup::NotFound,
    }
}

pub async fn lookup_rank<P>(source: &P, player_name: &str) -> RankLookup
where
    P: PlayerSource + ?Sized,
{
    match source.player(player_name).await {
        Ok(response) => rank_from_response(&response),
        Err(e) => {
            error!(player = player_name, error = %e, "rank lookup failed");
            RankLookup::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use async_trait::async_trait;

    fn parse(raw: &str) -> RankLookup {
        rank_from_response(&serde_json::from_str(raw).unwrap())
    }

    #[test]
    fn monthly_superstar_is_mvp_plus_plus() {
        let out = parse(r#"{"success":true,"player":{"monthlyPackageRank":"SUPERSTAR"}}"#);
        assert_eq!(out.to_string(), "MVP++");
    }

    #[test]
    fn superstar_outside_monthly_is_title_cased() {
        let out = parse(r#"{"success":true,"player":{"newPackageRank":"SUPERSTAR"}}"#);
        assert_eq!(out.to_string(), "Superstar");
        let out = parse(r#"{"success":true,"player":{"packageRank":"SUPERSTAR"}}"#);
        assert_eq!(out, RankLookup::Found(Rank::Other("Superstar".to_string())));
    }

    #[test]
    fn unsuccessful_is_not_found() {
        assert_eq!(parse(r#"{"success":false}"#).to_string(), "Rank not found");
        assert_eq!(
            parse(r#"{"success":true,"player":null}"#),
            RankLookup::NotFound
        );
    }

    #[test]
    fn legacy_package_rank() {
        let out = parse(r#"{"success":true,"player":{"packageRank":"VIP_PLUS"}}"#);
        assert_eq!(out.to_string(), "VIP+");
    }

    #[test]
    fn explicit_rank_wins_unless_normal() {
        let staff = parse(r#"{"success":true,"player":{"rank":"ADMIN","newPackageRank":"MVP_PLUS"}}"#);
        assert_eq!(staff.to_string(), "Admin");

        let normal = parse(r#"{"success":true,"player":{"rank":"NORMAL","newPackageRank":"MVP_PLUS"}}"#);
        assert_eq!(normal.to_string(), "MVP+");
    }

    #[test]
    fn new_package_beats_legacy() {
        let out = parse(r#"{"success":true,"player":{"newPackageRank":"MVP","packageRank":"VIP"}}"#);
        assert_eq!(out, RankLookup::Found(Rank::Mvp));
    }

    #[test]
    fn monthly_none_falls_through() {
        let out = parse(r#"{"success":true,"player":{"monthlyPackageRank":"NONE","newPackageRank":"VIP"}}"#);
        assert_eq!(out.to_string(), "VIP");
    }

    #[test]
    fn no_rank_fields() {
        assert_eq!(parse(r#"{"success":true,"player":{}}"#).to_string(), "None");
    }

    struct Unreachable;

    #[async_trait]
    impl PlayerSource for Unreachable {
        async fn player(&self, _name: &str) -> Result<PlayerResponse, ApiError> {
            Err(ApiError::Rejected {
                cause: "offline".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn transport_failure_reports_error() {
        let out = lookup_rank(&Unreachable, "Notch").await;
        assert_eq!(out.to_string(), "Error fetching rank");
    }
}
