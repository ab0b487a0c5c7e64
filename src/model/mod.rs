use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Cookies {
    #[serde(default)]
    pub current: u64,
}

/// One entry of the `housing/active` listing.
///
/// `name` is kept raw: it may carry `§x` formatting codes, use
/// [`HouseRecord::display_name`] before showing or matching it.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HouseRecord {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub players: u64,
    #[serde(default)]
    pub cookies: Cookies,
}

impl HouseRecord {
    pub fn new(name: &str, cookies: u64, players: u64) -> Self {
        Self {
            name: name.to_string(),
            players,
            cookies: Cookies { current: cookies },
            ..Self::default()
        }
    }

    pub fn with_owner(mut self, owner: &str) -> Self {
        self.owner = Some(owner.to_string());
        self
    }

    pub fn cookie_count(&self) -> u64 {
        self.cookies.current
    }

    pub fn display_name(&self) -> String {
        strip_formatting_codes(&self.name)
    }
}

fn formatting_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("\u{00A7}.").expect("static regex"))
}

/// Removes every section-sign formatting code (`§` plus the following char).
pub fn strip_formatting_codes(raw: &str) -> String {
    formatting_code_re().replace_all(raw, "").into_owned()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    None,
    Cookies,
    Players,
}

impl SortKey {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "none" => Some(Self::None),
            "cookies" | "cookie" | "c" => Some(Self::Cookies),
            "players" | "player" | "p" => Some(Self::Players),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Cookies => "cookies",
            Self::Players => "players",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
