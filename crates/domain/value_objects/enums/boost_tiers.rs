use std::fmt::Display;

use chrono::Duration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoostTier {
    Standard,
    Premium,
    Mega,
}

impl BoostTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoostTier::Standard => "standard",
            BoostTier::Premium => "premium",
            BoostTier::Mega => "mega",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" => Some(BoostTier::Standard),
            "premium" => Some(BoostTier::Premium),
            "mega" => Some(BoostTier::Mega),
            _ => None,
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            BoostTier::Standard => Duration::hours(24),
            BoostTier::Premium => Duration::hours(168),
            BoostTier::Mega => Duration::hours(720),
        }
    }
}

impl Display for BoostTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
