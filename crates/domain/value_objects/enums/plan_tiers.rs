use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanTier {
    #[default]
    Free,
    Mid,
    Pro,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Mid => "mid",
            PlanTier::Pro => "pro",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "free" => Some(PlanTier::Free),
            "mid" => Some(PlanTier::Mid),
            "pro" => Some(PlanTier::Pro),
            _ => None,
        }
    }

    /// Stored plans that no longer parse are treated as FREE.
    pub fn from_stored(value: &str) -> Self {
        Self::from_str(value).unwrap_or_default()
    }
}

impl Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
