use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Purchase kind; also the `type` key of checkout session metadata.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutKind {
    Subscription,
    Boost,
    Booking,
}

impl CheckoutKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutKind::Subscription => "subscription",
            CheckoutKind::Boost => "boost",
            CheckoutKind::Booking => "booking",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "subscription" => Some(CheckoutKind::Subscription),
            "boost" => Some(CheckoutKind::Boost),
            "booking" => Some(CheckoutKind::Booking),
            _ => None,
        }
    }
}

impl Display for CheckoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
