use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::enums::checkout_kinds::CheckoutKind;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    #[serde(rename = "type")]
    pub kind: CheckoutKind,
    /// Plan tier for subscriptions, boost tier for boosts.
    pub plan: Option<String>,
    pub booking_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CreateCheckoutResponse {
    pub url: String,
}

/// Metadata keys shared by the checkout builder and the webhook processor.
pub mod metadata_keys {
    pub const USER_ID: &str = "userId";
    pub const TYPE: &str = "type";
    pub const PLAN: &str = "plan";
    pub const BOOST_TYPE: &str = "boostType";
    pub const BOOKING_ID: &str = "bookingId";
    pub const PROVIDER_ID: &str = "providerId";
}
