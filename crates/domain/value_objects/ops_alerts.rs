use uuid::Uuid;

/// A captured payment that could not be applied and must be refunded by operations.
#[derive(Debug, Clone, PartialEq)]
pub struct RefundIntentAlert {
    pub booking_id: Uuid,
    pub buyer_id: Uuid,
    pub payment_ref: String,
    pub amount_minor: i64,
    pub reason: String,
}
