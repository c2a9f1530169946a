use chrono::{Duration, Utc};
use crates::domain::{
    entities::{bookings::BookingEntity, subscriptions::SubscriptionEntity},
    value_objects::{
        commission::rate_for,
        enums::{
            booking_statuses::BookingStatus, plan_tiers::PlanTier,
            subscription_statuses::SubscriptionStatus,
        },
    },
};
use uuid::Uuid;

pub fn booking(status: BookingStatus, amount_minor: i64) -> BookingEntity {
    let now = Utc::now();
    BookingEntity {
        id: Uuid::new_v4(),
        buyer_id: Uuid::new_v4(),
        provider_id: Uuid::new_v4(),
        service_id: Uuid::new_v4(),
        starts_at: now + Duration::days(2),
        ends_at: now + Duration::days(2) + Duration::hours(1),
        amount_minor,
        status: status.as_str().to_string(),
        notes: None,
        payment_ref: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn subscription(
    user_id: Uuid,
    plan: PlanTier,
    status: SubscriptionStatus,
) -> SubscriptionEntity {
    let now = Utc::now();
    SubscriptionEntity {
        id: Uuid::new_v4(),
        user_id,
        plan: plan.as_str().to_string(),
        status: status.to_string(),
        commission_rate_bps: rate_for(plan).bps(),
        stripe_customer_id: Some("cus_test".to_string()),
        stripe_subscription_id: Some("sub_test".to_string()),
        current_period_start: None,
        current_period_end: None,
        created_at: now,
        updated_at: now,
    }
}
