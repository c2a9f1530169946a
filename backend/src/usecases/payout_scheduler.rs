use chrono::{DateTime, Duration, Utc};
use crates::domain::{
    entities::{bookings::BookingEntity, payouts::InsertPayoutEntity},
    value_objects::{commission::CommissionRate, enums::payout_statuses::PayoutStatus},
};

/// Funds are held this long after confirmation before a payout may settle.
pub const SETTLEMENT_DELAY_HOURS: i64 = 24;

/// Splits a confirmed booking's amount into commission and the provider's net share.
pub fn schedule(
    booking: &BookingEntity,
    provider_rate: CommissionRate,
    confirmed_at: DateTime<Utc>,
) -> InsertPayoutEntity {
    let gross_minor = booking.amount_minor;
    let commission_minor = provider_rate.fee_for(gross_minor);

    InsertPayoutEntity {
        provider_id: booking.provider_id,
        booking_id: booking.id,
        gross_minor,
        commission_minor,
        net_minor: gross_minor - commission_minor,
        commission_rate_bps: provider_rate.bps(),
        status: PayoutStatus::Pending.as_str().to_string(),
        scheduled_at: confirmed_at + Duration::hours(SETTLEMENT_DELAY_HOURS),
    }
}
