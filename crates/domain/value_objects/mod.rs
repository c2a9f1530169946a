pub mod bookings;
pub mod boosts;
pub mod checkout;
pub mod commission;
pub mod enums;
pub mod notifications;
pub mod ops_alerts;
pub mod payouts;
