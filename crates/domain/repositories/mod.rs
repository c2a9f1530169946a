pub mod bookings;
pub mod boosts;
pub mod notifications;
pub mod ops_alerts;
pub mod payout_accounts;
pub mod payouts;
pub mod processed_webhook_events;
pub mod services;
pub mod subscriptions;
