pub mod booking_statuses;
pub mod boost_tiers;
pub mod checkout_kinds;
pub mod payout_statuses;
pub mod plan_tiers;
pub mod subscription_statuses;
pub mod user_roles;
