pub mod bookings;
pub mod checkout;
pub mod commission_resolver;
pub mod notifications;
pub mod payment_events;
pub mod payment_views;
pub mod payout_scheduler;
pub mod stripe_gateway;

#[cfg(test)]
mod test_support;
