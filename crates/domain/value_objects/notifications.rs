use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    BookingRequested,
    BookingStatusChanged,
    BookingConfirmed,
    PaymentReceived,
    RefundPending,
    SubscriptionActivated,
    BoostActivated,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::BookingRequested => "booking_requested",
            NotificationKind::BookingStatusChanged => "booking_status_changed",
            NotificationKind::BookingConfirmed => "booking_confirmed",
            NotificationKind::PaymentReceived => "payment_received",
            NotificationKind::RefundPending => "refund_pending",
            NotificationKind::SubscriptionActivated => "subscription_activated",
            NotificationKind::BoostActivated => "boost_activated",
        }
    }
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formats minor units as a two-decimal amount, e.g. `14250` -> `142.50`.
pub fn format_minor(amount_minor: i64) -> String {
    let sign = if amount_minor < 0 { "-" } else { "" };
    let abs = amount_minor.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
