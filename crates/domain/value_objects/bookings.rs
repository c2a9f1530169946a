use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::bookings::BookingEntity;
use crate::domain::value_objects::enums::booking_statuses::BookingStatus;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingModel {
    pub service_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBookingStatusModel {
    pub status: BookingStatus,
}

/// Which side of the booking the caller wants to list.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingListRole {
    Buyer,
    Provider,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListBookingsQuery {
    pub role: Option<BookingListRole>,
}

/// The actor's relationship to a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingParty {
    Buyer,
    Provider,
}

impl BookingParty {
    /// Provider wins if both ids match; bookings of one's own service are refused at creation.
    pub fn of(booking: &BookingEntity, actor_id: Uuid) -> Option<Self> {
        if booking.provider_id == actor_id {
            Some(BookingParty::Provider)
        } else if booking.buyer_id == actor_id {
            Some(BookingParty::Buyer)
        } else {
            None
        }
    }

    /// Who may request which status. COMPLETED is never a human decision.
    pub fn may_request(&self, target: BookingStatus) -> bool {
        match (self, target) {
            (BookingParty::Provider, BookingStatus::Confirmed)
            | (BookingParty::Provider, BookingStatus::Cancelled)
            | (BookingParty::Buyer, BookingStatus::Cancelled) => true,
            (BookingParty::Provider, BookingStatus::Pending)
            | (BookingParty::Provider, BookingStatus::Completed)
            | (BookingParty::Buyer, BookingStatus::Pending)
            | (BookingParty::Buyer, BookingStatus::Confirmed)
            | (BookingParty::Buyer, BookingStatus::Completed) => false,
        }
    }

    pub fn counterparty_id(&self, booking: &BookingEntity) -> Uuid {
        match self {
            BookingParty::Buyer => booking.provider_id,
            BookingParty::Provider => booking.buyer_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingDto {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub provider_id: Uuid,
    pub service_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub amount_minor: i64,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub payment_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<BookingEntity> for BookingDto {
    fn from(value: BookingEntity) -> Self {
        let status = value.status();
        Self {
            id: value.id,
            buyer_id: value.buyer_id,
            provider_id: value.provider_id,
            service_id: value.service_id,
            start_time: value.starts_at,
            end_time: value.ends_at,
            amount_minor: value.amount_minor,
            status,
            notes: value.notes,
            payment_ref: value.payment_ref,
            created_at: value.created_at,
        }
    }
}
