use std::sync::Arc;

use chrono::{Duration, Utc};
use crates::domain::{
    entities::bookings::{BookingEntity, InsertBookingEntity},
    repositories::{bookings::BookingRepository, services::ServiceRepository},
    value_objects::{
        bookings::{BookingDto, BookingListRole, BookingParty, CreateBookingModel},
        enums::booking_statuses::BookingStatus,
        notifications::NotificationKind,
    },
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::notifications::NotificationEmitter;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("booking not found")]
    NotFound,
    #[error("service not found or inactive")]
    ServiceNotFound,
    #[error("providers cannot book their own service")]
    OwnService,
    #[error("not allowed to act on this booking")]
    Unauthorized,
    #[error("cannot move booking from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    #[error("booking was modified concurrently, reload and retry")]
    StaleState,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BookingError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            BookingError::NotFound | BookingError::ServiceNotFound => StatusCode::NOT_FOUND,
            BookingError::Unauthorized => StatusCode::FORBIDDEN,
            BookingError::OwnService => StatusCode::UNPROCESSABLE_ENTITY,
            BookingError::InvalidTransition { .. } | BookingError::StaleState => {
                StatusCode::CONFLICT
            }
            BookingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, BookingError>;

/// What a completed payment did to its booking.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentApplication {
    /// The booking is now CONFIRMED and carries this payment.
    Confirmed(BookingEntity),
    /// The same payment was applied before; nothing changed.
    AlreadyApplied(BookingEntity),
    /// The money was captured but cannot be applied and must go back to the buyer.
    RefundRequired {
        booking: BookingEntity,
        reason: String,
    },
}

enum PaymentDecision {
    Apply,
    AlreadyApplied,
    Refund(String),
}

fn decide_payment(booking: &BookingEntity, payment_ref: &str) -> PaymentDecision {
    match (booking.status(), booking.payment_ref.as_deref()) {
        (BookingStatus::Confirmed | BookingStatus::Completed, Some(existing))
            if existing == payment_ref =>
        {
            PaymentDecision::AlreadyApplied
        }
        (BookingStatus::Cancelled, _) => {
            PaymentDecision::Refund("booking was cancelled before the payment settled".to_string())
        }
        (_, Some(_)) => {
            PaymentDecision::Refund("booking is already paid by another payment".to_string())
        }
        (BookingStatus::Pending | BookingStatus::Confirmed, None) => PaymentDecision::Apply,
        (BookingStatus::Completed, None) => {
            PaymentDecision::Refund("booking was completed without this payment".to_string())
        }
    }
}

pub struct BookingUseCase {
    booking_repo: Arc<dyn BookingRepository + Send + Sync>,
    service_repo: Arc<dyn ServiceRepository + Send + Sync>,
    notifier: Arc<NotificationEmitter>,
}

impl BookingUseCase {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository + Send + Sync>,
        service_repo: Arc<dyn ServiceRepository + Send + Sync>,
        notifier: Arc<NotificationEmitter>,
    ) -> Self {
        Self {
            booking_repo,
            service_repo,
            notifier,
        }
    }

    pub async fn create(
        &self,
        buyer_id: Uuid,
        model: CreateBookingModel,
    ) -> UseCaseResult<BookingDto> {
        let service_id = model.service_id;
        let service = self
            .service_repo
            .find_active_by_id(service_id)
            .await
            .map_err(|err| {
                error!(%service_id, db_error = ?err, "bookings: failed to load service");
                BookingError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%service_id, %buyer_id, "bookings: service missing or inactive");
                BookingError::ServiceNotFound
            })?;

        if service.provider_id == buyer_id {
            warn!(%service_id, %buyer_id, "bookings: provider tried to book own service");
            return Err(BookingError::OwnService);
        }

        let ends_at = model.start_time + Duration::minutes(i64::from(service.duration_minutes));

        let booking = self
            .booking_repo
            .insert(InsertBookingEntity {
                buyer_id,
                provider_id: service.provider_id,
                service_id,
                starts_at: model.start_time,
                ends_at,
                amount_minor: service.price_minor,
                status: BookingStatus::Pending.as_str().to_string(),
                notes: model.notes,
            })
            .await
            .map_err(|err| {
                error!(%buyer_id, %service_id, db_error = ?err, "bookings: failed to insert booking");
                BookingError::Internal(err)
            })?;

        info!(
            booking_id = %booking.id,
            %buyer_id,
            provider_id = %booking.provider_id,
            amount_minor = booking.amount_minor,
            "bookings: booking requested"
        );

        self.notifier
            .emit(
                booking.provider_id,
                NotificationKind::BookingRequested,
                "New booking request",
                format!("You have a new booking request for {}", service.title),
                json!({ "bookingId": booking.id, "serviceId": service_id }),
            )
            .await;

        Ok(BookingDto::from(booking))
    }

    /// Moves a booking on behalf of one of its parties.
    pub async fn transition(
        &self,
        booking_id: Uuid,
        actor_id: Uuid,
        target: BookingStatus,
    ) -> UseCaseResult<BookingDto> {
        let mut booking = self.load(booking_id).await?;

        let party = BookingParty::of(&booking, actor_id).ok_or_else(|| {
            warn!(%booking_id, %actor_id, "bookings: transition by non-party rejected");
            BookingError::Unauthorized
        })?;

        if !party.may_request(target) {
            warn!(
                %booking_id,
                %actor_id,
                party = ?party,
                target = %target,
                "bookings: party may not request this status"
            );
            return Err(BookingError::Unauthorized);
        }

        let current = booking.status();
        if !current.can_transition_to(target) {
            warn!(
                %booking_id,
                from = %current,
                to = %target,
                "bookings: illegal transition rejected"
            );
            return Err(BookingError::InvalidTransition {
                from: current,
                to: target,
            });
        }

        let applied = self
            .booking_repo
            .compare_and_set_status(booking_id, current, target)
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "bookings: failed to update status");
                BookingError::Internal(err)
            })?;

        if !applied {
            warn!(
                %booking_id,
                from = %current,
                to = %target,
                "bookings: status changed underneath transition"
            );
            return Err(BookingError::StaleState);
        }

        info!(%booking_id, %actor_id, from = %current, to = %target, "bookings: status changed");

        booking.status = target.as_str().to_string();
        booking.updated_at = Utc::now();

        self.notifier
            .emit(
                party.counterparty_id(&booking),
                NotificationKind::BookingStatusChanged,
                "Booking updated",
                format!("A booking is now {}", target.as_str()),
                json!({ "bookingId": booking_id, "status": target }),
            )
            .await;

        Ok(BookingDto::from(booking))
    }

    /// Applies a settled payment to its booking. Never overrides a cancellation.
    pub async fn mark_confirmed_by_payment(
        &self,
        booking_id: Uuid,
        payment_ref: &str,
    ) -> UseCaseResult<PaymentApplication> {
        let booking = self.load(booking_id).await?;

        match decide_payment(&booking, payment_ref) {
            PaymentDecision::AlreadyApplied => {
                info!(%booking_id, payment_ref, "bookings: payment already applied");
                return Ok(PaymentApplication::AlreadyApplied(booking));
            }
            PaymentDecision::Refund(reason) => {
                warn!(%booking_id, payment_ref, reason = %reason, "bookings: payment cannot be applied");
                return Ok(PaymentApplication::RefundRequired { booking, reason });
            }
            PaymentDecision::Apply => {}
        }

        let applied = self
            .booking_repo
            .confirm_with_payment(booking_id, payment_ref.to_string())
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "bookings: failed to confirm booking by payment");
                BookingError::Internal(err)
            })?;

        if applied {
            info!(%booking_id, payment_ref, "bookings: booking confirmed by payment");
            let mut booking = booking;
            booking.status = BookingStatus::Confirmed.as_str().to_string();
            booking.payment_ref = Some(payment_ref.to_string());
            booking.updated_at = Utc::now();
            return Ok(PaymentApplication::Confirmed(booking));
        }

        // Lost a race with a cancellation or another payment; judge the fresh row.
        let booking = self.load(booking_id).await?;
        match decide_payment(&booking, payment_ref) {
            PaymentDecision::AlreadyApplied => Ok(PaymentApplication::AlreadyApplied(booking)),
            PaymentDecision::Refund(reason) => {
                warn!(%booking_id, payment_ref, reason = %reason, "bookings: payment cannot be applied");
                Ok(PaymentApplication::RefundRequired { booking, reason })
            }
            PaymentDecision::Apply => Err(BookingError::StaleState),
        }
    }

    pub async fn get(&self, booking_id: Uuid, actor_id: Uuid) -> UseCaseResult<BookingDto> {
        let booking = self.load(booking_id).await?;

        if BookingParty::of(&booking, actor_id).is_none() {
            warn!(%booking_id, %actor_id, "bookings: read by non-party rejected");
            return Err(BookingError::Unauthorized);
        }

        Ok(BookingDto::from(booking))
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        role: BookingListRole,
    ) -> UseCaseResult<Vec<BookingDto>> {
        let bookings = match role {
            BookingListRole::Buyer => self.booking_repo.list_by_buyer(user_id).await,
            BookingListRole::Provider => self.booking_repo.list_by_provider(user_id).await,
        }
        .map_err(|err| {
            error!(%user_id, role = ?role, db_error = ?err, "bookings: failed to list bookings");
            BookingError::Internal(err)
        })?;

        info!(%user_id, role = ?role, count = bookings.len(), "bookings: listed");
        Ok(bookings.into_iter().map(BookingDto::from).collect())
    }

    async fn load(&self, booking_id: Uuid) -> UseCaseResult<BookingEntity> {
        self.booking_repo
            .find_by_id(booking_id)
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "bookings: failed to load booking");
                BookingError::Internal(err)
            })?
            .ok_or(BookingError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::test_support::booking;
    use crates::domain::{
        entities::services::ServiceEntity,
        repositories::{
            bookings::MockBookingRepository, notifications::MockNotificationRepository,
            services::MockServiceRepository,
        },
    };
    use mockall::predicate::eq;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn quiet_notifier() -> Arc<NotificationEmitter> {
        let mut notification_repo = MockNotificationRepository::new();
        notification_repo
            .expect_insert()
            .returning(|_| Ok(Uuid::new_v4()));
        Arc::new(NotificationEmitter::new(Arc::new(notification_repo)))
    }

    fn usecase(booking_repo: MockBookingRepository) -> BookingUseCase {
        BookingUseCase::new(
            Arc::new(booking_repo),
            Arc::new(MockServiceRepository::new()),
            quiet_notifier(),
        )
    }

    fn repo_returning(found: BookingEntity) -> MockBookingRepository {
        let mut booking_repo = MockBookingRepository::new();
        booking_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        booking_repo
    }

    #[tokio::test]
    async fn create_snapshots_service_price_and_duration() {
        let provider_id = Uuid::new_v4();
        let service = ServiceEntity {
            id: Uuid::new_v4(),
            provider_id,
            title: "Mixing session".to_string(),
            price_minor: 15_000,
            duration_minutes: 90,
            is_active: true,
        };
        let service_id = service.id;
        let start_time = Utc::now() + Duration::days(3);

        let mut service_repo = MockServiceRepository::new();
        service_repo
            .expect_find_active_by_id()
            .with(eq(service_id))
            .returning(move |_| Ok(Some(service.clone())));

        let mut booking_repo = MockBookingRepository::new();
        booking_repo
            .expect_insert()
            .withf(move |insert| {
                insert.provider_id == provider_id
                    && insert.amount_minor == 15_000
                    && insert.ends_at == start_time + Duration::minutes(90)
                    && insert.status == "pending"
            })
            .times(1)
            .returning(|insert| {
                let mut created = booking(BookingStatus::Pending, insert.amount_minor);
                created.buyer_id = insert.buyer_id;
                created.provider_id = insert.provider_id;
                created.service_id = insert.service_id;
                created.starts_at = insert.starts_at;
                created.ends_at = insert.ends_at;
                Ok(created)
            });

        let mut notification_repo = MockNotificationRepository::new();
        notification_repo
            .expect_insert()
            .withf(move |n| n.user_id == provider_id && n.kind == "booking_requested")
            .times(1)
            .returning(|_| Ok(Uuid::new_v4()));

        let usecase = BookingUseCase::new(
            Arc::new(booking_repo),
            Arc::new(service_repo),
            Arc::new(NotificationEmitter::new(Arc::new(notification_repo))),
        );

        let dto = usecase
            .create(
                Uuid::new_v4(),
                CreateBookingModel {
                    service_id,
                    start_time,
                    notes: Some("bring stems".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(dto.status, BookingStatus::Pending);
        assert_eq!(dto.amount_minor, 15_000);
        assert_eq!(dto.end_time, start_time + Duration::minutes(90));
    }

    #[tokio::test]
    async fn create_rejects_inactive_service() {
        let mut service_repo = MockServiceRepository::new();
        service_repo
            .expect_find_active_by_id()
            .returning(|_| Ok(None));

        let usecase = BookingUseCase::new(
            Arc::new(MockBookingRepository::new()),
            Arc::new(service_repo),
            quiet_notifier(),
        );

        let result = usecase
            .create(
                Uuid::new_v4(),
                CreateBookingModel {
                    service_id: Uuid::new_v4(),
                    start_time: Utc::now(),
                    notes: None,
                },
            )
            .await;

        assert!(matches!(result, Err(BookingError::ServiceNotFound)));
    }

    #[tokio::test]
    async fn create_rejects_booking_own_service() {
        let provider_id = Uuid::new_v4();
        let service = ServiceEntity {
            id: Uuid::new_v4(),
            provider_id,
            title: "Mixing session".to_string(),
            price_minor: 15_000,
            duration_minutes: 60,
            is_active: true,
        };
        let service_id = service.id;

        let mut service_repo = MockServiceRepository::new();
        service_repo
            .expect_find_active_by_id()
            .returning(move |_| Ok(Some(service.clone())));
        let mut booking_repo = MockBookingRepository::new();
        booking_repo.expect_insert().times(0);

        let usecase = BookingUseCase::new(
            Arc::new(booking_repo),
            Arc::new(service_repo),
            quiet_notifier(),
        );

        let result = usecase
            .create(
                provider_id,
                CreateBookingModel {
                    service_id,
                    start_time: Utc::now(),
                    notes: None,
                },
            )
            .await;

        assert!(matches!(result, Err(BookingError::OwnService)));
    }

    #[tokio::test]
    async fn authorization_matrix_from_pending() {
        let pending = booking(BookingStatus::Pending, 10_000);
        let stranger = Uuid::new_v4();
        let actors = [
            ("buyer", pending.buyer_id),
            ("provider", pending.provider_id),
            ("stranger", stranger),
        ];
        let targets = [
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ];

        let mut succeeded = Vec::new();
        for (label, actor_id) in actors {
            for target in targets {
                let mut booking_repo = repo_returning(pending.clone());
                booking_repo
                    .expect_compare_and_set_status()
                    .returning(|_, _, _| Ok(true));

                let result = usecase(booking_repo)
                    .transition(pending.id, actor_id, target)
                    .await;

                match result {
                    Ok(dto) => {
                        assert_eq!(dto.status, target);
                        succeeded.push((label, target));
                    }
                    Err(err) => assert!(
                        matches!(err, BookingError::Unauthorized),
                        "{label} -> {target} failed with {err}"
                    ),
                }
            }
        }

        assert_eq!(
            succeeded,
            vec![
                ("buyer", BookingStatus::Cancelled),
                ("provider", BookingStatus::Confirmed),
                ("provider", BookingStatus::Cancelled),
            ]
        );
    }

    #[tokio::test]
    async fn provider_cannot_confirm_a_cancelled_booking() {
        let cancelled = booking(BookingStatus::Cancelled, 10_000);
        let provider_id = cancelled.provider_id;
        let booking_id = cancelled.id;

        let result = usecase(repo_returning(cancelled))
            .transition(booking_id, provider_id, BookingStatus::Confirmed)
            .await;

        assert!(matches!(
            result,
            Err(BookingError::InvalidTransition {
                from: BookingStatus::Cancelled,
                to: BookingStatus::Confirmed
            })
        ));
    }

    #[tokio::test]
    async fn concurrent_transitions_leave_one_stale() {
        let pending = booking(BookingStatus::Pending, 10_000);
        let provider_id = pending.provider_id;
        let buyer_id = pending.buyer_id;
        let booking_id = pending.id;

        let written = Arc::new(AtomicBool::new(false));
        let mut booking_repo = repo_returning(pending);
        let cas_flag = Arc::clone(&written);
        booking_repo
            .expect_compare_and_set_status()
            .with(eq(booking_id), eq(BookingStatus::Pending), mockall::predicate::always())
            .times(2)
            .returning(move |_, _, _| Ok(!cas_flag.swap(true, Ordering::SeqCst)));

        let usecase = usecase(booking_repo);
        let (confirm, cancel) = tokio::join!(
            usecase.transition(booking_id, provider_id, BookingStatus::Confirmed),
            usecase.transition(booking_id, buyer_id, BookingStatus::Cancelled),
        );

        let outcomes = [confirm, cancel];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            outcomes
                .iter()
                .filter(|r| matches!(r, Err(BookingError::StaleState)))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn payment_confirms_pending_booking() {
        let pending = booking(BookingStatus::Pending, 15_000);
        let booking_id = pending.id;

        let mut booking_repo = repo_returning(pending);
        booking_repo
            .expect_confirm_with_payment()
            .with(eq(booking_id), eq("pi_1".to_string()))
            .times(1)
            .returning(|_, _| Ok(true));

        let outcome = usecase(booking_repo)
            .mark_confirmed_by_payment(booking_id, "pi_1")
            .await
            .unwrap();

        match outcome {
            PaymentApplication::Confirmed(confirmed) => {
                assert_eq!(confirmed.status(), BookingStatus::Confirmed);
                assert_eq!(confirmed.payment_ref.as_deref(), Some("pi_1"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn same_payment_twice_is_a_no_op() {
        let mut confirmed = booking(BookingStatus::Confirmed, 15_000);
        confirmed.payment_ref = Some("pi_1".to_string());
        let booking_id = confirmed.id;

        let mut booking_repo = repo_returning(confirmed);
        booking_repo.expect_confirm_with_payment().never();

        let outcome = usecase(booking_repo)
            .mark_confirmed_by_payment(booking_id, "pi_1")
            .await
            .unwrap();

        assert!(matches!(outcome, PaymentApplication::AlreadyApplied(_)));
    }

    #[tokio::test]
    async fn payment_for_cancelled_booking_requires_refund() {
        let cancelled = booking(BookingStatus::Cancelled, 15_000);
        let booking_id = cancelled.id;

        let mut booking_repo = repo_returning(cancelled);
        booking_repo.expect_confirm_with_payment().never();

        let outcome = usecase(booking_repo)
            .mark_confirmed_by_payment(booking_id, "pi_1")
            .await
            .unwrap();

        match outcome {
            PaymentApplication::RefundRequired { booking, .. } => {
                assert_eq!(booking.status(), BookingStatus::Cancelled);
                assert_eq!(booking.payment_ref, None);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn second_distinct_payment_requires_refund() {
        let mut confirmed = booking(BookingStatus::Confirmed, 15_000);
        confirmed.payment_ref = Some("pi_first".to_string());
        let booking_id = confirmed.id;

        let outcome = usecase(repo_returning(confirmed))
            .mark_confirmed_by_payment(booking_id, "pi_second")
            .await
            .unwrap();

        assert!(matches!(outcome, PaymentApplication::RefundRequired { .. }));
    }

    #[tokio::test]
    async fn payment_losing_race_to_cancel_requires_refund() {
        let pending = booking(BookingStatus::Pending, 15_000);
        let booking_id = pending.id;
        let mut cancelled = pending.clone();
        cancelled.status = BookingStatus::Cancelled.as_str().to_string();

        let reads = Arc::new(AtomicBool::new(false));
        let mut booking_repo = MockBookingRepository::new();
        booking_repo.expect_find_by_id().times(2).returning(move |_| {
            if reads.swap(true, Ordering::SeqCst) {
                Ok(Some(cancelled.clone()))
            } else {
                Ok(Some(pending.clone()))
            }
        });
        booking_repo
            .expect_confirm_with_payment()
            .times(1)
            .returning(|_, _| Ok(false));

        let outcome = usecase(booking_repo)
            .mark_confirmed_by_payment(booking_id, "pi_1")
            .await
            .unwrap();

        assert!(matches!(outcome, PaymentApplication::RefundRequired { .. }));
    }

    #[tokio::test]
    async fn strangers_cannot_read_a_booking() {
        let pending = booking(BookingStatus::Pending, 15_000);
        let booking_id = pending.id;
        let buyer_id = pending.buyer_id;
        let usecase = usecase(repo_returning(pending));

        assert!(usecase.get(booking_id, buyer_id).await.is_ok());
        assert!(matches!(
            usecase.get(booking_id, Uuid::new_v4()).await,
            Err(BookingError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn missing_booking_is_not_found() {
        let mut booking_repo = MockBookingRepository::new();
        booking_repo.expect_find_by_id().returning(|_| Ok(None));

        let result = usecase(booking_repo)
            .transition(Uuid::new_v4(), Uuid::new_v4(), BookingStatus::Cancelled)
            .await;

        assert!(matches!(result, Err(BookingError::NotFound)));
    }
}
