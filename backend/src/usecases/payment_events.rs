use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, TimeZone, Utc};
use crates::{
    domain::{
        entities::{boosts::InsertBoostEntity, subscriptions::UpsertSubscriptionEntity},
        repositories::{
            boosts::BoostRepository, ops_alerts::OpsAlertClient,
            payout_accounts::PayoutAccountRepository, payouts::PayoutRepository,
            processed_webhook_events::ProcessedWebhookEventRepository,
            subscriptions::SubscriptionRepository,
        },
        value_objects::{
            checkout::metadata_keys,
            commission::rate_for,
            enums::{
                boost_tiers::BoostTier, checkout_kinds::CheckoutKind, plan_tiers::PlanTier,
                subscription_statuses::SubscriptionStatus,
            },
            notifications::{NotificationKind, format_minor},
            ops_alerts::RefundIntentAlert,
        },
    },
    payments::stripe_client::{StripeCheckoutSession, StripeClient, StripeEvent},
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::usecases::{
    bookings::{BookingError, BookingUseCase, PaymentApplication},
    commission_resolver::CommissionResolver,
    notifications::NotificationEmitter,
    payout_scheduler,
    stripe_gateway::StripeGateway,
};

/// A claim left in `processing` longer than this is assumed abandoned.
const STALE_CLAIM_MINUTES: i64 = 30;

#[derive(Debug, Error)]
pub enum PaymentEventError {
    #[error("invalid webhook signature")]
    InvalidSignature,
    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PaymentEventError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PaymentEventError::InvalidSignature | PaymentEventError::InvalidPayload(_) => {
                StatusCode::BAD_REQUEST
            }
            PaymentEventError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, PaymentEventError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Processed,
    /// The event id was seen before; acknowledged without side effects.
    AlreadyProcessed,
    /// Verified but nothing to do for it.
    Ignored,
}

pub struct PaymentEventUseCase {
    stripe_client: Arc<dyn StripeGateway>,
    event_repo: Arc<dyn ProcessedWebhookEventRepository + Send + Sync>,
    bookings: Arc<BookingUseCase>,
    subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync>,
    boost_repo: Arc<dyn BoostRepository + Send + Sync>,
    payout_repo: Arc<dyn PayoutRepository + Send + Sync>,
    payout_account_repo: Arc<dyn PayoutAccountRepository + Send + Sync>,
    commission_resolver: Arc<CommissionResolver>,
    notifier: Arc<NotificationEmitter>,
    ops_alerts: Arc<dyn OpsAlertClient + Send + Sync>,
}

/// Collaborators of [`PaymentEventUseCase`].
pub struct PaymentEventDeps {
    pub stripe_client: Arc<dyn StripeGateway>,
    pub event_repo: Arc<dyn ProcessedWebhookEventRepository + Send + Sync>,
    pub bookings: Arc<BookingUseCase>,
    pub subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync>,
    pub boost_repo: Arc<dyn BoostRepository + Send + Sync>,
    pub payout_repo: Arc<dyn PayoutRepository + Send + Sync>,
    pub payout_account_repo: Arc<dyn PayoutAccountRepository + Send + Sync>,
    pub commission_resolver: Arc<CommissionResolver>,
    pub notifier: Arc<NotificationEmitter>,
    pub ops_alerts: Arc<dyn OpsAlertClient + Send + Sync>,
}

impl PaymentEventUseCase {
    pub fn new(deps: PaymentEventDeps) -> Self {
        Self {
            stripe_client: deps.stripe_client,
            event_repo: deps.event_repo,
            bookings: deps.bookings,
            subscription_repo: deps.subscription_repo,
            boost_repo: deps.boost_repo,
            payout_repo: deps.payout_repo,
            payout_account_repo: deps.payout_account_repo,
            commission_resolver: deps.commission_resolver,
            notifier: deps.notifier,
            ops_alerts: deps.ops_alerts,
        }
    }

    /// Verifies, deduplicates and applies one Stripe webhook delivery.
    pub async fn handle_stripe_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> UseCaseResult<WebhookOutcome> {
        self.stripe_client
            .verify_webhook_signature(payload, signature)
            .map_err(|err| {
                warn!(error = %err, "payment_events: stripe webhook verification failed");
                PaymentEventError::InvalidSignature
            })?;

        let event = StripeClient::parse_event(payload).map_err(|err| {
            warn!(error = %err, "payment_events: unparseable stripe event");
            PaymentEventError::InvalidPayload("malformed event body".to_string())
        })?;

        let event_id = event.id.clone();
        let event_type = event.type_.clone();
        info!(%event_id, %event_type, "payment_events: stripe webhook verified");

        let stale_before = Utc::now() - Duration::minutes(STALE_CLAIM_MINUTES);
        let claimed = self
            .event_repo
            .claim(event_id.clone(), event_type.clone(), stale_before)
            .await
            .map_err(|err| {
                error!(%event_id, db_error = ?err, "payment_events: failed to claim event");
                PaymentEventError::Internal(err)
            })?;

        if !claimed {
            info!(%event_id, %event_type, "payment_events: duplicate delivery skipped");
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        match self.dispatch(&event).await {
            Ok(outcome) => {
                if let Err(err) = self.event_repo.mark_succeeded(event_id.clone()).await {
                    error!(%event_id, db_error = ?err, "payment_events: failed to mark event succeeded");
                }
                info!(%event_id, %event_type, outcome = ?outcome, "payment_events: event handled");
                Ok(outcome)
            }
            Err(err) => {
                error!(%event_id, %event_type, error = %err, "payment_events: event processing failed");
                if let Err(release_err) = self.event_repo.release(event_id.clone()).await {
                    error!(%event_id, db_error = ?release_err, "payment_events: failed to release claim");
                }
                Err(err)
            }
        }
    }

    async fn dispatch(&self, event: &StripeEvent) -> UseCaseResult<WebhookOutcome> {
        match event.type_.as_str() {
            "checkout.session.completed" => self.handle_checkout_completed(event).await,
            "customer.subscription.updated" => self.handle_subscription_updated(event).await,
            "customer.subscription.deleted" => self.handle_subscription_deleted(event).await,
            "account.updated" => self.handle_account_updated(event).await,
            _ => {
                debug!("unhandled stripe event type: {:?}", event.type_);
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn handle_checkout_completed(&self, event: &StripeEvent) -> UseCaseResult<WebhookOutcome> {
        let Some(session) = StripeClient::extract_checkout_session(event) else {
            warn!(event_id = %event.id, "payment_events: checkout session missing in webhook");
            return Ok(WebhookOutcome::Ignored);
        };
        let metadata = session.metadata.clone().unwrap_or_default();

        let kind = metadata
            .get(metadata_keys::TYPE)
            .and_then(|value| CheckoutKind::from_str(value));

        match kind {
            Some(CheckoutKind::Subscription) => {
                self.activate_subscription(&session, &metadata).await
            }
            Some(CheckoutKind::Boost) => self.activate_boost(&session, &metadata).await,
            Some(CheckoutKind::Booking) => self.settle_booking(&session, &metadata).await,
            None => {
                warn!(
                    event_id = %event.id,
                    kind = ?metadata.get(metadata_keys::TYPE),
                    "payment_events: checkout session without a known type"
                );
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn activate_subscription(
        &self,
        session: &StripeCheckoutSession,
        metadata: &HashMap<String, String>,
    ) -> UseCaseResult<WebhookOutcome> {
        let Some(user_id) = metadata_uuid(metadata, metadata_keys::USER_ID) else {
            warn!(session_id = ?session.id, "payment_events: subscription checkout missing userId");
            return Ok(WebhookOutcome::Ignored);
        };
        let Some(plan) = metadata
            .get(metadata_keys::PLAN)
            .and_then(|value| PlanTier::from_str(value))
            .filter(|plan| *plan != PlanTier::Free)
        else {
            warn!(%user_id, plan = ?metadata.get(metadata_keys::PLAN), "payment_events: subscription checkout with invalid plan");
            return Ok(WebhookOutcome::Ignored);
        };

        let (period_start, period_end) = match session.subscription.clone() {
            Some(subscription_id) => {
                let subscription = self
                    .stripe_client
                    .retrieve_subscription(subscription_id.clone())
                    .await
                    .map_err(|err| {
                        error!(%user_id, %subscription_id, error = %err, "payment_events: failed to retrieve stripe subscription");
                        PaymentEventError::Internal(err)
                    })?;
                (
                    subscription.period_start().and_then(ts_to_datetime),
                    subscription.period_end().and_then(ts_to_datetime),
                )
            }
            None => (None, None),
        };

        let saved = self
            .subscription_repo
            .upsert_after_checkout(UpsertSubscriptionEntity {
                user_id,
                plan: plan.as_str().to_string(),
                status: SubscriptionStatus::Active.to_string(),
                commission_rate_bps: rate_for(plan).bps(),
                stripe_customer_id: session.customer.clone(),
                stripe_subscription_id: session.subscription.clone(),
                current_period_start: period_start,
                current_period_end: period_end,
            })
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "payment_events: failed to upsert subscription");
                PaymentEventError::Internal(err)
            })?;

        info!(%user_id, plan = %plan, subscription_id = %saved.id, "payment_events: subscription activated");

        self.notifier
            .emit(
                user_id,
                NotificationKind::SubscriptionActivated,
                "Subscription active",
                format!("Your {} plan is now active", plan.as_str().to_uppercase()),
                json!({ "plan": plan }),
            )
            .await;

        Ok(WebhookOutcome::Processed)
    }

    async fn activate_boost(
        &self,
        session: &StripeCheckoutSession,
        metadata: &HashMap<String, String>,
    ) -> UseCaseResult<WebhookOutcome> {
        let Some(user_id) = metadata_uuid(metadata, metadata_keys::USER_ID) else {
            warn!(session_id = ?session.id, "payment_events: boost checkout missing userId");
            return Ok(WebhookOutcome::Ignored);
        };
        let Some(tier) = metadata
            .get(metadata_keys::BOOST_TYPE)
            .and_then(|value| BoostTier::from_str(value))
        else {
            warn!(%user_id, tier = ?metadata.get(metadata_keys::BOOST_TYPE), "payment_events: boost checkout with invalid tier");
            return Ok(WebhookOutcome::Ignored);
        };
        let Some(payment_ref) = session.id.clone() else {
            warn!(%user_id, "payment_events: boost checkout without session id");
            return Ok(WebhookOutcome::Ignored);
        };

        let expires_at = Utc::now() + tier.duration();
        let inserted = self
            .boost_repo
            .insert_if_absent(InsertBoostEntity {
                user_id,
                tier: tier.as_str().to_string(),
                expires_at,
                payment_ref: payment_ref.clone(),
            })
            .await
            .map_err(|err| {
                error!(%user_id, %payment_ref, db_error = ?err, "payment_events: failed to insert boost");
                PaymentEventError::Internal(err)
            })?;

        let Some(boost) = inserted else {
            info!(%user_id, %payment_ref, "payment_events: boost already recorded for payment");
            return Ok(WebhookOutcome::Processed);
        };

        info!(%user_id, tier = %tier, expires_at = %boost.expires_at, "payment_events: boost activated");

        self.notifier
            .emit(
                user_id,
                NotificationKind::BoostActivated,
                "Boost active",
                format!("Your {} boost is live", tier.as_str()),
                json!({ "tier": tier, "expiresAt": boost.expires_at }),
            )
            .await;

        Ok(WebhookOutcome::Processed)
    }

    async fn settle_booking(
        &self,
        session: &StripeCheckoutSession,
        metadata: &HashMap<String, String>,
    ) -> UseCaseResult<WebhookOutcome> {
        let Some(booking_id) = metadata_uuid(metadata, metadata_keys::BOOKING_ID) else {
            warn!(session_id = ?session.id, "payment_events: booking checkout missing bookingId");
            return Ok(WebhookOutcome::Ignored);
        };
        let Some(payment_ref) = session.payment_intent.clone().or_else(|| session.id.clone())
        else {
            warn!(%booking_id, "payment_events: booking checkout without payment reference");
            return Ok(WebhookOutcome::Ignored);
        };

        let application = match self
            .bookings
            .mark_confirmed_by_payment(booking_id, &payment_ref)
            .await
        {
            Ok(application) => application,
            Err(BookingError::NotFound) => {
                let buyer_id = metadata_uuid(metadata, metadata_keys::USER_ID).unwrap_or_default();
                self.send_refund_intent(RefundIntentAlert {
                    booking_id,
                    buyer_id,
                    payment_ref,
                    amount_minor: session.amount_total.unwrap_or_default(),
                    reason: "payment references an unknown booking".to_string(),
                })
                .await;
                return Ok(WebhookOutcome::Processed);
            }
            Err(err) => {
                return Err(PaymentEventError::Internal(anyhow::anyhow!(
                    "booking payment could not be applied: {err}"
                )));
            }
        };

        let booking = match application {
            PaymentApplication::Confirmed(booking) | PaymentApplication::AlreadyApplied(booking) => {
                booking
            }
            PaymentApplication::RefundRequired { booking, reason } => {
                self.send_refund_intent(RefundIntentAlert {
                    booking_id,
                    buyer_id: booking.buyer_id,
                    payment_ref: payment_ref.clone(),
                    amount_minor: session.amount_total.unwrap_or(booking.amount_minor),
                    reason,
                })
                .await;
                self.notifier
                    .emit(
                        booking.buyer_id,
                        NotificationKind::RefundPending,
                        "Refund on the way",
                        format!(
                            "Your payment of {} could not be applied and will be refunded",
                            format_minor(booking.amount_minor)
                        ),
                        json!({ "bookingId": booking_id }),
                    )
                    .await;
                return Ok(WebhookOutcome::Processed);
            }
        };

        let provider_id = booking.provider_id;
        let rate = self
            .commission_resolver
            .rate_for_user(provider_id)
            .await
            .map_err(|err| {
                error!(%provider_id, db_error = ?err, "payment_events: failed to resolve provider commission");
                PaymentEventError::Internal(err)
            })?;

        let new_payout = payout_scheduler::schedule(&booking, rate, Utc::now());
        let inserted = self
            .payout_repo
            .insert_if_absent(new_payout)
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "payment_events: failed to insert payout");
                PaymentEventError::Internal(err)
            })?;

        let Some(payout) = inserted else {
            info!(%booking_id, "payment_events: payout already scheduled for booking");
            return Ok(WebhookOutcome::Processed);
        };

        info!(
            %booking_id,
            %provider_id,
            payout_id = %payout.id,
            gross_minor = payout.gross_minor,
            commission_minor = payout.commission_minor,
            net_minor = payout.net_minor,
            scheduled_at = %payout.scheduled_at,
            "payment_events: payout scheduled"
        );

        self.notifier
            .emit(
                provider_id,
                NotificationKind::PaymentReceived,
                "Payment received",
                format!(
                    "You will receive {} for this booking",
                    format_minor(payout.net_minor)
                ),
                json!({ "bookingId": booking_id, "payoutId": payout.id, "netMinor": payout.net_minor }),
            )
            .await;
        self.notifier
            .emit(
                booking.buyer_id,
                NotificationKind::BookingConfirmed,
                "Booking confirmed",
                "Your payment went through and the booking is confirmed".to_string(),
                json!({ "bookingId": booking_id }),
            )
            .await;

        Ok(WebhookOutcome::Processed)
    }

    async fn handle_subscription_updated(&self, event: &StripeEvent) -> UseCaseResult<WebhookOutcome> {
        let Some(subscription) = StripeClient::extract_subscription(event) else {
            warn!(event_id = %event.id, "payment_events: invalid subscription payload in webhook");
            return Ok(WebhookOutcome::Ignored);
        };
        let Some(subscription_id) = subscription.id.clone() else {
            warn!(event_id = %event.id, "payment_events: subscription id missing in webhook payload");
            return Ok(WebhookOutcome::Ignored);
        };

        let known = self
            .subscription_repo
            .find_by_stripe_subscription_id(subscription_id.clone())
            .await
            .map_err(|err| {
                error!(%subscription_id, db_error = ?err, "payment_events: failed to load subscription");
                PaymentEventError::Internal(err)
            })?;

        if known.is_none() {
            info!(%subscription_id, "payment_events: update for unknown subscription ignored");
            return Ok(WebhookOutcome::Ignored);
        }

        let status = SubscriptionStatus::from_stripe(subscription.status.as_deref().unwrap_or_default());
        info!(%subscription_id, status = %status, "payment_events: updating subscription status");

        self.subscription_repo
            .update_status_and_period_by_stripe_subscription_id(
                subscription_id.clone(),
                status,
                subscription.period_start().and_then(ts_to_datetime),
                subscription.period_end().and_then(ts_to_datetime),
            )
            .await
            .map_err(|err| {
                error!(%subscription_id, db_error = ?err, "payment_events: failed to update subscription status");
                PaymentEventError::Internal(err)
            })?;

        Ok(WebhookOutcome::Processed)
    }

    async fn handle_subscription_deleted(&self, event: &StripeEvent) -> UseCaseResult<WebhookOutcome> {
        let Some(subscription_id) =
            StripeClient::extract_subscription(event).and_then(|subscription| subscription.id)
        else {
            warn!(event_id = %event.id, "payment_events: subscription id missing in webhook payload");
            return Ok(WebhookOutcome::Ignored);
        };

        let downgraded = self
            .subscription_repo
            .downgrade_to_free_by_stripe_subscription_id(
                subscription_id.clone(),
                rate_for(PlanTier::Free).bps(),
            )
            .await
            .map_err(|err| {
                error!(%subscription_id, db_error = ?err, "payment_events: failed to downgrade subscription");
                PaymentEventError::Internal(err)
            })?;

        if !downgraded {
            info!(%subscription_id, "payment_events: deletion for unknown subscription ignored");
            return Ok(WebhookOutcome::Ignored);
        }

        info!(%subscription_id, "payment_events: subscription downgraded to free");
        Ok(WebhookOutcome::Processed)
    }

    async fn handle_account_updated(&self, event: &StripeEvent) -> UseCaseResult<WebhookOutcome> {
        let Some(account) = StripeClient::extract_account(event) else {
            warn!(event_id = %event.id, "payment_events: invalid account payload in webhook");
            return Ok(WebhookOutcome::Ignored);
        };

        let updated = self
            .payout_account_repo
            .update_capabilities(
                account.id.clone(),
                account.charges_enabled,
                account.payouts_enabled,
            )
            .await
            .map_err(|err| {
                error!(stripe_account_id = %account.id, db_error = ?err, "payment_events: failed to update payout account");
                PaymentEventError::Internal(err)
            })?;

        if !updated {
            info!(stripe_account_id = %account.id, "payment_events: update for unknown connected account ignored");
            return Ok(WebhookOutcome::Ignored);
        }

        info!(
            stripe_account_id = %account.id,
            charges_enabled = account.charges_enabled,
            payouts_enabled = account.payouts_enabled,
            "payment_events: payout account capabilities mirrored"
        );
        Ok(WebhookOutcome::Processed)
    }

    async fn send_refund_intent(&self, alert: RefundIntentAlert) {
        let booking_id = alert.booking_id;
        if let Err(err) = self.ops_alerts.send_refund_intent(alert).await {
            error!(%booking_id, error = %err, "payment_events: failed to send refund intent alert");
        }
    }
}

fn metadata_uuid(metadata: &HashMap<String, String>, key: &str) -> Option<Uuid> {
    metadata.get(key).and_then(|value| Uuid::parse_str(value).ok())
}

fn ts_to_datetime(ts: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(ts, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::{
        stripe_gateway::MockStripeGateway,
        test_support::{booking, subscription},
    };
    use crates::{
        domain::{
            entities::{boosts::BoostEntity, payouts::PayoutEntity},
            repositories::{
                bookings::MockBookingRepository, boosts::MockBoostRepository,
                notifications::MockNotificationRepository, ops_alerts::MockOpsAlertClient,
                payout_accounts::MockPayoutAccountRepository, payouts::MockPayoutRepository,
                processed_webhook_events::MockProcessedWebhookEventRepository,
                services::MockServiceRepository, subscriptions::MockSubscriptionRepository,
            },
            value_objects::enums::booking_statuses::BookingStatus,
        },
        payments::stripe_client::StripeSubscription,
    };
    use mockall::predicate::eq;
    use std::sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    };

    struct Deps {
        stripe: MockStripeGateway,
        event_repo: MockProcessedWebhookEventRepository,
        booking_repo: MockBookingRepository,
        subscription_repo: MockSubscriptionRepository,
        boost_repo: MockBoostRepository,
        payout_repo: MockPayoutRepository,
        payout_account_repo: MockPayoutAccountRepository,
        resolver_subscriptions: MockSubscriptionRepository,
        notification_repo: MockNotificationRepository,
        ops_alerts: MockOpsAlertClient,
    }

    impl Deps {
        /// Valid signature and a ledger that claims every event once.
        fn new() -> Self {
            let mut stripe = MockStripeGateway::new();
            stripe
                .expect_verify_webhook_signature()
                .returning(|_, _| Ok(()));

            let mut event_repo = MockProcessedWebhookEventRepository::new();
            let seen = Arc::new(Mutex::new(Vec::<String>::new()));
            event_repo
                .expect_claim()
                .returning(move |event_id, _, _| {
                    let mut seen = seen.lock().unwrap();
                    if seen.contains(&event_id) {
                        Ok(false)
                    } else {
                        seen.push(event_id);
                        Ok(true)
                    }
                });
            event_repo.expect_mark_succeeded().returning(|_| Ok(()));

            let mut notification_repo = MockNotificationRepository::new();
            notification_repo
                .expect_insert()
                .returning(|_| Ok(Uuid::new_v4()));

            Self {
                stripe,
                event_repo,
                booking_repo: MockBookingRepository::new(),
                subscription_repo: MockSubscriptionRepository::new(),
                boost_repo: MockBoostRepository::new(),
                payout_repo: MockPayoutRepository::new(),
                payout_account_repo: MockPayoutAccountRepository::new(),
                resolver_subscriptions: MockSubscriptionRepository::new(),
                notification_repo,
                ops_alerts: MockOpsAlertClient::new(),
            }
        }

        fn build(self) -> PaymentEventUseCase {
            let notifier = Arc::new(NotificationEmitter::new(Arc::new(self.notification_repo)));
            let bookings = Arc::new(BookingUseCase::new(
                Arc::new(self.booking_repo),
                Arc::new(MockServiceRepository::new()),
                Arc::clone(&notifier),
            ));

            PaymentEventUseCase::new(PaymentEventDeps {
                stripe_client: Arc::new(self.stripe),
                event_repo: Arc::new(self.event_repo),
                bookings,
                subscription_repo: Arc::new(self.subscription_repo),
                boost_repo: Arc::new(self.boost_repo),
                payout_repo: Arc::new(self.payout_repo),
                payout_account_repo: Arc::new(self.payout_account_repo),
                commission_resolver: Arc::new(CommissionResolver::new(Arc::new(
                    self.resolver_subscriptions,
                ))),
                notifier,
                ops_alerts: Arc::new(self.ops_alerts),
            })
        }
    }

    fn event(id: &str, type_: &str, object: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "id": id,
            "type": type_,
            "created": 1_700_000_000,
            "data": { "object": object }
        }))
        .unwrap()
    }

    fn booking_checkout(booking_id: Uuid, buyer_id: Uuid, provider_id: Uuid) -> Vec<u8> {
        event(
            "evt_booking",
            "checkout.session.completed",
            json!({
                "id": "cs_booking",
                "mode": "payment",
                "payment_intent": "pi_booking",
                "amount_total": 15_000,
                "metadata": {
                    "type": "booking",
                    "userId": buyer_id.to_string(),
                    "bookingId": booking_id.to_string(),
                    "providerId": provider_id.to_string()
                }
            }),
        )
    }

    fn payout_from(insert: &crates::domain::entities::payouts::InsertPayoutEntity) -> PayoutEntity {
        PayoutEntity {
            id: Uuid::new_v4(),
            provider_id: insert.provider_id,
            booking_id: insert.booking_id,
            gross_minor: insert.gross_minor,
            commission_minor: insert.commission_minor,
            net_minor: insert.net_minor,
            commission_rate_bps: insert.commission_rate_bps,
            status: insert.status.clone(),
            scheduled_at: insert.scheduled_at,
            processed_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn bad_signature_touches_nothing() {
        let mut deps = Deps::new();
        deps.stripe = MockStripeGateway::new();
        deps.stripe
            .expect_verify_webhook_signature()
            .returning(|_, _| Err(anyhow::anyhow!("invalid webhook signature")));
        deps.event_repo = MockProcessedWebhookEventRepository::new();
        deps.event_repo.expect_claim().never();
        deps.booking_repo.expect_find_by_id().never();
        deps.payout_repo.expect_insert_if_absent().never();

        let payload = booking_checkout(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let result = deps.build().handle_stripe_webhook(&payload, "t=1,v1=00").await;

        let err = result.unwrap_err();
        assert!(matches!(err, PaymentEventError::InvalidSignature));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unparseable_payload_is_rejected() {
        let mut deps = Deps::new();
        deps.event_repo = MockProcessedWebhookEventRepository::new();
        deps.event_repo.expect_claim().never();

        let result = deps.build().handle_stripe_webhook(b"not json", "sig").await;

        assert!(matches!(result, Err(PaymentEventError::InvalidPayload(_))));
    }

    #[tokio::test]
    async fn booking_payment_schedules_one_payout_across_redelivery() {
        let pending = booking(BookingStatus::Pending, 15_000);
        let booking_id = pending.id;
        let buyer_id = pending.buyer_id;
        let provider_id = pending.provider_id;

        let mut deps = Deps::new();
        deps.booking_repo
            .expect_find_by_id()
            .with(eq(booking_id))
            .returning(move |_| Ok(Some(pending.clone())));
        deps.booking_repo
            .expect_confirm_with_payment()
            .with(eq(booking_id), eq("pi_booking".to_string()))
            .times(1)
            .returning(|_, _| Ok(true));
        deps.resolver_subscriptions
            .expect_find_by_user_id()
            .with(eq(provider_id))
            .returning(move |_| {
                Ok(Some(subscription(
                    provider_id,
                    PlanTier::Pro,
                    SubscriptionStatus::Active,
                )))
            });
        deps.payout_repo
            .expect_insert_if_absent()
            .withf(|insert| {
                insert.gross_minor == 15_000
                    && insert.commission_minor == 750
                    && insert.net_minor == 14_250
                    && insert.status == "pending"
                    && insert.scheduled_at > Utc::now() + Duration::hours(23)
            })
            .times(1)
            .returning(|insert| Ok(Some(payout_from(&insert))));

        let usecase = deps.build();
        let payload = booking_checkout(booking_id, buyer_id, provider_id);

        let first = usecase.handle_stripe_webhook(&payload, "sig").await.unwrap();
        let second = usecase.handle_stripe_webhook(&payload, "sig").await.unwrap();

        assert_eq!(first, WebhookOutcome::Processed);
        assert_eq!(second, WebhookOutcome::AlreadyProcessed);
    }

    #[tokio::test]
    async fn payment_after_cancellation_alerts_ops_and_skips_payout() {
        let cancelled = booking(BookingStatus::Cancelled, 15_000);
        let booking_id = cancelled.id;
        let buyer_id = cancelled.buyer_id;
        let provider_id = cancelled.provider_id;

        let mut deps = Deps::new();
        deps.booking_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(cancelled.clone())));
        deps.booking_repo.expect_confirm_with_payment().never();
        deps.payout_repo.expect_insert_if_absent().never();
        deps.ops_alerts
            .expect_send_refund_intent()
            .withf(move |alert| {
                alert.booking_id == booking_id
                    && alert.buyer_id == buyer_id
                    && alert.payment_ref == "pi_booking"
                    && alert.amount_minor == 15_000
            })
            .times(1)
            .returning(|_| Ok(()));
        deps.notification_repo = MockNotificationRepository::new();
        deps.notification_repo
            .expect_insert()
            .withf(move |n| n.user_id == buyer_id && n.kind == "refund_pending")
            .times(1)
            .returning(|_| Ok(Uuid::new_v4()));

        let outcome = deps
            .build()
            .handle_stripe_webhook(&booking_checkout(booking_id, buyer_id, provider_id), "sig")
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
    }

    #[tokio::test]
    async fn failed_processing_releases_claim_for_redelivery() {
        let pending = booking(BookingStatus::Pending, 15_000);
        let booking_id = pending.id;
        let buyer_id = pending.buyer_id;
        let provider_id = pending.provider_id;

        let mut deps = Deps::new();
        deps.event_repo = MockProcessedWebhookEventRepository::new();
        deps.event_repo.expect_claim().returning(|_, _, _| Ok(true));
        deps.event_repo.expect_mark_succeeded().never();
        deps.event_repo
            .expect_release()
            .with(eq("evt_booking".to_string()))
            .times(1)
            .returning(|_| Ok(()));
        deps.booking_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(pending.clone())));
        deps.booking_repo
            .expect_confirm_with_payment()
            .returning(|_, _| Ok(true));
        deps.resolver_subscriptions
            .expect_find_by_user_id()
            .returning(|_| Ok(None));
        deps.payout_repo
            .expect_insert_if_absent()
            .returning(|_| Err(anyhow::anyhow!("database unavailable")));

        let result = deps
            .build()
            .handle_stripe_webhook(&booking_checkout(booking_id, buyer_id, provider_id), "sig")
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn subscription_checkout_activates_plan_with_stripe_period() {
        let user_id = Uuid::new_v4();

        let mut deps = Deps::new();
        deps.stripe
            .expect_retrieve_subscription()
            .with(eq("sub_123".to_string()))
            .times(1)
            .returning(|_| {
                Ok(serde_json::from_value::<StripeSubscription>(json!({
                    "id": "sub_123",
                    "status": "active",
                    "current_period_start": 1_700_000_000,
                    "current_period_end": 1_702_592_000
                }))
                .unwrap())
            });
        deps.subscription_repo
            .expect_upsert_after_checkout()
            .withf(move |upsert| {
                upsert.user_id == user_id
                    && upsert.plan == "mid"
                    && upsert.status == "active"
                    && upsert.commission_rate_bps == 800
                    && upsert.stripe_subscription_id.as_deref() == Some("sub_123")
                    && upsert.stripe_customer_id.as_deref() == Some("cus_1")
                    && upsert.current_period_end.map(|t| t.timestamp()) == Some(1_702_592_000)
            })
            .times(1)
            .returning(|upsert| {
                let mut saved = subscription(upsert.user_id, PlanTier::Mid, SubscriptionStatus::Active);
                saved.stripe_subscription_id = upsert.stripe_subscription_id;
                Ok(saved)
            });

        let payload = event(
            "evt_sub",
            "checkout.session.completed",
            json!({
                "id": "cs_sub",
                "mode": "subscription",
                "subscription": "sub_123",
                "customer": "cus_1",
                "metadata": { "type": "subscription", "userId": user_id.to_string(), "plan": "mid" }
            }),
        );

        let usecase = deps.build();
        assert_eq!(
            usecase.handle_stripe_webhook(&payload, "sig").await.unwrap(),
            WebhookOutcome::Processed
        );
        assert_eq!(
            usecase.handle_stripe_webhook(&payload, "sig").await.unwrap(),
            WebhookOutcome::AlreadyProcessed
        );
    }

    #[tokio::test]
    async fn premium_boost_lasts_one_week() {
        let user_id = Uuid::new_v4();
        let before = Utc::now();

        let mut deps = Deps::new();
        deps.boost_repo
            .expect_insert_if_absent()
            .withf(move |insert| {
                let week = Duration::hours(168);
                insert.user_id == user_id
                    && insert.tier == "premium"
                    && insert.payment_ref == "cs_boost"
                    && insert.expires_at >= before + week
                    && insert.expires_at <= Utc::now() + week
            })
            .times(1)
            .returning(|insert| {
                Ok(Some(BoostEntity {
                    id: Uuid::new_v4(),
                    user_id: insert.user_id,
                    tier: insert.tier,
                    expires_at: insert.expires_at,
                    payment_ref: insert.payment_ref,
                    created_at: Utc::now(),
                }))
            });

        let payload = event(
            "evt_boost",
            "checkout.session.completed",
            json!({
                "id": "cs_boost",
                "mode": "payment",
                "payment_intent": "pi_boost",
                "metadata": { "type": "boost", "userId": user_id.to_string(), "boostType": "premium" }
            }),
        );

        let outcome = deps.build().handle_stripe_webhook(&payload, "sig").await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
    }

    #[tokio::test]
    async fn duplicate_boost_payment_does_not_notify_twice() {
        let mut deps = Deps::new();
        deps.boost_repo
            .expect_insert_if_absent()
            .returning(|_| Ok(None));
        deps.notification_repo = MockNotificationRepository::new();
        deps.notification_repo.expect_insert().never();

        let payload = event(
            "evt_boost_retry",
            "checkout.session.completed",
            json!({
                "id": "cs_boost",
                "metadata": { "type": "boost", "userId": Uuid::new_v4().to_string(), "boostType": "standard" }
            }),
        );

        let outcome = deps.build().handle_stripe_webhook(&payload, "sig").await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
    }

    #[tokio::test]
    async fn deleted_subscription_drops_to_free_rate() {
        let mut deps = Deps::new();
        deps.subscription_repo
            .expect_downgrade_to_free_by_stripe_subscription_id()
            .with(eq("sub_gone".to_string()), eq(1_000))
            .times(1)
            .returning(|_, _| Ok(true));

        let payload = event(
            "evt_deleted",
            "customer.subscription.deleted",
            json!({ "id": "sub_gone", "status": "canceled" }),
        );

        let outcome = deps.build().handle_stripe_webhook(&payload, "sig").await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
    }

    #[tokio::test]
    async fn subscription_update_maps_stripe_status() {
        let mut deps = Deps::new();
        deps.subscription_repo
            .expect_find_by_stripe_subscription_id()
            .returning(|_| {
                Ok(Some(subscription(
                    Uuid::new_v4(),
                    PlanTier::Pro,
                    SubscriptionStatus::Active,
                )))
            });
        deps.subscription_repo
            .expect_update_status_and_period_by_stripe_subscription_id()
            .withf(|id, status, _, end| {
                id == "sub_1" && *status == SubscriptionStatus::PastDue && end.is_some()
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let payload = event(
            "evt_updated",
            "customer.subscription.updated",
            json!({
                "id": "sub_1",
                "status": "past_due",
                "items": { "data": [{ "current_period_start": 1, "current_period_end": 2 }] }
            }),
        );

        let outcome = deps.build().handle_stripe_webhook(&payload, "sig").await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
    }

    #[tokio::test]
    async fn update_for_unknown_subscription_is_ignored() {
        let mut deps = Deps::new();
        deps.subscription_repo
            .expect_find_by_stripe_subscription_id()
            .returning(|_| Ok(None));
        deps.subscription_repo
            .expect_update_status_and_period_by_stripe_subscription_id()
            .never();

        let payload = event(
            "evt_unknown_sub",
            "customer.subscription.updated",
            json!({ "id": "sub_elsewhere", "status": "active" }),
        );

        let outcome = deps.build().handle_stripe_webhook(&payload, "sig").await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Ignored);
    }

    #[tokio::test]
    async fn account_update_mirrors_capabilities() {
        let mut deps = Deps::new();
        deps.payout_account_repo
            .expect_update_capabilities()
            .with(eq("acct_1".to_string()), eq(true), eq(true))
            .times(1)
            .returning(|_, _, _| Ok(true));

        let payload = event(
            "evt_account",
            "account.updated",
            json!({ "id": "acct_1", "charges_enabled": true, "payouts_enabled": true }),
        );

        let outcome = deps.build().handle_stripe_webhook(&payload, "sig").await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
    }

    #[tokio::test]
    async fn unhandled_event_types_are_acknowledged() {
        let touched = Arc::new(AtomicBool::new(false));
        let mut deps = Deps::new();
        let flag = Arc::clone(&touched);
        deps.event_repo = MockProcessedWebhookEventRepository::new();
        deps.event_repo.expect_claim().returning(|_, _, _| Ok(true));
        deps.event_repo.expect_mark_succeeded().returning(move |_| {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });

        let payload = event("evt_other", "invoice.created", json!({ "id": "in_1" }));
        let outcome = deps.build().handle_stripe_webhook(&payload, "sig").await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Ignored);
        assert!(touched.load(Ordering::SeqCst));
    }
}
