use std::{collections::HashMap, sync::Arc};

use crates::{
    domain::{
        repositories::{
            bookings::BookingRepository, payout_accounts::PayoutAccountRepository,
            subscriptions::SubscriptionRepository,
        },
        value_objects::{
            checkout::{CreateCheckoutRequest, metadata_keys},
            enums::{
                booking_statuses::BookingStatus, boost_tiers::BoostTier,
                checkout_kinds::CheckoutKind, plan_tiers::PlanTier, user_roles::UserRole,
            },
        },
    },
    payments::stripe_client::{CheckoutLineItem, CheckoutMode, CheckoutSessionRequest},
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    config::config_model::StripePrices,
    usecases::{commission_resolver::CommissionResolver, stripe_gateway::StripeGateway},
};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("unknown or unpurchasable plan: {0}")]
    InvalidPlan(String),
    #[error("invalid checkout request: {0}")]
    InvalidRequest(String),
    #[error("booking not found")]
    BookingNotFound,
    #[error("not allowed to start this checkout")]
    Unauthorized,
    #[error("booking is not awaiting payment")]
    BookingNotPayable,
    #[error("payment provider error")]
    PaymentProvider(#[source] anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CheckoutError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            CheckoutError::InvalidPlan(_) | CheckoutError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            CheckoutError::BookingNotFound => StatusCode::NOT_FOUND,
            CheckoutError::Unauthorized => StatusCode::FORBIDDEN,
            CheckoutError::BookingNotPayable => StatusCode::CONFLICT,
            CheckoutError::PaymentProvider(_) => StatusCode::BAD_GATEWAY,
            CheckoutError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, CheckoutError>;

/// Who is paying.
#[derive(Debug, Clone)]
pub struct CheckoutActor {
    pub user_id: Uuid,
    pub role: UserRole,
    pub email: Option<String>,
}

pub struct CheckoutUseCase {
    booking_repo: Arc<dyn BookingRepository + Send + Sync>,
    subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync>,
    payout_account_repo: Arc<dyn PayoutAccountRepository + Send + Sync>,
    commission_resolver: Arc<CommissionResolver>,
    stripe_client: Arc<dyn StripeGateway>,
    prices: StripePrices,
}

impl CheckoutUseCase {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository + Send + Sync>,
        subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync>,
        payout_account_repo: Arc<dyn PayoutAccountRepository + Send + Sync>,
        commission_resolver: Arc<CommissionResolver>,
        stripe_client: Arc<dyn StripeGateway>,
        prices: StripePrices,
    ) -> Self {
        Self {
            booking_repo,
            subscription_repo,
            payout_account_repo,
            commission_resolver,
            stripe_client,
            prices,
        }
    }

    /// Builds a Stripe Checkout Session for the request and returns its URL.
    pub async fn create_checkout_session(
        &self,
        actor: CheckoutActor,
        request: CreateCheckoutRequest,
    ) -> UseCaseResult<String> {
        let user_id = actor.user_id;
        info!(%user_id, kind = %request.kind, "checkout: creating session");

        let session_request = match request.kind {
            CheckoutKind::Subscription => self.subscription_request(&actor, request.plan)?,
            CheckoutKind::Boost => self.boost_request(&actor, request.plan)?,
            CheckoutKind::Booking => self.booking_request(&actor, request.booking_id).await?,
        };

        let customer_id = self.ensure_customer(&actor).await?;
        let session_request = CheckoutSessionRequest {
            customer_id: Some(customer_id),
            ..session_request
        };

        let url = self
            .stripe_client
            .create_checkout_session(session_request)
            .await
            .map_err(|err| {
                error!(%user_id, kind = %request.kind, error = %err, "checkout: stripe session creation failed");
                CheckoutError::PaymentProvider(err)
            })?;

        info!(%user_id, kind = %request.kind, "checkout: session created");
        Ok(url)
    }

    fn subscription_request(
        &self,
        actor: &CheckoutActor,
        plan: Option<String>,
    ) -> UseCaseResult<CheckoutSessionRequest> {
        let raw_plan = plan.unwrap_or_default();
        let tier = PlanTier::from_str(&raw_plan)
            .filter(|tier| *tier != PlanTier::Free)
            .ok_or_else(|| {
                warn!(user_id = %actor.user_id, plan = %raw_plan, "checkout: invalid subscription plan");
                CheckoutError::InvalidPlan(raw_plan.clone())
            })?;

        let price_id = self
            .prices
            .subscription_price(actor.role, tier)
            .ok_or_else(|| {
                warn!(role = %actor.role, plan = %tier, "checkout: no price configured");
                CheckoutError::InvalidPlan(raw_plan.clone())
            })?
            .to_string();

        let metadata = HashMap::from([
            (metadata_keys::USER_ID.to_string(), actor.user_id.to_string()),
            (
                metadata_keys::TYPE.to_string(),
                CheckoutKind::Subscription.as_str().to_string(),
            ),
            (metadata_keys::PLAN.to_string(), tier.as_str().to_string()),
        ]);

        Ok(CheckoutSessionRequest {
            mode: CheckoutMode::Subscription,
            line_item: CheckoutLineItem::Price(price_id),
            customer_id: None,
            metadata,
            application_fee_minor: None,
            transfer_destination: None,
        })
    }

    fn boost_request(
        &self,
        actor: &CheckoutActor,
        plan: Option<String>,
    ) -> UseCaseResult<CheckoutSessionRequest> {
        if actor.role != UserRole::Provider {
            warn!(user_id = %actor.user_id, role = %actor.role, "checkout: boost requested by non-provider");
            return Err(CheckoutError::Unauthorized);
        }

        let raw_tier = plan.unwrap_or_default();
        let tier = BoostTier::from_str(&raw_tier).ok_or_else(|| {
            warn!(user_id = %actor.user_id, tier = %raw_tier, "checkout: invalid boost tier");
            CheckoutError::InvalidPlan(raw_tier.clone())
        })?;

        let price_id = self
            .prices
            .boost_price(tier)
            .ok_or_else(|| CheckoutError::InvalidPlan(raw_tier.clone()))?
            .to_string();

        let metadata = HashMap::from([
            (metadata_keys::USER_ID.to_string(), actor.user_id.to_string()),
            (
                metadata_keys::TYPE.to_string(),
                CheckoutKind::Boost.as_str().to_string(),
            ),
            (metadata_keys::BOOST_TYPE.to_string(), tier.as_str().to_string()),
        ]);

        Ok(CheckoutSessionRequest {
            mode: CheckoutMode::Payment,
            line_item: CheckoutLineItem::Price(price_id),
            customer_id: None,
            metadata,
            application_fee_minor: None,
            transfer_destination: None,
        })
    }

    async fn booking_request(
        &self,
        actor: &CheckoutActor,
        booking_id: Option<Uuid>,
    ) -> UseCaseResult<CheckoutSessionRequest> {
        let booking_id = booking_id
            .ok_or_else(|| CheckoutError::InvalidRequest("bookingId is required".to_string()))?;

        let booking = self
            .booking_repo
            .find_by_id(booking_id)
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "checkout: failed to load booking");
                CheckoutError::Internal(err)
            })?
            .ok_or(CheckoutError::BookingNotFound)?;

        if booking.buyer_id != actor.user_id {
            warn!(%booking_id, user_id = %actor.user_id, "checkout: only the buyer may pay for a booking");
            return Err(CheckoutError::Unauthorized);
        }

        let payable = matches!(
            booking.status(),
            BookingStatus::Pending | BookingStatus::Confirmed
        ) && booking.payment_ref.is_none();
        if !payable {
            warn!(
                %booking_id,
                status = %booking.status(),
                already_paid = booking.payment_ref.is_some(),
                "checkout: booking is not payable"
            );
            return Err(CheckoutError::BookingNotPayable);
        }

        let provider_id = booking.provider_id;
        let rate = self
            .commission_resolver
            .rate_for_user(provider_id)
            .await
            .map_err(|err| {
                error!(%provider_id, db_error = ?err, "checkout: failed to resolve provider commission");
                CheckoutError::Internal(err)
            })?;
        let application_fee = rate.fee_for(booking.amount_minor);

        let payout_account = self
            .payout_account_repo
            .find_by_user_id(provider_id)
            .await
            .map_err(|err| {
                error!(%provider_id, db_error = ?err, "checkout: failed to load payout account");
                CheckoutError::Internal(err)
            })?
            .filter(|account| account.can_receive_transfers());

        let (application_fee_minor, transfer_destination) = match payout_account {
            Some(account) => (Some(application_fee), Some(account.stripe_account_id)),
            None => {
                info!(%provider_id, "checkout: provider cannot receive transfers, platform collects full amount");
                (None, None)
            }
        };

        info!(
            %booking_id,
            %provider_id,
            amount_minor = booking.amount_minor,
            commission_bps = rate.bps(),
            application_fee,
            destination_charge = transfer_destination.is_some(),
            "checkout: booking payment prepared"
        );

        let metadata = HashMap::from([
            (metadata_keys::USER_ID.to_string(), actor.user_id.to_string()),
            (
                metadata_keys::TYPE.to_string(),
                CheckoutKind::Booking.as_str().to_string(),
            ),
            (metadata_keys::BOOKING_ID.to_string(), booking_id.to_string()),
            (metadata_keys::PROVIDER_ID.to_string(), provider_id.to_string()),
        ]);

        Ok(CheckoutSessionRequest {
            mode: CheckoutMode::Payment,
            line_item: CheckoutLineItem::Inline {
                name: format!("Booking {}", booking_id),
                amount_minor: booking.amount_minor,
            },
            customer_id: None,
            metadata,
            application_fee_minor,
            transfer_destination,
        })
    }

    /// Reuses the stored Stripe customer or creates one on a lazily created FREE row.
    async fn ensure_customer(&self, actor: &CheckoutActor) -> UseCaseResult<String> {
        let user_id = actor.user_id;
        let existing = self
            .subscription_repo
            .find_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "checkout: failed to load subscription");
                CheckoutError::Internal(err)
            })?
            .and_then(|subscription| subscription.stripe_customer_id);

        if let Some(customer_id) = existing {
            return Ok(customer_id);
        }

        let customer_id = self
            .stripe_client
            .create_customer(actor.email.clone(), user_id)
            .await
            .map_err(|err| {
                error!(%user_id, error = %err, "checkout: stripe customer creation failed");
                CheckoutError::PaymentProvider(err)
            })?;

        self.subscription_repo
            .upsert_customer_ref(user_id, customer_id.clone())
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "checkout: failed to store customer reference");
                CheckoutError::Internal(err)
            })?;

        info!(%user_id, "checkout: stripe customer created");
        Ok(customer_id)
    }
}
