use std::sync::Arc;

use chrono::Utc;
use crates::domain::{
    repositories::{boosts::BoostRepository, payouts::PayoutRepository},
    value_objects::{boosts::ActiveBoostDto, enums::user_roles::UserRole, payouts::PayoutDto},
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PaymentViewError {
    #[error("only providers receive payouts")]
    Unauthorized,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PaymentViewError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PaymentViewError::Unauthorized => StatusCode::FORBIDDEN,
            PaymentViewError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, PaymentViewError>;

pub struct PaymentViewUseCase {
    payout_repo: Arc<dyn PayoutRepository + Send + Sync>,
    boost_repo: Arc<dyn BoostRepository + Send + Sync>,
}

impl PaymentViewUseCase {
    pub fn new(
        payout_repo: Arc<dyn PayoutRepository + Send + Sync>,
        boost_repo: Arc<dyn BoostRepository + Send + Sync>,
    ) -> Self {
        Self {
            payout_repo,
            boost_repo,
        }
    }

    pub async fn list_payouts(&self, user_id: Uuid, role: UserRole) -> UseCaseResult<Vec<PayoutDto>> {
        if role != UserRole::Provider {
            warn!(%user_id, role = %role, "payment_views: payouts requested by non-provider");
            return Err(PaymentViewError::Unauthorized);
        }

        let payouts = self
            .payout_repo
            .list_by_provider(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "payment_views: failed to list payouts");
                PaymentViewError::Internal(err)
            })?;

        info!(%user_id, count = payouts.len(), "payment_views: payouts listed");
        Ok(payouts.into_iter().map(PayoutDto::from).collect())
    }

    pub async fn active_boost(&self, user_id: Uuid) -> UseCaseResult<Option<ActiveBoostDto>> {
        let now = Utc::now();
        let boost = self
            .boost_repo
            .find_active_for_user(user_id, now)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "payment_views: failed to load boost");
                PaymentViewError::Internal(err)
            })?;

        Ok(boost
            .filter(|boost| boost.is_active_at(now))
            .map(ActiveBoostDto::from))
    }
}
