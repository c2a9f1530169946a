use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use crates::{
    domain::{
        repositories::ops_alerts::OpsAlertClient,
        value_objects::checkout::{CreateCheckoutRequest, CreateCheckoutResponse},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            bookings::BookingPostgres, boosts::BoostPostgres,
            notifications::NotificationPostgres, payout_accounts::PayoutAccountPostgres,
            payouts::PayoutPostgres, processed_webhook_events::ProcessedWebhookEventPostgres,
            services::ServicePostgres, subscriptions::SubscriptionPostgres,
        },
    },
    payments::stripe_client::StripeClient,
};
use serde_json::json;
use tracing::{error, info};

use crate::{
    auth::AuthUser,
    axum_http::error_responses::error_response,
    config::config_model::StripePrices,
    usecases::{
        bookings::BookingUseCase,
        checkout::{CheckoutActor, CheckoutUseCase},
        commission_resolver::CommissionResolver,
        notifications::NotificationEmitter,
        payment_events::{PaymentEventDeps, PaymentEventUseCase},
        payment_views::PaymentViewUseCase,
    },
};

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    stripe_client: Arc<StripeClient>,
    ops_alerts: Arc<dyn OpsAlertClient + Send + Sync>,
    prices: StripePrices,
) -> Router {
    let booking_repo = Arc::new(BookingPostgres::new(Arc::clone(&db_pool)));
    let subscription_repo = Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool)));
    let boost_repo = Arc::new(BoostPostgres::new(Arc::clone(&db_pool)));
    let payout_repo = Arc::new(PayoutPostgres::new(Arc::clone(&db_pool)));
    let payout_account_repo = Arc::new(PayoutAccountPostgres::new(Arc::clone(&db_pool)));

    let notifier = Arc::new(NotificationEmitter::new(Arc::new(NotificationPostgres::new(
        Arc::clone(&db_pool),
    ))));
    let commission_resolver = Arc::new(CommissionResolver::new(subscription_repo.clone()));
    let bookings = Arc::new(BookingUseCase::new(
        booking_repo.clone(),
        Arc::new(ServicePostgres::new(Arc::clone(&db_pool))),
        Arc::clone(&notifier),
    ));

    let payment_events_usecase = PaymentEventUseCase::new(PaymentEventDeps {
        stripe_client: stripe_client.clone(),
        event_repo: Arc::new(ProcessedWebhookEventPostgres::new(Arc::clone(&db_pool))),
        bookings,
        subscription_repo: subscription_repo.clone(),
        boost_repo: boost_repo.clone(),
        payout_repo: payout_repo.clone(),
        payout_account_repo: payout_account_repo.clone(),
        commission_resolver: Arc::clone(&commission_resolver),
        notifier,
        ops_alerts,
    });

    let checkout_usecase = CheckoutUseCase::new(
        booking_repo,
        subscription_repo,
        payout_account_repo,
        commission_resolver,
        stripe_client,
        prices,
    );

    let payment_view_usecase = PaymentViewUseCase::new(payout_repo, boost_repo);

    let webhooks = Router::new()
        .route("/webhooks", post(stripe_webhook))
        .with_state(Arc::new(payment_events_usecase));
    let checkout = Router::new()
        .route("/checkout", post(create_checkout))
        .with_state(Arc::new(checkout_usecase));
    let views = Router::new()
        .route("/payouts", get(list_payouts))
        .route("/boost", get(active_boost))
        .with_state(Arc::new(payment_view_usecase));

    webhooks.merge(checkout).merge(views)
}

pub async fn stripe_webhook(
    State(payment_events_usecase): State<Arc<PaymentEventUseCase>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    match payment_events_usecase
        .handle_stripe_webhook(&body, signature)
        .await
    {
        Ok(outcome) => {
            info!(outcome = ?outcome, "payments router: stripe webhook acknowledged");
            (StatusCode::OK, Json(json!({ "received": true }))).into_response()
        }
        Err(err) => {
            let status = err.status_code();
            error!(status = status.as_u16(), error = %err, "payments router: stripe webhook failed");
            error_response(status, &err)
        }
    }
}

pub async fn create_checkout(
    State(checkout_usecase): State<Arc<CheckoutUseCase>>,
    auth: AuthUser,
    Json(request): Json<CreateCheckoutRequest>,
) -> Response {
    let actor = CheckoutActor {
        user_id: auth.user_id,
        role: auth.role,
        email: auth.email,
    };

    match checkout_usecase.create_checkout_session(actor, request).await {
        Ok(url) => (StatusCode::OK, Json(CreateCheckoutResponse { url })).into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}

pub async fn list_payouts(
    State(payment_view_usecase): State<Arc<PaymentViewUseCase>>,
    auth: AuthUser,
) -> Response {
    match payment_view_usecase
        .list_payouts(auth.user_id, auth.role)
        .await
    {
        Ok(payouts) => (StatusCode::OK, Json(payouts)).into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}

pub async fn active_boost(
    State(payment_view_usecase): State<Arc<PaymentViewUseCase>>,
    auth: AuthUser,
) -> Response {
    match payment_view_usecase.active_boost(auth.user_id).await {
        Ok(boost) => (StatusCode::OK, Json(boost)).into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}
