use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use crates::{
    domain::value_objects::{
        bookings::{BookingListRole, CreateBookingModel, ListBookingsQuery, UpdateBookingStatusModel},
        enums::user_roles::UserRole,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            bookings::BookingPostgres, notifications::NotificationPostgres,
            services::ServicePostgres,
        },
    },
};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::error_response,
    usecases::{
        bookings::{BookingError, BookingUseCase},
        notifications::NotificationEmitter,
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let notifier = Arc::new(NotificationEmitter::new(Arc::new(NotificationPostgres::new(
        Arc::clone(&db_pool),
    ))));
    let bookings_usecase = BookingUseCase::new(
        Arc::new(BookingPostgres::new(Arc::clone(&db_pool))),
        Arc::new(ServicePostgres::new(Arc::clone(&db_pool))),
        notifier,
    );

    Router::new()
        .route("/", get(list_bookings).post(create_booking))
        .route("/:id", get(get_booking).put(update_booking_status))
        .with_state(Arc::new(bookings_usecase))
}

pub async fn create_booking(
    State(bookings_usecase): State<Arc<BookingUseCase>>,
    auth: AuthUser,
    Json(create_booking_model): Json<CreateBookingModel>,
) -> Response {
    match bookings_usecase
        .create(auth.user_id, create_booking_model)
        .await
    {
        Ok(booking) => (StatusCode::CREATED, Json(booking)).into_response(),
        Err(err) => map_error(err),
    }
}

pub async fn list_bookings(
    State(bookings_usecase): State<Arc<BookingUseCase>>,
    auth: AuthUser,
    Query(query): Query<ListBookingsQuery>,
) -> Response {
    let role = query.role.unwrap_or(match auth.role {
        UserRole::Provider => BookingListRole::Provider,
        UserRole::Artist => BookingListRole::Buyer,
    });

    match bookings_usecase.list(auth.user_id, role).await {
        Ok(bookings) => (StatusCode::OK, Json(bookings)).into_response(),
        Err(err) => map_error(err),
    }
}

pub async fn get_booking(
    State(bookings_usecase): State<Arc<BookingUseCase>>,
    auth: AuthUser,
    Path(booking_id): Path<Uuid>,
) -> Response {
    match bookings_usecase.get(booking_id, auth.user_id).await {
        Ok(booking) => (StatusCode::OK, Json(booking)).into_response(),
        Err(err) => map_error(err),
    }
}

pub async fn update_booking_status(
    State(bookings_usecase): State<Arc<BookingUseCase>>,
    auth: AuthUser,
    Path(booking_id): Path<Uuid>,
    Json(update_model): Json<UpdateBookingStatusModel>,
) -> Response {
    info!(
        %booking_id,
        user_id = %auth.user_id,
        target = %update_model.status,
        "bookings router: status update requested"
    );
    match bookings_usecase
        .transition(booking_id, auth.user_id, update_model.status)
        .await
    {
        Ok(booking) => (StatusCode::OK, Json(booking)).into_response(),
        Err(err) => map_error(err),
    }
}

fn map_error(err: BookingError) -> Response {
    error_response(err.status_code(), &err)
}
