//! Event Routes
//!
//! Entry points the surrounding application uses to raise real-time events.
//! Each call is broadcast best-effort and answered with delivery counts.
//!
//! - POST /api/v1/tickets/:ticket_id/updates - Ticket changed
//! - POST /api/v1/alerts - Alert raised
//! - POST /api/v1/alerts/:alert_id/acknowledge - Alert acknowledged
//! - POST /api/v1/users/:user_id/notify - Notify a user

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{BroadcastResponse, ChannelName, TicketUpdateRequest, UserNotificationRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::websocket::{AlertSnapshot, BroadcastReport};

type Accepted = (StatusCode, Json<BroadcastResponse>);

fn accepted(kind: &str, report: BroadcastReport) -> Accepted {
    (
        StatusCode::ACCEPTED,
        Json(BroadcastResponse {
            kind: kind.to_string(),
            report,
        }),
    )
}

/// POST /api/v1/tickets/:ticket_id/updates
pub async fn ticket_update(
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<i64>,
    Json(req): Json<TicketUpdateRequest>,
) -> ApiResult<Accepted> {
    if req.update_type.trim().is_empty() {
        return Err(ApiError::Validation("updateType must not be empty".to_string()));
    }

    let report = state
        .tickets
        .broadcast_ticket_update(ticket_id, &req.update_type, req.data)
        .await;

    Ok(accepted("ticket_update", report))
}

/// POST /api/v1/alerts
pub async fn new_alert(
    State(state): State<Arc<AppState>>,
    Json(alert): Json<AlertSnapshot>,
) -> ApiResult<Accepted> {
    if alert.title.trim().is_empty() {
        return Err(ApiError::Validation("title must not be empty".to_string()));
    }

    let report = state.alerts.broadcast_new_alert(alert).await;
    Ok(accepted("new_alert", report))
}

/// POST /api/v1/alerts/:alert_id/acknowledge
pub async fn acknowledge_alert(
    State(state): State<Arc<AppState>>,
    Path(alert_id): Path<i64>,
) -> ApiResult<Accepted> {
    let report = state.alerts.broadcast_alert_acknowledged(alert_id).await;
    Ok(accepted("alert_acknowledged", report))
}

/// POST /api/v1/users/:user_id/notify
///
/// Delivered to every connection on the chosen channel; connections are not
/// filtered by the user they subscribed with.
pub async fn notify_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(req): Json<UserNotificationRequest>,
) -> ApiResult<Accepted> {
    let report = match req.channel {
        ChannelName::Tickets => state.tickets.send_to_user(&user_id, req.data).await,
        ChannelName::Alerts => state.alerts.send_to_user(&user_id, req.data).await,
    };

    Ok(accepted("user_notification", report))
}
