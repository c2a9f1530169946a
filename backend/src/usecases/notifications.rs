use crates::domain::{
    entities::notifications::InsertNotificationEntity,
    repositories::notifications::NotificationRepository,
    value_objects::notifications::NotificationKind,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Persists user-visible notifications. Fire and forget: failures are logged, never returned.
pub struct NotificationEmitter {
    notification_repo: Arc<dyn NotificationRepository + Send + Sync>,
}

impl NotificationEmitter {
    pub fn new(notification_repo: Arc<dyn NotificationRepository + Send + Sync>) -> Self {
        Self { notification_repo }
    }

    pub async fn emit(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        title: &str,
        message: String,
        data: Value,
    ) {
        let insert = InsertNotificationEntity {
            user_id,
            kind: kind.as_str().to_string(),
            title: title.to_string(),
            message,
            data,
        };

        match self.notification_repo.insert(insert).await {
            Ok(notification_id) => {
                debug!(%user_id, %notification_id, kind = %kind, "notifications: emitted");
            }
            Err(err) => {
                warn!(
                    %user_id,
                    kind = %kind,
                    db_error = ?err,
                    "notifications: failed to persist notification"
                );
            }
        }
    }
}
