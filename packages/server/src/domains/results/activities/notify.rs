//! Notification dispatch for approval transitions.
//!
//! Intents name a user; push tokens are resolved in one query at dispatch
//! time. Delivery is best-effort: every failure path here logs and returns,
//! the owning transition has already committed.

use sqlx::PgPool;
use std::collections::HashSet;
use tracing::warn;

use crate::common::UserId;
use crate::domains::notifications::{Notifier, PushMessage};
use crate::domains::users::User;

/// A notification owed to one user. Deduplicated per user at dispatch, so
/// a batch touching twenty of a student's records notifies them once.
#[derive(Debug, Clone)]
pub struct NotificationIntent {
    pub user_id: UserId,
    pub title: String,
    pub body: String,
}

/// Resolve push tokens and send everything in one batch call.
pub async fn dispatch(intents: Vec<NotificationIntent>, notifier: &dyn Notifier, pool: &PgPool) {
    if intents.is_empty() {
        return;
    }

    let mut seen = HashSet::new();
    let intents: Vec<NotificationIntent> = intents
        .into_iter()
        .filter(|intent| seen.insert(intent.user_id))
        .collect();

    let user_ids: Vec<UserId> = intents.iter().map(|i| i.user_id).collect();
    let tokens = match User::find_push_tokens(&user_ids, pool).await {
        Ok(tokens) => tokens,
        Err(e) => {
            warn!(error = %e, "failed to resolve push tokens, skipping notifications");
            return;
        }
    };

    let messages: Vec<PushMessage> = intents
        .iter()
        .filter_map(|intent| {
            let token = tokens
                .iter()
                .find(|(id, _)| *id == intent.user_id)
                .map(|(_, token)| token.clone())?;
            Some(PushMessage {
                push_token: token,
                title: intent.title.clone(),
                body: intent.body.clone(),
                data: serde_json::json!({ "user_id": intent.user_id }),
            })
        })
        .collect();

    if messages.is_empty() {
        return;
    }

    if let Err(e) = notifier.notify_batch(messages).await {
        warn!(error = %e, "push notification batch failed");
    }
}
