use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use filmcrew_db::Database;
use filmcrew_types::events::GatewayEvent;

use crate::dispatcher::Dispatcher;

/// Background task that recomputes the unread total for every online user
/// and pushes it down their gateway connection.
///
/// The push path already sends `UnreadCount` on every affecting mutation;
/// this loop is the periodic reconciliation backstop that keeps badges
/// honest if a push was missed (at-least-once, eventually consistent).
pub async fn run_unread_reconciliation(
    db: Arc<Database>,
    dispatcher: Dispatcher,
    interval_secs: u64,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        for user_id in dispatcher.online_user_ids().await {
            let db = db.clone();
            let uid = user_id.to_string();

            let total = match tokio::task::spawn_blocking(move || db.unread_count_for_user(&uid))
                .await
            {
                Ok(Ok(total)) => total,
                Ok(Err(e)) => {
                    warn!("Unread reconciliation query failed for {}: {}", user_id, e);
                    continue;
                }
                Err(e) => {
                    warn!("spawn_blocking join error: {}", e);
                    continue;
                }
            };

            dispatcher
                .send_to_user(user_id, GatewayEvent::UnreadCount { total })
                .await;
        }
    }
}
