use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use uuid::Uuid;

/// How long a typing indicator survives without a keep-alive.
pub const TYPING_TIMEOUT: Duration = Duration::from_secs(2);

struct Entry {
    generation: u64,
    other: Uuid,
}

/// Dead-man's-switch state for typing indicators.
///
/// Every keystroke the typist sends refreshes their entry and arms a timer;
/// the expiry callback fires only if no further refresh arrived within
/// [`TYPING_TIMEOUT`]. There is no explicit stop signal from the client.
#[derive(Clone)]
pub struct TypingTracker {
    states: Arc<Mutex<HashMap<(Uuid, Uuid), Entry>>>,
}

impl TypingTracker {
    pub fn new() -> Self {
        Self {
            states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Arm or extend the switch for (conversation, typist). `on_expire` runs
    /// only if this refresh is still the latest when the timeout elapses.
    pub fn refresh<F, Fut>(&self, conversation_id: Uuid, user_id: Uuid, other: Uuid, on_expire: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let key = (conversation_id, user_id);
        let generation = {
            let mut states = self.states.lock().expect("typing lock poisoned");
            let entry = states.entry(key).or_insert(Entry {
                generation: 0,
                other,
            });
            entry.generation = entry.generation.wrapping_add(1);
            entry.other = other;
            entry.generation
        };

        let states = self.states.clone();
        tokio::spawn(async move {
            tokio::time::sleep(TYPING_TIMEOUT).await;

            let expired = {
                let mut states = states.lock().expect("typing lock poisoned");
                match states.get(&key) {
                    Some(entry) if entry.generation == generation => {
                        states.remove(&key);
                        true
                    }
                    _ => false,
                }
            };

            if expired {
                on_expire().await;
            }
        });
    }

    /// Drop every live switch owned by `user_id` (disconnect). Returns the
    /// (conversation, other participant) pairs so the caller can emit stops;
    /// the armed timers find their entries gone and stay silent.
    pub fn clear_user(&self, user_id: Uuid) -> Vec<(Uuid, Uuid)> {
        let mut states = self.states.lock().expect("typing lock poisoned");
        let keys: Vec<(Uuid, Uuid)> = states
            .keys()
            .filter(|(_, typist)| *typist == user_id)
            .copied()
            .collect();

        keys.into_iter()
            .filter_map(|key| states.remove(&key).map(|entry| (key.0, entry.other)))
            .collect()
    }
}

impl Default for TypingTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn ids() -> (Uuid, Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
    }

    #[tokio::test(start_paused = true)]
    async fn expires_after_the_timeout() {
        let tracker = TypingTracker::new();
        let (conv, typist, other) = ids();
        let (tx, mut rx) = mpsc::unbounded_channel();

        tracker.refresh(conv, typist, other, move || async move {
            tx.send(()).ok();
        });

        tokio::time::sleep(TYPING_TIMEOUT + Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn keep_alive_postpones_expiry() {
        let tracker = TypingTracker::new();
        let (conv, typist, other) = ids();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let tx1 = tx.clone();
        tracker.refresh(conv, typist, other, move || async move {
            tx1.send(1).ok();
        });

        // Refresh just before the deadline: the first timer must stay silent.
        tokio::time::sleep(Duration::from_millis(1900)).await;
        let tx2 = tx.clone();
        tracker.refresh(conv, typist, other, move || async move {
            tx2.send(2).ok();
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_err());

        // No further keep-alive: only the second timer fires.
        tokio::time::sleep(TYPING_TIMEOUT).await;
        assert_eq!(rx.try_recv().ok(), Some(2));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_user_silences_armed_timers() {
        let tracker = TypingTracker::new();
        let (conv, typist, other) = ids();
        let (tx, mut rx) = mpsc::unbounded_channel();

        tracker.refresh(conv, typist, other, move || async move {
            tx.send(()).ok();
        });

        let cleared = tracker.clear_user(typist);
        assert_eq!(cleared, vec![(conv, other)]);

        tokio::time::sleep(TYPING_TIMEOUT + Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }
}
