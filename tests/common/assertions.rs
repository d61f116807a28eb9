//! Event collection helpers for integration tests

use std::time::Duration;

use dhtx::{CrawlEvent, RemovalReason};
use tokio::sync::broadcast;

/// Collect events until `done` returns true or `timeout` elapses
pub async fn collect_events_until<F>(
    events: &mut broadcast::Receiver<CrawlEvent>,
    timeout: Duration,
    mut done: F,
) -> Vec<CrawlEvent>
where
    F: FnMut(&[CrawlEvent]) -> bool,
{
    let mut collected = Vec::new();
    let _ = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(event) => {
                    collected.push(event);
                    if done(&collected) {
                        return;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    })
    .await;
    collected
}

pub fn count_completed(events: &[CrawlEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, CrawlEvent::Completed { .. }))
        .count()
}

pub fn count_timeouts(events: &[CrawlEvent]) -> usize {
    events
        .iter()
        .filter(|event| {
            matches!(
                event,
                CrawlEvent::Removed {
                    reason: RemovalReason::Timeout { .. },
                    ..
                }
            )
        })
        .count()
}

pub fn count_errors(events: &[CrawlEvent]) -> usize {
    events
        .iter()
        .filter(|event| {
            matches!(
                event,
                CrawlEvent::Removed {
                    reason: RemovalReason::Error { .. },
                    ..
                }
            )
        })
        .count()
}
