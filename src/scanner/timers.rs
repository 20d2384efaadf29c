// SPDX-License-Identifier: GPL-3.0-only

//! Deferred callbacks requested by the controller
//!
//! The controller never sleeps. It returns [`TimerRequest`]s and the host
//! feeds each one back once its delay has passed: the GUI through
//! `Task::perform`, other hosts through [`schedule`].

use super::animation::AnimationKind;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

/// A callback the controller wants after a delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerRequest {
    /// Complete the current step of an animation chain
    AnimationStep { kind: AnimationKind, after: Duration },
    /// Revert the not-found cycle `cycle` back to scanning
    NotFoundExpiry { cycle: u64, after: Duration },
}

impl TimerRequest {
    /// Delay before the request is due
    pub fn delay(&self) -> Duration {
        match self {
            TimerRequest::AnimationStep { after, .. } => *after,
            TimerRequest::NotFoundExpiry { after, .. } => *after,
        }
    }
}

/// Deliver `requests` to `tx` once each one is due
///
/// Must be called from within a tokio runtime. Requests whose receiver has
/// gone away are dropped silently.
pub fn schedule(requests: impl IntoIterator<Item = TimerRequest>, tx: &UnboundedSender<TimerRequest>) {
    for request in requests {
        let tx = tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(request.delay()).await;
            trace!(?request, "Timer due");
            let _ = tx.send(request);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schedule_delivers_in_due_order() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        schedule(
            [
                TimerRequest::NotFoundExpiry {
                    cycle: 1,
                    after: Duration::from_millis(60),
                },
                TimerRequest::AnimationStep {
                    kind: AnimationKind::BorderRotation,
                    after: Duration::from_millis(10),
                },
            ],
            &tx,
        );

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, TimerRequest::AnimationStep { .. }));
        let second = rx.recv().await.unwrap();
        assert_eq!(second.delay(), Duration::from_millis(60));
    }
}
