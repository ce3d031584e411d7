//! Delayed, cancellable reply jobs.
//!
//! Every candidate reply runs as its own tokio task that first sleeps a
//! random delay. Until the delay elapses the job can be cancelled by ticket
//! id; once it starts running it is no longer pending and runs to completion.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::Rng;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use agentverse_types::agent::AgentId;
use agentverse_types::config::ReplyConfig;
use agentverse_types::error::RepositoryError;
use agentverse_types::reply::{ReplyEvent, TriggerReason};

use crate::event::ReplyEventBus;

/// A reply job still waiting for its delay to elapse.
#[derive(Debug, Clone, Serialize)]
pub struct PendingReply {
    pub ticket_id: Uuid,
    pub event_id: Uuid,
    pub agent_id: AgentId,
    pub reason: TriggerReason,
    pub due_at: DateTime<Utc>,
}

struct PendingEntry {
    info: PendingReply,
    token: CancellationToken,
}

/// Handle to one scheduled reply job.
#[derive(Debug)]
pub struct ScheduledReply {
    pub ticket_id: Uuid,
    pub agent_id: AgentId,
    pub delay: Duration,
    handle: JoinHandle<()>,
}

impl ScheduledReply {
    /// Wait for the job task to finish (emitted, failed, or cancelled).
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            tracing::error!(ticket_id = %self.ticket_id, error = %e, "reply task panicked");
        }
    }
}

/// Queue of delayed reply jobs with cancellation and lifecycle events.
#[derive(Clone)]
pub struct ReplyScheduler {
    min_delay: Duration,
    max_delay: Duration,
    pending: Arc<DashMap<Uuid, PendingEntry>>,
    bus: ReplyEventBus,
}

impl ReplyScheduler {
    /// Scheduler with delays drawn uniformly from `[min_delay, max_delay]`.
    pub fn new(min_delay: Duration, max_delay: Duration, bus: ReplyEventBus) -> Self {
        let (min_delay, max_delay) = if min_delay <= max_delay {
            (min_delay, max_delay)
        } else {
            (max_delay, min_delay)
        };
        Self {
            min_delay,
            max_delay,
            pending: Arc::new(DashMap::new()),
            bus,
        }
    }

    pub fn from_config(config: &ReplyConfig, bus: ReplyEventBus) -> Self {
        Self::new(
            Duration::from_millis(config.min_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            bus,
        )
    }

    pub fn bus(&self) -> &ReplyEventBus {
        &self.bus
    }

    fn random_delay(&self) -> Duration {
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(min..=max))
    }

    /// Schedule `job` to run after a random delay.
    ///
    /// The job resolves to the id of the record it emitted. Its outcome is
    /// logged and published on the bus; it never affects other jobs.
    pub fn schedule<F, Fut>(
        &self,
        event_id: Uuid,
        agent_id: AgentId,
        reason: TriggerReason,
        job: F,
    ) -> ScheduledReply
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Uuid, RepositoryError>> + Send + 'static,
    {
        let ticket_id = Uuid::now_v7();
        let delay = self.random_delay();
        let token = CancellationToken::new();
        let due_at = Utc::now()
            + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());

        self.pending.insert(
            ticket_id,
            PendingEntry {
                info: PendingReply {
                    ticket_id,
                    event_id,
                    agent_id,
                    reason,
                    due_at,
                },
                token: token.clone(),
            },
        );
        self.bus.publish(ReplyEvent::Scheduled {
            ticket_id,
            event_id,
            agent_id,
            reason,
            delay_ms: delay.as_millis() as u64,
        });
        tracing::debug!(%ticket_id, %agent_id, %reason, delay_ms = delay.as_millis() as u64, "reply scheduled");

        let pending = Arc::clone(&self.pending);
        let bus = self.bus.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    bus.publish(ReplyEvent::Cancelled { ticket_id, agent_id });
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            // A concurrent cancel may have claimed the entry first.
            if pending.remove(&ticket_id).is_none() {
                bus.publish(ReplyEvent::Cancelled { ticket_id, agent_id });
                return;
            }

            match job().await {
                Ok(record_id) => {
                    tracing::info!(%ticket_id, %agent_id, %record_id, "auto-reply emitted");
                    bus.publish(ReplyEvent::Emitted {
                        ticket_id,
                        agent_id,
                        record_id,
                    });
                }
                Err(e) => {
                    tracing::warn!(%ticket_id, %agent_id, error = %e, "auto-reply failed");
                    bus.publish(ReplyEvent::Failed {
                        ticket_id,
                        agent_id,
                        error: e.to_string(),
                    });
                }
            }
        });

        ScheduledReply {
            ticket_id,
            agent_id,
            delay,
            handle,
        }
    }

    /// Cancel a job still waiting for its delay. Returns false when the
    /// ticket is unknown or the job already started.
    pub fn cancel(&self, ticket_id: &Uuid) -> bool {
        match self.pending.remove(ticket_id) {
            Some((_, entry)) => {
                entry.token.cancel();
                tracing::debug!(%ticket_id, "reply cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel every waiting job. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let ids: Vec<Uuid> = self.pending.iter().map(|e| *e.key()).collect();
        ids.iter().filter(|id| self.cancel(id)).count()
    }

    /// Number of jobs still waiting for their delay.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Snapshot of waiting jobs, soonest first.
    pub fn pending_replies(&self) -> Vec<PendingReply> {
        let mut replies: Vec<PendingReply> =
            self.pending.iter().map(|e| e.value().info.clone()).collect();
        replies.sort_by_key(|r| r.due_at);
        replies
    }
}

impl std::fmt::Debug for ReplyScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyScheduler")
            .field("min_delay", &self.min_delay)
            .field("max_delay", &self.max_delay)
            .field("pending", &self.pending.len())
            .finish()
    }
}
