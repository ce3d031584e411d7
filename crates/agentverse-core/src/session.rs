//! Auth session keep-alive.
//!
//! `SessionKeeper` refreshes the hosted-backend session shortly before it
//! expires. It runs as a background task woken by external signals (the
//! host resuming, connectivity returning) rather than by the reply pipeline.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use agentverse_types::config::SessionConfig;
use agentverse_types::error::SessionError;
use agentverse_types::session::SessionSignal;

use crate::repository::SessionProvider;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(500);

/// Result of a near-expiry check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The session is not close to expiring.
    Fresh,
    /// The session was refreshed and now expires at the given time.
    Refreshed { expires_at: DateTime<Utc> },
}

/// Refreshes the held session when it is close to expiry.
pub struct SessionKeeper<P> {
    provider: Arc<P>,
    threshold: chrono::Duration,
    max_attempts: u32,
    base_backoff: Duration,
}

impl<P: SessionProvider> SessionKeeper<P> {
    pub fn new(provider: Arc<P>, threshold: chrono::Duration) -> Self {
        Self {
            provider,
            threshold,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff: DEFAULT_BASE_BACKOFF,
        }
    }

    pub fn from_config(provider: Arc<P>, config: &SessionConfig) -> Self {
        Self::new(
            provider,
            chrono::Duration::seconds(config.refresh_threshold_secs),
        )
    }

    pub fn with_backoff(mut self, max_attempts: u32, base_backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.base_backoff = base_backoff;
        self
    }

    /// Refresh the session if it expires within `threshold`.
    ///
    /// Transient failures are retried with exponential backoff up to the
    /// configured attempt count; rejected refreshes fail immediately.
    #[tracing::instrument(name = "refresh_if_near_expiry", skip(self))]
    pub async fn refresh_if_near_expiry(
        &self,
        threshold: chrono::Duration,
    ) -> Result<RefreshOutcome, SessionError> {
        let session = self
            .provider
            .current_session()
            .await?
            .ok_or(SessionError::NoSession)?;

        if !session.expires_within(threshold, Utc::now()) {
            return Ok(RefreshOutcome::Fresh);
        }

        let mut attempt = 1;
        loop {
            match self.provider.refresh_session().await {
                Ok(refreshed) => {
                    tracing::info!(expires_at = %refreshed.expires_at, "session refreshed");
                    return Ok(RefreshOutcome::Refreshed {
                        expires_at: refreshed.expires_at,
                    });
                }
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let backoff = self.base_backoff * 2u32.pow(attempt - 1);
                    tracing::warn!(attempt, error = %e, backoff_ms = backoff.as_millis() as u64, "session refresh failed, retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// React to session signals until cancelled or the signal channel closes.
    pub async fn run(
        self,
        mut signals: mpsc::Receiver<SessionSignal>,
        cancel: CancellationToken,
    ) {
        loop {
            let signal = tokio::select! {
                _ = cancel.cancelled() => break,
                signal = signals.recv() => match signal {
                    Some(signal) => signal,
                    None => break,
                },
            };
            tracing::debug!(?signal, "session signal received");
            match self.refresh_if_near_expiry(self.threshold).await {
                Ok(outcome) => tracing::debug!(?outcome, "session check complete"),
                Err(SessionError::NoSession) => tracing::debug!("no session to refresh"),
                Err(e) => tracing::warn!(error = %e, "session refresh failed"),
            }
        }
        tracing::debug!("session keeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use agentverse_types::session::Session;

    struct FakeProvider {
        session: Mutex<Option<Session>>,
        failures: Mutex<Vec<SessionError>>,
        refreshes: AtomicUsize,
    }

    impl FakeProvider {
        fn expiring_in(secs: i64) -> Self {
            Self {
                session: Mutex::new(Some(session(secs))),
                failures: Mutex::new(Vec::new()),
                refreshes: AtomicUsize::new(0),
            }
        }

        fn fail_with(self, failures: Vec<SessionError>) -> Self {
            *self.failures.lock().unwrap() = failures;
            self
        }
    }

    fn session(secs: i64) -> Session {
        Session {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: Utc::now() + chrono::Duration::seconds(secs),
            user_id: None,
        }
    }

    impl SessionProvider for FakeProvider {
        async fn current_session(&self) -> Result<Option<Session>, SessionError> {
            Ok(self.session.lock().unwrap().clone())
        }

        async fn refresh_session(&self) -> Result<Session, SessionError> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            let mut failures = self.failures.lock().unwrap();
            if !failures.is_empty() {
                return Err(failures.remove(0));
            }
            let fresh = session(3600);
            *self.session.lock().unwrap() = Some(fresh.clone());
            Ok(fresh)
        }
    }

    fn keeper(provider: &Arc<FakeProvider>) -> SessionKeeper<FakeProvider> {
        SessionKeeper::new(provider.clone(), chrono::Duration::seconds(300))
            .with_backoff(3, Duration::from_millis(10))
    }

    #[tokio::test]
    async fn fresh_session_is_left_alone() {
        let provider = Arc::new(FakeProvider::expiring_in(3600));
        let outcome = keeper(&provider)
            .refresh_if_near_expiry(chrono::Duration::seconds(300))
            .await
            .unwrap();
        assert_eq!(outcome, RefreshOutcome::Fresh);
        assert_eq!(provider.refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn near_expiry_session_is_refreshed() {
        let provider = Arc::new(FakeProvider::expiring_in(60));
        let outcome = keeper(&provider)
            .refresh_if_near_expiry(chrono::Duration::seconds(300))
            .await
            .unwrap();
        assert!(matches!(outcome, RefreshOutcome::Refreshed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried() {
        let provider = Arc::new(FakeProvider::expiring_in(60).fail_with(vec![
            SessionError::Unreachable("offline".into()),
            SessionError::Unreachable("offline".into()),
        ]));
        let outcome = keeper(&provider)
            .refresh_if_near_expiry(chrono::Duration::seconds(300))
            .await;
        assert!(outcome.is_ok());
        assert_eq!(provider.refreshes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_are_bounded() {
        let provider = Arc::new(FakeProvider::expiring_in(60).fail_with(vec![
            SessionError::Unreachable("offline".into()),
            SessionError::Unreachable("offline".into()),
            SessionError::Unreachable("offline".into()),
            SessionError::Unreachable("offline".into()),
        ]));
        let err = keeper(&provider)
            .refresh_if_near_expiry(chrono::Duration::seconds(300))
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(provider.refreshes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn rejected_refresh_is_not_retried() {
        let provider = Arc::new(
            FakeProvider::expiring_in(60)
                .fail_with(vec![SessionError::RefreshRejected("invalid grant".into())]),
        );
        let err = keeper(&provider)
            .refresh_if_near_expiry(chrono::Duration::seconds(300))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::RefreshRejected(_)));
        assert_eq!(provider.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_session_is_reported() {
        let provider = Arc::new(FakeProvider::expiring_in(60));
        *provider.session.lock().unwrap() = None;
        let err = keeper(&provider)
            .refresh_if_near_expiry(chrono::Duration::seconds(300))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NoSession));
    }

    #[tokio::test]
    async fn run_loop_refreshes_on_signal_and_stops_on_cancel() {
        let provider = Arc::new(FakeProvider::expiring_in(60));
        let (tx, rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(keeper(&provider).run(rx, cancel.clone()));

        tx.send(SessionSignal::ConnectivityRestored).await.unwrap();
        tx.send(SessionSignal::Resumed).await.unwrap();
        // Wait for the first refresh before cancelling.
        while provider.refreshes.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        cancel.cancel();
        task.await.unwrap();

        // The second signal finds a fresh session.
        assert_eq!(provider.refreshes.load(Ordering::SeqCst), 1);
    }
}
