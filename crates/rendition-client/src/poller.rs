//! Discovery polling: a bounded, fixed-interval retry loop around the discovery
//! endpoint.
//!
//! [`PollState::advance`] is the whole protocol and does no I/O. [`DiscoveryPoller`]
//! feeds it one discovery call per tick, sleeps between ticks and stops early when
//! its [`CancellationToken`] fires.

use async_trait::async_trait;
use rendition_core::constants::{DEFAULT_POLL_INTERVAL, DEFAULT_POLL_MAX_ATTEMPTS};
use rendition_core::DiscoveryResult;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::ApiClient;

/// Anything that can answer a discovery query.
#[async_trait]
pub trait DiscoverySource: Send + Sync {
    async fn discover(&self, key: &str) -> anyhow::Result<DiscoveryResult>;
}

#[async_trait]
impl DiscoverySource for ApiClient {
    async fn discover(&self, key: &str) -> anyhow::Result<DiscoveryResult> {
        ApiClient::discover(self, key).await
    }
}

/// Retry budget and spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// Waiting for artifacts; `attempt` counts the non-ready ticks so far.
    Polling { attempt: u32 },
    Succeeded(DiscoveryResult),
    Expired { attempts: u32 },
}

impl PollState {
    pub fn start() -> Self {
        PollState::Polling { attempt: 0 }
    }

    /// Apply one tick. `None` is a failed call and counts like an empty result.
    ///
    /// Terminal states stay where they are.
    pub fn advance(self, tick: Option<DiscoveryResult>, policy: &PollPolicy) -> Self {
        match self {
            PollState::Polling { attempt } => match tick {
                Some(result) if result.is_ready() => PollState::Succeeded(result),
                _ => {
                    let attempt = attempt + 1;
                    if attempt >= policy.max_attempts {
                        PollState::Expired { attempts: attempt }
                    } else {
                        PollState::Polling { attempt }
                    }
                }
            },
            terminal => terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Polling { .. })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PollError {
    #[error("Renditions not available after {attempts} attempts, try again later")]
    Timeout { attempts: u32 },

    #[error("Polling cancelled")]
    Cancelled,
}

/// Polls one source key until something is available, the budget runs out or the
/// token is cancelled. Never has more than one discovery call in flight.
pub struct DiscoveryPoller<S> {
    source: S,
    policy: PollPolicy,
    cancel: CancellationToken,
}

impl<S: DiscoverySource> DiscoveryPoller<S> {
    pub fn new(source: S, policy: PollPolicy) -> Self {
        Self {
            source,
            policy,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned token, e.g. one tied to Ctrl+C.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    #[tracing::instrument(skip(self), fields(max_attempts = self.policy.max_attempts))]
    pub async fn run(&self, key: &str) -> Result<DiscoveryResult, PollError> {
        let mut state = PollState::start();

        loop {
            let tick = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(PollError::Cancelled),
                result = self.source.discover(key) => result,
            };

            let tick = match tick {
                Ok(result) => Some(result),
                Err(e) => {
                    tracing::warn!(error = %e, "Discovery call failed");
                    None
                }
            };

            state = match state.advance(tick, &self.policy) {
                PollState::Succeeded(result) => {
                    tracing::info!(
                        original = result.original.is_some(),
                        renditions = result.available().len(),
                        "Artifacts available"
                    );
                    return Ok(result);
                }
                // returns straight after the final call; no trailing interval
                PollState::Expired { attempts } => {
                    tracing::warn!(attempts, "Gave up waiting for artifacts");
                    return Err(PollError::Timeout { attempts });
                }
                PollState::Polling { attempt } => {
                    tracing::debug!(attempt, "Nothing available yet");
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Err(PollError::Cancelled),
                        _ = tokio::time::sleep(self.policy.interval) => {}
                    }
                    PollState::Polling { attempt }
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn ready() -> DiscoveryResult {
        DiscoveryResult {
            original: Some("https://example.com/cat.png".to_string()),
            ..Default::default()
        }
    }

    /// Answers empty until call number `ready_on`, failing the calls listed in `fail_on`.
    #[derive(Clone, Default)]
    struct ScriptedSource {
        calls: Arc<AtomicU32>,
        in_flight: Arc<AtomicBool>,
        ready_on: Option<u32>,
        fail_on: Vec<u32>,
        latency: Duration,
    }

    impl ScriptedSource {
        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DiscoverySource for ScriptedSource {
        async fn discover(&self, _key: &str) -> anyhow::Result<DiscoveryResult> {
            assert!(
                !self.in_flight.swap(true, Ordering::SeqCst),
                "overlapping discovery calls"
            );
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            self.in_flight.store(false, Ordering::SeqCst);

            if self.fail_on.contains(&call) {
                anyhow::bail!("connection reset");
            }
            match self.ready_on {
                Some(n) if call >= n => Ok(ready()),
                _ => Ok(DiscoveryResult::default()),
            }
        }
    }

    #[test]
    fn advance_counts_non_ready_ticks() {
        let policy = PollPolicy {
            max_attempts: 3,
            interval: Duration::from_millis(10),
        };

        let state = PollState::start().advance(Some(DiscoveryResult::default()), &policy);
        assert_eq!(state, PollState::Polling { attempt: 1 });

        let state = state.advance(None, &policy);
        assert_eq!(state, PollState::Polling { attempt: 2 });

        let state = state.advance(None, &policy);
        assert_eq!(state, PollState::Expired { attempts: 3 });
        assert!(state.is_terminal());
    }

    #[test]
    fn advance_succeeds_on_ready_result() {
        let policy = PollPolicy::default();
        let state = PollState::Polling { attempt: 14 }.advance(Some(ready()), &policy);
        assert_eq!(state, PollState::Succeeded(ready()));
    }

    #[test]
    fn terminal_states_do_not_move() {
        let policy = PollPolicy::default();
        let expired = PollState::Expired { attempts: 15 };
        assert_eq!(expired.clone().advance(Some(ready()), &policy), expired);

        let done = PollState::Succeeded(ready());
        assert_eq!(done.clone().advance(None, &policy), done);
    }

    #[test]
    fn default_policy() {
        let policy = PollPolicy::default();
        assert_eq!(policy.max_attempts, 15);
        assert_eq!(policy.interval, Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_fifteenth_tick() {
        let source = ScriptedSource {
            ready_on: Some(15),
            ..Default::default()
        };
        let poller = DiscoveryPoller::new(source.clone(), PollPolicy::default());

        let result = poller.run("cat.png").await.unwrap();

        assert!(result.is_ready());
        assert_eq!(source.calls(), 15);
    }

    #[tokio::test(start_paused = true)]
    async fn expires_after_max_attempts() {
        let source = ScriptedSource::default();
        let policy = PollPolicy::default();
        let poller = DiscoveryPoller::new(source.clone(), policy);

        let start = Instant::now();
        let err = poller.run("cat.png").await.unwrap_err();

        assert_eq!(err, PollError::Timeout { attempts: 15 });
        assert_eq!(source.calls(), 15);
        // Expired is decided by the last call's answer, so a sleep after it would only
        // delay the timeout: 15 calls are separated by 14 intervals.
        let elapsed = start.elapsed();
        assert!(elapsed >= policy.interval * 14, "elapsed {:?}", elapsed);
        assert!(elapsed < policy.interval * 15, "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_calls_consume_attempts() {
        let source = ScriptedSource {
            ready_on: Some(4),
            fail_on: vec![1, 2],
            ..Default::default()
        };
        let poller = DiscoveryPoller::new(
            source.clone(),
            PollPolicy {
                max_attempts: 3,
                interval: Duration::from_millis(500),
            },
        );

        let err = poller.run("cat.png").await.unwrap_err();

        assert_eq!(err, PollError::Timeout { attempts: 3 });
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_failed_calls() {
        let source = ScriptedSource {
            ready_on: Some(3),
            fail_on: vec![1, 2],
            ..Default::default()
        };
        let poller = DiscoveryPoller::new(source.clone(), PollPolicy::default());

        assert!(poller.run("cat.png").await.is_ok());
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_wait() {
        let source = ScriptedSource::default();
        let poller = DiscoveryPoller::new(source.clone(), PollPolicy::default());
        let token = poller.cancellation_token();

        let handle = tokio::spawn(async move { poller.run("cat.png").await });
        tokio::time::sleep(Duration::from_millis(5000)).await;
        token.cancel();

        let result = handle.await.unwrap();
        assert_eq!(result, Err(PollError::Cancelled));
        // ticks at 0s, 2s and 4s
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_call() {
        let source = ScriptedSource {
            latency: Duration::from_secs(30),
            ..Default::default()
        };
        let token = CancellationToken::new();
        let poller = DiscoveryPoller::new(source.clone(), PollPolicy::default())
            .with_cancellation(token.clone());

        let handle = tokio::spawn(async move { poller.run("cat.png").await });
        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();

        assert_eq!(handle.await.unwrap(), Err(PollError::Cancelled));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_start_makes_no_calls() {
        let source = ScriptedSource::default();
        let poller = DiscoveryPoller::new(source.clone(), PollPolicy::default());
        poller.cancellation_token().cancel();

        assert_eq!(poller.run("cat.png").await, Err(PollError::Cancelled));
        assert_eq!(source.calls(), 0);
    }
}
