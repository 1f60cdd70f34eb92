//! Bounded polling waiter
//!
//! Repeatedly re-reads an interface until a caller-supplied predicate
//! accepts the snapshot, or a retry bound runs out. The same primitive
//! serves "wait until attached" and "wait until detached"; only the
//! predicate differs.

use std::time::{Duration, Instant};

use crate::eni::EniState;
use crate::error::{Error, Result};
use crate::provider::EniApi;

/// Bounds for one waiter invocation.
///
/// Carries both an attempt count and an optional overall deadline;
/// polling stops on whichever bound is reached first. Historically
/// these were two separate shapes (attempt-count and timeout), unified
/// here so callers never have to convert between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
    pub timeout: Option<Duration>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Check the policy without performing any I/O.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::Policy("max attempts must be greater than zero".into()));
        }
        if self.interval.is_zero() {
            return Err(Error::Policy("interval must be greater than zero".into()));
        }
        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err(Error::Policy("timeout must be greater than zero".into()));
            }
            if self.interval > timeout {
                return Err(Error::Policy(format!(
                    "interval ({:?}) must not exceed timeout ({:?})",
                    self.interval, timeout
                )));
            }
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(10, Duration::from_secs(2))
    }
}

/// Poll `eni_id` until `done` accepts a snapshot or the policy bounds
/// are exhausted.
///
/// The first describe happens only after one interval has elapsed; the
/// mutation was just issued and cannot have completed instantly.
/// Describe errors propagate immediately, only "not yet transitioned"
/// is retried. The interval sleep is owned by this loop, so dropping
/// the returned future cancels the wait with nothing left running.
pub async fn wait_for<P>(
    api: &dyn EniApi,
    eni_id: &str,
    policy: &RetryPolicy,
    done: P,
) -> Result<EniState>
where
    P: Fn(&EniState) -> bool,
{
    policy.validate()?;

    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        tokio::time::sleep(policy.interval).await;

        let state = api
            .describe_eni(eni_id)
            .await?
            .ok_or_else(|| Error::NotFound(eni_id.to_string()))?;
        attempts += 1;

        if done(&state) {
            return Ok(state);
        }

        let elapsed = started.elapsed();
        let deadline_hit = policy.timeout.is_some_and(|t| elapsed >= t);
        if attempts >= policy.max_attempts || deadline_hit {
            return Err(Error::TimedOut {
                eni_id: eni_id.to_string(),
                attempts,
                elapsed,
                last_seen: Some(Box::new(state)),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::eni::{AttachState, Attachment, EniStatus};
    use crate::provider::{BoxFuture, ProviderError, ProviderResult};

    fn available() -> EniState {
        EniState {
            id: "eni-1".to_string(),
            status: EniStatus::Available,
            attachment: Attachment::Detached,
            private_dns_name: None,
            private_ip: None,
            availability_zone: None,
            name: None,
        }
    }

    fn attaching() -> EniState {
        EniState {
            status: EniStatus::InUse,
            attachment: Attachment::Attached {
                attachment_id: "eni-attach-1".to_string(),
                instance_id: Some("i-a".to_string()),
                device_index: 1,
                state: AttachState::Attaching,
            },
            ..available()
        }
    }

    fn attached() -> EniState {
        EniState {
            status: EniStatus::InUse,
            attachment: Attachment::Attached {
                attachment_id: "eni-attach-1".to_string(),
                instance_id: Some("i-a".to_string()),
                device_index: 1,
                state: AttachState::Attached,
            },
            ..available()
        }
    }

    /// Serves scripted describe snapshots; the last one repeats.
    struct ScriptedApi {
        states: Mutex<VecDeque<Option<EniState>>>,
        describe_calls: AtomicUsize,
        fail_describe: bool,
    }

    impl ScriptedApi {
        fn new(states: Vec<Option<EniState>>) -> Self {
            Self {
                states: Mutex::new(states.into()),
                describe_calls: AtomicUsize::new(0),
                fail_describe: false,
            }
        }

        fn failing() -> Self {
            let mut api = Self::new(vec![]);
            api.fail_describe = true;
            api
        }

        fn calls(&self) -> usize {
            self.describe_calls.load(Ordering::SeqCst)
        }
    }

    impl EniApi for ScriptedApi {
        fn describe_eni(&self, _eni_id: &str) -> BoxFuture<'_, ProviderResult<Option<EniState>>> {
            Box::pin(async move {
                self.describe_calls.fetch_add(1, Ordering::SeqCst);
                if self.fail_describe {
                    return Err(ProviderError::new("describe failed"));
                }
                let mut states = self.states.lock().unwrap();
                let state = if states.len() > 1 {
                    states.pop_front().unwrap()
                } else {
                    states.front().cloned().unwrap_or(None)
                };
                Ok(state)
            })
        }

        fn list_enis(&self) -> BoxFuture<'_, ProviderResult<Vec<EniState>>> {
            Box::pin(async { Ok(vec![]) })
        }

        fn attach_eni(
            &self,
            _eni_id: &str,
            _instance_id: &str,
            _device_index: i32,
        ) -> BoxFuture<'_, ProviderResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn detach_eni(&self, _attachment_id: &str) -> BoxFuture<'_, ProviderResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }

    #[test]
    fn zero_attempts_rejected() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert!(matches!(policy.validate(), Err(Error::Policy(_))));
    }

    #[test]
    fn zero_interval_rejected() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        assert!(matches!(policy.validate(), Err(Error::Policy(_))));
    }

    #[test]
    fn interval_exceeding_timeout_rejected() {
        let policy =
            RetryPolicy::new(3, Duration::from_secs(10)).with_timeout(Duration::from_secs(5));
        assert!(matches!(policy.validate(), Err(Error::Policy(_))));
    }

    #[test]
    fn default_policy_is_valid() {
        assert!(RetryPolicy::default().validate().is_ok());
        let bounded =
            RetryPolicy::new(10, Duration::from_secs(2)).with_timeout(Duration::from_secs(20));
        assert!(bounded.validate().is_ok());
    }

    #[tokio::test]
    async fn invalid_policy_fails_before_any_describe() {
        let api = ScriptedApi::new(vec![Some(attached())]);
        let policy = RetryPolicy::new(0, Duration::from_millis(1));
        let result = wait_for(&api, "eni-1", &policy, |s| s.is_fully_attached()).await;
        assert!(matches!(result, Err(Error::Policy(_))));
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn succeeds_on_nth_poll() {
        let api = ScriptedApi::new(vec![
            Some(attaching()),
            Some(attaching()),
            Some(attached()),
        ]);
        let state = wait_for(&api, "eni-1", &fast_policy(3), |s| s.is_fully_attached())
            .await
            .unwrap();
        assert!(state.is_fully_attached());
        assert_eq!(api.calls(), 3);
    }

    #[tokio::test]
    async fn times_out_at_attempt_bound() {
        let api = ScriptedApi::new(vec![Some(attaching())]);
        let result = wait_for(&api, "eni-1", &fast_policy(2), |s| s.is_fully_attached()).await;
        match result {
            Err(Error::TimedOut {
                attempts,
                last_seen,
                ..
            }) => {
                assert_eq!(attempts, 2);
                assert!(last_seen.is_some());
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn deadline_bound_terminates_before_attempts_run_out() {
        let api = ScriptedApi::new(vec![Some(attaching())]);
        let policy = RetryPolicy::new(1000, Duration::from_millis(1))
            .with_timeout(Duration::from_millis(5));
        let result = wait_for(&api, "eni-1", &policy, |s| s.is_fully_attached()).await;
        match result {
            Err(Error::TimedOut { attempts, .. }) => assert!(attempts < 1000),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn describe_error_propagates_without_retry() {
        let api = ScriptedApi::failing();
        let result = wait_for(&api, "eni-1", &fast_policy(5), |s| s.is_fully_attached()).await;
        assert!(matches!(result, Err(Error::Provider(_))));
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn vanished_interface_is_not_found() {
        let api = ScriptedApi::new(vec![None]);
        let result = wait_for(&api, "eni-1", &fast_policy(3), |s| s.is_fully_attached()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
