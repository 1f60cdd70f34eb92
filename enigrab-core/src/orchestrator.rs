//! Attach/detach/grab orchestration
//!
//! Each operation is an idempotency pre-check, a mutation request, and
//! a bounded wait for the provider to confirm the transition. Every
//! decision is re-derived from a fresh describe; no state is carried
//! between calls.

use crate::eni::EniState;
use crate::error::{Error, Result};
use crate::provider::EniApi;
use crate::waiter::{self, RetryPolicy};

/// Result of one orchestration call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The requested transition completed and was confirmed.
    Completed(EniState),
    /// The interface was already in the desired state; no mutation was
    /// issued.
    NoOp(EniState),
}

impl Outcome {
    pub fn state(&self) -> &EniState {
        match self {
            Outcome::Completed(state) | Outcome::NoOp(state) => state,
        }
    }
}

/// Drives attach, detach, and grab against an injected provider.
pub struct Orchestrator<'a> {
    api: &'a dyn EniApi,
}

impl<'a> Orchestrator<'a> {
    pub fn new(api: &'a dyn EniApi) -> Self {
        Self { api }
    }

    /// Attach an interface to an instance and wait for confirmation.
    ///
    /// Returns `NoOp` when an attachment for the target instance
    /// already exists, without issuing any mutation.
    pub async fn attach(
        &self,
        eni_id: &str,
        instance_id: &str,
        device_index: i32,
        policy: &RetryPolicy,
    ) -> Result<Outcome> {
        policy.validate()?;

        let state = self.describe(eni_id).await?;
        if state.holds_instance(instance_id) {
            return Ok(Outcome::NoOp(state));
        }

        let state = self
            .request_attach_and_wait(eni_id, instance_id, device_index, policy)
            .await?;
        Ok(Outcome::Completed(state))
    }

    /// Detach an interface from whatever holds it and wait until it is
    /// available again.
    ///
    /// Returns `NoOp` when the interface has no attachment.
    pub async fn detach(&self, eni_id: &str, policy: &RetryPolicy) -> Result<Outcome> {
        policy.validate()?;

        let state = self.describe(eni_id).await?;
        let Some(attachment_id) = state.attachment_id().map(str::to_string) else {
            return Ok(Outcome::NoOp(state));
        };

        let state = self
            .request_detach_and_wait(eni_id, &attachment_id, policy)
            .await?;
        Ok(Outcome::Completed(state))
    }

    /// Move an interface to the target instance regardless of its
    /// current holder: at most one detach, then one attach.
    ///
    /// Returns `NoOp` when the interface has already settled on the
    /// target. A detach is only issued when the interface has settled
    /// on a different holder; the attach request is aborted if that
    /// detach fails or times out. The detach phase trusts the initial
    /// read rather than re-checking, since attachment presence was
    /// just confirmed.
    pub async fn grab(
        &self,
        eni_id: &str,
        instance_id: &str,
        device_index: i32,
        policy: &RetryPolicy,
    ) -> Result<Outcome> {
        policy.validate()?;

        let state = self.describe(eni_id).await?;
        if state.is_fully_attached() {
            if state.holds_instance(instance_id) {
                return Ok(Outcome::NoOp(state));
            }
            if let Some(attachment_id) = state.attachment_id() {
                self.request_detach_and_wait(eni_id, attachment_id, policy)
                    .await?;
            }
        }

        let state = self
            .request_attach_and_wait(eni_id, instance_id, device_index, policy)
            .await?;
        Ok(Outcome::Completed(state))
    }

    async fn describe(&self, eni_id: &str) -> Result<EniState> {
        self.api
            .describe_eni(eni_id)
            .await?
            .ok_or_else(|| Error::NotFound(eni_id.to_string()))
    }

    async fn request_attach_and_wait(
        &self,
        eni_id: &str,
        instance_id: &str,
        device_index: i32,
        policy: &RetryPolicy,
    ) -> Result<EniState> {
        self.api
            .attach_eni(eni_id, instance_id, device_index)
            .await?;
        waiter::wait_for(self.api, eni_id, policy, |s| {
            s.is_fully_attached_to(instance_id)
        })
        .await
    }

    async fn request_detach_and_wait(
        &self,
        eni_id: &str,
        attachment_id: &str,
        policy: &RetryPolicy,
    ) -> Result<EniState> {
        self.api.detach_eni(attachment_id).await?;
        waiter::wait_for(self.api, eni_id, policy, EniState::is_available).await
    }
}
