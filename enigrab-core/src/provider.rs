//! Provider - Trait abstracting the EC2 network interface API
//!
//! A provider implements the raw describe/attach/detach calls against
//! the cloud API. The orchestrator and waiter only ever talk to this
//! trait, so tests (and any future backend) inject their own
//! implementation instead of reaching for a global client.

use std::future::Future;
use std::pin::Pin;

use crate::eni::EniState;

/// Error type for provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub message: String,
    pub eni_id: Option<String>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.eni_id {
            write!(f, "[{}] {}", id, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            eni_id: None,
            cause: None,
        }
    }

    pub fn for_eni(mut self, eni_id: impl Into<String>) -> Self {
        self.eni_id = Some(eni_id.into());
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The network interface API seam.
///
/// Describe calls are read-only and idempotent; attach/detach issue the
/// asynchronous state-change request and return as soon as the provider
/// accepts it, without waiting for the transition to complete.
pub trait EniApi: Send + Sync {
    /// Fetch a fresh snapshot of one interface.
    ///
    /// Returns `Ok(None)` when no interface with that id exists.
    fn describe_eni(&self, eni_id: &str) -> BoxFuture<'_, ProviderResult<Option<EniState>>>;

    /// Fetch snapshots of every interface visible in the region.
    fn list_enis(&self) -> BoxFuture<'_, ProviderResult<Vec<EniState>>>;

    /// Request attachment of an interface to an instance.
    fn attach_eni(
        &self,
        eni_id: &str,
        instance_id: &str,
        device_index: i32,
    ) -> BoxFuture<'_, ProviderResult<()>>;

    /// Request detachment of an existing attachment.
    fn detach_eni(&self, attachment_id: &str) -> BoxFuture<'_, ProviderResult<()>>;
}

impl EniApi for Box<dyn EniApi> {
    fn describe_eni(&self, eni_id: &str) -> BoxFuture<'_, ProviderResult<Option<EniState>>> {
        (**self).describe_eni(eni_id)
    }

    fn list_enis(&self) -> BoxFuture<'_, ProviderResult<Vec<EniState>>> {
        (**self).list_enis()
    }

    fn attach_eni(
        &self,
        eni_id: &str,
        instance_id: &str,
        device_index: i32,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).attach_eni(eni_id, instance_id, device_index)
    }

    fn detach_eni(&self, attachment_id: &str) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).detach_eni(attachment_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eni::{Attachment, EniState, EniStatus};

    struct EmptyApi;

    impl EniApi for EmptyApi {
        fn describe_eni(&self, _eni_id: &str) -> BoxFuture<'_, ProviderResult<Option<EniState>>> {
            Box::pin(async { Ok(None) })
        }

        fn list_enis(&self) -> BoxFuture<'_, ProviderResult<Vec<EniState>>> {
            Box::pin(async {
                Ok(vec![EniState {
                    id: "eni-0".to_string(),
                    status: EniStatus::Available,
                    attachment: Attachment::Detached,
                    private_dns_name: None,
                    private_ip: None,
                    availability_zone: None,
                    name: None,
                }])
            })
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

    #[tokio::test]
    async fn missing_interface_is_none_not_error() {
        let api = EmptyApi;
        let state = api.describe_eni("eni-missing").await.unwrap();
        assert!(state.is_none());
    }

    #[tokio::test]
    async fn boxed_api_dispatches() {
        let api: Box<dyn EniApi> = Box::new(EmptyApi);
        let enis = api.list_enis().await.unwrap();
        assert_eq!(enis.len(), 1);
        assert_eq!(enis[0].id, "eni-0");
    }

    #[test]
    fn provider_error_display_includes_eni_id() {
        let err = ProviderError::new("throttled").for_eni("eni-1");
        assert_eq!(err.to_string(), "[eni-1] throttled");
    }
}
