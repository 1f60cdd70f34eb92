//! Enigrab AWS Provider
//!
//! EC2 implementation of the network interface API seam.

pub mod metadata;

use aws_config::Region;
use aws_sdk_ec2::Client as Ec2Client;
use aws_sdk_ec2::types::{AttachmentStatus, NetworkInterface, NetworkInterfaceStatus};
use enigrab_core::eni::{AttachState, Attachment, EniState, EniStatus};
use enigrab_core::provider::{BoxFuture, EniApi, ProviderError, ProviderResult};

/// Descriptive details of an EC2 instance, for display and existence
/// checks before attaching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    pub id: String,
    /// Value of the Name tag, if any.
    pub name: Option<String>,
}

/// EC2-backed provider for describe/attach/detach calls.
pub struct Ec2EniProvider {
    ec2_client: Ec2Client,
}

impl Ec2EniProvider {
    /// Build a provider from the default AWS config chain, optionally
    /// pinned to a region.
    pub async fn new(region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let config = loader.load().await;

        Self {
            ec2_client: Ec2Client::new(&config),
        }
    }

    /// Create with a specific client (for testing)
    pub fn with_client(ec2_client: Ec2Client) -> Self {
        Self { ec2_client }
    }

    async fn describe_eni_inner(&self, eni_id: &str) -> ProviderResult<Option<EniState>> {
        let result = self
            .ec2_client
            .describe_network_interfaces()
            .network_interface_ids(eni_id)
            .send()
            .await;

        match result {
            Ok(response) => match response.network_interfaces().first() {
                Some(eni) => Ok(Some(eni_from_sdk(eni)?)),
                None => Ok(None),
            },
            Err(e) => {
                let err_str = format!("{:?}", e);
                if err_str.contains("InvalidNetworkInterfaceID.NotFound") {
                    Ok(None)
                } else {
                    Err(
                        ProviderError::new(format!("Failed to describe network interface: {:?}", e))
                            .for_eni(eni_id),
                    )
                }
            }
        }
    }

    async fn list_enis_inner(&self) -> ProviderResult<Vec<EniState>> {
        let response = self
            .ec2_client
            .describe_network_interfaces()
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(format!("Failed to describe network interfaces: {:?}", e))
            })?;

        response
            .network_interfaces()
            .iter()
            .map(eni_from_sdk)
            .collect()
    }

    async fn attach_eni_inner(
        &self,
        eni_id: &str,
        instance_id: &str,
        device_index: i32,
    ) -> ProviderResult<()> {
        self.ec2_client
            .attach_network_interface()
            .network_interface_id(eni_id)
            .instance_id(instance_id)
            .device_index(device_index)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(format!("Failed to attach network interface: {:?}", e))
                    .for_eni(eni_id)
            })?;

        Ok(())
    }

    async fn detach_eni_inner(&self, attachment_id: &str) -> ProviderResult<()> {
        self.ec2_client
            .detach_network_interface()
            .attachment_id(attachment_id)
            .force(false)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(format!("Failed to detach network interface: {:?}", e))
            })?;

        Ok(())
    }

    /// Look up an instance by id.
    ///
    /// Returns `Ok(None)` when no such instance exists, so callers can
    /// reject an attach target before issuing any mutation.
    pub async fn describe_instance(&self, instance_id: &str) -> ProviderResult<Option<InstanceInfo>> {
        let result = self
            .ec2_client
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await;

        match result {
            Ok(response) => {
                let instance = response
                    .reservations()
                    .iter()
                    .flat_map(|r| r.instances())
                    .next();
                Ok(instance.map(|i| InstanceInfo {
                    id: i.instance_id().unwrap_or(instance_id).to_string(),
                    name: i
                        .tags()
                        .iter()
                        .find(|t| t.key() == Some("Name"))
                        .and_then(|t| t.value())
                        .map(String::from),
                }))
            }
            Err(e) => {
                let err_str = format!("{:?}", e);
                if err_str.contains("InvalidInstanceID.NotFound") {
                    Ok(None)
                } else {
                    Err(ProviderError::new(format!(
                        "Failed to describe instance: {:?}",
                        e
                    )))
                }
            }
        }
    }
}

impl EniApi for Ec2EniProvider {
    fn describe_eni(&self, eni_id: &str) -> BoxFuture<'_, ProviderResult<Option<EniState>>> {
        let eni_id = eni_id.to_string();
        Box::pin(async move { self.describe_eni_inner(&eni_id).await })
    }

    fn list_enis(&self) -> BoxFuture<'_, ProviderResult<Vec<EniState>>> {
        Box::pin(async move { self.list_enis_inner().await })
    }

    fn attach_eni(
        &self,
        eni_id: &str,
        instance_id: &str,
        device_index: i32,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        let eni_id = eni_id.to_string();
        let instance_id = instance_id.to_string();
        Box::pin(async move {
            self.attach_eni_inner(&eni_id, &instance_id, device_index)
                .await
        })
    }

    fn detach_eni(&self, attachment_id: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let attachment_id = attachment_id.to_string();
        Box::pin(async move { self.detach_eni_inner(&attachment_id).await })
    }
}

/// Map an SDK network interface into the core snapshot model.
///
/// Mandatory fields that are absent become errors here, so downstream
/// code never has to null-check attachment fields.
fn eni_from_sdk(eni: &NetworkInterface) -> ProviderResult<EniState> {
    let id = eni
        .network_interface_id()
        .ok_or_else(|| ProviderError::new("Network interface without an id in API response"))?
        .to_string();

    let status = match eni.status() {
        Some(NetworkInterfaceStatus::Available) => EniStatus::Available,
        Some(NetworkInterfaceStatus::InUse) => EniStatus::InUse,
        Some(other) => EniStatus::Other(other.as_str().to_string()),
        None => {
            return Err(ProviderError::new("Network interface without a status").for_eni(id.as_str()));
        }
    };

    let attachment = match eni.attachment() {
        Some(att) => {
            let state = match att.status() {
                Some(AttachmentStatus::Attaching) => Some(AttachState::Attaching),
                Some(AttachmentStatus::Attached) => Some(AttachState::Attached),
                Some(AttachmentStatus::Detaching) => Some(AttachState::Detaching),
                // A detached or unreported attachment carries nothing
                // we can act on.
                _ => None,
            };
            match state {
                Some(state) => Attachment::Attached {
                    attachment_id: att
                        .attachment_id()
                        .ok_or_else(|| {
                            ProviderError::new("Attachment without an id in API response")
                                .for_eni(id.as_str())
                        })?
                        .to_string(),
                    instance_id: att.instance_id().map(String::from),
                    device_index: att.device_index().unwrap_or(-1),
                    state,
                },
                None => Attachment::Detached,
            }
        }
        None => Attachment::Detached,
    };

    let name = eni
        .tag_set()
        .iter()
        .find(|t| t.key() == Some("Name"))
        .and_then(|t| t.value())
        .map(String::from);

    Ok(EniState {
        id,
        status,
        attachment,
        private_dns_name: eni.private_dns_name().map(String::from),
        private_ip: eni.private_ip_address().map(String::from),
        availability_zone: eni.availability_zone().map(String::from),
        name,
    })
}
