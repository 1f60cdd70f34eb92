//! Instance metadata lookups
//!
//! Used when the caller does not name a target instance: the attach
//! target defaults to the machine this tool is running on.

use aws_config::imds;
use enigrab_core::provider::{ProviderError, ProviderResult};

/// Resolve the id of the instance this process is running on via IMDS.
pub async fn local_instance_id() -> ProviderResult<String> {
    let client = imds::Client::builder().build();
    let id = client
        .get("/latest/meta-data/instance-id")
        .await
        .map_err(|e| {
            ProviderError::new(format!(
                "Failed to read the local instance id from instance metadata: {:?}",
                e
            ))
        })?;
    Ok(id.as_ref().to_string())
}
