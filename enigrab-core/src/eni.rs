//! ENI state model
//!
//! A value snapshot of one network interface at one point in time.
//! Every poll produces a fresh snapshot; nothing here is cached or
//! mutated in place.

/// Interface-level status as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EniStatus {
    Available,
    InUse,
    /// A status this tool does not act on (e.g. "associated").
    Other(String),
}

impl std::fmt::Display for EniStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EniStatus::Available => write!(f, "available"),
            EniStatus::InUse => write!(f, "in-use"),
            EniStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Progress of an individual attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachState {
    Attaching,
    Attached,
    Detaching,
}

impl std::fmt::Display for AttachState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttachState::Attaching => write!(f, "attaching"),
            AttachState::Attached => write!(f, "attached"),
            AttachState::Detaching => write!(f, "detaching"),
        }
    }
}

/// Attachment relationship of an interface.
///
/// Modeled as a tagged variant so that attachment fields can only be
/// reached when an attachment actually exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    Detached,
    Attached {
        attachment_id: String,
        /// Absent for interfaces held by a managed service rather than
        /// an instance (e.g. a NAT gateway).
        instance_id: Option<String>,
        device_index: i32,
        state: AttachState,
    },
}

/// Snapshot of one network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EniState {
    pub id: String,
    pub status: EniStatus,
    pub attachment: Attachment,
    pub private_dns_name: Option<String>,
    pub private_ip: Option<String>,
    pub availability_zone: Option<String>,
    /// Value of the Name tag, if any.
    pub name: Option<String>,
}

impl EniState {
    pub fn is_available(&self) -> bool {
        self.status == EniStatus::Available
    }

    /// True when any attachment, in any state, names the given instance.
    pub fn holds_instance(&self, instance_id: &str) -> bool {
        match &self.attachment {
            Attachment::Attached {
                instance_id: Some(id),
                ..
            } => id == instance_id,
            _ => false,
        }
    }

    /// True when the interface is in use and its attachment has
    /// completed.
    pub fn is_fully_attached(&self) -> bool {
        self.status == EniStatus::InUse
            && matches!(
                self.attachment,
                Attachment::Attached {
                    state: AttachState::Attached,
                    ..
                }
            )
    }

    /// True when the interface has settled as attached to the given
    /// instance.
    pub fn is_fully_attached_to(&self, instance_id: &str) -> bool {
        self.is_fully_attached() && self.holds_instance(instance_id)
    }

    pub fn attachment_id(&self) -> Option<&str> {
        match &self.attachment {
            Attachment::Attached { attachment_id, .. } => Some(attachment_id),
            Attachment::Detached => None,
        }
    }

    pub fn attached_instance_id(&self) -> Option<&str> {
        match &self.attachment {
            Attachment::Attached { instance_id, .. } => instance_id.as_deref(),
            Attachment::Detached => None,
        }
    }

    pub fn attached_device_index(&self) -> Option<i32> {
        match &self.attachment {
            Attachment::Attached { device_index, .. } => Some(*device_index),
            Attachment::Detached => None,
        }
    }
}
