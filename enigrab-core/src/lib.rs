//! Enigrab Core
//!
//! Core library for orchestrating EC2 network interface attachments:
//! a provider seam, an ENI state model, a bounded polling waiter, and
//! the attach/detach/grab orchestrator built on top of them.

pub mod eni;
pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod waiter;
