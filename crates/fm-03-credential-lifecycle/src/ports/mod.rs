//! Ports layer for the credential lifecycle.

pub mod inbound;
pub mod outbound;
