//! # Ports
//!
//! Interfaces the store requires from its host.

pub mod outbound;
