//! Adapters for the credential lifecycle ports.

pub mod store;

pub use store::StoreTokenStore;
