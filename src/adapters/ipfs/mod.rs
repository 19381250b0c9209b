//! IPFS Adapters - Content-Addressable Storage
//!
//! Kubo RPC client implementing the `ContentStore` port.

pub mod kubo;

pub use kubo::KuboClient;
