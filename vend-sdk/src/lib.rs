//! SDK for the networked vending machine API.
//!
//! [`objects`] holds the wire types shared by every consumer. The HTTP and
//! push-channel clients live in [`client`], gated behind the `client` cargo
//! feature.

pub mod objects;

#[cfg(feature = "client")]
pub mod client;
