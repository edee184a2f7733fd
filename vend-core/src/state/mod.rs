//! Client-side state.
//!
//! Everything the user sees lives in one [`ClientState`] held by a
//! [`StateStore`]. Handlers mutate it only through the store, and the
//! renderer redraws whenever the store's version changes.

mod banner;
mod model;
mod store;

pub use banner::{Banner, BannerKind, BannerSlots, Banners};
pub use model::{AddressDecision, AddressField, ClientState, ConnectionState, LookupToken, PriceLookup};
pub use store::{StateStore, StateWatcher};
