pub mod channel;
pub mod price;
pub mod push;
pub mod status;
pub mod vend;

pub use channel::{ADDRESS_LEN, AddressError, ChannelAddress};
pub use price::PriceQuote;
pub use status::{MachineStatus, MachineStatusCode, StatusSnapshot};
pub use vend::{ApiErrorBody, VendForm};
