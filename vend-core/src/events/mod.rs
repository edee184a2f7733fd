//! Push events and the channels that carry them.
//!
//! # Event Flow
//!
//! 1. `ConnectionDriver` publishes `PushEvent`s on the `PushEventBus`
//! 2. `EventListener` (and any other subscriber) consumes them
//! 3. `EventListener` sends `DriverCommand`s back to the `ConnectionDriver`

pub mod bus;
pub mod types;

pub use bus::{
    DEFAULT_BUS_CAPACITY, DEFAULT_COMMAND_BUFFER, DriverCommandReceiver, DriverCommandSender,
    PushEventBus, driver_command_channel,
};
pub use types::{ConnectionEvent, DriverCommand, PushEvent};
