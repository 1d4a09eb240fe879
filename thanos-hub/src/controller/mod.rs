//! Clap-pattern LED controller
//!
//! Pure parts (decoder, interpreter, echo window) sit underneath a single
//! locked [`StateStore`]; [`Controller`] wires them to the outbound
//! [`CommandSink`](crate::transport::CommandSink) and the event bus.

pub mod decoder;
pub mod echo;
pub mod facade;
pub mod interpreter;
pub mod liveness;
pub mod store;
pub mod types;

pub use decoder::{decode, DecodeError, InboundEvent};
pub use facade::Controller;
pub use liveness::LivenessMonitor;
pub use store::{StateSnapshot, StateStore, StoreSettings};
pub use types::{ClapEvent, CommandAction, CommandIntent, CommandOrigin, DeviceState};
