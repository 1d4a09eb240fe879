//! API module for shared HTTP API types
//!
//! Contains only serde types; the axum wiring lives in the hub.

pub mod types;

pub use types::{
    ActionResponse, ClapHistoryEntry, ClapTestRequest, ControlCommand, ControlRequest,
    StatusResponse,
};
