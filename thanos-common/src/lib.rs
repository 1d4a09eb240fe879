//! # Thanos Common Library
//!
//! Shared code for the Thanos clap-controlled LED services including:
//! - Configuration file resolution and schema
//! - Event types (HubEvent enum) and the EventBus
//! - API request/response types
//! - Clock formatting helpers

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
