//! # Thanos Hub Library (thanos-hub)
//!
//! Clap-controlled LED hub: consumes clap patterns, LED feedback and
//! heartbeats from the sensor device over MQTT, decides LED commands and
//! publishes them back, and serves status/control over HTTP.
//!
//! **Architecture:** pure decode/interpret/echo logic around one locked
//! state store; an MQTT event-loop task, a liveness task and axum handlers
//! all go through [`controller::Controller`].

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod shutdown;
pub mod transport;

pub use error::{Error, Result};
