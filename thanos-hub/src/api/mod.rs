//! HTTP API for the hub
//!
//! Status, direct control, clap simulation, an SSE event stream and the
//! embedded dashboard.

pub mod handlers;
pub mod server;
pub mod sse;
pub mod ui;

pub use server::{create_router, run, AppContext};
