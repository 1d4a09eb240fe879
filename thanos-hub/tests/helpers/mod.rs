//! Shared test infrastructure for thanos-hub integration tests
//!
//! Builds a controller wired to an in-memory command sink, so tests can
//! observe exactly what would have been published to the device.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::StatusCode;
use http::{Method, Request};
use serde_json::Value;
use std::sync::Arc;
use thanos_common::config::TopicConfig;
use thanos_common::events::EventBus;
use thanos_hub::api::{create_router, AppContext};
use thanos_hub::controller::{Controller, StateStore, StoreSettings};
use thanos_hub::transport::ChannelSink;
use tokio::sync::mpsc::UnboundedReceiver;
use tower::ServiceExt;

/// A controller plus the receiving end of its command sink
pub struct TestHub {
    pub controller: Arc<Controller>,
    pub router: axum::Router,
    /// Outbound wire payloads, in publish order
    pub commands: UnboundedReceiver<String>,
}

impl TestHub {
    pub fn new() -> Self {
        Self::with_settings(StoreSettings::default())
    }

    pub fn with_settings(settings: StoreSettings) -> Self {
        let (sink, commands) = ChannelSink::new();
        let controller = Arc::new(Controller::new(
            Arc::new(StateStore::new(settings)),
            Arc::new(sink),
            TopicConfig::default(),
            EventBus::new(64),
        ));
        let router = create_router(AppContext {
            controller: Arc::clone(&controller),
        });

        Self {
            controller,
            router,
            commands,
        }
    }

    /// Deliver one MQTT message as the broker would
    pub async fn inbound(&self, topic: &str, payload: &str) {
        self.controller.handle_inbound(topic, payload.as_bytes()).await;
    }

    /// All payloads published so far
    pub fn drain_commands(&mut self) -> Vec<String> {
        let mut sent = Vec::new();
        while let Ok(payload) = self.commands.try_recv() {
            sent.push(payload);
        }
        sent
    }

    /// Send a request through the router, returning status and JSON body
    pub async fn request(&self, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Option<Value>) {
        let builder = Request::builder().method(method).uri(path);

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            None
        } else {
            serde_json::from_slice(&bytes).ok()
        };

        (status, json)
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Option<Value>) {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Option<Value>) {
        self.request(Method::POST, path, Some(body)).await
    }
}
