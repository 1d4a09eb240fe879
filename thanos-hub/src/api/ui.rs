//! Embedded dashboard page

use axum::response::{Html, IntoResponse};

const DASHBOARD_TEMPLATE: &str = include_str!("dashboard.html");

/// GET /
pub async fn dashboard() -> impl IntoResponse {
    Html(render())
}

fn render() -> String {
    DASHBOARD_TEMPLATE
        .replace("{{VERSION}}", env!("CARGO_PKG_VERSION"))
        .replace("{{GIT_HASH}}", env!("GIT_HASH"))
        .replace("{{BUILD_TIMESTAMP}}", env!("BUILD_TIMESTAMP"))
}
