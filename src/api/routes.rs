//! HTTP handlers for the JSON-RPC endpoint and host introspection.

use crate::mcp::McpServer;
use actix_web::{web, HttpResponse};
use serde_json::json;

/// POST /mcp - one JSON-RPC message per request body.
pub async fn rpc(server: web::Data<McpServer>, body: String) -> HttpResponse {
    match server.handle_message(&body).await {
        Some(response) => HttpResponse::Ok().json(response),
        None => HttpResponse::Accepted().finish(),
    }
}

pub async fn health(server: web::Data<McpServer>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "connectors": server.manager().connector_count(),
    }))
}

pub async fn connectors(server: web::Data<McpServer>) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "connectors": server.manager().descriptors() }))
}
