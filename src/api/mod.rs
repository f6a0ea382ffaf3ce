//! HTTP transport
//!
//! Serves the same JSON-RPC handler as stdio at `POST /mcp`, plus health and
//! connector introspection endpoints.

pub mod routes;

use crate::mcp::McpServer;
use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use tracing::info;
use tracing_actix_web::TracingLogger;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/mcp", web::post().to(routes::rpc))
        .route("/health", web::get().to(routes::health))
        .route("/connectors", web::get().to(routes::connectors));
}

pub async fn serve(server: McpServer, host: &str, port: u16) -> std::io::Result<()> {
    let data = web::Data::new(server);

    info!(host = %host, port = port, "Starting HTTP transport");

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(Cors::permissive())
            .wrap(TracingLogger::default())
            .configure(configure)
    })
    .bind((host, port))?
    .run()
    .await
}
