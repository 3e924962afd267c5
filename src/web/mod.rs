// web/mod.rs — HTTP server: server-rendered pages + JSON API.
//
// Routes:
//   GET  /                 list view (?incomplete=true filters)
//   POST /add              create task (form)
//   GET  /edit/{id}        edit form
//   POST /edit/{id}        apply edit
//   POST /complete/{id}    set/toggle completion
//   GET  /delete/{id}      delete one task
//   POST /delete_all       delete everything
//   POST /upload/{id}      multipart attachment upload
//   GET  /download/{id}    attachment retrieval
//   GET  /logout           external auth hand-off
//   GET  /health
//   GET  /api/tasks        JSON list
//   POST /api/bulk_add     JSON batch insert

pub mod pages;
pub mod routes;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::AppContext;

pub async fn start_web_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("taskd listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    // JSON API — CORS-enabled for external tooling
    let api = Router::new()
        .route("/api/tasks", get(routes::api::list_tasks))
        .route("/api/bulk_add", post(routes::api::bulk_add))
        .layer(CorsLayer::permissive());

    Router::new()
        // Health (no flash, no redirect)
        .route("/health", get(routes::health::health))
        // Pages
        .route("/", get(routes::home::index))
        .route("/add", post(routes::tasks::add))
        .route(
            "/edit/{id}",
            get(routes::tasks::edit_form).post(routes::tasks::edit),
        )
        .route("/complete/{id}", post(routes::tasks::complete))
        .route("/delete/{id}", get(routes::tasks::delete))
        .route("/delete_all", post(routes::tasks::delete_all))
        .route("/upload/{id}", post(routes::tasks::upload))
        .route("/download/{id}", get(routes::tasks::download))
        .route(
            "/logout",
            get(routes::tasks::logout).post(routes::tasks::logout),
        )
        .merge(api)
        .layer(DefaultBodyLimit::max(ctx.config.max_upload_bytes))
        .with_state(ctx)
}
