// web/routes/home.rs — the task list view.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

use crate::tasks::TaskFilter;
use crate::web::pages;
use crate::AppContext;

#[derive(Deserialize)]
pub struct ListQuery {
    incomplete: Option<String>,
}

/// `GET /` — render the list, honoring `?incomplete=true`. Drains the flash
/// bag: pending messages display on this render and never again.
pub async fn index(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, (StatusCode, String)> {
    let show_incomplete = query
        .incomplete
        .as_deref()
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let filter = if show_incomplete {
        TaskFilter::Incomplete
    } else {
        TaskFilter::All
    };

    match ctx.tasks.list(filter).await {
        Ok(tasks) => {
            let flashes = ctx.flash.drain();
            Ok(Html(pages::index_page(&tasks, &flashes, show_incomplete)))
        }
        Err(e) => {
            error!(err = %e, "failed to query tasks");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {e}"),
            ))
        }
    }
}
