// web/routes/api.rs — JSON API routes.

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use crate::tasks::model::BulkTaskEntry;
use crate::tasks::{TaskError, TaskFilter};
use crate::AppContext;

/// `GET /api/tasks` — all tasks as a JSON array.
pub async fn list_tasks(
    State(ctx): State<Arc<AppContext>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match ctx.tasks.list(TaskFilter::All).await {
        Ok(tasks) => {
            let list: Vec<Value> = tasks
                .iter()
                .map(|t| {
                    json!({
                        "id": t.id,
                        "name": t.name,
                        "due_date": t.due_date,
                        "complete": t.complete,
                    })
                })
                .collect();
            Ok(Json(Value::Array(list)))
        }
        Err(e) => {
            error!(err = %e, "failed to list tasks");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("Error when returning all tasks: {e}") })),
            ))
        }
    }
}

/// `POST /api/bulk_add` — insert a batch of tasks from a JSON array.
///
/// Each entry must carry `name` and `due_date`; `complete` defaults to false.
/// The batch is all-or-nothing.
pub async fn bulk_add(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let Some(items) = body.as_array() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid data format. Expected a list of tasks." })),
        );
    };

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let name = item["name"].as_str().unwrap_or("");
        let due_date = item["due_date"].as_str().unwrap_or("");
        let complete = item["complete"].as_bool().unwrap_or(false);

        if name.is_empty() || due_date.is_empty() {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": format!(
                        "Each task must have a name and due_date. The name was {} and due_date was {}.",
                        if name.is_empty() { "missing" } else { name },
                        if due_date.is_empty() { "missing" } else { due_date },
                    )
                })),
            );
        }
        entries.push(BulkTaskEntry {
            name: name.to_string(),
            due_date: due_date.to_string(),
            complete,
        });
    }

    match ctx.tasks.bulk_add(&entries).await {
        Ok(count) => (
            StatusCode::CREATED,
            Json(json!({ "message": "Tasks added successfully", "count": count })),
        ),
        Err(TaskError::Validation(msg)) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": msg })))
        }
        Err(e) => {
            error!(err = %e, "bulk insert failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "An error occurred while adding tasks." })),
            )
        }
    }
}
