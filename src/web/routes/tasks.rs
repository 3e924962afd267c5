// web/routes/tasks.rs — task mutation routes.
//
// Every mutation pushes a flash message and redirects back to the list view
// (post/redirect/get). Only `GET /download/{id}` answers with a body.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::attachments::sanitize_file_name;
use crate::tasks::model::{CreateTaskParams, UpdateTaskParams};
use crate::tasks::TaskError;
use crate::web::pages;
use crate::AppContext;

fn back_home() -> Redirect {
    Redirect::to("/")
}

// ─── Add ─────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AddTaskForm {
    pub task: String,
    pub due_date: String,
}

/// `POST /add` — create a task from the list-view form.
pub async fn add(State(ctx): State<Arc<AppContext>>, Form(form): Form<AddTaskForm>) -> Redirect {
    let params = CreateTaskParams {
        name: form.task,
        due_date: form.due_date,
    };
    match ctx.tasks.add(params).await {
        Ok(task) => {
            info!(id = task.id, "task added");
            ctx.flash.success("Task added successfully");
        }
        Err(TaskError::Validation(msg)) => ctx.flash.error(msg),
        Err(e) => {
            error!(err = %e, "failed to add task");
            ctx.flash.error("Error in adding task");
        }
    }
    back_home()
}

// ─── Edit ────────────────────────────────────────────────────────────────────

/// `GET /edit/{id}` — render the edit form.
pub async fn edit_form(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
) -> Result<Html<String>, Redirect> {
    match ctx.tasks.get(id).await {
        Ok(task) => Ok(Html(pages::edit_page(&task))),
        Err(TaskError::NotFound(_)) => {
            ctx.flash.error("Task not found");
            Err(back_home())
        }
        Err(e) => {
            error!(err = %e, id, "failed to load task for edit");
            ctx.flash.error("Error loading task");
            Err(back_home())
        }
    }
}

#[derive(Deserialize)]
pub struct EditTaskForm {
    pub task: String,
    pub due_date: Option<String>,
}

/// `POST /edit/{id}` — apply the edit.
pub async fn edit(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    Form(form): Form<EditTaskForm>,
) -> Redirect {
    let params = UpdateTaskParams {
        name: Some(form.task),
        due_date: form.due_date.filter(|d| !d.is_empty()),
    };
    match ctx.tasks.update(id, params).await {
        Ok(_) => ctx.flash.success("Task updated"),
        Err(TaskError::NotFound(_)) => ctx.flash.error("Task not found"),
        Err(TaskError::Validation(msg)) => ctx.flash.error(msg),
        Err(e) => {
            error!(err = %e, id, "failed to update task");
            ctx.flash.error("Error updating task");
        }
    }
    back_home()
}

// ─── Complete ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CompleteForm {
    /// Target state. Absent means toggle the current state.
    pub complete: Option<String>,
}

/// `POST /complete/{id}` — set or toggle the completion flag.
pub async fn complete(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    Form(form): Form<CompleteForm>,
) -> Redirect {
    let result = match form.complete.as_deref() {
        Some(value) => {
            let target = matches!(value, "true" | "on" | "1");
            ctx.tasks.set_complete(id, target).await
        }
        None => match ctx.tasks.get(id).await {
            Ok(task) => ctx.tasks.set_complete(id, !task.complete).await,
            Err(e) => Err(e),
        },
    };
    match result {
        Ok(_) => ctx.flash.success("Task completion status updated"),
        Err(TaskError::NotFound(_)) => ctx.flash.error("Task not found"),
        Err(e) => {
            error!(err = %e, id, "failed to set completion");
            ctx.flash.error("Error completing task");
        }
    }
    back_home()
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `GET /delete/{id}` — remove one task and its attachment.
pub async fn delete(State(ctx): State<Arc<AppContext>>, Path(id): Path<i64>) -> Redirect {
    match ctx.tasks.get(id).await {
        Ok(task) => {
            if task.file_name.is_some() {
                if let Err(e) = ctx.attachments.remove(id).await {
                    error!(err = %e, id, "failed to delete attachment");
                    ctx.flash.error("Error deleting attached file");
                    return back_home();
                }
            }
            match ctx.tasks.delete(id).await {
                Ok(()) => {
                    info!(id, "task deleted");
                    ctx.flash.danger("Task deleted successfully");
                }
                Err(e) => {
                    error!(err = %e, id, "failed to delete task");
                    ctx.flash.error("Error deleting task");
                }
            }
        }
        Err(TaskError::NotFound(_)) => ctx.flash.error("Task not found"),
        Err(e) => {
            error!(err = %e, id, "failed to load task for delete");
            ctx.flash.error("Error deleting task");
        }
    }
    back_home()
}

/// `POST /delete_all` — clear the whole collection and every attachment.
pub async fn delete_all(State(ctx): State<Arc<AppContext>>) -> Redirect {
    if let Err(e) = ctx.attachments.remove_all().await {
        error!(err = %e, "failed to delete attachments");
        ctx.flash.error("Error deleting all tasks");
        return back_home();
    }
    match ctx.tasks.delete_all().await {
        Ok(removed) => {
            info!(removed, "all tasks deleted");
            ctx.flash.danger("All tasks deleted successfully");
        }
        Err(e) => {
            error!(err = %e, "failed to delete all tasks");
            ctx.flash.error("Error deleting all tasks");
        }
    }
    back_home()
}

// ─── Attachments ─────────────────────────────────────────────────────────────

/// `POST /upload/{id}` — store a multipart file upload for a task,
/// replacing any prior attachment.
pub async fn upload(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Redirect {
    let task = match ctx.tasks.get(id).await {
        Ok(task) => task,
        Err(TaskError::NotFound(_)) => {
            ctx.flash.error("Task not found");
            return back_home();
        }
        Err(e) => {
            error!(err = %e, id, "failed to load task for upload");
            ctx.flash.error("Error uploading file");
            return back_home();
        }
    };

    // Find the "file" part.
    let mut upload: Option<(String, Vec<u8>)> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("file") {
                    continue;
                }
                let file_name = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => {
                        upload = Some((file_name, bytes.to_vec()));
                        break;
                    }
                    Err(e) => {
                        error!(err = %e, id, "failed to read upload body");
                        ctx.flash.error("Error uploading file");
                        return back_home();
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                error!(err = %e, id, "malformed multipart request");
                ctx.flash.error("Error uploading file");
                return back_home();
            }
        }
    }

    let Some((file_name, bytes)) = upload else {
        ctx.flash.error("No file part");
        return back_home();
    };
    if file_name.is_empty() {
        ctx.flash.error("No selected file");
        return back_home();
    }
    let file_name = match sanitize_file_name(&file_name) {
        Ok(name) => name.to_string(),
        Err(e) => {
            ctx.flash.error(e.to_string());
            return back_home();
        }
    };

    if task.file_name.is_some() {
        ctx.flash.danger("File overwritten");
    }

    let stored = async {
        ctx.attachments.save(id, &file_name, &bytes).await?;
        ctx.tasks.set_file_name(id, Some(&file_name)).await
    }
    .await;

    match stored {
        Ok(()) => {
            info!(id, file = %file_name, size = bytes.len(), "attachment stored");
            ctx.flash.success("File uploaded successfully");
        }
        Err(e) => {
            error!(err = %e, id, "failed to store attachment");
            ctx.flash.error("Error uploading file");
        }
    }
    back_home()
}

/// `GET /download/{id}` — return the stored attachment bytes with the
/// original filename.
pub async fn download(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
) -> Result<Response, (StatusCode, String)> {
    let not_found = || {
        (
            StatusCode::NOT_FOUND,
            "Task or file not found".to_string(),
        )
    };

    let task = match ctx.tasks.get(id).await {
        Ok(task) => task,
        Err(TaskError::NotFound(_)) => return Err(not_found()),
        Err(e) => {
            error!(err = %e, id, "failed to load task for download");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error downloading file: {e}"),
            ));
        }
    };
    let Some(file_name) = task.file_name else {
        return Err(not_found());
    };

    match ctx.attachments.load(id, &file_name).await {
        Ok(bytes) => Ok((
            [
                (
                    header::CONTENT_TYPE,
                    "application/octet-stream".to_string(),
                ),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{file_name}\""),
                ),
            ],
            bytes,
        )
            .into_response()),
        Err(TaskError::AttachmentMissing(_)) => Err(not_found()),
        Err(e) => {
            error!(err = %e, id, "failed to read attachment");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error downloading file: {e}"),
            ))
        }
    }
}

// ─── Logout ──────────────────────────────────────────────────────────────────

/// `GET|POST /logout` — hand-off point for the external auth collaborator.
pub async fn logout() -> Redirect {
    back_home()
}
