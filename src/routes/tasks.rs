/// Task Routes
///
/// Every handler runs behind the gatekeeper and only ever touches tasks
/// owned by the authenticated account. A task owned by someone else is
/// reported exactly like a missing one.

use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::auth::Identity;
use crate::error::AppError;
use crate::models::{NewTask, TaskQuery, TaskUpdate};
use crate::store::TaskStore;
use crate::validators::{validate_new_task, validate_task_query, validate_task_update};

fn task_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Task with ID {} not found", id))
}

/// POST /tasks
pub async fn create_task(
    identity: web::ReqData<Identity>,
    form: web::Json<NewTask>,
    tasks: web::Data<dyn TaskStore>,
) -> Result<HttpResponse, AppError> {
    let new_task = validate_new_task(form.into_inner())?;
    let task = tasks.create(identity.account_id, new_task).await?;

    tracing::info!(
        account_id = %identity.account_id,
        task_id = %task.id,
        "Task created"
    );

    Ok(HttpResponse::Created().json(task))
}

/// GET /tasks
///
/// Filters: `completed`, `priority`, `search` (case-insensitive, title),
/// `limit` (1..=100, default 50), `offset`. Newest first.
pub async fn list_tasks(
    identity: web::ReqData<Identity>,
    query: web::Query<TaskQuery>,
    tasks: web::Data<dyn TaskStore>,
) -> Result<HttpResponse, AppError> {
    let query = validate_task_query(query.into_inner())?;
    let found = tasks.list(identity.account_id, &query).await?;
    Ok(HttpResponse::Ok().json(found))
}

/// GET /tasks/{id}
pub async fn get_task(
    identity: web::ReqData<Identity>,
    path: web::Path<Uuid>,
    tasks: web::Data<dyn TaskStore>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let task = tasks
        .get(identity.account_id, id)
        .await?
        .ok_or_else(|| task_not_found(id))?;
    Ok(HttpResponse::Ok().json(task))
}

/// PATCH /tasks/{id}
pub async fn update_task(
    identity: web::ReqData<Identity>,
    path: web::Path<Uuid>,
    form: web::Json<TaskUpdate>,
    tasks: web::Data<dyn TaskStore>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let update = validate_task_update(form.into_inner())?;
    let task = tasks
        .update(identity.account_id, id, update)
        .await?
        .ok_or_else(|| task_not_found(id))?;

    tracing::info!(account_id = %identity.account_id, task_id = %id, "Task updated");
    Ok(HttpResponse::Ok().json(task))
}

/// DELETE /tasks/{id}
pub async fn delete_task(
    identity: web::ReqData<Identity>,
    path: web::Path<Uuid>,
    tasks: web::Data<dyn TaskStore>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    if !tasks.delete(identity.account_id, id).await? {
        return Err(task_not_found(id));
    }

    tracing::info!(account_id = %identity.account_id, task_id = %id, "Task deleted");
    Ok(HttpResponse::NoContent().finish())
}
