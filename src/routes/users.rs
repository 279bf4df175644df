use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::auth::{AuthService, Identity};
use crate::error::AppError;
use crate::store::AccountStore;

/// GET /users/{id}
///
/// Public profile of any account for an authenticated caller. The credential
/// is never part of the response.
///
/// # Errors
/// - 400: `id` is not a UUID
/// - 404: no such account
pub async fn get_account(
    identity: web::ReqData<Identity>,
    path: web::Path<Uuid>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let account = auth
        .credentials()
        .accounts()
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Account with ID {} not found", id)))?;

    tracing::debug!(account_id = %identity.account_id, target_id = %id, "Account looked up");
    Ok(HttpResponse::Ok().json(account))
}
