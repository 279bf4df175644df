use actix_web::HttpResponse;

/// Liveness probe. Touches neither store nor token state.
pub async fn health_check() -> HttpResponse {
    tracing::debug!("Health check endpoint called");
    HttpResponse::Ok().finish()
}
