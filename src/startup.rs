use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{AuthService, TokenIssuer};
use crate::configuration::{CookieSettings, JwtSettings};
use crate::error::{json_error_handler, path_error_handler, query_error_handler};
use crate::logger::LoggerMiddleware;
use crate::middleware::{Gatekeeper, RefreshGuard};
use crate::routes::{
    change_password, create_task, current_user, delete_task, get_account, get_task, health_check,
    list_tasks, login, logout, refresh, register, session, update_task,
};
use crate::store::{AccountStore, TaskStore};

/// Build the HTTP server on an already bound listener.
///
/// Stores are injected so the same wiring serves PostgreSQL in production
/// and in-memory stores in tests.
pub fn run(
    listener: TcpListener,
    accounts: Arc<dyn AccountStore>,
    tasks: Arc<dyn TaskStore>,
    jwt_config: JwtSettings,
    cookie_config: CookieSettings,
) -> Result<Server, std::io::Error> {
    let issuer = TokenIssuer::new(&jwt_config);
    let auth = web::Data::new(AuthService::new(accounts, issuer.clone()));
    let tasks: web::Data<dyn TaskStore> = web::Data::from(tasks);
    let cookies = web::Data::new(cookie_config);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(LoggerMiddleware)
            .wrap(Logger::default())

            // Shared state
            .app_data(auth.clone())
            .app_data(tasks.clone())
            .app_data(cookies.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))
            .route("/auth/logout", web::post().to(logout))
            .service(
                web::resource("/auth/session")
                    .wrap(Gatekeeper::public(issuer.clone()))
                    .route(web::get().to(session)),
            )

            // Refresh guard
            .service(
                web::resource("/auth/refresh")
                    .wrap(RefreshGuard::new(issuer.clone()))
                    .route(web::post().to(refresh)),
            )

            // Protected routes
            .service(
                web::resource("/auth/current-user")
                    .wrap(Gatekeeper::protected(issuer.clone()))
                    .route(web::get().to(current_user)),
            )
            .service(
                web::resource("/auth/password")
                    .wrap(Gatekeeper::protected(issuer.clone()))
                    .route(web::patch().to(change_password)),
            )
            .service(
                web::resource("/users/{id}")
                    .wrap(Gatekeeper::protected(issuer.clone()))
                    .route(web::get().to(get_account)),
            )
            .service(
                web::scope("/tasks")
                    .wrap(Gatekeeper::protected(issuer.clone()))
                    .route("", web::post().to(create_task))
                    .route("", web::get().to(list_tasks))
                    .route("/{id}", web::get().to(get_task))
                    .route("/{id}", web::patch().to(update_task))
                    .route("/{id}", web::delete().to(delete_task)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
