use actix_web::dev::Server;
use actix_web::{guard, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::AuthService;
use crate::configuration::AuthSettings;
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{health_check, login, refresh, register, revoke, update_user};
use crate::store::AuthStore;

pub fn run(
    listener: TcpListener,
    store: Arc<dyn AuthStore>,
    auth_config: AuthSettings,
) -> Result<Server, std::io::Error> {
    let auth_service = AuthService::new(store, auth_config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    let auth_service = web::Data::new(auth_service);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(LoggerMiddleware)
            .app_data(auth_service.clone())
            .route("/admin/healthz", web::get().to(health_check))
            .route("/api/login", web::post().to(login))
            .route("/api/refresh", web::post().to(refresh))
            .route("/api/revoke", web::post().to(revoke))
            // Protected: credential updates require a valid access token
            .service(
                web::resource("/api/users")
                    .guard(guard::Put())
                    .wrap(JwtMiddleware::new(auth_service.clone()))
                    .route(web::put().to(update_user)),
            )
            .service(web::resource("/api/users").route(web::post().to(register)))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
