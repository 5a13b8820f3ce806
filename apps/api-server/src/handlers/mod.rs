//! HTTP handlers and route configuration.

mod auth;
mod categories;
mod comments;
mod health;
mod multipart;
mod posts;
mod presenter;
mod upload;

#[cfg(test)]
mod tests;

use actix_web::web;

use crate::middleware::rate_limit::RateLimitMiddleware;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(
                web::scope("/auth")
                    .wrap(RateLimitMiddleware)
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/profile", web::get().to(auth::profile))
                    .route("/profile", web::put().to(auth::update_profile)),
            )
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list))
                    .route("", web::post().to(posts::create))
                    .route("/{id}", web::get().to(posts::get))
                    .route("/{id}", web::put().to(posts::update))
                    .route("/{id}", web::delete().to(posts::delete)),
            )
            .service(
                web::scope("/categories")
                    .route("", web::get().to(categories::list))
                    .route("", web::post().to(categories::create)),
            )
            .service(
                web::scope("/comments")
                    .route("", web::post().to(comments::create))
                    .route("/post/{post_id}", web::get().to(comments::list_by_post)),
            )
            .route("/upload/image", web::post().to(upload::upload_image)),
    );
}
