//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::domain::Category;
use quill_core::ports::{
    CategoryRepository, CommentRepository, ImageStore, PasswordService, PostRepository, RateLimiter,
    TokenService, UserRepository,
};
use quill_infra::{
    Argon2PasswordService, DiskImageStore, InMemoryCategoryRepository, InMemoryCommentRepository,
    InMemoryPostRepository, InMemoryUserRepository, JwtConfig, JwtTokenService, UploadConfig,
};

#[cfg(feature = "postgres")]
use quill_infra::{
    PostgresCategoryRepository, PostgresCommentRepository, PostgresPostRepository,
    PostgresUserRepository,
};
#[cfg(feature = "rate-limit")]
use quill_infra::{InMemoryRateLimiter, RateLimitConfig};

use crate::config::AppConfig;

/// The four repositories, either all in memory or all in PostgreSQL.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

impl Repositories {
    /// Empty in-memory repositories. Data is lost on restart.
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            posts: Arc::new(InMemoryPostRepository::new()),
            categories: Arc::new(InMemoryCategoryRepository::new()),
            comments: Arc::new(InMemoryCommentRepository::new()),
        }
    }

    /// In-memory repositories with the default categories in place, the way
    /// a migrated database starts out.
    pub async fn in_memory_seeded() -> Self {
        let repos = Self::in_memory();
        for category in Category::defaults() {
            if let Err(e) = repos.categories.create(category).await {
                tracing::warn!("Failed to seed category: {}", e);
            }
        }
        repos
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub images: Arc<dyn ImageStore>,
    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: usize,
    /// Applied to the `/api/auth` scope when present.
    pub rate_limiter: Option<Arc<dyn RateLimiter>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "postgres")]
        let repos = match &config.database {
            Some(db_config) => match quill_infra::database::connect(db_config).await {
                Ok(conn) => Repositories {
                    users: Arc::new(PostgresUserRepository::new(conn.clone())),
                    posts: Arc::new(PostgresPostRepository::new(conn.clone())),
                    categories: Arc::new(PostgresCategoryRepository::new(conn.clone())),
                    comments: Arc::new(PostgresCommentRepository::new(conn)),
                },
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                    Repositories::in_memory_seeded().await
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                Repositories::in_memory_seeded().await
            }
        };

        #[cfg(not(feature = "postgres"))]
        let repos = {
            tracing::info!("Running without postgres feature - using in-memory repositories");
            Repositories::in_memory_seeded().await
        };

        let state = Self::build(repos, config.jwt.clone(), &config.upload);

        #[cfg(feature = "rate-limit")]
        let state = Self {
            rate_limiter: build_rate_limiter(config.rate_limit.clone()),
            ..state
        };

        tracing::info!("Application state initialized");
        state
    }

    /// Assemble state around the given repositories, without rate limiting.
    pub fn build(repos: Repositories, jwt: JwtConfig, upload: &UploadConfig) -> Self {
        Self {
            users: repos.users,
            posts: repos.posts,
            categories: repos.categories,
            comments: repos.comments,
            tokens: Arc::new(JwtTokenService::new(jwt)),
            passwords: Arc::new(Argon2PasswordService::new()),
            images: Arc::new(DiskImageStore::new(upload)),
            max_upload_bytes: upload.max_bytes,
            rate_limiter: None,
        }
    }
}

#[cfg(feature = "rate-limit")]
fn build_rate_limiter(config: RateLimitConfig) -> Option<Arc<dyn RateLimiter>> {
    match InMemoryRateLimiter::new(config) {
        Ok(limiter) => Some(Arc::new(limiter)),
        Err(e) => {
            tracing::error!("Rate limiter disabled: {}", e);
            None
        }
    }
}
