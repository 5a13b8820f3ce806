//! Category handlers.

use actix_web::{HttpResponse, web};

use quill_core::domain::{Category, NewCategory};
use quill_core::error::RepoError;
use quill_shared::dto::{CategoryEnvelope, CategoryListResponse, CreateCategoryRequest};

use super::presenter;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const CATEGORY_EXISTS: &str = "Category already exists";

/// GET /api/categories
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let categories = state.categories.list().await?;

    Ok(HttpResponse::Ok().json(CategoryListResponse {
        categories: categories.into_iter().map(presenter::category).collect(),
    }))
}

/// POST /api/categories
pub async fn create(
    _identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<CreateCategoryRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let category = Category::new(NewCategory {
        name: req.name,
        description: req.description,
        color: req.color,
        icon: req.icon,
        is_active: req.is_active,
    })?;

    if state.categories.find_by_name(&category.name).await?.is_some() {
        return Err(AppError::BadRequest(CATEGORY_EXISTS.to_string()));
    }

    let category = state.categories.create(category).await.map_err(|e| match e {
        RepoError::Constraint(_) => AppError::BadRequest(CATEGORY_EXISTS.to_string()),
        other => other.into(),
    })?;

    Ok(HttpResponse::Created().json(CategoryEnvelope {
        category: presenter::category(category),
    }))
}
