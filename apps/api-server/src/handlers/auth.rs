//! Authentication and profile handlers.

use actix_web::{HttpResponse, web};

use quill_core::domain::{ProfileUpdate, User, normalize_email};
use quill_core::error::RepoError;
use quill_shared::dto::{
    AuthResponse, LoginRequest, RegisterRequest, UpdateProfileRequest, UserEnvelope,
};

use super::presenter;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const USER_EXISTS: &str = "User already exists";

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if req.password.is_empty() {
        return Err(AppError::BadRequest("password is required".to_string()));
    }

    // Check if user already exists
    let email = normalize_email(&req.email);
    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest(USER_EXISTS.to_string()));
    }

    let password_hash = state.passwords.hash(&req.password)?;
    let user = User::new(&req.name, &email, password_hash)?;

    // The unique index catches a concurrent registration with the same email
    let user = state.users.create(user).await.map_err(|e| match e {
        RepoError::Constraint(_) => AppError::BadRequest(USER_EXISTS.to_string()),
        other => other.into(),
    })?;

    let token = state.tokens.generate_token(user.id, &user.email)?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok(HttpResponse::Created().json(AuthResponse {
        message: "User created successfully".to_string(),
        token,
        user: presenter::user(user),
    }))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let invalid = || AppError::BadRequest("Invalid credentials".to_string());

    let user = state
        .users
        .find_by_email(&normalize_email(&req.email))
        .await?
        .ok_or_else(invalid)?;

    if !state.passwords.verify(&req.password, &user.password_hash)? {
        return Err(invalid());
    }

    let token = state.tokens.generate_token(user.id, &user.email)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user: presenter::user(user),
    }))
}

/// GET /api/auth/profile
pub async fn profile(
    identity: Identity,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(UserEnvelope {
        user: presenter::user(user),
    }))
}

/// PUT /api/auth/profile
///
/// Only name, bio, website and social links can change here.
pub async fn update_profile(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<UpdateProfileRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let mut user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    user.apply_profile(ProfileUpdate {
        name: req.name,
        bio: req.bio,
        website: req.website,
        social_links: req.social_links.map(presenter::social_links_from_dto),
    })?;
    let user = state.users.update(user).await?;

    Ok(HttpResponse::Ok().json(UserEnvelope {
        user: presenter::user(user),
    }))
}
