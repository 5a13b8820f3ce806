//! Post handlers.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::{NewPost, Post, PostChanges, PostQuery, PostSort, PostStatus};
use quill_core::error::RepoError;
use quill_shared::MessageResponse;
use quill_shared::dto::{PostEnvelope, PostListQuery, PostListResponse, UpdatePostRequest};

use super::multipart::{self, IMAGE_FIELD, MultipartForm};
use super::presenter;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn post_not_found() -> AppError {
    AppError::NotFound("Post not found".to_string())
}

fn slug_taken(err: RepoError) -> AppError {
    match err {
        RepoError::Constraint(_) => {
            AppError::BadRequest("A post with this title already exists".to_string())
        }
        other => other.into(),
    }
}

/// Load a post and check that `identity` wrote it.
async fn owned_post(state: &AppState, id: Uuid, identity: &Identity) -> AppResult<Post> {
    let post = state.posts.find_by_id(id).await?.ok_or_else(post_not_found)?;

    if !post.is_owned_by(identity.user_id) {
        tracing::warn!(post_id = %id, user_id = %identity.user_id, "Rejected change to foreign post");
        return Err(AppError::Forbidden("Not authorized".to_string()));
    }

    Ok(post)
}

fn to_query(q: PostListQuery) -> PostQuery {
    let defaults = PostQuery::default();
    PostQuery {
        page: q.page.unwrap_or(defaults.page),
        limit: q.limit.unwrap_or(defaults.limit),
        category: q.category,
        author: q.author,
        featured: q.featured.as_deref().is_some_and(multipart::truthy),
        search: q.search,
        sort: PostSort::parse(q.sort.as_deref()),
    }
    .normalized()
}

/// GET /api/posts
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<PostListQuery>,
) -> AppResult<HttpResponse> {
    let query = to_query(query.into_inner());
    let page = state.posts.list(&query).await?;

    let authors = presenter::authors(&state, page.posts.iter().map(|p| p.author_id)).await?;
    let posts = page
        .posts
        .into_iter()
        .map(|p| {
            let author = authors.get(&p.author_id).cloned();
            presenter::post(p, author)
        })
        .collect();

    Ok(HttpResponse::Ok().json(PostListResponse {
        posts,
        total: page.total,
        page: query.page,
        pages: query.pages(page.total),
    }))
}

/// GET /api/posts/{id}
///
/// Every successful fetch counts as one view.
pub async fn get(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .increment_views(path.into_inner())
        .await?
        .ok_or_else(post_not_found)?;

    Ok(HttpResponse::Ok().json(PostEnvelope {
        post: presenter::post_with_author(&state, post).await?,
    }))
}

fn new_post(form: &MultipartForm) -> AppResult<NewPost> {
    let text = |name: &str| form.text(name).map(String::from);

    let status = match form.text("status").filter(|s| !s.trim().is_empty()) {
        Some(s) => s.parse::<PostStatus>()?,
        None => PostStatus::default(),
    };

    Ok(NewPost {
        title: text("title").unwrap_or_default(),
        excerpt: text("excerpt"),
        content: text("content").unwrap_or_default(),
        image: None,
        category: text("category").unwrap_or_default(),
        tags: multipart::split_list(form.all("tags").chain(form.all("tags[]"))),
        status,
        featured: form.text("featured").is_some_and(multipart::truthy),
        seo_title: text("seoTitle"),
        seo_description: text("seoDescription"),
    })
}

/// POST /api/posts (multipart, optional `image` file)
pub async fn create(
    identity: Identity,
    state: web::Data<AppState>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let form = multipart::read_form(payload, state.max_upload_bytes).await?;

    // Validate before touching the disk so a rejected post leaves no file
    let mut post = Post::new(identity.user_id, new_post(&form)?)?;

    if let Some(image) = &form.image {
        let stored = state
            .images
            .store(image.file_name.as_deref(), &image.bytes)
            .await?;
        post.image = Some(stored.path);
    } else if let Some(path) = form.text(IMAGE_FIELD).filter(|p| !p.trim().is_empty()) {
        // A previously uploaded image referenced by path
        post.image = Some(path.trim().to_string());
    }

    let post = state.posts.create(post).await.map_err(slug_taken)?;
    tracing::info!(post_id = %post.id, author_id = %identity.user_id, "Post created");

    Ok(HttpResponse::Created().json(PostEnvelope {
        post: presenter::post_with_author(&state, post).await?,
    }))
}

/// PUT /api/posts/{id}
pub async fn update(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let mut post = owned_post(&state, path.into_inner(), &identity).await?;
    let req = body.into_inner();

    let status = req
        .status
        .as_deref()
        .map(str::parse::<PostStatus>)
        .transpose()?;

    post.apply(PostChanges {
        title: req.title,
        excerpt: req.excerpt,
        content: req.content,
        image: req.image,
        category: req.category,
        tags: req.tags,
        status,
        featured: req.featured,
        seo_title: req.seo_title,
        seo_description: req.seo_description,
    })?;

    let post = state.posts.update(post).await.map_err(slug_taken)?;

    Ok(HttpResponse::Ok().json(PostEnvelope {
        post: presenter::post_with_author(&state, post).await?,
    }))
}

/// DELETE /api/posts/{id}
///
/// Comments on the post are left in place.
pub async fn delete(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = owned_post(&state, path.into_inner(), &identity).await?;
    state.posts.delete(post.id).await?;
    tracing::info!(post_id = %post.id, "Post deleted");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Post deleted successfully")))
}
