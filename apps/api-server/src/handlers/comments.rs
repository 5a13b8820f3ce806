//! Comment handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::{Comment, NewComment};
use quill_shared::dto::{CommentEnvelope, CommentListResponse, CreateCommentRequest};

use super::presenter;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/comments/post/{post_id}
pub async fn list_by_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let comments = state.comments.list_by_post(path.into_inner()).await?;
    let authors = presenter::authors(&state, comments.iter().map(|c| c.author_id)).await?;

    Ok(HttpResponse::Ok().json(CommentListResponse {
        comments: comments
            .into_iter()
            .map(|c| {
                let author = authors.get(&c.author_id).cloned();
                presenter::comment(c, author)
            })
            .collect(),
    }))
}

/// POST /api/comments
pub async fn create(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if state.posts.find_by_id(req.post).await?.is_none() {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    if let Some(parent_id) = req.parent_comment {
        let parent = state.comments.find_by_id(parent_id).await?;
        if !parent.is_some_and(|p| p.post_id == req.post) {
            return Err(AppError::NotFound("Parent comment not found".to_string()));
        }
    }

    let comment = Comment::new(
        identity.user_id,
        NewComment {
            content: req.content,
            post_id: req.post,
            parent_id: req.parent_comment,
        },
    )?;
    let comment = state.comments.create(comment).await?;

    let mut authors = presenter::authors(&state, [comment.author_id]).await?;
    let author = authors.remove(&comment.author_id);

    Ok(HttpResponse::Created().json(CommentEnvelope {
        comment: presenter::comment(comment, author),
    }))
}
