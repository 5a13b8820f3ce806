//! Domain entity to wire DTO conversions.

use std::collections::HashMap;

use uuid::Uuid;

use quill_core::domain::{Category, Comment, Post, SocialLinks, User};
use quill_shared::dto::{
    AuthorSummary, CategoryResponse, CommentResponse, PostResponse, SocialLinksDto, UserResponse,
};

use crate::middleware::error::AppResult;
use crate::state::AppState;

pub fn social_links(links: SocialLinks) -> SocialLinksDto {
    SocialLinksDto {
        twitter: links.twitter,
        github: links.github,
        linkedin: links.linkedin,
        facebook: links.facebook,
        instagram: links.instagram,
    }
}

pub fn social_links_from_dto(dto: SocialLinksDto) -> SocialLinks {
    SocialLinks {
        twitter: dto.twitter,
        github: dto.github,
        linkedin: dto.linkedin,
        facebook: dto.facebook,
        instagram: dto.instagram,
    }
}

/// Public view of a user. The password hash never leaves this crate.
pub fn user(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role.to_string(),
        bio: user.bio,
        website: user.website,
        social_links: social_links(user.social_links),
        created_at: user.created_at,
    }
}

pub fn author(user: &User) -> AuthorSummary {
    AuthorSummary {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        bio: user.bio.clone(),
    }
}

/// Author summaries for a batch of author ids, keyed by id.
/// Ids without a matching user are simply absent.
pub async fn authors(
    state: &AppState,
    ids: impl IntoIterator<Item = Uuid>,
) -> AppResult<HashMap<Uuid, AuthorSummary>> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();

    let users = state.users.find_by_ids(&ids).await?;
    Ok(users.iter().map(|u| (u.id, author(u))).collect())
}

pub fn post(post: Post, author: Option<AuthorSummary>) -> PostResponse {
    PostResponse {
        id: post.id,
        title: post.title,
        slug: post.slug,
        excerpt: post.excerpt,
        content: post.content,
        image: post.image,
        category: post.category,
        tags: post.tags,
        author,
        status: post.status.to_string(),
        featured: post.featured,
        views: post.views,
        likes: post.likes,
        read_time: post.read_time,
        published_at: post.published_at,
        seo_title: post.seo_title,
        seo_description: post.seo_description,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

/// Load the author of a single post and render it.
pub async fn post_with_author(state: &AppState, p: Post) -> AppResult<PostResponse> {
    let mut authors = authors(state, [p.author_id]).await?;
    let summary = authors.remove(&p.author_id);
    Ok(post(p, summary))
}

pub fn category(category: Category) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        name: category.name,
        slug: category.slug,
        description: category.description,
        color: category.color,
        icon: category.icon,
        is_active: category.is_active,
        post_count: category.post_count,
        created_at: category.created_at,
    }
}

pub fn comment(comment: Comment, author: Option<AuthorSummary>) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        content: comment.content,
        post: comment.post_id,
        author,
        parent_comment: comment.parent_id,
        likes: comment.likes,
        is_approved: comment.is_approved,
        is_edited: comment.is_edited,
        edited_at: comment.edited_at,
        created_at: comment.created_at,
    }
}
