//! Cache keys for API queries.
//!
//! Keys are plain strings grouped by prefix so a mutation can drop a whole
//! family at once.

use uuid::Uuid;

use quill_shared::dto::PostListQuery;

/// Prefix shared by every post listing key.
pub const POST_LISTS: &str = "posts:list:";

pub const CATEGORIES: &str = "categories";

/// Key for one post listing: every filter, sort and paging value takes part.
pub fn post_list(query: &PostListQuery) -> String {
    let mut key = String::from(POST_LISTS);
    let parts = [
        ("search", query.search.clone()),
        ("category", query.category.clone()),
        ("sort", query.sort.clone()),
        ("page", query.page.map(|p| p.to_string())),
        ("limit", query.limit.map(|l| l.to_string())),
        ("author", query.author.map(|a| a.to_string())),
        ("featured", query.featured.clone()),
    ];
    for (name, value) in parts {
        key.push_str(name);
        key.push('=');
        key.push_str(value.as_deref().unwrap_or(""));
        key.push(';');
    }
    key
}

pub fn post_detail(id: Uuid) -> String {
    format!("posts:detail:{id}")
}

pub fn comments(post_id: Uuid) -> String {
    format!("comments:post:{post_id}")
}
