use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::text;
use crate::error::DomainError;

const TITLE_MAX: usize = 200;
const EXCERPT_MAX: usize = 500;
const CATEGORY_MAX: usize = 50;
const SEO_TITLE_MAX: usize = 60;
const SEO_DESCRIPTION_MAX: usize = 160;
const TAG_MAX: usize = 50;

/// Publication state of a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            "archived" => Ok(PostStatus::Archived),
            other => Err(DomainError::Validation(format!(
                "status must be one of draft, published, archived (got '{other}')"
            ))),
        }
    }
}

/// Post entity - a blog article with its derived fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub image: Option<String>,
    /// Category name. Matched by text, not by reference.
    pub category: String,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub featured: bool,
    pub views: i32,
    pub likes: i32,
    pub read_time: i32,
    pub published_at: Option<DateTime<Utc>>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a post.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub image: Option<String>,
    pub category: String,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub featured: bool,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

/// Changes to an existing post. `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<PostStatus>,
    pub featured: Option<bool>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

impl Post {
    /// Create a new post owned by `author_id`, computing slug, read time and
    /// publication date.
    pub fn new(author_id: Uuid, input: NewPost) -> Result<Self, DomainError> {
        let title = text::required("title", &input.title, TITLE_MAX)?;
        let content = required_content(&input.content)?;
        let now = Utc::now();

        let mut post = Self {
            id: Uuid::new_v4(),
            author_id,
            slug: text::slugify(&title),
            title,
            excerpt: text::optional("excerpt", input.excerpt, EXCERPT_MAX)?,
            read_time: text::read_time_minutes(&content),
            content,
            image: input.image.filter(|i| !i.trim().is_empty()),
            category: text::required("category", &input.category, CATEGORY_MAX)?,
            tags: normalize_tags(input.tags)?,
            status: input.status,
            featured: input.featured,
            views: 0,
            likes: 0,
            published_at: None,
            seo_title: text::optional("seoTitle", input.seo_title, SEO_TITLE_MAX)?,
            seo_description: text::optional(
                "seoDescription",
                input.seo_description,
                SEO_DESCRIPTION_MAX,
            )?,
            created_at: now,
            updated_at: now,
        };
        post.stamp_published(now);
        Ok(post)
    }

    /// Apply changes and refresh whatever derived fields they affect.
    pub fn apply(&mut self, changes: PostChanges) -> Result<(), DomainError> {
        let now = Utc::now();

        if let Some(title) = changes.title {
            let title = text::required("title", &title, TITLE_MAX)?;
            if title != self.title {
                self.slug = text::slugify(&title);
                self.title = title;
            }
        }
        if let Some(content) = changes.content {
            let content = required_content(&content)?;
            if content != self.content {
                self.read_time = text::read_time_minutes(&content);
                self.content = content;
            }
        }
        if changes.excerpt.is_some() {
            self.excerpt = text::optional("excerpt", changes.excerpt, EXCERPT_MAX)?;
        }
        if let Some(image) = changes.image {
            self.image = Some(image).filter(|i| !i.trim().is_empty());
        }
        if let Some(category) = changes.category {
            self.category = text::required("category", &category, CATEGORY_MAX)?;
        }
        if let Some(tags) = changes.tags {
            self.tags = normalize_tags(tags)?;
        }
        if let Some(featured) = changes.featured {
            self.featured = featured;
        }
        if changes.seo_title.is_some() {
            self.seo_title = text::optional("seoTitle", changes.seo_title, SEO_TITLE_MAX)?;
        }
        if changes.seo_description.is_some() {
            self.seo_description = text::optional(
                "seoDescription",
                changes.seo_description,
                SEO_DESCRIPTION_MAX,
            )?;
        }
        if let Some(status) = changes.status {
            self.status = status;
            self.stamp_published(now);
        }

        self.updated_at = now;
        Ok(())
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    // Set once; later status changes never move it.
    fn stamp_published(&mut self, now: DateTime<Utc>) {
        if self.status == PostStatus::Published && self.published_at.is_none() {
            self.published_at = Some(now);
        }
    }
}

fn required_content(content: &str) -> Result<String, DomainError> {
    if content.trim().is_empty() {
        return Err(DomainError::Validation("content is required".to_string()));
    }
    Ok(content.to_string())
}

/// Trim tags, dropping blanks and duplicates while keeping order.
fn normalize_tags(tags: Vec<String>) -> Result<Vec<String>, DomainError> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || out.iter().any(|t| t == tag) {
            continue;
        }
        if tag.chars().count() > TAG_MAX {
            return Err(DomainError::Validation(format!(
                "tags must be at most {TAG_MAX} characters"
            )));
        }
        out.push(tag.to_string());
    }
    Ok(out)
}

/// Ordering for post listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostSort {
    #[default]
    Newest,
    Oldest,
    /// Most viewed first. Same ordering as `Views`.
    Popular,
    Views,
}

impl PostSort {
    /// Unknown values fall back to newest-first.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("oldest") => PostSort::Oldest,
            Some("popular") => PostSort::Popular,
            Some("views") => PostSort::Views,
            _ => PostSort::Newest,
        }
    }

    pub fn by_views(&self) -> bool {
        matches!(self, PostSort::Popular | PostSort::Views)
    }
}

/// Filter and paging for the published-post listing.
#[derive(Debug, Clone)]
pub struct PostQuery {
    /// One-based page number.
    pub page: u64,
    pub limit: u64,
    pub category: Option<String>,
    pub author: Option<Uuid>,
    pub featured: bool,
    /// Case-insensitive substring over title, excerpt and category.
    pub search: Option<String>,
    pub sort: PostSort,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            category: None,
            author: None,
            featured: false,
            search: None,
            sort: PostSort::Newest,
        }
    }
}

impl PostQuery {
    pub const MAX_LIMIT: u64 = 100;
    /// Keeps `offset()` well inside a signed 64-bit SQL OFFSET.
    pub const MAX_PAGE: u64 = i32::MAX as u64;

    /// Clamp paging values into a usable range.
    pub fn normalized(mut self) -> Self {
        self.page = self.page.clamp(1, Self::MAX_PAGE);
        self.limit = self.limit.clamp(1, Self::MAX_LIMIT);
        self.search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self.category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && c != "all");
        self
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Whether a post passes the filter part of this query.
    pub fn matches(&self, post: &Post) -> bool {
        if !post.is_published() {
            return false;
        }
        if self.category.as_ref().is_some_and(|c| &post.category != c) {
            return false;
        }
        if self.author.is_some_and(|a| post.author_id != a) {
            return false;
        }
        if self.featured && !post.featured {
            return false;
        }
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            let hit = post.title.to_lowercase().contains(&needle)
                || post.category.to_lowercase().contains(&needle)
                || post
                    .excerpt
                    .as_deref()
                    .is_some_and(|e| e.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }

    /// Number of pages for `total` matching posts.
    pub fn pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(status: PostStatus) -> NewPost {
        NewPost {
            title: "Hello, World!!".to_string(),
            content: "<p>Just a few words</p>".to_string(),
            category: "Technology".to_string(),
            status,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_post_derives_fields() {
        let author = Uuid::new_v4();
        let post = Post::new(author, sample(PostStatus::Draft)).unwrap();

        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.read_time, 1);
        assert_eq!(post.views, 0);
        assert!(post.published_at.is_none());
        assert!(post.is_owned_by(author));
    }

    #[test]
    fn test_new_published_post_is_stamped() {
        let post = Post::new(Uuid::new_v4(), sample(PostStatus::Published)).unwrap();
        assert!(post.published_at.is_some());
    }

    #[test]
    fn test_new_post_requires_fields() {
        let mut input = sample(PostStatus::Draft);
        input.title = "   ".into();
        assert!(matches!(
            Post::new(Uuid::new_v4(), input),
            Err(DomainError::Validation(_))
        ));

        let mut input = sample(PostStatus::Draft);
        input.category = String::new();
        assert!(Post::new(Uuid::new_v4(), input).is_err());

        let mut input = sample(PostStatus::Draft);
        input.seo_title = Some("x".repeat(61));
        assert!(Post::new(Uuid::new_v4(), input).is_err());
    }

    #[test]
    fn test_published_at_is_set_once() {
        let mut post = Post::new(Uuid::new_v4(), sample(PostStatus::Draft)).unwrap();
        post.apply(PostChanges {
            status: Some(PostStatus::Published),
            ..Default::default()
        })
        .unwrap();
        let first = post.published_at.expect("stamped on publish");

        post.apply(PostChanges {
            title: Some("A Better Title".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(post.published_at, Some(first));
        assert_eq!(post.slug, "a-better-title");

        post.apply(PostChanges {
            status: Some(PostStatus::Archived),
            ..Default::default()
        })
        .unwrap();
        post.apply(PostChanges {
            status: Some(PostStatus::Published),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(post.published_at, Some(first));
    }

    #[test]
    fn test_content_change_recomputes_read_time() {
        let mut post = Post::new(Uuid::new_v4(), sample(PostStatus::Draft)).unwrap();
        assert_eq!(post.read_time, 1);

        post.apply(PostChanges {
            content: Some(vec!["word"; 1000].join(" ")),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(post.read_time, 5);
    }

    #[test]
    fn test_tags_are_trimmed_and_deduplicated() {
        let mut input = sample(PostStatus::Draft);
        input.tags = vec![" rust ".into(), "".into(), "web".into(), "rust".into()];
        let post = Post::new(Uuid::new_v4(), input).unwrap();
        assert_eq!(post.tags, vec!["rust".to_string(), "web".to_string()]);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("published".parse::<PostStatus>().unwrap(), PostStatus::Published);
        assert!("live".parse::<PostStatus>().is_err());
    }

    #[test]
    fn test_sort_parse_and_view_ordering() {
        assert_eq!(PostSort::parse(None), PostSort::Newest);
        assert_eq!(PostSort::parse(Some("bogus")), PostSort::Newest);
        assert!(PostSort::parse(Some("popular")).by_views());
        assert!(PostSort::parse(Some("views")).by_views());
        assert!(!PostSort::parse(Some("oldest")).by_views());
    }

    #[test]
    fn test_query_matching() {
        let mut post = Post::new(Uuid::new_v4(), sample(PostStatus::Published)).unwrap();
        post.excerpt = Some("Systems programming notes".into());

        let query = PostQuery {
            search: Some("SYSTEMS".into()),
            ..Default::default()
        }
        .normalized();
        assert!(query.matches(&post));

        let query = PostQuery {
            category: Some("Travel".into()),
            ..Default::default()
        }
        .normalized();
        assert!(!query.matches(&post));

        let query = PostQuery {
            featured: true,
            ..Default::default()
        };
        assert!(!query.matches(&post));

        post.status = PostStatus::Draft;
        assert!(!PostQuery::default().matches(&post));
    }

    #[test]
    fn test_query_paging() {
        let query = PostQuery {
            page: 0,
            limit: 1000,
            category: Some("all".into()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, PostQuery::MAX_LIMIT);
        assert_eq!(query.category, None);

        let query = PostQuery {
            page: 3,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(query.offset(), 20);
        assert_eq!(query.pages(21), 3);
        assert_eq!(query.pages(0), 0);
    }

    #[test]
    fn test_huge_page_is_capped() {
        let query = PostQuery {
            page: u64::MAX,
            limit: u64::MAX,
            ..Default::default()
        }
        .normalized();

        assert_eq!(query.page, PostQuery::MAX_PAGE);
        assert_eq!(query.offset(), (PostQuery::MAX_PAGE - 1) * PostQuery::MAX_LIMIT);
        assert!(i64::try_from(query.offset()).is_ok());
    }
}
