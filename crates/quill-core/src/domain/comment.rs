use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::text;
use crate::error::DomainError;

const CONTENT_MAX: usize = 1000;

/// Comment entity. Replies point at their parent through `parent_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub likes: i32,
    /// Defaults to true; nothing moderates comments yet.
    pub is_approved: bool,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
}

impl Comment {
    pub fn new(author_id: Uuid, input: NewComment) -> Result<Self, DomainError> {
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            content: text::required("content", &input.content, CONTENT_MAX)?,
            post_id: input.post_id,
            author_id,
            parent_id: input.parent_id,
            likes: 0,
            is_approved: true,
            is_edited: false,
            edited_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_comment() {
        let post_id = Uuid::new_v4();
        let parent = Uuid::new_v4();
        let comment = Comment::new(
            Uuid::new_v4(),
            NewComment {
                content: "  Great read!  ".into(),
                post_id,
                parent_id: Some(parent),
            },
        )
        .unwrap();

        assert_eq!(comment.content, "Great read!");
        assert_eq!(comment.post_id, post_id);
        assert!(comment.is_approved);
        assert!(!comment.is_edited);
        assert!(comment.is_reply());
    }

    #[test]
    fn test_comment_length_limits() {
        let input = |content: String| NewComment {
            content,
            post_id: Uuid::new_v4(),
            parent_id: None,
        };
        assert!(Comment::new(Uuid::new_v4(), input(" ".into())).is_err());
        assert!(Comment::new(Uuid::new_v4(), input("a".repeat(1001))).is_err());
        assert!(Comment::new(Uuid::new_v4(), input("a".repeat(1000))).is_ok());
    }
}
