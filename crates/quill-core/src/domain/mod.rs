//! Domain entities - the core business objects.

mod category;
mod comment;
mod post;
mod user;

pub mod text;

pub use category::{Category, DEFAULT_CATEGORIES, DEFAULT_COLOR, NewCategory};
pub use comment::{Comment, NewComment};
pub use post::{NewPost, Post, PostChanges, PostQuery, PostSort, PostStatus};
pub use user::{ProfileUpdate, SocialLinks, User, UserRole, normalize_email};
