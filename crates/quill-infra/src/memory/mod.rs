//! In-memory repositories, used when no database is configured and in tests.

mod base;
mod repos;

pub use base::{InMemoryRepository, Record};
pub use repos::{
    InMemoryCategoryRepository, InMemoryCommentRepository, InMemoryPostRepository,
    InMemoryUserRepository,
};
