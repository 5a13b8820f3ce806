//! # Quill Client
//!
//! Typed access to the Quill REST API for front ends and tools: every
//! endpoint as a method, a query-keyed response cache, and client-local
//! like/bookmark state.

mod client;
mod error;
mod interactions;

pub mod keys;

pub use client::{BlogClient, ImageUpload, NewPostForm};
pub use error::{ClientError, ClientResult};
pub use interactions::PostInteractions;
