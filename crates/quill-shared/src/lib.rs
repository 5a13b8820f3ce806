//! # Quill Shared
//!
//! Wire types shared by the API server and the client.
//! Every JSON field is camelCase on the wire.

pub mod dto;
pub mod response;

pub use response::{ErrorResponse, MessageResponse};
