//! # Quill Core
//!
//! The domain layer of the Quill blogging platform.
//! Entities, derived-field rules and the ports infrastructure must implement.
//! No infrastructure dependencies live here.

pub mod domain;
pub mod error;
pub mod ports;

pub use error::DomainError;
