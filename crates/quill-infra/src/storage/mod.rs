//! File storage implementations.

mod disk;

pub use disk::{DiskImageStore, UploadConfig};
