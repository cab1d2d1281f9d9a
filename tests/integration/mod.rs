//! Integration tests for the file-share namespace engine

mod cancellation;
mod common;
mod directory_lifecycle;
mod file_lifecycle;
mod handles;
mod metadata;
mod snapshot;
