//! Unit tests for kassert configuration.
//!
//! - [`helpers`] - Shared fixtures and helper functions
//! - [`types_tests`] - Defaults, serialisation and validation
//! - [`layer_precedence_tests`] - `MergeComposer` layer precedence
//! - [`loader_tests`] - Environment parsing and file loading

mod helpers;
mod layer_precedence_tests;
