//! Declarative, retried test operations against Kubernetes-style stores.
//!
//! `kassert` runs test steps that describe a desired resource state rather
//! than a sequence of calls. A step is retried once per second until its
//! expectations hold or its deadline passes, so eventual consistency in the
//! store under test is absorbed by the engine instead of by sleeps in the
//! test.
//!
//! # Architecture
//!
//! Steps share nothing but an immutable [`bindings::Bindings`] chain. Each
//! step may read earlier outputs through `$name` placeholders in its
//! templates and contributes its own outputs to the chain seen by later
//! steps. Resources created by a step are recorded for teardown as soon as
//! the store accepts them.
//!
//! # Modules
//!
//! - [`api`]: Step driver and configuration-backed constructors
//! - [`bindings`]: Immutable named-value chain
//! - [`check`]: Assertion-tree matching of documents
//! - [`cleanup`]: Deletion obligations and teardown
//! - [`client`]: Store seam and the in-memory store
//! - [`config`]: Configuration with layered precedence (overrides > env > file > defaults)
//! - [`error`]: Semantic error types
//! - [`expectation`]: Outcome reclassification
//! - [`expression`]: Path and comparison expressions
//! - [`namespacer`]: Default namespace assignment
//! - [`operation`]: Operations and the poll engine
//! - [`output`]: Named values extracted after a step
//! - [`resource`]: Resource documents and identities
//! - [`template`]: Placeholder rendering

pub mod api;
pub mod bindings;
pub mod check;
pub mod cleanup;
pub mod client;
pub mod config;
pub mod error;
pub mod expectation;
pub mod expression;
pub mod namespacer;
pub mod operation;
pub mod output;
pub mod resource;
pub mod template;
