// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Binding-graph resolution for weaver components
//!
//! This crate extracts component and module descriptors from declarations,
//! resolves every reachable key into a binding graph, and validates the
//! finished graph.

pub mod resolve;

pub use resolve::*;
