//! Common utilities for the Quill CSS inliner.
//!
//! This crate provides shared infrastructure used by the DOM and CSS crates:
//! - **Warning System** - de-duplicated warnings for unsupported input, routed
//!   through the [`log`] facade

pub mod warning;
