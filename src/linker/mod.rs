//! The linker core.
//!
//! A link run takes a closed [`crate::metadata::program::Program`] and prepares it for
//! trimming by an external sweep:
//!
//! ```text
//! Program ─► AbstractMethodCompleter ─► MarkStep ─┬─► mark pass
//!                                                 ├─► DispatchRewriter (optional)
//!                                                 └─► mark pass (if rewritten)
//! ```
//!
//! # Key Components
//!
//! - [`config::LinkerConfig`] - Well-known runtime names and switches
//! - [`context::LinkContext`] - Program, annotations, configuration and diagnostics
//! - [`annotations::Annotations`] - Reachability state and assembly actions
//! - [`signature`] - Structural method signature matching
//! - [`completion::AbstractMethodCompleter`] - Throwing stubs for missing interface methods
//! - [`mark::MarkStep`] - Bridge-aware reachability marking
//! - [`dispatch::DispatchRewriter`] - Registration array and dispatch table rewriting
//! - [`pipeline::Linker`] - Runs everything in order

pub mod annotations;
pub mod completion;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod mark;
pub mod pipeline;
pub mod signature;
