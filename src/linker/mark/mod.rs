//! Reachability marking.
//!
//! Marking walks the member graph from the roots implied by the assembly actions and the
//! preserve annotations, using an explicit worklist. The base algorithm lives in
//! [`Marker`]; bridge-specific edges are contributed through the [`MarkExtension`] seam by
//! [`BridgeMarkExtension`]. [`MarkStep`] runs the passes and, when marshal methods are
//! preserved, rewrites the registration dispatch table in between.
//!
//! # Key Components
//!
//! - [`Marker`] - One worklist-driven mark pass
//! - [`MarkExtension`] - Hooks adding edges to a pass
//! - [`BridgeMarkExtension`] - Native-object bridge rules
//! - [`BridgeRegistry`] - Marshal types discovered during a pass
//! - [`rules`] - Implicit dependencies of foundational runtime types
//! - [`MarkStep`] - Pass orchestration
//!
//! # Examples
//!
//! ```rust
//! use cilshrink::linker::{config::LinkerConfig, context::LinkContext, mark::MarkStep};
//! use cilshrink::metadata::program::Program;
//!
//! let mut ctx = LinkContext::new(Program::new(), LinkerConfig::default());
//! let outcome = MarkStep::new().process(&mut ctx)?;
//! assert_eq!(outcome.passes, 1);
//! assert!(!outcome.dispatch_changed);
//! # Ok::<(), cilshrink::Error>(())
//! ```

mod bridge;
mod extension;
mod marker;
mod registry;
pub mod rules;

pub use bridge::{exposes_bridge_capability, BridgeMarkExtension};
pub use extension::{MarkExtension, NoExtension};
pub use marker::Marker;
pub use registry::BridgeRegistry;

use crate::{
    linker::{context::LinkContext, dispatch::DispatchRewriter},
    Result,
};

/// Result of [`MarkStep::process`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MarkOutcome {
    /// Number of mark passes run (one or two)
    pub passes: usize,
    /// Whether the registration rewrite changed the program
    pub dispatch_changed: bool,
}

/// Runs reachability marking with bridge awareness.
///
/// The sequence is: clear the registry, mark, optionally rewrite registrations, and mark
/// once more if the rewrite changed anything. A rewrite that would expose yet more work
/// is not followed by a third pass.
#[derive(Debug, Default)]
pub struct MarkStep {
    registry: BridgeRegistry,
}

impl MarkStep {
    /// Creates the step with an empty registry
    pub fn new() -> Self {
        MarkStep::default()
    }

    /// Marshal types recorded by the last pass
    #[must_use]
    pub fn registry(&self) -> &BridgeRegistry {
        &self.registry
    }

    /// Marks the program in `ctx`.
    ///
    /// # Errors
    ///
    /// Returns an error if the program model is inconsistent.
    pub fn process(&mut self, ctx: &mut LinkContext) -> Result<MarkOutcome> {
        self.registry.clear();
        self.mark_pass(ctx)?;
        let mut outcome = MarkOutcome {
            passes: 1,
            dispatch_changed: false,
        };

        if ctx.config.preserve_jni_marshal_methods {
            let changed = DispatchRewriter::new(&mut self.registry).update_marshal_types(ctx)?;
            if changed {
                outcome.dispatch_changed = true;
                self.mark_pass(ctx)?;
                outcome.passes += 1;
            }
        }
        Ok(outcome)
    }

    fn mark_pass(&mut self, ctx: &mut LinkContext) -> Result<()> {
        let diagnostics = ctx.diagnostics();
        let mut marker = Marker::new(&ctx.program, &mut ctx.annotations, &ctx.config, &diagnostics);
        let mut extension = BridgeMarkExtension::new(&mut self.registry);
        marker.run(&mut extension)
    }
}
