//! State shared by every step of a link run.

use std::sync::Arc;

use crate::{
    linker::{annotations::Annotations, config::LinkerConfig},
    metadata::{diagnostics::Diagnostics, program::Program},
};

/// The program being linked together with its annotations, configuration and collected
/// diagnostics.
#[derive(Debug)]
pub struct LinkContext {
    /// The closed set of assemblies
    pub program: Program,
    /// Reachability state and assembly actions
    pub annotations: Annotations,
    /// Link configuration
    pub config: LinkerConfig,
    /// Messages recorded while linking
    pub diagnostics: Arc<Diagnostics>,
}

impl LinkContext {
    /// Creates a context with empty annotations
    pub fn new(program: Program, config: LinkerConfig) -> Self {
        LinkContext {
            program,
            annotations: Annotations::new(),
            config,
            diagnostics: Arc::new(Diagnostics::new()),
        }
    }

    /// Shared handle to the diagnostics collector
    #[must_use]
    pub fn diagnostics(&self) -> Arc<Diagnostics> {
        Arc::clone(&self.diagnostics)
    }
}
