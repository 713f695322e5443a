//! Link run orchestration.

use std::fmt;

use crate::{
    linker::{completion::AbstractMethodCompleter, context::LinkContext, mark::MarkStep},
    metadata::token::TableId,
    Result,
};

/// Summary of a link run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Stub methods synthesized by abstract-method completion
    pub stubs_added: usize,
    /// Names of assemblies escalated to `Save`
    pub escalated: Vec<String>,
    /// Mark passes run (one, or two after a registration rewrite)
    pub mark_passes: usize,
    /// Whether registration methods were rewritten
    pub dispatch_changed: bool,
    /// Marked type definitions
    pub marked_types: usize,
    /// Marked method definitions
    pub marked_methods: usize,
    /// Marked field definitions
    pub marked_fields: usize,
}

impl fmt::Display for LinkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} stub(s) added, {} assembly(ies) escalated, {} mark pass(es), {} type(s) / {} method(s) / {} field(s) marked",
            self.stubs_added,
            self.escalated.len(),
            self.mark_passes,
            self.marked_types,
            self.marked_methods,
            self.marked_fields
        )
    }
}

/// Runs abstract-method completion followed by reachability marking.
///
/// # Examples
///
/// ```rust
/// use cilshrink::prelude::*;
///
/// let mut program = Program::new();
/// program.add_assembly("App");
///
/// let mut ctx = LinkContext::new(program, LinkerConfig::default());
/// let report = Linker::new().run(&mut ctx)?;
/// assert_eq!(report.stubs_added, 0);
/// assert_eq!(report.mark_passes, 1);
/// # Ok::<(), cilshrink::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct Linker {
    completer: AbstractMethodCompleter,
    mark: MarkStep,
}

impl Linker {
    /// Creates a linker
    pub fn new() -> Self {
        Linker::default()
    }

    /// Links the program in `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MissingDependency`] if stubs are needed but the error
    /// constructor is missing, or a model error if the program is inconsistent.
    pub fn run(&mut self, ctx: &mut LinkContext) -> Result<LinkReport> {
        let stubs_before = self.completer.stubs_added();
        let escalated_before = self.completer.escalated().len();
        self.completer.process(ctx)?;

        let outcome = self.mark.process(ctx)?;

        let mut escalated = Vec::new();
        for assembly in &self.completer.escalated()[escalated_before..] {
            escalated.push(ctx.program.assembly(*assembly)?.name.clone());
        }

        Ok(LinkReport {
            stubs_added: self.completer.stubs_added() - stubs_before,
            escalated,
            mark_passes: outcome.passes,
            dispatch_changed: outcome.dispatch_changed,
            marked_types: ctx.annotations.marked_count_in(TableId::TypeDef),
            marked_methods: ctx.annotations.marked_count_in(TableId::MethodDef),
            marked_fields: ctx.annotations.marked_count_in(TableId::Field),
        })
    }
}
