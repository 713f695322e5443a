//! Extension seam of the reachability marker.

use crate::{
    linker::mark::Marker,
    metadata::{token::Token, typesystem::InterfaceImpl},
    Result,
};

/// Hooks that add edges to the base mark-sweep.
///
/// Every hook receives the running [`Marker`] and may mark further members through it;
/// those are processed before the pass finishes.
pub trait MarkExtension {
    /// Should an unmarked interface implementation record of a marked type be kept?
    ///
    /// Called for every unmarked record whose interface resolves. The default keeps the
    /// record once the interface type itself is marked.
    ///
    /// # Arguments
    ///
    /// * `marker` - The running marker.
    /// * `type_token` - The marked implementing type.
    /// * `record` - The interface implementation record.
    /// * `interface` - The resolved interface type.
    ///
    /// # Errors
    ///
    /// Returns an error if the program model is inconsistent.
    fn should_mark_interface_implementation(
        &mut self,
        marker: &Marker<'_>,
        type_token: Token,
        record: &InterfaceImpl,
        interface: Token,
    ) -> Result<bool> {
        Ok(marker.base_should_mark_interface_implementation(type_token, record, interface))
    }

    /// Called once per pass for every processed (marked) type.
    ///
    /// # Errors
    ///
    /// Returns an error if the program model is inconsistent.
    fn on_type_marked(&mut self, _marker: &mut Marker<'_>, _type_token: Token) -> Result<()> {
        Ok(())
    }

    /// Called once per pass for every processed (marked) method.
    ///
    /// # Errors
    ///
    /// Returns an error if the program model is inconsistent.
    fn on_method_marked(&mut self, _marker: &mut Marker<'_>, _method: Token) -> Result<()> {
        Ok(())
    }
}

/// Extension that adds nothing to the base algorithm
#[derive(Debug, Default, Clone, Copy)]
pub struct NoExtension;

impl MarkExtension for NoExtension {}
