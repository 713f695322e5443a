//! Registration array trimming.
//!
//! A generated registration method builds an array of native method descriptors:
//!
//! ```text
//! ldc.i4   <size>
//! newarr   JniNativeMethodRegistration
//! dup                                     ┐
//! ldc.i4   <offset>                       │
//! ldstr    "<native name>"                │
//! ldstr    "<native signature>"           │ one slot
//! ldnull                                  │
//! ldftn    <marshal thunk>                │
//! newobj   <delegate ctor>                │
//! newobj   JniNativeMethodRegistration    │
//! stelem   JniNativeMethodRegistration    ┘
//! ...
//! ```
//!
//! [`trim_registration_array`] scans the body with a two-state parser: first for the size
//! load, then for slots. Slots whose thunk is in the marked set are renumbered densely,
//! other slots are removed. Anything that does not form a complete slot is skipped.

use rustc_hash::FxHashSet;

use crate::{
    assembly::{Instruction, OpCode},
    metadata::method::MethodBody,
    Result,
};

/// Instructions per array slot
pub const SLOT_LEN: usize = 9;

/// Position of the offset load within a slot
const SLOT_OFFSET: usize = 1;

/// Position of the thunk load within a slot
const SLOT_THUNK: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Looking for `ldc.i4 <size>; newarr`
    ArraySize,
    /// Looking for slots
    Slots,
}

/// Outcome of a successful trim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimmedArray {
    /// Slots kept, renumbered `0..kept`
    pub kept: usize,
    /// Slots removed
    pub removed: usize,
}

/// Name of the thunk referenced by a complete slot starting at `instructions[0]`
fn match_slot(instructions: &[Instruction]) -> Option<&str> {
    let slot = instructions.get(..SLOT_LEN)?;

    let shape = slot[0].opcode == OpCode::Dup
        && slot[SLOT_OFFSET].as_ldc_i4().is_some()
        && slot[2].opcode == OpCode::Ldstr
        && slot[3].opcode == OpCode::Ldstr
        && slot[4].opcode == OpCode::Ldnull
        && slot[SLOT_THUNK].opcode == OpCode::Ldftn
        && slot[6].opcode == OpCode::Newobj
        && slot[7].opcode == OpCode::Newobj
        && matches!(slot[8].opcode, OpCode::StelemAny | OpCode::StelemRef);
    if !shape {
        return None;
    }
    slot[SLOT_THUNK].method_ref().map(|thunk| thunk.name.as_str())
}

/// Rewrites the registration array of `body` to hold exactly the `marked` thunks.
///
/// The array size becomes `marked.len()`; kept slots keep their relative order.
///
/// # Arguments
///
/// * `body` - Body of the registration method, replaced only on success.
/// * `marked` - Names of the marked thunks.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] if no size load was found or the number of kept
/// slots differs from the number of marked names. `body` is left untouched then.
pub fn trim_registration_array(
    body: &mut MethodBody,
    marked: &FxHashSet<String>,
) -> Result<TrimmedArray> {
    let size = i32::try_from(marked.len())
        .map_err(|_| malformed_error!("Registration array of {} entries", marked.len()))?;

    let mut trimmed = body.clone();
    let mut state = ScanState::ArraySize;
    let mut index = 0;
    let mut kept: i32 = 0;
    let mut removed = 0;

    while index < trimmed.len() {
        match state {
            ScanState::ArraySize => {
                let is_size = trimmed.instructions[index].as_ldc_i4().is_some()
                    && trimmed
                        .instructions
                        .get(index + 1)
                        .is_some_and(|next| next.opcode == OpCode::Newarr);
                if is_size {
                    trimmed.instructions[index] = Instruction::ldc_i4(size);
                    state = ScanState::Slots;
                    index += 2;
                } else {
                    index += 1;
                }
            }
            ScanState::Slots => {
                let Some(keep) = match_slot(&trimmed.instructions[index..]).map(|name| marked.contains(name))
                else {
                    index += 1;
                    continue;
                };

                if keep {
                    trimmed.instructions[index + SLOT_OFFSET] = Instruction::ldc_i4(kept);
                    kept += 1;
                    index += SLOT_LEN;
                } else {
                    trimmed.remove_range(index, SLOT_LEN);
                    removed += 1;
                }
            }
        }
    }

    if state == ScanState::ArraySize {
        return Err(malformed_error!("Registration array size not found"));
    }
    if kept != size {
        return Err(malformed_error!(
            "{} registration slot(s) kept for {} marked method(s)",
            kept,
            size
        ));
    }

    *body = trimmed;
    Ok(TrimmedArray {
        kept: marked.len(),
        removed,
    })
}
