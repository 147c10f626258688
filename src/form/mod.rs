//! Form serialization and population.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`serialize_form`] | Form fields to a [`Record`](crate::value::Record) |
//! | [`fill_form`] | A [`Record`](crate::value::Record) back into form fields |

// ============================================================================
// Submodules
// ============================================================================

/// Writing records into form fields.
pub mod fill;

/// Reading form fields into records.
pub mod serialize;

// ============================================================================
// Re-exports
// ============================================================================

pub use fill::{FillReport, FillWarning, fill_form};
pub use serialize::{SerializedForm, coerce, serialize_form};
