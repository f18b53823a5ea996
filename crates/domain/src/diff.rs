//! Structural diffing between entity snapshots.
//!
//! Every entry point degrades instead of failing: unparseable payloads and
//! unrecognized shapes collapse to count deltas or to nothing at all, never
//! to an error.

mod components;
mod fields;
mod lists;
mod questionnaire;

pub use components::diff_components;
pub use fields::{changed_field_names, diff_named_fields};
pub use lists::diff_value_lists;
pub use questionnaire::diff_questionnaire_structure;
