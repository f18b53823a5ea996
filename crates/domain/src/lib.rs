//! Change-detection domain logic: snapshot documents, value normalization,
//! structural diffing, and the change-record vocabulary.

#![forbid(unsafe_code)]

mod change_fact;
mod change_log;
mod diff;
mod document;
mod normalize;

pub use change_fact::{ChangeFact, ListDeltaKind};
pub use change_log::{BusinessModule, OperationStatus, OperationType};
pub use diff::{
    changed_field_names, diff_components, diff_named_fields, diff_questionnaire_structure,
    diff_value_lists,
};
pub use document::{
    Snapshot, display_string, lookup_ci, parse_id_list, parse_id_list_text, truncate_display,
};
pub use normalize::{is_equivalent, normalize};
