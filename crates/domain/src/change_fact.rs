/// A single detected difference between two entity snapshots.
///
/// Facts are an in-memory vocabulary handed from the differ to the
/// description renderer. They are never persisted; only the rendered prose
/// and the raw snapshots are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeFact {
    /// A field holds a different value on each side.
    FieldModified {
        /// Display label of the field.
        name: String,
        /// Display form of the old value.
        before: String,
        /// Display form of the new value.
        after: String,
    },

    /// A field is present only on the after side.
    FieldAdded {
        /// Display label of the field.
        name: String,
        /// Display form of the new value.
        value: String,
    },

    /// A field is present only on the before side.
    FieldRemoved {
        /// Display label of the field.
        name: String,
        /// Display form of the removed value.
        value: String,
    },

    /// Membership changes in an identity-keyed list.
    ListDelta {
        /// Which list changed.
        kind: ListDeltaKind,
        /// Narrower context for the list, such as the owning question.
        scope: Option<String>,
        /// Display labels of added members.
        added: Vec<String>,
        /// Display labels of removed members.
        removed: Vec<String>,
    },

    /// Fallback when elements cannot be named individually.
    CountDelta {
        /// What was counted.
        label: String,
        /// Element count on the before side.
        before: usize,
        /// Element count on the after side.
        after: usize,
    },

    /// A change that only renders as a fixed phrase.
    Remark(String),
}

/// The identity-keyed lists the differ knows how to compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListDeltaKind {
    /// Teams allowed to view an entity.
    ViewTeams,
    /// Teams allowed to operate on an entity.
    OperateTeams,
    /// Users allowed to view an entity.
    ViewUsers,
    /// Users allowed to operate on an entity.
    OperateUsers,
    /// Default assignees of a stage or task.
    Assignees,
    /// Answer options of a question.
    Options,
    /// Row headers of a grid question.
    GridRows,
    /// Column headers of a grid question.
    GridColumns,
    /// Checklists bound to a stage component.
    Checklists,
    /// Questionnaires bound to a stage component.
    Questionnaires,
    /// Static fields bound to a stage component.
    Fields,
}

impl ListDeltaKind {
    /// Returns the display name used in rendered descriptions.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ViewTeams => "View Teams",
            Self::OperateTeams => "Operate Teams",
            Self::ViewUsers => "View Users",
            Self::OperateUsers => "Operate Users",
            Self::Assignees => "Default Assignees",
            Self::Options => "options",
            Self::GridRows => "grid rows",
            Self::GridColumns => "grid columns",
            Self::Checklists => "checklists",
            Self::Questionnaires => "questionnaires",
            Self::Fields => "fields",
        }
    }

    /// Whether removed members render as a count instead of by name.
    ///
    /// User lists can grow large and removed members may no longer resolve
    /// to a display name, so removals are summarized.
    #[must_use]
    pub fn summarizes_removals(&self) -> bool {
        matches!(self, Self::ViewUsers | Self::OperateUsers)
    }

    /// Noun used when removals render as a count.
    #[must_use]
    pub fn member_noun(&self) -> &'static str {
        match self {
            Self::ViewUsers | Self::OperateUsers => "user",
            Self::ViewTeams | Self::OperateTeams => "team",
            Self::Assignees => "assignee",
            Self::Options => "option",
            Self::GridRows => "row",
            Self::GridColumns => "column",
            Self::Checklists => "checklist",
            Self::Questionnaires => "questionnaire",
            Self::Fields => "field",
        }
    }
}
