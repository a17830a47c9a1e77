//! Status enums, entity kinds, field types, and severities.
//!
//! Enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`,
//! except [`EntityKind`], whose wire names are the canonical type names
//! (`"Block"`, `"ROI"`, ...). [`RunStatus`] provides `allowed_next_states()` to
//! enforce valid transitions at the application layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// Canonical entity types, declared in hierarchy order.
///
/// ```text
/// Block → Slide → ROI → Library → Run
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum EntityKind {
    Block,
    Slide,
    #[serde(rename = "ROI")]
    Roi,
    Library,
    #[serde(rename = "Run")]
    SequencingRun,
}

impl EntityKind {
    /// Every kind in the order the harmonizer must process them.
    pub const HIERARCHY: [Self; 5] = [
        Self::Block,
        Self::Slide,
        Self::Roi,
        Self::Library,
        Self::SequencingRun,
    ];

    /// Zero-based position in [`Self::HIERARCHY`].
    #[must_use]
    pub const fn level(self) -> usize {
        match self {
            Self::Block => 0,
            Self::Slide => 1,
            Self::Roi => 2,
            Self::Library => 3,
            Self::SequencingRun => 4,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Block => "Block",
            Self::Slide => "Slide",
            Self::Roi => "ROI",
            Self::Library => "Library",
            Self::SequencingRun => "Run",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::HIERARCHY
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::Validation(format!("unknown entity kind '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// FieldType
// ---------------------------------------------------------------------------

/// Primitive type of a canonical schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Number,
    Date,
    Enum,
}

impl FieldType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Date => "date",
            Self::Enum => "enum",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Finding criticality. Ordered so that `Blocker` compares highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Blocker,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Blocker => "blocker",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ValidationStatus
// ---------------------------------------------------------------------------

/// Aggregate outcome of one validation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Passed,
    Failed,
}

impl ValidationStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RunStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a harmonization run.
///
/// ```text
/// uploading → mapped → harmonizing → harmonized → validating → validated_passed
///                          ↑   │          │  ↑                → validated_failed
///                          └───┴──────────┘  └── (re-validate from validated_*)
///
/// any state → failed_fatal (terminal)
/// ```
///
/// `harmonizing` may fall back to the state it was entered from when a
/// harmonization attempt is cancelled; nothing is committed in that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Uploading,
    Mapped,
    Harmonizing,
    Harmonized,
    Validating,
    ValidatedPassed,
    ValidatedFailed,
    FailedFatal,
}

impl RunStatus {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Uploading => &[Self::Mapped, Self::FailedFatal],
            Self::Mapped => &[Self::Mapped, Self::Harmonizing, Self::FailedFatal],
            Self::Harmonizing => &[
                Self::Harmonized,
                Self::Mapped,
                Self::ValidatedPassed,
                Self::ValidatedFailed,
                Self::FailedFatal,
            ],
            Self::Harmonized => &[Self::Validating, Self::Harmonizing, Self::FailedFatal],
            Self::Validating => &[
                Self::Harmonized,
                Self::ValidatedPassed,
                Self::ValidatedFailed,
                Self::FailedFatal,
            ],
            Self::ValidatedPassed | Self::ValidatedFailed => {
                &[Self::Validating, Self::Harmonizing, Self::FailedFatal]
            }
            Self::FailedFatal => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Whether a stage is working on a run in this state.
    #[must_use]
    pub const fn is_in_progress(self) -> bool {
        matches!(self, Self::Harmonizing | Self::Validating)
    }

    /// Whether a committed canonical entity set exists for a run in this state.
    #[must_use]
    pub const fn has_entities(self) -> bool {
        matches!(
            self,
            Self::Harmonized | Self::Validating | Self::ValidatedPassed | Self::ValidatedFailed
        )
    }

    /// The terminal `validated_*` state matching a validation outcome.
    #[must_use]
    pub const fn validated(status: ValidationStatus) -> Self {
        match status {
            ValidationStatus::Passed => Self::ValidatedPassed,
            ValidationStatus::Failed => Self::ValidatedFailed,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uploading => "uploading",
            Self::Mapped => "mapped",
            Self::Harmonizing => "harmonizing",
            Self::Harmonized => "harmonized",
            Self::Validating => "validating",
            Self::ValidatedPassed => "validated_passed",
            Self::ValidatedFailed => "validated_failed",
            Self::FailedFatal => "failed_fatal",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    macro_rules! test_serde_roundtrip {
        ($name:ident, $ty:ty, $variant:expr, $expected_str:expr) => {
            #[test]
            fn $name() {
                let val = $variant;
                let json = serde_json::to_string(&val).unwrap();
                assert_eq!(json, format!("\"{}\"", $expected_str));
                let recovered: $ty = serde_json::from_str(&json).unwrap();
                assert_eq!(recovered, val);
            }
        };
    }

    test_serde_roundtrip!(kind_roi, EntityKind, EntityKind::Roi, "ROI");
    test_serde_roundtrip!(kind_run, EntityKind, EntityKind::SequencingRun, "Run");
    test_serde_roundtrip!(severity_blocker, Severity, Severity::Blocker, "blocker");
    test_serde_roundtrip!(field_type_enum, FieldType, FieldType::Enum, "enum");
    test_serde_roundtrip!(
        run_validated_failed,
        RunStatus,
        RunStatus::ValidatedFailed,
        "validated_failed"
    );
    test_serde_roundtrip!(
        run_failed_fatal,
        RunStatus,
        RunStatus::FailedFatal,
        "failed_fatal"
    );

    #[test]
    fn severity_orders_blocker_highest() {
        assert!(Severity::Blocker > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        let max = [Severity::Info, Severity::Blocker, Severity::Warning]
            .into_iter()
            .max();
        assert_eq!(max, Some(Severity::Blocker));
    }

    #[test]
    fn hierarchy_levels_match_positions() {
        for (idx, kind) in EntityKind::HIERARCHY.iter().enumerate() {
            assert_eq!(kind.level(), idx);
        }
    }

    #[rstest]
    #[case("block", EntityKind::Block)]
    #[case("ROI", EntityKind::Roi)]
    #[case("roi", EntityKind::Roi)]
    #[case("Run", EntityKind::SequencingRun)]
    fn entity_kind_parses_case_insensitively(#[case] input: &str, #[case] expected: EntityKind) {
        assert_eq!(input.parse::<EntityKind>().unwrap(), expected);
    }

    #[test]
    fn entity_kind_rejects_unknown() {
        assert!("Specimen".parse::<EntityKind>().is_err());
    }

    #[test]
    fn run_happy_path_transitions() {
        let path = [
            RunStatus::Uploading,
            RunStatus::Mapped,
            RunStatus::Harmonizing,
            RunStatus::Harmonized,
            RunStatus::Validating,
            RunStatus::ValidatedPassed,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn run_reentry_allowed_from_completed_states() {
        assert!(RunStatus::Harmonized.can_transition_to(RunStatus::Harmonizing));
        assert!(RunStatus::ValidatedFailed.can_transition_to(RunStatus::Harmonizing));
        assert!(RunStatus::ValidatedPassed.can_transition_to(RunStatus::Validating));
    }

    #[test]
    fn aborted_stages_can_step_back() {
        assert!(RunStatus::Harmonizing.can_transition_to(RunStatus::Mapped));
        assert!(RunStatus::Harmonizing.can_transition_to(RunStatus::ValidatedFailed));
        assert!(RunStatus::Validating.can_transition_to(RunStatus::Harmonized));
        assert!(RunStatus::Validating.can_transition_to(RunStatus::ValidatedPassed));
        assert!(!RunStatus::Validating.can_transition_to(RunStatus::Mapped));
        assert!(RunStatus::Validating.is_in_progress());
        assert!(!RunStatus::Harmonized.is_in_progress());
    }

    #[test]
    fn run_rejects_skipping_stages() {
        assert!(!RunStatus::Uploading.can_transition_to(RunStatus::Harmonizing));
        assert!(!RunStatus::Mapped.can_transition_to(RunStatus::Validating));
        assert!(!RunStatus::Uploading.can_transition_to(RunStatus::ValidatedPassed));
    }

    #[test]
    fn every_non_terminal_state_can_fail_fatally() {
        for status in [
            RunStatus::Uploading,
            RunStatus::Mapped,
            RunStatus::Harmonizing,
            RunStatus::Harmonized,
            RunStatus::Validating,
            RunStatus::ValidatedPassed,
            RunStatus::ValidatedFailed,
        ] {
            assert!(status.can_transition_to(RunStatus::FailedFatal), "{status}");
        }
        assert!(RunStatus::FailedFatal.allowed_next_states().is_empty());
    }

    #[test]
    fn validated_maps_outcome() {
        assert_eq!(
            RunStatus::validated(ValidationStatus::Passed),
            RunStatus::ValidatedPassed
        );
        assert_eq!(
            RunStatus::validated(ValidationStatus::Failed),
            RunStatus::ValidatedFailed
        );
    }
}
