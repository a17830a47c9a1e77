//! Rule ids of the findings the pipeline emits on its own.
//!
//! Row and uniqueness rules carry the ids declared in the schema template.

pub const TYPE_MISMATCH: &str = "type_mismatch";
pub const MISSING_REQUIRED_FIELD: &str = "missing_required_field";
pub const WHITESPACE_TRIMMED: &str = "whitespace_trimmed";
pub const DATE_FORMAT_NORMALIZED: &str = "date_format_normalized";
pub const PATTERN_MISMATCH: &str = "pattern_mismatch";
pub const ENUM_MEMBERSHIP: &str = "enum_membership";
pub const ENUM_CASE_MISMATCH: &str = "enum_case_mismatch";
pub const PARENT_UNRESOLVED: &str = "parent_unresolved";
pub const IDENTITY_MERGED: &str = "identity_merged";
