//! ID prefixes and generation.
//!
//! Every persisted document gets a prefixed ID of the form `{prefix}-{8 hex}`,
//! e.g. `run-a3f8b2c1`.

use crate::errors::CoreError;

pub const PREFIX_RUN: &str = "run";
pub const PREFIX_FILE: &str = "fil";
pub const PREFIX_MAPPING: &str = "map";
pub const PREFIX_VALIDATION: &str = "val";
pub const PREFIX_LEASE: &str = "lse";

/// All known prefixes, used by tests and format checks.
pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_RUN,
    PREFIX_FILE,
    PREFIX_MAPPING,
    PREFIX_VALIDATION,
    PREFIX_LEASE,
];

/// Generate a prefixed ID with 4 random bytes rendered as lowercase hex.
///
/// # Errors
///
/// Returns `CoreError::IdGeneration` if the OS random source fails.
pub fn generate_id(prefix: &str) -> Result<String, CoreError> {
    let mut buf = [0u8; 4];
    getrandom::fill(&mut buf).map_err(|e| CoreError::IdGeneration(e.to_string()))?;
    let hex: String = buf.iter().map(|b| format!("{b:02x}")).collect();
    Ok(format!("{prefix}-{hex}"))
}

/// Check whether `id` has the shape `{prefix}-{8 hex}`.
#[must_use]
pub fn has_prefix(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|hex| hex.len() == 8 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generate_id_correct_format() {
        let id = generate_id(PREFIX_RUN).unwrap();
        assert!(id.starts_with("run-"), "ID should start with 'run-': {id}");
        assert_eq!(id.len(), 12);
        assert!(has_prefix(&id, PREFIX_RUN));
    }

    #[test]
    fn generate_id_all_prefixes() {
        for prefix in ALL_PREFIXES {
            let id = generate_id(prefix).unwrap();
            assert!(has_prefix(&id, prefix), "bad id for {prefix}: {id}");
        }
    }

    #[test]
    fn generate_id_uniqueness() {
        let mut ids = HashSet::new();
        for _ in 0..100 {
            let id = generate_id("tst").unwrap();
            assert!(ids.insert(id.clone()), "Duplicate ID generated: {id}");
        }
    }

    #[test]
    fn has_prefix_rejects_wrong_shape() {
        assert!(!has_prefix("run-xyz", PREFIX_RUN));
        assert!(!has_prefix("fil-a3f8b2c1", PREFIX_RUN));
        assert!(!has_prefix("runa3f8b2c1", PREFIX_RUN));
    }
}
