//! Message template rendering.

/// Substitute `{name}` placeholders. Unknown placeholders are left as written.
pub(crate) fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_placeholders() {
        let msg = render(
            "{entity} {field} ({value}) is earlier than {other}",
            &[
                ("entity", "Slide"),
                ("field", "imaging_date"),
                ("value", "2024-01-01"),
                ("other", "staining_date"),
            ],
        );
        assert_eq!(msg, "Slide imaging_date (2024-01-01) is earlier than staining_date");
    }

    #[test]
    fn unknown_placeholders_survive() {
        assert_eq!(render("{key} {nope}", &[("key", "B1")]), "B1 {nope}");
    }
}
