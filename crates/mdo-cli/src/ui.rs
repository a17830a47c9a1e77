use std::io::IsTerminal;
use std::sync::OnceLock;

use crate::cli::{GlobalFlags, OutputFormat};
use crate::output::table::TableOptions;

/// Narrower `COLUMNS` values are ignored.
const MIN_TERM_WIDTH: usize = 40;

static TABLE_OPTIONS: OnceLock<TableOptions> = OnceLock::new();

/// Decide once per process how tables are drawn.
pub fn init(flags: &GlobalFlags) {
    let color = flags.format == OutputFormat::Table
        && !flags.quiet
        && std::io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none();
    let max_width = std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|width| *width >= MIN_TERM_WIDTH);

    let _ = TABLE_OPTIONS.set(TableOptions { max_width, color });
}

/// Options chosen by [`init`], or plain unbounded tables before it ran.
#[must_use]
pub fn table_options() -> TableOptions {
    TABLE_OPTIONS.get().copied().unwrap_or(TableOptions {
        max_width: None,
        color: false,
    })
}
