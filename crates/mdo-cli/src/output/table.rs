#[derive(Clone, Copy, Debug)]
pub struct TableOptions {
    pub max_width: Option<usize>,
    pub color: bool,
}

const MIN_WIDTH: usize = 4;

/// Render an aligned plain-text table. Numeric cells are right-aligned.
#[must_use]
pub fn render(headers: &[&str], rows: &[Vec<String>], options: TableOptions) -> String {
    let mut widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count())
                .chain([header.len(), MIN_WIDTH])
                .max()
                .unwrap_or(MIN_WIDTH)
        })
        .collect();
    if let Some(max_width) = options.max_width {
        shrink(&mut widths, headers, max_width);
    }

    let header_line = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| pad(&truncate(header, *width), *width, false))
        .collect::<Vec<_>>()
        .join("  ");
    let divider = "-".repeat(header_line.chars().count());

    let mut lines = vec![header_line, divider];
    for row in rows {
        let line = widths
            .iter()
            .enumerate()
            .map(|(index, width)| {
                let text = truncate(row.get(index).map_or("-", String::as_str), *width);
                let padded = pad(&text, *width, is_numeric(&text));
                if options.color {
                    colorize(&padded, &text)
                } else {
                    padded
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

/// Narrow the widest column one character at a time until the table fits.
fn shrink(widths: &mut [usize], headers: &[&str], max_width: usize) {
    let separators = widths.len().saturating_sub(1) * 2;
    while widths.iter().sum::<usize>() + separators > max_width {
        let widest = widths
            .iter()
            .enumerate()
            .filter(|(index, width)| **width > headers[*index].len().max(MIN_WIDTH))
            .max_by_key(|(_, width)| **width)
            .map(|(index, _)| index);
        let Some(index) = widest else {
            break;
        };
        widths[index] -= 1;
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn pad(value: &str, width: usize, right_align: bool) -> String {
    if right_align {
        format!("{value:>width$}")
    } else {
        format!("{value:<width$}")
    }
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.parse::<f64>().is_ok()
}

fn colorize(padded: &str, text: &str) -> String {
    let code = match text {
        "passed" | "validated_passed" => "32",
        "warning" => "33",
        "blocker" | "failed" | "validated_failed" | "failed_fatal" => "31",
        "info" => "36",
        _ => return padded.to_string(),
    };
    format!("\u{1b}[{code}m{padded}\u{1b}[0m")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{TableOptions, render};

    const PLAIN: TableOptions = TableOptions {
        max_width: None,
        color: false,
    };

    #[test]
    fn columns_align_and_numbers_right_align() {
        let rows = vec![
            vec!["B1".to_string(), "3".to_string()],
            vec!["SLD-2024-0001".to_string(), "12".to_string()],
        ];
        let table = render(&["identity", "rows"], &rows, PLAIN);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "identity       rows");
        assert!(lines[1].chars().all(|c| c == '-'));
        assert_eq!(lines[2], "B1                3");
        assert_eq!(lines[3], "SLD-2024-0001    12");
    }

    #[test]
    fn narrow_terminal_truncates_widest_column() {
        let rows = vec![vec!["a very long description of a finding".to_string(), "x".to_string()]];
        let table = render(
            &["description", "rule"],
            &rows,
            TableOptions {
                max_width: Some(24),
                color: false,
            },
        );
        let row = table.lines().nth(2).unwrap();
        assert!(row.contains('…'));
        assert!(row.chars().count() <= 24);
    }

    #[test]
    fn color_wraps_severity_cells() {
        let rows = vec![vec!["blocker".to_string()]];
        let table = render(
            &["severity"],
            &rows,
            TableOptions {
                max_width: None,
                color: true,
            },
        );
        assert!(table.lines().nth(2).unwrap().starts_with("\u{1b}[31m"));
    }
}
