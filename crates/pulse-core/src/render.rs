// crates/pulse-core/src/render.rs

//! Plain-text presentation of query results: aligned tables and horizontal
//! bar charts for the terminal.

use std::fmt::Write as _;

const BAR: char = '█';

/// Integer part of `value` with `,` thousands separators: `1234567.8` -> `1,234,567`.
///
/// ```rust
/// use pulse_core::render::thousands;
///
/// assert_eq!(thousands(1_234_567.8), "1,234,567");
/// assert_eq!(thousands(-950.0), "-950");
/// ```
pub fn thousands(value: f64) -> String {
    let whole = value.trunc() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if whole < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `part` as a percentage of `whole`, two decimals. Zero whole gives `0.00%`.
pub fn percent(part: f64, whole: f64) -> String {
    if whole == 0.0 {
        return "0.00%".to_string();
    }
    format!("{:.2}%", part / whole * 100.0)
}

/// Renders rows under headers with every column padded to its widest cell.
/// Rows shorter than `headers` are padded with empty cells.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    push_row(&mut out, &header_cells, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);
    for row in rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            format!("{cell:<w$}")
        })
        .collect();
    let _ = writeln!(out, "{}", line.join("  ").trim_end());
}

/// Horizontal bar chart, bars scaled so the largest value spans `width`
/// cells. Negative values draw as empty bars.
pub fn bar_chart(title: &str, items: &[(String, f64)], width: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{title}");
    if items.is_empty() {
        let _ = writeln!(out, "  (no data)");
        return out;
    }

    let label_w = items.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let max = items.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    for (label, value) in items {
        let cells = if max > 0.0 && *value > 0.0 {
            ((value / max) * width as f64).round().max(1.0) as usize
        } else {
            0
        };
        let bar: String = std::iter::repeat(BAR).take(cells).collect();
        let _ = writeln!(out, "  {label:<label_w$} │{bar} {}", thousands(*value));
    }
    out
}
