use std::borrow::Cow;
use std::fmt::Write as _;

use crate::data::Table;

/// Cells wider than this are cut with an ellipsis.
pub const MAX_CELL_WIDTH: usize = 40;

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let headers = headers.iter().map(|h| clip_cell(h)).collect::<Vec<_>>();
    let rows = rows
        .iter()
        .map(|row| row.iter().map(|cell| clip_cell(cell)).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();

    let header_line = format_row(&headers, &widths);
    let _ = writeln!(output, "{header_line}");

    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<usize>>();
    let separator_cells = separator_widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>();
    let separator_line = format_row(&separator_cells, &separator_widths);
    let _ = writeln!(output, "{separator_line}");

    for row in &rows {
        let row_line = format_row(row, &widths);
        let _ = writeln!(output, "{row_line}");
    }

    output
}

/// Renders at most `limit` rows of `table` (0 = all).
pub fn render_data_table(table: &Table, limit: usize) -> String {
    let mut rows = table.display_rows();
    if limit > 0 && rows.len() > limit {
        rows.truncate(limit);
    }
    render_table(&table.headers, &rows)
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    let rendered = render_table(headers, rows);
    print!("{rendered}");
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut cells = Vec::with_capacity(values.len());
    for (idx, value) in values.iter().enumerate() {
        if idx >= widths.len() {
            break;
        }
        let display = display_width(value);
        let mut cell = value.clone();
        let padding = widths
            .get(idx)
            .copied()
            .unwrap_or_default()
            .saturating_sub(display);
        if padding > 0 {
            cell.push_str(&" ".repeat(padding));
        }
        cells.push(cell);
    }
    let mut line = cells.join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

/// Terminal columns occupied by `value`: wide East Asian characters take two.
fn display_width(value: &str) -> usize {
    value.chars().map(char_width).sum()
}

fn char_width(ch: char) -> usize {
    let code = ch as u32;
    let wide = matches!(
        code,
        0x1100..=0x115F
            | 0x2E80..=0x303E
            | 0x3041..=0x33FF
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xA000..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
            | 0x1F300..=0x1F64F
            | 0x20000..=0x3FFFD
    );
    if wide { 2 } else { 1 }
}

fn clip_cell(value: &str) -> String {
    let sanitized = sanitize_cell(value);
    if display_width(&sanitized) <= MAX_CELL_WIDTH {
        return sanitized.into_owned();
    }
    let mut clipped = String::new();
    let mut width = 0;
    for ch in sanitized.chars() {
        let next = char_width(ch);
        if width + next > MAX_CELL_WIDTH - 1 {
            break;
        }
        width += next;
        clipped.push(ch);
    }
    clipped.push('…');
    clipped
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        let mut sanitized = String::with_capacity(value.len());
        for ch in value.chars() {
            match ch {
                '\n' | '\r' | '\t' => sanitized.push(' '),
                other => sanitized.push(other),
            }
        }
        Cow::Owned(sanitized)
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_characters_count_double() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("兼六園"), 6);
        assert_eq!(display_width("ｶﾅ"), 2);
    }

    #[test]
    fn columns_align_with_mixed_widths() {
        let headers = vec!["名称".to_string(), "reviews".to_string()];
        let rows = vec![
            vec!["兼六園".to_string(), "120".to_string()],
            vec!["A".to_string(), "3".to_string()],
        ];
        let rendered = render_table(&headers, &rows);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "名称    reviews");
        assert_eq!(lines[1], "------  -------");
        assert_eq!(lines[2], "兼六園  120");
        assert_eq!(lines[3], "A       3");
    }

    #[test]
    fn long_cells_are_clipped_and_newlines_flattened() {
        let long = "x".repeat(MAX_CELL_WIDTH + 10);
        let clipped = clip_cell(&long);
        assert_eq!(display_width(&clipped), MAX_CELL_WIDTH);
        assert!(clipped.ends_with('…'));
        assert_eq!(clip_cell("a\nb"), "a b");
    }

    #[test]
    fn render_data_table_honours_limit() {
        let table = Table::with_rows(
            vec!["name".into()],
            vec![vec![Some("a".into())], vec![None], vec![Some("c".into())]],
        );
        let rendered = render_data_table(&table, 2);
        assert_eq!(rendered.lines().count(), 4);
        assert_eq!(render_data_table(&table, 0).lines().count(), 5);
    }
}
