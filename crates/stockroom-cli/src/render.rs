//! Plain-text tables for listings.

use stockroom_core::models::Page;
use stockroom_core::utils::truncate_string;

/// Widest any single column may grow
const MAX_COLUMN_WIDTH: usize = 40;

pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count().min(MAX_COLUMN_WIDTH));
        }
    }

    let mut out = String::new();
    let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    push_row(&mut out, &header, &widths);
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
        .map(|(i, width)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let cell = truncate_string(cell, MAX_COLUMN_WIDTH);
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

/// A table followed by the pagination line, or a notice for empty pages
pub fn page<T>(headers: &[&str], page: &Page<T>, row: impl Fn(&T) -> Vec<String>) -> String {
    if page.data.is_empty() {
        return "No records found.\n".to_string();
    }
    let rows: Vec<Vec<String>> = page.data.iter().map(row).collect();
    let mut out = table(headers, &rows);
    out.push('\n');
    out.push_str(&page.summary());
    if !page.is_last() {
        out.push_str(&format!(" - next: --page {}", page.current_page + 1));
    }
    out.push('\n');
    out
}

pub fn section_heading(title: &str) -> String {
    format!("{}\n{}\n", title, "=".repeat(title.chars().count()))
}
