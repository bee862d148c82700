//! Console output helpers: colored status lines and aligned tables.
use console::style;

use crate::{Contact, Note, UpcomingBirthday};

/// Narrowest a shrunk column may become
const MIN_COLUMN_WIDTH: usize = 8;
const COLUMN_SEPARATOR: &str = " | ";

pub fn success(message: impl AsRef<str>) {
    println!("{}", style(message.as_ref()).green());
}

pub fn notice(message: impl AsRef<str>) {
    println!("{}", style(message.as_ref()).yellow());
}

pub fn failure(message: impl AsRef<str>) {
    eprintln!("{}", style(message.as_ref()).red());
}

/// Current terminal width, 80 when it cannot be determined.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

/// Lays `rows` out under `headers` as aligned text lines.
///
/// The first line is the header, the second a rule. When the table is
/// wider than `max_width` the last column is shrunk and its cells cut.
pub fn render_table(headers: &[&str], rows: &[Vec<String>], max_width: usize) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let total = widths.iter().sum::<usize>()
        + COLUMN_SEPARATOR.len() * widths.len().saturating_sub(1);
    if total > max_width {
        if let Some(last) = widths.last_mut() {
            let overflow = total - max_width;
            *last = last.saturating_sub(overflow).max(MIN_COLUMN_WIDTH);
        }
    }

    let format_row = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", truncate(cell, *width), width = *width))
            .collect::<Vec<_>>()
            .join(COLUMN_SEPARATOR)
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format_row(headers.to_vec()));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in rows {
        lines.push(format_row(row.iter().map(String::as_str).collect()));
    }
    lines
}

/// Prints a table with a bold header line.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let lines = render_table(headers, rows, terminal_width());
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("{}", style(line).bold());
        } else {
            println!("{}", line);
        }
    }
}

/// Cuts `text` to `width` characters, marking the cut with "...".
fn truncate(text: &str, width: usize) -> String {
    let flat = text.replace(['\n', '\r'], " ");
    if flat.chars().count() <= width {
        return flat;
    }
    if width <= 3 {
        return flat.chars().take(width).collect();
    }
    let kept: String = flat.chars().take(width - 3).collect();
    format!("{}...", kept)
}

pub const CONTACT_HEADERS: &[&str] = &["Name", "Phone", "Email", "Birthday", "Address"];
pub const NOTE_HEADERS: &[&str] = &["ID", "Title", "Contact", "Tags", "Updated", "Content"];
pub const BIRTHDAY_HEADERS: &[&str] = &["Name", "Congratulation date"];

pub fn contact_rows<'a, I>(contacts: I) -> Vec<Vec<String>>
where
    I: IntoIterator<Item = &'a Contact>,
{
    contacts
        .into_iter()
        .map(|c| {
            vec![
                c.name().to_string(),
                c.phone_number().to_string(),
                c.email().to_string(),
                c.birthday_string(),
                c.address().to_string(),
            ]
        })
        .collect()
}

pub fn note_rows<'a, I>(notes: I) -> Vec<Vec<String>>
where
    I: IntoIterator<Item = &'a Note>,
{
    notes
        .into_iter()
        .map(|n| {
            vec![
                n.id().to_string(),
                n.title().to_string(),
                n.contact().to_string(),
                n.tags()
                    .iter()
                    .map(|t| format!("#{}", t))
                    .collect::<Vec<_>>()
                    .join(" "),
                n.updated_at().format("%Y-%m-%d %H:%M").to_string(),
                n.content().to_string(),
            ]
        })
        .collect()
}

pub fn birthday_rows(birthdays: &[UpcomingBirthday]) -> Vec<Vec<String>> {
    birthdays
        .iter()
        .map(|b| {
            vec![
                b.name.clone(),
                b.congratulation_date.format(crate::BIRTHDAY_FORMAT).to_string(),
            ]
        })
        .collect()
}
