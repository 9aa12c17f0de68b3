use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::record::{Posting, PostingKey};

/// Glyph the boards use in the company column to mean "same company as the
/// row above".
const CONTINUATION_MARK: &str = "↳";

fn company_markup() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*|\[|\]|\(.*?\)").expect("company markup pattern"))
}

fn line_break_tags() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</?br\s*/?>").expect("line break pattern"))
}

fn html_tags() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("html tag pattern"))
}

fn href_attribute() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"href="([^"]*)""#).expect("href pattern"))
}

/// Scan a board document for the postings table and return its rows as
/// normalized records, in table order.
///
/// No table header means no postings: an empty result, not an error. Rows
/// that collapse to the same [`PostingKey`] keep the first row's position
/// and the last row's data.
pub fn extract(document: &str, source_id: &str) -> Vec<Posting> {
    let lines: Vec<&str> = document.lines().collect();
    let Some(header) = lines.iter().position(|line| is_header_row(line)) else {
        return Vec::new();
    };

    let mut postings: Vec<Posting> = Vec::new();
    let mut positions: HashMap<PostingKey, usize> = HashMap::new();
    let mut carry_over: Option<String> = None;
    let mut skipped = 0usize;

    // Header is followed by the markdown rule line; data starts after both.
    for line in lines.into_iter().skip(header + 2) {
        let line = line.trim();
        if line.is_empty() || !line.starts_with('|') {
            // The table is contiguous; the first non-table line ends it.
            break;
        }

        let Some(posting) = parse_row(line, source_id, &mut carry_over) else {
            skipped += 1;
            continue;
        };

        match positions.entry(posting.key()) {
            Entry::Occupied(slot) => postings[*slot.get()] = posting,
            Entry::Vacant(slot) => {
                slot.insert(postings.len());
                postings.push(posting);
            }
        }
    }

    if skipped > 0 {
        debug!(source = source_id, skipped, "dropped malformed table rows");
    }

    postings
}

/// The header is the first pipe-delimited row carrying both a `Company` and
/// a `Role` column.
fn is_header_row(line: &str) -> bool {
    if !line.contains('|') {
        return false;
    }
    let mut has_company = false;
    let mut has_role = false;
    for cell in line.split('|') {
        match cell.trim() {
            "Company" => has_company = true,
            "Role" => has_role = true,
            _ => {}
        }
    }
    has_company && has_role
}

fn parse_row(line: &str, source_id: &str, carry_over: &mut Option<String>) -> Option<Posting> {
    let mut cells: Vec<&str> = line.split('|').map(str::trim).collect();
    // The bounding pipes produce empty first/last fields.
    if cells.first() == Some(&"") {
        cells.remove(0);
    }
    if cells.last() == Some(&"") {
        cells.pop();
    }
    if cells.len() < 4 {
        return None;
    }

    let company = resolve_company(cells[0], carry_over)?;
    let role = cells[1].to_string();
    if role.is_empty() {
        return None;
    }
    let location = clean_location(cells[2]);
    let link = extract_href(cells[3]);

    Some(Posting {
        company,
        role,
        location,
        link,
        source: source_id.to_string(),
    })
}

/// Resolve the company cell against the carry-over accumulator. A cleanup
/// that strips the cell to nothing skips the row without touching the
/// carry-over, so a following continuation row still resolves.
fn resolve_company(cell: &str, carry_over: &mut Option<String>) -> Option<String> {
    if cell == CONTINUATION_MARK {
        return carry_over.clone();
    }

    let cleaned = company_markup().replace_all(cell, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    *carry_over = Some(cleaned.to_string());
    Some(cleaned.to_string())
}

/// Line-break tags become ", " separators before the remaining inline HTML
/// is stripped; stripping first would silently join multi-city cells.
fn clean_location(cell: &str) -> String {
    let with_separators = line_break_tags().replace_all(cell, ", ");
    html_tags()
        .replace_all(&with_separators, "")
        .trim()
        .to_string()
}

fn extract_href(cell: &str) -> Option<String> {
    href_attribute()
        .captures(cell)
        .map(|caps| caps[1].to_string())
}
