use regex::{Regex, RegexBuilder};

use crate::{PaError, Result};

// Helper method for parsing tags
pub fn parse_tags(tags: Option<String>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// Keeps the first occurrence of every tag, dropping blanks.
pub fn dedup_tags<I>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut unique: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !unique.contains(&tag) {
            unique.push(tag);
        }
    }
    unique
}

/// Builds a case-insensitive matcher that treats `query` as literal text.
///
/// Blank queries are rejected with [`PaError::EmptyQuery`].
pub fn literal_matcher(query: &str, what: &'static str) -> Result<Regex> {
    if query.trim().is_empty() {
        return Err(PaError::EmptyQuery { what });
    }

    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .map_err(|e| PaError::InvalidRecord {
            kind: what,
            message: format!("could not build search pattern: {}", e),
        })
}
