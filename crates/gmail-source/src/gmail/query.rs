//! Gmail search query composition
//!
//! Gmail's `q` grammar ANDs space-separated terms, so every filter here is
//! appended as another term.

use chrono::{Datelike, NaiveDate};

/// Excludes SPAM and TRASH from message listing
const SPAM_TRASH_EXCLUSION: &str = "-in:spam -in:trash";

/// Filters the gateway adds to every list call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub include_spam_trash: bool,
    pub start_date: Option<String>,
}

/// `after:YYYY/M/D` with no zero padding
pub fn after_clause(date: NaiveDate) -> String {
    format!("after:{}/{}/{}", date.year(), date.month(), date.day())
}

/// Clause for a configured ISO-8601 start date
///
/// Only the calendar date is used. A value whose date part does not parse
/// is passed through verbatim rather than failing the run.
pub fn start_date_clause(start_date: &str) -> String {
    let date_part = start_date.split('T').next().unwrap_or_default();
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => after_clause(date),
        Err(_) => {
            log::warn!("Could not parse start date {:?}, using it as-is", start_date);
            format!("after:{}", start_date)
        }
    }
}

/// Final `q` parameter for a list call
pub fn compose_list_query(base_query: &str, filter: &ListFilter) -> String {
    let mut parts: Vec<String> = Vec::new();

    let base_query = base_query.trim();
    if !base_query.is_empty() {
        parts.push(base_query.to_string());
    }

    if !filter.include_spam_trash {
        parts.push(SPAM_TRASH_EXCLUSION.to_string());
    }

    if let Some(start_date) = &filter.start_date {
        parts.push(start_date_clause(start_date));
    }

    parts.join(" ")
}
