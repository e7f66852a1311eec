//! Ordering of model and dataset version strings.
//!
//! INTERLIS repositories publish versions in free-form notations such as
//! `2016-08-11`, `05.10.2018` or `1.4`. Versions are split into runs of
//! digits and runs of letters; separators only delimit runs. Digit runs
//! compare numerically and letter runs lexicographically, with a digit run
//! ranking above a letter run at the same position. A missing version ranks
//! below every present version, including the empty string.

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Number(String),
    Text(String),
}

impl Segment {
    fn new(run: String, numeric: bool) -> Self {
        if numeric {
            let trimmed = run.trim_start_matches('0');
            Self::Number(trimmed.to_owned())
        } else {
            Self::Text(run)
        }
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(lhs), Self::Number(rhs)) => {
                lhs.len().cmp(&rhs.len()).then_with(|| lhs.cmp(rhs))
            }
            (Self::Text(lhs), Self::Text(rhs)) => lhs.cmp(rhs),
            (Self::Number(_), Self::Text(_)) => Ordering::Greater,
            (Self::Text(_), Self::Number(_)) => Ordering::Less,
        }
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn segments(version: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut run = String::new();
    let mut numeric = false;
    for ch in version.chars() {
        if !ch.is_alphanumeric() {
            if !run.is_empty() {
                out.push(Segment::new(std::mem::take(&mut run), numeric));
            }
            continue;
        }
        let digit = ch.is_ascii_digit();
        if !run.is_empty() && digit != numeric {
            out.push(Segment::new(std::mem::take(&mut run), numeric));
        }
        numeric = digit;
        run.push(ch);
    }
    if !run.is_empty() {
        out.push(Segment::new(run, numeric));
    }
    out
}

/// Compare two optional version strings.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use ilicache_core::compare_versions;
///
/// assert_eq!(compare_versions(Some("10"), Some("9")), Ordering::Greater);
/// assert_eq!(compare_versions(None, Some("")), Ordering::Less);
/// assert_eq!(
///     compare_versions(Some("2016-08-11"), Some("2016-8-11")),
///     Ordering::Equal
/// );
/// ```
#[must_use]
pub fn compare_versions(lhs: Option<&str>, rhs: Option<&str>) -> Ordering {
    match (lhs, rhs) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(left), Some(right)) => segments(left).cmp(&segments(right)),
    }
}
