//! Text rules shared by the entities: slugs, read time and field checks.

use lazy_regex::{Lazy, Regex, lazy_regex};

use crate::error::DomainError;

/// Average reading speed used for `read_time_minutes`.
pub const WORDS_PER_MINUTE: usize = 200;

static SLUG_STRIP: Lazy<Regex> = lazy_regex!(r"[^a-z0-9 -]");
static WHITESPACE_RUN: Lazy<Regex> = lazy_regex!(r"\s+");
static HYPHEN_RUN: Lazy<Regex> = lazy_regex!(r"-+");
static HTML_TAG: Lazy<Regex> = lazy_regex!(r"<[^>]*>");
static EMAIL: Lazy<Regex> =
    lazy_regex!(r"^[A-Za-z0-9]{1}[A-Za-z0-9._%+-]*@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$");
static HEX_COLOR: Lazy<Regex> = lazy_regex!(r"^#([0-9A-Fa-f]{3}|[0-9A-Fa-f]{6})$");

/// Build a URL slug from a title or name.
///
/// Lowercases, drops anything outside `[a-z0-9 -]`, turns whitespace runs
/// into single hyphens, collapses hyphen runs and trims hyphens at both ends.
///
/// ```
/// use quill_core::domain::text::slugify;
///
/// assert_eq!(slugify("Hello, World!!"), "hello-world");
/// ```
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    let stripped = SLUG_STRIP.replace_all(&lowered, "");
    let hyphenated = WHITESPACE_RUN.replace_all(&stripped, "-");
    let collapsed = HYPHEN_RUN.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// Number of words in an HTML body once tags are removed.
pub fn word_count(html: &str) -> usize {
    HTML_TAG.replace_all(html, " ").split_whitespace().count()
}

/// Estimated minutes to read an HTML body, never less than one.
pub fn read_time_minutes(html: &str) -> i32 {
    let minutes = word_count(html).div_ceil(WORDS_PER_MINUTE).max(1);
    i32::try_from(minutes).unwrap_or(i32::MAX)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

pub fn is_valid_color(color: &str) -> bool {
    HEX_COLOR.is_match(color)
}

/// Trim a required field and check its length.
pub fn required(field: &str, value: &str, max_chars: usize) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!("{field} is required")));
    }
    max_length(field, trimmed, max_chars)?;
    Ok(trimmed.to_string())
}

/// Check an optional field's length; blank values become `None`.
pub fn optional(
    field: &str,
    value: Option<String>,
    max_chars: usize,
) -> Result<Option<String>, DomainError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Ok(None),
        Some(v) => {
            max_length(field, &v, max_chars)?;
            Ok(Some(v))
        }
        None => Ok(None),
    }
}

fn max_length(field: &str, value: &str, max_chars: usize) -> Result<(), DomainError> {
    if value.chars().count() > max_chars {
        return Err(DomainError::Validation(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }
    Ok(())
}
