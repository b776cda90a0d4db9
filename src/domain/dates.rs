//! Calendar input parsing and canonical timestamp rendering.

use time::{
    Date, OffsetDateTime, UtcOffset, format_description::FormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};

use super::error::DomainError;

const DATE_ONLY_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const ISO_MILLIS_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
);

/// Parse a client supplied date, accepting either RFC 3339 timestamps or bare
/// `YYYY-MM-DD` dates (interpreted as midnight UTC).
pub fn parse_date_input(field: &'static str, raw: &str) -> Result<OffsetDateTime, DomainError> {
    let trimmed = raw.trim();
    if let Ok(timestamp) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(timestamp);
    }

    Date::parse(trimmed, DATE_ONLY_FORMAT)
        .map(|date| date.midnight().assume_utc())
        .map_err(|_| DomainError::validation(format!("`{field}` is not a valid date: {trimmed}")))
}

/// Render a timestamp as UTC with millisecond precision, e.g. `2024-03-01T00:00:00.000Z`.
pub fn iso_millis(timestamp: OffsetDateTime) -> String {
    timestamp
        .to_offset(UtcOffset::UTC)
        .format(ISO_MILLIS_FORMAT)
        .unwrap_or_else(|_| timestamp.unix_timestamp().to_string())
}
