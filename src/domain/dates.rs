//! Publication date normalisation.
//!
//! Authors write dates in a handful of shapes. Every accepted shape is
//! normalised to a UTC instant truncated to whole seconds, which keeps the
//! stored RFC 3339 text fixed-width and therefore sortable as a string.

use thiserror::Error;
use time::{
    Date, OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339,
    macros::format_description,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("unable to parse date `{value}`")]
    InvalidDate { value: String },
}

/// Shapes accepted for the `date` metadata field, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcceptedFormat {
    /// `2025-09-12`, interpreted as midnight UTC.
    PlainDate,
    /// `2025-09-12 10:30:00 +02:00`.
    DateTimeOffset,
    /// `2025-09-12T10:30:00Z`, `2025-09-12T10:30:00.5+02:00`.
    Rfc3339,
}

const ACCEPTED_FORMATS: [AcceptedFormat; 3] = [
    AcceptedFormat::PlainDate,
    AcceptedFormat::DateTimeOffset,
    AcceptedFormat::Rfc3339,
];

impl AcceptedFormat {
    fn parse(self, value: &str) -> Option<OffsetDateTime> {
        match self {
            AcceptedFormat::PlainDate => Date::parse(value, format_description!("[year]-[month]-[day]"))
                .ok()
                .map(|date| date.midnight().assume_utc()),
            AcceptedFormat::DateTimeOffset => OffsetDateTime::parse(
                value,
                format_description!(
                    "[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory]:[offset_minute]"
                ),
            )
            .ok(),
            AcceptedFormat::Rfc3339 => OffsetDateTime::parse(value, &Rfc3339).ok(),
        }
    }
}

/// Normalise an author-supplied date.
///
/// An empty value resolves to `now`. A non-empty value that matches none of
/// the accepted shapes is rejected.
pub fn normalize_date(value: &str, now: OffsetDateTime) -> Result<OffsetDateTime, DateError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(to_storage_precision(now));
    }

    ACCEPTED_FORMATS
        .iter()
        .find_map(|format| format.parse(trimmed))
        .map(to_storage_precision)
        .ok_or_else(|| DateError::InvalidDate {
            value: value.to_string(),
        })
}

/// Current time at storage precision.
pub fn now_utc() -> OffsetDateTime {
    to_storage_precision(OffsetDateTime::now_utc())
}

/// Convert to UTC and drop sub-second precision.
pub fn to_storage_precision(value: OffsetDateTime) -> OffsetDateTime {
    let utc = value.to_offset(UtcOffset::UTC);
    utc.replace_nanosecond(0).unwrap_or(utc)
}

/// Render a timestamp as fixed-width RFC 3339 UTC text.
pub fn format_timestamp(value: OffsetDateTime) -> Result<String, time::error::Format> {
    to_storage_precision(value).format(&Rfc3339)
}

/// Parse RFC 3339 text previously produced by [`format_timestamp`].
pub fn parse_timestamp(value: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(value, &Rfc3339)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    const NOW: OffsetDateTime = datetime!(2025-10-01 08:15:30.250 UTC);

    #[test]
    fn empty_date_defaults_to_now() {
        let value = normalize_date("", NOW).expect("empty date is accepted");
        assert_eq!(value, datetime!(2025-10-01 08:15:30 UTC));

        let formatted = format_timestamp(value).expect("formats");
        assert!(parse_timestamp(&formatted).is_ok());
    }

    #[test]
    fn plain_date_is_midnight_utc() {
        let value = normalize_date("2025-09-12", NOW).expect("plain date parses");
        assert_eq!(value, datetime!(2025-09-12 00:00:00 UTC));
    }

    #[test]
    fn rfc3339_with_offset_is_converted_to_utc() {
        let value = normalize_date("2025-09-12T10:30:00+02:00", NOW).expect("rfc3339 parses");
        assert_eq!(value, datetime!(2025-09-12 08:30:00 UTC));

        let zulu = normalize_date("2025-09-12T10:30:00Z", NOW).expect("zulu parses");
        assert_eq!(zulu, datetime!(2025-09-12 10:30:00 UTC));
    }

    #[test]
    fn spaced_datetime_with_offset_parses() {
        let value = normalize_date("2025-09-12 10:30:00 -05:00", NOW).expect("spaced form parses");
        assert_eq!(value, datetime!(2025-09-12 15:30:00 UTC));
    }

    #[test]
    fn fractional_seconds_are_truncated() {
        let value = normalize_date("2025-09-12T10:30:00.987Z", NOW).expect("fractional parses");
        assert_eq!(format_timestamp(value).unwrap(), "2025-09-12T10:30:00Z");
    }

    #[test]
    fn garbage_is_rejected() {
        let err = normalize_date("invalid-date", NOW).unwrap_err();
        assert_eq!(
            err,
            DateError::InvalidDate {
                value: "invalid-date".to_string()
            }
        );
    }

    #[test]
    fn formatted_timestamps_sort_chronologically() {
        let earlier = format_timestamp(datetime!(2025-09-12 09:59:59 UTC)).unwrap();
        let later = format_timestamp(datetime!(2025-09-12 10:00:00.5 UTC)).unwrap();
        assert!(earlier < later);
        assert_eq!(earlier.len(), later.len());
    }
}
