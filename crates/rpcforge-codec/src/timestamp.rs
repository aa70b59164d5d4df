// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timestamp rendering and parsing per a schema's `timestampFormat` trait.

use chrono::{DateTime, Utc};
use rpcforge_schema::TimestampFormat;

use crate::error::CodecError;

/// Render a timestamp (stored internally as RFC 3339) in the wire format
/// `format` demands.
pub fn render(value: &str, format: TimestampFormat) -> Result<String, CodecError> {
    let parsed = parse_rfc3339(value)?;
    Ok(match format {
        TimestampFormat::DateTime => parsed.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        TimestampFormat::HttpDate => parsed.to_rfc2822().replace("+0000", "GMT"),
        TimestampFormat::EpochSeconds => format_epoch(parsed),
    })
}

/// Parse a wire-format timestamp string into the canonical RFC 3339 form
/// used internally.
pub fn parse(value: &str, format: TimestampFormat) -> Result<String, CodecError> {
    let parsed = match format {
        TimestampFormat::DateTime => parse_rfc3339(value)?,
        TimestampFormat::HttpDate => DateTime::parse_from_rfc2822(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| invalid(value, "http-date"))?,
        TimestampFormat::EpochSeconds => {
            let secs: f64 = value.parse().map_err(|_| invalid(value, "epoch-seconds"))?;
            DateTime::from_timestamp(secs.trunc() as i64, (secs.fract() * 1e9) as u32)
                .ok_or_else(|| invalid(value, "epoch-seconds"))?
        }
    };
    Ok(parsed.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true))
}

/// Parse an epoch-seconds number (as read directly off a CBOR/JSON numeric
/// node rather than a string) into canonical RFC 3339.
pub fn parse_epoch_number(secs: f64) -> Result<String, CodecError> {
    DateTime::from_timestamp(secs.trunc() as i64, (secs.fract() * 1e9) as u32)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true))
        .ok_or_else(|| invalid(&secs.to_string(), "epoch-seconds"))
}

/// Render a canonical RFC 3339 timestamp as an epoch-seconds number, used
/// when CBOR tag 1 or a JSON epoch-seconds member needs a numeric node.
pub fn to_epoch_number(value: &str) -> Result<f64, CodecError> {
    let parsed = parse_rfc3339(value)?;
    Ok(parsed.timestamp() as f64 + f64::from(parsed.timestamp_subsec_nanos()) / 1e9)
}

fn format_epoch(dt: DateTime<Utc>) -> String {
    let nanos = dt.timestamp_subsec_nanos();
    if nanos == 0 {
        dt.timestamp().to_string()
    } else {
        format!("{}.{:09}", dt.timestamp(), nanos).trim_end_matches('0').to_string()
    }
}

fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>, CodecError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| invalid(value, "date-time"))
}

fn invalid(value: &str, format: &'static str) -> CodecError {
    CodecError::InvalidTimestamp {
        value: value.to_string(),
        format,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_date_round_trips_through_rfc3339() {
        let original = "2020-10-16T12:00:00Z";
        let rendered = render(original, TimestampFormat::HttpDate).unwrap();
        assert_eq!(rendered, "Fri, 16 Oct 2020 12:00:00 GMT");
        let parsed_back = parse(&rendered, TimestampFormat::HttpDate).unwrap();
        assert_eq!(parsed_back, "2020-10-16T12:00:00+00:00");
    }

    #[test]
    fn epoch_seconds_round_trip() {
        let original = "2020-10-16T12:00:00Z";
        let epoch = to_epoch_number(original).unwrap();
        assert_eq!(epoch, 1_602_849_600.0);
        let back = parse_epoch_number(epoch).unwrap();
        assert_eq!(back, "2020-10-16T12:00:00+00:00");
    }

    #[test]
    fn malformed_http_date_is_invalid_timestamp_error() {
        let err = parse("not a date", TimestampFormat::HttpDate).unwrap_err();
        assert!(matches!(err, CodecError::InvalidTimestamp { .. }));
    }
}
