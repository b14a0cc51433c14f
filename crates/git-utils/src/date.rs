use std::fmt;

use bstr::{BStr, BString, ByteSlice};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};

use crate::error::UtilError;
use crate::Result;

/// A commit/tag timestamp as stored in an object body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GitDate {
    /// Seconds since Unix epoch.
    pub timestamp: i64,
    /// Timezone offset in minutes from UTC (e.g., -300 for EST).
    pub tz_offset: i32,
}

/// Convert a `±HHMM` field to signed minutes: `sign * (hours * 60 + minutes)`.
fn tz_field_to_minutes(field: &str) -> Result<i32> {
    let bytes = field.as_bytes();
    if bytes.len() != 5 || !bytes[1..].iter().all(u8::is_ascii_digit) {
        return Err(UtilError::DateParse(format!(
            "timezone must be ±HHMM, got '{field}'"
        )));
    }
    let sign = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => {
            return Err(UtilError::DateParse(format!(
                "timezone must start with a sign, got '{field}'"
            )))
        }
    };
    let digit = |i: usize| i32::from(bytes[i] - b'0');
    let hours = digit(1) * 10 + digit(2);
    let minutes = digit(3) * 10 + digit(4);
    Ok(sign * (hours * 60 + minutes))
}

impl GitDate {
    /// Create a GitDate from a Unix timestamp and timezone offset in minutes.
    pub fn new(timestamp: i64, tz_offset_minutes: i32) -> Self {
        Self {
            timestamp,
            tz_offset: tz_offset_minutes,
        }
    }

    /// Parse the raw object-body form: `"<unix-seconds> <±HHMM>"`.
    pub fn parse_raw(input: &str) -> Result<Self> {
        let (ts, tz) = input
            .trim()
            .split_once(' ')
            .ok_or_else(|| UtilError::DateParse(format!("expected '<seconds> <tz>', got '{input}'")))?;
        let timestamp = ts
            .parse::<i64>()
            .map_err(|_| UtilError::DateParse(format!("invalid timestamp '{ts}'")))?;
        Ok(Self {
            timestamp,
            tz_offset: tz_field_to_minutes(tz.trim())?,
        })
    }

    /// The instant as milliseconds since the Unix epoch.
    pub fn epoch_millis(&self) -> i64 {
        self.timestamp.saturating_mul(1000)
    }

    /// The instant in UTC, or `None` when the timestamp is outside chrono's range.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.timestamp, 0).single()
    }

    /// The instant in the author's own timezone.
    pub fn to_fixed_offset(&self) -> Option<DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.tz_offset * 60)?;
        offset.timestamp_opt(self.timestamp, 0).single()
    }
}

impl fmt::Display for GitDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.tz_offset < 0 { '-' } else { '+' };
        let abs = self.tz_offset.unsigned_abs();
        write!(f, "{} {}{:02}{:02}", self.timestamp, sign, abs / 60, abs % 60)
    }
}

/// An author, committer, or tagger line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: BString,
    pub email: BString,
    pub date: GitDate,
}

impl Signature {
    /// Parse from git format: `Name <email> timestamp tz`
    ///
    /// Example: "John Doe <john@example.com> 1234567890 +0000"
    pub fn parse(input: &BStr) -> Result<Self> {
        let input = input.as_bytes();

        let gt_pos = input
            .iter()
            .rposition(|&b| b == b'>')
            .ok_or_else(|| UtilError::SignatureParse("missing '>' in signature".into()))?;
        let lt_pos = input[..gt_pos]
            .iter()
            .rposition(|&b| b == b'<')
            .ok_or_else(|| UtilError::SignatureParse("missing '<' in signature".into()))?;

        let name = input[..lt_pos].trim();
        let email = &input[lt_pos + 1..gt_pos];
        let date_str = std::str::from_utf8(input[gt_pos + 1..].trim())
            .map_err(|_| UtilError::SignatureParse("non-UTF-8 date in signature".into()))?;

        Ok(Self {
            name: BString::from(name),
            email: BString::from(email),
            date: GitDate::parse_raw(date_str)?,
        })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> {}", self.name, self.email, self.date)
    }
}
