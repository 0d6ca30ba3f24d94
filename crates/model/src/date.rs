//! Timestamp helpers shared by the merge and aggregation passes.

use std::fmt::{Display, Formatter, Result as FmtResult};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Compare two optional timestamps by the instant they represent.
///
/// Equivalent instants expressed in different offsets are equal, and two
/// absent timestamps are equal.
pub fn same_instant(a: Option<OffsetDateTime>, b: Option<OffsetDateTime>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.unix_timestamp_nanos() == b.unix_timestamp_nanos(),
        (None, None) => true,
        _ => false,
    }
}

/// Renders an optional timestamp for change logs (RFC 3339, or `unset`).
#[derive(Debug, Clone, Copy)]
pub struct DisplayDate(pub Option<OffsetDateTime>);

impl Display for DisplayDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.0.map(|date| date.format(&Rfc3339)) {
            Some(Ok(formatted)) => write!(f, "{formatted}"),
            // Years outside 0..=9999 can't be expressed in RFC 3339.
            Some(Err(_)) => write!(f, "{:?}", self.0),
            None => write!(f, "unset"),
        }
    }
}
