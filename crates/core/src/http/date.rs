//! HTTP-date formatting and parsing.
//!
//! Output is always IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`). Input also
//! accepts the obsolete RFC 850 and asctime forms.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
const RFC_850: &str = "%A, %d-%b-%y %H:%M:%S GMT";
const ASCTIME: &str = "%a %b %e %H:%M:%S %Y";

/// Format a timestamp as an IMF-fixdate.
pub fn format_http_date(time: &DateTime<Utc>) -> String {
    time.format(IMF_FIXDATE).to_string()
}

/// Parse any of the three HTTP-date forms.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    [IMF_FIXDATE, RFC_850, ASCTIME]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Drop sub-second precision; HTTP-dates carry whole seconds only.
pub fn truncate_to_seconds(time: DateTime<Utc>) -> DateTime<Utc> {
    time.trunc_subsecs(0)
}
