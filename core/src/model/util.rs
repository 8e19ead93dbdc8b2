use chrono::{DateTime, TimeZone, Utc};
use eyre::{eyre, Context, Result};

/// milliseconds since UNIX epoch
pub fn datetime_to_db_repr(d: &DateTime<Utc>) -> i64 {
    d.timestamp_millis()
}

/// From milliseconds since UNIX epoch
pub fn datetime_from_db_repr(unix_millis: i64) -> Result<DateTime<Utc>> {
    match Utc.timestamp_millis_opt(unix_millis) {
        chrono::LocalResult::Single(dt) => Ok(dt),
        _ => Err(eyre!(
            "error converting unix millis epoch to DateTime: {}",
            unix_millis
        )),
    }
}

/// Tags are stored as a JSON array, an untagged asset as NULL.
pub fn tags_to_db_repr(tags: Option<&[String]>) -> Result<Option<String>> {
    tags.map(|tags| serde_json::to_string(tags).wrap_err("could not serialize tags"))
        .transpose()
}

pub fn tags_from_db_repr(s: Option<&str>) -> Result<Option<Vec<String>>> {
    s.map(|s| serde_json::from_str(s).wrap_err("could not parse tags from db value"))
        .transpose()
}
