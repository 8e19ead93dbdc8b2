use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::model::{Asset, AssetId};

/// Read access to the fields the filter engine looks at.
/// Every field apart from the id may be missing on a record.
pub trait AssetView {
    fn id(&self) -> AssetId;
    fn name(&self) -> Option<&str>;
    fn tags(&self) -> Option<&[String]>;
    /// Lowercase file extension
    fn file_type(&self) -> Option<&str>;
    fn uploaded_at(&self) -> Option<UploadTime>;
}

/// Upload timestamp of a record. A timestamp sent without a zone or offset is
/// wall clock time and reads the same in every timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum UploadTime {
    Instant(DateTime<Utc>),
    Floating(NaiveDateTime),
}

impl UploadTime {
    /// Wall clock time of the upload as seen in `tz`.
    pub fn local_in<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDateTime {
        match self {
            UploadTime::Instant(instant) => instant.with_timezone(tz).naive_local(),
            UploadTime::Floating(naive) => *naive,
        }
    }
}

impl From<DateTime<Utc>> for UploadTime {
    fn from(value: DateTime<Utc>) -> Self {
        UploadTime::Instant(value)
    }
}

impl AssetView for Asset {
    fn id(&self) -> AssetId {
        self.id
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn tags(&self) -> Option<&[String]> {
        self.tags.as_deref()
    }

    fn file_type(&self) -> Option<&str> {
        Some(self.ty.as_ref())
    }

    fn uploaded_at(&self) -> Option<UploadTime> {
        Some(self.uploaded_at.into())
    }
}

/// An asset as a client sees it after decoding the JSON list returned by the
/// server. Decoding never fails on a malformed optional field: a field with
/// the wrong shape is read as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: AssetId,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub file_url: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub ty: Option<String>,
    #[serde(default, deserialize_with = "lenient_size")]
    pub size: Option<i64>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub uploaded_at: Option<UploadTime>,
    /// Timestamp set by the client before the server assigned `uploaded_at`
    #[serde(
        rename = "uploadDate",
        default,
        deserialize_with = "lenient_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub upload_date: Option<UploadTime>,
}

impl AssetView for AssetRecord {
    fn id(&self) -> AssetId {
        self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn tags(&self) -> Option<&[String]> {
        self.tags.as_deref()
    }

    fn file_type(&self) -> Option<&str> {
        self.ty.as_deref()
    }

    fn uploaded_at(&self) -> Option<UploadTime> {
        self.uploaded_at.or(self.upload_date)
    }
}

impl From<Asset> for AssetRecord {
    fn from(value: Asset) -> Self {
        AssetRecord {
            id: value.id,
            name: Some(value.name),
            file_url: Some(value.file_url),
            ty: Some(value.ty.to_string()),
            size: Some(value.size),
            tags: value.tags,
            uploaded_at: Some(value.uploaded_at.into()),
            upload_date: None,
        }
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_size<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Ok(Value::deserialize(d)?.as_i64())
}

/// Keeps the string entries of an array. Anything that is not an array is absent.
fn lenient_tags<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<String>>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(values) => Some(
            values
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

/// Accepts RFC 3339 strings, zone-less `YYYY-MM-DDTHH:MM:SS[.fff]` strings
/// (kept as wall clock time) and unix milliseconds.
fn lenient_datetime<'de, D: Deserializer<'de>>(d: D) -> Result<Option<UploadTime>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => parse_upload_time(&s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .map(UploadTime::Instant),
        _ => None,
    })
}

pub(crate) fn parse_upload_time(s: &str) -> Option<UploadTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(UploadTime::Instant(dt.with_timezone(&Utc)));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(UploadTime::Floating)
}
