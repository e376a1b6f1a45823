use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A stored mapping target together with its click counter.
///
/// `created_at` is local wall-clock time without an offset, kept to
/// microsecond precision and written as `YYYY-MM-DDTHH:MM:SS.ffffff`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub long_url: String,
    #[serde(with = "micros")]
    pub created_at: NaiveDateTime,
    pub clicks: u64,
}

/// A record paired with the short code that keys it, used for listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub short_code: String,
    pub record: Record,
}

mod micros {
    use chrono::NaiveDateTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    const WRITE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
    // Fraction is optional on read.
    const READ_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(WRITE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, READ_FORMAT).map_err(D::Error::custom)
    }
}
