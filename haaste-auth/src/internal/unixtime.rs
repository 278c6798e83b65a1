use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

//--------------------------------------------------------------------------------------------------
// Unix Timestamp handling
//--------------------------------------------------------------------------------------------------

pub const SESSION_LIFETIME: Duration = Duration::hours(24);

/// Whole seconds since the Unix epoch, as carried in the `exp` claim.
///
/// Kept as a raw number rather than an `OffsetDateTime` so that tokens with an `exp` far outside
/// the representable date range still decode and compare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnixTimestamp(i64);

impl Serialize for UnixTimestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

// Decoders hand `exp` over either as an integer or as a float, so accept both
impl<'de> Deserialize<'de> for UnixTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let number = serde_json::Number::deserialize(deserializer)?;

        if let Some(seconds) = number.as_i64() {
            return Ok(UnixTimestamp(seconds));
        }

        match number.as_f64() {
            // `as` truncates toward zero and saturates at the i64 bounds
            Some(seconds) => Ok(UnixTimestamp(seconds as i64)),
            None => Err(serde::de::Error::custom("timestamp is not a number")),
        }
    }
}

impl From<OffsetDateTime> for UnixTimestamp {
    fn from(datetime: OffsetDateTime) -> Self {
        UnixTimestamp(datetime.unix_timestamp())
    }
}

impl UnixTimestamp {
    pub fn seconds(self) -> i64 {
        self.0
    }

    pub fn add(self, duration: Duration) -> Self {
        UnixTimestamp(self.0.saturating_add(duration.whole_seconds()))
    }

    /// True when this instant lies strictly before `now`, compared at nanosecond precision.
    pub fn is_before(self, now: OffsetDateTime) -> bool {
        i128::from(self.0) * 1_000_000_000 < now.unix_timestamp_nanos()
    }
}

//--------------------------------------------------------------------------------------------------


//--------------------------------------------------------------------------------------------------
