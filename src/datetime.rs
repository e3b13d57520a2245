//! Module containing functionality related to BSON DateTimes.
//! For more information, see the documentation for the [`DateTime`] type.

use std::{
    fmt::{self, Display},
    time::{Duration, SystemTime},
};

#[cfg(feature = "chrono-0_4")]
use chrono::{LocalResult, TimeZone, Utc};
use time::{PrimitiveDateTime, format_description::well_known::Rfc3339};

use crate::error::{Error, Result};

/// Struct representing a BSON datetime.
/// Note: BSON datetimes have millisecond precision.
///
/// On the wire a datetime is only an instant, the number of milliseconds since the Unix epoch.
/// In memory it additionally remembers whether it should be treated as timezone-aware (anchored
/// to UTC) or naive (a wall-clock reading that happens to be in UTC). Decoding stamps this flag
/// from [`CodecOptions::tz_aware`](crate::CodecOptions::tz_aware); encoding ignores it. Two
/// datetimes are equal only if both their instant and their awareness match.
///
/// ```
/// # use lazybson::DateTime;
/// let naive = DateTime::from_millis(1_500_000_000_000);
/// let aware = naive.with_tz_aware(true);
/// assert_eq!(naive.timestamp_millis(), aware.timestamp_millis());
/// assert_ne!(naive, aware);
/// assert_eq!(aware.to_string(), "2017-07-14T02:40:00Z");
/// assert_eq!(naive.to_string(), "2017-07-14T02:40:00");
/// ```
#[derive(Eq, PartialEq, Hash, Copy, Clone)]
pub struct DateTime {
    millis: i64,
    tz_aware: bool,
}

impl crate::DateTime {
    /// The latest possible date that can be represented in BSON.
    pub const MAX: Self = Self::from_millis(i64::MAX);

    /// The earliest possible date that can be represented in BSON.
    pub const MIN: Self = Self::from_millis(i64::MIN);

    /// Makes a new naive [`DateTime`] from the number of non-leap milliseconds since
    /// January 1, 1970 0:00:00 UTC (aka "UNIX timestamp").
    pub const fn from_millis(date: i64) -> Self {
        Self {
            millis: date,
            tz_aware: false,
        }
    }

    /// Returns a timezone-aware [`DateTime`] which corresponds to the current date and time.
    pub fn now() -> DateTime {
        Self::from_system_time(SystemTime::now()).with_tz_aware(true)
    }

    /// Returns a copy of this [`DateTime`] with the given timezone awareness.
    pub const fn with_tz_aware(self, tz_aware: bool) -> Self {
        Self {
            millis: self.millis,
            tz_aware,
        }
    }

    /// Whether this datetime is anchored to UTC rather than naive.
    pub const fn is_tz_aware(self) -> bool {
        self.tz_aware
    }

    /// Returns the number of non-leap-milliseconds since January 1, 1970 UTC.
    pub const fn timestamp_millis(self) -> i64 {
        self.millis
    }

    /// Convert the given [`chrono::DateTime`] into a timezone-aware [`DateTime`], truncating it
    /// to millisecond precision.
    #[cfg(feature = "chrono-0_4")]
    pub fn from_chrono<T: chrono::TimeZone>(dt: chrono::DateTime<T>) -> Self {
        Self::from_millis(dt.timestamp_millis()).with_tz_aware(true)
    }

    /// Convert this [`DateTime`] to a [`chrono::DateTime<Utc>`].
    ///
    /// Note: Not every BSON datetime can be represented as a [`chrono::DateTime`]. For such dates,
    /// [`chrono::DateTime::MIN_UTC`] or [`chrono::DateTime::MAX_UTC`] will be returned, whichever
    /// is closer.
    #[cfg(feature = "chrono-0_4")]
    pub fn to_chrono(self) -> chrono::DateTime<Utc> {
        match Utc.timestamp_millis_opt(self.millis) {
            LocalResult::Single(dt) => dt,
            _ => {
                if self.millis < 0 {
                    chrono::DateTime::<Utc>::MIN_UTC
                } else {
                    chrono::DateTime::<Utc>::MAX_UTC
                }
            }
        }
    }

    /// Convert the given [`time::OffsetDateTime`] into a timezone-aware [`DateTime`], truncating
    /// it to millisecond precision.
    pub fn from_time_0_3(dt: time::OffsetDateTime) -> Self {
        let millis = dt.unix_timestamp_nanos() / 1_000_000;
        let millis = match i64::try_from(millis) {
            Ok(ts) => ts,
            _ => {
                if millis > 0 {
                    i64::MAX
                } else {
                    i64::MIN
                }
            }
        };
        Self::from_millis(millis).with_tz_aware(true)
    }

    /// Convert this [`DateTime`] to a UTC [`time::OffsetDateTime`].
    ///
    /// Note: Not every BSON datetime can be represented as a [`time::OffsetDateTime`]. For such
    /// dates, [`time::PrimitiveDateTime::MIN`] or [`time::PrimitiveDateTime::MAX`] will be
    /// returned, whichever is closer.
    pub fn to_time_0_3(self) -> time::OffsetDateTime {
        match self.to_time_opt() {
            Some(dt) => dt,
            None if self.millis < 0 => PrimitiveDateTime::MIN.assume_utc(),
            None => PrimitiveDateTime::MAX.assume_utc(),
        }
    }

    /// Convert this [`DateTime`] to a [`time::PrimitiveDateTime`] holding the UTC wall clock,
    /// the natural form of a naive datetime.
    pub fn to_naive(self) -> PrimitiveDateTime {
        let dt = self.to_time_0_3();
        PrimitiveDateTime::new(dt.date(), dt.time())
    }

    fn to_time_opt(self) -> Option<time::OffsetDateTime> {
        time::OffsetDateTime::UNIX_EPOCH.checked_add(time::Duration::milliseconds(self.millis))
    }

    /// Convert the given [`std::time::SystemTime`] to a naive [`DateTime`].
    ///
    /// If the provided time is too far in the future or too far in the past to be represented
    /// by a BSON datetime, either [`DateTime::MAX`] or [`DateTime::MIN`] will be
    /// returned, whichever is closer.
    pub fn from_system_time(st: SystemTime) -> Self {
        match st.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(d) => {
                if d.as_millis() <= i64::MAX as u128 {
                    Self::from_millis(d.as_millis() as i64)
                } else {
                    Self::MAX
                }
            }
            // handle SystemTime from before the Unix Epoch
            Err(e) => {
                let millis = e.duration().as_millis();
                if millis > i64::MAX as u128 {
                    Self::MIN
                } else {
                    Self::from_millis(-(millis as i64))
                }
            }
        }
    }

    /// Convert this [`DateTime`] to a [`std::time::SystemTime`].
    pub fn to_system_time(self) -> SystemTime {
        if self.millis >= 0 {
            SystemTime::UNIX_EPOCH + Duration::from_millis(self.millis as u64)
        } else {
            // need to convert to i128 before calculating absolute value since i64::MIN.abs()
            // overflows and panics.
            SystemTime::UNIX_EPOCH - Duration::from_millis((self.millis as i128).unsigned_abs() as u64)
        }
    }

    /// Convert this [`DateTime`] to an RFC 3339 formatted string.
    pub fn try_to_rfc3339_string(self) -> Result<String> {
        self.to_time_0_3()
            .format(&Rfc3339)
            .map_err(|e| Error::malformed_bytes(format!("cannot format datetime: {e}")))
    }

    /// Convert the given RFC 3339 formatted string to a timezone-aware [`DateTime`], truncating
    /// it to millisecond precision.
    pub fn parse_rfc3339_str(s: impl AsRef<str>) -> Result<Self> {
        let odt = time::OffsetDateTime::parse(s.as_ref(), &Rfc3339)
            .map_err(|e| Error::malformed_bytes(format!("invalid RFC 3339 datetime: {e}")))?;
        Ok(Self::from_time_0_3(odt))
    }
}

impl fmt::Debug for crate::DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tup = f.debug_tuple("DateTime");
        match self.to_time_opt() {
            Some(dt) if self.tz_aware => tup.field(&dt),
            Some(dt) => tup.field(&PrimitiveDateTime::new(dt.date(), dt.time())),
            _ => tup.field(&self.millis),
        };
        tup.finish()
    }
}

impl Display for crate::DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(dt) = self.to_time_opt() else {
            return Display::fmt(&self.millis, f);
        };
        let (date, time) = (dt.date(), dt.time());
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            date.year(),
            u8::from(date.month()),
            date.day(),
            time.hour(),
            time.minute(),
            time.second()
        )?;
        if time.millisecond() != 0 {
            write!(f, ".{:03}", time.millisecond())?;
        }
        if self.tz_aware {
            f.write_str("Z")?;
        }
        Ok(())
    }
}

impl From<SystemTime> for crate::DateTime {
    fn from(st: SystemTime) -> Self {
        Self::from_system_time(st)
    }
}

impl From<crate::DateTime> for SystemTime {
    fn from(dt: crate::DateTime) -> Self {
        dt.to_system_time()
    }
}

#[cfg(feature = "chrono-0_4")]
impl From<crate::DateTime> for chrono::DateTime<Utc> {
    fn from(bson_dt: DateTime) -> Self {
        bson_dt.to_chrono()
    }
}

#[cfg(feature = "chrono-0_4")]
impl<T: chrono::TimeZone> From<chrono::DateTime<T>> for crate::DateTime {
    fn from(x: chrono::DateTime<T>) -> Self {
        Self::from_chrono(x)
    }
}

impl From<time::OffsetDateTime> for crate::DateTime {
    fn from(x: time::OffsetDateTime) -> Self {
        Self::from_time_0_3(x)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rfc3339_round_trip() {
        let dt = DateTime::parse_rfc3339_str("1998-02-12T00:01:00.023Z").unwrap();
        assert!(dt.is_tz_aware());
        assert_eq!(dt.timestamp_millis(), 887_241_660_023);
        assert_eq!(dt.try_to_rfc3339_string().unwrap(), "1998-02-12T00:01:00.023Z");
    }

    #[test]
    fn pre_epoch_system_time() {
        let dt = DateTime::from_millis(-1_500);
        assert_eq!(DateTime::from_system_time(dt.to_system_time()), dt);
    }

    #[test]
    fn out_of_range_display_falls_back_to_millis() {
        assert_eq!(DateTime::MAX.to_string(), i64::MAX.to_string());
    }

    #[test]
    fn naive_wall_clock() {
        let dt = DateTime::from_millis(0);
        let naive = dt.to_naive();
        assert_eq!(naive.year(), 1970);
        assert_eq!(naive.hour(), 0);
    }
}
