//! ISC date and time codecs.
//!
//! Firebird stores:
//! - DATE as a signed day number counted from 1858-11-17 (`ISC_DATE`)
//! - TIME as an unsigned count of 100 microsecond units since midnight (`ISC_TIME`)
//! - TIMESTAMP as the pair `(ISC_DATE, ISC_TIME)`
//!
//! The record accessors expose days since the Unix epoch and milliseconds of
//! the day, so sub-millisecond digits are dropped on read.

use crate::error::{Error, Result};
use crate::protocol::constants::{ISC_EPOCH_OFFSET_DAYS, ISC_TIME_UNITS_PER_MILLI};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;
const MILLIS_PER_DAY: i32 = 86_400_000;

/// ISC day number to days since 1970-01-01.
pub fn epoch_days_from_isc(isc_date: i32) -> i32 {
    isc_date - ISC_EPOCH_OFFSET_DAYS
}

/// Days since 1970-01-01 to an ISC day number.
pub fn isc_date_from_epoch_days(days: i32) -> i32 {
    days + ISC_EPOCH_OFFSET_DAYS
}

/// ISC time to milliseconds of the day.
pub fn millis_from_isc_time(isc_time: u32) -> i32 {
    (isc_time / ISC_TIME_UNITS_PER_MILLI as u32) as i32
}

/// Milliseconds of the day to ISC time.
pub fn isc_time_from_millis(millis: i32) -> u32 {
    (millis as u32).wrapping_mul(ISC_TIME_UNITS_PER_MILLI as u32)
}

/// Decode an ISC day number.
///
/// # Errors
/// Returns `Error::Protocol` if the day lies outside chrono's calendar.
pub fn decode_isc_date(isc_date: i32) -> Result<NaiveDate> {
    let days = epoch_days_from_isc(isc_date);
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| Error::protocol(format!("Invalid DATE: day number {}", isc_date)))
}

/// Encode a calendar date as an ISC day number.
pub fn encode_isc_date(date: NaiveDate) -> i32 {
    isc_date_from_epoch_days(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
}

/// Decode an ISC time.
///
/// # Errors
/// Returns `Error::Protocol` if the value is a day or more.
pub fn decode_isc_time(isc_time: u32) -> Result<NaiveTime> {
    let millis = millis_from_isc_time(isc_time);
    if !(0..MILLIS_PER_DAY).contains(&millis) {
        return Err(Error::protocol(format!("Invalid TIME: {} units", isc_time)));
    }
    let secs = (millis / 1000) as u32;
    let nanos = (millis % 1000) as u32 * 1_000_000;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
        .ok_or_else(|| Error::protocol(format!("Invalid TIME: {} units", isc_time)))
}

/// Encode a time of day as ISC time, truncated to milliseconds.
pub fn encode_isc_time(time: NaiveTime) -> u32 {
    // leap second nanos run past 1e9
    let millis = (time.nanosecond() / 1_000_000).min(999) as i32;
    isc_time_from_millis(time.num_seconds_from_midnight() as i32 * 1000 + millis)
}

/// Decode an ISC timestamp pair.
pub fn decode_isc_timestamp(isc_date: i32, isc_time: u32) -> Result<NaiveDateTime> {
    Ok(NaiveDateTime::new(
        decode_isc_date(isc_date)?,
        decode_isc_time(isc_time)?,
    ))
}

/// Encode a timestamp as the ISC pair.
pub fn encode_isc_timestamp(value: NaiveDateTime) -> (i32, u32) {
    (encode_isc_date(value.date()), encode_isc_time(value.time()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_offset() {
        assert_eq!(epoch_days_from_isc(40587), 0);
        assert_eq!(isc_date_from_epoch_days(0), 40587);
        assert_eq!(epoch_days_from_isc(0), -40587);
    }

    #[test]
    fn test_decode_unix_epoch() {
        let date = decode_isc_date(40587).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
    }

    #[test]
    fn test_decode_isc_day_zero() {
        // ISC day zero is the Modified Julian Day origin
        let date = decode_isc_date(0).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(1858, 11, 17).unwrap());
    }

    #[test]
    fn test_encode_date_2024_10_21() {
        let date = NaiveDate::from_ymd_opt(2024, 10, 21).unwrap();
        // 2024-10-21 is day 20017 after the Unix epoch
        assert_eq!(encode_isc_date(date), 20017 + 40587);
        assert_eq!(decode_isc_date(encode_isc_date(date)).unwrap(), date);
    }

    #[test]
    fn test_time_units() {
        assert_eq!(millis_from_isc_time(12_345_678), 1_234_567);
        assert_eq!(isc_time_from_millis(1_234_567), 12_345_670);
    }

    #[test]
    fn test_decode_time_last_millisecond() {
        let time = decode_isc_time(863_999_999).unwrap();
        assert_eq!(time.hour(), 23);
        assert_eq!(time.minute(), 59);
        assert_eq!(time.second(), 59);
        assert_eq!(time.nanosecond(), 999_000_000);
    }

    #[test]
    fn test_decode_time_out_of_range() {
        assert!(decode_isc_time(864_000_000).is_err());
    }

    #[test]
    fn test_timestamp_pair() {
        let ts = NaiveDate::from_ymd_opt(1999, 6, 15)
            .unwrap()
            .and_hms_milli_opt(12, 30, 45, 250)
            .unwrap();
        let (d, t) = encode_isc_timestamp(ts);
        assert_eq!(t, (12 * 3600 + 30 * 60 + 45) * 10_000 + 2_500);
        assert_eq!(decode_isc_timestamp(d, t).unwrap(), ts);
    }
}
