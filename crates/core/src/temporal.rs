//! Calendar conversions for date and timestamp values.
//!
//! Dates are days since 1970-01-01, timestamps are microseconds since
//! 1970-01-01 00:00:00 UTC. Conversions use the proleptic Gregorian calendar.

use crate::error::{Error, Result};
use alloc::format;
use core::fmt;

/// Microseconds in one day.
pub const MICROS_PER_DAY: i64 = 86_400_000_000;

const MICROS_PER_SECOND: i64 = 1_000_000;

/// Converts a civil date to days since the Unix epoch.
pub fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u64;
    let mp = ((month + 9) % 12) as u64;
    let doy = (153 * mp + 2) / 5 + day as u64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe as i64 - 719_468
}

/// Converts days since the Unix epoch to a civil (year, month, day).
pub fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    (if m <= 2 { y + 1 } else { y }, m, d)
}

/// Parses `YYYY-MM-DD` into days since the epoch.
pub fn parse_date(s: &str) -> Result<i32> {
    let invalid = || Error::type_error(format!("cannot parse '{}' as date", s));
    let mut parts = s.trim().splitn(3, '-');
    let year: i64 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let month: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let day: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
        return Err(invalid());
    }
    i32::try_from(days_from_civil(year, month, day)).map_err(|_| invalid())
}

/// Parses `YYYY-MM-DD[ HH:MM:SS[.ffffff]]` (a `T` separator is accepted)
/// into microseconds since the epoch.
pub fn parse_timestamp(s: &str) -> Result<i64> {
    let invalid = || Error::type_error(format!("cannot parse '{}' as timestamp", s));
    let s = s.trim();
    let (date_part, time_part) = match s.find(|c: char| c == ' ' || c == 'T') {
        Some(pos) => (&s[..pos], Some(&s[pos + 1..])),
        None => (s, None),
    };
    let days = parse_date(date_part).map_err(|_| invalid())? as i64;
    let mut micros = days * MICROS_PER_DAY;

    if let Some(time) = time_part {
        let (hms, fraction) = match time.find('.') {
            Some(pos) => (&time[..pos], Some(&time[pos + 1..])),
            None => (time, None),
        };
        let mut fields = hms.splitn(3, ':');
        let hour: i64 = fields.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let minute: i64 = fields.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let second: i64 = fields.next().map_or(Some(0), |p| p.parse().ok()).ok_or_else(invalid)?;
        if hour > 23 || minute > 59 || second > 59 || hour < 0 || minute < 0 || second < 0 {
            return Err(invalid());
        }
        micros += (hour * 3600 + minute * 60 + second) * MICROS_PER_SECOND;

        if let Some(frac) = fraction {
            if frac.is_empty() || frac.len() > 6 || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            let mut value: i64 = frac.parse().map_err(|_| invalid())?;
            for _ in frac.len()..6 {
                value *= 10;
            }
            micros += value;
        }
    }
    Ok(micros)
}

fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
            if leap {
                29
            } else {
                28
            }
        }
    }
}

/// Writes a date as `YYYY-MM-DD`.
pub fn fmt_date(days: i32, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let (y, m, d) = civil_from_days(days as i64);
    write!(f, "{:04}-{:02}-{:02}", y, m, d)
}

/// Writes a timestamp as `YYYY-MM-DD HH:MM:SS[.ffffff]`.
pub fn fmt_timestamp(micros: i64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let days = micros.div_euclid(MICROS_PER_DAY);
    let rem = micros.rem_euclid(MICROS_PER_DAY);
    let (y, m, d) = civil_from_days(days);
    let secs = rem / MICROS_PER_SECOND;
    let frac = rem % MICROS_PER_SECOND;
    write!(
        f,
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        y,
        m,
        d,
        secs / 3600,
        (secs / 60) % 60,
        secs % 60
    )?;
    if frac != 0 {
        write!(f, ".{:06}", frac)?;
    }
    Ok(())
}
