// Copyright (c) 2025 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! GLONASS time
//!
//! GLONASS keeps time as Moscow time, broken down into a four-year period
//! counted from the most recent leap year, a day number within that period,
//! and milliseconds (plus a sub-millisecond fraction) within the day.
//! GLONASS time runs 3 hours ahead of UTC and, unlike GPS/Galileo/Beidou
//! time, it is kept synchronized to UTC: every UTC leap second is also
//! inserted into GLONASS time.

use crate::time::{consts, GpsTime, UtcParams};

/// Number of hours GLONASS (Moscow) time leads UTC by
const GLO_UTC_OFFSET_HOURS: f64 = 3.0;

/// Representation of GLONASS time: a four-year period, a day within that
/// period (`1..=1461`), and milliseconds (+ sub-ms fraction) within the day.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct GlonassTime {
    /// Four-year period number, counted from 1996
    four_year_period: u16,
    /// Day of the four-year period, `1..=1461`
    day_of_period: u16,
    /// Milliseconds since the start of the day
    ms_of_day: u32,
    /// Sub-millisecond fraction, `[0, 1)`
    sub_ms: f64,
}

impl GlonassTime {
    /// Builds a [`GlonassTime`] from its constituent parts without validation
    #[must_use]
    pub fn new(four_year_period: u16, day_of_period: u16, ms_of_day: u32, sub_ms: f64) -> Self {
        GlonassTime {
            four_year_period,
            day_of_period,
            ms_of_day,
            sub_ms,
        }
    }

    #[must_use]
    pub fn four_year_period(&self) -> u16 {
        self.four_year_period
    }

    #[must_use]
    pub fn day_of_period(&self) -> u16 {
        self.day_of_period
    }

    #[must_use]
    pub fn ms_of_day(&self) -> u32 {
        self.ms_of_day
    }

    #[must_use]
    pub fn sub_ms(&self) -> f64 {
        self.sub_ms
    }

    /// Converts a [`GpsTime`] to GLONASS time, applying the +3 hour Moscow
    /// offset and whichever set of leap seconds the caller provides.
    #[must_use]
    pub fn from_gps(gps: GpsTime, utc_params: &UtcParams) -> GlonassTime {
        let utc = gps.to_utc(utc_params);
        Self::from_utc_date(utc.year(), utc.day_of_year(), Self::ms_of_day_of(&utc))
    }

    /// As [`GlonassTime::from_gps`], but uses the hardcoded leap second table
    #[must_use]
    pub fn from_gps_hardcoded(gps: GpsTime) -> GlonassTime {
        let utc = gps.to_utc_hardcoded();
        Self::from_utc_date(utc.year(), utc.day_of_year(), Self::ms_of_day_of(&utc))
    }

    fn ms_of_day_of(utc: &crate::time::UtcTime) -> u32 {
        (u32::from(utc.hour()) * 3_600_000)
            + (u32::from(utc.minute()) * 60_000)
            + (utc.seconds() * 1000.0).round() as u32
    }

    fn from_utc_date(year: u16, day_of_year: u16, ms_of_day_utc: u32) -> GlonassTime {
        let four_year_period = (year - 1996) / 4;
        let period_start_year = 1996 + four_year_period * 4;
        let mut day_of_period = u16::from(period_start_year != year);
        for y in period_start_year..year {
            day_of_period += if crate::time::is_leap_year(y) { 366 } else { 365 };
        }
        day_of_period += day_of_year;

        let moscow_ms = i64::from(ms_of_day_utc) + (GLO_UTC_OFFSET_HOURS * 3_600_000.0) as i64;
        let (day_of_period, ms_of_day) = if moscow_ms >= i64::from(consts::DAY_SECS) * 1000 {
            (day_of_period + 1, (moscow_ms - i64::from(consts::DAY_SECS) * 1000) as u32)
        } else {
            (day_of_period, moscow_ms as u32)
        };

        GlonassTime {
            four_year_period,
            day_of_period,
            ms_of_day,
            sub_ms: 0.0,
        }
    }

    /// Millisecond offset from the start of the enclosing 2-second string
    #[must_use]
    pub fn ms_in_string(&self) -> u32 {
        self.ms_of_day % 2000
    }

    /// Index of the current 2-second string within the 30-second frame (0..15)
    #[must_use]
    pub fn string_in_frame(&self) -> u32 {
        (self.ms_of_day / 2000) % 15
    }

    /// Index of the current frame within the 5-frame, 150-second superframe (0..5)
    #[must_use]
    pub fn frame_in_superframe(&self) -> u32 {
        (self.ms_of_day / 30_000) % 5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_and_frame_indexing() {
        let t = GlonassTime::new(7, 100, 2_000 + 30_000 * 3, 0.0);
        assert_eq!(t.string_in_frame(), 1);
        assert_eq!(t.frame_in_superframe(), 3);
        assert_eq!(t.ms_in_string(), 0);
    }

    #[test]
    fn moscow_offset_rolls_day() {
        // 23:00 UTC + 3h Moscow offset rolls into the next day
        let ms_23h_utc = 23 * 3_600 * 1000;
        let t = GlonassTime::from_utc_date(2024, 10, ms_23h_utc);
        assert_eq!(t.day_of_period, 11);
        assert_eq!(t.ms_of_day, 2 * 3_600 * 1000);
    }
}
