//! # Calendar dates and timestamps
//!
//! Concentration records have a **day resolution**: each observation is keyed by an
//! [`ObsDate`]. Back-trajectories are started at `midnight + offset` hours around that day,
//! which is expressed as a [`hifitime::Epoch`] in the **UTC** time scale.
//!
//! Date strings are parsed with `nom` from the `YYYY-MM-DD` layout. A trailing time part
//! (`YYYY-MM-DD HH:MM` or `YYYY-MM-DDTHH:MM:SS`) is accepted and ignored.
use std::fmt;
use std::str::FromStr;

use hifitime::{Epoch, Unit};
use nom::{
    bytes::complete::take_while_m_n, character::complete::char, combinator::map_res,
    sequence::preceded, IResult, Parser,
};

use crate::constants::Hour;
use crate::pscf_errors::PscfError;

/// A calendar day (proleptic Gregorian, UTC).
///
/// The ordering is the chronological one, which is what the concentration record relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObsDate {
    year: i32,
    month: u8,
    day: u8,
}

impl ObsDate {
    /// Build a validated date.
    ///
    /// Return
    /// ----------
    /// * The date, or [`PscfError::InvalidDate`] if the day does not exist in the calendar.
    pub fn new(year: i32, month: u8, day: u8) -> Result<Self, PscfError> {
        Epoch::maybe_from_gregorian_utc(year, month, day, 0, 0, 0, 0)
            .map_err(|e| PscfError::InvalidDate(format!("{year:04}-{month:02}-{day:02} ({e})")))?;
        Ok(ObsDate { year, month, day })
    }

    /// Build a date from the two-digit year written in trajectory files.
    ///
    /// Years `>= 50` are mapped to the 1900s, the others to the 2000s.
    pub fn from_short_year(yy: u32, month: u8, day: u8) -> Result<Self, PscfError> {
        let year = if yy >= 100 {
            yy as i32
        } else if yy >= 50 {
            1900 + yy as i32
        } else {
            2000 + yy as i32
        };
        ObsDate::new(year, month, day)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    /// Midnight (UTC) of this day.
    pub fn midnight(&self) -> Epoch {
        Epoch::from_gregorian_utc_at_midnight(self.year, self.month, self.day)
    }

    /// Timestamp of a trajectory started `offset` hours after midnight of this day.
    ///
    /// Negative offsets go back to the previous day(s).
    pub fn at_offset(&self, offset: Hour) -> Epoch {
        self.midnight() + Unit::Hour * offset
    }
}

impl fmt::Display for ObsDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn parse_ymd(input: &str) -> IResult<&str, (i32, u8, u8)> {
    (
        map_res(take_while_m_n(4, 4, is_digit), |s: &str| s.parse::<i32>()),
        preceded(
            char('-'),
            map_res(take_while_m_n(1, 2, is_digit), |s: &str| s.parse::<u8>()),
        ),
        preceded(
            char('-'),
            map_res(take_while_m_n(1, 2, is_digit), |s: &str| s.parse::<u8>()),
        ),
    )
        .parse(input)
}

impl FromStr for ObsDate {
    type Err = PscfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (remain, (year, month, day)) =
            parse_ymd(trimmed).map_err(|_| PscfError::InvalidDate(trimmed.to_string()))?;

        // time of day is ignored, anything else is garbage
        if !(remain.is_empty() || remain.starts_with([' ', 'T'])) {
            return Err(PscfError::InvalidDate(trimmed.to_string()));
        }

        ObsDate::new(year, month, day)
    }
}

#[cfg(test)]
mod time_test {
    use super::*;

    #[test]
    fn parse_plain_date() {
        let date: ObsDate = "2017-03-15".parse().unwrap();
        assert_eq!(date, ObsDate::new(2017, 3, 15).unwrap());
        assert_eq!(date.to_string(), "2017-03-15");
    }

    #[test]
    fn parse_date_with_time_suffix() {
        let date: ObsDate = "2017-03-15 09:00".parse().unwrap();
        assert_eq!(date, ObsDate::new(2017, 3, 15).unwrap());

        let date: ObsDate = "2017-03-15T09:00:00".parse().unwrap();
        assert_eq!(date, ObsDate::new(2017, 3, 15).unwrap());
    }

    #[test]
    fn reject_malformed_dates() {
        assert!(matches!(
            "15/03/2017".parse::<ObsDate>(),
            Err(PscfError::InvalidDate(_))
        ));
        assert!(matches!(
            "2017-02-30".parse::<ObsDate>(),
            Err(PscfError::InvalidDate(_))
        ));
        assert!(matches!(
            "2017-03-15x".parse::<ObsDate>(),
            Err(PscfError::InvalidDate(_))
        ));
    }

    #[test]
    fn short_year_pivot() {
        assert_eq!(ObsDate::from_short_year(17, 3, 15).unwrap().year(), 2017);
        assert_eq!(ObsDate::from_short_year(95, 1, 1).unwrap().year(), 1995);
    }

    #[test]
    fn offsets_move_across_days() {
        let date = ObsDate::new(2017, 3, 15).unwrap();
        assert_eq!(
            date.at_offset(-3.0),
            Epoch::from_gregorian_utc_hms(2017, 3, 14, 21, 0, 0)
        );
        assert_eq!(
            date.at_offset(9.0),
            Epoch::from_gregorian_utc_hms(2017, 3, 15, 9, 0, 0)
        );
    }

    #[test]
    fn chronological_ordering() {
        let a = ObsDate::new(2016, 12, 31).unwrap();
        let b = ObsDate::new(2017, 1, 1).unwrap();
        assert!(a < b);
    }
}
