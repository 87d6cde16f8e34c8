//! Service day-type classification.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeSet;

use crate::model::DayType;

/// Holidays on which the Sunday schedule runs, as shipped for 2024.
pub const DEFAULT_HOLIDAYS: &[(i32, u32, u32)] = &[
    (2024, 1, 1),
    (2024, 1, 15),
    (2024, 2, 19),
    (2024, 5, 27),
    (2024, 7, 4),
    (2024, 9, 2),
    (2024, 10, 14),
    (2024, 11, 11),
    (2024, 11, 28),
    (2024, 12, 25),
];

pub fn default_holidays() -> Vec<NaiveDate> {
    DEFAULT_HOLIDAYS
        .iter()
        .filter_map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
        .collect()
}

/// Maps dates to the schedule that runs on them.
///
/// The holiday set is supplied data; nothing here computes holidays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl ServiceCalendar {
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    pub fn classify(&self, date: NaiveDate) -> DayType {
        if self.is_holiday(date) {
            return DayType::SundayOrHoliday;
        }
        match date.weekday() {
            Weekday::Sat => DayType::Saturday,
            Weekday::Sun => DayType::SundayOrHoliday,
            _ => DayType::Weekday,
        }
    }

    pub fn holidays(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.holidays.iter().copied()
    }
}

impl Default for ServiceCalendar {
    fn default() -> Self {
        Self::new(default_holidays())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_fixed_holiday_runs_sunday_schedule() {
        let calendar = ServiceCalendar::default();
        assert_eq!(calendar.classify(date(2024, 1, 1)), DayType::SundayOrHoliday);
        // Thursday
        assert_eq!(calendar.classify(date(2024, 7, 4)), DayType::SundayOrHoliday);
    }

    #[test]
    fn test_weekdays() {
        let calendar = ServiceCalendar::default();
        assert_eq!(calendar.classify(date(2024, 6, 3)), DayType::Weekday);
        assert_eq!(calendar.classify(date(2024, 6, 7)), DayType::Weekday);
        assert_eq!(calendar.classify(date(2024, 6, 8)), DayType::Saturday);
        assert_eq!(calendar.classify(date(2024, 6, 9)), DayType::SundayOrHoliday);
    }

    #[test]
    fn test_holidays_are_year_specific() {
        let calendar = ServiceCalendar::default();
        // 2025-01-01 is a Wednesday and not in the shipped set
        assert_eq!(calendar.classify(date(2025, 1, 1)), DayType::Weekday);
    }

    #[test]
    fn test_custom_holiday_set() {
        let calendar = ServiceCalendar::new([date(2025, 1, 1)]);
        assert_eq!(calendar.classify(date(2025, 1, 1)), DayType::SundayOrHoliday);
        assert_eq!(calendar.classify(date(2024, 1, 1)), DayType::Weekday);
        assert_eq!(calendar.holidays().count(), 1);
    }

    #[test]
    fn test_default_holiday_list_is_complete() {
        assert_eq!(default_holidays().len(), DEFAULT_HOLIDAYS.len());
    }
}
