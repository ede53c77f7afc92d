//! 營業日曆模型

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{CafeError, Result};

/// 營業日曆（入帳日以營業日計算，不含國定假日）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessCalendar {
    /// 營業日（週一到週日，true表示營業日）
    /// 索引 0 = 週一, 1 = 週二, ..., 6 = 週日
    pub business_days: [bool; 7],
}

impl BusinessCalendar {
    /// 創建新的營業日曆（預設週一到週五）
    pub fn new() -> Self {
        Self {
            business_days: [true, true, true, true, true, false, false],
        }
    }

    /// 檢查是否為營業日
    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        let weekday_index = date.weekday().num_days_from_monday() as usize;
        self.business_days[weekday_index]
    }

    /// 向後推算營業日
    ///
    /// 每次前進一個日曆日，只有營業日才計入；起始日本身不計。
    pub fn add_business_days(&self, start_date: NaiveDate, days: u32) -> Result<NaiveDate> {
        if days > 0 && !self.business_days.iter().any(|&d| d) {
            return Err(CafeError::Config("營業日曆沒有任何營業日".to_string()));
        }

        let mut current = start_date;
        let mut remaining = days;

        while remaining > 0 {
            current = current
                .succ_opt()
                .ok_or_else(|| CafeError::InvalidDate(format!("日期溢出: {}", current)))?;
            if self.is_business_day(current) {
                remaining -= 1;
            }
        }

        Ok(current)
    }

    /// 該日所屬週的週一
    pub fn week_start(date: NaiveDate) -> NaiveDate {
        date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
    }
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekend_is_not_business_day() {
        let calendar = BusinessCalendar::new();

        assert!(calendar.is_business_day(date(2024, 1, 5))); // 週五
        assert!(!calendar.is_business_day(date(2024, 1, 6))); // 週六
        assert!(!calendar.is_business_day(date(2024, 1, 7))); // 週日
    }

    #[rstest]
    #[case::friday_plus_two(date(2024, 1, 5), 2, date(2024, 1, 9))]
    #[case::saturday_plus_two(date(2024, 1, 6), 2, date(2024, 1, 9))]
    #[case::sunday_plus_two(date(2024, 1, 7), 2, date(2024, 1, 9))]
    #[case::thursday_plus_five(date(2024, 1, 4), 5, date(2024, 1, 11))]
    #[case::monday_plus_five(date(2025, 10, 6), 5, date(2025, 10, 13))]
    #[case::zero_days(date(2024, 1, 6), 0, date(2024, 1, 6))]
    fn test_add_business_days(
        #[case] start: NaiveDate,
        #[case] days: u32,
        #[case] expected: NaiveDate,
    ) {
        let calendar = BusinessCalendar::new();
        assert_eq!(calendar.add_business_days(start, days).unwrap(), expected);
    }

    #[test]
    fn test_calendar_without_business_days() {
        let calendar = BusinessCalendar {
            business_days: [false; 7],
        };
        assert!(calendar.add_business_days(date(2024, 1, 4), 1).is_err());
    }

    #[test]
    fn test_week_start() {
        assert_eq!(BusinessCalendar::week_start(date(2024, 1, 4)), date(2024, 1, 1));
        assert_eq!(BusinessCalendar::week_start(date(2024, 1, 7)), date(2024, 1, 1));
        assert_eq!(BusinessCalendar::week_start(date(2024, 1, 8)), date(2024, 1, 8));
    }
}
