//! 週薪計算
//!
//! 依週（週一起算）彙總出勤工時：正常工時、超過全職週工時的加班，
//! 以及週工時達門檻時的週休津貼。

use cafe_core::{BusinessCalendar, CafeError, Employee, PayrollConfig, Result, WorkShift};
use chrono::NaiveDate;
use rayon::prelude::*;
use rust_decimal::Decimal;

use crate::aggregation::PeriodAggregator;

/// 單一員工一週的薪資
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyPay {
    pub employee_id: String,
    /// 週起始日（週一）
    pub week_start: NaiveDate,
    pub total_hours: Decimal,
    pub regular_hours: Decimal,
    pub overtime_hours: Decimal,
    pub base_pay: Decimal,
    pub overtime_pay: Decimal,
    /// 週休津貼
    pub holiday_pay: Decimal,
    pub total_pay: Decimal,
}

/// 薪資計算器
#[derive(Debug, Clone, Default)]
pub struct PayrollCalculator {
    config: PayrollConfig,
}

impl PayrollCalculator {
    pub fn new(config: PayrollConfig) -> Self {
        Self { config }
    }

    /// 單一員工的週薪（依週遞增排序）
    pub fn weekly_pay(&self, employee: &Employee, shifts: &[WorkShift]) -> Result<Vec<WeeklyPay>> {
        if employee.hourly_wage < Decimal::ZERO {
            return Err(CafeError::invalid_quantity(format!(
                "員工 {} 的時薪不得為負數",
                employee.id
            )));
        }

        let own_shifts: Vec<&WorkShift> = shifts
            .iter()
            .filter(|s| s.employee_id == employee.id)
            .collect();
        if let Some(shift) = own_shifts.iter().find(|s| s.hours < Decimal::ZERO) {
            return Err(CafeError::invalid_quantity(format!(
                "員工 {} 於 {} 的工時不得為負數",
                employee.id, shift.date
            )));
        }

        let weeks = PeriodAggregator::group(
            own_shifts,
            |s| BusinessCalendar::week_start(s.date),
            |s| s.hours,
        );

        Ok(weeks
            .into_iter()
            .map(|week| self.compute_week(employee, week.key, week.total))
            .collect())
    }

    /// 所有員工的週薪（並行計算，依員工ID與週排序）
    pub fn payroll(&self, employees: &[Employee], shifts: &[WorkShift]) -> Result<Vec<WeeklyPay>> {
        let per_employee = employees
            .par_iter()
            .map(|employee| self.weekly_pay(employee, shifts))
            .collect::<Result<Vec<_>>>()?;

        let mut result: Vec<WeeklyPay> = per_employee.into_iter().flatten().collect();
        result.sort_by(|a, b| {
            a.employee_id
                .cmp(&b.employee_id)
                .then(a.week_start.cmp(&b.week_start))
        });

        tracing::debug!("計算週薪：員工 {} 人，共 {} 週次", employees.len(), result.len());
        Ok(result)
    }

    /// 週休津貼
    ///
    /// 週工時達門檻時，按 min(工時, 全職週工時) / 全職週工時 × 給付時數 × 時薪 計算。
    pub fn holiday_pay(&self, weekly_hours: Decimal, hourly_wage: Decimal) -> Decimal {
        if weekly_hours < self.config.holiday_pay_threshold_hours {
            return Decimal::ZERO;
        }
        let counted = weekly_hours.min(self.config.full_time_weekly_hours);
        counted / self.config.full_time_weekly_hours * self.config.paid_holiday_hours * hourly_wage
    }

    fn compute_week(&self, employee: &Employee, week_start: NaiveDate, hours: Decimal) -> WeeklyPay {
        let wage = employee.hourly_wage;
        let regular_hours = hours.min(self.config.full_time_weekly_hours);
        let overtime_hours = hours - regular_hours;

        let base_pay = regular_hours * wage;
        let overtime_pay = overtime_hours * wage * self.config.overtime_multiplier;
        let holiday_pay = self.holiday_pay(hours, wage);

        WeeklyPay {
            employee_id: employee.id.clone(),
            week_start,
            total_hours: hours,
            regular_hours,
            overtime_hours,
            base_pay,
            overtime_pay,
            holiday_pay,
            total_pay: base_pay + overtime_pay + holiday_pay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn employee(id: &str, wage: i64) -> Employee {
        Employee::new(id.to_string(), id.to_string(), Decimal::from(wage))
    }

    fn shift(id: &str, day: u32, hours: i64) -> WorkShift {
        WorkShift::new(id.to_string(), date(day), Decimal::from(hours))
    }

    #[rstest]
    #[case::below_threshold(14, 0)]
    #[case::at_threshold(15, 30_000)]
    #[case::half_time(20, 40_000)]
    #[case::full_time(40, 80_000)]
    #[case::capped_above_full_time(50, 80_000)]
    fn test_holiday_pay(#[case] hours: i64, #[case] expected: i64) {
        let calculator = PayrollCalculator::default();
        assert_eq!(
            calculator.holiday_pay(Decimal::from(hours), Decimal::from(10_000)),
            Decimal::from(expected)
        );
    }

    #[test]
    fn test_weekly_grouping_and_overtime() {
        let calculator = PayrollCalculator::default();
        let alice = employee("alice", 10_000);
        // 第一週 (1/1 ~ 1/7)：9h × 5 = 45h；第二週 (1/8)：6h
        let mut shifts: Vec<WorkShift> = (1..=5).map(|d| shift("alice", d, 9)).collect();
        shifts.push(shift("alice", 8, 6));
        shifts.push(shift("bob", 2, 8));

        let weeks = calculator.weekly_pay(&alice, &shifts).unwrap();

        assert_eq!(weeks.len(), 2);
        let first = &weeks[0];
        assert_eq!(first.week_start, date(1));
        assert_eq!(first.regular_hours, Decimal::from(40));
        assert_eq!(first.overtime_hours, Decimal::from(5));
        assert_eq!(first.base_pay, Decimal::from(400_000));
        assert_eq!(first.overtime_pay, Decimal::from(75_000));
        assert_eq!(first.holiday_pay, Decimal::from(80_000));
        assert_eq!(first.total_pay, Decimal::from(555_000));

        let second = &weeks[1];
        assert_eq!(second.week_start, date(8));
        assert_eq!(second.holiday_pay, Decimal::ZERO);
        assert_eq!(second.total_pay, Decimal::from(60_000));
    }

    #[test]
    fn test_payroll_for_all_employees() {
        let calculator = PayrollCalculator::default();
        let employees = vec![employee("bob", 12_000), employee("alice", 10_000)];
        let shifts = vec![shift("alice", 2, 4), shift("bob", 3, 5), shift("bob", 10, 5)];

        let payroll = calculator.payroll(&employees, &shifts).unwrap();

        let keys: Vec<_> = payroll
            .iter()
            .map(|p| (p.employee_id.as_str(), p.week_start))
            .collect();
        assert_eq!(
            keys,
            vec![("alice", date(1)), ("bob", date(1)), ("bob", date(8))]
        );
        assert_eq!(payroll[1].total_pay, Decimal::from(60_000));
    }

    #[test]
    fn test_negative_hours_rejected() {
        let calculator = PayrollCalculator::default();
        let err = calculator
            .weekly_pay(&employee("alice", 10_000), &[shift("alice", 2, -1)])
            .unwrap_err();
        assert_eq!(err.kind(), cafe_core::ErrorKind::InvalidQuantity);
    }
}
