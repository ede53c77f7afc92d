//! 員工與班表模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 員工
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// 員工ID
    pub id: String,

    /// 姓名
    pub name: String,

    /// 時薪
    pub hourly_wage: Decimal,
}

impl Employee {
    pub fn new(id: String, name: String, hourly_wage: Decimal) -> Self {
        Self {
            id,
            name,
            hourly_wage,
        }
    }
}

/// 出勤記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkShift {
    /// 員工ID
    pub employee_id: String,

    /// 出勤日
    pub date: NaiveDate,

    /// 工時
    pub hours: Decimal,
}

impl WorkShift {
    pub fn new(employee_id: String, date: NaiveDate, hours: Decimal) -> Self {
        Self {
            employee_id,
            date,
            hours,
        }
    }
}
