//! 原料模型

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 原料
///
/// 建立後只允許改名；庫存與配方以 `id` 參照。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// 原料ID
    pub id: String,

    /// 顯示名稱
    pub name: String,

    /// 計量單位（ml、g、ea ...）
    pub unit: String,

    /// 建立時間
    pub created_at: NaiveDateTime,
}

impl Ingredient {
    /// 創建新的原料
    pub fn new(id: String, name: String, unit: String, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            name,
            unit,
            created_at,
        }
    }

    /// 改名
    pub fn rename(&mut self, name: String) {
        self.name = name;
    }
}
