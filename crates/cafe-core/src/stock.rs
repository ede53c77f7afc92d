//! 庫存模型

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 原料庫存（每個原料一筆）
///
/// `current_quantity` 永遠不小於零；只能經由庫存帳 (`StockLedger`) 變動。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    /// 原料ID
    pub ingredient_id: String,

    /// 現有庫存
    pub current_quantity: Decimal,

    /// 最低庫存
    pub minimum_quantity: Decimal,

    /// 最後更新時間
    pub last_updated: NaiveDateTime,
}

impl StockLevel {
    /// 創建新的庫存記錄（與原料同時建立，現有庫存為零）
    pub fn new(ingredient_id: String, last_updated: NaiveDateTime) -> Self {
        Self {
            ingredient_id,
            current_quantity: Decimal::ZERO,
            minimum_quantity: Decimal::ZERO,
            last_updated,
        }
    }

    /// 建構器模式：設置最低庫存
    pub fn with_minimum_quantity(mut self, minimum_quantity: Decimal) -> Self {
        self.minimum_quantity = minimum_quantity;
        self
    }

    /// 檢查庫存是否低於最低庫存
    pub fn is_below_minimum(&self) -> bool {
        self.current_quantity < self.minimum_quantity
    }

    /// 獲取需要補充的數量
    pub fn replenishment_needed(&self) -> Decimal {
        if self.is_below_minimum() {
            self.minimum_quantity - self.current_quantity
        } else {
            Decimal::ZERO
        }
    }
}
