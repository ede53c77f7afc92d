//! 庫存異動帳

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 異動類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    /// 入庫
    In,
    /// 出庫
    Out,
    /// 盤點調整（方向由前後數量決定）
    Adjust,
}

/// 庫存異動記錄（只新增，不修改、不刪除）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLedgerEntry {
    /// 記錄ID
    pub id: Uuid,

    /// 寫入序號（同一時間戳時的排序依據）
    pub sequence: u64,

    /// 原料ID
    pub ingredient_id: String,

    /// 異動類型
    pub change_kind: ChangeKind,

    /// 異動數量（恆為正）
    pub delta_quantity: Decimal,

    /// 異動前數量
    pub quantity_before: Decimal,

    /// 異動後數量
    pub quantity_after: Decimal,

    /// 來源訂單
    pub order_id: Option<Uuid>,

    /// 來源訂單明細
    #[serde(default)]
    pub order_line_id: Option<Uuid>,

    /// 備註
    pub note: Option<String>,

    /// 記錄時間
    pub recorded_at: NaiveDateTime,
}

impl StockLedgerEntry {
    /// 帶正負號的異動量
    pub fn signed_delta(&self) -> Decimal {
        self.quantity_after - self.quantity_before
    }
}
