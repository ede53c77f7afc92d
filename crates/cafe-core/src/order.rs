//! 訂單模型

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{CafeError, EntityKind};

/// 付款通路
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentChannel {
    /// 店內刷卡
    Card,
    /// Coupang Eats
    Coupang,
    /// 배달의민족
    Baemin,
    /// 요기요
    Yogiyo,
    /// 其他通路（以代碼識別）
    Other(String),
}

impl PaymentChannel {
    /// 通路代碼（配置檔的鍵）
    pub fn code(&self) -> &str {
        match self {
            PaymentChannel::Card => "CARD",
            PaymentChannel::Coupang => "COUPANG",
            PaymentChannel::Baemin => "BAEMIN",
            PaymentChannel::Yogiyo => "YOGIYO",
            PaymentChannel::Other(code) => code,
        }
    }
}

impl fmt::Display for PaymentChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PaymentChannel {
    type Err = CafeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(CafeError::Config("空白的付款通路代碼".to_string()));
        }
        Ok(match code.as_str() {
            "CARD" => PaymentChannel::Card,
            "COUPANG" => PaymentChannel::Coupang,
            "BAEMIN" => PaymentChannel::Baemin,
            "YOGIYO" => PaymentChannel::Yogiyo,
            _ => PaymentChannel::Other(code),
        })
    }
}

/// 訂單狀態
///
/// `Pending → Fulfilled | Rejected`，`Fulfilled → Cancelled`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// 檢查中（尚未寫入）
    Pending,
    /// 已完成扣庫
    Fulfilled,
    /// 提交時庫存不足，未留下任何副作用
    Rejected,
    /// 已取消（庫存已補回）
    Cancelled,
}

impl OrderStatus {
    /// 檢查狀態轉換是否合法
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Fulfilled)
                | (OrderStatus::Pending, OrderStatus::Rejected)
                | (OrderStatus::Fulfilled, OrderStatus::Cancelled)
        )
    }
}

/// 訂單明細
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    /// 明細ID
    pub id: Uuid,

    /// 品項ID
    pub item_id: String,

    /// 數量（> 0）
    pub quantity: u32,

    /// 下單時單價（之後品項改價不影響）
    pub unit_price: Decimal,
}

impl OrderLine {
    /// 創建新的訂單明細
    pub fn new(item_id: String, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            quantity,
            unit_price,
        }
    }

    /// 小計
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// 訂單
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// 訂單ID
    pub id: Uuid,

    /// 下單時間
    pub placed_at: NaiveDateTime,

    /// 明細
    pub lines: Vec<OrderLine>,

    /// 總金額（恆等於明細小計總和）
    pub total_amount: Decimal,

    /// 付款通路
    pub payment_channel: PaymentChannel,

    /// 預計入帳日（建立時計算，之後不變）
    pub expected_settlement_date: NaiveDate,

    /// 是否已入帳
    pub is_settled: bool,

    /// 入帳日
    pub settled_at: Option<NaiveDate>,

    /// 狀態
    pub status: OrderStatus,

    /// 取消時間
    pub cancelled_at: Option<NaiveDateTime>,
}

impl Order {
    /// 創建新的訂單（Pending，總金額由明細計算）
    pub fn new(
        placed_at: NaiveDateTime,
        lines: Vec<OrderLine>,
        payment_channel: PaymentChannel,
        expected_settlement_date: NaiveDate,
    ) -> Self {
        let mut order = Self {
            id: Uuid::new_v4(),
            placed_at,
            lines,
            total_amount: Decimal::ZERO,
            payment_channel,
            expected_settlement_date,
            is_settled: false,
            settled_at: None,
            status: OrderStatus::Pending,
            cancelled_at: None,
        };
        order.recompute_total();
        order
    }

    /// 重新計算總金額（以明細為準，不做增量運算）
    pub fn recompute_total(&mut self) {
        self.total_amount = self.lines.iter().map(OrderLine::subtotal).sum();
    }

    /// 獲取明細
    pub fn line(&self, line_id: Uuid) -> crate::Result<&OrderLine> {
        self.lines
            .iter()
            .find(|l| l.id == line_id)
            .ok_or_else(|| CafeError::not_found(EntityKind::OrderLine, line_id.to_string()))
    }

    /// 獲取可變明細
    pub fn line_mut(&mut self, line_id: Uuid) -> crate::Result<&mut OrderLine> {
        self.lines
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or_else(|| CafeError::not_found(EntityKind::OrderLine, line_id.to_string()))
    }

    /// 移除明細並重算總金額
    pub fn remove_line(&mut self, line_id: Uuid) -> crate::Result<OrderLine> {
        let index = self
            .lines
            .iter()
            .position(|l| l.id == line_id)
            .ok_or_else(|| CafeError::not_found(EntityKind::OrderLine, line_id.to_string()))?;
        let line = self.lines.remove(index);
        self.recompute_total();
        Ok(line)
    }

    /// 狀態轉換
    pub fn transition(&mut self, next: OrderStatus) -> crate::Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(CafeError::InvalidTransition {
                order_id: self.id.to_string(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// 標記入帳，回傳是否真的由未入帳轉為已入帳
    pub fn mark_settled(&mut self, settled_date: NaiveDate) -> bool {
        if self.is_settled {
            return false;
        }
        self.is_settled = true;
        self.settled_at = Some(settled_date);
        true
    }

    /// 是否等待入帳
    pub fn is_settlement_pending(&self) -> bool {
        !self.is_settled && self.status == OrderStatus::Fulfilled
    }

    /// 檢查總金額是否與明細一致
    pub fn total_is_consistent(&self) -> bool {
        self.total_amount == self.lines.iter().map(OrderLine::subtotal).sum::<Decimal>()
    }
}
