//! # Cafe Core
//!
//! 核心資料模型、錯誤類型與營業日曆

pub mod calendar;
pub mod clock;
pub mod config;
pub mod employee;
pub mod ingredient;
pub mod ledger;
pub mod order;
pub mod recipe;
pub mod stock;

// Re-export 主要類型
pub use calendar::BusinessCalendar;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{EngineConfig, PayrollConfig, SettlementConfig};
pub use employee::{Employee, WorkShift};
pub use ingredient::Ingredient;
pub use ledger::{ChangeKind, StockLedgerEntry};
pub use order::{Order, OrderLine, OrderStatus, PaymentChannel};
pub use recipe::{MenuItem, RecipeLine};
pub use stock::StockLevel;

use rust_decimal::Decimal;
use std::fmt;

/// 實體種類（用於 NotFound / AlreadyExists）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Ingredient,
    MenuItem,
    RecipeLine,
    Order,
    OrderLine,
    Employee,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Ingredient => "ingredient",
            EntityKind::MenuItem => "menu item",
            EntityKind::RecipeLine => "recipe line",
            EntityKind::Order => "order",
            EntityKind::OrderLine => "order line",
            EntityKind::Employee => "employee",
        };
        f.write_str(name)
    }
}

/// 錯誤大類，供呼叫端 match 使用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InsufficientStock,
    InvalidQuantity,
    NotFound,
    ConsistencyViolation,
    InvalidState,
    Conflict,
    Configuration,
}

/// 後台核心錯誤類型
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CafeError {
    #[error("庫存不足: {ingredient_name} ({ingredient_id}) 需要 {required}, 現有 {current}")]
    InsufficientStock {
        ingredient_id: String,
        ingredient_name: String,
        required: Decimal,
        current: Decimal,
    },

    #[error("無效的數量: {reason}")]
    InvalidQuantity { reason: String },

    #[error("找不到 {entity}: {id}")]
    NotFound { entity: EntityKind, id: String },

    #[error("庫存一致性錯誤: {ingredient_id} 現有 {before}, 扣減 {delta} 將成為負數")]
    ConsistencyViolation {
        ingredient_id: String,
        before: Decimal,
        delta: Decimal,
    },

    #[error("訂單 {order_id} 無法由 {from:?} 轉換為 {to:?}")]
    InvalidTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("{entity} 已存在: {id}")]
    AlreadyExists { entity: EntityKind, id: String },

    #[error("無效的日期: {0}")]
    InvalidDate(String),

    #[error("配置錯誤: {0}")]
    Config(String),
}

impl CafeError {
    pub fn not_found(entity: EntityKind, id: impl Into<String>) -> Self {
        CafeError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn invalid_quantity(reason: impl Into<String>) -> Self {
        CafeError::InvalidQuantity {
            reason: reason.into(),
        }
    }

    /// 取得錯誤大類
    pub fn kind(&self) -> ErrorKind {
        match self {
            CafeError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            CafeError::InvalidQuantity { .. } => ErrorKind::InvalidQuantity,
            CafeError::NotFound { .. } => ErrorKind::NotFound,
            CafeError::ConsistencyViolation { .. } => ErrorKind::ConsistencyViolation,
            CafeError::InvalidTransition { .. } => ErrorKind::InvalidState,
            CafeError::AlreadyExists { .. } => ErrorKind::Conflict,
            CafeError::InvalidDate(_) | CafeError::Config(_) => ErrorKind::Configuration,
        }
    }
}

pub type Result<T> = std::result::Result<T, CafeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind() {
        let err = CafeError::InsufficientStock {
            ingredient_id: "MILK".to_string(),
            ingredient_name: "Milk".to_string(),
            required: Decimal::from(300),
            current: Decimal::from(150),
        };
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
        assert!(err.to_string().contains("300"));

        let err = CafeError::not_found(EntityKind::Order, "abc");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "找不到 order: abc");
    }
}
