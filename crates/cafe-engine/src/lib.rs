//! # Cafe Engine
//!
//! 訂單履約、庫存帳、可售量檢查與入帳排程

pub mod aggregation;
pub mod availability;
pub mod fulfillment;
pub mod inventory;
pub mod ledger;
pub mod payroll;
pub mod recipe;
pub mod settlement;

// Re-export 主要類型
pub use aggregation::{PeriodAggregator, PeriodTotal};
pub use availability::{AvailabilityChecker, CartLine, ItemAvailability, NO_RECIPE_REASON};
pub use fulfillment::{LineChange, OrderFulfillmentEngine, OrderRequestLine};
pub use inventory::{DeletedIngredient, InventoryManager, LowStockItem};
pub use ledger::{LedgerMismatch, StockChange, StockLedger};
pub use payroll::{PayrollCalculator, WeeklyPay};
pub use recipe::{RecipeCatalog, Requirement};
pub use settlement::{ChannelTotal, SettlementBucket, SettlementPolicy, SettlementScheduler};
