//! # Cafe
//!
//! 咖啡廳後台核心：庫存、配方、訂單履約與入帳排程

pub use cafe_core as core;
pub use cafe_engine as engine;
pub use cafe_store as store;

pub use cafe_core::{CafeError, EngineConfig, ErrorKind, PaymentChannel, Result};
pub use cafe_engine::{
    AvailabilityChecker, CartLine, InventoryManager, OrderFulfillmentEngine, OrderRequestLine,
    PayrollCalculator, SettlementScheduler,
};
pub use cafe_store::{MemoryStore, Store};
