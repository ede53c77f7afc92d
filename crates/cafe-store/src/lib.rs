//! # Cafe Store
//!
//! 持久層邊界：型別化資料表與交易式存取

pub mod dirty_tracking;
pub mod memory;
pub mod tables;

// Re-export 主要類型
pub use memory::MemoryStore;
pub use tables::Tables;

use cafe_core::Result;
use std::sync::Arc;

/// 資料存取介面
///
/// `transaction` 必須是全有或全無：閉包回傳 `Err` 時不得留下任何異動，
/// 且同一時間只能有一個交易在進行。
pub trait Store: Send + Sync {
    /// 讀取快照
    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R;

    /// 執行交易
    fn transaction<R>(&self, f: impl FnOnce(&mut Tables) -> Result<R>) -> Result<R>;
}

impl<S: Store> Store for Arc<S> {
    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        (**self).read(f)
    }

    fn transaction<R>(&self, f: impl FnOnce(&mut Tables) -> Result<R>) -> Result<R> {
        (**self).transaction(f)
    }
}
