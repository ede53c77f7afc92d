//! 記憶體資料庫

use cafe_core::Result;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::{Store, Tables};

/// 記憶體資料庫
///
/// 交易在寫鎖下對工作副本執行，成功才替換；失敗時原資料不受影響。
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// 創建空的資料庫
    pub fn new() -> Self {
        Self::default()
    }

    /// 以既有資料表創建
    pub fn with_tables(tables: Tables) -> Self {
        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }
}

impl Store for MemoryStore {
    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        let tables = self.tables.read();
        f(&tables)
    }

    fn transaction<R>(&self, f: impl FnOnce(&mut Tables) -> Result<R>) -> Result<R> {
        let mut tables = self.tables.write();
        let mut working = tables.clone();

        match f(&mut working) {
            Ok(value) => {
                let touched = working.take_touched();
                if !touched.is_empty() {
                    tracing::debug!("交易提交，異動原料: {:?}", touched);
                }
                *tables = working;
                Ok(value)
            }
            Err(err) => {
                tracing::debug!("交易回滾: {}", err);
                Err(err)
            }
        }
    }
}
