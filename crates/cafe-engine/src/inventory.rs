//! 原料、菜單與配方管理，以及手動庫存異動

use cafe_core::{
    CafeError, Clock, EntityKind, Ingredient, MenuItem, RecipeLine, Result, StockLedgerEntry,
    StockLevel,
};
use cafe_store::Store;
use rust_decimal::Decimal;

use crate::ledger::{LedgerMismatch, StockChange, StockLedger};
use crate::recipe::{RecipeCatalog, Requirement};

/// 低於最低庫存的原料
#[derive(Debug, Clone, PartialEq)]
pub struct LowStockItem {
    pub ingredient_id: String,
    pub name: String,
    pub current_quantity: Decimal,
    pub minimum_quantity: Decimal,
    pub shortfall: Decimal,
}

/// 刪除原料的結果
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedIngredient {
    pub ingredient: Ingredient,
    pub removed_stock: Option<StockLevel>,
    pub removed_recipe_lines: usize,
}

/// 庫存管理
pub struct InventoryManager<S: Store, C: Clock> {
    store: S,
    clock: C,
}

impl<S: Store, C: Clock> InventoryManager<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    // ==================== 原料 ====================

    /// 建立原料，同時建立現有庫存為零的庫存記錄
    pub fn create_ingredient(
        &self,
        id: &str,
        name: &str,
        unit: &str,
        minimum_quantity: Decimal,
    ) -> Result<Ingredient> {
        Self::require_non_negative("最低庫存", minimum_quantity)?;
        let now = self.clock.now();
        let ingredient = Ingredient::new(id.to_string(), name.to_string(), unit.to_string(), now);

        self.store.transaction(|tables| {
            tables.insert_ingredient(ingredient.clone())?;
            tables.insert_stock(
                StockLevel::new(id.to_string(), now).with_minimum_quantity(minimum_quantity),
            );
            Ok(())
        })?;

        tracing::info!("新增原料 {} ({})", id, name);
        Ok(ingredient)
    }

    /// 原料改名
    pub fn rename_ingredient(&self, id: &str, name: &str) -> Result<()> {
        self.store.transaction(|tables| {
            tables.ingredient_mut(id)?.rename(name.to_string());
            Ok(())
        })
    }

    /// 設定最低庫存
    pub fn set_minimum_quantity(&self, id: &str, minimum_quantity: Decimal) -> Result<()> {
        Self::require_non_negative("最低庫存", minimum_quantity)?;
        let now = self.clock.now();
        self.store.transaction(|tables| {
            let stock = tables.stock_mut(id)?;
            stock.minimum_quantity = minimum_quantity;
            stock.last_updated = now;
            Ok(())
        })
    }

    /// 刪除原料
    ///
    /// 一併移除庫存記錄與所有參照它的配方行；庫存帳保留。
    pub fn delete_ingredient(&self, id: &str) -> Result<DeletedIngredient> {
        let deleted = self.store.transaction(|tables| {
            let ingredient = tables.remove_ingredient(id)?;
            let removed_stock = tables.remove_stock(id);
            let removed_recipe_lines = tables.remove_recipe_lines_for_ingredient(id);
            Ok(DeletedIngredient {
                ingredient,
                removed_stock,
                removed_recipe_lines,
            })
        })?;

        tracing::info!(
            "刪除原料 {}，移除配方行 {} 筆",
            id,
            deleted.removed_recipe_lines
        );
        Ok(deleted)
    }

    // ==================== 菜單與配方 ====================

    /// 新增菜單品項
    pub fn create_menu_item(&self, id: &str, name: &str, price: Decimal) -> Result<MenuItem> {
        Self::require_non_negative("售價", price)?;
        let item = MenuItem::new(id.to_string(), name.to_string(), price);
        self.store
            .transaction(|tables| tables.insert_menu_item(item.clone()))?;
        Ok(item)
    }

    /// 修改售價（既有訂單明細不受影響）
    pub fn set_menu_price(&self, id: &str, price: Decimal) -> Result<()> {
        Self::require_non_negative("售價", price)?;
        self.store.transaction(|tables| {
            tables.menu_item_mut(id)?.price = price;
            Ok(())
        })
    }

    /// 刪除菜單品項（連同配方）
    pub fn delete_menu_item(&self, id: &str) -> Result<MenuItem> {
        self.store.transaction(|tables| tables.remove_menu_item(id))
    }

    /// 設定配方行（同一品項與原料只保留一行）
    pub fn set_recipe_line(
        &self,
        item_id: &str,
        ingredient_id: &str,
        required_quantity: Decimal,
    ) -> Result<()> {
        if required_quantity <= Decimal::ZERO {
            return Err(CafeError::invalid_quantity(format!(
                "配方用量必須為正數: {} / {} = {}",
                item_id, ingredient_id, required_quantity
            )));
        }
        self.store.transaction(|tables| {
            tables.menu_item(item_id)?;
            tables.ingredient(ingredient_id)?;
            tables.upsert_recipe_line(RecipeLine::new(
                item_id.to_string(),
                ingredient_id.to_string(),
                required_quantity,
            ));
            Ok(())
        })
    }

    /// 移除配方行
    pub fn remove_recipe_line(&self, item_id: &str, ingredient_id: &str) -> Result<RecipeLine> {
        self.store.transaction(|tables| {
            tables
                .remove_recipe_line(item_id, ingredient_id)
                .ok_or_else(|| {
                    CafeError::not_found(
                        EntityKind::RecipeLine,
                        format!("{}/{}", item_id, ingredient_id),
                    )
                })
        })
    }

    /// 品項的原料需求
    pub fn requirements(&self, item_id: &str) -> Result<Vec<Requirement>> {
        self.store
            .read(|tables| RecipeCatalog::requirements(tables, item_id))
    }

    // ==================== 手動庫存異動 ====================

    /// 進貨入庫
    pub fn restock(&self, id: &str, quantity: Decimal, note: Option<&str>) -> Result<StockLedgerEntry> {
        let mut change = StockChange::inbound(id, quantity);
        if let Some(note) = note {
            change = change.with_note(note);
        }
        self.apply(change)
    }

    /// 手動出庫（報廢、試做 ...）
    pub fn record_waste(&self, id: &str, quantity: Decimal, note: Option<&str>) -> Result<StockLedgerEntry> {
        let mut change = StockChange::outbound(id, quantity);
        if let Some(note) = note {
            change = change.with_note(note);
        }
        self.apply(change)
    }

    /// 盤點調整至實際數量；數量相同時不記錄
    pub fn adjust_to(
        &self,
        id: &str,
        counted_quantity: Decimal,
        note: Option<&str>,
    ) -> Result<Option<StockLedgerEntry>> {
        Self::require_non_negative("盤點數量", counted_quantity)?;
        let now = self.clock.now();

        self.store.transaction(|tables| {
            let current = tables.stock(id)?.current_quantity;
            let delta = counted_quantity - current;
            if delta.is_zero() {
                return Ok(None);
            }
            let mut change = StockChange::adjustment(id, delta);
            if let Some(note) = note {
                change = change.with_note(note);
            }
            StockLedger::record_change(tables, change, now).map(Some)
        })
    }

    fn apply(&self, change: StockChange) -> Result<StockLedgerEntry> {
        let now = self.clock.now();
        self.store
            .transaction(|tables| StockLedger::record_change(tables, change, now))
    }

    // ==================== 查詢 ====================

    /// 原料庫存
    pub fn stock_level(&self, id: &str) -> Result<StockLevel> {
        self.store.read(|tables| tables.stock(id).cloned())
    }

    /// 低於最低庫存的原料（依ID排序）
    pub fn low_stock(&self) -> Vec<LowStockItem> {
        self.store.read(|tables| {
            tables
                .stock_levels()
                .filter(|s| s.is_below_minimum())
                .map(|s| LowStockItem {
                    ingredient_id: s.ingredient_id.clone(),
                    name: tables
                        .ingredient(&s.ingredient_id)
                        .map(|i| i.name.clone())
                        .unwrap_or_else(|_| s.ingredient_id.clone()),
                    current_quantity: s.current_quantity,
                    minimum_quantity: s.minimum_quantity,
                    shortfall: s.replenishment_needed(),
                })
                .collect()
        })
    }

    /// 原料的庫存帳
    pub fn ledger_for(&self, id: &str) -> Vec<StockLedgerEntry> {
        self.store.read(|tables| {
            tables
                .ledger()
                .iter()
                .filter(|e| e.ingredient_id == id)
                .cloned()
                .collect()
        })
    }

    /// 以庫存帳重播驗證現有庫存
    pub fn verify_ledger(&self) -> Vec<LedgerMismatch> {
        self.store.read(StockLedger::verify)
    }

    fn require_non_negative(field: &str, value: Decimal) -> Result<()> {
        if value < Decimal::ZERO {
            return Err(CafeError::invalid_quantity(format!(
                "{}不得為負數: {}",
                field, value
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cafe_core::{ChangeKind, ErrorKind, FixedClock};
    use cafe_store::MemoryStore;
    use chrono::NaiveDate;

    fn manager() -> InventoryManager<MemoryStore, FixedClock> {
        let now = NaiveDate::from_ymd_opt(2024, 1, 4)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        InventoryManager::new(MemoryStore::new(), FixedClock::new(now))
    }

    #[test]
    fn test_create_ingredient_starts_at_zero() {
        let manager = manager();
        manager
            .create_ingredient("milk", "Milk", "ml", Decimal::from(1000))
            .unwrap();

        let stock = manager.stock_level("milk").unwrap();
        assert_eq!(stock.current_quantity, Decimal::ZERO);
        assert_eq!(stock.minimum_quantity, Decimal::from(1000));

        let err = manager
            .create_ingredient("milk", "Milk", "ml", Decimal::ZERO)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_delete_ingredient_cascades() {
        let manager = manager();
        manager.create_ingredient("milk", "Milk", "ml", Decimal::ZERO).unwrap();
        manager.create_ingredient("coffee", "Coffee", "g", Decimal::ZERO).unwrap();
        manager.create_menu_item("latte", "Latte", Decimal::from(4500)).unwrap();
        manager.set_recipe_line("latte", "milk", Decimal::from(150)).unwrap();
        manager.set_recipe_line("latte", "coffee", Decimal::from(18)).unwrap();
        manager.restock("milk", Decimal::from(500), Some("delivery")).unwrap();

        let deleted = manager.delete_ingredient("milk").unwrap();

        assert_eq!(deleted.removed_recipe_lines, 1);
        assert!(deleted.removed_stock.is_some());
        assert_eq!(manager.requirements("latte").unwrap().len(), 1);
        assert_eq!(manager.stock_level("milk").unwrap_err().kind(), ErrorKind::NotFound);
        // 庫存帳保留
        assert_eq!(manager.ledger_for("milk").len(), 1);
    }

    #[test]
    fn test_recipe_line_validation() {
        let manager = manager();
        manager.create_ingredient("milk", "Milk", "ml", Decimal::ZERO).unwrap();
        manager.create_menu_item("latte", "Latte", Decimal::from(4500)).unwrap();

        let err = manager
            .set_recipe_line("latte", "milk", Decimal::ZERO)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidQuantity);
        let err = manager
            .set_recipe_line("latte", "sugar", Decimal::ONE)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        manager.set_recipe_line("latte", "milk", Decimal::from(150)).unwrap();
        manager.remove_recipe_line("latte", "milk").unwrap();
        assert!(manager.requirements("latte").unwrap().is_empty());
        assert!(manager.remove_recipe_line("latte", "milk").is_err());
    }

    #[test]
    fn test_manual_stock_operations() {
        let manager = manager();
        manager.create_ingredient("milk", "Milk", "ml", Decimal::from(300)).unwrap();

        manager.restock("milk", Decimal::from(1000), None).unwrap();
        manager.record_waste("milk", Decimal::from(200), Some("expired")).unwrap();
        let adjusted = manager.adjust_to("milk", Decimal::from(750), Some("count")).unwrap();
        let unchanged = manager.adjust_to("milk", Decimal::from(750), None).unwrap();

        let adjusted = adjusted.unwrap();
        assert_eq!(adjusted.change_kind, ChangeKind::Adjust);
        assert_eq!(adjusted.delta_quantity, Decimal::from(50));
        assert!(unchanged.is_none());
        assert_eq!(manager.stock_level("milk").unwrap().current_quantity, Decimal::from(750));
        assert!(manager.verify_ledger().is_empty());

        let err = manager
            .record_waste("milk", Decimal::from(800), None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConsistencyViolation);
    }

    #[test]
    fn test_low_stock_report() {
        let manager = manager();
        manager.create_ingredient("milk", "Milk", "ml", Decimal::from(1000)).unwrap();
        manager.create_ingredient("coffee", "Coffee", "g", Decimal::from(100)).unwrap();
        manager.restock("milk", Decimal::from(400), None).unwrap();
        manager.restock("coffee", Decimal::from(500), None).unwrap();

        let low = manager.low_stock();

        assert_eq!(low.len(), 1);
        assert_eq!(low[0].ingredient_id, "milk");
        assert_eq!(low[0].name, "Milk");
        assert_eq!(low[0].shortfall, Decimal::from(600));
    }

    #[test]
    fn test_menu_price_change() {
        let manager = manager();
        manager.create_menu_item("latte", "Latte", Decimal::from(4500)).unwrap();

        manager.set_menu_price("latte", Decimal::from(5000)).unwrap();
        assert!(manager.set_menu_price("latte", Decimal::from(-1)).is_err());
        manager.delete_menu_item("latte").unwrap();
        assert!(manager.requirements("latte").is_err());
    }
}
