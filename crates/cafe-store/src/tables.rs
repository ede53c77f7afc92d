//! 型別化資料表

use cafe_core::{
    CafeError, EntityKind, Ingredient, MenuItem, Order, RecipeLine, Result, StockLedgerEntry,
    StockLevel,
};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::dirty_tracking::DirtyTracker;

/// 後台資料表
///
/// 配方行依品項分組並保留新增順序。庫存帳只能附加。
#[derive(Debug, Clone, Default)]
pub struct Tables {
    ingredients: BTreeMap<String, Ingredient>,
    stock: BTreeMap<String, StockLevel>,
    menu_items: BTreeMap<String, MenuItem>,
    recipes: BTreeMap<String, Vec<RecipeLine>>,
    ledger: Vec<StockLedgerEntry>,
    orders: BTreeMap<Uuid, Order>,
    touched: DirtyTracker,
}

impl Tables {
    /// 創建空的資料表
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== 原料 ====================

    pub fn ingredient(&self, id: &str) -> Result<&Ingredient> {
        self.ingredients
            .get(id)
            .ok_or_else(|| CafeError::not_found(EntityKind::Ingredient, id))
    }

    pub fn ingredient_mut(&mut self, id: &str) -> Result<&mut Ingredient> {
        self.ingredients
            .get_mut(id)
            .ok_or_else(|| CafeError::not_found(EntityKind::Ingredient, id))
    }

    pub fn ingredients(&self) -> impl Iterator<Item = &Ingredient> {
        self.ingredients.values()
    }

    pub fn insert_ingredient(&mut self, ingredient: Ingredient) -> Result<()> {
        if self.ingredients.contains_key(&ingredient.id) {
            return Err(CafeError::AlreadyExists {
                entity: EntityKind::Ingredient,
                id: ingredient.id,
            });
        }
        self.ingredients.insert(ingredient.id.clone(), ingredient);
        Ok(())
    }

    pub fn remove_ingredient(&mut self, id: &str) -> Result<Ingredient> {
        self.ingredients
            .remove(id)
            .ok_or_else(|| CafeError::not_found(EntityKind::Ingredient, id))
    }

    // ==================== 庫存 ====================

    pub fn stock(&self, ingredient_id: &str) -> Result<&StockLevel> {
        self.stock
            .get(ingredient_id)
            .ok_or_else(|| CafeError::not_found(EntityKind::Ingredient, ingredient_id))
    }

    /// 獲取可變庫存（同時標記為已異動）
    pub fn stock_mut(&mut self, ingredient_id: &str) -> Result<&mut StockLevel> {
        let stock = self
            .stock
            .get_mut(ingredient_id)
            .ok_or_else(|| CafeError::not_found(EntityKind::Ingredient, ingredient_id))?;
        self.touched.mark_dirty(ingredient_id);
        Ok(stock)
    }

    pub fn stock_levels(&self) -> impl Iterator<Item = &StockLevel> {
        self.stock.values()
    }

    pub fn insert_stock(&mut self, stock: StockLevel) {
        self.stock.insert(stock.ingredient_id.clone(), stock);
    }

    pub fn remove_stock(&mut self, ingredient_id: &str) -> Option<StockLevel> {
        self.stock.remove(ingredient_id)
    }

    /// 取出本次交易中異動過庫存的原料
    pub fn take_touched(&mut self) -> Vec<String> {
        self.touched.take()
    }

    // ==================== 菜單 ====================

    pub fn menu_item(&self, id: &str) -> Result<&MenuItem> {
        self.menu_items
            .get(id)
            .ok_or_else(|| CafeError::not_found(EntityKind::MenuItem, id))
    }

    pub fn menu_item_mut(&mut self, id: &str) -> Result<&mut MenuItem> {
        self.menu_items
            .get_mut(id)
            .ok_or_else(|| CafeError::not_found(EntityKind::MenuItem, id))
    }

    pub fn menu_items(&self) -> impl Iterator<Item = &MenuItem> {
        self.menu_items.values()
    }

    pub fn insert_menu_item(&mut self, item: MenuItem) -> Result<()> {
        if self.menu_items.contains_key(&item.id) {
            return Err(CafeError::AlreadyExists {
                entity: EntityKind::MenuItem,
                id: item.id,
            });
        }
        self.menu_items.insert(item.id.clone(), item);
        Ok(())
    }

    pub fn remove_menu_item(&mut self, id: &str) -> Result<MenuItem> {
        let item = self
            .menu_items
            .remove(id)
            .ok_or_else(|| CafeError::not_found(EntityKind::MenuItem, id))?;
        self.recipes.remove(id);
        Ok(item)
    }

    // ==================== 配方 ====================

    /// 品項配方（無配方時為空）
    pub fn recipe(&self, item_id: &str) -> &[RecipeLine] {
        self.recipes
            .get(item_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 新增或更新配方行（同一原料只保留一行）
    pub fn upsert_recipe_line(&mut self, line: RecipeLine) {
        let lines = self.recipes.entry(line.item_id.clone()).or_default();
        match lines
            .iter_mut()
            .find(|l| l.ingredient_id == line.ingredient_id)
        {
            Some(existing) => existing.required_quantity = line.required_quantity,
            None => lines.push(line),
        }
    }

    pub fn remove_recipe_line(&mut self, item_id: &str, ingredient_id: &str) -> Option<RecipeLine> {
        let lines = self.recipes.get_mut(item_id)?;
        let index = lines.iter().position(|l| l.ingredient_id == ingredient_id)?;
        let removed = lines.remove(index);
        if lines.is_empty() {
            self.recipes.remove(item_id);
        }
        Some(removed)
    }

    /// 移除所有參照該原料的配方行，回傳移除數量
    pub fn remove_recipe_lines_for_ingredient(&mut self, ingredient_id: &str) -> usize {
        let mut removed = 0;
        for lines in self.recipes.values_mut() {
            let before = lines.len();
            lines.retain(|l| l.ingredient_id != ingredient_id);
            removed += before - lines.len();
        }
        self.recipes.retain(|_, lines| !lines.is_empty());
        removed
    }

    // ==================== 庫存帳 ====================

    pub fn ledger(&self) -> &[StockLedgerEntry] {
        &self.ledger
    }

    /// 下一個庫存帳序號
    pub fn next_ledger_sequence(&self) -> u64 {
        self.ledger.last().map(|e| e.sequence + 1).unwrap_or(1)
    }

    pub fn append_ledger(&mut self, entry: StockLedgerEntry) {
        self.ledger.push(entry);
    }

    // ==================== 訂單 ====================

    pub fn order(&self, id: Uuid) -> Result<&Order> {
        self.orders
            .get(&id)
            .ok_or_else(|| CafeError::not_found(EntityKind::Order, id.to_string()))
    }

    pub fn order_mut(&mut self, id: Uuid) -> Result<&mut Order> {
        self.orders
            .get_mut(&id)
            .ok_or_else(|| CafeError::not_found(EntityKind::Order, id.to_string()))
    }

    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    pub fn orders_mut(&mut self) -> impl Iterator<Item = &mut Order> {
        self.orders.values_mut()
    }

    pub fn insert_order(&mut self, order: Order) -> Result<()> {
        if self.orders.contains_key(&order.id) {
            return Err(CafeError::AlreadyExists {
                entity: EntityKind::Order,
                id: order.id.to_string(),
            });
        }
        self.orders.insert(order.id, order);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal::Decimal;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 4)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_recipe_upsert_keeps_one_line_per_ingredient() {
        let mut tables = Tables::new();
        tables.upsert_recipe_line(RecipeLine::new(
            "LATTE".to_string(),
            "MILK".to_string(),
            Decimal::from(150),
        ));
        tables.upsert_recipe_line(RecipeLine::new(
            "LATTE".to_string(),
            "BEANS".to_string(),
            Decimal::from(18),
        ));
        tables.upsert_recipe_line(RecipeLine::new(
            "LATTE".to_string(),
            "MILK".to_string(),
            Decimal::from(200),
        ));

        let recipe = tables.recipe("LATTE");
        assert_eq!(recipe.len(), 2);
        assert_eq!(recipe[0].ingredient_id, "MILK");
        assert_eq!(recipe[0].required_quantity, Decimal::from(200));
        assert!(tables.recipe("MOCHA").is_empty());
    }

    #[test]
    fn test_remove_recipe_lines_for_ingredient() {
        let mut tables = Tables::new();
        for item in ["LATTE", "FLAT_WHITE"] {
            tables.upsert_recipe_line(RecipeLine::new(
                item.to_string(),
                "MILK".to_string(),
                Decimal::from(150),
            ));
        }
        tables.upsert_recipe_line(RecipeLine::new(
            "LATTE".to_string(),
            "BEANS".to_string(),
            Decimal::from(18),
        ));

        assert_eq!(tables.remove_recipe_lines_for_ingredient("MILK"), 2);
        assert_eq!(tables.recipe("LATTE").len(), 1);
        assert!(tables.recipe("FLAT_WHITE").is_empty());
    }

    #[test]
    fn test_stock_mut_marks_touched() {
        let mut tables = Tables::new();
        tables.insert_stock(StockLevel::new("MILK".to_string(), at()));

        tables.stock_mut("MILK").unwrap().current_quantity = Decimal::from(10);

        assert_eq!(tables.take_touched(), vec!["MILK".to_string()]);
        assert!(tables.take_touched().is_empty());
        assert!(tables.stock_mut("SUGAR").is_err());
    }

    #[test]
    fn test_duplicate_ingredient_rejected() {
        let mut tables = Tables::new();
        let milk = Ingredient::new("MILK".to_string(), "Milk".to_string(), "ml".to_string(), at());

        tables.insert_ingredient(milk.clone()).unwrap();
        let err = tables.insert_ingredient(milk).unwrap_err();

        assert_eq!(err.kind(), cafe_core::ErrorKind::Conflict);
        assert_eq!(tables.next_ledger_sequence(), 1);
    }
}
