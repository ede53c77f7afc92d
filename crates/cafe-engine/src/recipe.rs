//! 配方查詢

use cafe_core::{CafeError, Result};
use cafe_store::Tables;
use rust_decimal::Decimal;

/// 單一原料需求
#[derive(Debug, Clone, PartialEq)]
pub struct Requirement {
    /// 原料ID
    pub ingredient_id: String,
    /// 單位用量
    pub unit_quantity: Decimal,
}

impl Requirement {
    /// 計算 `quantity` 份所需用量
    pub fn total_for(&self, quantity: u32) -> Decimal {
        self.unit_quantity * Decimal::from(quantity)
    }
}

/// 配方目錄
pub struct RecipeCatalog;

impl RecipeCatalog {
    /// 獲取品項的原料需求（依配方新增順序）
    ///
    /// 品項不存在時回傳 NotFound；沒有配方時回傳空列表。
    pub fn requirements(tables: &Tables, item_id: &str) -> Result<Vec<Requirement>> {
        tables.menu_item(item_id)?;
        Ok(tables
            .recipe(item_id)
            .iter()
            .map(|line| Requirement {
                ingredient_id: line.ingredient_id.clone(),
                unit_quantity: line.required_quantity,
            })
            .collect())
    }

    /// 獲取可下單品項的原料需求
    ///
    /// 沒有配方的品項視為不可販售。
    pub fn orderable_requirements(tables: &Tables, item_id: &str) -> Result<Vec<Requirement>> {
        let requirements = Self::requirements(tables, item_id)?;
        if requirements.is_empty() {
            return Err(CafeError::invalid_quantity(format!(
                "品項 {} 沒有設定配方，不可販售",
                item_id
            )));
        }
        Ok(requirements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cafe_core::{ErrorKind, MenuItem, RecipeLine};

    fn tables() -> Tables {
        let mut tables = Tables::new();
        tables
            .insert_menu_item(MenuItem::new(
                "LATTE".to_string(),
                "Latte".to_string(),
                Decimal::from(4500),
            ))
            .unwrap();
        tables
            .insert_menu_item(MenuItem::new(
                "WATER".to_string(),
                "Water".to_string(),
                Decimal::ZERO,
            ))
            .unwrap();
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
        tables
    }

    #[test]
    fn test_requirements_keep_recipe_order() {
        let requirements = RecipeCatalog::requirements(&tables(), "LATTE").unwrap();

        assert_eq!(requirements.len(), 2);
        assert_eq!(requirements[0].ingredient_id, "MILK");
        assert_eq!(requirements[1].total_for(2), Decimal::from(36));
    }

    #[test]
    fn test_empty_recipe_is_unorderable() {
        let tables = tables();

        assert!(RecipeCatalog::requirements(&tables, "WATER").unwrap().is_empty());
        let err = RecipeCatalog::orderable_requirements(&tables, "WATER").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidQuantity);
    }

    #[test]
    fn test_unknown_item() {
        let err = RecipeCatalog::requirements(&tables(), "MOCHA").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
