//! 購物車可售量檢查
//!
//! 純讀取計算：不鎖定、不保留庫存。每次購物車變動後都要重新計算，
//! 結帳時由 `OrderFulfillmentEngine` 以即時庫存再次檢查。

use cafe_core::Result;
use cafe_store::Tables;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use crate::recipe::{RecipeCatalog, Requirement};

/// 未設定配方的原因
pub const NO_RECIPE_REASON: &str = "no recipe configured";

/// 購物車明細
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// 品項ID
    pub item_id: String,
    /// 數量
    pub quantity: u32,
}

impl CartLine {
    pub fn new(item_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
        }
    }
}

/// 單一品項的可售狀態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemAvailability {
    /// 品項ID
    pub item_id: String,

    /// 是否還能再加一份
    pub available: bool,

    /// 扣除購物車其他明細後，此品項最多可做的份數
    pub max_additional: u32,

    /// 造成上限的原料
    pub limiting_ingredient: Option<String>,

    /// 不可售原因
    pub reason: Option<String>,

    /// 購物車中要求的數量
    pub requested: u32,
}

impl ItemAvailability {
    fn without_recipe(item_id: &str, requested: u32) -> Self {
        Self {
            item_id: item_id.to_string(),
            available: false,
            max_additional: 0,
            limiting_ingredient: None,
            reason: Some(NO_RECIPE_REASON.to_string()),
            requested,
        }
    }

    /// 要求數量是否都做得出來
    pub fn covers_requested(&self) -> bool {
        self.reason.is_none() && self.requested <= self.max_additional
    }
}

/// 可售量檢查器
pub struct AvailabilityChecker;

impl AvailabilityChecker {
    /// 逐明細計算可售量（結果順序與輸入一致）
    ///
    /// 同一原料由購物車各明細共用：計算某明細時，先扣除其他明細的用量。
    pub fn check_lines(tables: &Tables, lines: &[CartLine]) -> Result<Vec<ItemAvailability>> {
        let recipes = lines
            .iter()
            .map(|line| RecipeCatalog::requirements(tables, &line.item_id))
            .collect::<Result<Vec<_>>>()?;

        let total_reserved = Self::reservations(lines, &recipes);

        let mut results = Vec::with_capacity(lines.len());
        for (line, requirements) in lines.iter().zip(&recipes) {
            // 其他明細的用量 = 全部用量 - 本明細用量
            let mut reserved = total_reserved.clone();
            for requirement in requirements {
                if let Some(amount) = reserved.get_mut(requirement.ingredient_id.as_str()) {
                    *amount -= requirement.total_for(line.quantity);
                }
            }

            results.push(Self::evaluate(
                tables,
                &line.item_id,
                line.quantity,
                requirements,
                &reserved,
            )?);
        }

        Ok(results)
    }

    /// 以品項為鍵的可售量
    ///
    /// 同一品項出現在多個明細時，以最後一個明細的結果為準。
    pub fn check_cart(
        tables: &Tables,
        lines: &[CartLine],
    ) -> Result<BTreeMap<String, ItemAvailability>> {
        Ok(Self::check_lines(tables, lines)?
            .into_iter()
            .map(|a| (a.item_id.clone(), a))
            .collect())
    }

    /// 在目前購物車下，菜單所有品項的可售量
    ///
    /// 已在購物車的品項沿用 `check_cart` 的結果；其餘品項扣除整個購物車的用量。
    pub fn menu_availability(
        tables: &Tables,
        cart: &[CartLine],
    ) -> Result<BTreeMap<String, ItemAvailability>> {
        let mut results = Self::check_cart(tables, cart)?;

        let recipes = cart
            .iter()
            .map(|line| RecipeCatalog::requirements(tables, &line.item_id))
            .collect::<Result<Vec<_>>>()?;
        let reserved = Self::reservations(cart, &recipes);

        for item in tables.menu_items() {
            if results.contains_key(&item.id) {
                continue;
            }
            let requirements = RecipeCatalog::requirements(tables, &item.id)?;
            let availability = Self::evaluate(tables, &item.id, 0, &requirements, &reserved)?;
            results.insert(item.id.clone(), availability);
        }

        Ok(results)
    }

    /// 彙總購物車各原料用量
    fn reservations<'a>(
        lines: &[CartLine],
        recipes: &'a [Vec<Requirement>],
    ) -> HashMap<&'a str, Decimal> {
        let mut reserved: HashMap<&str, Decimal> = HashMap::new();
        for (line, requirements) in lines.iter().zip(recipes) {
            for requirement in requirements {
                *reserved
                    .entry(requirement.ingredient_id.as_str())
                    .or_insert(Decimal::ZERO) += requirement.total_for(line.quantity);
            }
        }
        reserved
    }

    fn evaluate(
        tables: &Tables,
        item_id: &str,
        requested: u32,
        requirements: &[Requirement],
        reserved: &HashMap<&str, Decimal>,
    ) -> Result<ItemAvailability> {
        if requirements.is_empty() {
            return Ok(ItemAvailability::without_recipe(item_id, requested));
        }

        let mut max_additional: Option<u32> = None;
        let mut limiting_ingredient = None;

        for requirement in requirements {
            let current = tables.stock(&requirement.ingredient_id)?.current_quantity;
            let reserved_by_others = reserved
                .get(requirement.ingredient_id.as_str())
                .copied()
                .unwrap_or(Decimal::ZERO);
            let available_for_item = current - reserved_by_others;

            let possible = Self::possible_quantity(available_for_item, requirement.unit_quantity);

            // 同為最小值時保留先出現的原料
            if max_additional.map_or(true, |min| possible < min) {
                max_additional = Some(possible);
                limiting_ingredient = Some(requirement.ingredient_id.clone());
            }
        }

        let max_additional = max_additional.unwrap_or(0);
        Ok(ItemAvailability {
            item_id: item_id.to_string(),
            available: max_additional >= 1,
            max_additional,
            limiting_ingredient,
            reason: None,
            requested,
        })
    }

    /// floor(available / unit)，小於零時為零，溢位時取 u32::MAX
    fn possible_quantity(available: Decimal, unit_quantity: Decimal) -> u32 {
        if available <= Decimal::ZERO || unit_quantity <= Decimal::ZERO {
            return 0;
        }
        available
            .checked_div(unit_quantity)
            .and_then(|q| q.floor().to_u32())
            .unwrap_or(u32::MAX)
    }
}
