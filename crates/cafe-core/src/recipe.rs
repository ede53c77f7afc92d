//! 菜單與配方模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 菜單品項
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    /// 品項ID
    pub id: String,

    /// 顯示名稱
    pub name: String,

    /// 售價（下單時擷取至訂單明細）
    pub price: Decimal,
}

impl MenuItem {
    /// 創建新的菜單品項
    pub fn new(id: String, name: String, price: Decimal) -> Self {
        Self { id, name, price }
    }
}

/// 配方行：一單位品項所需的原料數量
///
/// 每個 (item_id, ingredient_id) 組合最多一行。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeLine {
    /// 品項ID
    pub item_id: String,

    /// 原料ID
    pub ingredient_id: String,

    /// 單位用量（> 0）
    pub required_quantity: Decimal,
}

impl RecipeLine {
    /// 創建新的配方行
    pub fn new(item_id: String, ingredient_id: String, required_quantity: Decimal) -> Self {
        Self {
            item_id,
            ingredient_id,
            required_quantity,
        }
    }
}
