//! 訂單履約引擎
//!
//! 下單時在同一交易中完成：即時庫存檢查 → 建立訂單 → 依配方扣庫 → 寫入庫存帳。
//! 取消與改量以補償分錄回補庫存，不改寫既有記錄。

use cafe_core::{
    CafeError, Clock, Order, OrderLine, OrderStatus, PaymentChannel, Result, SettlementConfig,
};
use cafe_store::{Store, Tables};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::availability::{AvailabilityChecker, CartLine, ItemAvailability};
use crate::ledger::{StockChange, StockLedger};
use crate::recipe::RecipeCatalog;
use crate::settlement::SettlementPolicy;

/// 下單明細請求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequestLine {
    /// 品項ID
    pub item_id: String,
    /// 數量（必須 > 0）
    pub quantity: i32,
}

impl OrderRequestLine {
    pub fn new(item_id: impl Into<String>, quantity: i32) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
        }
    }
}

/// 改量結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange {
    /// 數量未變
    Unchanged,
    /// 增量（已扣庫）
    Increased { delta: u32 },
    /// 減量（已回補）
    Reduced { delta: u32 },
    /// 明細移除
    Removed,
    /// 最後一筆明細移除，整張訂單取消
    OrderCancelled,
}

/// 訂單履約引擎
pub struct OrderFulfillmentEngine<S: Store, C: Clock> {
    store: S,
    clock: C,
    settlement: SettlementPolicy,
}

impl<S: Store, C: Clock> OrderFulfillmentEngine<S, C> {
    /// 創建新的履約引擎
    pub fn new(store: S, clock: C, settlement: SettlementConfig) -> Self {
        Self {
            store,
            clock,
            settlement: SettlementPolicy::new(settlement),
        }
    }

    /// 購物車可售量（唯讀快照，僅供參考）
    pub fn check_cart(&self, lines: &[CartLine]) -> Result<BTreeMap<String, ItemAvailability>> {
        self.store
            .read(|tables| AvailabilityChecker::check_cart(tables, lines))
    }

    /// 目前購物車下菜單所有品項的可售量
    pub fn menu_availability(
        &self,
        cart: &[CartLine],
    ) -> Result<BTreeMap<String, ItemAvailability>> {
        self.store
            .read(|tables| AvailabilityChecker::menu_availability(tables, cart))
    }

    /// 下單
    ///
    /// 任何原料不足時整筆拒絕，不留下任何訂單或庫存異動。
    pub fn place_order(
        &self,
        lines: &[OrderRequestLine],
        payment_channel: PaymentChannel,
    ) -> Result<Order> {
        if lines.is_empty() {
            return Err(CafeError::invalid_quantity("訂單沒有任何明細"));
        }

        let placed_at = self.clock.now();
        let expected_settlement_date = self
            .settlement
            .expected_settlement_date(placed_at, &payment_channel)?;

        tracing::info!(
            "開始下單：明細 {} 筆，通路 {}",
            lines.len(),
            payment_channel
        );

        let result = self.store.transaction(|tables| {
            // Step 1: 驗證數量與配方，彙總各原料需求
            let mut planned = Vec::with_capacity(lines.len());
            for line in lines {
                let quantity = Self::positive_quantity(&line.item_id, line.quantity)?;
                let unit_price = tables.menu_item(&line.item_id)?.price;
                let requirements = RecipeCatalog::orderable_requirements(tables, &line.item_id)?;
                planned.push((
                    OrderLine::new(line.item_id.clone(), quantity, unit_price),
                    requirements,
                ));
            }

            // Step 2: 以即時庫存檢查（先檢查，後異動）
            let mut needs: Vec<(String, Decimal)> = Vec::new();
            for (line, requirements) in &planned {
                for requirement in requirements {
                    let amount = requirement.total_for(line.quantity);
                    match needs
                        .iter_mut()
                        .find(|(id, _)| *id == requirement.ingredient_id)
                    {
                        Some((_, total)) => *total += amount,
                        None => needs.push((requirement.ingredient_id.clone(), amount)),
                    }
                }
            }
            for (ingredient_id, required) in &needs {
                Self::ensure_stock(tables, ingredient_id, *required)?;
            }

            // Step 3: 建立訂單（總金額與預計入帳日）
            let mut order = Order::new(
                placed_at,
                planned.iter().map(|(line, _)| line.clone()).collect(),
                payment_channel.clone(),
                expected_settlement_date,
            );
            order.transition(OrderStatus::Fulfilled)?;
            tables.insert_order(order.clone())?;

            // Step 4: 依配方扣庫並寫入庫存帳
            let note = format!("order {}", order.id);
            for (line, requirements) in &planned {
                for requirement in requirements {
                    StockLedger::record_change(
                        tables,
                        StockChange::outbound(
                            requirement.ingredient_id.clone(),
                            requirement.total_for(line.quantity),
                        )
                        .with_note(note.clone())
                        .caused_by(order.id)
                        .for_line(line.id),
                        placed_at,
                    )?;
                }
            }

            Self::warn_low_stock(tables);
            Ok(order)
        });

        match &result {
            Ok(order) => tracing::info!(
                "訂單 {} 完成，總金額 {}，預計入帳日 {}",
                order.id,
                order.total_amount,
                order.expected_settlement_date
            ),
            Err(err) => tracing::warn!("訂單被拒絕 ({:?}): {}", OrderStatus::Rejected, err),
        }

        result
    }

    /// 取消訂單
    ///
    /// 以補償入庫分錄回補該訂單的淨消耗，訂單標記為 Cancelled 並保留。
    pub fn cancel_order(&self, order_id: Uuid) -> Result<Order> {
        let now = self.clock.now();
        let order = self
            .store
            .transaction(|tables| Self::cancel_in(tables, order_id, now))?;

        tracing::info!("訂單 {} 已取消", order_id);
        Ok(order)
    }

    /// 修改明細數量
    ///
    /// `new_quantity <= 0` 視為移除明細；移除最後一筆明細時整張訂單取消。
    /// 總金額一律由所有明細重新計算。
    pub fn change_line_quantity(
        &self,
        order_id: Uuid,
        line_id: Uuid,
        new_quantity: i32,
    ) -> Result<LineChange> {
        let now = self.clock.now();

        let change = self.store.transaction(|tables| {
            let order = tables.order(order_id)?;
            Self::ensure_fulfilled(order)?;
            let line = order.line(line_id)?.clone();
            let remaining_lines = order.lines.len();

            if new_quantity <= 0 {
                let consumed = StockLedger::net_consumption_for_line(tables, order_id, line_id);
                Self::restore(tables, order_id, Some(line_id), consumed, "line removed", now)?;
                tables.order_mut(order_id)?.remove_line(line_id)?;

                if remaining_lines == 1 {
                    Self::cancel_in(tables, order_id, now)?;
                    return Ok(LineChange::OrderCancelled);
                }
                return Ok(LineChange::Removed);
            }

            let new_quantity = new_quantity.unsigned_abs();
            let change = if new_quantity > line.quantity {
                let delta = new_quantity - line.quantity;
                let requirements = RecipeCatalog::orderable_requirements(tables, &line.item_id)?;
                for requirement in &requirements {
                    Self::ensure_stock(tables, &requirement.ingredient_id, requirement.total_for(delta))?;
                }
                for requirement in &requirements {
                    StockLedger::record_change(
                        tables,
                        StockChange::outbound(
                            requirement.ingredient_id.clone(),
                            requirement.total_for(delta),
                        )
                        .with_note("quantity increased")
                        .caused_by(order_id)
                        .for_line(line_id),
                        now,
                    )?;
                }
                LineChange::Increased { delta }
            } else if new_quantity < line.quantity {
                let delta = line.quantity - new_quantity;
                // 依該明細實際消耗按比例回補
                let returned = StockLedger::net_consumption_for_line(tables, order_id, line_id)
                    .into_iter()
                    .map(|(ingredient_id, consumed)| {
                        let amount = Self::share_of(consumed, delta, line.quantity)?;
                        Ok((ingredient_id, amount))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Self::restore(tables, order_id, Some(line_id), returned, "quantity reduced", now)?;
                LineChange::Reduced { delta }
            } else {
                LineChange::Unchanged
            };

            let order = tables.order_mut(order_id)?;
            order.line_mut(line_id)?.quantity = new_quantity;
            order.recompute_total();

            Self::warn_low_stock(tables);
            Ok(change)
        })?;

        tracing::info!("訂單 {} 明細 {} 改量: {:?}", order_id, line_id, change);
        Ok(change)
    }

    /// 在交易內取消訂單
    fn cancel_in(tables: &mut Tables, order_id: Uuid, now: NaiveDateTime) -> Result<Order> {
        let order = tables.order(order_id)?;
        if !order.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(CafeError::InvalidTransition {
                order_id: order_id.to_string(),
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }

        let consumed = StockLedger::net_consumption_for_order(tables, order_id);
        Self::restore(tables, order_id, None, consumed, "cancellation", now)?;

        let order = tables.order_mut(order_id)?;
        order.transition(OrderStatus::Cancelled)?;
        order.cancelled_at = Some(now);
        Ok(order.clone())
    }

    /// 以補償入庫分錄回補；已刪除的原料略過
    fn restore(
        tables: &mut Tables,
        order_id: Uuid,
        order_line_id: Option<Uuid>,
        amounts: impl IntoIterator<Item = (String, Decimal)>,
        note: &str,
        now: NaiveDateTime,
    ) -> Result<()> {
        for (ingredient_id, amount) in amounts {
            if amount <= Decimal::ZERO {
                continue;
            }
            if tables.stock(&ingredient_id).is_err() {
                tracing::debug!("原料 {} 已刪除，略過回補", ingredient_id);
                continue;
            }
            let mut change = StockChange::inbound(ingredient_id, amount)
                .with_note(note)
                .caused_by(order_id);
            if let Some(line_id) = order_line_id {
                change = change.for_line(line_id);
            }
            StockLedger::record_change(tables, change, now)?;
        }
        Ok(())
    }

    /// consumed × part / whole
    fn share_of(consumed: Decimal, part: u32, whole: u32) -> Result<Decimal> {
        consumed
            .checked_mul(Decimal::from(part))
            .and_then(|v| v.checked_div(Decimal::from(whole)))
            .ok_or_else(|| {
                CafeError::invalid_quantity(format!(
                    "無法計算回補數量: {} × {} / {}",
                    consumed, part, whole
                ))
            })
    }

    fn ensure_stock(tables: &Tables, ingredient_id: &str, required: Decimal) -> Result<()> {
        let current = tables.stock(ingredient_id)?.current_quantity;
        if current < required {
            let ingredient_name = tables.ingredient(ingredient_id)?.name.clone();
            return Err(CafeError::InsufficientStock {
                ingredient_id: ingredient_id.to_string(),
                ingredient_name,
                required,
                current,
            });
        }
        Ok(())
    }

    fn ensure_fulfilled(order: &Order) -> Result<()> {
        if order.status != OrderStatus::Fulfilled {
            return Err(CafeError::InvalidTransition {
                order_id: order.id.to_string(),
                from: order.status,
                to: OrderStatus::Fulfilled,
            });
        }
        Ok(())
    }

    fn positive_quantity(item_id: &str, quantity: i32) -> Result<u32> {
        if quantity <= 0 {
            return Err(CafeError::invalid_quantity(format!(
                "品項 {} 的數量必須為正數: {}",
                item_id, quantity
            )));
        }
        Ok(quantity.unsigned_abs())
    }

    /// 本次交易中跌破最低庫存的原料
    fn warn_low_stock(tables: &mut Tables) {
        for ingredient_id in tables.take_touched() {
            if let Ok(stock) = tables.stock(&ingredient_id) {
                if stock.is_below_minimum() {
                    tracing::warn!(
                        "原料 {} 低於最低庫存：現有 {}, 最低 {}",
                        ingredient_id,
                        stock.current_quantity,
                        stock.minimum_quantity
                    );
                }
            }
        }
    }
}
