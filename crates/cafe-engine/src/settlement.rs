//! 入帳排程

use cafe_core::{Clock, Order, PaymentChannel, Result, SettlementConfig};
use cafe_store::{Store, Tables};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::aggregation::PeriodAggregator;

/// 入帳日規則
#[derive(Debug, Clone, Default)]
pub struct SettlementPolicy {
    config: SettlementConfig,
}

impl SettlementPolicy {
    pub fn new(config: SettlementConfig) -> Self {
        Self { config }
    }

    /// 計算預計入帳日
    ///
    /// 由下單日往後逐日前進，只有營業日計入；下單日本身不計。
    pub fn expected_settlement_date(
        &self,
        placed_at: NaiveDateTime,
        channel: &PaymentChannel,
    ) -> Result<NaiveDate> {
        let days = self.config.days_for(channel);
        self.config.calendar.add_business_days(placed_at.date(), days)
    }
}

/// 同一預計入帳日的訂單
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementBucket {
    /// 預計入帳日
    pub date: NaiveDate,
    /// 金額合計
    pub total_amount: Decimal,
    /// 訂單（依下單時間排序）
    pub orders: Vec<Order>,
}

/// 通路未入帳合計
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelTotal {
    pub channel: PaymentChannel,
    pub order_count: usize,
    pub total_amount: Decimal,
}

/// 入帳排程器
pub struct SettlementScheduler<S: Store, C: Clock> {
    store: S,
    clock: C,
    policy: SettlementPolicy,
}

impl<S: Store, C: Clock> SettlementScheduler<S, C> {
    /// 創建新的入帳排程器
    pub fn new(store: S, clock: C, config: SettlementConfig) -> Self {
        Self {
            store,
            clock,
            policy: SettlementPolicy::new(config),
        }
    }

    /// 計算預計入帳日
    pub fn compute_expected_settlement_date(
        &self,
        order_timestamp: NaiveDateTime,
        channel: &PaymentChannel,
    ) -> Result<NaiveDate> {
        self.policy.expected_settlement_date(order_timestamp, channel)
    }

    /// 未入帳訂單依預計入帳日分桶
    pub fn pending_settlement_buckets(&self) -> Vec<SettlementBucket> {
        self.store.read(|tables| {
            PeriodAggregator::group(
                Self::pending_orders(tables),
                |o| o.expected_settlement_date,
                |o| o.total_amount,
            )
            .into_iter()
            .map(|period| SettlementBucket {
                date: period.key,
                total_amount: period.total,
                orders: period.records,
            })
            .collect()
        })
    }

    /// 各付款通路的未入帳合計
    pub fn pending_totals_by_channel(&self) -> Vec<ChannelTotal> {
        self.store.read(|tables| {
            PeriodAggregator::group(
                Self::pending_orders(tables),
                |o| o.payment_channel.clone(),
                |o| o.total_amount,
            )
            .into_iter()
            .map(|period| ChannelTotal {
                channel: period.key,
                order_count: period.records.len(),
                total_amount: period.total,
            })
            .collect()
        })
    }

    /// 標記單筆訂單已入帳
    ///
    /// 重複呼叫不報錯；回傳此次是否真的由未入帳轉為已入帳。
    pub fn mark_order_settled(
        &self,
        order_id: Uuid,
        settled_date: Option<NaiveDate>,
    ) -> Result<bool> {
        let settled_date = settled_date.unwrap_or_else(|| self.clock.today());

        self.store.transaction(|tables| {
            let order = tables.order_mut(order_id)?;
            if !order.is_settled && !order.is_settlement_pending() {
                tracing::warn!("訂單 {} 狀態為 {:?}，不列入入帳", order_id, order.status);
                return Ok(false);
            }
            let transitioned = order.mark_settled(settled_date);
            if transitioned {
                tracing::info!("訂單 {} 已入帳 ({})", order_id, settled_date);
            }
            Ok(transitioned)
        })
    }

    /// 標記某預計入帳日的所有未入帳訂單
    ///
    /// 在單一交易內完成；回傳實際轉換的筆數。
    pub fn mark_bucket_settled(
        &self,
        date: NaiveDate,
        settled_date: Option<NaiveDate>,
    ) -> Result<usize> {
        let settled_date = settled_date.unwrap_or_else(|| self.clock.today());

        let count = self.store.transaction(|tables| {
            let mut count = 0;
            for order in tables
                .orders_mut()
                .filter(|o| o.is_settlement_pending() && o.expected_settlement_date == date)
            {
                if order.mark_settled(settled_date) {
                    count += 1;
                }
            }
            Ok(count)
        })?;

        tracing::info!("入帳日 {} 共 {} 筆訂單標記為已入帳", date, count);
        Ok(count)
    }

    /// 未入帳訂單，依下單時間排序
    fn pending_orders(tables: &Tables) -> Vec<Order> {
        let mut orders: Vec<Order> = tables
            .orders()
            .filter(|o| o.is_settlement_pending())
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.placed_at.cmp(&b.placed_at).then(a.id.cmp(&b.id)));
        orders
    }
}
