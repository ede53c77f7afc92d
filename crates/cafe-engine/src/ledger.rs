//! 庫存異動帳

use cafe_core::{CafeError, ChangeKind, Result, StockLedgerEntry};
use cafe_store::Tables;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use uuid::Uuid;

/// 庫存異動請求
#[derive(Debug, Clone, PartialEq)]
pub struct StockChange {
    /// 原料ID
    pub ingredient_id: String,

    /// 異動類型
    pub kind: ChangeKind,

    /// 異動數量
    ///
    /// In / Out 必須為正數；Adjust 帶正負號且不可為零。
    pub delta: Decimal,

    /// 備註
    pub note: Option<String>,

    /// 來源訂單
    pub order_id: Option<Uuid>,

    /// 來源訂單明細
    pub order_line_id: Option<Uuid>,
}

impl StockChange {
    /// 入庫
    pub fn inbound(ingredient_id: impl Into<String>, delta: Decimal) -> Self {
        Self::new(ingredient_id.into(), ChangeKind::In, delta)
    }

    /// 出庫
    pub fn outbound(ingredient_id: impl Into<String>, delta: Decimal) -> Self {
        Self::new(ingredient_id.into(), ChangeKind::Out, delta)
    }

    /// 盤點調整
    pub fn adjustment(ingredient_id: impl Into<String>, signed_delta: Decimal) -> Self {
        Self::new(ingredient_id.into(), ChangeKind::Adjust, signed_delta)
    }

    fn new(ingredient_id: String, kind: ChangeKind, delta: Decimal) -> Self {
        Self {
            ingredient_id,
            kind,
            delta,
            note: None,
            order_id: None,
            order_line_id: None,
        }
    }

    /// 建構器模式：設置備註
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// 建構器模式：設置來源訂單
    pub fn caused_by(mut self, order_id: Uuid) -> Self {
        self.order_id = Some(order_id);
        self
    }

    /// 建構器模式：設置來源訂單明細
    pub fn for_line(mut self, order_line_id: Uuid) -> Self {
        self.order_line_id = Some(order_line_id);
        self
    }
}

/// 帳面與庫存不一致的原料
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerMismatch {
    pub ingredient_id: String,
    pub replayed_quantity: Decimal,
    pub current_quantity: Decimal,
}

/// 庫存帳
pub struct StockLedger;

impl StockLedger {
    /// 記錄一筆庫存異動
    ///
    /// 更新原料現有庫存並附加一筆不可變記錄。出庫會使庫存成為負數時拒絕，
    /// 不寫入任何資料。
    pub fn record_change(
        tables: &mut Tables,
        change: StockChange,
        recorded_at: NaiveDateTime,
    ) -> Result<StockLedgerEntry> {
        let before = tables.stock(&change.ingredient_id)?.current_quantity;

        let after = match change.kind {
            ChangeKind::In => {
                Self::require_positive(&change)?;
                before + change.delta
            }
            ChangeKind::Out => {
                Self::require_positive(&change)?;
                before - change.delta
            }
            ChangeKind::Adjust => {
                if change.delta.is_zero() {
                    return Err(CafeError::invalid_quantity(format!(
                        "原料 {} 的調整數量不可為零",
                        change.ingredient_id
                    )));
                }
                before + change.delta
            }
        };

        if after < Decimal::ZERO {
            tracing::warn!(
                "拒絕異動 {}: 現有 {}, 異動 {}",
                change.ingredient_id,
                before,
                change.delta
            );
            return Err(CafeError::ConsistencyViolation {
                ingredient_id: change.ingredient_id,
                before,
                delta: change.delta.abs(),
            });
        }

        let sequence = tables.next_ledger_sequence();
        let stock = tables.stock_mut(&change.ingredient_id)?;
        stock.current_quantity = after;
        stock.last_updated = recorded_at;

        let entry = StockLedgerEntry {
            id: Uuid::new_v4(),
            sequence,
            ingredient_id: change.ingredient_id,
            change_kind: change.kind,
            delta_quantity: change.delta.abs(),
            quantity_before: before,
            quantity_after: after,
            order_id: change.order_id,
            order_line_id: change.order_line_id,
            note: change.note,
            recorded_at,
        };
        tables.append_ledger(entry.clone());

        tracing::debug!(
            "庫存異動 #{} {} {:?} {} ({} -> {})",
            entry.sequence,
            entry.ingredient_id,
            entry.change_kind,
            entry.delta_quantity,
            entry.quantity_before,
            entry.quantity_after
        );

        Ok(entry)
    }

    /// 由零開始依時間順序重播異動，得到每個原料的數量
    pub fn replay(entries: &[StockLedgerEntry]) -> BTreeMap<String, Decimal> {
        let mut ordered: Vec<&StockLedgerEntry> = entries.iter().collect();
        ordered.sort_by_key(|e| (e.recorded_at, e.sequence));

        let mut quantities = BTreeMap::new();
        for entry in ordered {
            let quantity = quantities
                .entry(entry.ingredient_id.clone())
                .or_insert(Decimal::ZERO);
            *quantity += match entry.change_kind {
                ChangeKind::In => entry.delta_quantity,
                ChangeKind::Out => -entry.delta_quantity,
                ChangeKind::Adjust => entry.signed_delta(),
            };
        }
        quantities
    }

    /// 比對重播結果與現有庫存
    pub fn verify(tables: &Tables) -> Vec<LedgerMismatch> {
        let replayed = Self::replay(tables.ledger());

        tables
            .stock_levels()
            .filter_map(|stock| {
                let replayed_quantity = replayed
                    .get(&stock.ingredient_id)
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                (replayed_quantity != stock.current_quantity).then(|| LedgerMismatch {
                    ingredient_id: stock.ingredient_id.clone(),
                    replayed_quantity,
                    current_quantity: stock.current_quantity,
                })
            })
            .collect()
    }

    /// 某張訂單造成的淨消耗（出庫減去補回）
    pub fn net_consumption_for_order(
        tables: &Tables,
        order_id: Uuid,
    ) -> BTreeMap<String, Decimal> {
        Self::net_consumption(tables, |e| e.order_id == Some(order_id))
    }

    /// 某筆訂單明細造成的淨消耗
    pub fn net_consumption_for_line(
        tables: &Tables,
        order_id: Uuid,
        order_line_id: Uuid,
    ) -> BTreeMap<String, Decimal> {
        Self::net_consumption(tables, |e| {
            e.order_id == Some(order_id) && e.order_line_id == Some(order_line_id)
        })
    }

    fn net_consumption(
        tables: &Tables,
        filter: impl Fn(&StockLedgerEntry) -> bool,
    ) -> BTreeMap<String, Decimal> {
        let mut consumption = BTreeMap::new();
        for entry in tables.ledger().iter().filter(|&e| filter(e)) {
            let amount = consumption
                .entry(entry.ingredient_id.clone())
                .or_insert(Decimal::ZERO);
            *amount -= entry.signed_delta();
        }
        consumption
    }

    fn require_positive(change: &StockChange) -> Result<()> {
        if change.delta <= Decimal::ZERO {
            return Err(CafeError::invalid_quantity(format!(
                "原料 {} 的異動數量必須為正數: {}",
                change.ingredient_id, change.delta
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cafe_core::{ErrorKind, StockLevel};
    use chrono::{Duration, NaiveDate};

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 4)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn tables_with_milk() -> Tables {
        let mut tables = Tables::new();
        tables.insert_stock(StockLevel::new("MILK".to_string(), at()));
        tables
    }

    #[test]
    fn test_record_in_and_out() {
        let mut tables = tables_with_milk();

        let entry_in =
            StockLedger::record_change(&mut tables, StockChange::inbound("MILK", Decimal::from(1000)), at())
                .unwrap();
        let entry_out = StockLedger::record_change(
            &mut tables,
            StockChange::outbound("MILK", Decimal::from(150)).with_note("order"),
            at() + Duration::minutes(5),
        )
        .unwrap();

        assert_eq!(entry_in.quantity_after, Decimal::from(1000));
        assert_eq!(entry_out.quantity_before, Decimal::from(1000));
        assert_eq!(entry_out.quantity_after, Decimal::from(850));
        assert_eq!(entry_out.sequence, 2);
        assert_eq!(
            tables.stock("MILK").unwrap().current_quantity,
            Decimal::from(850)
        );
        assert_eq!(tables.ledger().len(), 2);
    }

    #[test]
    fn test_out_below_zero_is_refused() {
        let mut tables = tables_with_milk();
        StockLedger::record_change(&mut tables, StockChange::inbound("MILK", Decimal::from(100)), at())
            .unwrap();

        let err = StockLedger::record_change(
            &mut tables,
            StockChange::outbound("MILK", Decimal::from(150)),
            at(),
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConsistencyViolation);
        assert_eq!(tables.ledger().len(), 1);
        assert_eq!(
            tables.stock("MILK").unwrap().current_quantity,
            Decimal::from(100)
        );
    }

    #[test]
    fn test_non_positive_delta_rejected() {
        let mut tables = tables_with_milk();

        for delta in [Decimal::ZERO, Decimal::from(-5)] {
            let err = StockLedger::record_change(&mut tables, StockChange::inbound("MILK", delta), at())
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidQuantity);
        }
        let err = StockLedger::record_change(
            &mut tables,
            StockChange::adjustment("MILK", Decimal::ZERO),
            at(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidQuantity);
        assert!(tables.ledger().is_empty());
    }

    #[test]
    fn test_unknown_ingredient() {
        let mut tables = tables_with_milk();
        let err = StockLedger::record_change(
            &mut tables,
            StockChange::inbound("SUGAR", Decimal::ONE),
            at(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_replay_matches_stock() {
        let mut tables = tables_with_milk();
        StockLedger::record_change(&mut tables, StockChange::inbound("MILK", Decimal::from(500)), at())
            .unwrap();
        StockLedger::record_change(&mut tables, StockChange::outbound("MILK", Decimal::from(120)), at())
            .unwrap();
        StockLedger::record_change(
            &mut tables,
            StockChange::adjustment("MILK", Decimal::from(-30)),
            at(),
        )
        .unwrap();

        let replayed = StockLedger::replay(tables.ledger());

        assert_eq!(replayed["MILK"], Decimal::from(350));
        assert!(StockLedger::verify(&tables).is_empty());
        let adjust = &tables.ledger()[2];
        assert_eq!(adjust.delta_quantity, Decimal::from(30));
        assert_eq!(adjust.signed_delta(), Decimal::from(-30));
    }

    #[test]
    fn test_net_consumption_for_order() {
        let mut tables = tables_with_milk();
        let order_id = Uuid::new_v4();
        StockLedger::record_change(&mut tables, StockChange::inbound("MILK", Decimal::from(500)), at())
            .unwrap();
        StockLedger::record_change(
            &mut tables,
            StockChange::outbound("MILK", Decimal::from(300)).caused_by(order_id),
            at(),
        )
        .unwrap();
        StockLedger::record_change(
            &mut tables,
            StockChange::inbound("MILK", Decimal::from(150)).caused_by(order_id),
            at(),
        )
        .unwrap();

        let consumption = StockLedger::net_consumption_for_order(&tables, order_id);
        assert_eq!(consumption["MILK"], Decimal::from(150));
    }

    #[test]
    fn test_net_consumption_for_line() {
        let mut tables = tables_with_milk();
        let order_id = Uuid::new_v4();
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
        StockLedger::record_change(&mut tables, StockChange::inbound("MILK", Decimal::from(900)), at())
            .unwrap();
        for (line, amount) in [(first, 300), (second, 450)] {
            StockLedger::record_change(
                &mut tables,
                StockChange::outbound("MILK", Decimal::from(amount))
                    .caused_by(order_id)
                    .for_line(line),
                at(),
            )
            .unwrap();
        }
        StockLedger::record_change(
            &mut tables,
            StockChange::inbound("MILK", Decimal::from(150))
                .caused_by(order_id)
                .for_line(second),
            at(),
        )
        .unwrap();

        assert_eq!(
            StockLedger::net_consumption_for_line(&tables, order_id, first)["MILK"],
            Decimal::from(300)
        );
        assert_eq!(
            StockLedger::net_consumption_for_line(&tables, order_id, second)["MILK"],
            Decimal::from(300)
        );
        assert_eq!(
            StockLedger::net_consumption_for_order(&tables, order_id)["MILK"],
            Decimal::from(600)
        );
    }
}
