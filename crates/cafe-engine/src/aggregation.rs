//! 週期彙總：依日期類鍵分組並加總金額
//!
//! 入帳分桶與週薪計算共用。

use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// 一個週期的彙總結果
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodTotal<K, T> {
    /// 週期鍵（日期、週起始日 ...）
    pub key: K,
    /// 金額合計
    pub total: Decimal,
    /// 該週期的記錄（保留輸入順序）
    pub records: Vec<T>,
}

/// 週期彙總器
pub struct PeriodAggregator;

impl PeriodAggregator {
    /// 分組並加總，結果依鍵遞增排序
    pub fn group<K, T, FK, FA>(records: impl IntoIterator<Item = T>, key: FK, amount: FA) -> Vec<PeriodTotal<K, T>>
    where
        K: Ord + Clone,
        FK: Fn(&T) -> K,
        FA: Fn(&T) -> Decimal,
    {
        let mut grouped: BTreeMap<K, PeriodTotal<K, T>> = BTreeMap::new();

        for record in records {
            let k = key(&record);
            let value = amount(&record);
            let period = grouped.entry(k.clone()).or_insert_with(|| PeriodTotal {
                key: k,
                total: Decimal::ZERO,
                records: Vec::new(),
            });
            period.total += value;
            period.records.push(record);
        }

        grouped.into_values().collect()
    }
}
