//! 引擎配置

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::{BusinessCalendar, CafeError, PaymentChannel, Result};

/// 引擎配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 入帳配置
    #[serde(default)]
    pub settlement: SettlementConfig,

    /// 薪資配置
    #[serde(default)]
    pub payroll: PayrollConfig,
}

impl EngineConfig {
    /// 從 JSON 字串載入
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| CafeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 從 JSON 檔案載入
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CafeError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    /// 檢查配置
    pub fn validate(&self) -> Result<()> {
        self.settlement.validate()?;
        self.payroll.validate()
    }
}

/// 入帳配置：各付款通路的入帳營業日數
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// 通路代碼 -> 營業日數
    pub channel_days: BTreeMap<String, u32>,

    /// 未配置通路的營業日數
    pub default_days: u32,

    /// 營業日曆
    #[serde(default)]
    pub calendar: BusinessCalendar,
}

impl SettlementConfig {
    /// 創建空的入帳配置
    pub fn new(default_days: u32) -> Self {
        Self {
            channel_days: BTreeMap::new(),
            default_days,
            calendar: BusinessCalendar::new(),
        }
    }

    /// 建構器模式：設置通路營業日數
    pub fn with_channel_days(mut self, channel: &PaymentChannel, days: u32) -> Self {
        self.channel_days.insert(channel.code().to_string(), days);
        self
    }

    /// 獲取通路的入帳營業日數
    pub fn days_for(&self, channel: &PaymentChannel) -> u32 {
        self.channel_days
            .get(channel.code())
            .copied()
            .unwrap_or(self.default_days)
    }

    fn validate(&self) -> Result<()> {
        if !self.calendar.business_days.iter().any(|&d| d) {
            return Err(CafeError::Config("營業日曆沒有任何營業日".to_string()));
        }
        Ok(())
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self::new(5)
            .with_channel_days(&PaymentChannel::Card, 2)
            .with_channel_days(&PaymentChannel::Coupang, 5)
            .with_channel_days(&PaymentChannel::Baemin, 5)
            .with_channel_days(&PaymentChannel::Yogiyo, 5)
    }
}

/// 薪資配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollConfig {
    /// 週休津貼門檻（週工時）
    pub holiday_pay_threshold_hours: Decimal,

    /// 全職週工時
    pub full_time_weekly_hours: Decimal,

    /// 週休津貼給付時數（全職）
    pub paid_holiday_hours: Decimal,

    /// 加班費倍率
    pub overtime_multiplier: Decimal,
}

impl PayrollConfig {
    fn validate(&self) -> Result<()> {
        if self.overtime_multiplier < Decimal::ONE {
            return Err(CafeError::Config(format!(
                "加班費倍率不得小於 1: {}",
                self.overtime_multiplier
            )));
        }
        if self.full_time_weekly_hours <= Decimal::ZERO || self.paid_holiday_hours <= Decimal::ZERO
        {
            return Err(CafeError::Config("工時設定必須為正數".to_string()));
        }
        if self.holiday_pay_threshold_hours < Decimal::ZERO {
            return Err(CafeError::Config("週休津貼門檻不得為負數".to_string()));
        }
        Ok(())
    }
}

impl Default for PayrollConfig {
    fn default() -> Self {
        Self {
            holiday_pay_threshold_hours: Decimal::from(15),
            full_time_weekly_hours: Decimal::from(40),
            paid_holiday_hours: Decimal::from(8),
            overtime_multiplier: Decimal::new(15, 1),
        }
    }
}
