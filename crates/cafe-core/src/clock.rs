//! 時鐘抽象（測試時替換為固定時間）

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use parking_lot::Mutex;

/// 時鐘
pub trait Clock: Send + Sync {
    /// 目前時間（店舖當地時間）
    fn now(&self) -> NaiveDateTime;

    /// 今天
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// 系統時鐘
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// 固定時鐘
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// 前進一段時間
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock();
        *now += duration;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}
