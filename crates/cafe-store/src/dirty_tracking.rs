//! 異動標記追蹤

use std::collections::BTreeSet;

/// 記錄交易中被異動過庫存的原料
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    dirty_ingredients: BTreeSet<String>,
}

impl DirtyTracker {
    /// 創建新的追蹤器
    pub fn new() -> Self {
        Self::default()
    }

    /// 標記原料為已異動
    pub fn mark_dirty(&mut self, ingredient_id: &str) {
        if !self.dirty_ingredients.contains(ingredient_id) {
            self.dirty_ingredients.insert(ingredient_id.to_string());
        }
    }

    /// 取出所有已異動原料（依ID排序）並清除標記
    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.dirty_ingredients)
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_clears_marks() {
        let mut tracker = DirtyTracker::new();
        tracker.mark_dirty("MILK");
        tracker.mark_dirty("BEANS");
        tracker.mark_dirty("MILK");

        assert_eq!(tracker.take(), vec!["BEANS".to_string(), "MILK".to_string()]);
        assert!(tracker.take().is_empty());
    }
}
