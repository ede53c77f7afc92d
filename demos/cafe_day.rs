//! 咖啡廳一日營運示範
//!
//! 執行：cargo run --example cafe_day

use std::sync::Arc;

use anyhow::Result;
use cafe::core::{Employee, FixedClock, WorkShift};
use cafe::{
    CartLine, EngineConfig, InventoryManager, MemoryStore, OrderFulfillmentEngine,
    OrderRequestLine, PaymentChannel, PayrollCalculator, SettlementScheduler,
};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // 可指定 JSON 配置檔：cargo run --example cafe_day -- config.json
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    config.validate()?;

    let opening = NaiveDate::from_ymd_opt(2024, 1, 5)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .ok_or_else(|| anyhow::anyhow!("無效的開店時間"))?;
    let clock = Arc::new(FixedClock::new(opening));
    let store = MemoryStore::new();

    let inventory = InventoryManager::new(store.clone(), clock.clone());
    let engine =
        OrderFulfillmentEngine::new(store.clone(), clock.clone(), config.settlement.clone());
    let settlement =
        SettlementScheduler::new(store.clone(), clock.clone(), config.settlement.clone());

    // 1. 開店備料
    println!("=== 開店備料 ===");
    inventory.create_ingredient("milk", "牛奶", "ml", Decimal::from(500))?;
    inventory.create_ingredient("beans", "咖啡豆", "g", Decimal::from(100))?;
    inventory.create_menu_item("latte", "拿鐵", Decimal::from(4500))?;
    inventory.create_menu_item("americano", "美式", Decimal::from(3500))?;
    inventory.set_recipe_line("latte", "milk", Decimal::from(150))?;
    inventory.set_recipe_line("latte", "beans", Decimal::from(18))?;
    inventory.set_recipe_line("americano", "beans", Decimal::from(18))?;
    inventory.restock("milk", Decimal::from(1000), Some("早班進貨"))?;
    inventory.restock("beans", Decimal::from(250), Some("早班進貨"))?;

    // 2. 點餐前檢查可售量
    println!("\n=== 購物車可售量 ===");
    let cart = [CartLine::new("latte", 2), CartLine::new("americano", 1)];
    for (item, availability) in engine.check_cart(&cart)? {
        println!(
            "{}: 可再做 {} 份 (限制原料: {:?})，購物車數量{}",
            item,
            availability.max_additional,
            availability.limiting_ingredient,
            if availability.covers_requested() { "可出餐" } else { "不足" }
        );
    }
    for (item, availability) in engine.menu_availability(&cart)? {
        if !availability.available {
            println!("{}: 停售 ({:?})", item, availability.reason);
        }
    }

    // 3. 下單
    println!("\n=== 下單 ===");
    let card_order = engine.place_order(
        &[
            OrderRequestLine::new("latte", 2),
            OrderRequestLine::new("americano", 1),
        ],
        PaymentChannel::Card,
    )?;
    println!(
        "刷卡訂單 {} 金額 {} 預計入帳 {}",
        card_order.id, card_order.total_amount, card_order.expected_settlement_date
    );

    clock.advance(Duration::hours(2));
    let delivery_order =
        engine.place_order(&[OrderRequestLine::new("latte", 3)], PaymentChannel::Baemin)?;
    println!(
        "外送訂單 {} 金額 {} 預計入帳 {}",
        delivery_order.id, delivery_order.total_amount, delivery_order.expected_settlement_date
    );

    // 4. 庫存不足被拒
    match engine.place_order(&[OrderRequestLine::new("latte", 5)], PaymentChannel::Card) {
        Ok(order) => println!("意外成功: {}", order.id),
        Err(e) => println!("訂單被拒: {}", e),
    }

    // 5. 改量與取消
    println!("\n=== 改量與取消 ===");
    clock.advance(Duration::minutes(30));
    let change = engine.change_line_quantity(delivery_order.id, delivery_order.lines[0].id, 1)?;
    println!("外送訂單改量: {:?}", change);
    let cancelled = engine.cancel_order(card_order.id)?;
    println!("訂單 {} 狀態 {:?}", cancelled.id, cancelled.status);

    // 6. 打烊盤點
    println!("\n=== 打烊盤點 ===");
    clock.advance(Duration::hours(8));
    inventory.record_waste("milk", Decimal::from(50), Some("過期"))?;
    inventory.adjust_to("beans", Decimal::from(200), Some("盤點"))?;
    for item in inventory.low_stock() {
        println!(
            "低庫存: {} 現有 {} 需補 {}",
            item.name, item.current_quantity, item.shortfall
        );
    }
    let mismatches = inventory.verify_ledger();
    println!("庫存帳核對: {} 筆不一致", mismatches.len());

    // 7. 入帳排程
    println!("\n=== 待入帳 ===");
    for bucket in settlement.pending_settlement_buckets() {
        println!(
            "{}: {} 筆，合計 {}",
            bucket.date,
            bucket.orders.len(),
            bucket.total_amount
        );
    }
    for total in settlement.pending_totals_by_channel() {
        println!("{}: {} 筆，合計 {}", total.channel, total.order_count, total.total_amount);
    }

    // 8. 週薪
    println!("\n=== 週薪 ===");
    let calculator = PayrollCalculator::new(config.payroll.clone());
    let staff = vec![Employee::new(
        "e1".to_string(),
        "店員".to_string(),
        Decimal::from(9860),
    )];
    let shifts: Vec<WorkShift> = (1..=5)
        .filter_map(|day| NaiveDate::from_ymd_opt(2024, 1, day))
        .map(|date| WorkShift::new("e1".to_string(), date, Decimal::from(8)))
        .collect();
    for pay in calculator.payroll(&staff, &shifts)? {
        println!(
            "{} 週起 {}: 工時 {}，週薪 {}",
            pay.employee_id, pay.week_start, pay.total_hours, pay.total_pay
        );
    }

    Ok(())
}
