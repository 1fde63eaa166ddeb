//! Batch allocation through the SQLite ledger.

mod support;

use marketrun::adapter::outbound::sqlite::SqliteLedger;
use marketrun::application::purchasing::BatchSubmission;
use marketrun::application::{ConsolidationService, OrderService, PurchasingService};
use marketrun::domain::batch::BatchLine;
use marketrun::domain::order::{Order, OrderStatus};
use marketrun::testkit::domain::{batch_line, date, line, place_order, seed_catalog, user};
use marketrun::testkit::ledger::TempLedger;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use support::assertions::assert_conserved;

fn submission(lines: Vec<BatchLine>) -> BatchSubmission {
    BatchSubmission {
        purchaser_id: user(),
        market_location: None,
        purchase_date: Some(date(1)),
        lines,
    }
}

async fn reload(orders: &OrderService<SqliteLedger>, order: &Order) -> Order {
    orders.get(&order.id).await.expect("order exists")
}

#[tokio::test]
async fn short_purchase_is_split_by_ratio_and_costs_are_conserved() {
    let temp = TempLedger::new();
    let ledger = temp.ledger();
    let c = seed_catalog(&ledger).await;
    let north = place_order(&ledger, &c.north, date(1), vec![line(&c.tomato, dec!(10))]).await;
    let south = place_order(&ledger, &c.south, date(1), vec![line(&c.tomato, dec!(5))]).await;

    let receipt = PurchasingService::new(ledger.clone())
        .submit_batch(submission(vec![batch_line(&c.tomato, dec!(12), dec!(96000))]))
        .await
        .unwrap();

    let orders = OrderService::new(ledger);
    let north = reload(&orders, &north).await;
    let south = reload(&orders, &south).await;

    let fulfilled = [
        north.items[0].fulfillment.quantity_fulfilled().unwrap(),
        south.items[0].fulfillment.quantity_fulfilled().unwrap(),
    ];
    let costs = [
        north.items[0].fulfillment.allocated_cost().unwrap(),
        south.items[0].fulfillment.allocated_cost().unwrap(),
    ];
    assert_eq!(fulfilled, [dec!(8), dec!(4)]);
    assert_eq!(costs, [dec!(64000), dec!(32000)]);
    assert_conserved(&fulfilled, dec!(12));
    assert_conserved(&costs, dec!(96000));
    assert_eq!(receipt.allocated_items(), 2);
}

#[tokio::test]
async fn surplus_purchase_caps_every_store_at_its_request() {
    let temp = TempLedger::new();
    let ledger = temp.ledger();
    let c = seed_catalog(&ledger).await;
    let north = place_order(&ledger, &c.north, date(1), vec![line(&c.tuna, dec!(3))]).await;
    let east = place_order(&ledger, &c.east, date(1), vec![line(&c.tuna, dec!(2))]).await;

    let receipt = PurchasingService::new(ledger.clone())
        .submit_batch(submission(vec![batch_line(&c.tuna, dec!(8), dec!(400))]))
        .await
        .unwrap();
    let plan = receipt.lines[0].plan.as_ref().unwrap();
    assert_eq!(plan.ratio, Decimal::ONE);

    let orders = OrderService::new(ledger);
    let north = reload(&orders, &north).await;
    let east = reload(&orders, &east).await;
    assert_eq!(north.items[0].fulfillment.quantity_fulfilled(), Some(dec!(3)));
    assert_eq!(east.items[0].fulfillment.quantity_fulfilled(), Some(dec!(2)));
    // Unit price 50; the three surplus units are not charged to anyone.
    assert_eq!(north.items[0].fulfillment.allocated_cost(), Some(dec!(150)));
    assert_eq!(east.items[0].fulfillment.allocated_cost(), Some(dec!(100)));
}

#[tokio::test]
async fn two_to_one_requests_get_two_to_one_fulfillment() {
    let temp = TempLedger::new();
    let ledger = temp.ledger();
    let c = seed_catalog(&ledger).await;
    let north = place_order(&ledger, &c.north, date(2), vec![line(&c.onion, dec!(6))]).await;
    let south = place_order(&ledger, &c.south, date(2), vec![line(&c.onion, dec!(3))]).await;

    PurchasingService::new(ledger.clone())
        .submit_batch(submission(vec![batch_line(&c.onion, dec!(6), dec!(90))]))
        .await
        .unwrap();

    let orders = OrderService::new(ledger);
    let north = reload(&orders, &north).await;
    let south = reload(&orders, &south).await;
    let n = north.items[0].fulfillment.quantity_fulfilled().unwrap();
    let s = south.items[0].fulfillment.quantity_fulfilled().unwrap();
    assert_eq!(n, dec!(4));
    assert_eq!(s, dec!(2));
    assert_eq!(n, s * dec!(2));
}

#[tokio::test]
async fn status_projection_follows_item_allocation() {
    let temp = TempLedger::new();
    let ledger = temp.ledger();
    let c = seed_catalog(&ledger).await;
    let order = place_order(
        &ledger,
        &c.north,
        date(1),
        vec![line(&c.tomato, dec!(2)), line(&c.tuna, dec!(1))],
    )
    .await;
    let purchasing = PurchasingService::new(ledger.clone());
    let orders = OrderService::new(ledger.clone());

    assert_eq!(reload(&orders, &order).await.status, OrderStatus::Pending);

    purchasing
        .submit_batch(submission(vec![batch_line(&c.tomato, dec!(2), dec!(20))]))
        .await
        .unwrap();
    assert_eq!(reload(&orders, &order).await.status, OrderStatus::Purchasing);

    purchasing
        .submit_batch(submission(vec![batch_line(&c.tuna, dec!(1), dec!(50))]))
        .await
        .unwrap();
    assert_eq!(reload(&orders, &order).await.status, OrderStatus::Delivered);

    // Delivered orders leave the consolidation pool.
    let demand = ConsolidationService::new(ledger).by_product().await.unwrap();
    assert!(demand.is_empty());
}

#[tokio::test]
async fn one_batch_allocates_several_products() {
    let temp = TempLedger::new();
    let ledger = temp.ledger();
    let c = seed_catalog(&ledger).await;
    place_order(
        &ledger,
        &c.north,
        date(1),
        vec![line(&c.tomato, dec!(4)), line(&c.onion, dec!(2))],
    )
    .await;
    place_order(&ledger, &c.south, date(1), vec![line(&c.onion, dec!(2))]).await;

    let receipt = PurchasingService::new(ledger)
        .submit_batch(submission(vec![
            batch_line(&c.tomato, dec!(4), dec!(40)),
            batch_line(&c.onion, dec!(4), dec!(20)),
        ]))
        .await
        .unwrap();

    assert_eq!(receipt.lines.len(), 2);
    assert_eq!(receipt.allocated_items(), 3);
    assert_eq!(receipt.status_changes.len(), 2);
    assert!(receipt
        .status_changes
        .iter()
        .all(|change| change.to == OrderStatus::Delivered));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_batches_never_allocate_an_item_twice() {
    let temp = TempLedger::new();
    let ledger = temp.ledger();
    let c = seed_catalog(&ledger).await;
    let order = place_order(&ledger, &c.north, date(1), vec![line(&c.tomato, dec!(10))]).await;

    let first = PurchasingService::new(ledger.clone());
    let second = PurchasingService::new(ledger.clone());
    let tomato_a = batch_line(&c.tomato, dec!(10), dec!(100));
    let tomato_b = batch_line(&c.tomato, dec!(10), dec!(120));

    let a = tokio::spawn(async move { first.submit_batch(submission(vec![tomato_a])).await });
    let b = tokio::spawn(async move { second.submit_batch(submission(vec![tomato_b])).await });
    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();

    // Both purchases are recorded; exactly one of them fulfils the order.
    let allocated = a.allocated_items() + b.allocated_items();
    assert_eq!(allocated, 1);

    let stored = OrderService::new(ledger).get(&order.id).await.unwrap();
    assert_eq!(stored.items[0].fulfillment.quantity_fulfilled(), Some(dec!(10)));
    let cost = stored.items[0].fulfillment.allocated_cost().unwrap();
    assert!(cost == dec!(100) || cost == dec!(120), "unexpected cost {cost}");
}
