//! Inventory ledger tests
//!
//! Tests for the daily stock ledger including:
//! - Balances never go negative
//! - Warehouse products bypass the availability check
//! - Shortage reporting
//! - End-of-day clearing

mod common;

use common::*;
use delivery_tracker::services::InventoryService;
use delivery_tracker::store::Collection;
use delivery_tracker::AppError;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{Unit, WAREHOUSE_PRODUCTS};

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_remove_clamps_at_zero() {
        let (_, store) = memory_store().await;
        let inventory = InventoryService::new(store);

        let balance = inventory.add_stock("Помідори", dec("10"), Unit::Kg).await.unwrap();
        assert_eq!(balance, dec("10"));

        let balance = inventory.remove_stock("Помідори", dec("15"), Unit::Kg).await.unwrap();
        assert_eq!(balance, Decimal::ZERO);

        let record = inventory.get_stock("Помідори", Unit::Kg).await;
        assert_eq!(record.quantity, Decimal::ZERO);
        assert_eq!(record.key, "Помідори_kg");
        assert!(record.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_units_are_tracked_separately() {
        let (_, store) = memory_store().await;
        let inventory = InventoryService::new(store);

        inventory.add_stock("Огірки", dec("3"), Unit::Kg).await.unwrap();
        inventory.add_stock("Огірки", dec("2"), Unit::Piece).await.unwrap();
        inventory.add_stock("Огірки", dec("1.5"), Unit::Kg).await.unwrap();

        assert_eq!(inventory.get_stock("Огірки", Unit::Kg).await.quantity, dec("4.5"));
        assert_eq!(inventory.get_stock("Огірки", Unit::Piece).await.quantity, dec("2"));
        assert_eq!(inventory.get_all_stock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_unseen_product_reads_as_zero() {
        let (_, store) = memory_store().await;
        let inventory = InventoryService::new(store.clone());

        let record = inventory.get_stock("Кріп", Unit::Bunch).await;
        assert_eq!(record.quantity, Decimal::ZERO);
        assert!(record.last_updated.is_none());
        assert!(store.get_all(Collection::Inventory).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_positive_quantities_rejected() {
        let (_, store) = memory_store().await;
        let inventory = InventoryService::new(store);

        for quantity in ["0", "-1"] {
            let err = inventory.add_stock("Мак", dec(quantity), Unit::Kg).await.unwrap_err();
            assert!(matches!(err, AppError::Validation { ref field, .. } if field == "quantity"));
            let err = inventory.remove_stock("Мак", dec(quantity), Unit::Kg).await.unwrap_err();
            assert!(matches!(err, AppError::Validation { .. }));
        }
        assert!(inventory.get_all_stock().await.is_empty());
    }

    #[tokio::test]
    async fn test_shortage_reported() {
        let (_, store) = memory_store().await;
        let inventory = InventoryService::new(store);
        inventory.add_stock("Цибуля", dec("4"), Unit::Kg).await.unwrap();

        let check = inventory.check_availability("Цибуля", dec("6.5"), Unit::Kg).await;
        assert!(!check.available);
        assert_eq!(check.stock, dec("4"));
        assert_eq!(check.requested, dec("6.5"));
        assert_eq!(check.shortage, dec("2.5"));

        let check = inventory.check_availability("Цибуля", dec("4"), Unit::Kg).await;
        assert!(check.available);
        assert_eq!(check.shortage, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_custom_warehouse_list() {
        let (_, store) = memory_store().await;
        let inventory = InventoryService::with_warehouse_products(store, ["Буряк"]);

        assert!(inventory.is_warehouse_product("Буряк"));
        assert!(!inventory.is_warehouse_product("Картопля"));
        assert!(inventory.check_availability("Буряк", dec("100"), Unit::Kg).await.available);
        assert!(!inventory.check_availability("Картопля", dec("1"), Unit::Kg).await.available);
    }

    #[tokio::test]
    async fn test_clear_daily_stock() {
        let (_, store) = memory_store().await;
        let inventory = InventoryService::new(store.clone());
        inventory.add_stock("Мед", dec("2"), Unit::Box).await.unwrap();
        inventory.add_stock("Яйця", dec("30"), Unit::Piece).await.unwrap();

        inventory.clear_daily_stock().await.unwrap();

        assert!(inventory.get_all_stock().await.is_empty());
        let latest = store.audit_entries(1).await.unwrap();
        assert_eq!(latest[0].action, "clear_inventory");
    }

    #[tokio::test]
    async fn test_failed_store_reports_unknown_availability() {
        let store = failed_store().await;
        let inventory = InventoryService::new(store);

        let check = inventory.check_availability("Цибуля", dec("1"), Unit::Kg).await;
        assert!(!check.available);
        assert_eq!(check.shortage, dec("1"));
        assert_eq!(inventory.get_stock("Цибуля", Unit::Kg).await.quantity, Decimal::ZERO);
        assert!(matches!(
            inventory.add_stock("Цибуля", dec("1"), Unit::Kg).await,
            Err(AppError::StoreUnavailable)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_credits_all_land() {
        let store = sqlite_store().await;
        let inventory = InventoryService::new(store);

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let inventory = inventory.clone();
                tokio::spawn(async move { inventory.add_stock("Сир", dec("0.5"), Unit::Kg).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(inventory.get_stock("Сир", Unit::Kg).await.quantity, dec("8"));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[derive(Debug, Clone)]
enum Movement {
    In(Decimal),
    Out(Decimal),
}

fn movement_strategy() -> impl Strategy<Value = Movement> {
    (any::<bool>(), 1i64..100_000i64).prop_map(|(credit, thousandths)| {
        let quantity = Decimal::new(thousandths, 3);
        if credit {
            Movement::In(quantity)
        } else {
            Movement::Out(quantity)
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// The balance after any sequence of movements equals the clamped
    /// running sum and never drops below zero
    #[test]
    fn prop_balance_never_negative(movements in prop::collection::vec(movement_strategy(), 1..20)) {
        let (balances, stored) = block_on(async {
            let (_, store) = memory_store().await;
            let inventory = InventoryService::new(store);
            let mut balances = Vec::new();
            for movement in &movements {
                let balance = match movement {
                    Movement::In(q) => inventory.add_stock("Морква", *q, Unit::Kg).await,
                    Movement::Out(q) => inventory.remove_stock("Морква", *q, Unit::Kg).await,
                };
                balances.push(balance.unwrap());
            }
            (balances, inventory.get_stock("Морква", Unit::Kg).await.quantity)
        });

        let mut expected = Decimal::ZERO;
        for (movement, balance) in movements.iter().zip(&balances) {
            expected = match movement {
                Movement::In(q) => expected + q,
                Movement::Out(q) => (expected - q).max(Decimal::ZERO),
            };
            prop_assert!(*balance >= Decimal::ZERO);
            prop_assert_eq!(*balance, expected);
        }
        prop_assert_eq!(stored, expected);
    }

    /// Warehouse products are always available, whatever the ledger says
    #[test]
    fn prop_warehouse_products_bypass_check(
        index in 0..WAREHOUSE_PRODUCTS.len(),
        thousandths in 1i64..10_000_000i64,
    ) {
        let product = WAREHOUSE_PRODUCTS[index];
        let requested = Decimal::new(thousandths, 3);
        let check = block_on(async {
            let (_, store) = memory_store().await;
            InventoryService::new(store)
                .check_availability(product, requested, Unit::Kg)
                .await
        });

        prop_assert!(check.available);
        prop_assert_eq!(check.stock, Decimal::ZERO);
        prop_assert_eq!(check.requested, requested);
        prop_assert_eq!(check.shortage, Decimal::ZERO);
    }
}
