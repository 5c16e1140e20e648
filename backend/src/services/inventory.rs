//! Inventory ledger: running balance of today's purchased stock

use chrono::Utc;
use rust_decimal::Decimal;
use shared::{stock_key, Availability, StockRecord, Unit, WAREHOUSE_PRODUCTS};
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::store::{Collection, DocumentStore};

/// Inventory service over the `inventory` collection
#[derive(Clone)]
pub struct InventoryService {
    store: DocumentStore,
    /// Products whose source the operator picks by hand
    warehouse_products: Arc<[String]>,
}

fn require_positive(quantity: Decimal) -> AppResult<()> {
    if quantity <= Decimal::ZERO {
        return Err(AppError::Validation {
            field: "quantity".to_string(),
            message: "Quantity must be positive".to_string(),
        });
    }
    Ok(())
}

impl InventoryService {
    pub fn new(store: DocumentStore) -> Self {
        Self::with_warehouse_products(store, WAREHOUSE_PRODUCTS.iter().copied())
    }

    pub fn with_warehouse_products<I, S>(store: DocumentStore, products: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            store,
            warehouse_products: products.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_warehouse_product(&self, product_name: &str) -> bool {
        self.warehouse_products.iter().any(|p| p == product_name)
    }

    async fn load_stock(&self, product_name: &str, unit: Unit) -> AppResult<StockRecord> {
        let key = stock_key(product_name, unit);
        let record: Option<StockRecord> =
            self.store.get_record(Collection::Inventory, &key).await?;
        Ok(record.unwrap_or_else(|| StockRecord::empty(product_name, unit)))
    }

    /// Current balance; zero-valued when unseen or unreadable
    pub async fn get_stock(&self, product_name: &str, unit: Unit) -> StockRecord {
        match self.load_stock(product_name, unit).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!("Error reading stock {}: {}", stock_key(product_name, unit), e);
                StockRecord::empty(product_name, unit)
            }
        }
    }

    /// Increase the balance, returning the new quantity
    pub async fn add_stock(
        &self,
        product_name: &str,
        quantity: Decimal,
        unit: Unit,
    ) -> AppResult<Decimal> {
        require_positive(quantity)?;
        let key = stock_key(product_name, unit);
        let _guard = self.store.lock(Collection::Inventory, &key).await;

        let mut record = self.load_stock(product_name, unit).await?;
        record.key = key;
        let balance = record.credit(quantity, Utc::now());

        self.store.put_record(Collection::Inventory, &record).await?;
        self.store
            .log_action("add_stock", format!("{} +{} {}", product_name, quantity, unit))
            .await;

        Ok(balance)
    }

    /// Decrease the balance, clamping at zero
    pub async fn remove_stock(
        &self,
        product_name: &str,
        quantity: Decimal,
        unit: Unit,
    ) -> AppResult<Decimal> {
        require_positive(quantity)?;
        let key = stock_key(product_name, unit);
        let _guard = self.store.lock(Collection::Inventory, &key).await;

        let mut record = self.load_stock(product_name, unit).await?;
        record.key = key;
        let balance = record.debit(quantity, Utc::now());

        self.store.put_record(Collection::Inventory, &record).await?;
        self.store
            .log_action("remove_stock", format!("{} -{} {}", product_name, quantity, unit))
            .await;

        Ok(balance)
    }

    /// Whether `quantity` can be unloaded from today's purchases.
    ///
    /// Warehouse products always pass with a zero stock figure.
    pub async fn check_availability(
        &self,
        product_name: &str,
        quantity: Decimal,
        unit: Unit,
    ) -> Availability {
        if self.is_warehouse_product(product_name) {
            return Availability::untracked(quantity);
        }

        match self.load_stock(product_name, unit).await {
            Ok(record) => Availability::evaluate(record.quantity, quantity),
            Err(e) => {
                tracing::error!("Error checking availability of {}: {}", product_name, e);
                Availability::unknown(quantity)
            }
        }
    }

    /// Every stock record. Never fails.
    pub async fn get_all_stock(&self) -> Vec<StockRecord> {
        match self.store.get_all_records(Collection::Inventory).await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!("Error getting all stock: {}", e);
                Vec::new()
            }
        }
    }

    /// End-of-day reset of the whole ledger
    pub async fn clear_daily_stock(&self) -> AppResult<()> {
        self.store.clear(Collection::Inventory).await?;
        self.store
            .log_action("clear_inventory", "Daily inventory cleared")
            .await;
        tracing::info!("Daily inventory cleared");
        Ok(())
    }
}
