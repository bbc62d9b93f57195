use super::product::ProductRepository;
use crate::db::{Database, Session};
use crate::error::{AppError, InsufficientStockError};
use crate::models::{
    Order, OrderCreate, OrderField, OrderItem, OrderItemUpdate, OrderResponse, OrderStatus, OrderUpdate,
};
use crate::service::{CrudService, ListQuery};
use crate::sql::Values;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// What `update_order` does to product stock when it changes item quantities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ItemStockPolicy {
    /// Item quantities change without touching stock.
    #[default]
    Untracked,
    /// Stock moves by the quantity delta, checked like order creation.
    Reserve,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown item stock policy '{0}', expected 'untracked' or 'reserve'")]
pub struct UnknownPolicy(pub String);

impl FromStr for ItemStockPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "untracked" => Ok(ItemStockPolicy::Untracked),
            "reserve" => Ok(ItemStockPolicy::Reserve),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FulfillmentPolicy {
    /// Lock product rows between the stock check and the stock write.
    pub lock_stock_rows: bool,
    pub item_updates: ItemStockPolicy,
}

impl Default for FulfillmentPolicy {
    fn default() -> Self {
        FulfillmentPolicy {
            lock_stock_rows: true,
            item_updates: ItemStockPolicy::Untracked,
        }
    }
}

/// Stock level of the product after each line, checking every line against
/// what earlier lines already took. Fails on the first line that does not fit.
pub fn plan_stock(
    stock: &HashMap<i64, i32>,
    lines: &[(i64, i32)],
) -> Result<Vec<i32>, InsufficientStockError> {
    let mut balance = stock.clone();
    let mut after = Vec::with_capacity(lines.len());
    for &(product_id, quantity) in lines {
        let available = balance.get(&product_id).copied().unwrap_or(0);
        if available < quantity {
            return Err(InsufficientStockError {
                product_id,
                available_stock: available,
                requested_quantity: quantity,
            });
        }
        let remaining = available - quantity;
        balance.insert(product_id, remaining);
        after.push(remaining);
    }
    Ok(after)
}

/// Order workflows. Each public operation runs in one session and commits once.
#[derive(Clone, Debug)]
pub struct OrderRepository {
    crud: CrudService,
    products: ProductRepository,
    policy: FulfillmentPolicy,
}

impl OrderRepository {
    pub fn new(db: Database, policy: FulfillmentPolicy) -> Self {
        OrderRepository {
            products: ProductRepository::new(db.clone()),
            crud: CrudService::new(db),
            policy,
        }
    }

    pub fn policy(&self) -> FulfillmentPolicy {
        self.policy
    }

    /// Check stock for every line, then write the order, its items and the new stock levels.
    pub async fn create_order(&self, order: OrderCreate) -> Result<OrderResponse, AppError> {
        let mut session = self.crud.db().session();

        let mut product_ids: Vec<i64> = order.items.iter().map(|item| item.product_id).collect();
        product_ids.sort_unstable();
        product_ids.dedup();
        let stock = self.stock_snapshot(&product_ids, &mut session).await?;
        let lines: Vec<(i64, i32)> = order
            .items
            .iter()
            .map(|item| (item.product_id, item.quantity))
            .collect();
        let stock_after = plan_stock(&stock, &lines)?;

        let header: Order = self
            .crud
            .create(Values::new().set(Order::STATUS, order.status), Some(&mut session), false)
            .await?;
        for (item, new_stock) in order.items.iter().zip(stock_after) {
            let values = Values::new()
                .set(OrderItem::ORDER_ID, header.id)
                .set(OrderItem::PRODUCT_ID, item.product_id)
                .set(OrderItem::QUANTITY, item.quantity);
            self.crud
                .create::<OrderItem>(values, Some(&mut session), false)
                .await?;
            self.products
                .update_stock_quantity(item.product_id, new_stock, Some(&mut session))
                .await?;
        }

        let created = self
            .load_order(header.id, &mut session)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))?;
        session.commit().await?;
        tracing::info!(order_id = created.id, items = created.items.len(), "created order");
        Ok(OrderResponse::from_order(&created))
    }

    pub async fn read_order(&self, order_id: i64) -> Result<Option<OrderResponse>, AppError> {
        let mut session = self.crud.db().session();
        let order = self.load_order(order_id, &mut session).await?;
        Ok(order.as_ref().map(OrderResponse::from_order))
    }

    /// Ascending by `order_by`, ties broken by id.
    pub async fn list_orders(
        &self,
        limit: u64,
        offset: u64,
        order_by: OrderField,
    ) -> Result<Vec<OrderResponse>, AppError> {
        let query = ListQuery::new()
            .order_by(order_by.column().asc())
            .order_by(Order::ID.asc())
            .limit(limit)
            .offset(offset)
            .eager(Order::items());
        let orders = self.crud.list::<Order>(query, None).await?;
        Ok(orders.iter().map(OrderResponse::from_order).collect())
    }

    /// Upsert the payload's items by product. The payload status is not applied.
    /// `None` when the order does not exist or the payload carries no items.
    pub async fn update_order(
        &self,
        order_id: i64,
        update: OrderUpdate,
    ) -> Result<Option<OrderResponse>, AppError> {
        let mut session = self.crud.db().session();
        let current: Option<Order> = self
            .crud
            .get(ListQuery::new().filter(Order::ID.eq(order_id)), Some(&mut session))
            .await?;
        let items = match (current, update.items) {
            (Some(_), Some(items)) if !items.is_empty() => items,
            _ => return Ok(None),
        };

        for item in &items {
            self.upsert_item(order_id, item, &mut session).await?;
        }

        let updated = self.load_order(order_id, &mut session).await?;
        session.commit().await?;
        tracing::info!(order_id, items = items.len(), "updated order items");
        Ok(updated.as_ref().map(OrderResponse::from_order))
    }

    /// Overwrite the status. Any transition is accepted.
    pub async fn update_order_status(
        &self,
        order_id: i64,
        new_status: OrderStatus,
    ) -> Result<Option<OrderResponse>, AppError> {
        let mut session = self.crud.db().session();
        let updated: Option<Order> = self
            .crud
            .update(
                Order::ID.eq(order_id),
                Values::new().set(Order::STATUS, new_status),
                Some(&mut session),
                false,
            )
            .await?;
        if updated.is_none() {
            return Ok(None);
        }
        let order = self.load_order(order_id, &mut session).await?;
        session.commit().await?;
        tracing::info!(order_id, status = %new_status, "updated order status");
        Ok(order.as_ref().map(OrderResponse::from_order))
    }

    /// Delete the order's items, then the order. Returns the order as it was.
    pub async fn delete_order(&self, order_id: i64) -> Result<Option<OrderResponse>, AppError> {
        let mut session = self.crud.db().session();
        let Some(order) = self.load_order(order_id, &mut session).await? else {
            return Ok(None);
        };
        self.crud
            .delete::<OrderItem>(OrderItem::ORDER_ID.eq(order_id), Some(&mut session), false)
            .await?;
        self.crud
            .delete::<Order>(Order::ID.eq(order_id), Some(&mut session), false)
            .await?;
        session.commit().await?;
        tracing::info!(order_id, "deleted order");
        Ok(Some(OrderResponse::from_order(&order)))
    }

    async fn load_order(&self, order_id: i64, session: &mut Session) -> Result<Option<Order>, AppError> {
        let query = ListQuery::new()
            .filter(Order::ID.eq(order_id))
            .eager(Order::items());
        self.crud.get(query, Some(session)).await
    }

    async fn stock_snapshot(
        &self,
        product_ids: &[i64],
        session: &mut Session,
    ) -> Result<HashMap<i64, i32>, AppError> {
        if self.policy.lock_stock_rows {
            self.products.check_stock_for_update(product_ids, session).await
        } else {
            self.products.check_stock(product_ids, Some(session)).await
        }
    }

    async fn upsert_item(
        &self,
        order_id: i64,
        item: &OrderItemUpdate,
        session: &mut Session,
    ) -> Result<(), AppError> {
        let line = OrderItem::ORDER_ID
            .eq(order_id)
            .and(OrderItem::PRODUCT_ID.eq(item.product_id));
        let existing: Option<OrderItem> = self
            .crud
            .get(ListQuery::new().filter(line.clone()), Some(&mut *session))
            .await?;

        if self.policy.item_updates == ItemStockPolicy::Reserve {
            let delta = item.quantity - existing.as_ref().map_or(0, |e| e.quantity);
            self.reserve_stock(item.product_id, delta, &mut *session).await?;
        }

        match existing {
            Some(_) => {
                self.crud
                    .update::<OrderItem>(
                        line,
                        Values::new().set(OrderItem::QUANTITY, item.quantity),
                        Some(session),
                        false,
                    )
                    .await?;
            }
            None => {
                let values = Values::new()
                    .set(OrderItem::ORDER_ID, order_id)
                    .set(OrderItem::PRODUCT_ID, item.product_id)
                    .set(OrderItem::QUANTITY, item.quantity);
                self.crud
                    .create::<OrderItem>(values, Some(session), false)
                    .await?;
            }
        }
        Ok(())
    }

    /// Take `delta` units of stock (or give them back when negative).
    async fn reserve_stock(&self, product_id: i64, delta: i32, session: &mut Session) -> Result<(), AppError> {
        if delta == 0 {
            return Ok(());
        }
        let stock = self.stock_snapshot(&[product_id], &mut *session).await?;
        let available = stock.get(&product_id).copied().unwrap_or(0);
        if delta > available {
            return Err(InsufficientStockError {
                product_id,
                available_stock: available,
                requested_quantity: delta,
            }
            .into());
        }
        self.products
            .update_stock_quantity(product_id, available - delta, Some(session))
            .await
    }
}
