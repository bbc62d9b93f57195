use crate::db::{Database, Session};
use crate::error::AppError;
use crate::models::{Product, ProductCreate, ProductField, ProductUpdate};
use crate::service::{CrudService, ListQuery};
use crate::sql::Values;
use std::collections::HashMap;

/// Product persistence and stock primitives.
///
/// Methods that accept `session: Option<&mut Session>` commit only when they
/// opened the session themselves; a supplied session is left for its owner
/// to commit.
#[derive(Clone, Debug)]
pub struct ProductRepository {
    crud: CrudService,
}

impl ProductRepository {
    pub fn new(db: Database) -> Self {
        ProductRepository {
            crud: CrudService::new(db),
        }
    }

    /// Current stock for each id that exists. Missing ids are absent from the map.
    pub async fn check_stock(
        &self,
        product_ids: &[i64],
        session: Option<&mut Session>,
    ) -> Result<HashMap<i64, i32>, AppError> {
        let query = ListQuery::new().filter(Product::ID.is_in(product_ids.iter().copied()));
        let products = self.crud.list::<Product>(query, session).await?;
        Ok(stock_map(&products))
    }

    /// Like [`check_stock`](Self::check_stock), but keeps the rows locked until
    /// `session` commits or rolls back.
    pub async fn check_stock_for_update(
        &self,
        product_ids: &[i64],
        session: &mut Session,
    ) -> Result<HashMap<i64, i32>, AppError> {
        let query = ListQuery::new()
            .filter(Product::ID.is_in(product_ids.iter().copied()))
            .order_by(Product::ID.asc())
            .for_update();
        let products = self.crud.list::<Product>(query, Some(session)).await?;
        Ok(stock_map(&products))
    }

    /// Overwrite the stock level. No bounds check: callers check availability first.
    pub async fn update_stock_quantity(
        &self,
        product_id: i64,
        new_stock_quantity: i32,
        session: Option<&mut Session>,
    ) -> Result<(), AppError> {
        let commit = session.is_none();
        self.crud
            .update::<Product>(
                Product::ID.eq(product_id),
                Values::new().set(Product::STOCK_QUANTITY, new_stock_quantity),
                session,
                commit,
            )
            .await?;
        Ok(())
    }

    pub async fn list_products(
        &self,
        limit: u64,
        offset: u64,
        order_by: ProductField,
    ) -> Result<Vec<Product>, AppError> {
        let query = ListQuery::new()
            .order_by(order_by.column().asc())
            .order_by(Product::ID.asc())
            .limit(limit)
            .offset(offset);
        self.crud.list(query, None).await
    }

    pub async fn create_product(&self, product: ProductCreate) -> Result<Product, AppError> {
        let values = Values::new()
            .set(Product::NAME, product.name)
            .set(Product::DESCRIPTION, product.description)
            .set(Product::PRICE, product.price)
            .set(Product::STOCK_QUANTITY, product.stock_quantity);
        let created: Product = self.crud.create(values, None, true).await?;
        tracing::info!(product_id = created.id, "created product");
        Ok(created)
    }

    pub async fn read_product(&self, product_id: i64) -> Result<Option<Product>, AppError> {
        self.crud
            .get(ListQuery::new().filter(Product::ID.eq(product_id)), None)
            .await
    }

    /// Apply the fields present in `update`. `None` when the product does not exist.
    pub async fn update_product(
        &self,
        product_id: i64,
        update: ProductUpdate,
    ) -> Result<Option<Product>, AppError> {
        let values = Values::new()
            .set_if(Product::NAME, update.name)
            .set_if(Product::DESCRIPTION, update.description)
            .set_if(Product::PRICE, update.price)
            .set_if(Product::STOCK_QUANTITY, update.stock_quantity);
        self.crud
            .update(Product::ID.eq(product_id), values, None, true)
            .await
    }

    /// Delete and return the product as it was. `None` when it does not exist.
    pub async fn delete_product(&self, product_id: i64) -> Result<Option<Product>, AppError> {
        let mut session = self.crud.db().session();
        let product: Option<Product> = self
            .crud
            .get(ListQuery::new().filter(Product::ID.eq(product_id)), Some(&mut session))
            .await?;
        if product.is_none() {
            return Ok(None);
        }
        self.crud
            .delete::<Product>(Product::ID.eq(product_id), Some(&mut session), true)
            .await?;
        tracing::info!(product_id, "deleted product");
        Ok(product)
    }
}

fn stock_map(products: &[Product]) -> HashMap<i64, i32> {
    products.iter().map(|p| (p.id, p.stock_quantity)).collect()
}
