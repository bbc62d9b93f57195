#[macro_use]
mod common;

use storefront::models::{
    OrderCreate, OrderItem, OrderItemCreate, OrderStatus, Product, ProductField, ProductUpdate,
};
use storefront::service::{CrudService, ListQuery};
use storefront::sql::{Condition, Join, Values};
use storefront::AppError;

#[tokio::test]
async fn product_lifecycle() {
    let t = require_db!();
    let products = t.products();
    let widget = t.product("Widget", 9.99, 5).await;
    assert!(widget.id > 0);

    let read = products.read_product(widget.id).await.unwrap();
    assert_eq!(read.as_ref(), Some(&widget));

    let updated = products
        .update_product(
            widget.id,
            ProductUpdate {
                price: Some(12.5),
                description: Some(Some("blue".into())),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "Widget");
    assert_eq!(updated.price, 12.5);
    assert_eq!(updated.description.as_deref(), Some("blue"));
    assert_eq!(updated.stock_quantity, 5);

    let cleared = products
        .update_product(
            widget.id,
            ProductUpdate {
                description: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cleared.description, None);

    let unchanged = products
        .update_product(widget.id, ProductUpdate::default())
        .await
        .unwrap();
    assert_eq!(unchanged, Some(cleared.clone()));

    let deleted = products.delete_product(widget.id).await.unwrap();
    assert_eq!(deleted, Some(cleared));
    assert!(products.read_product(widget.id).await.unwrap().is_none());
    assert!(products.delete_product(widget.id).await.unwrap().is_none());
    assert!(products
        .update_product(widget.id, ProductUpdate::default())
        .await
        .unwrap()
        .is_none());

    t.teardown().await;
}

#[tokio::test]
async fn list_products_orders_by_field() {
    let t = require_db!();
    let products = t.products();
    t.product("Cog", 3.0, 1).await;
    t.product("Anvil", 50.0, 1).await;
    t.product("Bolt", 0.5, 1).await;

    let by_name: Vec<String> = products
        .list_products(50, 0, ProductField::Name)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(by_name, ["Anvil", "Bolt", "Cog"]);

    let by_price: Vec<String> = products
        .list_products(2, 0, ProductField::Price)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(by_price, ["Bolt", "Cog"]);

    let tail = products.list_products(50, 2, ProductField::Name).await.unwrap();
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].name, "Cog");

    t.teardown().await;
}

#[tokio::test]
async fn check_stock_returns_only_existing_products() {
    let t = require_db!();
    let products = t.products();
    let a = t.product("A", 1.0, 4).await;
    let b = t.product("B", 1.0, 0).await;

    let stock = products.check_stock(&[a.id, b.id, 424_242], None).await.unwrap();
    assert_eq!(stock.len(), 2);
    assert_eq!(stock[&a.id], 4);
    assert_eq!(stock[&b.id], 0);
    assert!(!stock.contains_key(&424_242));

    assert!(products.check_stock(&[], None).await.unwrap().is_empty());

    products.update_stock_quantity(a.id, 11, None).await.unwrap();
    assert_eq!(t.stock_of(a.id).await, 11);

    t.teardown().await;
}

#[tokio::test]
async fn supplied_session_is_committed_by_its_owner() {
    let t = require_db!();
    let products = t.products();
    let a = t.product("A", 1.0, 4).await;

    let mut session = t.db.session();
    products.update_stock_quantity(a.id, 1, Some(&mut session)).await.unwrap();
    let seen = products.check_stock(&[a.id], Some(&mut session)).await.unwrap();
    assert_eq!(seen[&a.id], 1);
    assert_eq!(t.stock_of(a.id).await, 4);
    drop(session);
    assert_eq!(t.stock_of(a.id).await, 4);

    let mut session = t.db.session();
    products.update_stock_quantity(a.id, 2, Some(&mut session)).await.unwrap();
    session.commit().await.unwrap();
    assert_eq!(t.stock_of(a.id).await, 2);

    t.teardown().await;
}

#[tokio::test]
async fn deleting_ordered_product_is_a_conflict() {
    let t = require_db!();
    let widget = t.product("Widget", 1.0, 3).await;
    t.orders()
        .create_order(OrderCreate {
            status: OrderStatus::InProgress,
            items: vec![OrderItemCreate {
                product_id: widget.id,
                quantity: 1,
            }],
        })
        .await
        .unwrap();

    let err = t.products().delete_product(widget.id).await.unwrap_err();
    assert_eq!(err.status_and_code().1, "conflict");
    assert!(t.products().read_product(widget.id).await.unwrap().is_some());

    t.teardown().await;
}

#[tokio::test]
async fn engine_filters_joins_and_updates_many() {
    let t = require_db!();
    let crud = CrudService::new(t.db.clone());
    let cheap = t.product("Cheap", 1.0, 10).await;
    let dear = t.product("Dear", 100.0, 10).await;
    t.product("Unordered", 2.0, 10).await;

    let order = t
        .orders()
        .create_order(OrderCreate {
            status: OrderStatus::InProgress,
            items: vec![
                OrderItemCreate {
                    product_id: cheap.id,
                    quantity: 1,
                },
                OrderItemCreate {
                    product_id: dear.id,
                    quantity: 1,
                },
                OrderItemCreate {
                    product_id: cheap.id,
                    quantity: 2,
                },
            ],
        })
        .await
        .unwrap();

    // Joined rows repeat a product once per item; the engine keeps the first.
    let ordered: Vec<Product> = crud
        .list(
            ListQuery::new()
                .join(Join::inner(Product::ID, OrderItem::PRODUCT_ID))
                .filter(OrderItem::ORDER_ID.eq(order.id))
                .order_by(Product::ID.asc()),
            None,
        )
        .await
        .unwrap();
    let ids: Vec<i64> = ordered.iter().map(|p| p.id).collect();
    assert_eq!(ids, [cheap.id, dear.id]);

    let cheap_only: Vec<Product> = crud
        .list(
            ListQuery::new()
                .filter(None::<Condition>)
                .filter(Product::PRICE.lt(50.0))
                .filter(Product::NAME.ne("Unordered")),
            None,
        )
        .await
        .unwrap();
    assert_eq!(cheap_only.len(), 1);
    assert_eq!(cheap_only[0].id, cheap.id);

    let restocked: Vec<Product> = crud
        .update_many(
            Product::STOCK_QUANTITY.ge(0),
            Values::new().set(Product::STOCK_QUANTITY, 99),
            None,
            true,
        )
        .await
        .unwrap();
    assert_eq!(restocked.len(), 3);
    assert!(restocked.iter().all(|p| p.stock_quantity == 99));

    let missing: Option<Product> = crud
        .update(Product::ID.eq(-1_i64), Values::new().set(Product::PRICE, 5.0), None, true)
        .await
        .unwrap();
    assert!(missing.is_none());

    let result: Result<Product, AppError> = crud
        .create(
            Values::new()
                .set(Product::NAME, "Free")
                .set(Product::PRICE, 0.0)
                .set(Product::STOCK_QUANTITY, 1),
            None,
            true,
        )
        .await;
    assert!(matches!(result, Err(AppError::Db(_))));

    t.teardown().await;
}
