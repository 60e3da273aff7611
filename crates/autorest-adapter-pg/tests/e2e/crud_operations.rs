//! List, get, create, update and delete against a live database.

use super::common::*;
use serde_json::{Value, json};

fn ids(rows: &[Value]) -> Vec<i64> {
    rows.iter()
        .map(|r| r["customer_id"].as_i64().expect("customer_id should be an integer"))
        .collect()
}

pub async fn test_first_page(ctx: &TestContext) {
    println!("  test_first_page");

    let engine = ctx.engine();
    let page = engine
        .list(SALES, "customer", &list_request(&[("page", "1"), ("pageSize", "5")]))
        .await
        .unwrap();

    assert_eq!(page.data().len(), 5);
    assert_eq!(page.total_count(), 10);
    assert_eq!(page.total_pages(), 2);
    assert!(page.has_next());
    assert!(!page.has_previous());
    assert_eq!(ids(page.data()), vec![1, 2, 3, 4, 5]);
}

pub async fn test_second_page(ctx: &TestContext) {
    println!("  test_second_page");

    let engine = ctx.engine();
    let page = engine
        .list(SALES, "customer", &list_request(&[("page", "2"), ("page_size", "5")]))
        .await
        .unwrap();

    assert_eq!(ids(page.data()), vec![6, 7, 8, 9, 10]);
    assert!(!page.has_next());
    assert!(page.has_previous());

    let empty = engine
        .list(SALES, "customer", &list_request(&[("page", "9"), ("pageSize", "5")]))
        .await
        .unwrap();
    assert!(empty.data().is_empty());
    assert_eq!(empty.total_count(), 10);
}

pub async fn test_page_size_limits(ctx: &TestContext) {
    println!("  test_page_size_limits");

    let engine = ctx.engine();
    let page = engine
        .list(SALES, "customer", &list_request(&[("pageSize", "5000")]))
        .await
        .unwrap();
    assert_eq!(page.page_size(), 1000);
    assert_eq!(page.data().len(), 10);

    assert_validation(
        engine
            .list(SALES, "customer", &list_request(&[("page", "0")]))
            .await,
        "page 0",
    );
}

pub async fn test_filters_and_sort(ctx: &TestContext) {
    println!("  test_filters_and_sort");

    let engine = ctx.engine();
    let page = engine
        .list(
            SALES,
            "customer",
            &list_request(&[
                ("filter", "city:eq:Porto"),
                ("filter", "balance:gte:400"),
                ("sortColumn", "balance"),
                ("sortDescending", "true"),
            ]),
        )
        .await
        .unwrap();
    assert_eq!(ids(page.data()), vec![10, 7, 4]);
    assert_eq!(page.total_count(), 3);

    let page = engine
        .list(SALES, "customer", &list_request(&[("filter", "customer_id:in:[2,3,99]")]))
        .await
        .unwrap();
    assert_eq!(ids(page.data()), vec![2, 3]);

    let page = engine
        .list(SALES, "customer", &list_request(&[("filter", "email:like:C1@")]))
        .await
        .unwrap();
    assert_eq!(ids(page.data()), vec![1]);

    let page = engine
        .list(SALES, "customer", &list_request(&[("filter", "active:eq:true"), ("filter", "customer_id:lt:3")]))
        .await
        .unwrap();
    assert_eq!(ids(page.data()), vec![1, 2]);
}

pub async fn test_search(ctx: &TestContext) {
    println!("  test_search");

    let engine = ctx.engine();
    let page = engine
        .list(SALES, "customer", &list_request(&[("search", "customer 0")]))
        .await
        .unwrap();
    assert_eq!(page.total_count(), 9);

    let page = engine
        .list(SALES, "customer", &list_request(&[("search", "LISBON"), ("pageSize", "2")]))
        .await
        .unwrap();
    assert_eq!(page.total_count(), 3);
    assert_eq!(page.data().len(), 2);
}

pub async fn test_get_by_id(ctx: &TestContext) {
    println!("  test_get_by_id");

    let engine = ctx.engine();
    let row = engine.get(SALES, "customer", "3").await.unwrap();
    assert_eq!(row["name"], "Customer 03");
    assert_eq!(row["balance"].as_f64(), Some(300.0));

    assert_not_found(engine.get(SALES, "customer", "999").await, "missing row");
    assert_validation(engine.get(SALES, "customer", "abc").await, "non-integer id");
}

pub async fn test_create_update_delete(ctx: &TestContext) {
    println!("  test_create_update_delete");

    let engine = ctx.engine();
    let created = engine
        .create(SALES, "customer", json!({"name": "Newcomer", "city": "Braga"}))
        .await
        .unwrap();
    let id = created["customer_id"].as_i64().unwrap();
    assert!(id > 10);
    assert_eq!(created["active"], true);
    assert_eq!(created["balance"].as_f64(), Some(0.0));
    assert!(created["created_at"].is_string());

    let updated = engine
        .update(
            SALES,
            "customer",
            &id.to_string(),
            json!({"city": null, "balance": 12.5}),
        )
        .await
        .unwrap();
    assert_eq!(updated["city"], Value::Null);
    assert_eq!(updated["balance"].as_f64(), Some(12.5));
    assert_eq!(updated["name"], "Newcomer");

    let deleted = engine
        .delete(SALES, "customer", &id.to_string())
        .await
        .unwrap();
    assert_eq!(deleted, json!(id));
    assert_not_found(
        engine.delete(SALES, "customer", &id.to_string()).await,
        "second delete",
    );
}

pub async fn test_update_missing_row(ctx: &TestContext) {
    println!("  test_update_missing_row");

    let engine = ctx.engine();
    assert_not_found(
        engine
            .update(SALES, "customer", "999", json!({"name": "Nobody"}))
            .await,
        "update of missing row",
    );
    assert_validation(
        engine.update(SALES, "customer", "1", json!({})).await,
        "empty update payload",
    );
}

pub async fn test_uuid_and_json_columns(ctx: &TestContext) {
    println!("  test_uuid_and_json_columns");

    let engine = ctx.engine();
    let created = engine
        .create(SALES, "event", json!({"payload": {"kind": "signup", "step": 1}}))
        .await
        .unwrap();
    let id = created["id"].as_str().expect("uuid id").to_string();
    assert_eq!(created["payload"]["kind"], "signup");

    let fetched = engine.get(SALES, "event", &id).await.unwrap();
    assert_eq!(fetched["payload"]["step"], 1);

    let defaults = engine.create(SALES, "event", json!({})).await.unwrap();
    assert!(defaults["id"].is_string());
    assert_eq!(defaults["payload"], Value::Null);
}

pub async fn test_enum_inet_and_array_columns(ctx: &TestContext) {
    println!("  test_enum_inet_and_array_columns");

    let engine = ctx.engine();
    let created = engine
        .create(
            SALES,
            "account",
            json!({"tier": "silver", "ip": "10.0.0.7", "tags": ["vip", "eu west"]}),
        )
        .await
        .unwrap();
    assert_eq!(created["tier"], "silver");
    assert_eq!(created["ip"], "10.0.0.7");
    assert_eq!(created["tags"], json!(["vip", "eu west"]));
    let id = created["id"].as_i64().expect("serial id").to_string();

    let updated = engine
        .update(SALES, "account", &id, json!({"tier": "gold", "ip": null, "tags": []}))
        .await
        .unwrap();
    assert_eq!(updated["tier"], "gold");
    assert_eq!(updated["ip"], Value::Null);
    assert_eq!(updated["tags"], json!([]));

    let page = engine
        .list(SALES, "account", &list_request(&[("filter", "tier:eq:gold")]))
        .await
        .unwrap();
    assert_eq!(page.total_count(), 1);

    assert_validation(
        engine.create(SALES, "account", json!({"tier": "platinum"})).await,
        "value outside the enum",
    );
}

pub async fn run_all_tests(ctx: &TestContext) {
    println!("\nCRUD operation tests");
    test_first_page(ctx).await;
    test_second_page(ctx).await;
    test_page_size_limits(ctx).await;
    test_filters_and_sort(ctx).await;
    test_search(ctx).await;
    test_get_by_id(ctx).await;
    test_create_update_delete(ctx).await;
    test_update_missing_row(ctx).await;
    test_uuid_and_json_columns(ctx).await;
    test_enum_inet_and_array_columns(ctx).await;
}
