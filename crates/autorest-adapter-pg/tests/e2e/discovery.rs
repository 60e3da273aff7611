//! Catalog discovery and access policy against a live database.

use super::common::*;

pub async fn test_exposed_tables(ctx: &TestContext) {
    println!("  test_exposed_tables");

    let engine = ctx.engine();
    let tables: Vec<String> = engine
        .exposed_tables()
        .await
        .expect("discovery should succeed")
        .entries()
        .map(|e| e.to_string())
        .collect();

    assert_eq!(
        tables,
        vec![
            "autorest_sales.account",
            "autorest_sales.customer",
            "autorest_sales.event"
        ],
        "system-prefixed, excluded and hidden-schema tables must not be listed"
    );
}

pub async fn test_hidden_tables_are_not_found(ctx: &TestContext) {
    println!("  test_hidden_tables_are_not_found");

    let engine = ctx.engine();
    assert_not_found(engine.get(HIDDEN, "secret", "1").await, "excluded schema");
    assert_not_found(engine.get(SALES, "audit_log", "1").await, "excluded table");
    assert_not_found(
        engine.list(SALES, "_sqlx_internal", &list_request(&[])).await,
        "system table prefix",
    );
    assert_not_found(
        engine.list("pg_catalog", "pg_class", &list_request(&[])).await,
        "system schema",
    );
    assert_not_found(
        engine.list(SALES, "missing", &list_request(&[])).await,
        "unknown table",
    );
}

pub async fn test_describe_table(ctx: &TestContext) {
    println!("  test_describe_table");

    let engine = ctx.engine();
    let desc = engine
        .validate_table(SALES, "customer")
        .await
        .expect("customer should be exposed");

    assert_eq!(desc.primary_key(), ["customer_id".to_string()]);
    let names: Vec<&str> = desc.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["customer_id", "name", "email", "city", "balance", "active", "created_at"]
    );
    let city = desc.column("city").unwrap();
    assert_eq!(city.data_type, "character varying");
    assert!(city.nullable);
    assert!(desc.column("customer_id").unwrap().default.is_some());

    let account = engine.validate_table(SALES, "account").await.unwrap();
    let tier = account.column("tier").unwrap();
    assert_eq!(tier.data_type, "USER-DEFINED");
    assert_eq!(
        tier.udt,
        Some((SALES.to_string(), "tier".to_string()))
    );
    let tags = account.column("tags").unwrap();
    assert_eq!(tags.data_type, "ARRAY");
    assert_eq!(tags.udt.as_ref().map(|(_, name)| name.as_str()), Some("_text"));
}

pub async fn test_refresh_picks_up_new_table(ctx: &TestContext) {
    println!("  test_refresh_picks_up_new_table");

    let engine = ctx.engine();
    engine.exposed_tables().await.unwrap();

    sqlx::raw_sql("CREATE TABLE autorest_sales.invoice (id serial PRIMARY KEY, total numeric)")
        .execute(&ctx.pool)
        .await
        .unwrap();

    assert_not_found(
        engine.list(SALES, "invoice", &list_request(&[])).await,
        "table created after discovery",
    );

    let refreshed = engine.refresh_catalog().await.unwrap();
    assert!(refreshed.contains(SALES, "invoice"));
    let page = engine
        .list(SALES, "invoice", &list_request(&[]))
        .await
        .unwrap();
    assert_eq!(page.total_count(), 0);

    sqlx::raw_sql("DROP TABLE autorest_sales.invoice")
        .execute(&ctx.pool)
        .await
        .unwrap();
}

pub async fn run_all_tests(ctx: &TestContext) {
    println!("\nDiscovery tests");
    test_exposed_tables(ctx).await;
    test_hidden_tables_are_not_found(ctx).await;
    test_describe_table(ctx).await;
    test_refresh_picks_up_new_table(ctx).await;
}
