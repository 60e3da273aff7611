//! Database errors mapped onto the engine taxonomy.

use super::common::*;
use serde_json::json;

pub async fn test_not_null_violation(ctx: &TestContext) {
    println!("  test_not_null_violation");

    let engine = ctx.engine();
    assert_validation(
        engine.create(SALES, "customer", json!({"city": "Faro"})).await,
        "missing required column",
    );
}

pub async fn test_unique_violation(ctx: &TestContext) {
    println!("  test_unique_violation");

    let engine = ctx.engine();
    let result = engine
        .create(
            SALES,
            "customer",
            json!({"name": "Copy", "email": "c1@example.com"}),
        )
        .await;
    match result {
        Err(autorest_core::EngineError::Validation(msg)) => {
            assert!(!msg.contains("c1@example.com"), "message leaked a value: {}", msg);
        }
        other => panic!("expected ValidationError, got {:?}", other),
    }
}

pub async fn test_bad_numeric_value(ctx: &TestContext) {
    println!("  test_bad_numeric_value");

    let engine = ctx.engine();
    assert_validation(
        engine
            .update(SALES, "customer", "1", json!({"balance": "lots"}))
            .await,
        "non-numeric balance",
    );
    assert_validation(
        engine
            .list(SALES, "customer", &list_request(&[("filter", "balance:gt:lots")]))
            .await,
        "non-numeric filter",
    );
}

pub async fn test_unknown_columns(ctx: &TestContext) {
    println!("  test_unknown_columns");

    let engine = ctx.engine();
    assert_validation(
        engine
            .create(SALES, "customer", json!({"name": "x", "password": "p"}))
            .await,
        "unknown payload column",
    );
    assert_validation(
        engine
            .list(SALES, "customer", &list_request(&[("filter", "password:eq:p")]))
            .await,
        "unknown filter column",
    );
}

pub async fn run_all_tests(ctx: &TestContext) {
    println!("\nError mapping tests");
    test_not_null_violation(ctx).await;
    test_unique_violation(ctx).await;
    test_bad_numeric_value(ctx).await;
    test_unknown_columns(ctx).await;
}
