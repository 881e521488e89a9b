use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use printfarm_api::{app, AppState, AuthConfig};
use printfarm_core::{MemorySessionStore, SessionManager};
use printfarm_shared::Secret;
use printfarm_store::app_config::CopywriterConfig;
use printfarm_store::{Copywriter, Database, SqliteCatalog};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt;

async fn test_app() -> Router {
    let db = Database::in_memory().await.unwrap();
    let state = AppState {
        catalog: Arc::new(SqliteCatalog::new(db.pool)),
        sessions: SessionManager::new(Arc::new(MemorySessionStore::default())),
        copywriter: Arc::new(Copywriter::new(&CopywriterConfig::default()).unwrap()),
        auth: AuthConfig {
            username: "admin".to_string(),
            password: Secret::new("hunter2".to_string()),
            cookie_secure: false,
        },
        cors_origin: None,
    };
    app(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "admin", "password": "hunter2"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
        other => panic!("not a decimal: {}", other),
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/api/models", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, "GET", "/api/models", Some("forged"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_check_logout() {
    let app = test_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "admin", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&app).await;
    let (status, body) = send(&app, "GET", "/api/auth/check", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["username"], "admin");

    let (status, _) = send(&app, "POST", "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/api/auth/check", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["authenticated"], false);
}

#[tokio::test]
async fn test_session_cookie_is_accepted() {
    let app = test_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"username": "admin", "password": "hunter2"}).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("session="));
    assert!(set_cookie.contains("HttpOnly"));

    let cookie = set_cookie.split(';').next().unwrap().to_string();
    let request = Request::builder()
        .uri("/api/settings")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_model_lifecycle_with_costs() {
    let app = test_app().await;
    let token = login(&app).await;
    let token = Some(token.as_str());

    let (status, printer) = send(
        &app,
        "POST",
        "/api/printers",
        token,
        Some(json!({"name": "Bambu P1S", "powerConsumptionKw": "0.3"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, packaging) = send(
        &app,
        "POST",
        "/api/packaging",
        token,
        Some(json!({"name": "Box M", "length": 20, "width": 15, "height": 10, "weight": 50, "cost": 20})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, model) = send(
        &app,
        "POST",
        "/api/models",
        token,
        Some(json!({
            "name": "Spiral vase",
            "weightGrams": 100,
            "printHours": 2,
            "printerId": printer["id"],
            "plasticPricePerKg": 1000,
            "packagingId": packaging["id"],
            "wb": {"logisticsCost": 50},
            "ozon": {"logisticsCost": 60},
            "desiredMargin": 100
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let article = model["article"].as_str().unwrap();
    assert!(article.starts_with("PM-"));
    assert_eq!(article.len(), 9);
    assert_eq!(dec(&model["consumablesPercent"]), Decimal::from(10));
    assert_eq!(dec(&model["calculations"]["materialCost"]), Decimal::from(110));
    assert_eq!(
        dec(&model["calculations"]["electricityCost"]),
        Decimal::from_str("3.9").unwrap()
    );
    assert_eq!(
        dec(&model["calculations"]["fullCost"]),
        Decimal::from_str("154.595").unwrap()
    );
    assert_eq!(dec(&model["calculations"]["wbNetProfit"]), Decimal::from(100));
    assert_eq!(model["pricingIssues"], json!([]));

    let id = model["id"].as_str().unwrap().to_string();

    let (status, costs) = send(&app, "GET", &format!("/api/models/{}/costs", id), token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(costs["calculations"], model["calculations"]);

    let (status, copy) = send(&app, "POST", &format!("/api/models/{}/duplicate", id), token, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(copy["name"], "Spiral vase (copy)");
    assert_ne!(copy["article"], model["article"]);

    let (status, archived) = send(&app, "POST", &format!("/api/models/{}/archive", id), token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(archived["isArchived"], true);

    let (_, visible) = send(&app, "GET", "/api/models", token, None).await;
    assert_eq!(visible.as_array().unwrap().len(), 1);
    let (_, all) = send(&app, "GET", "/api/models?archived=true", token, None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
    let (_, found) = send(&app, "GET", "/api/models?q=copy&archived=true", token, None).await;
    assert_eq!(found.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", &format!("/api/models/{}", id), token, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, "GET", &format!("/api/models/{}", id), token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_update_returns_stored_model() {
    let app = test_app().await;
    let token = login(&app).await;
    let token = Some(token.as_str());

    let (_, model) = send(&app, "POST", "/api/models", token, Some(json!({"name": "Hook"}))).await;
    let id = model["id"].as_str().unwrap().to_string();

    let mut edited = model.clone();
    edited["name"] = json!("Wall hook");
    edited["images"] = json!(["https://img/1.jpg"]);
    let (status, updated) = send(&app, "PUT", &format!("/api/models/{}", id), token, Some(edited)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Wall hook");
    assert_eq!(updated["images"], json!(["https://img/1.jpg"]));
    assert_eq!(updated["article"], model["article"]);

    let mut invalid = updated.clone();
    invalid["wb"]["commissionPercent"] = json!(100);
    let (status, _) = send(&app, "PUT", &format!("/api/models/{}", id), token, Some(invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, reloaded) = send(&app, "GET", &format!("/api/models/{}", id), token, None).await;
    assert_eq!(reloaded["name"], "Wall hook");
}

#[tokio::test]
async fn test_model_validation() {
    let app = test_app().await;
    let token = login(&app).await;
    let token = Some(token.as_str());

    let (status, body) = send(&app, "POST", "/api/models", token, Some(json!({"weightGrams": 10}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "name is required");

    let (status, _) = send(
        &app,
        "POST",
        "/api/models",
        token,
        Some(json!({"name": "Vase", "weightGrams": -1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_preview_flags_degenerate_commission() {
    let app = test_app().await;
    let token = login(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/pricing/preview",
        Some(&token),
        Some(json!({"name": "Draft", "wb": {"commissionPercent": 100}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["calculations"]["wbRecommendedPrice"].is_null());
    assert!(!body["calculations"]["ozonRecommendedPrice"].is_null());
    assert_eq!(body["pricingIssues"][0]["kind"], "nonFinitePrice");
    assert_eq!(body["pricingIssues"][0]["channel"], "wildberries");
}

#[tokio::test]
async fn test_category_in_use_conflicts() {
    let app = test_app().await;
    let token = login(&app).await;
    let token = Some(token.as_str());

    let (_, category) = send(&app, "POST", "/api/categories", token, Some(json!({"name": "Decor"}))).await;
    assert_eq!(category["color"], "#3B82F6");

    let (status, _) = send(&app, "POST", "/api/categories", token, Some(json!({"name": "Decor"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    send(
        &app,
        "POST",
        "/api/models",
        token,
        Some(json!({"name": "Vase", "categoryId": category["id"]})),
    )
    .await;

    let uri = format!("/api/categories/{}", category["id"].as_str().unwrap());
    let (status, body) = send(&app, "DELETE", &uri, token, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "category is used by 1 product(s)");
}

#[tokio::test]
async fn test_logistics_estimate_defaults() {
    let app = test_app().await;
    let token = login(&app).await;

    let (status, body) = send(&app, "POST", "/api/logistics/estimate", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&body["totalLogistics"]).round_dp(2), Decimal::from_str("92.71").unwrap());

    let (status, _) = send(
        &app,
        "POST",
        "/api/logistics/estimate",
        Some(&token),
        Some(json!({"purchasePercent": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logistics_estimate_out_of_range_inputs_are_rejected() {
    let app = test_app().await;
    let token = login(&app).await;

    for body in [
        json!({"purchasePercent": "0.0000000000000000000000000001"}),
        json!({"sizeClass": "volume", "volumeLiters": "79228162514264337593543950335"}),
        json!({"retailPrice": "79228162514264337593543950335", "discountPercent": -50}),
    ] {
        let (status, response) =
            send(&app, "POST", "/api/logistics/estimate", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(response["error"].is_string());
    }
}

#[tokio::test]
async fn test_settings_update_and_generation_without_key() {
    let app = test_app().await;
    let token = login(&app).await;
    let token = Some(token.as_str());

    let (status, settings) = send(&app, "PUT", "/api/settings", token, Some(json!({"bubbleWrapCost": 20}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&settings["bubbleWrapCost"]), Decimal::from(20));
    assert_eq!(dec(&settings["electricityCostPerKwh"]), Decimal::from_str("6.5").unwrap());

    let (status, _) = send(&app, "PUT", "/api/settings", token, Some(json!({"defaultOzonCommission": 100}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, model) = send(&app, "POST", "/api/models", token, Some(json!({"name": "Vase"}))).await;
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/models/{}/generate", model["id"].as_str().unwrap()),
        token,
        Some(json!({"kind": "wbTitle"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("API key"));
}

#[tokio::test]
async fn test_dashboard_and_backup_round_trip() {
    let app = test_app().await;
    let token = login(&app).await;
    let token = Some(token.as_str());

    let (_, empty) = send(&app, "GET", "/api/dashboard", token, None).await;
    assert_eq!(empty["totalActiveModels"], 0);
    assert!(empty["mostProfitableModel"].is_null());

    send(&app, "POST", "/api/models", token, Some(json!({"name": "Cheap", "desiredMargin": 50}))).await;
    send(&app, "POST", "/api/models", token, Some(json!({"name": "Pricey", "desiredMargin": 250}))).await;

    let (_, stats) = send(&app, "GET", "/api/dashboard", token, None).await;
    assert_eq!(stats["totalActiveModels"], 2);
    assert_eq!(dec(&stats["averageMargin"]), Decimal::from(150));
    assert_eq!(stats["mostProfitableModel"]["name"], "Pricey");
    assert_eq!(stats["leastProfitableModel"]["name"], "Cheap");

    let (status, snapshot) = send(&app, "GET", "/api/data/export", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["models"].as_array().unwrap().len(), 2);

    let other = test_app().await;
    let other_token = login(&other).await;
    let (status, summary) = send(&other, "POST", "/api/data/import", Some(&other_token), Some(snapshot)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["models"], 2);

    let (_, restored) = send(&other, "GET", "/api/models", Some(&other_token), None).await;
    assert_eq!(restored.as_array().unwrap().len(), 2);
}
