mod common;

use anyhow::Result;
use docvault_api::auth::Role;
use reqwest::StatusCode;
use uuid::Uuid;

async fn get(path: &str, auth: Option<String>) -> Result<(StatusCode, serde_json::Value)> {
    let server = common::ensure_server().await?;
    let mut req = reqwest::Client::new().get(server.url(path));
    if let Some(value) = auth {
        req = req.header("Authorization", value);
    }
    let res = req.send().await?;
    let status = res.status();
    let body = res.json::<serde_json::Value>().await.unwrap_or(serde_json::Value::Null);
    Ok((status, body))
}

#[tokio::test]
async fn api_without_token_is_unauthorized() -> Result<()> {
    for path in ["/api/me", "/api/documents", "/api/notifications", "/api/root/tenants"] {
        let (status, body) = get(path, None).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", path);
        assert_eq!(body["error"], true);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
    Ok(())
}

#[tokio::test]
async fn non_bearer_scheme_is_rejected() -> Result<()> {
    let (status, body) = get("/api/me", Some("Basic ZGFuYTpzZWNyZXQ=".to_string())).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authorization header must use Bearer token format");
    Ok(())
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() -> Result<()> {
    let token = common::forged_token(Role::MasterAdmin);
    let (status, _) = get("/api/root/tenants", Some(format!("Bearer {}", token))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn valid_token_for_unknown_user_never_reaches_handlers() -> Result<()> {
    // 403 when the database answers (no such user), 503 when it is down
    let token = common::token_for(Role::Staff, Some(Uuid::new_v4()));
    let (status, body) = get("/api/me", Some(format!("Bearer {}", token))).await?;

    assert!(
        status == StatusCode::FORBIDDEN || status == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        status
    );
    assert_eq!(body["error"], true);
    Ok(())
}
