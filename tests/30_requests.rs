mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn unknown_routes_are_not_found() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/api/schemas")).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn malformed_json_without_token_is_unauthorized() -> Result<()> {
    let server = common::ensure_server().await?;

    // Without a token the body is never parsed
    let res = reqwest::Client::new()
        .post(server.url("/api/folders"))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
