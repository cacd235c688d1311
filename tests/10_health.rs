mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn health_endpoint_reports_database_state() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/health")).await?;
    let status = res.status();
    let body = res.json::<serde_json::Value>().await?;

    match status {
        StatusCode::OK => {
            assert_eq!(body["success"], true);
            assert_eq!(body["data"]["database"], "ok");
        }
        StatusCode::SERVICE_UNAVAILABLE => {
            assert_eq!(body["success"], false);
            assert_eq!(body["data"]["status"], "degraded");
        }
        other => panic!("unexpected status: {}", other),
    }
    Ok(())
}

#[tokio::test]
async fn root_describes_the_service() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/")).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "DocVault API");
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
    Ok(())
}
