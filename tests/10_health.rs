mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_lists_branding_and_checkout_link() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let body = client
        .get(format!("{}/", server.base_url))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;

    assert_eq!(body["name"], "Receptionist API");
    assert!(body["branding"]["appTitle"].is_string());
    assert!(body["billing"]["checkoutLink"].is_string());
    Ok(())
}

#[tokio::test]
async fn protected_route_without_token_is_unauthorized() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/me", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn server_stops_when_handle_drops() -> Result<()> {
    let server = common::spawn_server().await?;
    let url = format!("{}/health", server.base_url);
    drop(server);

    let client = reqwest::Client::new();
    assert!(client.get(url).send().await.is_err());
    Ok(())
}
