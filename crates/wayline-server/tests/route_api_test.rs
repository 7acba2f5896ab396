//! Route API integration tests against a running server.
//!
//! Run with: cargo test --test route_api_test -- --ignored

use reqwest::Client;

fn base_url() -> String {
    std::env::var("WAYLINE_TEST_URL").unwrap_or_else(|_| "http://localhost:5002".to_string())
}

/// Route generation round trip for every advertised algorithm.
#[tokio::test]
#[ignore]
async fn test_route_for_each_algorithm() {
    let client = Client::new();
    let base = base_url();

    let resp = client
        .get(format!("{}/algorithms", base))
        .send()
        .await
        .expect("Failed to list algorithms");
    assert!(resp.status().is_success());
    let catalog: serde_json::Value = resp.json().await.unwrap();

    for entry in catalog["algorithms"].as_array().unwrap() {
        let name = entry["name"].as_str().unwrap();
        let resp = client
            .get(format!("{}/route", base))
            .query(&[
                ("from", "41.2995,69.2401"),
                ("to", "41.3158,69.2785"),
                ("algorithm", name),
            ])
            .send()
            .await
            .expect("Failed to fetch route");

        assert!(resp.status().is_success(), "algorithm {name} failed");
        let feature: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(feature["type"].as_str(), Some("Feature"));

        let coords = feature["geometry"]["coordinates"].as_array().unwrap();
        assert!(coords.len() >= 2, "algorithm {name} returned {} points", coords.len());
    }
}

/// Health endpoint reports a default algorithm and provider count.
#[tokio::test]
#[ignore]
async fn test_health() {
    let client = Client::new();
    let base = base_url();

    let resp = client
        .get(format!("{}/health", base))
        .send()
        .await
        .expect("Failed to check health");
    assert!(resp.status().is_success());

    let health: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(health["status"].as_str(), Some("healthy"));
    assert!(health["algorithms_available"].as_u64().unwrap() >= 4);
}
