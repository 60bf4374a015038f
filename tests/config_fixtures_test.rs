use market_discovery::domain::ports::ConfigProvider;
use market_discovery::utils::validation::Validate;
use market_discovery::{
    render, InMemoryStore, OutputFormat, SearchConfig, SearchEngine, StoreSettings,
};
use tempfile::TempDir;

const FIXTURES: &str = r#"{
  "markets": [
    {"id": 1, "name": "Wochenmarkt Römer", "city": "Frankfurt", "postalCode": "60311",
     "isActive": true, "isPremium": false, "createdAt": "2024-01-05T10:00:00Z"},
    {"id": 2, "name": "Bio-Eck", "city": "Frankfurt", "postalCode": "60311",
     "isActive": true, "isPremium": true, "createdAt": "2024-01-02T10:00:00Z"},
    {"id": 3, "name": "Hofladen", "city": "Frankfurt", "postalCode": "60200",
     "isActive": true, "isPremium": false, "createdAt": "2024-02-01T10:00:00Z"}
  ],
  "offers": [
    {"id": 10, "marketId": 3, "productName": "Spargel", "price": "8 €/kg",
     "status": "live", "expiresAt": "2099-01-01T00:00:00Z", "createdAt": "2024-04-01T00:00:00Z"}
  ]
}"#;

fn write_setup(dir: &TempDir) -> String {
    let fixtures_path = dir.path().join("markets.json");
    std::fs::write(&fixtures_path, FIXTURES).unwrap();
    let fixtures = fixtures_path.to_str().unwrap().replace('\\', "/");

    let config_path = dir.path().join("search.toml");
    let config = format!(
        r#"
[engine]
lookup_limit = 10
lookup_timeout_ms = 1500

[store]
kind = "memory"
fixtures = "{}"
"#,
        fixtures
    );
    std::fs::write(&config_path, config).unwrap();
    config_path.to_str().unwrap().to_string()
}

#[tokio::test]
async fn test_end_to_end_search_from_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = write_setup(&temp_dir);

    let config = SearchConfig::from_file(&config_path).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.lookup_limit(), 10);

    let fixtures = match config.store.settings().unwrap() {
        StoreSettings::Memory { fixtures } => fixtures,
        other => panic!("expected memory store, got {:?}", other),
    };
    let store = InMemoryStore::from_file(&fixtures).await.unwrap();
    let engine = SearchEngine::from_config(store, &config);
    assert_eq!(engine.options().lookup_limit, 10);

    let result = engine
        .search(Some("spargel"), None, Some("60311"))
        .await
        .unwrap();

    let exact: Vec<i64> = result.exact_locality.markets.iter().map(|m| m.id).collect();
    assert_eq!(exact, vec![2, 1]);
    assert_eq!(result.expanded_region.markets[0].id, 3);
    assert_eq!(result.expanded_region.offers[0].offer.id, 10);
    assert_eq!(result.total_results, 4);

    let json = render(&result, OutputFormat::Json).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["totalResults"], 4);
    assert_eq!(parsed["exactLocality"]["count"], 2);
    assert_eq!(parsed["expandedRegion"]["offers"][0]["offer"]["productName"], "Spargel");

    let csv = render(&result, OutputFormat::Csv).unwrap();
    assert_eq!(csv.lines().count(), 5);
    assert!(csv.contains("expanded_region,offer,10,Spargel,Hofladen"));
}

#[tokio::test]
async fn test_missing_fixtures_file_is_an_io_error() {
    let result = InMemoryStore::from_file("/definitely/not/here.json").await;
    assert!(matches!(
        result,
        Err(market_discovery::DiscoveryError::IoError(_))
    ));
}

#[tokio::test]
async fn test_malformed_fixtures_are_a_serialization_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.json");
    std::fs::write(&path, r#"{"markets": [{"id": "x"}]}"#).unwrap();

    let result = InMemoryStore::from_file(&path).await;
    assert!(matches!(
        result,
        Err(market_discovery::DiscoveryError::SerializationError(_))
    ));
}
