//! End-to-end ETL cycles against mocked Sportradar endpoints.

use sportradar_etl::config::{ApiConfig, DatabaseConfig, RetryConfig};
use sportradar_etl::db::{tables, Store};
use sportradar_etl::etl::{GroupOutcome, Pipeline};
use sportradar_etl::fetch::ApiClient;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn competitions_doc() -> serde_json::Value {
    json!({
        "categories": [
            {
                "id": "sr:category:3",
                "name": "ATP",
                "competitions": [
                    {
                        "id": "sr:competition:2555",
                        "name": "ATP Vienna",
                        "type": "singles",
                        "gender": "men",
                        "category": {"id": "sr:category:3"}
                    }
                ]
            }
        ],
        "competitions": [
            {
                "id": "sr:competition:2784",
                "name": "WTA Linz",
                "parent_id": "sr:competition:100",
                "type": "singles",
                "gender": "women",
                "category": {"id": "sr:category:6"}
            }
        ]
    })
}

fn complexes_doc() -> serde_json::Value {
    json!({
        "complexes": [
            {
                "id": "sr:complex:705",
                "name": "National Tennis Centre",
                "venues": [
                    {
                        "id": "sr:venue:2281",
                        "name": "Centre Court",
                        "city": {"name": "London"},
                        "country": {"name": "United Kingdom", "code": "GBR"},
                        "timezone": "Europe/London",
                        "complex": {"id": "sr:complex:705"}
                    },
                    {
                        "id": "sr:venue:2282",
                        "name": "Court One",
                        "city_name": "London"
                    }
                ]
            }
        ]
    })
}

fn rankings_doc() -> serde_json::Value {
    json!({
        "rankings": [
            {
                "rank": 1,
                "movement": 0,
                "points": 9045,
                "competitions_played": 18,
                "ranking_date": "2026-06-01",
                "competitor": {
                    "id": "sr:competitor:18921",
                    "name": "Pavic, Mate",
                    "country": {"name": "Croatia", "code": "HRV"},
                    "abbreviation": "PAV"
                }
            },
            {
                "rank": 2,
                "points": 8720,
                "competitions": 21,
                "competitor": {
                    "id": "sr:competitor:17920",
                    "full_name": "Arevalo, Marcelo",
                    "country": {"name": "El Salvador", "code": "SLV"}
                }
            }
        ]
    })
}

async fn mount_endpoint(server: &MockServer, endpoint: &str, doc: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/{endpoint}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(doc))
        .mount(server)
        .await;
}

async fn mount_all(server: &MockServer) {
    mount_endpoint(server, "competitions.json", competitions_doc()).await;
    mount_endpoint(server, "complexes.json", complexes_doc()).await;
    mount_endpoint(server, "doubles_competitor_rankings.json", rankings_doc()).await;
}

async fn pipeline_for(server: &MockServer, dir: &tempfile::TempDir) -> Pipeline {
    let api = ApiConfig {
        base_url: server.uri(),
        timeout_seconds: 5,
    };
    let retry = RetryConfig {
        max_attempts: 2,
        rate_limit_backoff_ms: 5,
        network_backoff_ms: 5,
    };
    let database = DatabaseConfig {
        path: dir.path().join("etl.db").display().to_string(),
        max_connections: 5,
    };

    let client = ApiClient::new(&api, retry, "test-key".to_string()).expect("client");
    let store = Store::new(&database).await.expect("store");
    Pipeline::new(client, store)
}

async fn count(store: &Store, table: &str) -> i64 {
    let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(store.pool())
        .await
        .expect("count query");
    row.0
}

#[tokio::test]
async fn full_cycle_populates_all_six_tables() {
    let server = MockServer::start().await;
    mount_all(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_for(&server, &dir).await;
    let report = pipeline.run_cycle().await;

    assert_eq!(report.failed_groups(), 0);
    assert_eq!(report.rows_written(), 10);

    let store = pipeline.store();
    assert_eq!(count(store, tables::CATEGORIES).await, 1);
    assert_eq!(count(store, tables::COMPETITIONS).await, 2);
    assert_eq!(count(store, tables::COMPLEXES).await, 1);
    assert_eq!(count(store, tables::VENUES).await, 2);
    assert_eq!(count(store, tables::COMPETITORS).await, 2);
    assert_eq!(count(store, tables::COMPETITOR_RANKINGS).await, 2);

    // nested objects were flattened and defaulted along the way
    let venue: (String, String, String) = sqlx::query_as(
        "SELECT city_name, country_code, timezone FROM Venues WHERE venue_id = ?",
    )
    .bind("sr:venue:2282")
    .fetch_one(store.pool())
    .await
    .unwrap();
    assert_eq!(venue.0, "London");
    assert_eq!(venue.1, "UNK");
    assert_eq!(venue.2, "");

    let competitor: (String, String) =
        sqlx::query_as("SELECT name, abbreviation FROM Competitors WHERE competitor_id = ?")
            .bind("sr:competitor:17920")
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(competitor.0, "Arevalo, Marcelo");
    assert_eq!(competitor.1, "Arevalo, M");

    let ranking: (i64, i64, String) = sqlx::query_as(
        "SELECT movement, competitions_played, competitor_id \
         FROM Competitor_Rankings WHERE rank_pos = 2",
    )
    .fetch_one(store.pool())
    .await
    .unwrap();
    assert_eq!(ranking.0, 0);
    assert_eq!(ranking.1, 21);
    assert_eq!(ranking.2, "sr:competitor:17920");
}

#[tokio::test]
async fn rerunning_a_cycle_is_idempotent() {
    let server = MockServer::start().await;
    mount_all(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_for(&server, &dir).await;

    let first = pipeline.run_cycle().await;
    let second = pipeline.run_cycle().await;
    assert_eq!(first.rows_written(), second.rows_written());

    let store = pipeline.store();
    assert_eq!(count(store, tables::CATEGORIES).await, 1);
    assert_eq!(count(store, tables::COMPETITIONS).await, 2);
    assert_eq!(count(store, tables::COMPLEXES).await, 1);
    assert_eq!(count(store, tables::VENUES).await, 2);
    assert_eq!(count(store, tables::COMPETITORS).await, 2);
    assert_eq!(count(store, tables::COMPETITOR_RANKINGS).await, 2);
}

#[tokio::test]
async fn failed_group_does_not_stop_the_others() {
    let server = MockServer::start().await;
    // the competitions feed is broken; the other two groups are healthy
    Mock::given(method("GET"))
        .and(path("/competitions.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_endpoint(&server, "complexes.json", complexes_doc()).await;
    mount_endpoint(&server, "doubles_competitor_rankings.json", rankings_doc()).await;

    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_for(&server, &dir).await;
    let report = pipeline.run_cycle().await;

    assert_eq!(report.groups.len(), 3);
    assert!(matches!(
        report.groups[0].outcome,
        GroupOutcome::Failed { .. }
    ));
    assert!(report.groups[1].succeeded());
    assert!(report.groups[2].succeeded());

    let store = pipeline.store();
    assert_eq!(count(store, tables::CATEGORIES).await, 0);
    assert_eq!(count(store, tables::COMPETITIONS).await, 0);
    assert_eq!(count(store, tables::COMPLEXES).await, 1);
    assert_eq!(count(store, tables::VENUES).await, 2);
    assert_eq!(count(store, tables::COMPETITORS).await, 2);
    assert_eq!(count(store, tables::COMPETITOR_RANKINGS).await, 2);
}

#[tokio::test]
async fn next_cycle_replaces_rows_by_primary_key() {
    let server = MockServer::start().await;
    // first cycle sees the original names, later cycles the renamed feed
    Mock::given(method("GET"))
        .and(path("/competitions.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(competitions_doc()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/competitions.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "categories": [{"id": "sr:category:3", "name": "ATP World Tour"}],
            "competitions": []
        })))
        .mount(&server)
        .await;
    mount_endpoint(&server, "complexes.json", complexes_doc()).await;
    mount_endpoint(&server, "doubles_competitor_rankings.json", rankings_doc()).await;

    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_for(&server, &dir).await;
    pipeline.run_cycle().await;
    pipeline.run_cycle().await;

    let store = pipeline.store();
    assert_eq!(count(store, tables::CATEGORIES).await, 1);
    let row: (String,) =
        sqlx::query_as("SELECT category_name FROM Categories WHERE category_id = ?")
            .bind("sr:category:3")
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(row.0, "ATP World Tour");
}
