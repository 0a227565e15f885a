/// Enrichment tests with mocked lookup services
/// Covers thresholds, failures and the full create flow without hitting the real APIs
use person_api::config::Config;
use person_api::enrichment::{Lookup, NameEnricher};
use person_api::memory_storage::MemoryPersonStore;
use person_api::models::PersonCreate;
use person_api::person_service::PersonService;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create test config
fn create_test_config(genderize_url: String, nationalize_url: String) -> Config {
    Config {
        database_url: "postgresql://test".to_string(),
        db_max_connections: 1,
        run_migrations: false,
        port: 8080,
        genderize_url,
        nationalize_url,
        enrichment_enabled: true,
        enrichment_timeout_secs: 1,
    }
}

/// Answers `GET /?name={name}` with `body`.
async fn mock_lookup(server: &MockServer, name: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("name", name))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn enricher(genderize: &MockServer, nationalize: &MockServer) -> NameEnricher {
    NameEnricher::from_config(&create_test_config(genderize.uri(), nationalize.uri())).unwrap()
}

#[tokio::test]
async fn test_confident_guesses_are_accepted() {
    let genderize = MockServer::start().await;
    let nationalize = MockServer::start().await;
    mock_lookup(
        &genderize,
        "Дмитрий",
        serde_json::json!({"count": 1000, "name": "Дмитрий", "gender": "male", "probability": 0.99}),
    )
    .await;
    mock_lookup(
        &nationalize,
        "Дмитрий",
        serde_json::json!({"count": 1000, "name": "Дмитрий", "country": [
            {"country_id": "RU", "probability": 0.62},
            {"country_id": "UA", "probability": 0.18}
        ]}),
    )
    .await;

    let enrichment = enricher(&genderize, &nationalize).await.enrich("Дмитрий").await;

    assert_eq!(enrichment.gender, Lookup::Accepted("male".to_string()));
    assert_eq!(enrichment.nationality, Lookup::Accepted("RU".to_string()));
}

#[tokio::test]
async fn test_guesses_at_threshold_are_rejected() {
    let genderize = MockServer::start().await;
    let nationalize = MockServer::start().await;
    mock_lookup(
        &genderize,
        "Alex",
        serde_json::json!({"gender": "male", "probability": 0.7}),
    )
    .await;
    mock_lookup(
        &nationalize,
        "Alex",
        serde_json::json!({"country": [{"country_id": "US", "probability": 0.3}]}),
    )
    .await;

    let enrichment = enricher(&genderize, &nationalize).await.enrich("Alex").await;

    assert_eq!(enrichment.gender, Lookup::Rejected { probability: 0.7 });
    assert_eq!(enrichment.nationality, Lookup::Rejected { probability: 0.3 });
}

#[tokio::test]
async fn test_unknown_name_is_rejected() {
    let genderize = MockServer::start().await;
    let nationalize = MockServer::start().await;
    mock_lookup(
        &genderize,
        "Zzyzx",
        serde_json::json!({"count": 0, "name": "Zzyzx", "gender": null, "probability": 0.0}),
    )
    .await;
    mock_lookup(
        &nationalize,
        "Zzyzx",
        serde_json::json!({"count": 0, "name": "Zzyzx", "country": []}),
    )
    .await;

    let enrichment = enricher(&genderize, &nationalize).await.enrich("Zzyzx").await;

    assert!(enrichment.gender.accepted().is_none());
    assert!(enrichment.nationality.accepted().is_none());
}

#[tokio::test]
async fn test_server_error_and_malformed_body_fail_independently() {
    let genderize = MockServer::start().await;
    let nationalize = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&genderize)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&nationalize)
        .await;

    let enrichment = enricher(&genderize, &nationalize).await.enrich("Иван").await;

    assert!(matches!(enrichment.gender, Lookup::Failed(_)));
    assert!(matches!(enrichment.nationality, Lookup::Failed(_)));
}

#[tokio::test]
async fn test_slow_lookup_times_out() {
    let genderize = MockServer::start().await;
    let nationalize = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"gender": "female", "probability": 0.99}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&genderize)
        .await;
    mock_lookup(
        &nationalize,
        "Анна",
        serde_json::json!({"country": [{"country_id": "RU", "probability": 0.5}]}),
    )
    .await;

    let enrichment = enricher(&genderize, &nationalize).await.enrich("Анна").await;

    assert!(matches!(enrichment.gender, Lookup::Failed(_)));
    assert_eq!(enrichment.nationality, Lookup::Accepted("RU".to_string()));
}

#[tokio::test]
async fn test_lookups_are_sent_once_per_create() {
    let genderize = MockServer::start().await;
    let nationalize = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("name", "Ольга"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"gender": "female", "probability": 0.98})),
        )
        .expect(2)
        .mount(&genderize)
        .await;
    Mock::given(method("GET"))
        .and(query_param("name", "Ольга"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({"country": [{"country_id": "RU", "probability": 0.4}]}),
        ))
        .expect(2)
        .mount(&nationalize)
        .await;

    let service = PersonService::new(
        Arc::new(MemoryPersonStore::new()),
        enricher(&genderize, &nationalize).await,
    );

    for surname in ["Иванова", "Смирнова"] {
        let person = service
            .create_person(PersonCreate {
                name: "Ольга".into(),
                surname: surname.into(),
                patronymic: None,
            })
            .await
            .unwrap();
        assert_eq!(person.gender.as_deref(), Some("female"));
        assert_eq!(person.nationality.as_deref(), Some("RU"));
    }
}

#[tokio::test]
async fn test_create_succeeds_when_lookups_are_unreachable() {
    // Nothing listens on port 9 of localhost
    let config = create_test_config(
        "http://127.0.0.1:9".to_string(),
        "http://127.0.0.1:9".to_string(),
    );
    let service = PersonService::new(
        Arc::new(MemoryPersonStore::new()),
        NameEnricher::from_config(&config).unwrap(),
    );

    let person = service
        .create_person(PersonCreate {
            name: "Дмитрий".into(),
            surname: "Ушаков".into(),
            patronymic: Some("Васильевич".into()),
        })
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&person).unwrap(),
        serde_json::json!({
            "id": 1,
            "name": "Дмитрий",
            "surname": "Ушаков",
            "patronymic": "Васильевич"
        })
    );
}

#[tokio::test]
async fn test_low_confidence_leaves_fields_unset_on_record() {
    let genderize = MockServer::start().await;
    let nationalize = MockServer::start().await;
    mock_lookup(
        &genderize,
        "Саша",
        serde_json::json!({"gender": "male", "probability": 0.52}),
    )
    .await;
    mock_lookup(
        &nationalize,
        "Саша",
        serde_json::json!({"country": [{"country_id": "RU", "probability": 0.12}]}),
    )
    .await;

    let service = PersonService::new(
        Arc::new(MemoryPersonStore::new()),
        enricher(&genderize, &nationalize).await,
    );
    let person = service
        .create_person(PersonCreate {
            name: "Саша".into(),
            surname: "Белова".into(),
            patronymic: None,
        })
        .await
        .unwrap();

    assert_eq!(person.gender, None);
    assert_eq!(person.nationality, None);
}

#[tokio::test]
async fn test_disabled_enrichment_makes_no_calls() {
    let genderize = MockServer::start().await;
    let nationalize = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&genderize)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&nationalize)
        .await;

    let mut config = create_test_config(genderize.uri(), nationalize.uri());
    config.enrichment_enabled = false;
    let enricher = NameEnricher::from_config(&config).unwrap();

    assert!(!enricher.is_enabled());
    let enrichment = enricher.enrich("Дмитрий").await;
    assert_eq!(enrichment.gender, Lookup::Skipped);
    assert_eq!(enrichment.nationality, Lookup::Skipped);
}
