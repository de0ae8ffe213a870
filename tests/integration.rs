//! Integration tests for the payload transform agent.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use payload_transform_agent::config::{ConfigUpdate, RouteRules};
use payload_transform_agent::{transform, Operation, TransformAgent, TransformConfig};
use serde_json::{json, Value};

fn b64(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

fn config_with_fields(fields: &[&str]) -> TransformConfig {
    TransformConfig {
        fields: fields.iter().map(|f| f.to_string()).collect(),
        ..Default::default()
    }
}

// =============================================================================
// Configuration Parsing Tests
// =============================================================================

#[test]
fn test_parse_minimal_config() {
    let yaml = r#"
version: "1"
"#;
    let config: TransformConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.version, "1");
    assert!(config.fields.is_empty());
    assert!(config.routes.include.is_empty());
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
version: "1"
settings:
  max_tree_depth: 48
fields:
  - learnerTextResponse
  - learnerChoices
  - questions.scoring.rubrics.rubricQuestion
exclude:
  - id
  - createdAt
routes:
  include:
    - /api
  exclude:
    - /health
    - /metrics
"#;
    let config: TransformConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.settings.max_tree_depth, 48);
    assert_eq!(config.fields.len(), 3);
    assert_eq!(config.exclude, vec!["id", "createdAt"]);
    assert_eq!(config.routes.include, vec!["/api"]);
    assert_eq!(config.routes.exclude, vec!["/health", "/metrics"]);
}

#[test]
fn test_parse_json_config() {
    let json_str = r#"{
        "version": "1",
        "fields": ["learnerTextResponse"],
        "routes": {"exclude": ["/health"]}
    }"#;
    let config: TransformConfig = serde_json::from_str(json_str).unwrap();
    assert_eq!(config.fields, vec!["learnerTextResponse"]);
    assert_eq!(config.routes.exclude, vec!["/health"]);
}

// =============================================================================
// Codec Property Tests
// =============================================================================

#[test]
fn test_round_trip_rich_text() {
    use payload_transform_agent::codec::{decode_value, encode_value};

    for text in [
        "<p>an answer with <b>markup</b> &amp; entities</p>",
        "plain prose with no markup at all, just words",
        "tabs\tand\nnewlines survive",
    ] {
        let original = Value::String(text.to_string());
        assert_eq!(decode_value(&encode_value(&original)), original);
    }
}

#[test]
fn test_non_payload_decode_is_identity() {
    use payload_transform_agent::codec::{decode_value, find_payload};

    for text in ["not-valid-base64!@#", "short", "hello there, world", "123"] {
        assert!(find_payload(text).is_none());
        let value = Value::String(text.to_string());
        assert_eq!(decode_value(&value), value);
    }
}

#[test]
fn test_depth_bound_stops_after_five_layers() {
    use payload_transform_agent::codec::{decode_value, encode_value};

    let mut encoded = Value::String("<p>deep</p>".to_string());
    for _ in 0..6 {
        encoded = encode_value(&encoded);
    }

    // Five layers are peeled; exactly one remains.
    let once = decode_value(&encoded);
    assert_eq!(once, Value::String(b64("<p>deep</p>")));
    assert_eq!(decode_value(&once), Value::String("<p>deep</p>".to_string()));
}

// =============================================================================
// Field Matching Tests
// =============================================================================

#[test]
fn test_wildcard_key_matches_at_any_depth() {
    let config = config_with_fields(&["learnerChoices"]);
    let body = json!({
        "responsesForQuestions": [
            {"learnerChoices": [b64("first"), b64("second"), b64("third")]}
        ]
    });
    let decoded = transform(&body, Operation::Decode, &config).unwrap();
    assert_eq!(
        decoded["responsesForQuestions"][0]["learnerChoices"],
        json!(["first", "second", "third"])
    );
}

#[test]
fn test_exact_path_does_not_prefix_match() {
    let config = config_with_fields(&["questions.scoring.rubrics.rubricQuestion"]);
    let sibling = b64("<p>criterion</p>");
    let body = json!({
        "questions": {
            "scoring": {
                "rubrics": {
                    "rubricQuestion": b64("<p>rubric</p>"),
                    "criteria": {"description": sibling.clone()}
                }
            }
        }
    });
    let decoded = transform(&body, Operation::Decode, &config).unwrap();
    assert_eq!(
        decoded["questions"]["scoring"]["rubrics"]["rubricQuestion"],
        json!("<p>rubric</p>")
    );
    // The sibling path shares a prefix but is not configured.
    assert_eq!(
        decoded["questions"]["scoring"]["rubrics"]["criteria"]["description"],
        json!(sibling)
    );
}

#[test]
fn test_exclusion_beats_allow_list() {
    let config = TransformConfig {
        fields: vec!["learnerTextResponse".to_string()],
        exclude: vec!["learnerTextResponse".to_string()],
        ..Default::default()
    };
    let body = json!({"learnerTextResponse": "<p>verbatim</p>"});
    assert_eq!(transform(&body, Operation::Encode, &config).unwrap(), body);
    assert_eq!(transform(&body, Operation::Decode, &config).unwrap(), body);
}

// =============================================================================
// Concrete Scenarios
// =============================================================================

#[tokio::test]
async fn test_scenario_decode_known_payload() {
    let agent = TransformAgent::new(TransformConfig::default());
    let body = json!({"content": "PHA+dGVzdDwvcD4="});
    let decoded = agent.decode_request("/api/questions", &body).await.unwrap();
    assert_eq!(decoded["content"], json!("<p>test</p>"));
}

#[tokio::test]
async fn test_scenario_null_fields_survive() {
    let agent = TransformAgent::new(config_with_fields(&[
        "learnerTextResponse",
        "learnerChoices",
    ]));
    let body = json!({"learnerTextResponse": null, "learnerChoices": null});
    let decoded = agent.decode_request("/api/attempts", &body).await.unwrap();
    assert_eq!(decoded, body);
}

#[tokio::test]
async fn test_scenario_garbage_survives() {
    let agent = TransformAgent::new(TransformConfig::default());
    let body = json!({"note": "not-valid-base64!@#"});
    let decoded = agent.decode_request("/api/attempts", &body).await.unwrap();
    assert_eq!(decoded, body);
}

#[tokio::test]
async fn test_scenario_nested_recovery() {
    let agent = TransformAgent::new(config_with_fields(&["content"]));
    let body = json!({
        "assignment": {
            "questions": [
                {"variants": [{"content": b64("<p>Q</p>")}]}
            ]
        }
    });
    let decoded = agent.decode_request("/api/assignments", &body).await.unwrap();
    assert_eq!(
        decoded["assignment"]["questions"][0]["variants"][0]["content"],
        json!("<p>Q</p>")
    );
}

#[tokio::test]
async fn test_scenario_array_decoded_element_wise() {
    let agent = TransformAgent::new(TransformConfig::default());
    let body = json!([b64("<p>one</p>"), b64("<p>two</p>"), b64("<p>three</p>")]);
    let decoded = agent.decode_request("/api/choices", &body).await.unwrap();
    assert_eq!(decoded, json!(["<p>one</p>", "<p>two</p>", "<p>three</p>"]));
}

#[tokio::test]
async fn test_scenario_health_route_never_transformed() {
    let yaml = r#"
routes:
  exclude:
    - /health
"#;
    let agent = TransformAgent::from_yaml(yaml).unwrap();
    let body = json!({"status": "PHA+dGVzdDwvcD4=", "detail": "<p>ok</p>"});

    let decoded = agent.decode_request("/health", &body).await.unwrap();
    assert_eq!(decoded, body);
    let encoded = agent.encode_response("/health/live", &body).await.unwrap();
    assert_eq!(encoded, body);
}

// =============================================================================
// End-to-End Boundary Tests
// =============================================================================

#[tokio::test]
async fn test_response_encode_then_request_decode() {
    let agent = TransformAgent::new(config_with_fields(&[
        "learnerTextResponse",
        "learnerChoices",
    ]));
    let body = json!({
        "responsesForQuestions": [{
            "questionId": 7,
            "learnerTextResponse": "<p>because of osmosis</p>",
            "learnerChoices": ["<b>A</b>", "<b>C</b>"]
        }]
    });

    let wire = agent.encode_response("/api/attempts", &body).await.unwrap();
    let response = &wire["responsesForQuestions"][0];
    assert_eq!(response["questionId"], json!(7));
    assert_eq!(
        response["learnerTextResponse"],
        json!(b64("<p>because of osmosis</p>"))
    );

    let back = agent.decode_request("/api/attempts", &wire).await.unwrap();
    assert_eq!(back, body);
}

#[tokio::test]
async fn test_compressed_envelope_consumed_on_decode() {
    let agent = TransformAgent::new(config_with_fields(&["content"]));
    let envelope = format!("comp:{}", b64(r#"{"kind":"rubric","text":"<p>R</p>"}"#));
    let body = json!({"content": envelope});
    let decoded = agent.decode_request("/api/rubrics", &body).await.unwrap();
    assert_eq!(
        decoded["content"],
        json!({"kind": "rubric", "text": "<p>R</p>"})
    );
}

#[tokio::test]
async fn test_query_params_decoded() {
    let agent = TransformAgent::new(TransformConfig::default());
    let query = format!("search={}&page=2", urlencoding::encode(&b64("<p>osmosis</p>")));
    let params = agent.decode_query_params("/api/search", Some(&query)).await;
    assert_eq!(params.get("search"), Some(&vec!["<p>osmosis</p>".to_string()]));
    assert_eq!(params.get("page"), Some(&vec!["2".to_string()]));
}

#[tokio::test]
async fn test_depth_guard_rejects_instead_of_truncating() {
    let yaml = r#"
settings:
  max_tree_depth: 8
"#;
    let agent = TransformAgent::from_yaml(yaml).unwrap();

    let mut body = json!("leaf");
    for _ in 0..12 {
        body = json!({"wrap": body});
    }

    assert!(agent.decode_request("/api/attempts", &body).await.is_err());
    assert_eq!(agent.metrics().transform_errors, 1);
}

#[tokio::test]
async fn test_config_update_visible_to_next_call() {
    let agent = TransformAgent::new(config_with_fields(&["learnerTextResponse"]));
    let body = json!({"feedback": b64("<p>well done</p>")});

    // Not in the allow-list yet: left alone.
    let before = agent.decode_request("/api/grades", &body).await.unwrap();
    assert_eq!(before, body);

    agent
        .update_config(ConfigUpdate {
            fields: Some(vec!["feedback".to_string()]),
            ..Default::default()
        })
        .await;

    let after = agent.decode_request("/api/grades", &body).await.unwrap();
    assert_eq!(after["feedback"], json!("<p>well done</p>"));
}

#[tokio::test]
async fn test_include_routes_restrict_transformation() {
    let config = TransformConfig {
        routes: RouteRules {
            include: vec!["/api".to_string()],
            exclude: vec![],
        },
        ..Default::default()
    };
    let agent = TransformAgent::new(config);
    let body = json!({"content": "PHA+dGVzdDwvcD4="});

    let on_api = agent.decode_request("/api/questions", &body).await.unwrap();
    assert_eq!(on_api["content"], json!("<p>test</p>"));

    let off_api = agent.decode_request("/admin/questions", &body).await.unwrap();
    assert_eq!(off_api, body);
}
