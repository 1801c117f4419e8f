//! Mock GraphQL endpoint helpers

use rechat_dl::config::{ApiConfig, Config, RetryConfig};
use serde_json::Value;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches a comments request by one of its `variables`
pub struct VariablesMatcher {
    key: &'static str,
    value: Value,
}

impl Match for VariablesMatcher {
    fn matches(&self, request: &Request) -> bool {
        request_variables(request).is_some_and(|variables| variables.get(self.key) == Some(&self.value))
    }
}

/// The first page request (content offset zero)
pub fn first_page() -> VariablesMatcher {
    VariablesMatcher {
        key: "contentOffsetSeconds",
        value: Value::from(0),
    }
}

/// The page request following `cursor`
pub fn after_cursor(cursor: &str) -> VariablesMatcher {
    VariablesMatcher {
        key: "cursor",
        value: Value::from(cursor),
    }
}

/// `variables` of the first operation in a request body
pub fn request_variables(request: &Request) -> Option<Value> {
    let body: Value = serde_json::from_slice(&request.body).ok()?;
    let operation = match body {
        Value::Array(mut operations) if !operations.is_empty() => operations.swap_remove(0),
        other => other,
    };
    operation.get("variables").cloned()
}

/// Respond to requests matching `matcher` with `body`
pub async fn mount_page(server: &MockServer, matcher: VariablesMatcher, body: Value) {
    Mock::given(method("POST"))
        .and(matcher)
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Respond to requests matching `matcher` with an HTTP error
pub async fn mount_status(server: &MockServer, matcher: VariablesMatcher, status: u16) {
    Mock::given(method("POST"))
        .and(matcher)
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Configuration pointing at the mock server, without retries
pub fn mock_config(server: &MockServer) -> Config {
    Config {
        api: ApiConfig {
            endpoint: format!("{}/gql", server.uri()),
            timeout: Duration::from_secs(5),
            ..ApiConfig::default()
        },
        retry: RetryConfig::none(),
        ..Config::default()
    }
}
