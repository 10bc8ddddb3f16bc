use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use xconv::core::{
    Catalog, ConversionController, ConversionError, ConversionRequest, ConversionStatus,
    RateFetcher,
};
use xconv::providers::ExchangeRateApiFetcher;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(base: &str, template: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;
        let url_path = format!("/v4/latest/{base}");

        Mock::given(method("GET"))
            .and(path(&url_path))
            .respond_with(template)
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub fn rates_body(base: &str, rates: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_string(format!(
            r#"{{"base": "{base}", "date": "2026-10-19", "rates": {{{rates}}}}}"#
        ))
    }

    pub fn write_config(base_url: &str) -> tempfile::NamedTempFile {
        let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        let config_content = format!(
            r#"
        provider:
          base_url: {base_url}
          timeout_secs: 5
        debounce_ms: 50
    "#
        );
        std::fs::write(config_file.path(), config_content).expect("Failed to write config file");
        config_file
    }
}

fn controller_for(base_url: &str, request: ConversionRequest) -> ConversionController {
    let fetcher: Arc<dyn RateFetcher> = Arc::new(
        ExchangeRateApiFetcher::new(base_url, Duration::from_secs(5))
            .expect("Failed to build fetcher"),
    );
    ConversionController::new(
        fetcher,
        Arc::new(Catalog::default()),
        xconv::core::controller::ControllerSettings {
            debounce: Duration::from_millis(50),
            initial: request,
        },
    )
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock() {
    let mock_server = test_utils::create_mock_server(
        "USD",
        test_utils::rates_body("USD", r#""KGS": 87.45, "EUR": 0.9"#),
    )
    .await;
    let config_file = test_utils::write_config(&mock_server.uri());

    let result = xconv::run_command(
        xconv::AppCommand::Convert {
            amount: Some("100".to_string()),
            from: Some("usd".to_string()),
            to: Some("kgs".to_string()),
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Convert command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_app_flow_reports_network_failure() {
    let mock_server =
        test_utils::create_mock_server("USD", wiremock::ResponseTemplate::new(500)).await;
    let config_file = test_utils::write_config(&mock_server.uri());

    let result = xconv::run_command(
        xconv::AppCommand::Convert {
            amount: Some("100".to_string()),
            from: Some("USD".to_string()),
            to: Some("KGS".to_string()),
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;

    let err = result.expect_err("HTTP 500 should fail the conversion");
    assert_eq!(
        err.downcast_ref::<ConversionError>(),
        Some(&ConversionError::NetworkFailure)
    );
}

#[test_log::test(tokio::test)]
async fn test_app_flow_rejects_invalid_amount() {
    let config_file = test_utils::write_config("http://127.0.0.1:9");

    let result = xconv::run_command(
        xconv::AppCommand::Convert {
            amount: Some("-5".to_string()),
            from: None,
            to: None,
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;

    let err = result.expect_err("negative amount should be rejected");
    assert_eq!(
        err.downcast_ref::<ConversionError>(),
        Some(&ConversionError::InvalidAmount)
    );
}

#[test_log::test(tokio::test)]
async fn test_currencies_command() {
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    fs::write(
        config_file.path(),
        "currencies:\n  - code: CHF\n    name: Swiss Franc\n",
    )
    .expect("Failed to write config file");

    let result = xconv::run_command(
        xconv::AppCommand::Currencies,
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(result.is_ok());
}

#[test_log::test(tokio::test)]
async fn test_missing_config_file_fails() {
    let result =
        xconv::run_command(xconv::AppCommand::Currencies, Some("/no/such/config.yaml")).await;
    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
async fn test_controller_against_http_provider() {
    let mock_server = test_utils::create_mock_server(
        "USD",
        test_utils::rates_body("USD", r#""KGS": 87.45"#),
    )
    .await;
    let controller = controller_for(&mock_server.uri(), ConversionRequest::new("100", "USD", "KGS"));

    let result = controller.convert().await.expect("conversion should succeed");
    info!(?result, "Converted through HTTP provider");
    assert_eq!(result.converted_amount.to_string(), "8745.00");
    assert_eq!(result.rate, 87.45);
}

#[test_log::test(tokio::test)]
async fn test_controller_reports_missing_currency() {
    let mock_server = test_utils::create_mock_server(
        "USD",
        test_utils::rates_body("USD", r#""EUR": 0.9"#),
    )
    .await;
    let controller = controller_for(&mock_server.uri(), ConversionRequest::new("100", "USD", "KGS"));

    assert_eq!(
        controller.convert().await,
        Err(ConversionError::CurrencyNotFound("KGS".to_string()))
    );
}

#[test_log::test(tokio::test)]
async fn test_debounced_edits_reach_http_provider() {
    let mock_server = test_utils::create_mock_server(
        "EUR",
        test_utils::rates_body("EUR", r#""KGS": 95.0"#),
    )
    .await;
    let controller = controller_for(&mock_server.uri(), ConversionRequest::new("1", "USD", "KGS"));
    let mut updates = controller.subscribe();

    controller.set_source_currency("EUR");
    controller.set_amount("2");

    let settled = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            updates.changed().await.expect("controller alive");
            let status = updates.borrow_and_update().status.clone();
            if matches!(status, ConversionStatus::Succeeded(_) | ConversionStatus::Failed(_)) {
                return status;
            }
        }
    })
    .await
    .expect("conversion should settle");

    let result = settled.result().expect("conversion should succeed");
    assert_eq!(result.converted_amount.to_string(), "190.00");

    let requests = mock_server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
}
