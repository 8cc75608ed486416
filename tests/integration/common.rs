use sf_rest_lite::transport::{HttpRequest, ReqwestTransport, Transport};
use sf_rest_lite::{ClientConfiguration, RestClient};

/// Build a client for integration tests from the environment.
///
/// **IMPORTANT**: these tests run against a real org. Missing
/// `SF_INSTANCE_URL` / `SF_ACCESS_TOKEN` is a configuration error, not a
/// reason to skip.
pub fn client() -> RestClient {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let config = ClientConfiguration::from_env().unwrap_or_else(|e| {
        panic!(
            "\n\nINTEGRATION TEST CONFIGURATION ERROR: {e}\n\
             Export SF_INSTANCE_URL and SF_ACCESS_TOKEN (e.g. from `sf org display --verbose`).\n\n"
        )
    });
    RestClient::new(config).expect("Failed to create REST client")
}

/// Read a response body and parse it as JSON.
pub fn json(body: impl std::io::Read) -> serde_json::Value {
    serde_json::from_reader(body).expect("response body is not JSON")
}

/// Delete a record created by a test. The REST client has no delete call,
/// so this goes straight through a transport with the client's token.
pub fn delete_record(client: &RestClient, sobject: &str, id: &str) {
    let config = client.configuration();
    let url = format!("{}/sobjects/{sobject}/{id}", client.versioned_base_url());
    let response = ReqwestTransport::default_transport()
        .expect("Failed to create transport")
        .execute(HttpRequest::delete(url).bearer_auth(config.access_token()))
        .expect("delete request failed");
    assert!(
        response.is_success(),
        "cleanup of {sobject} {id} failed with status {}",
        response.status()
    );
}
