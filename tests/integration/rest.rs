//! REST integration tests against a live org.

use super::common::{client, delete_record, json};

fn record_count(page: &serde_json::Value) -> u64 {
    page["records"].as_array().map_or(0, Vec::len) as u64
}

#[test]
#[ignore = "requires SF_INSTANCE_URL and SF_ACCESS_TOKEN"]
fn test_describe_account() {
    let client = client();
    let describe = json(client.describe("Account").expect("describe failed"));

    assert_eq!(describe["name"], "Account");
    assert!(describe["fields"].as_array().is_some_and(|f| !f.is_empty()));
}

#[test]
#[ignore = "requires SF_INSTANCE_URL and SF_ACCESS_TOKEN"]
fn test_query_and_follow_pages() {
    let client = client();
    let mut page = json(client.query("SELECT Id FROM User").expect("query failed"));
    let total = page["totalSize"].as_u64().unwrap_or_default();
    let mut seen = record_count(&page);

    while let Some(next) = page["nextRecordsUrl"].as_str().map(str::to_string) {
        page = json(client.next_page(&next).expect("next page failed"));
        seen += record_count(&page);
    }

    assert_eq!(seen, total);
}

#[test]
#[ignore = "requires SF_INSTANCE_URL and SF_ACCESS_TOKEN"]
fn test_bad_query_is_rejected() {
    let client = client();
    let err = client
        .query("SELECT NoSuchField__zz FROM Account")
        .expect_err("query should be rejected");

    assert!(err.is_rejected());
    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("INVALID_FIELD"));
}

#[test]
#[ignore = "requires SF_INSTANCE_URL and SF_ACCESS_TOKEN"]
fn test_composite_tree_create() {
    let client = client();
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let name = format!("SfRestLiteIntTest {stamp}");
    let payload = serde_json::json!({
        "records": [{
            "attributes": {"type": "Account", "referenceId": "ref1"},
            "Name": name
        }]
    });

    client
        .post_composite("Account", payload.to_string())
        .expect("composite tree create failed");

    // The composite response is discarded, so find the record by name.
    let soql = format!("SELECT Id FROM Account WHERE Name = '{name}'");
    let found = json(client.query(&soql).expect("account lookup failed"));
    let ids: Vec<String> = found["records"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|r| r["Id"].as_str().map(str::to_string))
        .collect();
    assert_eq!(ids.len(), 1, "created account not found: {found}");

    for id in &ids {
        delete_record(&client, "Account", id);
    }
}
