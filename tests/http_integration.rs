//! Integration tests for the Solum resource managers using wiremock
//!
//! These tests verify request shapes, envelope handling, name-or-UUID
//! resolution and error mapping against mocked endpoints.

use serde_json::json;
use solum::api::{AuthOptions, HttpClient, HttpOptions, SolumClient};
use solum::resource::Lookup;
use solum::Error;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const APP_UUID: &str = "2c3c4e3a-8f3a-4a3e-9d3b-0d6f1b2a7c11";

fn client_for(server: &MockServer) -> SolumClient {
    let http = HttpClient::new(&HttpOptions::default()).unwrap();
    SolumClient::with_endpoint(&server.uri(), Some("test-token"), http)
}

fn foo_bar() -> serde_json::Value {
    json!([
        {"uuid": "11111111-1111-4111-8111-111111111111", "name": "foo", "status": "READY"},
        {"uuid": "22222222-2222-4222-8222-222222222222", "name": "bar", "status": "BUILDING"}
    ])
}

/// Test module for CRUD requests
mod crud_tests {
    use super::*;

    /// List sends the token and unwraps a keyed envelope in server order
    #[tokio::test]
    async fn test_list_unwraps_keyed_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/assemblies"))
            .and(header("X-Auth-Token", "test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"assemblies": foo_bar()})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let assemblies = client.manager("assembly").unwrap().list(&[]).await.unwrap();

        let names: Vec<_> = assemblies.iter().filter_map(|a| a.name()).collect();
        assert_eq!(names, vec!["foo", "bar"]);
    }

    /// List filters become query parameters
    #[tokio::test]
    async fn test_list_filters_are_query_parameters() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/assemblies"))
            .and(query_param("status", "READY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"values": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let assemblies = client
            .manager("assembly")
            .unwrap()
            .list(&[("status", "READY")])
            .await
            .unwrap();

        assert!(assemblies.is_empty());
    }

    /// A created resource reads back with the same fields
    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let server = MockServer::start().await;
        let created = json!({
            "uuid": "33333333-3333-4333-8333-333333333333",
            "name": "ghost",
            "plan_uri": "http://solum/v1/plans/p-1",
            "status": "QUEUED"
        });

        Mock::given(method("POST"))
            .and(path("/v1/assemblies"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(json!({"name": "ghost", "plan_uri": "http://solum/v1/plans/p-1"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(&created))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/assemblies/33333333-3333-4333-8333-333333333333"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&created))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let assemblies = client.manager("assembly").unwrap();
        let assembly = assemblies
            .create(&json!({"name": "ghost", "plan_uri": "http://solum/v1/plans/p-1"}))
            .await
            .unwrap();
        let fetched = assemblies.get(assembly.uuid().unwrap()).await.unwrap();

        assert_eq!(assembly, fetched);
        assert_eq!(fetched.get_str("status"), Some("QUEUED"));
    }

    /// Single resources wrapped in their singular key are unwrapped
    #[tokio::test]
    async fn test_get_unwraps_singular_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/v1/apps/{}", APP_UUID)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"app": {"id": APP_UUID, "name": "ghost"}})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let app = client.manager("app").unwrap().get(APP_UUID).await.unwrap();

        assert_eq!(app.id(), Some(APP_UUID));
        assert_eq!(app.name(), Some("ghost"));
    }

    /// Plans are sent as YAML and YAML responses decode
    #[tokio::test]
    async fn test_plan_create_sends_yaml() {
        let server = MockServer::start().await;
        let definition = "version: 1\nname: ex1\nartifacts: []\n";

        Mock::given(method("POST"))
            .and(path("/v1/plans"))
            .and(header("Content-Type", "x-application/yaml"))
            .respond_with(ResponseTemplate::new(201).set_body_raw(
                "uuid: 44444444-4444-4444-8444-444444444444\nname: ex1\nuri: http://solum/v1/plans/ex1\n",
                "x-application/yaml",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let plan = client
            .manager("plan")
            .unwrap()
            .create_document(definition)
            .await
            .unwrap();

        assert_eq!(plan.name(), Some("ex1"));
        assert_eq!(plan.uri(), Some("http://solum/v1/plans/ex1"));

        let requests = server.received_requests().await.unwrap();
        assert_eq!(String::from_utf8_lossy(&requests[0].body), definition);
    }

    /// An unparseable plan body is a decode error naming the kind
    #[tokio::test]
    async fn test_plan_garbage_body_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/plans/p-1"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{: [", "x-application/yaml"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.manager("plan").unwrap().get("p-1").await.unwrap_err();

        match err {
            Error::Decode(msg) => assert!(msg.starts_with("Could not load Plan. Reason:")),
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    /// Deleting twice fails the second time
    #[tokio::test]
    async fn test_delete_is_not_idempotent() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/v1/assemblies/a-1"))
            .respond_with(ResponseTemplate::new(204))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/v1/assemblies/a-1"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"faultstring": "Assembly a-1 not found"})),
            )
            .with_priority(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let assemblies = client.manager("assembly").unwrap();

        assemblies.delete("a-1").await.unwrap();
        let err = assemblies.delete("a-1").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(msg) if msg == "Assembly a-1 not found"));
    }

    /// Updates use PUT, partial updates PATCH, plans stay YAML
    #[tokio::test]
    async fn test_update_and_patch() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/v1/pipelines/p-1"))
            .and(body_json(json!({"name": "renamed"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"uuid": "p-1", "name": "renamed"})))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .and(path("/v1/apps/a-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "a-1", "description": "new"})))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/v1/plans/ex1"))
            .and(header("Content-Type", "x-application/yaml"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("uuid: ex1\nname: ex1\n", "x-application/yaml"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);

        let pipeline = client
            .manager("pipeline")
            .unwrap()
            .update("p-1", &json!({"name": "renamed"}))
            .await
            .unwrap();
        assert_eq!(pipeline.name(), Some("renamed"));

        let app = client
            .manager("app")
            .unwrap()
            .patch("a-1", &json!({"description": "new"}))
            .await
            .unwrap();
        assert_eq!(app.get_str("description"), Some("new"));

        let plan = client
            .manager("plan")
            .unwrap()
            .update_document("ex1", "name: ex1\n")
            .await
            .unwrap();
        assert_eq!(plan.uuid(), Some("ex1"));
    }

    /// Language pack logs come from the item's logs collection
    #[tokio::test]
    async fn test_logs_endpoint() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/language_packs/lp-1/logs/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"created_at": "2015-01-01T00:00:00", "message": "build started"},
                {"created_at": "2015-01-01T00:01:00", "message": "build finished"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let logs = client.manager("languagepack").unwrap().logs("lp-1").await.unwrap();

        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].get_str("message"), Some("build finished"));
    }
}

/// Test module for name-or-UUID resolution
mod find_tests {
    use super::*;

    /// A UUID is fetched directly and never lists
    #[tokio::test]
    async fn test_find_by_uuid_never_lists() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/assemblies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(foo_bar()))
            .expect(0)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/assemblies/11111111-1111-4111-8111-111111111111"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "uuid": "11111111-1111-4111-8111-111111111111",
                "name": "foo"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let found = client
            .manager("assembly")
            .unwrap()
            .find(Lookup::NameOrId("11111111-1111-4111-8111-111111111111"))
            .await
            .unwrap();

        assert_eq!(found.name(), Some("foo"));
    }

    /// A name costs exactly one list
    #[tokio::test]
    async fn test_find_by_name_lists_once() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/assemblies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(foo_bar()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let found = client
            .manager("assembly")
            .unwrap()
            .find(Lookup::NameOrId("bar"))
            .await
            .unwrap();

        assert_eq!(found.uuid(), Some("22222222-2222-4222-8222-222222222222"));
    }

    /// A dedicated identifier is a direct get even when it looks like a name
    #[tokio::test]
    async fn test_find_by_id_is_direct() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/language_packs/python"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"uuid": "lp-1", "name": "python"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let found = client
            .manager("languagepack")
            .unwrap()
            .find(Lookup::Id("python"))
            .await
            .unwrap();

        assert_eq!(found.uuid(), Some("lp-1"));
    }

    /// Zero matches is NotFound with the criteria in the message
    #[tokio::test]
    async fn test_find_no_match() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/assemblies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(foo_bar()))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .manager("assembly")
            .unwrap()
            .find(Lookup::NameOrId("baz"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotFound(msg) if msg == "No Assembly matching name=baz."));
    }

    /// Two matches is never resolved to the first
    #[tokio::test]
    async fn test_find_ambiguous_name() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/apps"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "a-1", "name": "dup"},
                {"id": "a-2", "name": "dup"}
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .manager("app")
            .unwrap()
            .find(Lookup::NameOrId("dup"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotUnique(_)));
        assert_eq!(err.to_string(), "More than one App by that name. Retry with the UUID.");
    }

    /// findall keeps exact matches only
    #[tokio::test]
    async fn test_findall_filters_exactly() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/assemblies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "assemblies": [
                    {"name": "foo", "status": "READY"},
                    {"name": "bar"},
                    {"name": "baz", "status": "READY"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let ready = client
            .manager("assembly")
            .unwrap()
            .findall(&[("status", "READY")])
            .await
            .unwrap();

        let names: Vec<_> = ready.iter().filter_map(|a| a.name()).collect();
        assert_eq!(names, vec!["foo", "baz"]);
    }

    /// Workflows live under their app and resolve by revision
    #[tokio::test]
    async fn test_workflow_resolves_by_revision() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/v1/apps/{}/workflows", APP_UUID)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "wf-a", "wf_id": 1, "status": "SUCCESS"},
                {"id": "wf-b", "wf_id": 2, "status": "BUILDING"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let workflow = client
            .workflows(APP_UUID)
            .unwrap()
            .find(Lookup::NameOrId("2"))
            .await
            .unwrap();

        assert_eq!(workflow.id(), Some("wf-b"));
    }

    /// Deploys POST the actions to the app's workflow collection
    #[tokio::test]
    async fn test_workflow_create() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(format!("/v1/apps/{}/workflows", APP_UUID)))
            .and(body_json(json!({"actions": ["build", "deploy"]})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "wf-c", "wf_id": 3, "actions": ["build", "deploy"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let workflow = client
            .workflows(APP_UUID)
            .unwrap()
            .create(&json!({"actions": ["build", "deploy"]}))
            .await
            .unwrap();

        assert_eq!(workflow.display("wf_id"), "3");
    }
}

/// Test module for HTTP error mapping
mod error_tests {
    use super::*;

    /// 404 on get is NotFound
    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/components/c-1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.manager("component").unwrap().get("c-1").await.unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
    }

    /// 409 on create is Conflict carrying the fault message
    #[tokio::test]
    async fn test_duplicate_create_is_conflict() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/apps"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "faultstring": "App ghost already exists",
                "debuginfo": null
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .manager("app")
            .unwrap()
            .create(&json!({"name": "ghost"}))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Conflict(msg) if msg == "App ghost already exists"));
    }

    /// 400 is Validation
    #[tokio::test]
    async fn test_bad_request_is_validation() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/pipelines"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "faultstring": "Missing workbook_name"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .manager("pipeline")
            .unwrap()
            .create(&json!({"name": "p"}))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(msg) if msg == "Missing workbook_name"));
    }

    /// A text body on 400 is the message, not the bare reason phrase
    #[tokio::test]
    async fn test_bad_request_text_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/plans"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Plan is missing artifacts"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .manager("plan")
            .unwrap()
            .create_document("name: ex1\n")
            .await
            .unwrap_err();

        assert!(matches!(&err, Error::Validation(msg) if msg == "Plan is missing artifacts"));
        assert_ne!(err.to_string(), "Bad Request");
    }

    /// debuginfo survives the mapping to NotFound
    #[tokio::test]
    async fn test_not_found_keeps_debuginfo() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/assemblies/a-9"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "faultstring": "Assembly a-9 not found",
                "debuginfo": "trace-123"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.manager("assembly").unwrap().get("a-9").await.unwrap_err();

        assert!(matches!(&err, Error::NotFound(msg) if msg.starts_with("Assembly a-9 not found")));
        assert!(err.to_string().contains("trace-123"));
    }

    /// 5xx is Server with text bodies kept as details
    #[tokio::test]
    async fn test_server_error_keeps_details() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/plans"))
            .respond_with(ResponseTemplate::new(503).set_body_string("backend down"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.manager("plan").unwrap().list(&[]).await.unwrap_err();

        match err {
            Error::Server(fault) => {
                assert_eq!(fault.status, 503);
                assert_eq!(fault.details.as_deref(), Some("backend down"));
            }
            other => panic!("expected Server, got {other:?}"),
        }
    }

    /// 401 is an authentication failure
    #[tokio::test]
    async fn test_unauthorized_is_auth() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/apps"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.manager("app").unwrap().list(&[]).await.unwrap_err();

        assert!(matches!(err, Error::Auth(_)));
    }
}

/// Test module for Keystone authentication
mod auth_tests {
    use super::*;

    /// v3 takes the token from the header and the endpoint from the catalog
    #[tokio::test]
    async fn test_keystone_v3_authentication() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v3/auth/tokens"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("X-Subject-Token", "v3-token")
                    .set_body_json(json!({
                        "token": {
                            "catalog": [
                                {
                                    "type": "identity",
                                    "endpoints": [{"interface": "public", "url": "http://keystone"}]
                                },
                                {
                                    "type": "application_deployment",
                                    "endpoints": [
                                        {"interface": "admin", "url": "http://admin-solum"},
                                        {"interface": "public", "region": "RegionOne", "url": server.uri()}
                                    ]
                                }
                            ]
                        }
                    })),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/plans"))
            .and(header("X-Auth-Token", "v3-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let auth = AuthOptions {
            auth_url: Some(format!("{}/v3", server.uri())),
            username: Some("demo".to_string()),
            password: Some("secret".to_string()),
            tenant_name: Some("demo".to_string()),
            ..Default::default()
        };

        let client = SolumClient::connect(&auth, &HttpOptions::default(), "1")
            .await
            .unwrap();
        assert_eq!(client.endpoint(), server.uri());

        let plans = client.manager("plan").unwrap().list(&[]).await.unwrap();
        assert!(plans.is_empty());
    }

    /// v2 reads the token and catalog from the access document
    #[tokio::test]
    async fn test_keystone_v2_authentication() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2.0/tokens"))
            .and(body_json(json!({
                "auth": {
                    "passwordCredentials": {"username": "demo", "password": "secret"},
                    "tenantName": "demo"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access": {
                    "token": {"id": "v2-token"},
                    "serviceCatalog": [{
                        "type": "application_deployment",
                        "endpoints": [{"publicURL": "http://solum:9777", "region": "RegionOne"}]
                    }]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let auth = AuthOptions {
            auth_url: Some(format!("{}/v2.0", server.uri())),
            username: Some("demo".to_string()),
            password: Some("secret".to_string()),
            tenant_name: Some("demo".to_string()),
            ..Default::default()
        };

        let client = SolumClient::connect(&auth, &HttpOptions::default(), "1")
            .await
            .unwrap();
        assert_eq!(client.endpoint(), "http://solum:9777");
    }

    /// Token plus endpoint skips Keystone entirely
    #[tokio::test]
    async fn test_token_and_endpoint_skip_keystone() {
        let auth = AuthOptions {
            token: Some("tok".to_string()),
            endpoint: Some("http://solum:9777".to_string()),
            ..Default::default()
        };

        let client = SolumClient::connect(&auth, &HttpOptions::default(), "1")
            .await
            .unwrap();
        assert_eq!(client.endpoint(), "http://solum:9777");
    }

    /// Missing credentials are reported before any request
    #[tokio::test]
    async fn test_missing_credentials() {
        let auth = AuthOptions {
            username: Some("demo".to_string()),
            ..Default::default()
        };

        let err = SolumClient::connect(&auth, &HttpOptions::default(), "1")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Auth(msg) if msg.contains("password")));
    }
}
