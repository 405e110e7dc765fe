//! End-to-end tests against a served router.

use std::fs;

use control_plane::resolver::ResolverDocument;
use control_plane::services::ServiceName;
use reqwest::multipart;
use reqwest::StatusCode;

mod common;
use common::{Appliance, CADDYFILE, LOCAL_REGISTRY_URI, RESOLVER};

const KEY: &str = "123e4567-e89b-12d3-a456-426614174000";

fn enrichment_form(filename: &str, body: &'static [u8]) -> multipart::Form {
    multipart::Form::new().part(
        "enrichmentjson",
        multipart::Part::bytes(body).file_name(filename.to_string()),
    )
}

#[tokio::test]
async fn test_enrichment_upload() {
    let appliance = Appliance::new();
    let server = appliance.serve().await;
    let body: &'static [u8] = b"{\n  \"schema\": \"iglu:com.acme/x/jsonschema/1-0-0\",\n  \"data\": {}\n}\n";

    let res = server
        .client
        .post(server.url("/enrichments"))
        .multipart(enrichment_form("x.json", body))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "uploaded successfully");
    assert_eq!(fs::read(appliance.config.enrichment_path("x.json")).unwrap(), body);
    assert_eq!(appliance.services.calls(), vec![ServiceName::EnrichmentEngine]);
}

#[tokio::test]
async fn test_invalid_enrichment_is_rejected() {
    let appliance = Appliance::new();
    let server = appliance.serve().await;

    let res = server
        .client
        .post(server.url("/enrichments"))
        .multipart(enrichment_form("x.json", b"{\"enabled\": tru"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(!appliance.config.enrichment_path("x.json").exists());
    assert!(appliance.services.calls().is_empty());
}

#[tokio::test]
async fn test_missing_multipart_field_is_bad_request() {
    let appliance = Appliance::new();
    let server = appliance.serve().await;

    let form = multipart::Form::new().part(
        "somethingelse",
        multipart::Part::bytes(&b"{}"[..]).file_name("x.json"),
    );
    let res = server
        .client
        .post(server.url("/enrichments"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(appliance.services.calls().is_empty());
}

#[tokio::test]
async fn test_iglu_config_upload() {
    let appliance = Appliance::new();
    let server = appliance.serve().await;
    let conf: &'static [u8] = b"repo-server {\n  port = 9090\n}\n";

    let form = multipart::Form::new().part(
        "igluserverhocon",
        multipart::Part::bytes(conf).file_name("iglu-server.conf"),
    );
    let res = server
        .client
        .post(server.url("/iglu-config"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        fs::read(appliance.config.registry_server_config_path()).unwrap(),
        conf
    );
    assert_eq!(appliance.services.calls(), vec![ServiceName::RegistryServer]);
}

#[tokio::test]
async fn test_external_iglu_rejects_bad_priority() {
    let appliance = Appliance::new();
    let server = appliance.serve().await;

    let res = server
        .client
        .post(server.url("/external-iglu"))
        .form(&[
            ("vendor_prefix", "com.acme"),
            ("uri", "https://registry.acme.com/api"),
            ("name", "Acme"),
            ("priority", "abc"),
            ("apikey", KEY),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(appliance.read(appliance.resolver_path()), RESOLVER);
    assert!(appliance.services.calls().is_empty());
}

#[tokio::test]
async fn test_external_iglu_added() {
    let appliance = Appliance::new();
    let server = appliance.serve().await;

    let res = server
        .client
        .post(server.url("/external-iglu"))
        .form(&[
            ("vendor_prefix", "com.acme"),
            ("uri", "https://registry.acme.com/api"),
            ("name", "Acme"),
            ("priority", "5"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "added successfully");

    let doc = ResolverDocument::load(&appliance.resolver_path()).unwrap();
    let added = &doc.repositories().unwrap()[2];
    assert_eq!(added["name"], "Acme");
    assert_eq!(added["priority"], 5);
    assert_eq!(added["vendorPrefixes"][0], "com.acme");
    assert_eq!(added["connection"]["http"]["uri"], "https://registry.acme.com/api");
    assert_eq!(appliance.services.calls(), vec![ServiceName::EnrichmentEngine]);
}

#[tokio::test]
async fn test_local_iglu_apikey() {
    let appliance = Appliance::new();
    let server = appliance.serve().await;

    let res = server
        .client
        .post(server.url("/local-iglu-apikey"))
        .form(&[("local_iglu_apikey", KEY)])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "added successfully");
    let doc = ResolverDocument::load(&appliance.resolver_path()).unwrap();
    assert_eq!(doc.local_registry_api_key(LOCAL_REGISTRY_URI).unwrap(), Some(KEY));
    assert_eq!(appliance.keys.keys(), vec![KEY.to_string()]);
    assert_eq!(appliance.services.calls(), vec![ServiceName::EnrichmentEngine]);
}

#[tokio::test]
async fn test_local_iglu_apikey_datastore_down() {
    let appliance = Appliance::new();
    appliance.keys.set_failing(true);
    let server = appliance.serve().await;

    let res = server
        .client
        .post(server.url("/local-iglu-apikey"))
        .form(&[("local_iglu_apikey", KEY)])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(appliance.read(appliance.resolver_path()), RESOLVER);
    assert!(appliance.services.calls().is_empty());
}

#[tokio::test]
async fn test_local_iglu_apikey_must_be_uuid() {
    let appliance = Appliance::new();
    let server = appliance.serve().await;

    let res = server
        .client
        .post(server.url("/local-iglu-apikey"))
        .form(&[("local_iglu_apikey", "not-a-uuid")])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(appliance.read(appliance.resolver_path()), RESOLVER);
}

#[tokio::test]
async fn test_credentials_changed() {
    let appliance = Appliance::new();
    let server = appliance.serve().await;

    let res = server
        .client
        .post(server.url("/credentials"))
        .form(&[("new_username", "admin"), ("new_password", "hunter22")])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "changed successfully");
    let expected = CADDYFILE.replace(
        "basicauth \"USERNAME_PLACEHOLDER\" PASSWORD_PLACEHOLDER {",
        "basicauth admin hunter22 {",
    );
    assert_eq!(appliance.read(appliance.proxy_config_path()), expected);
    assert_eq!(appliance.services.calls(), vec![ServiceName::ReverseProxy]);
}

#[tokio::test]
async fn test_credentials_missing_field() {
    let appliance = Appliance::new();
    let server = appliance.serve().await;

    let res = server
        .client
        .post(server.url("/credentials"))
        .form(&[("new_username", "admin")])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(appliance.read(appliance.proxy_config_path()), CADDYFILE);
}

#[tokio::test]
async fn test_invalid_domain_is_method_not_allowed() {
    let appliance = Appliance::new();
    let server = appliance.serve().await;

    let res = server
        .client
        .post(server.url("/domain-name"))
        .form(&[("domain_name", "bad domain")])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(appliance.read(appliance.proxy_config_path()), CADDYFILE);
    assert!(appliance.services.calls().is_empty());
}

#[tokio::test]
async fn test_domain_name_changed() {
    let appliance = Appliance::new();
    let server = appliance.serve().await;

    let res = server
        .client
        .post(server.url("/domain-name"))
        .form(&[("domain_name", "analytics.example.com")])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let expected = CADDYFILE.replacen("*:80 {", "analytics.example.com {", 1);
    assert_eq!(appliance.read(appliance.proxy_config_path()), expected);
    assert_eq!(appliance.services.calls(), vec![ServiceName::ReverseProxy]);
}

#[tokio::test]
async fn test_restart_failure_is_server_error() {
    let appliance = Appliance::new();
    appliance.services.set_failing(true);
    let server = appliance.serve().await;

    let res = server
        .client
        .post(server.url("/domain-name"))
        .form(&[("domain_name", "analytics.example.com")])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(appliance
        .read(appliance.proxy_config_path())
        .starts_with("analytics.example.com {"));
}

#[tokio::test]
async fn test_restart_services() {
    let appliance = Appliance::new();
    let server = appliance.serve().await;

    let res = server
        .client
        .put(server.url("/restart-services"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        appliance.services.calls(),
        vec![
            ServiceName::RegistryServer,
            ServiceName::EnrichmentEngine,
            ServiceName::ReverseProxy,
        ]
    );
}

#[tokio::test]
async fn test_version() {
    let appliance = Appliance::new();
    let server = appliance.serve().await;

    let res = server.client.get(server.url("/version")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), common::VERSION);
}

#[tokio::test]
async fn test_wrong_method_is_not_found() {
    let appliance = Appliance::new();
    let server = appliance.serve().await;

    let res = server.client.get(server.url("/credentials")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.client.post(server.url("/version")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .client
        .get(server.url("/restart-services"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(appliance.services.calls().is_empty());
}

#[tokio::test]
async fn test_bearer_token_required_when_configured() {
    let mut appliance = Appliance::new();
    appliance.config.admin.api_key = Some("operator-token".into());
    let server = appliance.serve().await;

    let res = server.client.get(server.url("/version")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server
        .client
        .put(server.url("/restart-services"))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(appliance.services.calls().is_empty());

    let res = server
        .client
        .get(server.url("/version"))
        .bearer_auth("operator-token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let appliance = Appliance::new();
    let server = appliance.serve().await;

    let res = server.client.get(server.url("/version")).send().await.unwrap();

    assert!(res.headers().contains_key("x-request-id"));
}
