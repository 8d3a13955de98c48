//! CRUD flow against a mock ServeRest

mod support;

use std::time::Duration;

use serde_json::{json, Value};
use serverest_client::flow::CRUD_UPDATED_NAME;
use serverest_client::generate::CRUD_FLOW_PREFIX;
use serverest_client::{ApiClient, ClientConfig, ClientError, UserService, CRUD_FLOW_SUCCESS};
use serverest_common::{Credentials, User};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::UserStore;

const USER_ID: &str = "id-crud";

fn crud_user() -> User {
    User::new(
        "crud.completo Teste",
        "crud.completo.1700000000000@exemplo.com",
        "12345678",
        false,
    )
}

fn stored(user: &User, name: &str) -> Value {
    json!({
        "nome": name,
        "email": user.email,
        "password": user.password,
        "administrador": "true",
        "_id": USER_ID
    })
}

fn service_for(server: &MockServer) -> UserService {
    let client = ApiClient::new(ClientConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
    })
    .expect("build client")
    .with_credentials(Credentials {
        email: "qa.valid@exemplo.com".to_string(),
        password: "senha123".to_string(),
    });
    UserService::new(client)
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Login realizado com sucesso",
            "authorization": "Bearer token"
        })))
        .mount(server)
        .await;
}

/// Listing with the user present, filtered lookup answering `filtered`
async fn mount_lookups(server: &MockServer, user: &User, filtered: Value) {
    Mock::given(method("GET"))
        .and(path("/usuarios"))
        .and(query_param("email", user.email.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(filtered))
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/usuarios"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "quantidade": 1,
            "usuarios": [stored(user, &user.name)]
        })))
        .with_priority(5)
        .mount(server)
        .await;
}

async fn mount_create(server: &MockServer, user: &User) {
    Mock::given(method("POST"))
        .and(path("/usuarios"))
        .and(body_json(serde_json::to_value(user).unwrap()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Cadastro realizado com sucesso",
            "_id": USER_ID
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn empty_listing() -> Value {
    json!({ "quantidade": 0, "usuarios": [] })
}

#[tokio::test]
async fn crud_flow_runs_every_step_in_order() {
    let server = MockServer::start().await;
    let user = crud_user();

    mount_login(&server).await;
    mount_create(&server, &user).await;
    mount_lookups(&server, &user, empty_listing()).await;

    Mock::given(method("PUT"))
        .and(path("/usuarios/id-crud"))
        .and(body_json(json!({
            "nome": "User CRUD Updated",
            "email": user.email,
            "password": user.password,
            "administrador": "true"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Registro alterado com sucesso"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/usuarios/id-crud"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(stored(&user, "User CRUD Updated")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/usuarios/id-crud"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Registro excluído com sucesso"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let report = service_for(&server)
        .run_crud_flow(&user, true)
        .await
        .expect("crud flow");

    assert_eq!(report.message, CRUD_FLOW_SUCCESS);
    assert_eq!(report.user_id, USER_ID);
    assert_eq!(report.email, user.email);
    assert_eq!(report.updated_name, "User CRUD Updated");
}

#[tokio::test]
async fn crud_flow_stops_at_failed_update() {
    let server = MockServer::start().await;
    let user = crud_user();

    mount_login(&server).await;
    mount_create(&server, &user).await;
    mount_lookups(&server, &user, empty_listing()).await;

    Mock::given(method("PUT"))
        .and(path("/usuarios/id-crud"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Este email já está sendo usado"
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/usuarios/id-crud"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = service_for(&server)
        .run_crud_flow(&user, false)
        .await
        .unwrap_err();

    match err {
        ClientError::UnexpectedStatus { step, expected, actual, .. } => {
            assert_eq!(step, "update user");
            assert_eq!(expected, 200);
            assert_eq!(actual, 400);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn crud_flow_detects_stale_read_back() {
    let server = MockServer::start().await;
    let user = crud_user();

    mount_login(&server).await;
    mount_create(&server, &user).await;
    mount_lookups(&server, &user, empty_listing()).await;

    Mock::given(method("PUT"))
        .and(path("/usuarios/id-crud"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/usuarios/id-crud"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stored(&user, &user.name)))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/usuarios/id-crud"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = service_for(&server)
        .run_crud_flow(&user, true)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Assertion(_)));
}

#[tokio::test]
async fn crud_flow_fails_when_user_survives_delete() {
    let server = MockServer::start().await;
    let user = crud_user();

    mount_login(&server).await;
    mount_create(&server, &user).await;
    mount_lookups(
        &server,
        &user,
        json!({ "quantidade": 1, "usuarios": [stored(&user, &user.name)] }),
    )
    .await;

    Mock::given(method("PUT"))
        .and(path("/usuarios/id-crud"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/usuarios/id-crud"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Nenhum registro excluído"
        })))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .run_crud_flow(&user, false)
        .await
        .unwrap_err();
    match err {
        ClientError::Assertion(msg) => assert!(msg.contains("still exists")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn crud_flow_fails_fast_when_create_is_rejected() {
    let server = MockServer::start().await;
    let user = crud_user();

    Mock::given(method("POST"))
        .and(path("/usuarios"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Este email já está sendo usado"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/usuarios"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_listing()))
        .expect(0)
        .mount(&server)
        .await;

    let err = service_for(&server)
        .run_crud_flow(&user, false)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::UnexpectedStatus { expected: 201, actual: 400, .. }));
}

#[tokio::test]
async fn register_user_returns_message() {
    let server = MockServer::start().await;
    let user = crud_user();
    mount_create(&server, &user).await;

    let message = service_for(&server).register_user(&user).await.unwrap();
    assert!(message.contains("sucesso"));
}

#[tokio::test]
async fn ensure_user_exists_skips_existing_user() {
    let server = MockServer::start().await;
    let user = crud_user();

    Mock::given(method("GET"))
        .and(path("/usuarios"))
        .and(query_param("email", user.email.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "quantidade": 1,
            "usuarios": [stored(&user, &user.name)]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/usuarios"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let created = service_for(&server).ensure_user_exists(&user).await.unwrap();
    assert!(!created);
}

#[tokio::test]
async fn ensure_user_exists_creates_missing_user() {
    let server = MockServer::start().await;
    let user = crud_user();

    Mock::given(method("GET"))
        .and(path("/usuarios"))
        .and(query_param("email", user.email.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_listing()))
        .mount(&server)
        .await;
    mount_create(&server, &user).await;

    let created = service_for(&server).ensure_user_exists(&user).await.unwrap();
    assert!(created);
}

#[tokio::test]
async fn ensure_user_absent_deletes_exact_match() {
    let server = MockServer::start().await;
    let user = crud_user();

    mount_login(&server).await;
    mount_lookups(
        &server,
        &user,
        json!({ "quantidade": 1, "usuarios": [stored(&user, &user.name)] }),
    )
    .await;
    Mock::given(method("DELETE"))
        .and(path("/usuarios/id-crud"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Registro excluído com sucesso"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let deleted = service_for(&server)
        .ensure_user_absent(&user.email)
        .await
        .unwrap();
    assert!(deleted);
}

#[tokio::test]
async fn ensure_user_absent_is_noop_when_missing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/usuarios"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_listing()))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let deleted = service_for(&server)
        .ensure_user_absent("ghost@exemplo.com")
        .await
        .unwrap();
    assert!(!deleted);
}

#[tokio::test]
async fn perform_crud_flow_uses_generated_prefixed_user() {
    let server = MockServer::start().await;
    let store = UserStore::default();
    store.mount(&server).await;

    let report = service_for(&server)
        .perform_crud_flow(CRUD_FLOW_PREFIX)
        .await
        .expect("crud flow");

    assert_eq!(report.message, CRUD_FLOW_SUCCESS);
    assert_eq!(report.updated_name, CRUD_UPDATED_NAME);
    assert!(report.email.starts_with("crud.completo."), "{}", report.email);
    assert!(report.email.ends_with("@exemplo.com"), "{}", report.email);
    assert_eq!(store.created(), vec![report.email.clone()]);
    assert!(store.users().is_empty());
}

#[tokio::test]
async fn perform_crud_flow_generates_a_new_user_each_run() {
    let server = MockServer::start().await;
    let store = UserStore::default();
    store.mount(&server).await;
    let service = service_for(&server);

    let first = service.perform_crud_flow(CRUD_FLOW_PREFIX).await.unwrap();
    let second = service.perform_crud_flow(CRUD_FLOW_PREFIX).await.unwrap();

    assert_ne!(first.email, second.email);
    assert_eq!(store.created().len(), 2);
}

#[tokio::test]
async fn perform_verified_crud_flow_reads_back_new_name() {
    let server = MockServer::start().await;
    let store = UserStore::default();
    store.mount(&server).await;

    let report = service_for(&server)
        .perform_verified_crud_flow(CRUD_FLOW_PREFIX)
        .await
        .expect("verified crud flow");

    assert_eq!(report.message, CRUD_FLOW_SUCCESS);
    assert!(report.email.starts_with("crud.completo."));
    assert!(store.find(&report.email).is_none());
}

#[tokio::test]
async fn perform_verified_crud_flow_keeps_user_when_update_is_lost() {
    let server = MockServer::start().await;
    let store = UserStore::default().with_stale_updates();
    store.mount(&server).await;
    let service = service_for(&server);

    // Without the read-back the lost update goes unnoticed.
    service.perform_crud_flow(CRUD_FLOW_PREFIX).await.unwrap();

    let err = service
        .perform_verified_crud_flow(CRUD_FLOW_PREFIX)
        .await
        .unwrap_err();
    match err {
        ClientError::Assertion(msg) => assert!(msg.contains(CRUD_UPDATED_NAME), "{msg}"),
        other => panic!("unexpected error: {other}"),
    }

    let created = store.created();
    assert_eq!(created.len(), 2);
    assert!(store.find(&created[1]).is_some());
}
