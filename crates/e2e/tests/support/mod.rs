//! In-memory ServeRest served through wiremock
//!
//! Keeps a user table behind the `/usuarios` routes so flows that create
//! generated users can be followed end to end.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const USER_ID_ROUTE: &str = r"^/usuarios/[^/]+$";

#[derive(Clone, Default)]
pub struct UserStore {
    users: Arc<Mutex<Vec<Value>>>,
    created: Arc<Mutex<Vec<String>>>,
    next_id: Arc<AtomicUsize>,
    stale_updates: bool,
}

impl UserStore {
    /// Updates answer 200 but leave the record untouched
    pub fn with_stale_updates(mut self) -> Self {
        self.stale_updates = true;
        self
    }

    pub fn seed(&self, mut user: Value) {
        let id = self.next_id();
        user["_id"] = json!(id);
        self.users.lock().unwrap().push(user);
    }

    pub fn users(&self) -> Vec<Value> {
        self.users.lock().unwrap().clone()
    }

    pub fn find(&self, email: &str) -> Option<Value> {
        self.users().into_iter().find(|u| u["email"] == email)
    }

    /// Emails of users created through `POST /usuarios`, in order
    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    fn next_id(&self) -> String {
        format!("id-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    pub async fn mount(&self, server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Login realizado com sucesso",
                "authorization": "Bearer token"
            })))
            .mount(server)
            .await;

        let routes = [("POST", Route::Create), ("GET", Route::List)];
        for (verb, route) in routes {
            Mock::given(method(verb))
                .and(path("/usuarios"))
                .respond_with(self.responder(route))
                .mount(server)
                .await;
        }

        let routes = [
            ("GET", Route::Get),
            ("PUT", Route::Update),
            ("DELETE", Route::Delete),
        ];
        for (verb, route) in routes {
            Mock::given(method(verb))
                .and(path_regex(USER_ID_ROUTE))
                .respond_with(self.responder(route))
                .mount(server)
                .await;
        }
    }

    fn responder(&self, route: Route) -> StoreResponder {
        StoreResponder {
            store: self.clone(),
            route,
        }
    }
}

#[derive(Clone, Copy)]
enum Route {
    Create,
    List,
    Get,
    Update,
    Delete,
}

struct StoreResponder {
    store: UserStore,
    route: Route,
}

fn message(status: u16, text: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({ "message": text }))
}

fn user_id(request: &Request) -> String {
    request
        .url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default()
        .to_string()
}

impl Respond for StoreResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let store = &self.store;
        match self.route {
            Route::Create => {
                let mut user: Value = serde_json::from_slice(&request.body).unwrap();
                let email = user["email"].as_str().unwrap_or_default().to_string();
                if store.find(&email).is_some() {
                    return message(400, "Este email já está sendo usado");
                }
                let id = store.next_id();
                user["_id"] = json!(id);
                store.users.lock().unwrap().push(user);
                store.created.lock().unwrap().push(email);
                ResponseTemplate::new(201).set_body_json(json!({
                    "message": "Cadastro realizado com sucesso",
                    "_id": id
                }))
            }
            Route::List => {
                let filter = request
                    .url
                    .query_pairs()
                    .find(|(key, _)| key == "email")
                    .map(|(_, value)| value.into_owned());
                let users: Vec<Value> = store
                    .users()
                    .into_iter()
                    .filter(|u| filter.as_deref().map_or(true, |email| u["email"] == email))
                    .collect();
                ResponseTemplate::new(200).set_body_json(json!({
                    "quantidade": users.len(),
                    "usuarios": users
                }))
            }
            Route::Get => {
                let id = user_id(request);
                match store.users().into_iter().find(|u| u["_id"] == id.as_str()) {
                    Some(user) => ResponseTemplate::new(200).set_body_json(user),
                    None => message(400, "Usuário não encontrado"),
                }
            }
            Route::Update => {
                let id = user_id(request);
                let update: Value = serde_json::from_slice(&request.body).unwrap();
                let mut users = store.users.lock().unwrap();
                let Some(user) = users.iter_mut().find(|u| u["_id"] == id.as_str()) else {
                    return message(400, "Usuário não encontrado");
                };
                if !store.stale_updates {
                    for key in ["nome", "email", "password", "administrador"] {
                        user[key] = update[key].clone();
                    }
                }
                message(200, "Registro alterado com sucesso")
            }
            Route::Delete => {
                let id = user_id(request);
                let mut users = store.users.lock().unwrap();
                let before = users.len();
                users.retain(|u| u["_id"] != id.as_str());
                if users.len() < before {
                    message(200, "Registro excluído com sucesso")
                } else {
                    message(200, "Nenhum registro excluído")
                }
            }
        }
    }
}
