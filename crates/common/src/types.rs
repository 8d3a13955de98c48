//! Core types for the ServeRest user resource
//!
//! The remote API speaks Portuguese on the wire (`nome`, `administrador`,
//! `usuarios`, `quantidade`) and encodes the admin flag as a string. The
//! Rust side uses English field names and a plain `bool`.

use serde::{Deserialize, Serialize};

/// A user record as sent to and returned by `/usuarios`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "nome")]
    pub name: String,

    /// Natural key across every lookup
    pub email: String,

    pub password: String,

    #[serde(rename = "administrador", with = "admin_flag")]
    pub is_admin: bool,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        is_admin: bool,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            is_admin,
        }
    }

    /// The credential pair used to log in as this user
    pub fn credentials(&self) -> Credentials {
        Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

/// A user as listed by the API, with its server-assigned id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(flatten)]
    pub user: User,
}

/// Email/password pair exchanged for a bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Body of `GET /usuarios`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserList {
    #[serde(rename = "quantidade", default)]
    pub count: usize,

    #[serde(rename = "usuarios", default)]
    pub users: Vec<StoredUser>,
}

impl UserList {
    /// Exact email match over the full listing
    pub fn find_by_email(&self, email: &str) -> Option<&StoredUser> {
        self.users.iter().find(|u| u.user.email == email)
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Body of `POST /login`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,

    /// Present only on success, already prefixed with `Bearer `
    #[serde(default)]
    pub authorization: Option<String>,
}

/// Generic `{ message, _id? }` body returned by the mutation endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,

    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// The API encodes `administrador` as `"true"` / `"false"`
mod admin_flag {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "true" } else { "false" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Flag {
            Bool(bool),
            Text(String),
        }

        match Flag::deserialize(deserializer)? {
            Flag::Bool(b) => Ok(b),
            Flag::Text(s) => match s.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                other => Err(de::Error::custom(format!(
                    "invalid administrador flag: {}",
                    other
                ))),
            },
        }
    }
}
