//! Disposable test data
//!
//! Generated emails embed a millisecond timestamp that is strictly
//! increasing within the process, so two users generated in the same
//! millisecond still get distinct emails.

use std::sync::atomic::{AtomicI64, Ordering};

use serverest_common::User;

pub const DEFAULT_PASSWORD: &str = "12345678";
pub const EMAIL_DOMAIN: &str = "exemplo.com";

pub const DEFAULT_PREFIX: &str = "user";
pub const DELETION_PREFIX: &str = "delete";
pub const CRUD_FLOW_PREFIX: &str = "crud.completo";
pub const DEFAULT_UPDATED_NAME: &str = "User updated CRUD";

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Current time in milliseconds, bumped past the previous stamp if needed
fn unique_stamp() -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_STAMP.compare_exchange_weak(last, next, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// A fresh user named `"{prefix} Teste"` with email `{prefix}.{stamp}@exemplo.com`
pub fn generate_unique_user(prefix: &str, is_admin: bool) -> User {
    let stamp = unique_stamp();
    User {
        name: format!("{} Teste", prefix),
        email: format!("{}.{}@{}", prefix, stamp, EMAIL_DOMAIN),
        password: DEFAULT_PASSWORD.to_string(),
        is_admin,
    }
}

/// [`generate_unique_user`] with the `user` prefix
pub fn generate_default_user(is_admin: bool) -> User {
    generate_unique_user(DEFAULT_PREFIX, is_admin)
}

/// A non-admin user meant to be deleted by the scenario that creates it
pub fn generate_user_for_deletion(prefix: &str) -> User {
    generate_unique_user(prefix, false)
}

/// A non-admin user that goes through the whole CRUD flow
pub fn generate_user_for_crud_flow(prefix: &str) -> User {
    generate_unique_user(prefix, false)
}

/// Update payload: same email and password, new name, admin forced on
pub fn generate_updated_user(original: &User, new_name: &str) -> User {
    User {
        name: new_name.to_string(),
        is_admin: true,
        ..original.clone()
    }
}

/// [`generate_updated_user`] with the name `User updated CRUD`
pub fn generate_default_updated_user(original: &User) -> User {
    generate_updated_user(original, DEFAULT_UPDATED_NAME)
}
