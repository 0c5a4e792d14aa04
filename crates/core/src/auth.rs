use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::{thread_rng, RngCore};
use rusqlite::{params, OptionalExtension, Row as SqlRow};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{CoreError, Result, ValidationError};
use crate::model::AdminUser;
use crate::store::Store;

const HASH_SCHEME: &str = "sha256";
pub const HASH_ITERATIONS: u32 = 10_000;
const SALT_BYTES: usize = 16;
const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AdminUser,
}

pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_BYTES];
    thread_rng().fill_bytes(&mut salt);
    hash_with_salt(password, &salt, HASH_ITERATIONS)
}

fn hash_with_salt(password: &str, salt: &[u8], iterations: u32) -> String {
    let digest = stretch(password, salt, iterations);
    format!(
        "{HASH_SCHEME}${iterations}${}${}",
        hex::encode(salt),
        hex::encode(digest)
    )
}

fn stretch(password: &str, salt: &[u8], iterations: u32) -> Vec<u8> {
    let mut digest = Sha256::new()
        .chain_update(salt)
        .chain_update(password.as_bytes())
        .finalize()
        .to_vec();
    for _ in 1..iterations {
        digest = Sha256::new()
            .chain_update(salt)
            .chain_update(&digest)
            .finalize()
            .to_vec();
    }
    digest
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    if scheme != HASH_SCHEME {
        return false;
    }
    let (Ok(iterations), Ok(salt), Ok(expected)) = (
        iterations.parse::<u32>(),
        hex::decode(salt),
        hex::decode(expected),
    ) else {
        return false;
    };
    if iterations == 0 {
        return false;
    }
    constant_time_eq(&stretch(password, &salt, iterations), &expected)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub fn new_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl Store {
    pub fn create_admin(&self, email: &str, password: &str, name: &str) -> Result<AdminUser> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(ValidationError::Invalid(format!("invalid email address {email:?}")).into());
        }
        if password.is_empty() {
            return Err(ValidationError::Invalid("password must not be empty".to_string()).into());
        }
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO admin_users (email, password_hash, name) VALUES (?1, ?2, ?3)",
            params![email, hash_password(password), name],
        )?;
        let id = conn.last_insert_rowid();
        let user = conn.query_row(
            "SELECT id, email, name, password_hash, created_at FROM admin_users WHERE id = ?1",
            [id],
            user_from_row,
        )?;
        info!(email = %user.email, "admin account created");
        Ok(user)
    }

    pub fn find_admin(&self, email: &str) -> Result<Option<AdminUser>> {
        let conn = self.connection()?;
        let user = conn
            .query_row(
                "SELECT id, email, name, password_hash, created_at FROM admin_users WHERE email = ?1",
                [email.trim()],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn authenticate(&self, email: &str, password: &str) -> Result<Option<AdminUser>> {
        if email.is_empty() || password.is_empty() {
            return Ok(None);
        }
        match self.find_admin(email)? {
            Some(user) if verify_password(password, &user.password_hash) => Ok(Some(user)),
            Some(_) => {
                warn!(email, "admin login rejected");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub fn login(&self, email: &str, password: &str, ttl: Duration) -> Result<Session> {
        let user = self
            .authenticate(email, password)?
            .ok_or(CoreError::Unauthorized)?;
        self.open_session(user, ttl)
    }

    pub fn open_session(&self, user: AdminUser, ttl: Duration) -> Result<Session> {
        let token = new_session_token();
        let expires_at = Utc::now() + ttl;
        let conn = self.connection()?;
        conn.execute(
            "DELETE FROM admin_sessions WHERE expires_at <= ?1",
            [Utc::now().timestamp()],
        )?;
        conn.execute(
            "INSERT INTO admin_sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
            params![token, user.id, expires_at.timestamp()],
        )?;
        Ok(Session {
            token,
            expires_at,
            user,
        })
    }

    pub fn session(&self, token: &str) -> Result<Option<Session>> {
        let conn = self.connection()?;
        let found = conn
            .query_row(
                "SELECT u.id, u.email, u.name, u.password_hash, u.created_at, s.expires_at
                 FROM admin_sessions s
                 JOIN admin_users u ON u.id = s.user_id
                 WHERE s.token = ?1 AND s.expires_at > ?2",
                params![token, Utc::now().timestamp()],
                |row| Ok((user_from_row(row)?, row.get::<_, i64>(5)?)),
            )
            .optional()?;
        Ok(found.and_then(|(user, expires)| {
            Utc.timestamp_opt(expires, 0).single().map(|expires_at| Session {
                token: token.to_string(),
                expires_at,
                user,
            })
        }))
    }

    pub fn close_session(&self, token: &str) -> Result<bool> {
        let conn = self.connection()?;
        let removed = conn.execute("DELETE FROM admin_sessions WHERE token = ?1", [token])?;
        Ok(removed > 0)
    }
}

fn user_from_row(row: &SqlRow<'_>) -> rusqlite::Result<AdminUser> {
    Ok(AdminUser {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
    })
}
