use crate::error::SecretStoreError;
use serde::Deserialize;
use std::fmt;

/// Connection parameters decoded from a database secret.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseCredentials {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Wire shape of the secret. Extra keys (`engine`, `dbInstanceIdentifier`, ...)
/// are ignored.
#[derive(Deserialize)]
struct SecretPayload {
    endpoint: String,
    port: u16,
    dbname: String,
    username: String,
    password: String,
}

impl DatabaseCredentials {
    /// Strictly decode a secret string. Nothing partial is ever returned.
    pub fn from_payload(payload: &str) -> Result<Self, SecretStoreError> {
        let raw: SecretPayload = serde_json::from_str(payload)
            .map_err(|e| SecretStoreError::InvalidPayload(describe_decode_error(&e)))?;

        // "host:port" in the endpoint; the port comes from its own field.
        let host = raw.endpoint.split(':').next().unwrap_or_default().trim();

        let checks = [
            ("endpoint", host.is_empty()),
            ("port", raw.port == 0),
            ("dbname", raw.dbname.trim().is_empty()),
            ("username", raw.username.trim().is_empty()),
            ("password", raw.password.is_empty()),
        ];
        if let Some((field, _)) = checks.iter().find(|(_, empty)| *empty) {
            return Err(SecretStoreError::InvalidPayload(format!(
                "field `{field}` is empty"
            )));
        }

        Ok(Self {
            host: host.to_string(),
            port: raw.port,
            database: raw.dbname,
            username: raw.username,
            password: raw.password,
        })
    }
}

/// serde_json echoes offending values in type errors; keep those out of logs.
fn describe_decode_error(e: &serde_json::Error) -> String {
    let msg = e.to_string();
    if msg.starts_with("missing field") {
        msg
    } else {
        format!(
            "{:?} error at line {} column {}",
            e.classify(),
            e.line(),
            e.column()
        )
    }
}
