use super::aws_credentials::CredentialSource;
use super::sigv4::{self, SignableRequest};
use super::{SecretReference, SecretStore};
use crate::error::SecretStoreError;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;
use url::Url;

const SERVICE: &str = "secretsmanager";
const GET_SECRET_VALUE_TARGET: &str = "secretsmanager.GetSecretValue";
const AMZ_JSON: &str = "application/x-amz-json-1.1";

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetSecretValueOutput {
    secret_string: Option<String>,
}

#[derive(Deserialize)]
struct ServiceErrorBody {
    #[serde(rename = "__type")]
    kind: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

/// Minimal AWS Secrets Manager client: `GetSecretValue` only.
#[derive(Clone)]
pub struct SecretsManagerClient {
    http: reqwest::Client,
    credentials: CredentialSource,
    endpoint: Option<Url>,
}

impl SecretsManagerClient {
    pub fn new(
        credentials: CredentialSource,
        endpoint: Option<Url>,
    ) -> Result<Self, SecretStoreError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("status-beacon/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            credentials,
            endpoint,
        })
    }

    fn endpoint_for(&self, region: &str) -> Result<Url, SecretStoreError> {
        match &self.endpoint {
            Some(url) => Ok(url.clone()),
            None => Ok(Url::parse(&format!(
                "https://{SERVICE}.{region}.amazonaws.com/"
            ))?),
        }
    }
}

/// Value of the `Host` header reqwest will send for `url`.
fn host_header(url: &Url) -> Result<String, SecretStoreError> {
    let host = url.host_str().ok_or(url::ParseError::EmptyHost)?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn service_error(status: u16, body: &[u8]) -> SecretStoreError {
    let parsed: Option<ServiceErrorBody> = serde_json::from_slice(body).ok();
    let (kind, message) = parsed
        .map(|b| (b.kind, b.message))
        .unwrap_or_default();
    // `__type` may carry a namespace prefix: "com.amazonaws...#ResourceNotFoundException"
    let code = kind
        .as_deref()
        .map(|k| k.rsplit('#').next().unwrap_or(k).to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    SecretStoreError::Service {
        status,
        code,
        message: message.unwrap_or_default(),
    }
}

#[async_trait]
impl SecretStore for SecretsManagerClient {
    async fn get_secret_string(
        &self,
        reference: &SecretReference,
    ) -> Result<String, SecretStoreError> {
        let creds = self.credentials.load(&self.http, &reference.region).await?;
        let url = self.endpoint_for(&reference.region)?;
        let host = host_header(&url)?;
        let body = serde_json::to_vec(&json!({ "SecretId": reference.name }))?;

        let signed = sigv4::sign(
            &SignableRequest {
                method: "POST",
                path: url.path(),
                host: &host,
                content_type: AMZ_JSON,
                target: GET_SECRET_VALUE_TARGET,
                body: &body,
            },
            &creds,
            &reference.region,
            SERVICE,
            Utc::now(),
        );

        let mut request = self
            .http
            .post(url.clone())
            .header(CONTENT_TYPE, AMZ_JSON)
            .header("x-amz-target", GET_SECRET_VALUE_TARGET)
            .header("x-amz-date", &signed.amz_date)
            .header(AUTHORIZATION, &signed.authorization);
        if let Some(token) = signed.security_token.as_deref() {
            request = request.header("x-amz-security-token", token);
        }

        let resp = request.body(body).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(service_error(status.as_u16(), &bytes));
        }
        debug!(secret = %reference.name, endpoint = %url, "secret value retrieved");

        let output: GetSecretValueOutput = serde_json::from_slice(&bytes)?;
        output
            .secret_string
            .ok_or_else(|| SecretStoreError::BinarySecret(reference.name.clone()))
    }
}
