//! AWS access keys for signing secret store requests.
//!
//! The default chain tries, in order: environment variables, web identity
//! (`AWS_WEB_IDENTITY_TOKEN_FILE` + `AWS_ROLE_ARN` through STS), the shared
//! credentials and config files (`AWS_PROFILE`), ECS container credentials,
//! then EC2 instance metadata (IMDSv2). A provider that is configured but
//! fails stops the chain; one that is not configured is skipped.

use crate::error::SecretStoreError;
use chrono::Utc;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use url::Url;

const IMDS_BASE: &str = "http://169.254.169.254";
const CONTAINER_BASE: &str = "http://169.254.170.2";
const IMDS_TOKEN_TTL_SECS: &str = "21600";
const METADATA_TIMEOUT: Duration = Duration::from_secs(2);
const STS_VERSION: &str = "2011-06-15";

/// Variables the chain reads. Anything else in the environment is ignored.
const CHAIN_VARS: &[&str] = &[
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "AWS_WEB_IDENTITY_TOKEN_FILE",
    "AWS_ROLE_ARN",
    "AWS_ROLE_SESSION_NAME",
    "AWS_PROFILE",
    "AWS_DEFAULT_PROFILE",
    "AWS_SHARED_CREDENTIALS_FILE",
    "AWS_CONFIG_FILE",
    "AWS_CONTAINER_CREDENTIALS_RELATIVE_URI",
    "AWS_CONTAINER_CREDENTIALS_FULL_URI",
    "AWS_CONTAINER_AUTHORIZATION_TOKEN",
    "AWS_CONTAINER_AUTHORIZATION_TOKEN_FILE",
    "AWS_EC2_METADATA_DISABLED",
    "HOME",
];

/// Access keys used to sign secret store requests.
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Where access keys come from. Loaded on every request; nothing is cached.
#[derive(Debug, Clone, Default)]
pub enum CredentialSource {
    /// [`ProviderChain`] over the process environment.
    #[default]
    DefaultChain,
    Static(AwsCredentials),
}

impl CredentialSource {
    pub async fn load(
        &self,
        http: &reqwest::Client,
        region: &str,
    ) -> Result<AwsCredentials, SecretStoreError> {
        match self {
            CredentialSource::Static(creds) => Ok(creds.clone()),
            CredentialSource::DefaultChain => ProviderChain::from_env().load(http, region).await,
        }
    }
}

/// The credential provider chain, over a snapshot of the variables it reads.
#[derive(Debug, Clone)]
pub struct ProviderChain {
    vars: HashMap<String, String>,
    imds_base: String,
    container_base: String,
    sts_endpoint: Option<Url>,
}

impl ProviderChain {
    pub fn from_env() -> Self {
        Self::from_vars(
            CHAIN_VARS
                .iter()
                .filter_map(|key| std::env::var(key).ok().map(|v| (*key, v))),
        )
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .filter(|(_, v)| !v.is_empty())
                .collect(),
            imds_base: IMDS_BASE.to_string(),
            container_base: CONTAINER_BASE.to_string(),
            sts_endpoint: None,
        }
    }

    pub fn with_imds_base(mut self, base: impl Into<String>) -> Self {
        self.imds_base = base.into();
        self
    }

    pub fn with_container_base(mut self, base: impl Into<String>) -> Self {
        self.container_base = base.into();
        self
    }

    pub fn with_sts_endpoint(mut self, endpoint: Url) -> Self {
        self.sts_endpoint = Some(endpoint);
        self
    }

    fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub async fn load(
        &self,
        http: &reqwest::Client,
        region: &str,
    ) -> Result<AwsCredentials, SecretStoreError> {
        if let Some(creds) = self.env_keys() {
            debug!(provider = "env", "loaded AWS credentials");
            return Ok(creds);
        }
        if let Some(creds) = self.web_identity(http, region).await? {
            debug!(provider = "web_identity", "loaded AWS credentials");
            return Ok(creds);
        }
        if let Some(creds) = self.profile_keys().await? {
            debug!(provider = "profile", "loaded AWS credentials");
            return Ok(creds);
        }
        if let Some(creds) = self.container(http).await? {
            debug!(provider = "container", "loaded AWS credentials");
            return Ok(creds);
        }
        if self
            .var("AWS_EC2_METADATA_DISABLED")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        {
            return Err(SecretStoreError::MissingAwsCredentials);
        }
        self.instance_metadata(http).await.map_err(|e| {
            debug!(error = %e, "instance metadata credentials unavailable");
            SecretStoreError::MissingAwsCredentials
        })
    }

    fn env_keys(&self) -> Option<AwsCredentials> {
        Some(AwsCredentials {
            access_key_id: self.var("AWS_ACCESS_KEY_ID")?.to_string(),
            secret_access_key: self.var("AWS_SECRET_ACCESS_KEY")?.to_string(),
            session_token: self.var("AWS_SESSION_TOKEN").map(str::to_string),
        })
    }

    async fn web_identity(
        &self,
        http: &reqwest::Client,
        region: &str,
    ) -> Result<Option<AwsCredentials>, SecretStoreError> {
        let (Some(token_file), Some(role_arn)) = (
            self.var("AWS_WEB_IDENTITY_TOKEN_FILE"),
            self.var("AWS_ROLE_ARN"),
        ) else {
            return Ok(None);
        };
        let token = tokio::fs::read_to_string(self.expand_home(token_file))
            .await
            .map_err(|e| provider_error("web identity", format!("{token_file}: {e}")))?;
        let session_name = self
            .var("AWS_ROLE_SESSION_NAME")
            .map(str::to_string)
            .unwrap_or_else(|| format!("status-beacon-{}", Utc::now().timestamp_millis()));
        let endpoint = match &self.sts_endpoint {
            Some(url) => url.clone(),
            None => Url::parse(&format!("https://sts.{region}.amazonaws.com/"))?,
        };

        let resp = http
            .post(endpoint)
            .header(ACCEPT, "application/json")
            .form(&[
                ("Action", "AssumeRoleWithWebIdentity"),
                ("Version", STS_VERSION),
                ("RoleArn", role_arn),
                ("RoleSessionName", session_name.as_str()),
                ("WebIdentityToken", token.trim()),
            ])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(provider_error(
                "web identity",
                format!("STS returned {status}: {body}"),
            ));
        }
        let envelope: WebIdentityEnvelope = resp.json().await?;
        let creds = envelope.response.result.credentials;
        debug!(role = %role_arn, session = %session_name, "assumed role with web identity");
        Ok(Some(AwsCredentials {
            access_key_id: creds.access_key_id,
            secret_access_key: creds.secret_access_key,
            session_token: Some(creds.session_token),
        }))
    }

    async fn profile_keys(&self) -> Result<Option<AwsCredentials>, SecretStoreError> {
        let explicit = self
            .var("AWS_PROFILE")
            .or_else(|| self.var("AWS_DEFAULT_PROFILE"));
        let profile = explicit.unwrap_or("default");

        let credentials_path = self.shared_file("AWS_SHARED_CREDENTIALS_FILE", "credentials");
        let config_path = self.shared_file("AWS_CONFIG_FILE", "config");
        let config_section = if profile == "default" {
            "default".to_string()
        } else {
            format!("profile {profile}")
        };

        let mut found = false;
        for (path, section) in [
            (credentials_path, profile.to_string()),
            (config_path, config_section),
        ] {
            let Some(path) = path else { continue };
            let text = match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(provider_error(
                        "profile",
                        format!("{}: {e}", path.display()),
                    ));
                }
            };
            let Some(keys) = parse_ini(&text).remove(&section) else {
                continue;
            };
            found = true;
            if let (Some(id), Some(secret)) =
                (keys.get("aws_access_key_id"), keys.get("aws_secret_access_key"))
            {
                return Ok(Some(AwsCredentials {
                    access_key_id: id.clone(),
                    secret_access_key: secret.clone(),
                    session_token: keys.get("aws_session_token").cloned(),
                }));
            }
        }

        match explicit {
            Some(name) if !found => Err(provider_error(
                "profile",
                format!("profile {name} not found"),
            )),
            _ => Ok(None),
        }
    }

    async fn container(
        &self,
        http: &reqwest::Client,
    ) -> Result<Option<AwsCredentials>, SecretStoreError> {
        let url = if let Some(relative) = self.var("AWS_CONTAINER_CREDENTIALS_RELATIVE_URI") {
            Url::parse(&format!("{}{relative}", self.container_base))?
        } else if let Some(full) = self.var("AWS_CONTAINER_CREDENTIALS_FULL_URI") {
            let url = Url::parse(full)?;
            if !container_host_allowed(&url) {
                return Err(provider_error(
                    "container",
                    format!("{} is neither HTTPS nor a loopback or ECS host", url),
                ));
            }
            url
        } else {
            return Ok(None);
        };

        let auth = match self.var("AWS_CONTAINER_AUTHORIZATION_TOKEN_FILE") {
            Some(file) => Some(
                tokio::fs::read_to_string(self.expand_home(file))
                    .await
                    .map_err(|e| provider_error("container", format!("{file}: {e}")))?
                    .trim()
                    .to_string(),
            ),
            None => self
                .var("AWS_CONTAINER_AUTHORIZATION_TOKEN")
                .map(str::to_string),
        };

        let mut request = http.get(url).timeout(METADATA_TIMEOUT);
        if let Some(auth) = auth {
            request = request.header(AUTHORIZATION, auth);
        }
        let creds: RoleCredentials = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(Some(creds.into()))
    }

    async fn instance_metadata(
        &self,
        http: &reqwest::Client,
    ) -> Result<AwsCredentials, SecretStoreError> {
        let base = &self.imds_base;
        let token = http
            .put(format!("{base}/latest/api/token"))
            .header("x-aws-ec2-metadata-token-ttl-seconds", IMDS_TOKEN_TTL_SECS)
            .timeout(METADATA_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let roles_url = format!("{base}/latest/meta-data/iam/security-credentials/");
        let roles = http
            .get(&roles_url)
            .header("x-aws-ec2-metadata-token", &token)
            .timeout(METADATA_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let role = roles
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .ok_or(SecretStoreError::MissingAwsCredentials)?;

        let creds: RoleCredentials = http
            .get(format!("{roles_url}{role}"))
            .header("x-aws-ec2-metadata-token", &token)
            .timeout(METADATA_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(role = %role, "loaded credentials from instance metadata");
        Ok(creds.into())
    }

    /// `override_var` if set, else `~/.aws/<name>` when `HOME` is known.
    fn shared_file(&self, override_var: &str, name: &str) -> Option<PathBuf> {
        match self.var(override_var) {
            Some(path) => Some(self.expand_home(path)),
            None => self
                .var("HOME")
                .map(|home| PathBuf::from(home).join(".aws").join(name)),
        }
    }

    fn expand_home(&self, path: &str) -> PathBuf {
        match (path.strip_prefix("~/"), self.var("HOME")) {
            (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
            _ => PathBuf::from(path),
        }
    }
}

fn provider_error(provider: &'static str, message: String) -> SecretStoreError {
    SecretStoreError::CredentialProvider { provider, message }
}

/// Full container URIs must be HTTPS or point at loopback or the ECS agent.
fn container_host_allowed(url: &Url) -> bool {
    if url.scheme() == "https" {
        return true;
    }
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => host
            .trim_matches(|c| c == '[' || c == ']')
            .parse::<IpAddr>()
            .is_ok_and(|ip| {
                ip.is_loopback()
                    || ip == IpAddr::from([169, 254, 170, 2])
                    || ip == IpAddr::from([169, 254, 170, 23])
            }),
        None => false,
    }
}

/// Sections of an AWS shared config file. Keys are lowercased; indented
/// sub-settings are skipped.
fn parse_ini(text: &str) -> HashMap<String, HashMap<String, String>> {
    let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current: Option<String> = None;
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }
        if raw.starts_with(char::is_whitespace) {
            continue;
        }
        let (Some(section), Some((key, value))) = (&current, line.split_once('=')) else {
            continue;
        };
        sections
            .entry(section.clone())
            .or_default()
            .insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
    }
    sections
}

/// Body shared by the container endpoint and instance metadata.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RoleCredentials {
    access_key_id: String,
    secret_access_key: String,
    token: Option<String>,
}

impl From<RoleCredentials> for AwsCredentials {
    fn from(c: RoleCredentials) -> Self {
        AwsCredentials {
            access_key_id: c.access_key_id,
            secret_access_key: c.secret_access_key,
            session_token: c.token,
        }
    }
}

#[derive(Deserialize)]
struct WebIdentityEnvelope {
    #[serde(rename = "AssumeRoleWithWebIdentityResponse")]
    response: WebIdentityResponse,
}

#[derive(Deserialize)]
struct WebIdentityResponse {
    #[serde(rename = "AssumeRoleWithWebIdentityResult")]
    result: WebIdentityResult,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WebIdentityResult {
    credentials: StsCredentials,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StsCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::fs;

    // Nothing listens on port 1; a chain that reaches IMDS fails fast.
    const DEAD_IMDS: &str = "http://127.0.0.1:1";

    fn chain(vars: &[(&str, &str)]) -> ProviderChain {
        ProviderChain::from_vars(vars.iter().copied()).with_imds_base(DEAD_IMDS)
    }

    fn role_json(id: &str) -> String {
        json!({
            "Code": "Success",
            "AccessKeyId": id,
            "SecretAccessKey": "secret",
            "Token": "session",
            "Expiration": "2030-01-01T00:00:00Z"
        })
        .to_string()
    }

    #[tokio::test]
    async fn static_source_returns_its_keys() {
        let source = CredentialSource::Static(AwsCredentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: None,
        });
        let creds = source
            .load(&reqwest::Client::new(), "us-west-2")
            .await
            .unwrap();
        assert_eq!(creds.access_key_id, "AKIDEXAMPLE");
    }

    #[tokio::test]
    async fn environment_keys_come_first() {
        let creds = chain(&[
            ("AWS_ACCESS_KEY_ID", "AKIDENV"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_SESSION_TOKEN", "token"),
            ("AWS_PROFILE", "does-not-matter"),
        ])
        .load(&reqwest::Client::new(), "us-west-2")
        .await
        .unwrap();
        assert_eq!(creds.access_key_id, "AKIDENV");
        assert_eq!(creds.session_token.as_deref(), Some("token"));
    }

    #[tokio::test]
    async fn named_profile_from_shared_credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");
        fs::write(
            &path,
            "[default]\naws_access_key_id = AKIDDEFAULT\naws_secret_access_key = d\n\n\
             # work account\n[work]\nAWS_ACCESS_KEY_ID=AKIDWORK\naws_secret_access_key=w\naws_session_token = t\n",
        )
        .unwrap();
        let path = path.display().to_string();

        let creds = chain(&[
            ("AWS_PROFILE", "work"),
            ("AWS_SHARED_CREDENTIALS_FILE", path.as_str()),
        ])
        .load(&reqwest::Client::new(), "us-west-2")
        .await
        .unwrap();
        assert_eq!(creds.access_key_id, "AKIDWORK");
        assert_eq!(creds.secret_access_key, "w");
        assert_eq!(creds.session_token.as_deref(), Some("t"));

        let creds = chain(&[("AWS_SHARED_CREDENTIALS_FILE", path.as_str())])
            .load(&reqwest::Client::new(), "us-west-2")
            .await
            .unwrap();
        assert_eq!(creds.access_key_id, "AKIDDEFAULT");
    }

    #[tokio::test]
    async fn profile_keys_from_config_file_under_home() {
        let home = tempfile::tempdir().unwrap();
        fs::create_dir(home.path().join(".aws")).unwrap();
        fs::write(
            home.path().join(".aws").join("config"),
            "[profile ops]\nregion = eu-west-1\ns3 =\n  max_concurrent_requests = 4\naws_access_key_id = AKIDOPS\naws_secret_access_key = o\n",
        )
        .unwrap();
        let home = home.path().display().to_string();

        let creds = chain(&[("HOME", home.as_str()), ("AWS_PROFILE", "ops")])
            .load(&reqwest::Client::new(), "us-west-2")
            .await
            .unwrap();
        assert_eq!(creds.access_key_id, "AKIDOPS");
        assert!(creds.session_token.is_none());
    }

    #[tokio::test]
    async fn missing_named_profile_is_an_error() {
        let home = tempfile::tempdir().unwrap();
        let home = home.path().display().to_string();
        let err = chain(&[("HOME", home.as_str()), ("AWS_PROFILE", "absent")])
            .load(&reqwest::Client::new(), "us-west-2")
            .await
            .unwrap_err();
        match err {
            SecretStoreError::CredentialProvider { provider, message } => {
                assert_eq!(provider, "profile");
                assert!(message.contains("absent"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn web_identity_token_is_exchanged_with_sts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("accept", "application/json")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("Action".into(), "AssumeRoleWithWebIdentity".into()),
                Matcher::UrlEncoded("Version".into(), STS_VERSION.into()),
                Matcher::UrlEncoded(
                    "RoleArn".into(),
                    "arn:aws:iam::123456789012:role/beacon".into(),
                ),
                Matcher::UrlEncoded("RoleSessionName".into(), "pod-1".into()),
                Matcher::UrlEncoded("WebIdentityToken".into(), "jwt-token".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "AssumeRoleWithWebIdentityResponse": {
                        "AssumeRoleWithWebIdentityResult": {
                            "Credentials": {
                                "AccessKeyId": "ASIAWEB",
                                "SecretAccessKey": "web-secret",
                                "SessionToken": "web-session",
                                "Expiration": 1.9e9
                            }
                        }
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token");
        fs::write(&token_path, "jwt-token\n").unwrap();
        let token_path = token_path.display().to_string();

        let creds = chain(&[
            ("AWS_WEB_IDENTITY_TOKEN_FILE", token_path.as_str()),
            ("AWS_ROLE_ARN", "arn:aws:iam::123456789012:role/beacon"),
            ("AWS_ROLE_SESSION_NAME", "pod-1"),
        ])
        .with_sts_endpoint(Url::parse(&server.url()).unwrap())
        .load(&reqwest::Client::new(), "us-west-2")
        .await
        .unwrap();
        assert_eq!(creds.access_key_id, "ASIAWEB");
        assert_eq!(creds.session_token.as_deref(), Some("web-session"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_web_identity_stops_the_chain() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(403)
            .with_body(r#"{"Error":{"Code":"AccessDenied"}}"#)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token");
        fs::write(&token_path, "jwt-token").unwrap();
        let token_path = token_path.display().to_string();

        let err = chain(&[
            ("AWS_WEB_IDENTITY_TOKEN_FILE", token_path.as_str()),
            ("AWS_ROLE_ARN", "arn:aws:iam::123456789012:role/beacon"),
        ])
        .with_sts_endpoint(Url::parse(&server.url()).unwrap())
        .load(&reqwest::Client::new(), "us-west-2")
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            SecretStoreError::CredentialProvider { provider: "web identity", .. }
        ));
    }

    #[tokio::test]
    async fn container_relative_uri_with_token_file() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/credentials/task-1")
            .match_header("authorization", "container-token")
            .with_status(200)
            .with_body(role_json("ASIATASK"))
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("auth");
        fs::write(&token_path, "container-token\n").unwrap();
        let token_path = token_path.display().to_string();

        let creds = chain(&[
            ("AWS_CONTAINER_CREDENTIALS_RELATIVE_URI", "/v2/credentials/task-1"),
            ("AWS_CONTAINER_AUTHORIZATION_TOKEN_FILE", token_path.as_str()),
            ("AWS_CONTAINER_AUTHORIZATION_TOKEN", "ignored"),
        ])
        .with_container_base(server.url())
        .load(&reqwest::Client::new(), "us-west-2")
        .await
        .unwrap();
        assert_eq!(creds.access_key_id, "ASIATASK");
        assert_eq!(creds.session_token.as_deref(), Some("session"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn container_full_uri_on_loopback() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/creds")
            .match_header("authorization", "inline-token")
            .with_status(200)
            .with_body(role_json("ASIAFULL"))
            .create_async()
            .await;
        let full = format!("{}/creds", server.url());

        let creds = chain(&[
            ("AWS_CONTAINER_CREDENTIALS_FULL_URI", full.as_str()),
            ("AWS_CONTAINER_AUTHORIZATION_TOKEN", "inline-token"),
        ])
        .load(&reqwest::Client::new(), "us-west-2")
        .await
        .unwrap();
        assert_eq!(creds.access_key_id, "ASIAFULL");
    }

    #[tokio::test]
    async fn container_full_uri_on_remote_http_is_refused() {
        let err = chain(&[(
            "AWS_CONTAINER_CREDENTIALS_FULL_URI",
            "http://169.254.1.1/creds",
        )])
        .load(&reqwest::Client::new(), "us-west-2")
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            SecretStoreError::CredentialProvider { provider: "container", .. }
        ));
    }

    #[tokio::test]
    async fn instance_metadata_is_the_last_resort() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", "/latest/api/token")
            .match_header("x-aws-ec2-metadata-token-ttl-seconds", IMDS_TOKEN_TTL_SECS)
            .with_body("imds-token")
            .create_async()
            .await;
        server
            .mock("GET", "/latest/meta-data/iam/security-credentials/")
            .match_header("x-aws-ec2-metadata-token", "imds-token")
            .with_body("beacon-role\n")
            .create_async()
            .await;
        server
            .mock("GET", "/latest/meta-data/iam/security-credentials/beacon-role")
            .match_header("x-aws-ec2-metadata-token", "imds-token")
            .with_body(role_json("ASIAEC2"))
            .create_async()
            .await;

        let creds = ProviderChain::from_vars(Vec::<(String, String)>::new())
            .with_imds_base(server.url())
            .load(&reqwest::Client::new(), "us-west-2")
            .await
            .unwrap();
        assert_eq!(creds.access_key_id, "ASIAEC2");
    }

    #[tokio::test]
    async fn empty_chain_reports_missing_credentials() {
        let err = chain(&[])
            .load(&reqwest::Client::new(), "us-west-2")
            .await
            .unwrap_err();
        assert!(matches!(err, SecretStoreError::MissingAwsCredentials));

        let err = ProviderChain::from_vars([("AWS_EC2_METADATA_DISABLED", "true")])
            .load(&reqwest::Client::new(), "us-west-2")
            .await
            .unwrap_err();
        assert!(matches!(err, SecretStoreError::MissingAwsCredentials));
    }

    #[test]
    fn ini_sections_skip_comments_and_nested_settings() {
        let parsed = parse_ini(
            "; top comment\n[default]\nRegion = us-west-2\ns3 =\n    addressing_style = path\n[profile x]\nkey=a=b\n",
        );
        assert_eq!(parsed["default"]["region"], "us-west-2");
        assert!(!parsed["default"].contains_key("addressing_style"));
        assert_eq!(parsed["profile x"]["key"], "a=b");
    }

    #[test]
    fn debug_output_hides_secret_key() {
        let creds = AwsCredentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI".to_string(),
            session_token: Some("session".to_string()),
        };
        let shown = format!("{creds:?}");
        assert!(shown.contains("AKIDEXAMPLE"));
        assert!(!shown.contains("wJalrXUtnFEMI"));
        assert!(!shown.contains("\"session\""));
    }
}
