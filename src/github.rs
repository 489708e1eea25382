//! GitHub helper
//!
//! Obtains a repository token and registers webhooks and deploy keys for a
//! GitHub-hosted app. Credentials are handed in up front; the only
//! interactive hook is an optional one-time-password provider consulted
//! when GitHub asks for two-factor authentication.

use crate::error::{Error, Result};
use crate::resource::{Resource, ResourceManager};
use base64::Engine;
use rand::Rng;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

/// Public GitHub API
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Scopes requested for the repository token
pub const TOKEN_SCOPES: &[&str] = &["repo", "write:public_key", "write:repo_hook"];

/// Header used to send (and request) a two-factor one-time password
pub const OTP_HEADER: &str = "x-github-otp";

/// Title given to uploaded deploy keys
const SSH_KEY_TITLE: &str = "devops@Solum";

/// Events that fire the app's trigger
const WEBHOOK_EVENTS: &[&str] = &["pull_request", "commit_comment"];

/// Supplies a one-time password when GitHub requires one
pub type OtpProvider = Box<dyn FnMut() -> Result<String> + Send>;

/// What the session authenticates with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitHubCredentials {
    Basic { username: String, password: String },
    Token(String),
}

/// Split a GitHub git URL into `(owner, repo)`
///
/// Accepts `https://github.com/o/r`, `https://github.com/o/r.git`,
/// `git@github.com:o/r.git` and trailing slashes.
pub fn parse_repo_url(git_url: &str) -> Result<(String, String)> {
    let parse_error = || Error::Validation(format!("Failed to parse {}.", git_url));

    let start = git_url.find("github.com").ok_or_else(parse_error)?;
    let rest = &git_url[start + "github.com".len()..];
    let rest = rest
        .strip_prefix(':')
        .or_else(|| rest.strip_prefix('/'))
        .ok_or_else(parse_error)?;

    // Anything after the repository segment (tree/branch paths) is ignored
    let mut segments = rest.split('/');
    let owner = segments.next().unwrap_or_default();
    let repo = segments.next().unwrap_or_default();
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if owner.is_empty() || repo.is_empty() {
        return Err(parse_error());
    }

    Ok((owner.to_string(), repo.to_string()))
}

/// Authenticated GitHub session for one repository
pub struct GitHubAuth {
    http: Client,
    api_url: String,
    git_url: String,
    user_org_name: String,
    full_repo_name: String,
    credentials: GitHubCredentials,
    otp_provider: Option<OtpProvider>,
    onetime_password: Option<String>,
}

impl GitHubAuth {
    /// Create a session against the public GitHub API
    pub fn new(git_url: &str, credentials: GitHubCredentials) -> Result<Self> {
        Self::with_api_url(git_url, credentials, GITHUB_API_URL)
    }

    /// Create a session against another API root (GitHub Enterprise, tests)
    pub fn with_api_url(
        git_url: &str,
        credentials: GitHubCredentials,
        api_url: &str,
    ) -> Result<Self> {
        let (owner, repo) = parse_repo_url(git_url)?;
        let http = Client::builder()
            .user_agent(concat!("solum/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            git_url: git_url.to_string(),
            full_repo_name: format!("{}/{}", owner, repo),
            user_org_name: owner,
            credentials,
            otp_provider: None,
            onetime_password: None,
        })
    }

    /// Install the provider asked for a one-time password on 2FA challenges
    pub fn with_otp_provider(mut self, provider: OtpProvider) -> Self {
        self.otp_provider = Some(provider);
        self
    }

    pub fn git_url(&self) -> &str {
        &self.git_url
    }

    pub fn user_org_name(&self) -> &str {
        &self.user_org_name
    }

    pub fn full_repo_name(&self) -> &str {
        &self.full_repo_name
    }

    /// Token of the session, once one is held
    pub fn token(&self) -> Option<&str> {
        match &self.credentials {
            GitHubCredentials::Token(token) => Some(token),
            GitHubCredentials::Basic { .. } => None,
        }
    }

    /// `Authorization` header value for the current credentials
    pub fn auth_header(&self) -> String {
        match &self.credentials {
            GitHubCredentials::Token(token) => format!("token {}", token),
            GitHubCredentials::Basic { username, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", username, password));
                format!("Basic {}", encoded)
            }
        }
    }

    /// Obtain a repository token and switch the session over to it
    pub async fn create_repo_token(&mut self) -> Result<String> {
        if let GitHubCredentials::Token(token) = &self.credentials {
            return Ok(token.clone());
        }

        let url = format!("{}/authorizations", self.api_url);
        let body = json!({
            "scopes": TOKEN_SCOPES,
            "note": format!("Solum-status-{}", random_note()),
        });

        let (status, content) = self.send_authed_request(&url, &body).await?;
        if !is_created(status) {
            return Err(Error::ExternalService(format!(
                "Error getting repo token for {}: HTTP {}",
                self.full_repo_name, status
            )));
        }

        let token = serde_json::from_str::<Value>(&content)?
            .get("token")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                Error::ExternalService("GitHub returned no token".to_string())
            })?;

        tracing::info!("Created repo token for {}", self.full_repo_name);
        self.credentials = GitHubCredentials::Token(token.clone());
        Ok(token)
    }

    /// Register a webhook on the repository that POSTs to `trigger_uri`
    pub async fn create_webhook(
        &mut self,
        trigger_uri: &str,
        workflow: Option<&[String]>,
    ) -> Result<()> {
        let url = format!("{}/repos/{}/hooks", self.api_url, self.full_repo_name);

        let mut hook_target = trigger_uri.to_string();
        if let Some(actions) = workflow.filter(|a| !a.is_empty()) {
            hook_target.push_str(&format!("?workflow={}", actions.join("+")));
        }

        let body = json!({
            "name": "web",
            "events": WEBHOOK_EVENTS,
            "config": {
                "content_type": "json",
                "url": hook_target,
            },
        });

        let (status, _) = self.send_authed_request(&url, &body).await?;
        if !is_created(status) {
            return Err(Error::ExternalService(format!(
                "Error creating webhook on {}: HTTP {}",
                self.full_repo_name, status
            )));
        }

        tracing::info!("Created webhook on {} -> {}", self.full_repo_name, hook_target);
        Ok(())
    }

    /// Upload a public key as a repository deploy key, or to the user
    /// account when `is_private`
    pub async fn add_ssh_key(&mut self, public_key: Option<&str>, is_private: bool) -> Result<()> {
        let Some(public_key) = public_key.filter(|k| !k.is_empty()) else {
            tracing::warn!("No public key to upload.");
            return Ok(());
        };

        let url = if is_private {
            format!("{}/user/keys", self.api_url)
        } else {
            format!("{}/repos/{}/keys", self.api_url, self.full_repo_name)
        };

        let body = json!({
            "title": SSH_KEY_TITLE,
            "key": public_key,
        });

        let (status, _) = self.send_authed_request(&url, &body).await?;
        if !is_created(status) {
            return Err(Error::ExternalService(format!(
                "Error uploading public key: HTTP {}",
                status
            )));
        }

        Ok(())
    }

    /// POST with the session's credentials, retrying once with a one-time
    /// password when GitHub answers 401 with a 2FA challenge
    async fn send_authed_request(&mut self, url: &str, body: &Value) -> Result<(StatusCode, String)> {
        let otp = self.onetime_password.clone();
        let response = self.post(url, body, otp.as_deref()).await?;

        let otp_challenge = response.status() == StatusCode::UNAUTHORIZED
            && response
                .headers()
                .get(OTP_HEADER)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.starts_with("required"));

        if !otp_challenge || otp.is_some() {
            let status = response.status();
            return Ok((status, response.text().await?));
        }

        tracing::info!("Two-Factor Authentication required.");
        let otp = self.onetime_password()?;
        let response = self.post(url, body, Some(&otp)).await?;
        let status = response.status();
        Ok((status, response.text().await?))
    }

    async fn post(&self, url: &str, body: &Value, otp: Option<&str>) -> Result<reqwest::Response> {
        tracing::debug!("POST {}", url);

        let mut request = self
            .http
            .post(url)
            .header(AUTHORIZATION, self.auth_header())
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string());

        if let Some(otp) = otp {
            request = request.header(OTP_HEADER, otp);
        }

        Ok(request.send().await?)
    }

    fn onetime_password(&mut self) -> Result<String> {
        if let Some(otp) = &self.onetime_password {
            return Ok(otp.clone());
        }

        let provider = self.otp_provider.as_mut().ok_or_else(|| {
            Error::Auth("Two-factor authentication required but no one-time password available".to_string())
        })?;
        let otp = provider()?;
        self.onetime_password = Some(otp.clone());
        Ok(otp)
    }
}

/// GitHub steps requested alongside `app create`
#[derive(Debug, Clone, Default)]
pub struct RepoSetup {
    /// Register a webhook on the app's `trigger_uri`
    pub setup_trigger: bool,
    /// Actions appended to the webhook URL
    pub trigger_workflow: Vec<String>,
    /// Mark the repository private and upload the app's public key
    pub private_repo: bool,
    /// Upload the key to the user account instead of the repository
    pub user_key: bool,
}

impl RepoSetup {
    pub fn needs_github(&self) -> bool {
        self.setup_trigger || self.private_repo
    }
}

/// Create an app, wiring up its GitHub repository as `setup` asks.
///
/// The repo token is fetched first and sent as `source.repo_token`. Once
/// the app exists, its `source.public_key` is uploaded for private repos
/// and a webhook is registered on its `trigger_uri`. A GitHub failure after
/// the app was created is returned as is; the app is not rolled back.
pub async fn register_app(
    apps: &ResourceManager<'_>,
    mut fields: Value,
    gha: &mut GitHubAuth,
    setup: &RepoSetup,
) -> Result<Resource> {
    if setup.needs_github() {
        let token = gha.create_repo_token().await?;
        let source = source_mut(&mut fields)?;
        source.insert("repo_token".to_string(), json!(token));
        if setup.private_repo {
            source.insert("private".to_string(), json!(true));
        }
    }

    let app = apps.create(&fields).await?;

    if let Err(err) = finish_repo_setup(&app, gha, setup).await {
        tracing::warn!(
            "App {} was created but GitHub setup failed: {}",
            app.display("name"),
            err
        );
        return Err(err);
    }
    Ok(app)
}

async fn finish_repo_setup(app: &Resource, gha: &mut GitHubAuth, setup: &RepoSetup) -> Result<()> {
    if setup.private_repo {
        let public_key = app.lookup("source.public_key").and_then(|v| v.as_str());
        gha.add_ssh_key(public_key, setup.user_key).await?;
    }
    if setup.setup_trigger {
        let trigger_uri = app.get_str("trigger_uri").ok_or_else(|| {
            Error::Decode("App has no trigger_uri; webhook not created".to_string())
        })?;
        gha.create_webhook(trigger_uri, Some(&setup.trigger_workflow))
            .await?;
    }
    Ok(())
}

fn source_mut(fields: &mut Value) -> Result<&mut serde_json::Map<String, Value>> {
    let Some(map) = fields.as_object_mut() else {
        return Err(Error::Validation("App fields must be a mapping".to_string()));
    };
    map.entry("source")
        .or_insert_with(|| json!({}))
        .as_object_mut()
        .ok_or_else(|| Error::Validation("App source must be a mapping".to_string()))
}

fn is_created(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::CREATED
}

/// Five random lowercase letters, keeps authorization notes unique
fn random_note() -> String {
    let mut rng = rand::thread_rng();
    (0..5).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}
