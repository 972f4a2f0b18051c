//! Blocking Reddit API client for a script app: password-grant OAuth, submit, comment.

use crate::config::Credentials;
use crate::publisher::{PostDraft, Publisher, Submitted};
use anyhow::{anyhow, bail, Context, Result};
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
}

struct Token {
    value: String,
    expires_at: Instant,
}

pub struct RedditClient {
    agent: ureq::Agent,
    creds: Credentials,
    token: Option<Token>,
    token_url: String,
    api_base: String,
}

impl RedditClient {
    pub fn new(creds: Credentials) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(30)))
            .user_agent(creds.user_agent.as_str())
            .build()
            .new_agent();
        Self {
            agent,
            creds,
            token: None,
            token_url: TOKEN_URL.to_string(),
            api_base: REDDIT_API_BASE.to_string(),
        }
    }

    /// Point the client at other hosts (a local stand-in server, a proxy).
    pub fn with_endpoints(mut self, token_url: impl Into<String>, api_base: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Fetch a fresh access token with the password grant.
    pub fn authenticate(&mut self) -> Result<()> {
        let basic = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", self.creds.client_id, self.creds.client_secret));
        let mut resp = self
            .agent
            .post(&self.token_url)
            .header("Authorization", format!("Basic {basic}"))
            .send_form([
                ("grant_type", "password"),
                ("username", self.creds.username.as_str()),
                ("password", self.creds.password.as_str()),
            ])
            .context("token request failed")?;
        let body = resp.body_mut().read_to_string().context("read token response")?;
        let parsed: TokenResponse = serde_json::from_str(&body).context("parse token response")?;

        if let Some(err) = parsed.error {
            bail!("reddit auth rejected: {err}");
        }
        let value = parsed.access_token.ok_or_else(|| anyhow!("token response without access_token"))?;
        let ttl = parsed.expires_in.unwrap_or(3600).saturating_sub(60);
        self.token = Some(Token { value, expires_at: Instant::now() + Duration::from_secs(ttl) });
        tracing::info!("Authenticated to reddit as u/{}", self.creds.username);
        Ok(())
    }

    fn bearer(&mut self) -> Result<String> {
        let fresh = self.token.as_ref().is_some_and(|t| Instant::now() < t.expires_at);
        if !fresh {
            self.authenticate()?;
        }
        self.token
            .as_ref()
            .map(|t| format!("bearer {}", t.value))
            .ok_or_else(|| anyhow!("no access token"))
    }

    /// POST a form to an API endpoint and return the decoded JSON body.
    /// A 401 drops the cached token so the next call re-authenticates.
    fn post_form(&mut self, endpoint: &str, form: &[(&str, &str)]) -> Result<Value> {
        let auth = self.bearer()?;
        let url = format!("{}{endpoint}", self.api_base);
        tracing::debug!("POST {}", endpoint);
        let result = self
            .agent
            .post(&url)
            .header("Authorization", auth)
            .send_form(form.iter().copied());
        let mut resp = match result {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(401)) => {
                self.token = None;
                bail!("{endpoint}: unauthorized (token dropped, will re-authenticate)");
            }
            Err(ureq::Error::StatusCode(429)) => bail!("{endpoint}: rate limited"),
            Err(e) => return Err(e).with_context(|| format!("POST {endpoint}")),
        };
        let body = resp.body_mut().read_to_string().with_context(|| format!("read {endpoint} response"))?;
        serde_json::from_str(&body).with_context(|| format!("parse {endpoint} response"))
    }
}

/// `{"json": {"errors": [[code, message, field], ...]}}` → Err when non-empty.
fn api_errors(v: &Value) -> Result<()> {
    let errors = v.pointer("/json/errors").and_then(|e| e.as_array());
    match errors {
        Some(list) if !list.is_empty() => {
            let msgs: Vec<String> = list
                .iter()
                .map(|e| match e.as_array() {
                    Some(parts) => parts.iter().filter_map(|p| p.as_str()).collect::<Vec<_>>().join(": "),
                    None => e.to_string(),
                })
                .collect();
            bail!("{}", msgs.join("; "))
        }
        _ => Ok(()),
    }
}

/// Decode an `api_type=json` response from `/api/submit` or `/api/comment`.
///
/// Submissions carry `json.data.name`; comments nest it under
/// `json.data.things[0].data.name`. A non-empty `errors` list or a missing
/// fullname is an error.
pub fn submission_result(v: &Value) -> Result<Submitted> {
    api_errors(v)?;
    let data = v.pointer("/json/data");
    let name = data
        .and_then(|d| d.get("name"))
        .or_else(|| data.and_then(|d| d.pointer("/things/0/data/name")))
        .and_then(|n| n.as_str())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| anyhow!("response carries no fullname: {v}"))?;
    let url = data
        .and_then(|d| d.get("url").or_else(|| d.pointer("/things/0/data/permalink")))
        .and_then(|u| u.as_str())
        .map(str::to_string);
    Ok(Submitted { name: name.to_string(), url })
}

impl Publisher for RedditClient {
    fn submit_post(&mut self, draft: &PostDraft) -> Result<Submitted> {
        let mut form: Vec<(&str, &str)> = vec![
            ("api_type", "json"),
            ("sr", draft.subreddit.as_str()),
            ("title", draft.title.as_str()),
            ("resubmit", "true"),
        ];
        match &draft.link {
            Some(url) => {
                form.push(("kind", "link"));
                form.push(("url", url.as_str()));
            }
            None => {
                form.push(("kind", "self"));
                form.push(("text", draft.text.as_str()));
            }
        }
        if draft.nsfw {
            form.push(("nsfw", "true"));
        }
        let v = self.post_form("/api/submit", &form)?;
        submission_result(&v).context("/api/submit rejected")
    }

    fn submit_comment(&mut self, parent: &str, text: &str) -> Result<Submitted> {
        let v = self.post_form("/api/comment", &[("api_type", "json"), ("thing_id", parent), ("text", text)])?;
        submission_result(&v).context("/api/comment rejected")
    }
}
