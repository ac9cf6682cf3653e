use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::{Category, NewSession, SessionApi, SessionRecord};
use crate::error::ApiError;
use crate::storage::ApiConfig;

/// HTTP client bound to one backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
        // A trailing slash makes `join` append instead of replacing the last segment.
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: Url::parse(&base)?,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn from_config(api: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(
            &api.base_url,
            api.token.clone(),
            Duration::from_secs(api.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn parse<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp.json().await?)
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(ApiError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// `GET /categories/`
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let req = self.http.get(self.url("categories/")?);
        Self::parse(self.authorize(req).send().await?).await
    }

    /// `GET /sessions/?skip=&limit=`
    pub async fn list_sessions(&self, skip: u32, limit: u32) -> Result<Vec<SessionRecord>, ApiError> {
        let req = self
            .http
            .get(self.url("sessions/")?)
            .query(&[("skip", skip), ("limit", limit)]);
        Self::parse(self.authorize(req).send().await?).await
    }

    /// `GET /analytics/dashboard`, passed through untyped.
    pub async fn dashboard(&self) -> Result<serde_json::Value, ApiError> {
        let req = self.http.get(self.url("analytics/dashboard")?);
        Self::parse(self.authorize(req).send().await?).await
    }
}

#[async_trait]
impl SessionApi for ApiClient {
    /// `POST /sessions/`
    async fn create_session(&self, session: &NewSession) -> Result<SessionRecord, ApiError> {
        debug!(
            minutes = session.duration_minutes,
            status = ?session.status,
            "creating session"
        );
        let req = self.http.post(self.url("sessions/")?).json(session);
        Self::parse(self.authorize(req).send().await?).await
    }
}
