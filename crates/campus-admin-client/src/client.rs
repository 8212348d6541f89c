//! HTTP client for the campus REST backend

use crate::{
    error::{ClientError, ClientResult},
    session::Session,
};
use campus_admin_core::{
    config::BackendConfig,
    form::{Part, Payload},
    record::{Record, RecordId},
    schema::{EntitySchema, encode_id},
};
use reqwest::{Client, RequestBuilder, Response, StatusCode, multipart};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

/// Token returned by a successful login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Bearer token
    pub token: String,
    /// Profile of the signed-in user, if the backend sends one
    #[serde(default)]
    pub user: Option<Value>,
}

/// Totals shown on the home dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardCounts {
    /// Admission leads received
    #[serde(default)]
    pub total_applications: u64,
    /// Contact messages received
    #[serde(default)]
    pub total_contacts: u64,
}

/// Everything the home dashboard needs
#[derive(Debug, Clone, Default)]
pub struct DashboardSummary {
    /// Totals
    pub counts: DashboardCounts,
    /// Latest admission leads
    pub recent_leads: Vec<Record>,
    /// Latest contact messages
    pub recent_contacts: Vec<Record>,
}

/// API client for the REST backend
///
/// Every authenticated call takes the caller's [`Session`] explicitly.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client with default timeouts
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        Self::from_config(&BackendConfig {
            base_url: base_url.into(),
            ..BackendConfig::default()
        })
    }

    /// Create a client from the backend configuration section
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn from_config(config: &BackendConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|source| ClientError::Transport {
                operation: "client setup".to_string(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Backend base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authed(request: RequestBuilder, session: &Session) -> RequestBuilder {
        request.header(reqwest::header::AUTHORIZATION, session.authorization())
    }

    async fn send(
        &self,
        request: RequestBuilder,
        operation: &str,
        path: &str,
    ) -> ClientResult<Response> {
        debug!(operation, path, "backend request");

        let response = request.send().await.map_err(|source| {
            warn!(operation, path, error = %source, "backend unreachable");
            ClientError::Transport {
                operation: operation.to_string(),
                source,
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        warn!(operation, path, %status, "backend returned error status");
        match status {
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound {
                path: path.to_string(),
            }),
            _ => Err(ClientError::Rejected {
                status,
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response, path: &str) -> ClientResult<T> {
        let bytes = response.bytes().await.map_err(|e| ClientError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Parse an optional record from a write response; empty bodies are fine
    async fn read_optional_record(response: Response) -> Option<Record> {
        let bytes = response.bytes().await.ok()?;
        serde_json::from_slice::<Value>(&bytes)
            .ok()
            .and_then(Record::from_value)
    }

    fn with_payload(request: RequestBuilder, payload: Payload) -> RequestBuilder {
        match payload {
            Payload::Json(body) => request.json(&body),
            Payload::Multipart(parts) => request.multipart(build_form(parts)),
        }
    }

    /// Exchange credentials for a token
    ///
    /// Any non-success status is returned as `Rejected` with its body, so
    /// the caller can show the backend's `detail`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable, rejects the
    /// credentials, or answers without a token.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        let path = "/api/login/";
        debug!(path, "backend request");

        let response = self
            .client
            .post(self.url(path))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                operation: "login".to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "login rejected");
            return Err(ClientError::Rejected {
                status,
                body: response.text().await.unwrap_or_default(),
            });
        }

        Self::read_json(response, path).await
    }

    /// Invalidate the token on the backend
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn logout(&self, session: &Session) -> ClientResult<()> {
        let path = "/api/logout/";
        let request = Self::authed(self.client.post(self.url(path)), session);
        self.send(request, "logout", path).await.map(drop)
    }

    /// Check that a token is still accepted
    ///
    /// Every non-success status counts as an expired session.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for any non-success status and `Transport`
    /// when the backend cannot be reached.
    pub async fn verify_token(&self, session: &Session) -> ClientResult<()> {
        let path = "/api/verify-token/";
        let request = Self::authed(self.client.get(self.url(path)), session);
        match self.send(request, "verify token", path).await {
            Ok(_) => Ok(()),
            Err(err @ ClientError::Transport { .. }) => Err(err),
            Err(_) => Err(ClientError::Unauthorized),
        }
    }

    /// Fetch a whole collection
    ///
    /// `category` is forwarded only for entities whose backend filters too.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, is rejected, or the body is not
    /// a list of objects.
    pub async fn list(
        &self,
        session: &Session,
        schema: &EntitySchema,
        category: Option<&str>,
    ) -> ClientResult<Vec<Record>> {
        let path = schema.list_endpoint(category);
        let request = Self::authed(self.client.get(self.url(&path)), session);
        let response = self.send(request, "list", &path).await?;
        let body: Value = Self::read_json(response, &path).await?;
        records_from(body, &path)
    }

    /// Fetch one record
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a 404, or another error if the request fails or
    /// the entity has no remote detail endpoint.
    pub async fn get(
        &self,
        session: &Session,
        schema: &EntitySchema,
        id: &RecordId,
    ) -> ClientResult<Record> {
        let path = schema.detail_endpoint(id)?;
        let request = Self::authed(self.client.get(self.url(&path)), session);
        let response = self.send(request, "detail", &path).await?;
        let body: Value = Self::read_json(response, &path).await?;
        Record::from_value(body).ok_or_else(|| ClientError::Decode {
            path,
            message: "expected a JSON object".to_string(),
        })
    }

    /// Create a record; returns the created record when the backend echoes it
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn create(
        &self,
        session: &Session,
        schema: &EntitySchema,
        payload: Payload,
    ) -> ClientResult<Option<Record>> {
        let path = schema.create_endpoint()?;
        let request = Self::authed(self.client.post(self.url(path)), session);
        let response = self
            .send(Self::with_payload(request, payload), "create", path)
            .await?;
        Ok(Self::read_optional_record(response).await)
    }

    /// Replace a record's editable fields
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn update(
        &self,
        session: &Session,
        schema: &EntitySchema,
        id: &RecordId,
        payload: Payload,
    ) -> ClientResult<Option<Record>> {
        let path = schema.update_endpoint(id)?;
        let request = Self::authed(self.client.put(self.url(&path)), session);
        let response = self
            .send(Self::with_payload(request, payload), "update", &path)
            .await?;
        Ok(Self::read_optional_record(response).await)
    }

    /// Delete a record
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn delete(
        &self,
        session: &Session,
        schema: &EntitySchema,
        id: &RecordId,
    ) -> ClientResult<()> {
        let path = schema.delete_endpoint(id)?;
        let request = Self::authed(self.client.delete(self.url(&path)), session);
        self.send(request, "delete", &path).await.map(drop)
    }

    /// Flip a course's top-choice flag; returns the updated course
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, is rejected, or does not
    /// return the course.
    pub async fn toggle_top_choice(&self, session: &Session, id: &RecordId) -> ClientResult<Record> {
        let path = format!("/api/courses/{}/toggle-top-choice/", encode_id(id));
        let request = Self::authed(self.client.post(self.url(&path)), session);
        let response = self.send(request, "toggle top choice", &path).await?;
        let body: Value = Self::read_json(response, &path).await?;
        Record::from_value(body).ok_or_else(|| ClientError::Decode {
            path,
            message: "expected the updated course".to_string(),
        })
    }

    /// Set an event's `is_active` flag with a partial JSON update
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn set_event_active(
        &self,
        session: &Session,
        schema: &EntitySchema,
        id: &RecordId,
        active: bool,
    ) -> ClientResult<Option<Record>> {
        let payload = Payload::Json(json!({ "is_active": active }));
        self.update(session, schema, id, payload).await
    }

    /// Totals for the home dashboard
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn dashboard_counts(&self, session: &Session) -> ClientResult<DashboardCounts> {
        let path = "/api/dashboard/counts/";
        let request = Self::authed(self.client.get(self.url(path)), session);
        let response = self.send(request, "dashboard counts", path).await?;
        Self::read_json(response, path).await
    }

    /// Latest admission leads
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn recent_leads(&self, session: &Session) -> ClientResult<Vec<Record>> {
        self.fetch_records(session, "/api/dashboard/recent-leads/", "recent leads")
            .await
    }

    /// Latest contact messages
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn recent_contacts(&self, session: &Session) -> ClientResult<Vec<Record>> {
        self.fetch_records(session, "/api/contact/recent/", "recent contacts")
            .await
    }

    /// Fetch the three dashboard resources concurrently; all must succeed
    ///
    /// # Errors
    ///
    /// Returns the first error among the three requests.
    pub async fn dashboard_summary(&self, session: &Session) -> ClientResult<DashboardSummary> {
        let (counts, recent_leads, recent_contacts) = tokio::try_join!(
            self.dashboard_counts(session),
            self.recent_leads(session),
            self.recent_contacts(session),
        )?;

        Ok(DashboardSummary {
            counts,
            recent_leads,
            recent_contacts,
        })
    }

    async fn fetch_records(
        &self,
        session: &Session,
        path: &str,
        operation: &str,
    ) -> ClientResult<Vec<Record>> {
        let request = Self::authed(self.client.get(self.url(path)), session);
        let response = self.send(request, operation, path).await?;
        let body: Value = Self::read_json(response, path).await?;
        records_from(body, path)
    }
}

/// Accept a bare array or a paginated `{"results": [...]}` envelope
fn records_from(body: Value, path: &str) -> ClientResult<Vec<Record>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("results").or_else(|| map.remove("data")) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(ClientError::Decode {
                    path: path.to_string(),
                    message: "expected a list".to_string(),
                });
            }
        },
        _ => {
            return Err(ClientError::Decode {
                path: path.to_string(),
                message: "expected a list".to_string(),
            });
        }
    };

    Ok(items.into_iter().filter_map(Record::from_value).collect())
}

fn build_form(parts: Vec<Part>) -> multipart::Form {
    parts
        .into_iter()
        .fold(multipart::Form::new(), |form, part| match part {
            Part::Text { name, value } => form.text(name, value),
            Part::File(upload) => {
                let file = multipart::Part::bytes(upload.bytes).file_name(upload.file_name);
                let file = match upload.content_type {
                    Some(mime) => match file.mime_str(&mime) {
                        Ok(typed) => typed,
                        Err(e) => {
                            warn!(field = %upload.field, error = %e, "ignoring invalid content type");
                            return form;
                        }
                    },
                    None => file,
                };
                form.part(upload.field, file)
            }
        })
}
