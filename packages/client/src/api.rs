use common::{EntityKind, Role};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ClientError;
use crate::form::{FormBackend, SubmissionOutcome};

/// A successful login.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub id: i32,
    pub username: String,
    pub role: Role,
}

/// The viewer as resolved by the server.
#[derive(Debug, Deserialize)]
pub struct MeResponse {
    pub id: Option<i32>,
    pub username: Option<String>,
    pub role: Role,
}

/// Pagination metadata attached to list responses.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// One page of a list endpoint.
#[derive(Debug, Deserialize)]
pub struct ListPage {
    pub data: Vec<Value>,
    pub pagination: Pagination,
}

/// The structured error body every endpoint returns on failure.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Blocking HTTP client for the Registrar API.
///
/// Submission calls never turn server-side rejections into `Err`: they are
/// reduced to a [`SubmissionOutcome`] so a form can re-render with the
/// message. Only transport failures surface as errors.
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        ApiClient {
            base_url,
            token: None,
            http: Client::new(),
        }
    }

    /// Use a previously obtained bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Log in and remember the returned token for subsequent calls.
    pub fn login(&mut self, username: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let body = serde_json::json!({ "username": username, "password": password });
        let res = self
            .request(self.http.post(self.url("auth/login")))
            .json(&body)
            .send()?;
        let login: LoginResponse = expect_json(res)?;
        self.token = Some(login.token.clone());
        Ok(login)
    }

    /// Resolve the current viewer.
    pub fn me(&self) -> Result<MeResponse, ClientError> {
        let res = self.request(self.http.get(self.url("auth/me"))).send()?;
        expect_json(res)
    }

    /// Fetch one page of an entity's list endpoint.
    pub fn list(
        &self,
        entity: EntityKind,
        page: u64,
        filters: &[(&str, String)],
    ) -> Result<ListPage, ClientError> {
        let mut query: Vec<(&str, String)> = vec![("page", page.to_string())];
        query.extend(filters.iter().cloned());
        let res = self
            .request(self.http.get(self.url(collection_path(entity))))
            .query(&query)
            .send()?;
        expect_json(res)
    }

    /// Fetch a single record by ID.
    pub fn fetch(&self, entity: EntityKind, id: i32) -> Result<Value, ClientError> {
        let path = format!("{}/{}", collection_path(entity), id);
        let res = self.request(self.http.get(self.url(&path))).send()?;
        expect_json(res)
    }

    /// Create a record; rejections come back as an unsuccessful outcome.
    pub fn create(
        &self,
        entity: EntityKind,
        payload: &Value,
    ) -> Result<SubmissionOutcome, ClientError> {
        let res = self
            .request(self.http.post(self.url(collection_path(entity))))
            .json(payload)
            .send()?;
        Ok(reduce_submission(res))
    }

    /// Update a record; rejections come back as an unsuccessful outcome.
    pub fn update(
        &self,
        entity: EntityKind,
        id: i32,
        payload: &Value,
    ) -> Result<SubmissionOutcome, ClientError> {
        let path = format!("{}/{}", collection_path(entity), id);
        let res = self
            .request(self.http.patch(self.url(&path)))
            .json(payload)
            .send()?;
        Ok(reduce_submission(res))
    }

    /// Delete a record; rejections come back as an unsuccessful outcome.
    pub fn delete(&self, entity: EntityKind, id: i32) -> Result<SubmissionOutcome, ClientError> {
        let path = format!("{}/{}", collection_path(entity), id);
        let res = self.request(self.http.delete(self.url(&path))).send()?;
        Ok(reduce_submission(res))
    }

    /// Fetch the reference data an entity's form needs.
    pub fn form_options(&self, entity: EntityKind) -> Result<Value, ClientError> {
        let path = format!("forms/{}/options", entity);
        let res = self.request(self.http.get(self.url(&path))).send()?;
        expect_json(res)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

impl FormBackend for ApiClient {
    fn load_options(&self, entity: EntityKind) -> Result<Value, ClientError> {
        self.form_options(entity)
    }

    fn submit(
        &self,
        entity: EntityKind,
        id: Option<i32>,
        payload: &Value,
    ) -> Result<SubmissionOutcome, ClientError> {
        match id {
            Some(id) => self.update(entity, id, payload),
            None => self.create(entity, payload),
        }
    }
}

/// URL path segment of each entity's collection.
fn collection_path(entity: EntityKind) -> &'static str {
    match entity {
        EntityKind::Teacher => "teachers",
        EntityKind::Student => "students",
        EntityKind::Parent => "parents",
        EntityKind::Subject => "subjects",
        EntityKind::Class => "classes",
        EntityKind::Lesson => "lessons",
        EntityKind::Exam => "exams",
        EntityKind::Assignment => "assignments",
        EntityKind::Result => "results",
        EntityKind::Attendance => "attendance",
        EntityKind::Event => "events",
        EntityKind::Announcement => "announcements",
    }
}

/// Decode a success body, or turn a structured error body into `ClientError`.
fn expect_json<T: serde::de::DeserializeOwned>(res: Response) -> Result<T, ClientError> {
    let status = res.status();
    let text = res.text()?;
    if status.is_success() {
        serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.to_string()))
    } else {
        Err(api_error(status, &text))
    }
}

/// Reduce a submission response to `{success, error}` (spec'd contract of
/// every form submission).
fn reduce_submission(res: Response) -> SubmissionOutcome {
    let status = res.status();
    if status.is_success() {
        return SubmissionOutcome {
            success: true,
            error: None,
        };
    }
    let message = match res.text() {
        Ok(text) => match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => body.message,
            Err(_) => format!("submission failed with status {}", status),
        },
        Err(_) => format!("submission failed with status {}", status),
    };
    SubmissionOutcome {
        success: false,
        error: Some(message),
    }
}

fn api_error(status: StatusCode, text: &str) -> ClientError {
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(body) => ClientError::Api {
            code: body.code,
            message: body.message,
        },
        Err(_) => ClientError::Decode(format!("status {status}: {text}")),
    }
}
