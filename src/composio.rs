use crate::connection::LinkError;
use crate::repository::ExecutionError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod linking;
pub mod tools;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ComposioClient {
    api_base: String,
    api_key: String,
    auth_config_id: Option<String>,
    poll_interval: Duration,
    request_timeout: Duration,
}

#[derive(Debug)]
pub(crate) enum ApiFailure {
    Transport(String),
    Http { status: u16, body: String },
    Decode(String),
}

impl From<ApiFailure> for LinkError {
    fn from(failure: ApiFailure) -> Self {
        match failure {
            ApiFailure::Transport(reason) => Self::Transport(reason),
            ApiFailure::Http { status, body } => Self::Http { status, body },
            ApiFailure::Decode(reason) => Self::MalformedResponse(reason),
        }
    }
}

impl From<ApiFailure> for ExecutionError {
    fn from(failure: ApiFailure) -> Self {
        match failure {
            ApiFailure::Transport(reason) => Self::Transport(reason),
            ApiFailure::Http { status, body } => Self::Http { status, body },
            ApiFailure::Decode(reason) => Self::MalformedResponse(reason),
        }
    }
}

fn map_ureq_error(err: ureq::Error) -> ApiFailure {
    match err {
        ureq::Error::Status(status, response) => ApiFailure::Http {
            status,
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => ApiFailure::Transport(transport.to_string()),
    }
}

impl ComposioClient {
    pub fn new(api_base: &str, api_key: &str) -> Self {
        Self {
            api_base: api_base.to_string(),
            api_key: api_key.to_string(),
            auth_config_id: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_auth_config(mut self, auth_config_id: &str) -> Self {
        self.auth_config_id = Some(auth_config_id.to_string());
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), path)
    }

    fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiFailure> {
        self.get_json_within(path, query, self.request_timeout)
    }

    fn get_json_within<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<T, ApiFailure> {
        let mut url = self.endpoint(path);
        if !query.is_empty() {
            let encoded = query
                .iter()
                .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            url = format!("{url}?{encoded}");
        }

        let response = ureq::get(&url)
            .timeout(timeout)
            .set("x-api-key", &self.api_key)
            .call()
            .map_err(map_ureq_error)?;

        response
            .into_json::<T>()
            .map_err(|e| ApiFailure::Decode(e.to_string()))
    }

    fn post_json<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiFailure> {
        let url = self.endpoint(path);
        let payload = serde_json::to_value(body).map_err(|e| ApiFailure::Decode(e.to_string()))?;
        let response = ureq::post(&url)
            .timeout(self.request_timeout)
            .set("x-api-key", &self.api_key)
            .send_json(payload)
            .map_err(map_ureq_error)?;

        response
            .into_json::<T>()
            .map_err(|e| ApiFailure::Decode(e.to_string()))
    }
}
