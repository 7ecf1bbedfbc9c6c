use crate::intent::ValidatedArguments;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("repository action request failed: {0}")]
    Transport(String),
    #[error("repository action responded with status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("repository action returned an unreadable response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExecutionResponse {
    #[serde(default)]
    pub successful: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

pub trait RepositoryExecutor {
    fn execute(
        &self,
        action_id: &str,
        user_id: &str,
        arguments: &ValidatedArguments,
    ) -> Result<ExecutionResponse, ExecutionError>;
}

impl<T: RepositoryExecutor + ?Sized> RepositoryExecutor for &T {
    fn execute(
        &self,
        action_id: &str,
        user_id: &str,
        arguments: &ValidatedArguments,
    ) -> Result<ExecutionResponse, ExecutionError> {
        (**self).execute(action_id, user_id, arguments)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryCreationResult {
    Created { html_url: Option<String> },
    Failed { reason: String },
}

impl RepositoryCreationResult {
    pub fn from_response(response: &ExecutionResponse) -> Self {
        if response.successful {
            return Self::Created {
                html_url: response.data.as_ref().and_then(find_html_url),
            };
        }
        let reason = response
            .error
            .as_deref()
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .unwrap_or("executor reported failure without a reason")
            .to_string();
        Self::Failed { reason }
    }
}

// html_url is either on `data` itself or one object level down.
fn find_html_url(data: &Value) -> Option<String> {
    let direct = |value: &Value| {
        value
            .get("html_url")
            .and_then(Value::as_str)
            .filter(|url| !url.trim().is_empty())
            .map(str::to_string)
    };
    direct(data).or_else(|| data.as_object()?.values().find_map(direct))
}

pub fn create_repository<E: RepositoryExecutor>(
    executor: &E,
    action_id: &str,
    user_id: &str,
    arguments: &ValidatedArguments,
) -> Result<RepositoryCreationResult, ExecutionError> {
    executor
        .execute(action_id, user_id, arguments)
        .map(|response| RepositoryCreationResult::from_response(&response))
}
