use super::ComposioClient;
use crate::intent::ValidatedArguments;
use crate::repository::{ExecutionError, ExecutionResponse, RepositoryExecutor};
use serde_json::json;

impl RepositoryExecutor for ComposioClient {
    fn execute(
        &self,
        action_id: &str,
        user_id: &str,
        arguments: &ValidatedArguments,
    ) -> Result<ExecutionResponse, ExecutionError> {
        let path = format!("tools/execute/{}", urlencoding::encode(action_id));
        let body = json!({
            "user_id": user_id,
            "arguments": arguments,
        });
        Ok(self.post_json(&path, &body)?)
    }
}
