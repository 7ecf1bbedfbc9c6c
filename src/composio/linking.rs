use super::{ApiFailure, ComposioClient};
use crate::connection::{LinkError, LinkRecord, LinkRequest, LinkStatus, LinkingService};
use serde::Deserialize;
use serde_json::json;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Deserialize)]
struct ConnectedAccountList {
    #[serde(default)]
    items: Vec<LinkRecord>,
}

#[derive(Debug, Deserialize)]
struct InitiatedAccount {
    id: String,
    #[serde(default, alias = "redirect_uri")]
    redirect_url: Option<String>,
}

impl ComposioClient {
    fn connected_account(&self, id: &str, timeout: Duration) -> Result<LinkRecord, ApiFailure> {
        let path = format!("connected_accounts/{}", urlencoding::encode(id));
        self.get_json_within(&path, &[], timeout)
    }
}

impl LinkingService for ComposioClient {
    fn list_links(&self, user_id: &str) -> Result<Vec<LinkRecord>, LinkError> {
        let mut query = vec![("user_ids", user_id.to_string())];
        if let Some(auth_config_id) = &self.auth_config_id {
            query.push(("auth_config_ids", auth_config_id.clone()));
        }
        let list: ConnectedAccountList = self.get_json("connected_accounts", &query)?;
        Ok(list.items)
    }

    fn initiate(&self, user_id: &str, auth_config_id: &str) -> Result<LinkRequest, LinkError> {
        let body = json!({
            "auth_config": {"id": auth_config_id},
            "connection": {"user_id": user_id},
        });
        let account: InitiatedAccount = self.post_json("connected_accounts", &body)?;
        let redirect_url = account
            .redirect_url
            .filter(|url| !url.trim().is_empty())
            .ok_or(LinkError::MissingRedirectUrl)?;
        Ok(LinkRequest {
            id: account.id,
            redirect_url,
        })
    }

    fn wait_for_link(
        &self,
        request: &LinkRequest,
        timeout: Duration,
    ) -> Result<LinkRecord, LinkError> {
        let deadline = Instant::now() + timeout;
        let timed_out = || LinkError::Timeout {
            timeout_secs: timeout.as_secs(),
        };
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(timed_out());
            }

            // Each poll is capped by what is left of the deadline.
            let record = match self.connected_account(&request.id, remaining) {
                Ok(record) => record,
                Err(ApiFailure::Transport(_) | ApiFailure::Decode(_))
                    if Instant::now() >= deadline =>
                {
                    return Err(timed_out())
                }
                Err(failure) => return Err(failure.into()),
            };
            if record.status == LinkStatus::Active {
                return Ok(record);
            }
            if record.status.is_terminal_failure() {
                return Err(LinkError::LinkFailed {
                    id: record.id,
                    status: record.status,
                });
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            thread::sleep(self.poll_interval.min(remaining));
        }
    }
}
