use crate::shared::{EventLog, LogLevel};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkStatus {
    Initializing,
    Initiated,
    Active,
    Failed,
    Expired,
    Inactive,
    #[serde(other)]
    Unknown,
}

impl LinkStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "INITIALIZING",
            Self::Initiated => "INITIATED",
            Self::Active => "ACTIVE",
            Self::Failed => "FAILED",
            Self::Expired => "EXPIRED",
            Self::Inactive => "INACTIVE",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn is_terminal_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Expired)
    }
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkRecord {
    pub id: String,
    pub status: LinkStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRequest {
    pub id: String,
    pub redirect_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("timed out after {timeout_secs}s waiting for the account link")]
    Timeout { timeout_secs: u64 },
    #[error("linking request failed: {0}")]
    Transport(String),
    #[error("linking service responded with status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("linking service returned an unreadable response: {0}")]
    MalformedResponse(String),
    #[error("link initiation returned no redirect url")]
    MissingRedirectUrl,
    #[error("account link `{id}` ended with status {status}")]
    LinkFailed { id: String, status: LinkStatus },
}

pub trait LinkingService {
    fn list_links(&self, user_id: &str) -> Result<Vec<LinkRecord>, LinkError>;

    fn initiate(&self, user_id: &str, auth_config_id: &str) -> Result<LinkRequest, LinkError>;

    fn wait_for_link(
        &self,
        request: &LinkRequest,
        timeout: Duration,
    ) -> Result<LinkRecord, LinkError>;
}

impl<T: LinkingService + ?Sized> LinkingService for &T {
    fn list_links(&self, user_id: &str) -> Result<Vec<LinkRecord>, LinkError> {
        (**self).list_links(user_id)
    }

    fn initiate(&self, user_id: &str, auth_config_id: &str) -> Result<LinkRequest, LinkError> {
        (**self).initiate(user_id, auth_config_id)
    }

    fn wait_for_link(
        &self,
        request: &LinkRequest,
        timeout: Duration,
    ) -> Result<LinkRecord, LinkError> {
        (**self).wait_for_link(request, timeout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Unauthenticated,
    LinkPending(LinkRequest),
    Linked { account_id: String },
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::LinkPending(_) => "link_pending",
            Self::Linked { .. } => "linked",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Linked { account_id: String },
    NotLinked,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitiateOutcome {
    Pending { redirect_url: String },
    AlreadyLinked,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwaitOutcome {
    Linked { account_id: String },
    TimedOut,
    NotPending,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionNotice {
    VisitUrl(String),
    Waiting,
    Linked { account_id: String },
    Warning(String),
}

pub struct ConnectionStateMachine<L> {
    service: L,
    user_id: String,
    auth_config_id: String,
    state: ConnectionState,
    log: EventLog,
}

impl<L: LinkingService> ConnectionStateMachine<L> {
    pub fn new(service: L, user_id: &str, auth_config_id: &str, log: EventLog) -> Self {
        Self {
            service,
            user_id: user_id.to_string(),
            auth_config_id: auth_config_id.to_string(),
            state: ConnectionState::Unauthenticated,
            log,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_linked(&self) -> bool {
        matches!(self.state, ConnectionState::Linked { .. })
    }

    pub fn check_existing(&mut self) -> CheckOutcome {
        if let ConnectionState::Linked { account_id } = &self.state {
            return CheckOutcome::Linked {
                account_id: account_id.clone(),
            };
        }

        match self.service.list_links(&self.user_id) {
            Ok(records) => {
                let active = records
                    .into_iter()
                    .find(|record| record.status == LinkStatus::Active);
                match active {
                    Some(record) => {
                        self.transition_linked(&record.id, "connection.existing_link");
                        CheckOutcome::Linked {
                            account_id: record.id,
                        }
                    }
                    None => CheckOutcome::NotLinked,
                }
            }
            Err(err) => {
                let reason = err.to_string();
                self.log_failure("connection.check_failed", &reason);
                CheckOutcome::Failed { reason }
            }
        }
    }

    pub fn initiate_link(&mut self) -> InitiateOutcome {
        match &self.state {
            ConnectionState::Linked { .. } => return InitiateOutcome::AlreadyLinked,
            ConnectionState::LinkPending(request) => {
                return InitiateOutcome::Pending {
                    redirect_url: request.redirect_url.clone(),
                }
            }
            ConnectionState::Unauthenticated => {}
        }

        match self.service.initiate(&self.user_id, &self.auth_config_id) {
            Ok(request) => {
                let redirect_url = request.redirect_url.clone();
                self.log.append(
                    LogLevel::Info,
                    "connection.link_initiated",
                    "account link initiated",
                    &[("link_id", Value::from(request.id.as_str()))],
                );
                self.state = ConnectionState::LinkPending(request);
                InitiateOutcome::Pending { redirect_url }
            }
            Err(err) => {
                let reason = err.to_string();
                self.log_failure("connection.initiate_failed", &reason);
                InitiateOutcome::Failed { reason }
            }
        }
    }

    pub fn await_link(&mut self, timeout: Duration) -> AwaitOutcome {
        let request = match &self.state {
            ConnectionState::LinkPending(request) => request.clone(),
            ConnectionState::Linked { account_id } => {
                return AwaitOutcome::Linked {
                    account_id: account_id.clone(),
                }
            }
            ConnectionState::Unauthenticated => return AwaitOutcome::NotPending,
        };

        match self.service.wait_for_link(&request, timeout) {
            Ok(record) => {
                self.transition_linked(&record.id, "connection.link_completed");
                AwaitOutcome::Linked {
                    account_id: record.id,
                }
            }
            Err(LinkError::Timeout { .. }) => {
                self.log.warn(
                    "connection.await_timed_out",
                    &format!("no active link after {}s", timeout.as_secs()),
                );
                AwaitOutcome::TimedOut
            }
            Err(err @ LinkError::LinkFailed { .. }) => {
                // FAILED and EXPIRED requests never become active.
                let reason = err.to_string();
                self.log_failure("connection.link_failed", &reason);
                self.state = ConnectionState::Unauthenticated;
                AwaitOutcome::Failed { reason }
            }
            Err(err) => {
                let reason = err.to_string();
                self.log_failure("connection.await_failed", &reason);
                AwaitOutcome::Failed { reason }
            }
        }
    }

    pub fn ensure_linked<F>(&mut self, timeout: Duration, mut notify: F) -> bool
    where
        F: FnMut(ConnectionNotice),
    {
        if self.is_linked() {
            return true;
        }

        match self.check_existing() {
            CheckOutcome::Linked { account_id } => {
                notify(ConnectionNotice::Linked { account_id });
                return true;
            }
            CheckOutcome::Failed { reason } => {
                notify(ConnectionNotice::Warning(format!(
                    "could not check existing account links: {reason}"
                )));
                return false;
            }
            CheckOutcome::NotLinked => {}
        }

        match self.initiate_link() {
            InitiateOutcome::Pending { redirect_url } => {
                notify(ConnectionNotice::VisitUrl(redirect_url));
            }
            InitiateOutcome::AlreadyLinked => return true,
            InitiateOutcome::Failed { reason } => {
                notify(ConnectionNotice::Warning(format!(
                    "could not start account linking: {reason}"
                )));
                return false;
            }
        }

        notify(ConnectionNotice::Waiting);
        match self.await_link(timeout) {
            AwaitOutcome::Linked { account_id } => {
                notify(ConnectionNotice::Linked { account_id });
                true
            }
            AwaitOutcome::TimedOut => {
                notify(ConnectionNotice::Warning(
                    "account link not completed yet; finish it in the browser and try again"
                        .to_string(),
                ));
                false
            }
            AwaitOutcome::Failed { reason } => {
                notify(ConnectionNotice::Warning(format!(
                    "account linking failed: {reason}"
                )));
                false
            }
            AwaitOutcome::NotPending => false,
        }
    }

    fn transition_linked(&mut self, account_id: &str, event: &str) {
        self.log.append(
            LogLevel::Info,
            event,
            "account linked",
            &[
                ("account_id", Value::from(account_id)),
                ("previous_state", Value::from(self.state.as_str())),
            ],
        );
        self.state = ConnectionState::Linked {
            account_id: account_id.to_string(),
        };
    }

    fn log_failure(&self, event: &str, reason: &str) {
        self.log.append(
            LogLevel::Warn,
            event,
            reason,
            &[("state", Value::from(self.state.as_str()))],
        );
    }
}
