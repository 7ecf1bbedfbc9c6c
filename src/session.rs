use crate::connection::{ConnectionNotice, ConnectionStateMachine, LinkingService};
use crate::intent::{build_arguments, ParserArbiter, ParserSource, ValidatedArguments};
use crate::provider::CompletionService;
use crate::repository::{create_repository, RepositoryCreationResult, RepositoryExecutor};
use crate::shared::{EventLog, LogLevel};
use serde_json::Value;
use std::io::{self, BufRead, Write};
use std::time::Duration;

pub const SESSION_EXIT_COMMANDS: &[&str] = &["exit", "quit"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub action_id: String,
    pub user_id: String,
    pub link_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    NotLinked,
    MissingName {
        source: ParserSource,
    },
    Created {
        arguments: ValidatedArguments,
        html_url: Option<String>,
    },
    Failed {
        arguments: ValidatedArguments,
        reason: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub turns: usize,
    pub created: usize,
}

pub struct Session<C, L, E> {
    arbiter: ParserArbiter<C>,
    connection: ConnectionStateMachine<L>,
    executor: E,
    options: SessionOptions,
    log: EventLog,
}

pub fn is_session_exit_command(message: &str) -> bool {
    SESSION_EXIT_COMMANDS
        .iter()
        .any(|command| message.eq_ignore_ascii_case(command))
}

pub fn format_notice(notice: &ConnectionNotice) -> String {
    match notice {
        ConnectionNotice::VisitUrl(url) => {
            format!("visit this url to link your GitHub account:\n{url}")
        }
        ConnectionNotice::Waiting => {
            "waiting for you to complete authentication in the browser...".to_string()
        }
        ConnectionNotice::Linked { account_id } => format!("connected account: {account_id}"),
        ConnectionNotice::Warning(message) => format!("warning: {message}"),
    }
}

fn say<W: Write>(output: &mut W, line: &str) -> Result<(), String> {
    writeln!(output, "{line}").map_err(|e| format!("failed to write session output: {e}"))?;
    output
        .flush()
        .map_err(|e| format!("failed to flush session output: {e}"))
}

impl<C, L, E> Session<C, L, E>
where
    C: CompletionService,
    L: LinkingService,
    E: RepositoryExecutor,
{
    pub fn new(
        arbiter: ParserArbiter<C>,
        connection: ConnectionStateMachine<L>,
        executor: E,
        options: SessionOptions,
        log: EventLog,
    ) -> Self {
        Self {
            arbiter,
            connection,
            executor,
            options,
            log,
        }
    }

    pub fn connection(&self) -> &ConnectionStateMachine<L> {
        &self.connection
    }

    pub fn authenticate<W: Write>(&mut self, output: &mut W) -> Result<bool, String> {
        let mut write_error = None;
        let linked = self
            .connection
            .ensure_linked(self.options.link_timeout, |notice| {
                if write_error.is_none() {
                    write_error = say(output, &format_notice(&notice)).err();
                }
            });
        match write_error {
            Some(err) => Err(err),
            None => Ok(linked),
        }
    }

    pub fn handle_instruction<W: Write>(
        &mut self,
        text: &str,
        output: &mut W,
    ) -> Result<TurnOutcome, String> {
        if !self.connection.is_linked() && !self.authenticate(output)? {
            say(
                output,
                "account is not linked yet; the instruction was not executed",
            )?;
            return Ok(TurnOutcome::NotLinked);
        }

        let resolved = self.arbiter.resolve_traced(text);
        if matches!(resolved.source, ParserSource::Fallback { .. }) {
            say(output, "note: parsed with the pattern fallback")?;
        }

        let arguments = match build_arguments(&resolved.fields) {
            Ok(arguments) => arguments,
            Err(err) => {
                say(output, err.hint())?;
                return Ok(TurnOutcome::MissingName {
                    source: resolved.source,
                });
            }
        };

        say(
            output,
            &format!("creating repository with: {}", arguments.to_json()),
        )?;

        let result = create_repository(
            &self.executor,
            &self.options.action_id,
            &self.options.user_id,
            &arguments,
        );
        let outcome = match result {
            Ok(RepositoryCreationResult::Created { html_url }) => {
                let line = match &html_url {
                    Some(url) => format!("created repository: {url}"),
                    None => "created repository (no url returned)".to_string(),
                };
                self.log.append(
                    LogLevel::Info,
                    "repository.create_succeeded",
                    &line,
                    &[
                        ("name", Value::from(arguments.name())),
                        ("parser", Value::from(resolved.source.as_str())),
                    ],
                );
                say(output, &line)?;
                TurnOutcome::Created {
                    arguments,
                    html_url,
                }
            }
            Ok(RepositoryCreationResult::Failed { reason }) => {
                self.report_failure(output, &arguments, &reason)?;
                TurnOutcome::Failed { arguments, reason }
            }
            Err(err) => {
                let reason = err.to_string();
                self.report_failure(output, &arguments, &reason)?;
                TurnOutcome::Failed { arguments, reason }
            }
        };
        Ok(outcome)
    }

    fn report_failure<W: Write>(
        &self,
        output: &mut W,
        arguments: &ValidatedArguments,
        reason: &str,
    ) -> Result<(), String> {
        self.log.append(
            LogLevel::Error,
            "repository.create_failed",
            reason,
            &[("name", Value::from(arguments.name()))],
        );
        say(output, &format!("repository creation failed: {reason}"))
    }
}

pub fn run_session<C, L, E, R, W>(
    session: &mut Session<C, L, E>,
    input: &mut R,
    output: &mut W,
) -> Result<SessionSummary, String>
where
    C: CompletionService,
    L: LinkingService,
    E: RepositoryExecutor,
    R: BufRead,
    W: Write,
{
    say(output, "starting GitHub account link (if not already linked)...")?;
    if session.authenticate(output)? {
        session.log.info("session.started", "account linked at startup");
    }
    say(
        output,
        "describe the repository to create (type `exit` to quit)",
    )?;

    let mut summary = SessionSummary::default();
    loop {
        write!(output, "you> ").map_err(|e| format!("failed to write session prompt: {e}"))?;
        output
            .flush()
            .map_err(|e| format!("failed to flush session prompt: {e}"))?;

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .map_err(|e| format!("failed to read session input: {e}"))?;
        if read == 0 {
            break;
        }

        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if is_session_exit_command(message) {
            say(output, "bye")?;
            break;
        }

        summary.turns += 1;
        if let TurnOutcome::Created { .. } = session.handle_instruction(message, output)? {
            summary.created += 1;
        }
    }

    Ok(summary)
}

pub fn run_session_stdio<C, L, E>(
    session: &mut Session<C, L, E>,
) -> Result<SessionSummary, String>
where
    C: CompletionService,
    L: LinkingService,
    E: RepositoryExecutor,
{
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut output = stdout.lock();
    run_session(session, &mut input, &mut output)
}
