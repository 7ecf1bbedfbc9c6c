use crate::app::cli::{help_text, parse_cli_args, CliVerb};
use crate::composio::ComposioClient;
use crate::config::{load_global_settings, load_parser_settings, ParserSettings};
use crate::connection::ConnectionStateMachine;
use crate::intent::{build_arguments, ParserArbiter, ResolvedFields};
use crate::provider::OpenAiClient;
use crate::session::{run_session_stdio, Session, SessionOptions};
use crate::shared::EventLog;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    let invocation = parse_cli_args(&args);
    match invocation.verb {
        CliVerb::Chat => cmd_chat(invocation.offline),
        CliVerb::Parse => cmd_parse(&invocation.args, invocation.offline),
        CliVerb::Help => Ok(help_text()),
        CliVerb::Unknown => Err(format!(
            "unknown command `{}`\n\n{}",
            invocation.command.as_deref().unwrap_or_default(),
            help_text()
        )),
    }
}

pub fn parser_arbiter(parser: &ParserSettings, log: EventLog) -> ParserArbiter<OpenAiClient> {
    match parser.openai_api_key.as_deref() {
        Some(api_key) if !parser.offline => ParserArbiter::new(
            OpenAiClient::new(&parser.openai_api_base, api_key, &parser.model),
            log,
        ),
        _ => ParserArbiter::fallback_only(log),
    }
}

pub fn render_resolved(resolved: &ResolvedFields) -> String {
    let mut lines = vec![format!("parser={}", resolved.source.as_str())];
    lines.push(format!(
        "fields={}",
        serde_json::to_string(&resolved.fields).unwrap_or_default()
    ));
    match build_arguments(&resolved.fields) {
        Ok(arguments) => lines.push(format!("arguments={}", arguments.to_json())),
        Err(err) => lines.push(format!("error={err}")),
    }
    lines.join("\n")
}

pub fn cmd_parse(args: &[String], offline: bool) -> Result<String, String> {
    let text = args.join(" ");
    if text.trim().is_empty() {
        return Err("usage: repocraft parse <instruction> [--offline]".to_string());
    }
    let parser = load_parser_settings(offline).map_err(|err| err.to_string())?;
    let arbiter = parser_arbiter(&parser, EventLog::disabled());
    Ok(render_resolved(&arbiter.resolve_traced(&text)))
}

pub fn cmd_chat(offline: bool) -> Result<String, String> {
    let settings = load_global_settings(offline).map_err(|err| err.to_string())?;
    let log = EventLog::for_state_root(&settings.state_root);

    let composio = ComposioClient::new(&settings.composio_api_base, &settings.composio_api_key)
        .with_auth_config(&settings.github_auth_config_id)
        .with_poll_interval(settings.link_poll_interval);
    let connection = ConnectionStateMachine::new(
        composio.clone(),
        &settings.user_id,
        &settings.github_auth_config_id,
        log.clone(),
    );
    let mut session = Session::new(
        parser_arbiter(&settings.parser, log.clone()),
        connection,
        composio,
        SessionOptions {
            action_id: settings.tool_slug.clone(),
            user_id: settings.user_id.clone(),
            link_timeout: settings.link_timeout,
        },
        log,
    );

    let summary = run_session_stdio(&mut session)?;
    Ok(format!(
        "session ended\nturns={}\ncreated={}",
        summary.turns, summary.created
    ))
}
