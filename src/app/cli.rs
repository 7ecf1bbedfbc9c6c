#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Chat,
    Parse,
    Help,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliInvocation {
    pub verb: CliVerb,
    pub command: Option<String>,
    pub offline: bool,
    pub args: Vec<String>,
}

pub const OFFLINE_FLAG: &str = "--offline";

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "chat" => CliVerb::Chat,
        "parse" => CliVerb::Parse,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn parse_cli_args(args: &[String]) -> CliInvocation {
    let offline = args.iter().any(|arg| arg == OFFLINE_FLAG);
    let rest: Vec<String> = args
        .iter()
        .filter(|arg| arg.as_str() != OFFLINE_FLAG)
        .cloned()
        .collect();

    match rest.split_first() {
        Some((verb, tail)) => CliInvocation {
            verb: parse_cli_verb(verb),
            command: Some(verb.clone()),
            offline,
            args: tail.to_vec(),
        },
        None => CliInvocation {
            verb: CliVerb::Chat,
            command: None,
            offline,
            args: Vec::new(),
        },
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Usage: repocraft [command] [--offline]".to_string(),
        String::new(),
        "Commands:".to_string(),
        "  chat                   Link your GitHub account and create repositories from plain text (default)".to_string(),
        "  parse <instruction>    Show the arguments an instruction resolves to, without creating anything".to_string(),
        "  help                   Show this help".to_string(),
        String::new(),
        "Flags:".to_string(),
        "  --offline              Skip the model parser and use the pattern fallback only".to_string(),
    ]
}

pub fn help_text() -> String {
    cli_help_lines().join("\n")
}
