use super::PartialFields;
use crate::provider::{CompletionService, ServiceError};

pub const PARSER_SYSTEM_PROMPT: &str = "You are a strict parser. Given a user's instruction to create a GitHub repository, return JSON only with keys: name (string|null), private (true/false|null), description (string|null), auto_init (true/false|null). If a field is not specified, return null. No explanation.";
pub const PARSER_TEMPERATURE: f32 = 0.0;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("model parser is disabled")]
    Disabled,
    #[error("completion service call failed: {0}")]
    Service(#[from] ServiceError),
    #[error("model reply did not contain a json object")]
    NoJsonObject,
    #[error("model reply json could not be decoded: {0}")]
    InvalidJson(#[source] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct IntentParser<C> {
    service: C,
}

impl<C: CompletionService> IntentParser<C> {
    pub fn new(service: C) -> Self {
        Self { service }
    }

    pub fn parse_with_model(&self, text: &str) -> Result<PartialFields, ParseError> {
        let reply = self.service.complete(
            PARSER_SYSTEM_PROMPT,
            &format!("Instruction: {text}"),
            PARSER_TEMPERATURE,
        )?;
        parse_model_reply(&reply)
    }
}

pub fn parse_model_reply(reply: &str) -> Result<PartialFields, ParseError> {
    let object = first_json_object(reply).ok_or(ParseError::NoJsonObject)?;
    let fields: PartialFields = serde_json::from_str(object).map_err(ParseError::InvalidJson)?;
    Ok(fields.without_blank_text())
}

pub fn first_json_object(text: &str) -> Option<&str> {
    text.char_indices()
        .filter(|(_, ch)| *ch == '{')
        .find_map(|(start, _)| {
            balanced_object_end(&text[start..]).map(|end| &text[start..start + end])
        })
}

fn balanced_object_end(candidate: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in candidate.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}
