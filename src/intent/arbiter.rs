use super::extract::extract_fields;
use super::model::{IntentParser, ParseError};
use super::PartialFields;
use crate::provider::CompletionService;
use crate::shared::{EventLog, LogLevel};
use serde_json::Value;

#[derive(Debug)]
pub enum ParseOutcome {
    Parsed(PartialFields),
    Failed(ParseError),
}

impl From<Result<PartialFields, ParseError>> for ParseOutcome {
    fn from(result: Result<PartialFields, ParseError>) -> Self {
        match result {
            Ok(fields) => Self::Parsed(fields),
            Err(err) => Self::Failed(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserSource {
    Model,
    Fallback { reason: String },
}

impl ParserSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Fallback { .. } => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFields {
    pub fields: PartialFields,
    pub source: ParserSource,
}

pub struct ParserArbiter<C> {
    primary: Option<IntentParser<C>>,
    log: EventLog,
}

impl<C: CompletionService> ParserArbiter<C> {
    pub fn new(service: C, log: EventLog) -> Self {
        Self {
            primary: Some(IntentParser::new(service)),
            log,
        }
    }

    pub fn fallback_only(log: EventLog) -> Self {
        Self { primary: None, log }
    }

    pub fn resolve(&self, text: &str) -> PartialFields {
        self.resolve_traced(text).fields
    }

    pub fn resolve_traced(&self, text: &str) -> ResolvedFields {
        let outcome = match &self.primary {
            Some(parser) => ParseOutcome::from(parser.parse_with_model(text)),
            None => ParseOutcome::Failed(ParseError::Disabled),
        };

        match outcome {
            ParseOutcome::Parsed(fields) => {
                self.log.info("parser.model_served", "model parser served the turn");
                ResolvedFields {
                    fields,
                    source: ParserSource::Model,
                }
            }
            ParseOutcome::Failed(err) => {
                let reason = err.to_string();
                let fields = extract_fields(text);
                self.log.append(
                    LogLevel::Warn,
                    "parser.fallback_served",
                    &reason,
                    &[("name_found", Value::Bool(fields.name.is_some()))],
                );
                ResolvedFields {
                    fields,
                    source: ParserSource::Fallback { reason },
                }
            }
        }
    }
}
