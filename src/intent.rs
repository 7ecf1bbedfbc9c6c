use serde::{Deserialize, Serialize};

pub mod arbiter;
pub mod arguments;
pub mod extract;
pub mod model;

pub use arbiter::{ParseOutcome, ParserArbiter, ParserSource, ResolvedFields};
pub use arguments::{build_arguments, ValidatedArguments, ValidationError};
pub use extract::extract_fields;
pub use model::{first_json_object, parse_model_reply, IntentParser, ParseError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PartialFields {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub private: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub auto_init: Option<bool>,
}

impl PartialFields {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.private.is_none()
            && self.description.is_none()
            && self.auto_init.is_none()
    }

    pub(crate) fn without_blank_text(mut self) -> Self {
        self.name = self.name.filter(|value| !value.trim().is_empty());
        self.description = self.description.filter(|value| !value.trim().is_empty());
        self
    }
}
