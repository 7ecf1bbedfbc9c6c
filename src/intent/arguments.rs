use super::PartialFields;
use serde::Serialize;
use serde_json::Value;

pub const MISSING_NAME_HINT: &str =
    "could not determine repository name. Try: create a repo called \"my-repo\"";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing name")]
    MissingName,
}

impl ValidationError {
    pub fn hint(&self) -> &'static str {
        match self {
            Self::MissingName => MISSING_NAME_HINT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedArguments {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auto_init: Option<bool>,
}

impl ValidatedArguments {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn private(&self) -> Option<bool> {
        self.private
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn auto_init(&self) -> Option<bool> {
        self.auto_init
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

pub fn build_arguments(fields: &PartialFields) -> Result<ValidatedArguments, ValidationError> {
    let name = fields
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(ValidationError::MissingName)?;

    Ok(ValidatedArguments {
        name: name.to_string(),
        private: fields.private,
        description: fields.description.clone(),
        auto_init: fields.auto_init,
    })
}
