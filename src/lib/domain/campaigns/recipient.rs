//! Campaign recipients

use std::collections::HashMap;

use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

use super::template::TemplateFields;

/// Template field holding the recipient's display name
pub const NAME_FIELD: &str = "nome";

/// Template field holding the recipient's email address
pub const EMAIL_FIELD: &str = "email";

/// A single recipient of a bulk delivery
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Recipient {
    /// Opaque identifier from the contact store, numeric ids are kept as text
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<String>,

    /// The email address; must be non-empty before delivery is attempted
    #[serde(default)]
    pub email: String,

    /// The display name
    #[serde(default, alias = "nome")]
    pub name: Option<String>,

    /// Extra fields available to templates. Numbers and booleans are kept
    /// as text, `null` becomes an empty string.
    #[serde(flatten, deserialize_with = "deserialize_fields")]
    pub fields: HashMap<String, String>,
}

impl Recipient {
    /// Creates a recipient with an email address and a display name.
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Adds an extra template field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Returns the display name, or an empty string.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Returns `true` if the recipient has an address to deliver to.
    pub fn has_address(&self) -> bool {
        !self.email.trim().is_empty()
    }

    /// Builds the values templates are rendered against.
    ///
    /// `nome` and `email` always come from the recipient itself and cannot be
    /// shadowed by extra fields.
    pub fn template_fields(&self) -> TemplateFields {
        let mut fields = self.fields.clone();

        fields.insert(NAME_FIELD.to_string(), self.display_name().to_string());
        fields.insert(EMAIL_FIELD.to_string(), self.email.clone());

        fields
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) => Ok(Some(id)),
        Some(Value::Number(id)) => Ok(Some(id.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string or number id, found {other}"
        ))),
    }
}

fn deserialize_fields<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, Value>::deserialize(deserializer)?;

    Ok(raw
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Null => String::new(),
                Value::String(text) => text,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}
