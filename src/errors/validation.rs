use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Field-level validation failures, keyed by attribute name.
///
/// Messages for a field keep the order in which they were added. Fields are
/// kept sorted so the serialized form is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Builder-style `add`
    pub fn with(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.add(field, message);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.values().all(Vec::is_empty)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn to_hash(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    /// Messages prefixed with a humanized attribute name, e.g. `Email can't be blank`.
    pub fn full_messages(&self) -> Vec<String> {
        self.fields
            .iter()
            .flat_map(|(field, messages)| {
                let attribute = humanize(field);
                messages
                    .iter()
                    .map(move |message| format!("{} {}", attribute, message))
            })
            .collect()
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_messages().join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

fn humanize(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_keep_insertion_order() {
        let mut errors = ValidationErrors::new();
        errors.add("password", "can't be blank");
        errors.add("password", "is too short (minimum is 6 characters)");

        assert_eq!(
            errors.get("password").unwrap(),
            ["can't be blank", "is too short (minimum is 6 characters)"]
        );
    }

    #[test]
    fn test_full_messages() {
        let errors = ValidationErrors::new()
            .with("email", "can't be blank")
            .with("encrypted_password", "can't be blank");

        assert_eq!(
            errors.full_messages(),
            vec!["Email can't be blank", "Encrypted password can't be blank"]
        );
        assert_eq!(
            errors.to_string(),
            "Email can't be blank, Encrypted password can't be blank"
        );
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let errors = ValidationErrors::new().with("email", "can't be blank");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({ "email": ["can't be blank"] }));
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());
        assert!(ValidationErrors::new()
            .with("email", "is invalid")
            .into_result()
            .is_err());
    }
}
