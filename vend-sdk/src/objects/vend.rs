use serde::{Deserialize, Serialize};

/// Form field carrying the channel address of a vend request.
pub const ADDRESS_FIELD: &str = "addr";

/// Fields of the vend form, sent as `application/x-www-form-urlencoded`.
///
/// The address is sent as typed; the server decides whether it names a
/// real channel. Extra fields (credentials, session tokens) follow it in
/// insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VendForm {
    fields: Vec<(String, String)>,
}

impl VendForm {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            fields: vec![(ADDRESS_FIELD.to_owned(), address.into())],
        }
    }

    /// Append an extra field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn address(&self) -> &str {
        self.fields
            .iter()
            .find(|(name, _)| name == ADDRESS_FIELD)
            .map(|(_, value)| value.as_str())
            .unwrap_or_default()
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// Error body returned alongside 4xx responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    /// Extract the server-supplied `error` message from a raw response body.
    ///
    /// Returns `None` if the body is not JSON or carries no `error` field.
    pub fn message_from(body: &str) -> Option<String> {
        serde_json::from_str::<ApiErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_keeps_address_first() {
        let form = VendForm::new("A1").with_field("apikey", "secret");
        assert_eq!(form.address(), "A1");
        assert_eq!(
            form.fields(),
            &[
                ("addr".to_string(), "A1".to_string()),
                ("apikey".to_string(), "secret".to_string()),
            ]
        );
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            ApiErrorBody::message_from(r#"{"error":"Item does not exist"}"#),
            Some("Item does not exist".to_string())
        );
        assert_eq!(ApiErrorBody::message_from(r#"{"other":1}"#), None);
        assert_eq!(ApiErrorBody::message_from("<html>bad gateway</html>"), None);
        assert_eq!(ApiErrorBody::message_from(""), None);
    }
}
