/// Error payload of an `error` event. Only `message` is read by the client;
/// the other fields are kept loose because their types vary between errors.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct ErrorDetails {
    #[serde(rename = "type", default)]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    param: Option<serde_json::Value>,
    #[serde(default)]
    event_id: Option<String>,
}

impl ErrorDetails {
    pub fn new(message: &str) -> Self {
        Self {
            error_type: None,
            code: None,
            message: message.to_string(),
            param: None,
            event_id: None,
        }
    }

    pub fn error_type(&self) -> Option<&str> {
        self.error_type.as_deref()
    }

    /// Error code as sent by the server; a string for most errors, a number
    /// for some HTTP-derived ones.
    pub fn code(&self) -> Option<&serde_json::Value> {
        self.code.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn param(&self) -> Option<&serde_json::Value> {
        self.param.as_ref()
    }

    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }
}
