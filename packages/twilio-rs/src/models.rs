use serde::Deserialize;

/// Message resource returned by `POST /Accounts/{sid}/Messages.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub sid: String,
    pub status: Option<String>,
    pub to: Option<String>,
    pub from: Option<String>,
    pub date_created: Option<String>,
    pub error_code: Option<i64>,
    pub error_message: Option<String>,
}

/// Error document Twilio sends alongside 4xx/5xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub code: Option<i64>,
    pub message: String,
    pub more_info: Option<String>,
    pub status: Option<u16>,
}

impl ApiErrorResponse {
    /// Best human-readable message for an error body, falling back to the raw text.
    pub fn message_from_body(body: &str) -> String {
        match serde_json::from_str::<ApiErrorResponse>(body) {
            Ok(err) => match err.code {
                Some(code) => format!("{} (code {})", err.message, code),
                None => err.message,
            },
            Err(_) => body.to_string(),
        }
    }
}
