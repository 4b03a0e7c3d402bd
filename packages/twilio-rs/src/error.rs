use thiserror::Error;

pub type Result<T> = std::result::Result<T, TwilioError>;

#[derive(Debug, Error)]
pub enum TwilioError {
    /// Request never produced a response (DNS, TLS, connection reset)
    #[error("Request to Twilio failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Twilio answered with a non-2xx status
    #[error("Twilio returned an error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse Twilio response: {0}")]
    Parse(String),
}
