use log::error;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("Missing config with key \"{key}\"")]
    MissingConfig { key: String },

    #[error("Invalid value \"{value}\" for config key \"{key}\"")]
    InvalidConfig { key: String, value: String },

    #[error("Configuration error: {msg}")]
    ConfigurationError { msg: String },
}

impl AppError {
    /// Logs an unexpected error under a fresh reference id and returns the id,
    /// so users can quote it back without seeing internals.
    pub fn log_with_ref(error: &(dyn std::error::Error + 'static)) -> String {
        let ref_id = Uuid::new_v4().simple().to_string();
        error!("[ref {ref_id}] {error:?}");
        ref_id
    }
}
