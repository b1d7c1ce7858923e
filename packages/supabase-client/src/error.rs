use thiserror::Error;

pub type Result<T> = std::result::Result<T, SupabaseError>;

#[derive(Debug, Error)]
pub enum SupabaseError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// PostgREST responded with a non-2xx status.
    #[error("supabase_{status}_{message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected row shape.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
