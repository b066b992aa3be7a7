#[derive(Debug, thiserror::Error)]
pub enum StampError {
    #[error("roster format error: {0}")]
    RosterFormat(String),

    #[error("failed to load PDF: {0}")]
    PdfLoad(String),

    #[error("failed to save PDF: {0}")]
    PdfSave(String),

    #[error("invalid overlay style: {0}")]
    StyleInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
