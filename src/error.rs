#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("invalid graph document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate node id `{0}`")]
    DuplicateNode(String),
}

