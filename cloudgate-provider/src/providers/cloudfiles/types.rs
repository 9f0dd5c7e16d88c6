use serde::Deserialize;

// ============ Cloud Files listing types ============

/// Entry of `GET <account>?format=json`
#[derive(Debug, Deserialize)]
pub struct CloudFilesContainer {
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub bytes: u64,
}

/// Entry of `GET <account>/<container>?format=json`
#[derive(Debug, Deserialize)]
pub struct CloudFilesObject {
    pub name: String,
    #[serde(default)]
    pub bytes: u64,
    pub hash: Option<String>,
    pub content_type: Option<String>,
    pub last_modified: Option<String>,
}
