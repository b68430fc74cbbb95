use std::sync::Arc;

use crate::config::Config;
use crate::git::RepositoryAccessor;

/// Shared application state. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http_client: reqwest::Client,
    pub accessor: RepositoryAccessor,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let accessor = RepositoryAccessor::new()
            .with_git_token(config.git_token.clone())
            .with_scratch_dir(config.scratch_dir.clone());

        Ok(Self {
            config: Arc::new(config),
            http_client: reqwest::Client::builder().build()?,
            accessor,
        })
    }

    /// Use a different repository for requests that name neither a URL nor a
    /// local directory.
    #[must_use]
    pub fn with_ambient_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.accessor = self.accessor.with_ambient_dir(dir);
        self
    }
}
