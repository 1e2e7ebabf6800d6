use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait RepositoryDownloader {
    /// Clones `url` into `dest`. On failure nothing may be left behind at
    /// `dest`.
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

pub type DownloaderBox = Box<dyn RepositoryDownloader + Send + Sync>;
