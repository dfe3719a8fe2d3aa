use std::{fs, path::PathBuf};

use anyhow::{Context, Result};

use crate::config::DirectoryConfig;

#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub logs_dir: PathBuf,
    pub pages_dir: PathBuf,
    pub keywords_dir: PathBuf,
}

/// Creates the log and page cache directories. The keyword directory is
/// only resolved: missing gold word files just mean empty lists.
pub fn ensure_directories(cfg: &DirectoryConfig) -> Result<ResolvedPaths> {
    let logs_dir = ensure_dir(&cfg.logs_dir)?;
    let pages_dir = ensure_dir(&cfg.pages_dir)?;
    let keywords_dir = PathBuf::from(&cfg.keywords_dir);
    if !keywords_dir.is_dir() {
        tracing::warn!(
            target: "app",
            dir = %keywords_dir.display(),
            "keyword directory not found; every gold word list will be empty"
        );
    }

    let write_test = pages_dir.join(".write-test");
    fs::write(&write_test, b"ok")
        .with_context(|| format!("page cache {} is not writable", pages_dir.display()))?;
    fs::remove_file(&write_test)?;
    Ok(ResolvedPaths {
        logs_dir,
        pages_dir,
        keywords_dir,
    })
}

fn ensure_dir(path: &str) -> Result<PathBuf> {
    let dir = PathBuf::from(path);
    if !dir.exists() {
        fs::create_dir_all(&dir).with_context(|| format!("failed to create directory {}", path))?;
    }
    Ok(dir.canonicalize().unwrap_or(dir))
}
