use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};

pub const PUBLIC_PREFIX: &str = "/uploads";

pub trait StorageAdapter: Send + Sync {
    fn upload(&self, bytes: &[u8], path: &str) -> Result<String>;
    fn delete(&self, path: &str) -> Result<()>;
    fn url_for(&self, path: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            bail!("invalid storage path {path:?}");
        }
        Ok(self.root.join(relative))
    }
}

impl StorageAdapter for LocalStorage {
    fn upload(&self, bytes: &[u8], path: &str) -> Result<String> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&full, bytes).with_context(|| format!("failed to write {}", full.display()))?;
        Ok(self.url_for(path))
    }

    fn delete(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        match fs::remove_file(&full) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("failed to delete {}", full.display())),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{PUBLIC_PREFIX}/{path}")
    }
}

pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub fn timestamped_name(millis: i64, original: &str) -> String {
    format!("{millis}-{}", sanitize_filename(original))
}
