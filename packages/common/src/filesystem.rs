use crate::result::CommonResult;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Storage abstraction for persisted documents and catalogs
pub trait FileSystem {
    /// Check if a file exists
    fn exists(&self, path: &Path) -> bool;

    fn read_to_string(&self, path: &Path) -> CommonResult<String>;

    fn write(&mut self, path: &Path, contents: &str) -> CommonResult<()>;

    /// Read and decode a JSON file
    fn read_json(&self, path: &Path) -> CommonResult<Value> {
        let source = self.read_to_string(path)?;
        Ok(serde_json::from_str(&source)?)
    }

    /// Encode and write a JSON file
    fn write_json(&mut self, path: &Path, value: &Value, pretty: bool) -> CommonResult<()> {
        let mut contents = if pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        contents.push('\n');
        self.write(path, &contents)
    }
}

/// Real file system implementation
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> CommonResult<String> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn write(&mut self, path: &Path, contents: &str) -> CommonResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(std::fs::write(path, contents)?)
    }
}

/// In-memory file system for testing
pub struct MockFileSystem {
    pub files: HashMap<PathBuf, String>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
        }
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into());
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read_to_string(&self, path: &Path) -> CommonResult<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
            .into()
        })
    }

    fn write(&mut self, path: &Path, contents: &str) -> CommonResult<()> {
        self.files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }
}
