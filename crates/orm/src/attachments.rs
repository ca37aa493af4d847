//! File attachments owned by a model record
//!
//! A model declares attachment relations with a store each. During save the
//! store receives `_delete` requests and uploads; during delete the owner's
//! whole directory is removed. Store failures are reported as validation
//! errors on the owning model, not as storage errors.

use crate::backends::DatabaseValue;
use async_trait::async_trait;
use dbwk_validation::{Rule, ValidationErrors, ValueKind};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A file received from a client, not yet stored
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Storage for the attachments of one relation
#[async_trait]
pub trait AttachmentStore: Send + Sync + fmt::Debug {
    /// Directory holding every attachment of `owner_id`
    fn directory(&self, owner_id: &DatabaseValue) -> PathBuf;

    /// Store `file` for `owner_id`
    async fn upload(&self, owner_id: &DatabaseValue, file: &UploadedFile) -> Result<(), ValidationErrors>;

    /// Remove the attachment described by `attributes` (at least `file_name`)
    async fn delete(&self, owner_id: &DatabaseValue, attributes: &Map<String, Value>) -> Result<(), ValidationErrors>;
}

/// Attachments stored as plain files under `<root>/<owner id>/`
#[derive(Debug, Clone)]
pub struct LocalAttachmentStore {
    root: PathBuf,
    max_size: Option<usize>,
    allowed_extensions: Vec<String>,
}

impl LocalAttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_size: None,
            allowed_extensions: Vec::new(),
        }
    }

    /// Reject uploads larger than `bytes`
    pub fn max_size(mut self, bytes: usize) -> Self {
        self.max_size = Some(bytes);
        self
    }

    /// Only accept these extensions (case-insensitive, without the dot)
    pub fn allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_extensions = extensions
            .into_iter()
            .map(|ext| ext.into().to_lowercase())
            .collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn owner_key(owner_id: &DatabaseValue) -> String {
        owner_id.identity_key().unwrap_or_else(|| "unsaved".to_string())
    }

    fn check_file_name(file_name: &str) -> Result<(), ValidationErrors> {
        let rule = Rule::new()
            .required(true)
            .error_empty("File name is empty")
            .kind(ValueKind::Filename)
            .error_type("File name is not allowed");
        rule.validate(&Value::String(file_name.to_string()))
            .map_err(|message| single_error("file_name", message))
    }

    fn check_extension(&self, file_name: &str) -> Result<(), ValidationErrors> {
        if self.allowed_extensions.is_empty() {
            return Ok(());
        }
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if self.allowed_extensions.contains(&extension) {
            Ok(())
        } else {
            Err(single_error(
                "file_name",
                format!("Files of type '{}' are not accepted", extension),
            ))
        }
    }
}

fn single_error(field: &str, message: impl Into<String>) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add_error(field, message);
    errors
}

#[async_trait]
impl AttachmentStore for LocalAttachmentStore {
    fn directory(&self, owner_id: &DatabaseValue) -> PathBuf {
        self.root.join(Self::owner_key(owner_id))
    }

    async fn upload(&self, owner_id: &DatabaseValue, file: &UploadedFile) -> Result<(), ValidationErrors> {
        Self::check_file_name(&file.file_name)?;
        self.check_extension(&file.file_name)?;
        if let Some(max) = self.max_size {
            if file.bytes.len() > max {
                return Err(single_error(
                    "file",
                    format!("File is larger than {} bytes", max),
                ));
            }
        }

        let directory = self.directory(owner_id);
        fs::create_dir_all(&directory).await.map_err(|e| {
            single_error("file", format!("Failed to create {}: {}", directory.display(), e))
        })?;

        let path = directory.join(&file.file_name);
        fs::write(&path, &file.bytes)
            .await
            .map_err(|e| single_error("file", format!("Failed to write {}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), size = file.bytes.len(), "Stored attachment");
        Ok(())
    }

    async fn delete(&self, owner_id: &DatabaseValue, attributes: &Map<String, Value>) -> Result<(), ValidationErrors> {
        let file_name = attributes
            .get("file_name")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Self::check_file_name(file_name)?;

        let path = self.directory(owner_id).join(file_name);
        if !path.exists() {
            return Err(single_error(
                "file_name",
                format!("Attachment '{}' does not exist", file_name),
            ));
        }

        fs::remove_file(&path)
            .await
            .map_err(|e| single_error("file", format!("Failed to remove {}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), "Removed attachment");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn attrs(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_upload_and_delete() {
        let temp_dir = tempdir().unwrap();
        let store = LocalAttachmentStore::new(temp_dir.path());
        let owner = DatabaseValue::Int(17);

        store
            .upload(&owner, &UploadedFile::new("report.pdf", b"%PDF".to_vec()))
            .await
            .unwrap();
        let stored = temp_dir.path().join("17").join("report.pdf");
        assert!(stored.exists());

        store
            .delete(&owner, &attrs(json!({"file_name": "report.pdf", "_delete": "1"})))
            .await
            .unwrap();
        assert!(!stored.exists());
    }

    #[tokio::test]
    async fn test_rejects_traversal_and_extensions() {
        let temp_dir = tempdir().unwrap();
        let store = LocalAttachmentStore::new(temp_dir.path()).allowed_extensions(["jpg"]);
        let owner = DatabaseValue::Int(1);

        let errors = store
            .upload(&owner, &UploadedFile::new("../escape.jpg", b"x".to_vec()))
            .await
            .unwrap_err();
        assert_eq!(errors.message("file_name"), Some("File name is not allowed"));

        let errors = store
            .upload(&owner, &UploadedFile::new("notes.txt", b"x".to_vec()))
            .await
            .unwrap_err();
        assert_eq!(
            errors.message("file_name"),
            Some("Files of type 'txt' are not accepted")
        );
    }

    #[tokio::test]
    async fn test_size_limit_and_missing_file() {
        let temp_dir = tempdir().unwrap();
        let store = LocalAttachmentStore::new(temp_dir.path()).max_size(2);
        let owner = DatabaseValue::Int(1);

        let errors = store
            .upload(&owner, &UploadedFile::new("big.bin", vec![0u8; 3]))
            .await
            .unwrap_err();
        assert!(errors.message("file").is_some());

        let errors = store
            .delete(&owner, &attrs(json!({"file_name": "ghost.bin"})))
            .await
            .unwrap_err();
        assert!(errors.has_field_errors("file_name"));
    }
}
