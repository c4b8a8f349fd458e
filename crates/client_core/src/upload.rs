//! File selection for the upload endpoint.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub const DEFAULT_UPLOAD_ACCEPT: &[&str] = &[".csv", ".jpg", ".jpeg", ".png"];

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("'{}' has no file name", path.display())]
    MissingFileName { path: PathBuf },
    #[error("'{filename}' is not an accepted upload type (accepted: {accepted})")]
    Rejected { filename: String, accepted: String },
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Extensions the file picker offers. An empty list accepts everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptList(Vec<String>);

impl AcceptList {
    /// Parses a comma separated list such as `.csv,.png`. Leading dots are optional.
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        )
    }

    pub fn any() -> Self {
        Self(Vec::new())
    }

    pub fn allows(&self, filename: &str) -> bool {
        if self.0.is_empty() {
            return true;
        }
        let Some(ext) = Path::new(filename).extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        let ext = ext.to_ascii_lowercase();
        self.0.iter().any(|accepted| *accepted == ext)
    }
}

impl Default for AcceptList {
    fn default() -> Self {
        Self::parse(&DEFAULT_UPLOAD_ACCEPT.join(","))
    }
}

impl std::fmt::Display for AcceptList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return f.write_str("any");
        }
        let listed = self
            .0
            .iter()
            .map(|ext| format!(".{ext}"))
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&listed)
    }
}

/// A selected file, consumed by the upload it is handed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let mime_type = mime_guess::from_path(&filename)
            .first_raw()
            .unwrap_or(FALLBACK_MIME_TYPE)
            .to_string();
        Self {
            filename,
            mime_type,
            bytes,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>, accept: &AcceptList) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| UploadError::MissingFileName {
                path: path.to_path_buf(),
            })?
            .to_string();

        if !accept.allows(&filename) {
            return Err(UploadError::Rejected {
                filename,
                accepted: accept.to_string(),
            });
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| UploadError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(filename, bytes))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        env, fs,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    #[test]
    fn default_accept_list_matches_file_picker_filter() {
        let accept = AcceptList::default();
        assert!(accept.allows("inventory.csv"));
        assert!(accept.allows("PHOTO.JPG"));
        assert!(accept.allows("banner.png"));
        assert!(!accept.allows("notes.txt"));
        assert!(!accept.allows("no_extension"));
        assert_eq!(accept.to_string(), ".csv,.jpg,.jpeg,.png");
    }

    #[test]
    fn empty_accept_list_allows_anything() {
        let accept = AcceptList::parse(" , ");
        assert_eq!(accept, AcceptList::any());
        assert!(accept.allows("anything.bin"));
    }

    #[test]
    fn guesses_mime_type_from_extension() {
        assert_eq!(FileUpload::new("a.csv", Vec::new()).mime_type, "text/csv");
        assert_eq!(FileUpload::new("a.png", Vec::new()).mime_type, "image/png");
        assert_eq!(
            FileUpload::new("a.unknownext", Vec::new()).mime_type,
            FALLBACK_MIME_TYPE
        );
    }

    #[tokio::test]
    async fn from_path_reads_accepted_files_and_rejects_others() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let temp_root = env::temp_dir().join(format!("store_operator_upload_test_{suffix}"));
        fs::create_dir_all(&temp_root).expect("temp root");

        let csv_path = temp_root.join("products.csv");
        fs::write(&csv_path, b"sku,name\nA1,Red Shoe\n").expect("write csv");
        let txt_path = temp_root.join("notes.txt");
        fs::write(&txt_path, b"hello").expect("write txt");

        let accept = AcceptList::default();
        let upload = FileUpload::from_path(&csv_path, &accept)
            .await
            .expect("csv accepted");
        assert_eq!(upload.filename, "products.csv");
        assert_eq!(upload.bytes, b"sku,name\nA1,Red Shoe\n");

        let err = FileUpload::from_path(&txt_path, &accept)
            .await
            .expect_err("txt rejected");
        assert!(matches!(err, UploadError::Rejected { .. }), "{err}");

        let err = FileUpload::from_path(temp_root.join("missing.csv"), &accept)
            .await
            .expect_err("missing file");
        assert!(matches!(err, UploadError::Read { .. }), "{err}");

        fs::remove_dir_all(temp_root).expect("cleanup");
    }
}
