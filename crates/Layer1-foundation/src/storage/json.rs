//! JSON 파일 저장소

use crate::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// JSON 문서 저장소
///
/// 하나의 디렉토리 아래 컬렉션 파일(`plugins.json`, `themes.json` 등)을
/// 읽고 씁니다. 동시성 제어는 호출자(레코드 스토어)가 담당합니다.
#[derive(Debug, Clone)]
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// 사용자 데이터 디렉토리 (~/.config/verse/)
    pub fn user_data() -> Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Cannot find config directory".to_string()))?
            .join("verse");
        Ok(Self::new(dir))
    }

    /// 사이트 로컬 데이터 (.verse/)
    pub fn site(root: impl Into<PathBuf>) -> Self {
        Self::new(root.into().join(".verse"))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.base_dir.join(filename)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.base_dir.exists() {
            std::fs::create_dir_all(&self.base_dir)
                .map_err(|e| Error::Storage(format!("Failed to create directory: {}", e)))?;
        }
        Ok(())
    }

    /// JSON 로드
    pub fn load<T: DeserializeOwned>(&self, filename: &str) -> Result<T> {
        let path = self.file_path(filename);
        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Storage(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Storage(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// JSON 로드 (파일이 없으면 기본값)
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, filename: &str) -> T {
        self.load(filename).unwrap_or_default()
    }

    /// JSON 로드 (Optional)
    pub fn load_optional<T: DeserializeOwned>(&self, filename: &str) -> Result<Option<T>> {
        let path = self.file_path(filename);
        if !path.exists() {
            return Ok(None);
        }
        self.load(filename).map(Some)
    }

    /// JSON 저장
    pub fn save<T: Serialize>(&self, filename: &str, data: &T) -> Result<()> {
        self.ensure_dir()?;
        let path = self.file_path(filename);
        let content = serde_json::to_string_pretty(data)
            .map_err(|e| Error::Storage(format!("Failed to serialize: {}", e)))?;
        std::fs::write(&path, content)
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", path.display(), e)))?;
        debug!(file = %path.display(), "Saved JSON document");
        Ok(())
    }

    /// 파일 존재 여부
    pub fn exists(&self, filename: &str) -> bool {
        self.file_path(filename).exists()
    }

    /// 파일 삭제
    pub fn remove(&self, filename: &str) -> Result<()> {
        let path = self.file_path(filename);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| {
                Error::Storage(format!("Failed to remove {}: {}", path.display(), e))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Doc {
        entries: Vec<String>,
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let store = JsonStore::new(temp.path().join("data"));

        let doc = Doc {
            entries: vec!["a".into(), "b".into()],
        };
        store.save("doc.json", &doc).unwrap();

        let loaded: Doc = store.load("doc.json").unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_load_optional_missing() {
        let temp = TempDir::new().unwrap();
        let store = JsonStore::new(temp.path());

        let loaded: Option<Doc> = store.load_optional("missing.json").unwrap();
        assert!(loaded.is_none());
        assert_eq!(store.load_or_default::<Doc>("missing.json"), Doc::default());
    }

    #[test]
    fn test_remove() {
        let temp = TempDir::new().unwrap();
        let store = JsonStore::new(temp.path());

        store.save("doc.json", &Doc::default()).unwrap();
        assert!(store.exists("doc.json"));

        store.remove("doc.json").unwrap();
        assert!(!store.exists("doc.json"));

        // 없는 파일 삭제는 no-op
        store.remove("doc.json").unwrap();
    }
}
