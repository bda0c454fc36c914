//! Theme Record Store - 테마 레코드 영속화
//!
//! themes.json을 통해 테마 디스크립터 컬렉션을 관리합니다.
//! `activate_exclusive`가 "활성 테마는 최대 하나" 불변식을 강제합니다.

use super::descriptor::ThemeDescriptor;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use verse_foundation::{Error, JsonStore, Result};

/// themes.json 파일 이름
pub const THEMES_FILE: &str = "themes.json";

// ============================================================================
// ThemeRecordStore Trait
// ============================================================================

/// 테마 레코드 스토어
#[async_trait]
pub trait ThemeRecordStore: Send + Sync {
    /// 활성 테마 조회 (없으면 None)
    async fn find_active(&self) -> Result<Option<ThemeDescriptor>>;

    /// slug로 조회
    async fn find_by_slug(&self, slug: &str) -> Result<Option<ThemeDescriptor>>;

    /// 전체 조회
    async fn find_all(&self) -> Result<Vec<ThemeDescriptor>>;

    /// 새 레코드 생성 - slug 중복은 `Error::Duplicate`
    async fn create(&self, descriptor: ThemeDescriptor) -> Result<ThemeDescriptor>;

    /// 레코드 갱신 (id 기준)
    async fn update(&self, descriptor: ThemeDescriptor) -> Result<ThemeDescriptor>;

    /// 레코드 삭제 (id 기준) - 없으면 false
    async fn delete(&self, id: &str) -> Result<bool>;

    /// 배타적 활성화
    ///
    /// 대상의 `is_active`를 세우고 나머지 전부를 원자적으로 내립니다.
    async fn activate_exclusive(&self, slug: &str) -> Result<ThemeDescriptor>;
}

// ============================================================================
// 공용 컬렉션 변이 로직
// ============================================================================

fn create_record(
    records: &mut Vec<ThemeDescriptor>,
    descriptor: ThemeDescriptor,
) -> Result<ThemeDescriptor> {
    if records.iter().any(|r| r.slug == descriptor.slug) {
        return Err(Error::Duplicate(format!(
            "Theme slug already exists: {}",
            descriptor.slug
        )));
    }
    records.push(descriptor.clone());
    Ok(descriptor)
}

fn update_record(
    records: &mut [ThemeDescriptor],
    mut descriptor: ThemeDescriptor,
) -> Result<ThemeDescriptor> {
    let existing = records
        .iter_mut()
        .find(|r| r.id == descriptor.id)
        .ok_or_else(|| Error::NotFound(format!("Theme record not found: {}", descriptor.id)))?;

    descriptor.updated_at = Utc::now();
    *existing = descriptor.clone();
    Ok(descriptor)
}

fn activate_record(records: &mut [ThemeDescriptor], slug: &str) -> Result<ThemeDescriptor> {
    if !records.iter().any(|r| r.slug == slug) {
        return Err(Error::NotFound(format!("Theme not found: {}", slug)));
    }

    let now = Utc::now();
    let mut activated = None;
    for record in records.iter_mut() {
        let should_be_active = record.slug == slug;
        if record.is_active != should_be_active {
            record.is_active = should_be_active;
            record.updated_at = now;
        }
        if should_be_active {
            activated = Some(record.clone());
        }
    }

    info!(theme = slug, "Activated theme exclusively");
    activated.ok_or_else(|| Error::Internal(format!("Activation lost record: {}", slug)))
}

// ============================================================================
// MemoryThemeStore - 인메모리 구현
// ============================================================================

/// 인메모리 테마 레코드 스토어 (테스트/조립용)
pub struct MemoryThemeStore {
    records: RwLock<Vec<ThemeDescriptor>>,
}

impl MemoryThemeStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// 시드 레코드와 함께 생성
    pub fn with_records(records: Vec<ThemeDescriptor>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

impl Default for MemoryThemeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ThemeRecordStore for MemoryThemeStore {
    async fn find_active(&self) -> Result<Option<ThemeDescriptor>> {
        Ok(self.records.read().iter().find(|r| r.is_active).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ThemeDescriptor>> {
        Ok(self.records.read().iter().find(|r| r.slug == slug).cloned())
    }

    async fn find_all(&self) -> Result<Vec<ThemeDescriptor>> {
        Ok(self.records.read().clone())
    }

    async fn create(&self, descriptor: ThemeDescriptor) -> Result<ThemeDescriptor> {
        create_record(&mut self.records.write(), descriptor)
    }

    async fn update(&self, descriptor: ThemeDescriptor) -> Result<ThemeDescriptor> {
        update_record(&mut self.records.write(), descriptor)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }

    async fn activate_exclusive(&self, slug: &str) -> Result<ThemeDescriptor> {
        activate_record(&mut self.records.write(), slug)
    }
}

// ============================================================================
// JsonThemeStore - 파일 기반 구현
// ============================================================================

/// themes.json 파일 구조
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ThemesFile {
    /// 파일 버전
    #[serde(default = "default_version")]
    version: String,

    /// 테마 레코드 목록
    #[serde(default)]
    themes: Vec<ThemeDescriptor>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for ThemesFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            themes: Vec::new(),
        }
    }
}

/// JSON 파일 기반 테마 레코드 스토어
pub struct JsonThemeStore {
    store: JsonStore,
    cache: RwLock<Vec<ThemeDescriptor>>,
}

impl JsonThemeStore {
    /// 저장소를 열고 기존 레코드를 로드
    pub fn open(store: JsonStore) -> Result<Self> {
        let file: ThemesFile = store.load_or_default(THEMES_FILE);
        debug!(count = file.themes.len(), "Loaded theme records");
        Ok(Self {
            store,
            cache: RwLock::new(file.themes),
        })
    }

    fn persist(&self, records: &[ThemeDescriptor]) -> Result<()> {
        let file = ThemesFile {
            version: default_version(),
            themes: records.to_vec(),
        };
        self.store.save(THEMES_FILE, &file)
    }
}

#[async_trait]
impl ThemeRecordStore for JsonThemeStore {
    async fn find_active(&self) -> Result<Option<ThemeDescriptor>> {
        Ok(self.cache.read().iter().find(|r| r.is_active).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ThemeDescriptor>> {
        Ok(self.cache.read().iter().find(|r| r.slug == slug).cloned())
    }

    async fn find_all(&self) -> Result<Vec<ThemeDescriptor>> {
        Ok(self.cache.read().clone())
    }

    async fn create(&self, descriptor: ThemeDescriptor) -> Result<ThemeDescriptor> {
        let mut cache = self.cache.write();
        let created = create_record(&mut cache, descriptor)?;
        self.persist(&cache)?;
        Ok(created)
    }

    async fn update(&self, descriptor: ThemeDescriptor) -> Result<ThemeDescriptor> {
        let mut cache = self.cache.write();
        let updated = update_record(&mut cache, descriptor)?;
        self.persist(&cache)?;
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut cache = self.cache.write();
        let before = cache.len();
        cache.retain(|r| r.id != id);
        let removed = cache.len() < before;
        if removed {
            self.persist(&cache)?;
        }
        Ok(removed)
    }

    async fn activate_exclusive(&self, slug: &str) -> Result<ThemeDescriptor> {
        let mut cache = self.cache.write();
        let activated = activate_record(&mut cache, slug)?;
        self.persist(&cache)?;
        Ok(activated)
    }
}

// ============================================================================
// 테스트
// ============================================================================
