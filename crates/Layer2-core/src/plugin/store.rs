//! Plugin Record Store - 플러그인 레코드 영속화
//!
//! plugins.json을 통해 플러그인 디스크립터 컬렉션을 관리합니다.
//! 코어는 이 트레이트만 소비하며, 활성 토글이 코어가 간접적으로
//! 유발하는 유일한 변이입니다.

use super::descriptor::PluginDescriptor;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use verse_foundation::{Error, JsonStore, Result};

/// plugins.json 파일 이름
pub const PLUGINS_FILE: &str = "plugins.json";

// ============================================================================
// PluginRecordStore Trait
// ============================================================================

/// 플러그인 레코드 스토어
#[async_trait]
pub trait PluginRecordStore: Send + Sync {
    /// slug로 조회
    async fn find_by_slug(&self, slug: &str) -> Result<Option<PluginDescriptor>>;

    /// 전체 조회
    async fn find_all(&self) -> Result<Vec<PluginDescriptor>>;

    /// 활성 플러그인만 조회
    async fn find_all_active(&self) -> Result<Vec<PluginDescriptor>>;

    /// 새 레코드 생성 - slug 중복은 `Error::Duplicate`
    async fn create(&self, descriptor: PluginDescriptor) -> Result<PluginDescriptor>;

    /// 레코드 갱신 (id 기준)
    async fn update(&self, descriptor: PluginDescriptor) -> Result<PluginDescriptor>;

    /// 레코드 삭제 (id 기준) - 없으면 false
    async fn delete(&self, id: &str) -> Result<bool>;

    /// 활성 플래그 반전 후 영속화
    async fn toggle_active(&self, slug: &str) -> Result<PluginDescriptor>;
}

// ============================================================================
// 공용 컬렉션 변이 로직
// ============================================================================

fn create_record(
    records: &mut Vec<PluginDescriptor>,
    descriptor: PluginDescriptor,
) -> Result<PluginDescriptor> {
    if records.iter().any(|r| r.slug == descriptor.slug) {
        return Err(Error::Duplicate(format!(
            "Plugin slug already exists: {}",
            descriptor.slug
        )));
    }
    records.push(descriptor.clone());
    Ok(descriptor)
}

fn update_record(
    records: &mut [PluginDescriptor],
    mut descriptor: PluginDescriptor,
) -> Result<PluginDescriptor> {
    let existing = records
        .iter_mut()
        .find(|r| r.id == descriptor.id)
        .ok_or_else(|| Error::NotFound(format!("Plugin record not found: {}", descriptor.id)))?;

    descriptor.updated_at = Utc::now();
    *existing = descriptor.clone();
    Ok(descriptor)
}

fn toggle_record(records: &mut [PluginDescriptor], slug: &str) -> Result<PluginDescriptor> {
    let record = records
        .iter_mut()
        .find(|r| r.slug == slug)
        .ok_or_else(|| Error::NotFound(format!("Plugin not found: {}", slug)))?;

    record.is_active = !record.is_active;
    record.updated_at = Utc::now();
    info!(
        plugin = slug,
        is_active = record.is_active,
        "Toggled plugin active flag"
    );
    Ok(record.clone())
}

// ============================================================================
// MemoryPluginStore - 인메모리 구현
// ============================================================================

/// 인메모리 플러그인 레코드 스토어 (테스트/조립용)
pub struct MemoryPluginStore {
    records: RwLock<Vec<PluginDescriptor>>,
}

impl MemoryPluginStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// 시드 레코드와 함께 생성
    pub fn with_records(records: Vec<PluginDescriptor>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

impl Default for MemoryPluginStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginRecordStore for MemoryPluginStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<PluginDescriptor>> {
        Ok(self.records.read().iter().find(|r| r.slug == slug).cloned())
    }

    async fn find_all(&self) -> Result<Vec<PluginDescriptor>> {
        Ok(self.records.read().clone())
    }

    async fn find_all_active(&self) -> Result<Vec<PluginDescriptor>> {
        Ok(self
            .records
            .read()
            .iter()
            .filter(|r| r.is_active)
            .cloned()
            .collect())
    }

    async fn create(&self, descriptor: PluginDescriptor) -> Result<PluginDescriptor> {
        create_record(&mut self.records.write(), descriptor)
    }

    async fn update(&self, descriptor: PluginDescriptor) -> Result<PluginDescriptor> {
        update_record(&mut self.records.write(), descriptor)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }

    async fn toggle_active(&self, slug: &str) -> Result<PluginDescriptor> {
        toggle_record(&mut self.records.write(), slug)
    }
}

// ============================================================================
// JsonPluginStore - 파일 기반 구현
// ============================================================================

/// plugins.json 파일 구조
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PluginsFile {
    /// 파일 버전
    #[serde(default = "default_version")]
    version: String,

    /// 플러그인 레코드 목록
    #[serde(default)]
    plugins: Vec<PluginDescriptor>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for PluginsFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            plugins: Vec::new(),
        }
    }
}

/// JSON 파일 기반 플러그인 레코드 스토어
pub struct JsonPluginStore {
    store: JsonStore,
    cache: RwLock<Vec<PluginDescriptor>>,
}

impl JsonPluginStore {
    /// 저장소를 열고 기존 레코드를 로드
    pub fn open(store: JsonStore) -> Result<Self> {
        let file: PluginsFile = store.load_or_default(PLUGINS_FILE);
        debug!(count = file.plugins.len(), "Loaded plugin records");
        Ok(Self {
            store,
            cache: RwLock::new(file.plugins),
        })
    }

    fn persist(&self, records: &[PluginDescriptor]) -> Result<()> {
        let file = PluginsFile {
            version: default_version(),
            plugins: records.to_vec(),
        };
        self.store.save(PLUGINS_FILE, &file)
    }
}

#[async_trait]
impl PluginRecordStore for JsonPluginStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<PluginDescriptor>> {
        Ok(self.cache.read().iter().find(|r| r.slug == slug).cloned())
    }

    async fn find_all(&self) -> Result<Vec<PluginDescriptor>> {
        Ok(self.cache.read().clone())
    }

    async fn find_all_active(&self) -> Result<Vec<PluginDescriptor>> {
        Ok(self
            .cache
            .read()
            .iter()
            .filter(|r| r.is_active)
            .cloned()
            .collect())
    }

    async fn create(&self, descriptor: PluginDescriptor) -> Result<PluginDescriptor> {
        let mut cache = self.cache.write();
        let created = create_record(&mut cache, descriptor)?;
        self.persist(&cache)?;
        Ok(created)
    }

    async fn update(&self, descriptor: PluginDescriptor) -> Result<PluginDescriptor> {
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

    async fn toggle_active(&self, slug: &str) -> Result<PluginDescriptor> {
        let mut cache = self.cache.write();
        let toggled = toggle_record(&mut cache, slug)?;
        self.persist(&cache)?;
        Ok(toggled)
    }
}

// ============================================================================
// 테스트
// ============================================================================
