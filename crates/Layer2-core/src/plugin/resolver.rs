//! Module Resolver - 문자열 식별자로 코드/컴포넌트 해석
//!
//! 프로덕션과 테스트가 같은 트레이트 뒤에서 교체됩니다. 해석 실패는
//! 항상 타입이 있는 에러이며 조용한 miss는 없습니다.

use super::traits::{Component, ComponentSource, PluginModule};
use crate::plugin::descriptor::PluginKind;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use verse_foundation::{Error, Result};

// ============================================================================
// ModuleResolver Trait
// ============================================================================

/// 모듈/컴포넌트 해석기
#[async_trait]
pub trait ModuleResolver: Send + Sync {
    /// 플러그인 모듈 해석 (`kind` + `slug` 키)
    ///
    /// 실패는 `Error::ModuleLoad`로 보고합니다.
    async fn resolve_module(&self, kind: PluginKind, slug: &str) -> Result<Arc<dyn PluginModule>>;

    /// 컴포넌트 해석 (소유 주체 + 모듈 경로 키)
    ///
    /// 플러그인 컴포넌트와 테마 템플릿이 같은 연산을 씁니다.
    async fn resolve_component(
        &self,
        source: &ComponentSource,
        module_path: &str,
    ) -> Result<Arc<dyn Component>>;
}

// ============================================================================
// StaticModuleResolver - 인메모리 레지스트리 해석기
// ============================================================================

/// 컴파일타임에 등록된 모듈을 찾는 인메모리 해석기
///
/// 내장 플러그인/테마는 조립 지점(composition root)에서 자신의 모듈과
/// 컴포넌트를 등록합니다. 테스트도 같은 해석기를 씁니다.
pub struct StaticModuleResolver {
    modules: RwLock<HashMap<(PluginKind, String), Arc<dyn PluginModule>>>,
    components: RwLock<HashMap<(ComponentSource, String), Arc<dyn Component>>>,
}

impl StaticModuleResolver {
    /// 새 해석기 생성
    pub fn new() -> Self {
        Self {
            modules: RwLock::new(HashMap::new()),
            components: RwLock::new(HashMap::new()),
        }
    }

    /// 플러그인 모듈 등록
    pub fn register_module(
        &self,
        kind: PluginKind,
        slug: impl Into<String>,
        module: Arc<dyn PluginModule>,
    ) {
        let slug = slug.into();
        debug!(%kind, slug, "Registering plugin module");
        self.modules.write().insert((kind, slug), module);
    }

    /// 컴포넌트 등록
    pub fn register_component(
        &self,
        source: ComponentSource,
        module_path: impl Into<String>,
        component: Arc<dyn Component>,
    ) {
        let module_path = module_path.into();
        debug!(source = %source, module_path, "Registering component");
        self.components
            .write()
            .insert((source, module_path), component);
    }

    /// 등록된 모듈 수
    pub fn module_count(&self) -> usize {
        self.modules.read().len()
    }
}

impl Default for StaticModuleResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModuleResolver for StaticModuleResolver {
    async fn resolve_module(&self, kind: PluginKind, slug: &str) -> Result<Arc<dyn PluginModule>> {
        self.modules
            .read()
            .get(&(kind, slug.to_string()))
            .cloned()
            .ok_or_else(|| {
                Error::ModuleLoad(format!("No module registered for {} plugin '{}'", kind, slug))
            })
    }

    async fn resolve_component(
        &self,
        source: &ComponentSource,
        module_path: &str,
    ) -> Result<Arc<dyn Component>> {
        self.components
            .read()
            .get(&(source.clone(), module_path.to_string()))
            .cloned()
            .ok_or_else(|| {
                Error::ModuleLoad(format!(
                    "No component registered at '{}' for {}",
                    module_path, source
                ))
            })
    }
}
