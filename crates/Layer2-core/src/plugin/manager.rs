//! Plugin Manager - 플러그인 라이프사이클 관리
//!
//! 레코드 스토어에서 디스크립터를 읽어 모듈을 해석하고, 의존성을
//! 먼저 로드한 뒤 훅을 등록합니다. 언로드는 해당 플러그인의 훅을
//! 일괄 회수합니다.
//!
//! ## 실패 의미론
//!
//! - 구조적 실패 (미존재/비활성/의존성/모듈/init): 로드 전체 중단, 호출자에게 전파
//! - 심볼 하나 누락: 경고 후 그 훅 항목만 건너뜀 (부분 등록 허용)

use super::descriptor::{ComponentSpec, PluginDescriptor};
use super::resolver::ModuleResolver;
use super::store::PluginRecordStore;
use super::traits::{Component, ComponentSource, PluginModule};
use crate::hook::{names, HookDispatcher};
use futures::future::BoxFuture;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use verse_foundation::{Error, Result};

// ============================================================================
// 설정
// ============================================================================

/// 플러그인 매니저 설정
#[derive(Debug, Clone)]
pub struct PluginManagerConfig {
    /// true면 `load_all_plugins`가 첫 실패에서 중단
    pub fail_fast: bool,
}

impl Default for PluginManagerConfig {
    fn default() -> Self {
        Self { fail_fast: false }
    }
}

// ============================================================================
// LoadedPlugin - 런타임 레지스트리 엔트리
// ============================================================================

/// 로드된 플러그인 (런타임 전용, 영속화되지 않음)
pub struct LoadedPlugin {
    /// 로드 시점의 디스크립터
    pub descriptor: PluginDescriptor,

    /// 해석된 모듈
    pub module: Arc<dyn PluginModule>,
}

// ============================================================================
// PluginManager
// ============================================================================

/// 플러그인 매니저 - 로드/언로드/리로드와 컴포넌트 조회
pub struct PluginManager {
    /// 레코드 스토어
    store: Arc<dyn PluginRecordStore>,

    /// 모듈 해석기
    resolver: Arc<dyn ModuleResolver>,

    /// 훅 디스패처
    hooks: Arc<HookDispatcher>,

    /// 로드된 플러그인 맵 (slug -> LoadedPlugin)
    loaded: RwLock<HashMap<String, LoadedPlugin>>,

    /// 최상위 로드 직렬화 락
    ///
    /// 같은 slug에 대한 동시 로드가 훅을 이중 등록하는 것을 막습니다.
    load_lock: Mutex<()>,

    /// 설정
    config: PluginManagerConfig,
}

impl PluginManager {
    /// 새 매니저 생성
    pub fn new(
        store: Arc<dyn PluginRecordStore>,
        resolver: Arc<dyn ModuleResolver>,
        hooks: Arc<HookDispatcher>,
    ) -> Self {
        Self::with_config(store, resolver, hooks, PluginManagerConfig::default())
    }

    /// 설정으로 생성
    pub fn with_config(
        store: Arc<dyn PluginRecordStore>,
        resolver: Arc<dyn ModuleResolver>,
        hooks: Arc<HookDispatcher>,
        config: PluginManagerConfig,
    ) -> Self {
        Self {
            store,
            resolver,
            hooks,
            loaded: RwLock::new(HashMap::new()),
            load_lock: Mutex::new(()),
            config,
        }
    }

    /// 훅 디스패처 접근
    pub fn hooks(&self) -> &Arc<HookDispatcher> {
        &self.hooks
    }

    // ========================================================================
    // 로드 / 언로드
    // ========================================================================

    /// 플러그인 로드
    ///
    /// 의존성이 먼저 로드된 뒤에야 플러그인 자신의 모듈이 해석됩니다.
    /// 이미 로드된 플러그인은 no-op입니다.
    pub async fn load_plugin(&self, slug: &str) -> Result<()> {
        let _guard = self.load_lock.lock().await;
        let mut stack = Vec::new();
        self.load_plugin_inner(slug.to_string(), &mut stack).await
    }

    /// 재귀 로드 본체
    ///
    /// `stack`은 현재 재귀 체인입니다. 체인 안의 slug를 다시 만나면
    /// 의존성 사이클이므로 `Error::Dependency`로 중단합니다. 에러 시
    /// 로드 전체가 중단되므로 스택은 복구하지 않습니다.
    fn load_plugin_inner<'a>(
        &'a self,
        slug: String,
        stack: &'a mut Vec<String>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if self.is_plugin_loaded(&slug) {
                return Ok(());
            }

            if stack.contains(&slug) {
                let chain = stack.join(" -> ");
                let dependent = stack.last().cloned().unwrap_or_default();
                return Err(Error::dependency(
                    dependent,
                    &slug,
                    format!("dependency cycle: {} -> {}", chain, slug),
                ));
            }

            let descriptor = self
                .store
                .find_by_slug(&slug)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Plugin not found: {}", slug)))?;

            if !descriptor.is_active {
                return Err(Error::Inactive(slug.clone()));
            }

            info!(plugin = %slug, version = %descriptor.version, "Loading plugin");
            stack.push(slug.clone());

            // 의존성 선(先)로드 - 의존성 완료 전에는 모듈을 해석하지 않음
            for dep in &descriptor.dependencies {
                if self.is_plugin_loaded(dep) {
                    continue;
                }
                self.load_plugin_inner(dep.clone(), &mut *stack)
                    .await
                    .map_err(|e| Error::dependency(&slug, dep, e.to_string()))?;
            }

            let module = self.resolver.resolve_module(descriptor.kind, &slug).await?;

            // init 실패는 로드 전체를 중단
            if let Err(e) = module.init(self.hooks.as_ref()).await {
                error!(plugin = %slug, "Plugin init failed: {}", e);
                // init이 직접 등록한 훅까지 걷어낸다
                self.hooks.remove_owner_hooks(&slug);
                return Err(e);
            }

            // 훅 등록 - 없는 심볼은 그 항목만 건너뜀
            let table = module.callbacks();
            for hook in &descriptor.hooks {
                match table.get(&hook.callback_symbol) {
                    Some(callback) => {
                        self.hooks
                            .add_hook(&hook.name, callback.clone(), hook.priority, Some(&slug));
                    }
                    None => {
                        warn!(
                            plugin = %slug,
                            hook = %hook.name,
                            symbol = %hook.callback_symbol,
                            "Callback symbol not found in module, skipping hook"
                        );
                    }
                }
            }

            self.loaded.write().insert(
                slug.clone(),
                LoadedPlugin {
                    descriptor: descriptor.clone(),
                    module,
                },
            );
            stack.pop();

            self.hooks
                .do_action(names::PLUGIN_LOADED, &[serde_json::to_value(&descriptor)?]);

            info!(plugin = %slug, "Plugin loaded");
            Ok(())
        })
    }

    /// 모든 활성 플러그인 로드
    ///
    /// 플러그인 하나의 실패는 로깅되고 나머지 로드를 막지 않습니다
    /// (`fail_fast` 설정 시 즉시 중단). 로드된 수를 반환합니다.
    pub async fn load_all_plugins(&self) -> Result<usize> {
        let active = self.store.find_all_active().await?;
        let mut count = 0;

        for descriptor in active {
            match self.load_plugin(&descriptor.slug).await {
                Ok(()) => count += 1,
                Err(e) if !self.config.fail_fast => {
                    warn!(plugin = %descriptor.slug, "Failed to load plugin: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        info!(count, "Loaded active plugins");
        Ok(count)
    }

    /// 플러그인 언로드
    ///
    /// 로드되어 있지 않으면 no-op이며 false를 반환합니다.
    pub fn unload_plugin(&self, slug: &str) -> bool {
        let descriptor = {
            let loaded = self.loaded.read();
            match loaded.get(slug) {
                Some(plugin) => plugin.descriptor.clone(),
                None => return false,
            }
        };

        let removed = self.hooks.remove_owner_hooks(slug);
        self.loaded.write().remove(slug);
        debug!(plugin = slug, hooks_removed = removed, "Retracted plugin hooks");

        self.hooks.do_action(
            names::PLUGIN_UNLOADED,
            &[serde_json::to_value(&descriptor).unwrap_or(Value::Null)],
        );

        info!(plugin = slug, "Plugin unloaded");
        true
    }

    /// 플러그인 리로드
    ///
    /// 언로드 후 현재 해석 가능한 모듈로 다시 로드합니다. 리로드 후의
    /// 훅 상태는 단일 로드와 동일해야 합니다.
    pub async fn reload_plugin(&self, slug: &str) -> Result<()> {
        self.unload_plugin(slug);
        self.load_plugin(slug).await
    }

    /// 모든 플러그인 언로드 (teardown용)
    pub fn unload_all(&self) {
        let slugs: Vec<String> = self.loaded.read().keys().cloned().collect();
        for slug in slugs {
            self.unload_plugin(&slug);
        }
    }

    // ========================================================================
    // 컴포넌트 조회
    // ========================================================================

    /// 컴포넌트 ID로 렌더링 가능한 컴포넌트 해석
    ///
    /// 로드된 플러그인들의 선언 목록을 검색합니다. 해석 실패는 로깅 후
    /// "없음"으로 취급합니다.
    pub async fn get_component(&self, component_id: &str) -> Option<Arc<dyn Component>> {
        let found = {
            let loaded = self.loaded.read();
            loaded.values().find_map(|plugin| {
                plugin
                    .descriptor
                    .components
                    .iter()
                    .find(|c| c.id == component_id)
                    .map(|c| {
                        (
                            c.module_path.clone(),
                            plugin.descriptor.kind,
                            plugin.descriptor.slug.clone(),
                        )
                    })
            })
        };

        let (module_path, kind, slug) = found?;
        let source = ComponentSource::plugin(kind, slug);

        match self.resolver.resolve_component(&source, &module_path).await {
            Ok(component) => Some(component),
            Err(e) => {
                warn!(
                    component = component_id,
                    "Failed to resolve component: {}", e
                );
                None
            }
        }
    }

    /// 로드된 플러그인 전체의 컴포넌트 선언 목록
    pub fn get_available_components(&self) -> Vec<ComponentSpec> {
        let loaded = self.loaded.read();
        let mut components: Vec<ComponentSpec> = loaded
            .values()
            .flat_map(|p| p.descriptor.components.iter().cloned())
            .collect();
        components.sort_by(|a, b| a.id.cmp(&b.id));
        components
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// 로드된 플러그인 디스크립터 조회
    pub fn get_plugin(&self, slug: &str) -> Option<PluginDescriptor> {
        self.loaded.read().get(slug).map(|p| p.descriptor.clone())
    }

    /// 로드된 플러그인 전체 (slug 순 정렬)
    pub fn get_all_plugins(&self) -> Vec<PluginDescriptor> {
        let loaded = self.loaded.read();
        let mut plugins: Vec<PluginDescriptor> =
            loaded.values().map(|p| p.descriptor.clone()).collect();
        plugins.sort_by(|a, b| a.slug.cmp(&b.slug));
        plugins
    }

    /// 로드 여부 확인
    pub fn is_plugin_loaded(&self, slug: &str) -> bool {
        self.loaded.read().contains_key(slug)
    }

    /// 로드된 플러그인 수
    pub fn plugin_count(&self) -> usize {
        self.loaded.read().len()
    }
}

// ============================================================================
// 테스트
// ============================================================================
