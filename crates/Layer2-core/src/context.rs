//! Extension Context - 확장 시스템 조립 지점
//!
//! 훅 디스패처, 플러그인 매니저, 테마 엔진을 하나의 컨텍스트로 묶습니다.
//! 모듈 전역 싱글턴 대신 애플리케이션 조립 지점이 이 객체를 소유하고
//! 참조로 전달합니다. 프로세스 안에 독립된 컨텍스트를 여러 개 만들 수
//! 있습니다 (테스트가 이에 의존합니다).
//!
//! ## 사용 예시
//! ```ignore
//! let ctx = ExtensionContext::builder()
//!     .with_plugin_store(plugin_store)
//!     .with_theme_store(theme_store)
//!     .with_resolver(resolver)
//!     .build();
//!
//! // 기동: 활성 플러그인 전체 + 활성 테마 로드
//! ctx.startup().await?;
//!
//! // 페이지 렌더링 경로
//! let html = ctx.themes().render_template("home", json!({ "title": "Hi" }));
//! let css = ctx.themes().css_variables();
//! ```

use crate::hook::HookDispatcher;
use crate::plugin::{
    MemoryPluginStore, ModuleResolver, PluginManager, PluginManagerConfig, PluginRecordStore,
    StaticModuleResolver,
};
use crate::theme::{MemoryThemeStore, ThemeEngine, ThemeRecordStore};
use std::sync::Arc;
use tracing::info;
use verse_foundation::Result;

// ============================================================================
// ExtensionContext
// ============================================================================

/// 확장 시스템 컨텍스트
///
/// 훅 레지스트리와 로드된 플러그인 맵은 이 컨텍스트 범위의 가변
/// 상태이며, 영속 레코드로부터 언제든 재구성할 수 있습니다.
pub struct ExtensionContext {
    hooks: Arc<HookDispatcher>,
    plugins: Arc<PluginManager>,
    themes: Arc<ThemeEngine>,
}

impl ExtensionContext {
    /// 빌더 시작
    pub fn builder() -> ExtensionContextBuilder {
        ExtensionContextBuilder::default()
    }

    /// 훅 디스패처
    pub fn hooks(&self) -> &Arc<HookDispatcher> {
        &self.hooks
    }

    /// 플러그인 매니저
    pub fn plugins(&self) -> &Arc<PluginManager> {
        &self.plugins
    }

    /// 테마 엔진
    pub fn themes(&self) -> &Arc<ThemeEngine> {
        &self.themes
    }

    /// 기동 - 활성 플러그인 전체와 활성 테마 로드
    ///
    /// 플러그인이 테마 필터를 등록할 수 있도록 플러그인을 먼저
    /// 로드합니다. 로드된 플러그인 수를 반환합니다.
    pub async fn startup(&self) -> Result<usize> {
        let count = self.plugins.load_all_plugins().await?;
        self.themes.load_active_theme().await?;
        info!(plugins = count, "Extension context started");
        Ok(count)
    }

    /// 종료 - 플러그인 전체 언로드 및 테마 해제
    pub fn shutdown(&self) {
        self.plugins.unload_all();
        self.themes.clear_theme();
        info!("Extension context shut down");
    }
}

impl std::fmt::Debug for ExtensionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionContext")
            .field("loaded_plugins", &self.plugins.plugin_count())
            .field(
                "active_theme",
                &self.themes.active_theme().map(|t| t.slug),
            )
            .finish()
    }
}

// ============================================================================
// ExtensionContextBuilder
// ============================================================================

/// ExtensionContext 빌더
///
/// 스토어/해석기를 지정하지 않으면 인메모리 구현으로 채워집니다.
#[derive(Default)]
pub struct ExtensionContextBuilder {
    plugin_store: Option<Arc<dyn PluginRecordStore>>,
    theme_store: Option<Arc<dyn ThemeRecordStore>>,
    resolver: Option<Arc<dyn ModuleResolver>>,
    plugin_config: Option<PluginManagerConfig>,
}

impl ExtensionContextBuilder {
    /// 플러그인 레코드 스토어 지정
    pub fn with_plugin_store(mut self, store: Arc<dyn PluginRecordStore>) -> Self {
        self.plugin_store = Some(store);
        self
    }

    /// 테마 레코드 스토어 지정
    pub fn with_theme_store(mut self, store: Arc<dyn ThemeRecordStore>) -> Self {
        self.theme_store = Some(store);
        self
    }

    /// 모듈 해석기 지정
    pub fn with_resolver(mut self, resolver: Arc<dyn ModuleResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// 플러그인 매니저 설정 지정
    pub fn with_plugin_config(mut self, config: PluginManagerConfig) -> Self {
        self.plugin_config = Some(config);
        self
    }

    /// 컨텍스트 조립
    pub fn build(self) -> ExtensionContext {
        let hooks = Arc::new(HookDispatcher::new());
        let plugin_store = self
            .plugin_store
            .unwrap_or_else(|| Arc::new(MemoryPluginStore::new()));
        let theme_store = self
            .theme_store
            .unwrap_or_else(|| Arc::new(MemoryThemeStore::new()));
        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(StaticModuleResolver::new()));

        let plugins = Arc::new(PluginManager::with_config(
            plugin_store,
            resolver.clone(),
            hooks.clone(),
            self.plugin_config.unwrap_or_default(),
        ));
        let themes = Arc::new(ThemeEngine::new(theme_store, resolver, hooks.clone()));

        ExtensionContext {
            hooks,
            plugins,
            themes,
        }
    }
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::{HookCallback, DEFAULT_PRIORITY};
    use crate::plugin::{
        ComponentSource, FnComponent, HookSpec, PluginDescriptor, PluginKind, PluginModule,
    };
    use crate::theme::{TemplateKind, TemplateSpec, ThemeDescriptor};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;

    /// 테마 타이틀에 접미사를 붙이는 필터를 등록하는 모듈
    struct BrandingModule;

    #[async_trait]
    impl PluginModule for BrandingModule {
        fn callbacks(&self) -> HashMap<String, HookCallback> {
            HashMap::from([(
                "brandTitle".to_string(),
                HookCallback::filter(|mut value, _extra| {
                    let branded = format!(
                        "{} | Verse",
                        value.get("title").and_then(|t| t.as_str()).unwrap_or_default()
                    );
                    if let Some(obj) = value.as_object_mut() {
                        obj.insert("title".into(), json!(branded));
                    }
                    Ok(value)
                }),
            )])
        }
    }

    #[tokio::test]
    async fn test_isolated_contexts() {
        let a = ExtensionContext::builder().build();
        let b = ExtensionContext::builder().build();

        a.hooks().add_action(
            "only-in-a",
            std::sync::Arc::new(|_| Ok(())),
            DEFAULT_PRIORITY,
            None,
        );

        assert!(a.hooks().has_hook("only-in-a"));
        assert!(!b.hooks().has_hook("only-in-a"));
    }

    #[tokio::test]
    async fn test_startup_and_shutdown() {
        // 플러그인이 등록한 필터가 테마 렌더링 출력에 반영되는 전체 경로
        let plugin_store = Arc::new(MemoryPluginStore::new());
        let theme_store = Arc::new(MemoryThemeStore::new());
        let resolver = Arc::new(StaticModuleResolver::new());

        plugin_store
            .create(
                PluginDescriptor::new("branding", "Branding")
                    .with_active(true)
                    .with_hook(HookSpec::new("template:props", "brandTitle")),
            )
            .await
            .unwrap();
        resolver.register_module(PluginKind::Custom, "branding", Arc::new(BrandingModule));

        theme_store
            .create(
                ThemeDescriptor::new("aurora", "Aurora")
                    .with_active(true)
                    .with_template(TemplateSpec::new(
                        "home",
                        TemplateKind::Home,
                        "templates/home",
                    )),
            )
            .await
            .unwrap();
        resolver.register_component(
            ComponentSource::theme("aurora"),
            "templates/home",
            Arc::new(FnComponent::new(|props| {
                Ok(format!(
                    "<title>{}</title>",
                    props["title"].as_str().unwrap_or_default()
                ))
            })),
        );

        let ctx = ExtensionContext::builder()
            .with_plugin_store(plugin_store)
            .with_theme_store(theme_store)
            .with_resolver(resolver)
            .build();

        let count = ctx.startup().await.unwrap();
        assert_eq!(count, 1);
        assert!(ctx.plugins().is_plugin_loaded("branding"));
        assert_eq!(ctx.themes().active_theme().unwrap().slug, "aurora");

        let html = ctx
            .themes()
            .render_template("home", json!({ "title": "Hello" }))
            .unwrap();
        assert_eq!(html, "<title>Hello | Verse</title>");

        ctx.shutdown();
        assert_eq!(ctx.plugins().plugin_count(), 0);
        assert!(ctx.themes().active_theme().is_none());

        // 언로드된 플러그인의 필터는 더 이상 적용되지 않음
        assert!(!ctx.hooks().has_hook("template:props"));
    }

    #[tokio::test]
    async fn test_startup_without_records() {
        let ctx = ExtensionContext::builder().build();
        let count = ctx.startup().await.unwrap();

        assert_eq!(count, 0);
        assert!(ctx.themes().active_theme().is_none());
    }
}
