//! verse-core: Extensibility Core for Verse
//!
//! Layer2 - 확장 시스템 레이어
//!
//! # 주요 모듈
//!
//! - `hook`: 훅 시스템 (액션/필터 디스패치)
//! - `plugin`: 플러그인 라이프사이클 (로드/언로드/리로드, 의존성 해석)
//! - `theme`: 테마 엔진 (단일 활성 테마, 템플릿 레지스트리, CSS 변수)
//! - `context`: 조립 지점 (`ExtensionContext`)
//!
//! # 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ExtensionContext                          │
//! │  ┌──────────────────┐          ┌───────────────────────┐    │
//! │  │  PluginManager   │          │      ThemeEngine      │    │
//! │  │  (load/unload)   │          │  (템플릿 레지스트리)     │    │
//! │  └────────┬─────────┘          └───────────┬───────────┘    │
//! │           │      등록/회수         필터 적용  │                │
//! │           ▼                               ▼                 │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                 HookDispatcher                       │    │
//! │  │   "plugin:loaded" / "template:props" / ...           │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! 플러그인이 등록한 필터가 테마의 props/CSS 변수 생성에 적용되므로,
//! 테마 엔진은 개별 플러그인을 몰라도 출력이 확장됩니다.
//!
//! # 사용 예시
//!
//! ```ignore
//! use verse_core::{ExtensionContext, JsonPluginStore, JsonThemeStore, StaticModuleResolver};
//! use verse_foundation::JsonStore;
//!
//! let data = JsonStore::site(".");
//! let ctx = ExtensionContext::builder()
//!     .with_plugin_store(Arc::new(JsonPluginStore::open(data.clone())?))
//!     .with_theme_store(Arc::new(JsonThemeStore::open(data)?))
//!     .with_resolver(resolver)
//!     .build();
//!
//! ctx.startup().await?;
//! let html = ctx.themes().render_template("home", props);
//! ```

// Core modules
pub mod context;
pub mod hook;
pub mod plugin;
pub mod theme;

// Re-exports: Context
pub use context::{ExtensionContext, ExtensionContextBuilder};

// Re-exports: Hook
pub use hook::{
    names as hook_names,
    ActionCallback,
    FilterCallback,
    // Types
    HookCallback,
    // Dispatcher
    HookDispatcher,
    HookEntry,
    HookKind,
    DEFAULT_PRIORITY,
};

// Re-exports: Plugin
pub use plugin::{
    Component,
    ComponentKind,
    ComponentSource,
    ComponentSpec,
    FnComponent,
    HookSpec,
    // Stores
    JsonPluginStore,
    LoadedPlugin,
    MemoryPluginStore,
    // Resolver
    ModuleResolver,
    // Descriptor
    PluginDescriptor,
    PluginKind,
    // Manager
    PluginManager,
    PluginManagerConfig,
    // Traits
    PluginModule,
    PluginRecordStore,
    StaticModuleResolver,
};

// Re-exports: Theme
pub use theme::{
    ColorPalette,
    // Stores
    JsonThemeStore,
    LayoutSettings,
    MemoryThemeStore,
    // Descriptor
    TemplateKind,
    TemplateSpec,
    ThemeDescriptor,
    // Engine
    ThemeEngine,
    ThemeRecordStore,
    ThemeSettings,
    Typography,
};

// Layer1 re-exports
pub use verse_foundation::{Error, JsonStore, Result};

/// Layer2 버전
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_hook_name_exports() {
        assert_eq!(hook_names::PLUGIN_LOADED, "plugin:loaded");
        assert_eq!(hook_names::TEMPLATE_PROPS, "template:props");
        assert_eq!(hook_names::THEME_VARIABLES, "theme:variables");
    }

    #[tokio::test]
    async fn test_context_export() {
        let ctx = ExtensionContext::builder().build();
        assert_eq!(ctx.plugins().plugin_count(), 0);
        assert!(ctx.themes().css_variables().is_empty());
    }
}
