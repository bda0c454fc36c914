//! Theme Engine - 활성 테마와 템플릿 레지스트리
//!
//! 단일 활성 테마를 추적하고, 테마 로드 시 템플릿별 컴포넌트
//! 레지스트리를 재구성합니다. 렌더링 props와 CSS 변수 맵은 필터를
//! 거치므로 플러그인이 테마 출력을 바꿀 수 있습니다.

use super::descriptor::{
    LayoutSettings, TemplateKind, TemplateSpec, ThemeDescriptor, ThemeSettings,
};
use crate::hook::{names, HookDispatcher};
use crate::plugin::{Component, ComponentSource, ModuleResolver};
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use verse_foundation::{Error, Result};

use super::store::ThemeRecordStore;

/// 활성 테마의 런타임 상태
struct ActiveTheme {
    descriptor: ThemeDescriptor,
    templates: HashMap<String, Arc<dyn Component>>,
}

/// 테마 엔진
pub struct ThemeEngine {
    /// 레코드 스토어
    store: Arc<dyn ThemeRecordStore>,

    /// 컴포넌트 해석기
    resolver: Arc<dyn ModuleResolver>,

    /// 훅 디스패처
    hooks: Arc<HookDispatcher>,

    /// 활성 테마 (없을 수 있음)
    active: RwLock<Option<ActiveTheme>>,
}

impl ThemeEngine {
    /// 새 엔진 생성
    pub fn new(
        store: Arc<dyn ThemeRecordStore>,
        resolver: Arc<dyn ModuleResolver>,
        hooks: Arc<HookDispatcher>,
    ) -> Self {
        Self {
            store,
            resolver,
            hooks,
            active: RwLock::new(None),
        }
    }

    // ========================================================================
    // 로드
    // ========================================================================

    /// 테마 로드
    ///
    /// 기존 템플릿 레지스트리를 비우고 새 테마의 템플릿을 해석합니다.
    /// 템플릿 하나의 해석 실패는 로깅 후 그 항목만 빠집니다.
    pub async fn load_theme(&self, slug: &str) -> Result<ThemeDescriptor> {
        let descriptor = self
            .store
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Theme not found: {}", slug)))?;

        info!(theme = %slug, version = %descriptor.version, "Loading theme");
        *self.active.write() = None;

        let source = ComponentSource::theme(slug);
        let mut templates = HashMap::new();
        for spec in &descriptor.templates {
            match self.resolver.resolve_component(&source, &spec.module_path).await {
                Ok(component) => {
                    templates.insert(spec.id.clone(), component);
                }
                Err(e) => {
                    warn!(
                        theme = %slug,
                        template = %spec.id,
                        "Failed to resolve template: {}", e
                    );
                }
            }
        }

        debug!(
            theme = %slug,
            templates = templates.len(),
            declared = descriptor.templates.len(),
            "Rebuilt template registry"
        );

        *self.active.write() = Some(ActiveTheme {
            descriptor: descriptor.clone(),
            templates,
        });

        self.hooks
            .do_action(names::THEME_LOADED, &[serde_json::to_value(&descriptor)?]);

        info!(theme = %slug, "Theme loaded");
        Ok(descriptor)
    }

    /// 스토어가 활성으로 보고하는 테마 로드
    ///
    /// 활성 테마가 없으면 아무것도 하지 않고 None을 반환합니다.
    pub async fn load_active_theme(&self) -> Result<Option<ThemeDescriptor>> {
        match self.store.find_active().await? {
            Some(descriptor) => self.load_theme(&descriptor.slug).await.map(Some),
            None => {
                debug!("No active theme record");
                Ok(None)
            }
        }
    }

    /// 활성 테마와 템플릿 레지스트리 해제
    pub fn clear_theme(&self) {
        let had = self.active.write().take().is_some();
        if had {
            debug!("Cleared active theme");
        }
    }

    // ========================================================================
    // 렌더링
    // ========================================================================

    /// 템플릿 렌더링
    ///
    /// props는 `template:props` 필터를 거칩니다 (extra 인자 = 템플릿 ID).
    /// 템플릿 미등록과 렌더 실패는 로깅 후 None으로 강등됩니다 -
    /// 페이지 렌더링 경로를 죽이지 않습니다.
    pub fn render_template(&self, template_id: &str, props: Value) -> Option<String> {
        let component = {
            let active = self.active.read();
            let Some(theme) = active.as_ref() else {
                error!(template = template_id, "No active theme");
                return None;
            };
            match theme.templates.get(template_id) {
                Some(component) => component.clone(),
                None => {
                    error!(template = template_id, "Template not found");
                    return None;
                }
            }
        };

        let filtered =
            self.hooks
                .apply_filters(names::TEMPLATE_PROPS, props, &[json!(template_id)]);

        match component.render(&filtered) {
            Ok(html) => Some(html),
            Err(e) => {
                error!(template = template_id, "Template render failed: {}", e);
                None
            }
        }
    }

    // ========================================================================
    // CSS 변수
    // ========================================================================

    /// 활성 테마의 CSS 변수 블록 직렬화
    ///
    /// 고정 키 맵이 `theme:variables` 필터를 거친 뒤 `key: value;` 줄로
    /// 직렬화됩니다. 필터가 맵 형태를 깨뜨리면 필터 전 맵으로
    /// 돌아갑니다. 활성 테마가 없으면 빈 문자열입니다.
    pub fn css_variables(&self) -> String {
        let (variables, descriptor_value) = {
            let active = self.active.read();
            let Some(theme) = active.as_ref() else {
                return String::new();
            };
            (
                theme.descriptor.config.css_variables(),
                serde_json::to_value(&theme.descriptor).unwrap_or(Value::Null),
            )
        };

        let filtered = self.hooks.apply_filters(
            names::THEME_VARIABLES,
            json!(variables),
            &[descriptor_value],
        );

        let variables: BTreeMap<String, String> = match serde_json::from_value(filtered) {
            Ok(map) => map,
            Err(e) => {
                warn!("theme:variables filter produced a non-map value: {}", e);
                variables
            }
        };

        variables
            .iter()
            .map(|(key, value)| format!("{}: {};", key, value))
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ========================================================================
    // 조회 (활성 테마가 없으면 None/false/빈 값, 절대 실패하지 않음)
    // ========================================================================

    /// 활성 테마 디스크립터
    pub fn active_theme(&self) -> Option<ThemeDescriptor> {
        self.active.read().as_ref().map(|t| t.descriptor.clone())
    }

    /// 활성 테마 설정
    pub fn theme_settings(&self) -> Option<ThemeSettings> {
        self.active
            .read()
            .as_ref()
            .map(|t| t.descriptor.config.clone())
    }

    /// 활성 테마 레이아웃 설정
    pub fn layout_settings(&self) -> Option<LayoutSettings> {
        self.active
            .read()
            .as_ref()
            .map(|t| t.descriptor.config.layout.clone())
    }

    /// 해석된 템플릿 컴포넌트 조회
    pub fn template(&self, template_id: &str) -> Option<Arc<dyn Component>> {
        self.active
            .read()
            .as_ref()
            .and_then(|t| t.templates.get(template_id).cloned())
    }

    /// 템플릿 등록 여부
    pub fn has_template(&self, template_id: &str) -> bool {
        self.active
            .read()
            .as_ref()
            .map_or(false, |t| t.templates.contains_key(template_id))
    }

    /// 종류별 템플릿 선언 목록
    pub fn templates_by_kind(&self, kind: TemplateKind) -> Vec<TemplateSpec> {
        self.active.read().as_ref().map_or_else(Vec::new, |t| {
            t.descriptor
                .templates
                .iter()
                .filter(|spec| spec.kind == kind)
                .cloned()
                .collect()
        })
    }

    /// 기능 플래그 확인 (미설정/비활성 테마는 false)
    pub fn is_feature_enabled(&self, flag: &str) -> bool {
        self.active.read().as_ref().map_or(false, |t| {
            t.descriptor.config.features.get(flag).copied().unwrap_or(false)
        })
    }
}

impl std::fmt::Debug for ThemeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let active = self.active.read();
        f.debug_struct("ThemeEngine")
            .field(
                "active",
                &active.as_ref().map(|t| t.descriptor.slug.clone()),
            )
            .finish()
    }
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::DEFAULT_PRIORITY;
    use crate::plugin::{FnComponent, StaticModuleResolver};
    use crate::theme::descriptor::{TemplateKind, TemplateSpec};
    use crate::theme::store::MemoryThemeStore;

    struct Fixture {
        store: Arc<MemoryThemeStore>,
        resolver: Arc<StaticModuleResolver>,
        hooks: Arc<HookDispatcher>,
        engine: ThemeEngine,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryThemeStore::new());
        let resolver = Arc::new(StaticModuleResolver::new());
        let hooks = Arc::new(HookDispatcher::new());
        let engine = ThemeEngine::new(store.clone(), resolver.clone(), hooks.clone());
        Fixture {
            store,
            resolver,
            hooks,
            engine,
        }
    }

    fn aurora() -> ThemeDescriptor {
        ThemeDescriptor::new("aurora", "Aurora")
            .with_template(TemplateSpec::new("home", TemplateKind::Home, "templates/home"))
            .with_template(TemplateSpec::new("post", TemplateKind::Single, "templates/post"))
            .with_feature("dark-mode", true)
    }

    fn register_home(f: &Fixture) {
        f.resolver.register_component(
            ComponentSource::theme("aurora"),
            "templates/home",
            Arc::new(FnComponent::new(|props| {
                let title = props["title"].as_str().unwrap_or("untitled");
                Ok(format!("<main>{}</main>", title))
            })),
        );
    }

    #[tokio::test]
    async fn test_load_missing_theme() {
        let f = fixture();
        let err = f.engine.load_theme("ghost").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(f.engine.active_theme().is_none());
    }

    #[tokio::test]
    async fn test_load_theme_builds_registry() {
        let f = fixture();
        f.store.create(aurora()).await.unwrap();
        register_home(&f);

        let loaded = f.engine.load_theme("aurora").await.unwrap();
        assert_eq!(loaded.slug, "aurora");

        // "post" 템플릿은 해석 실패 -> 레지스트리에서만 빠짐
        assert!(f.engine.has_template("home"));
        assert!(!f.engine.has_template("post"));
        assert_eq!(f.engine.active_theme().unwrap().slug, "aurora");
    }

    #[tokio::test]
    async fn test_load_active_theme() {
        let f = fixture();
        assert!(f.engine.load_active_theme().await.unwrap().is_none());

        f.store.create(aurora()).await.unwrap();
        f.store.activate_exclusive("aurora").await.unwrap();
        register_home(&f);

        let loaded = f.engine.load_active_theme().await.unwrap().unwrap();
        assert_eq!(loaded.slug, "aurora");
        assert!(f.engine.active_theme().is_some());
    }

    #[tokio::test]
    async fn test_render_template() {
        let f = fixture();
        f.store.create(aurora()).await.unwrap();
        register_home(&f);
        f.engine.load_theme("aurora").await.unwrap();

        let html = f
            .engine
            .render_template("home", json!({ "title": "Welcome" }))
            .unwrap();
        assert_eq!(html, "<main>Welcome</main>");
    }

    #[tokio::test]
    async fn test_render_missing_template_degrades() {
        let f = fixture();
        f.store.create(aurora()).await.unwrap();
        register_home(&f);
        f.engine.load_theme("aurora").await.unwrap();

        assert!(f.engine.render_template("post", json!({})).is_none());
        assert!(f.engine.render_template("nothing", json!({})).is_none());
    }

    #[tokio::test]
    async fn test_render_without_theme_degrades() {
        let f = fixture();
        assert!(f.engine.render_template("home", json!({})).is_none());
    }

    #[tokio::test]
    async fn test_props_pass_through_filter() {
        let f = fixture();
        f.store.create(aurora()).await.unwrap();
        register_home(&f);
        f.engine.load_theme("aurora").await.unwrap();

        // 플러그인이 하듯 props 필터 등록 - 템플릿 ID가 extra로 전달됨
        f.hooks.add_filter(
            names::TEMPLATE_PROPS,
            Arc::new(|mut value, extra| {
                if extra[0] == json!("home") {
                    if let Some(obj) = value.as_object_mut() {
                        obj.insert("title".into(), json!("Filtered"));
                    }
                }
                Ok(value)
            }),
            DEFAULT_PRIORITY,
            Some("seo"),
        );

        let html = f
            .engine
            .render_template("home", json!({ "title": "Original" }))
            .unwrap();
        assert_eq!(html, "<main>Filtered</main>");
    }

    #[tokio::test]
    async fn test_render_error_degrades() {
        let f = fixture();
        f.store
            .create(
                ThemeDescriptor::new("bad", "Bad").with_template(TemplateSpec::new(
                    "home",
                    TemplateKind::Home,
                    "templates/home",
                )),
            )
            .await
            .unwrap();
        f.resolver.register_component(
            ComponentSource::theme("bad"),
            "templates/home",
            Arc::new(FnComponent::new(|_| {
                Err(Error::Internal("render blew up".into()))
            })),
        );
        f.engine.load_theme("bad").await.unwrap();

        assert!(f.engine.render_template("home", json!({})).is_none());
    }

    #[tokio::test]
    async fn test_css_variables() {
        let f = fixture();
        f.store.create(aurora()).await.unwrap();
        register_home(&f);
        f.engine.load_theme("aurora").await.unwrap();

        let css = f.engine.css_variables();
        assert!(css.contains("--color-primary: #1a1a2e;"));
        assert!(css.contains("--font-body: system-ui, sans-serif;"));
        assert!(css.contains("--layout-max-width: 1200px;"));
        assert_eq!(css.lines().count(), 8);
    }

    #[tokio::test]
    async fn test_css_variables_filterable() {
        let f = fixture();
        f.store.create(aurora()).await.unwrap();
        register_home(&f);
        f.engine.load_theme("aurora").await.unwrap();

        f.hooks.add_filter(
            names::THEME_VARIABLES,
            Arc::new(|mut value, extra| {
                // extra[0]은 활성 테마 디스크립터
                assert_eq!(extra[0]["slug"], json!("aurora"));
                if let Some(obj) = value.as_object_mut() {
                    obj.insert("--color-primary".into(), json!("#ff0000"));
                }
                Ok(value)
            }),
            DEFAULT_PRIORITY,
            Some("branding"),
        );

        let css = f.engine.css_variables();
        assert!(css.contains("--color-primary: #ff0000;"));
    }

    #[tokio::test]
    async fn test_css_variables_filter_corruption_contained() {
        // 필터가 맵 형태를 깨뜨리면 필터 전 맵으로 복귀
        let f = fixture();
        f.store.create(aurora()).await.unwrap();
        register_home(&f);
        f.engine.load_theme("aurora").await.unwrap();

        f.hooks.add_filter(
            names::THEME_VARIABLES,
            Arc::new(|_value, _extra| Ok(json!("not a map"))),
            DEFAULT_PRIORITY,
            None,
        );

        let css = f.engine.css_variables();
        assert!(css.contains("--color-primary: #1a1a2e;"));
    }

    #[tokio::test]
    async fn test_css_variables_without_theme() {
        let f = fixture();
        assert_eq!(f.engine.css_variables(), "");
    }

    #[tokio::test]
    async fn test_feature_flags_and_queries() {
        let f = fixture();
        f.store.create(aurora()).await.unwrap();
        register_home(&f);

        // 테마 없음 -> 전부 기본값, 실패 없음
        assert!(!f.engine.is_feature_enabled("dark-mode"));
        assert!(f.engine.theme_settings().is_none());
        assert!(f.engine.layout_settings().is_none());
        assert!(f.engine.templates_by_kind(TemplateKind::Home).is_empty());

        f.engine.load_theme("aurora").await.unwrap();

        assert!(f.engine.is_feature_enabled("dark-mode"));
        assert!(!f.engine.is_feature_enabled("comments"));
        assert_eq!(f.engine.layout_settings().unwrap().max_width, "1200px");

        let home_templates = f.engine.templates_by_kind(TemplateKind::Home);
        assert_eq!(home_templates.len(), 1);
        assert_eq!(home_templates[0].id, "home");
        assert!(f.engine.template("home").is_some());
    }

    #[tokio::test]
    async fn test_clear_theme() {
        let f = fixture();
        f.store.create(aurora()).await.unwrap();
        register_home(&f);
        f.engine.load_theme("aurora").await.unwrap();

        f.engine.clear_theme();

        assert!(f.engine.active_theme().is_none());
        assert!(!f.engine.has_template("home"));
        assert_eq!(f.engine.css_variables(), "");
    }

    #[tokio::test]
    async fn test_theme_loaded_event() {
        let f = fixture();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));

        let sink = seen.clone();
        f.hooks.add_action(
            names::THEME_LOADED,
            Arc::new(move |args| {
                let slug = args[0]["slug"].as_str().unwrap_or("?").to_string();
                sink.lock().unwrap().push(slug);
                Ok(())
            }),
            DEFAULT_PRIORITY,
            None,
        );

        f.store.create(aurora()).await.unwrap();
        register_home(&f);
        f.engine.load_theme("aurora").await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["aurora"]);
    }

    #[tokio::test]
    async fn test_switching_theme_replaces_registry() {
        let f = fixture();
        f.store.create(aurora()).await.unwrap();
        f.store
            .create(
                ThemeDescriptor::new("mono", "Mono").with_template(TemplateSpec::new(
                    "archive",
                    TemplateKind::Archive,
                    "templates/archive",
                )),
            )
            .await
            .unwrap();
        register_home(&f);
        f.resolver.register_component(
            ComponentSource::theme("mono"),
            "templates/archive",
            Arc::new(FnComponent::new(|_| Ok("<section/>".into()))),
        );

        f.engine.load_theme("aurora").await.unwrap();
        assert!(f.engine.has_template("home"));

        f.engine.load_theme("mono").await.unwrap();
        assert!(!f.engine.has_template("home"));
        assert!(f.engine.has_template("archive"));
        assert_eq!(f.engine.active_theme().unwrap().slug, "mono");
    }
}
