//! Plugin Descriptor - 플러그인 레코드 정의
//!
//! 영속 계층이 소유하는 스키마입니다. 훅/컴포넌트/의존성 선언을 담고,
//! 런타임 등록 상태는 언제든 이 레코드로부터 재구성됩니다.

use crate::hook::DEFAULT_PRIORITY;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// PluginKind - 플러그인 타입
// ============================================================================

/// 플러그인 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PluginKind {
    /// 코어와 함께 배포되는 플러그인
    BuiltIn,

    /// 사이트별로 설치되는 플러그인
    Custom,
}

impl std::fmt::Display for PluginKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BuiltIn => write!(f, "built-in"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

// ============================================================================
// ComponentKind - 컴포넌트 종류
// ============================================================================

/// 플러그인이 제공하는 UI 컴포넌트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Widget,
    Shortcode,
    Block,
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Widget => write!(f, "widget"),
            Self::Shortcode => write!(f, "shortcode"),
            Self::Block => write!(f, "block"),
        }
    }
}

// ============================================================================
// HookSpec - 디스크립터의 훅 선언
// ============================================================================

/// 훅 선언 - 모듈의 콜백 테이블에서 `callback_symbol`로 콜백을 찾습니다
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSpec {
    /// 훅 이름 (예: "page:head")
    pub name: String,

    /// 모듈 콜백 테이블의 심볼 이름
    pub callback_symbol: String,

    /// 우선순위
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

impl HookSpec {
    pub fn new(name: impl Into<String>, callback_symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            callback_symbol: callback_symbol.into(),
            priority: DEFAULT_PRIORITY,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

// ============================================================================
// ComponentSpec - 디스크립터의 컴포넌트 선언
// ============================================================================

/// 컴포넌트 선언
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    /// 전역 컴포넌트 ID (예: "recent-posts")
    pub id: String,

    /// 컴포넌트 종류
    pub kind: ComponentKind,

    /// 해석기에 넘길 모듈 경로
    pub module_path: String,

    /// 표시 이름
    pub name: String,
}

impl ComponentSpec {
    pub fn new(
        id: impl Into<String>,
        kind: ComponentKind,
        module_path: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            module_path: module_path.into(),
            name: name.into(),
        }
    }
}

// ============================================================================
// PluginDescriptor - 플러그인 레코드
// ============================================================================

/// 플러그인 디스크립터 - 영속화되는 플러그인의 모든 메타데이터
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDescriptor {
    /// 레코드 ID (스토어가 부여)
    pub id: String,

    /// 전역 고유 slug
    pub slug: String,

    /// 표시 이름
    pub name: String,

    /// 버전 문자열
    pub version: String,

    /// 활성화 여부 - false면 로드가 거부됩니다
    pub is_active: bool,

    /// 플러그인 타입
    pub kind: PluginKind,

    /// 훅 선언 목록
    #[serde(default)]
    pub hooks: Vec<HookSpec>,

    /// 컴포넌트 선언 목록
    #[serde(default)]
    pub components: Vec<ComponentSpec>,

    /// 의존 플러그인 slug 목록 - 로드 전에 먼저 로드됩니다
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// 설명
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 생성 시간
    pub created_at: DateTime<Utc>,

    /// 수정 시간
    pub updated_at: DateTime<Utc>,
}

impl PluginDescriptor {
    /// 새 디스크립터 생성 (custom, 비활성 상태)
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            slug: slug.into(),
            name: name.into(),
            version: "1.0.0".to_string(),
            is_active: false,
            kind: PluginKind::Custom,
            hooks: vec![],
            components: vec![],
            dependencies: vec![],
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 빌더 패턴: 버전 설정
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// 빌더 패턴: 타입 설정
    pub fn with_kind(mut self, kind: PluginKind) -> Self {
        self.kind = kind;
        self
    }

    /// 빌더 패턴: 활성화 여부 설정
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// 빌더 패턴: 훅 선언 추가
    pub fn with_hook(mut self, hook: HookSpec) -> Self {
        self.hooks.push(hook);
        self
    }

    /// 빌더 패턴: 컴포넌트 선언 추가
    pub fn with_component(mut self, component: ComponentSpec) -> Self {
        self.components.push(component);
        self
    }

    /// 빌더 패턴: 의존성 추가
    pub fn with_dependency(mut self, slug: impl Into<String>) -> Self {
        self.dependencies.push(slug.into());
        self
    }

    /// 빌더 패턴: 설명 설정
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let descriptor = PluginDescriptor::new("seo-tools", "SEO Tools")
            .with_version("2.1.0")
            .with_kind(PluginKind::BuiltIn)
            .with_active(true)
            .with_hook(HookSpec::new("page:head", "inject_meta").with_priority(5))
            .with_component(ComponentSpec::new(
                "sitemap-widget",
                ComponentKind::Widget,
                "widgets/sitemap",
                "Sitemap",
            ))
            .with_dependency("analytics");

        assert_eq!(descriptor.slug, "seo-tools");
        assert!(descriptor.is_active);
        assert_eq!(descriptor.hooks.len(), 1);
        assert_eq!(descriptor.hooks[0].priority, 5);
        assert_eq!(descriptor.components[0].kind, ComponentKind::Widget);
        assert_eq!(descriptor.dependencies, vec!["analytics"]);
        assert!(!descriptor.id.is_empty());
    }

    #[test]
    fn test_kind_serde_format() {
        // 영속 포맷은 kebab-case / snake_case 태그 문자열
        assert_eq!(
            serde_json::to_string(&PluginKind::BuiltIn).unwrap(),
            "\"built-in\""
        );
        assert_eq!(
            serde_json::to_string(&ComponentKind::Shortcode).unwrap(),
            "\"shortcode\""
        );

        let kind: PluginKind = serde_json::from_str("\"custom\"").unwrap();
        assert_eq!(kind, PluginKind::Custom);
    }

    #[test]
    fn test_hook_spec_default_priority() {
        let spec: HookSpec =
            serde_json::from_str(r#"{ "name": "page:head", "callbackSymbol": "addTag" }"#).unwrap();
        assert_eq!(spec.priority, DEFAULT_PRIORITY);
        assert_eq!(spec.callback_symbol, "addTag");
    }
}
