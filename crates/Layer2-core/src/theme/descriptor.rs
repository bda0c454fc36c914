//! Theme Descriptor - 테마 레코드 정의
//!
//! 색상/타이포그래피/레이아웃/기능 플래그 설정과 템플릿 선언을 담습니다.
//! "활성 테마는 최대 하나" 불변식은 레코드 스토어가 강제합니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

// ============================================================================
// TemplateKind - 템플릿 종류
// ============================================================================

/// 템플릿 슬롯 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Page,
    Single,
    Archive,
    Home,
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Page => write!(f, "page"),
            Self::Single => write!(f, "single"),
            Self::Archive => write!(f, "archive"),
            Self::Home => write!(f, "home"),
        }
    }
}

// ============================================================================
// TemplateSpec - 템플릿 선언
// ============================================================================

/// 템플릿 선언 - 해석기를 통해 렌더링 가능한 컴포넌트로 바뀝니다
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSpec {
    /// 템플릿 ID (예: "home")
    pub id: String,

    /// 슬롯 종류
    pub kind: TemplateKind,

    /// 해석기에 넘길 모듈 경로
    pub module_path: String,
}

impl TemplateSpec {
    pub fn new(id: impl Into<String>, kind: TemplateKind, module_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            module_path: module_path.into(),
        }
    }
}

// ============================================================================
// ThemeSettings - 테마 설정
// ============================================================================

/// 색상 팔레트
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorPalette {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub text: String,

    /// 테마별 추가 색상
    #[serde(flatten)]
    pub extra: HashMap<String, String>,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self {
            primary: "#1a1a2e".to_string(),
            secondary: "#16213e".to_string(),
            accent: "#e94560".to_string(),
            background: "#ffffff".to_string(),
            text: "#222222".to_string(),
            extra: HashMap::new(),
        }
    }
}

/// 타이포그래피 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    pub heading_font: String,
    pub body_font: String,
    pub base_size: String,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            heading_font: "Georgia, serif".to_string(),
            body_font: "system-ui, sans-serif".to_string(),
            base_size: "16px".to_string(),
        }
    }
}

/// 레이아웃 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSettings {
    pub max_width: String,

    /// 사이드바 위치 ("left"/"right", 없으면 사이드바 없음)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sidebar: Option<String>,

    /// 테마별 추가 레이아웃 값
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            max_width: "1200px".to_string(),
            sidebar: None,
            extra: HashMap::new(),
        }
    }
}

/// 테마 설정 전체
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSettings {
    #[serde(default)]
    pub colors: ColorPalette,

    #[serde(default)]
    pub typography: Typography,

    #[serde(default)]
    pub layout: LayoutSettings,

    /// 기능 플래그 (예: "dark-mode", "comments")
    #[serde(default)]
    pub features: HashMap<String, bool>,

    /// 임의 확장 설정
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl ThemeSettings {
    /// 고정 키 집합의 CSS 변수 맵 유도
    ///
    /// 키 집합은 테마와 무관하게 일정합니다. 플러그인은
    /// `theme:variables` 필터로 맵을 변형할 수 있습니다.
    pub fn css_variables(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("--color-primary".to_string(), self.colors.primary.clone()),
            (
                "--color-secondary".to_string(),
                self.colors.secondary.clone(),
            ),
            ("--color-accent".to_string(), self.colors.accent.clone()),
            (
                "--color-background".to_string(),
                self.colors.background.clone(),
            ),
            ("--color-text".to_string(), self.colors.text.clone()),
            (
                "--font-heading".to_string(),
                self.typography.heading_font.clone(),
            ),
            ("--font-body".to_string(), self.typography.body_font.clone()),
            (
                "--layout-max-width".to_string(),
                self.layout.max_width.clone(),
            ),
        ])
    }
}

// ============================================================================
// ThemeDescriptor - 테마 레코드
// ============================================================================

/// 테마 디스크립터 - 영속화되는 테마의 모든 메타데이터
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeDescriptor {
    /// 레코드 ID (스토어가 부여)
    pub id: String,

    /// 전역 고유 slug
    pub slug: String,

    /// 표시 이름
    pub name: String,

    /// 버전 문자열
    pub version: String,

    /// 활성화 여부 - 전체 컬렉션에서 최대 하나만 true
    pub is_active: bool,

    /// 프레젠테이션 설정
    #[serde(default)]
    pub config: ThemeSettings,

    /// 템플릿 선언 목록
    #[serde(default)]
    pub templates: Vec<TemplateSpec>,

    /// 설명
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 스크린샷 경로
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,

    /// 생성 시간
    pub created_at: DateTime<Utc>,

    /// 수정 시간
    pub updated_at: DateTime<Utc>,
}

impl ThemeDescriptor {
    /// 새 디스크립터 생성 (비활성 상태)
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            slug: slug.into(),
            name: name.into(),
            version: "1.0.0".to_string(),
            is_active: false,
            config: ThemeSettings::default(),
            templates: vec![],
            description: None,
            screenshot: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 빌더 패턴: 버전 설정
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// 빌더 패턴: 활성화 여부 설정
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// 빌더 패턴: 설정 교체
    pub fn with_config(mut self, config: ThemeSettings) -> Self {
        self.config = config;
        self
    }

    /// 빌더 패턴: 템플릿 선언 추가
    pub fn with_template(mut self, template: TemplateSpec) -> Self {
        self.templates.push(template);
        self
    }

    /// 빌더 패턴: 기능 플래그 설정
    pub fn with_feature(mut self, flag: impl Into<String>, enabled: bool) -> Self {
        self.config.features.insert(flag.into(), enabled);
        self
    }

    /// 빌더 패턴: 설명 설정
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
