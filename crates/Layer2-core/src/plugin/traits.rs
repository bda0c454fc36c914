//! Plugin traits - 모듈/컴포넌트 인터페이스
//!
//! 문자열 심볼 덕타이핑 대신 타입이 있는 인터페이스를 요구합니다.
//! 빠진 심볼은 로드 시점 진단으로 드러납니다.

use crate::hook::{HookCallback, HookDispatcher};
use crate::plugin::descriptor::PluginKind;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use verse_foundation::Result;

// ============================================================================
// ComponentSource - 컴포넌트 소유 주체
// ============================================================================

/// 컴포넌트/템플릿의 소유 주체 (해석기 키의 일부)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComponentSource {
    /// 플러그인이 제공하는 컴포넌트
    Plugin { kind: PluginKind, slug: String },

    /// 테마가 제공하는 템플릿
    Theme { slug: String },
}

impl ComponentSource {
    pub fn plugin(kind: PluginKind, slug: impl Into<String>) -> Self {
        Self::Plugin {
            kind,
            slug: slug.into(),
        }
    }

    pub fn theme(slug: impl Into<String>) -> Self {
        Self::Theme { slug: slug.into() }
    }
}

impl std::fmt::Display for ComponentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plugin { kind, slug } => write!(f, "{} plugin '{}'", kind, slug),
            Self::Theme { slug } => write!(f, "theme '{}'", slug),
        }
    }
}

// ============================================================================
// PluginModule - 플러그인 코드 인터페이스
// ============================================================================

/// 플러그인 모듈 - 해석기가 반환하는 실행 가능한 플러그인 코드
#[async_trait]
pub trait PluginModule: Send + Sync {
    /// 훅 등록 전에 호출되는 초기화 진입점
    ///
    /// 실패하면 로드 전체가 중단되고 플러그인은 등록되지 않습니다.
    async fn init(&self, _hooks: &HookDispatcher) -> Result<()> {
        Ok(())
    }

    /// 심볼 이름 -> 콜백 테이블
    ///
    /// 디스크립터의 훅 선언은 `callback_symbol`로 이 테이블을 찾습니다.
    /// 테이블에 없는 심볼은 경고 후 해당 훅 항목만 건너뜁니다.
    fn callbacks(&self) -> HashMap<String, HookCallback>;
}

// ============================================================================
// Component - 렌더링 가능한 단위
// ============================================================================

/// 렌더링 가능한 컴포넌트 (위젯/숏코드/블록, 테마 템플릿)
pub trait Component: Send + Sync {
    /// props를 받아 마크업을 렌더링
    fn render(&self, props: &Value) -> Result<String>;
}

/// 클로저 기반 컴포넌트
///
/// 내장 플러그인/테마가 간단한 렌더 함수를 등록할 때 사용합니다.
pub struct FnComponent {
    render_fn: Box<dyn Fn(&Value) -> Result<String> + Send + Sync>,
}

impl FnComponent {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            render_fn: Box::new(f),
        }
    }
}

impl Component for FnComponent {
    fn render(&self, props: &Value) -> Result<String> {
        (self.render_fn)(props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fn_component_render() {
        let component = FnComponent::new(|props| {
            let title = props["title"].as_str().unwrap_or("untitled");
            Ok(format!("<h1>{}</h1>", title))
        });

        let html = component.render(&json!({ "title": "Hello" })).unwrap();
        assert_eq!(html, "<h1>Hello</h1>");
    }

    #[test]
    fn test_component_source_display() {
        let source = ComponentSource::plugin(PluginKind::Custom, "seo-tools");
        assert_eq!(source.to_string(), "custom plugin 'seo-tools'");

        let source = ComponentSource::theme("aurora");
        assert_eq!(source.to_string(), "theme 'aurora'");
    }
}
