//! Hook types - 콜백 및 등록 엔트리 정의

use serde_json::Value;
use std::sync::Arc;
use verse_foundation::Result;

/// 기본 우선순위 (낮을수록 먼저 실행)
pub const DEFAULT_PRIORITY: i32 = 10;

// ============================================================================
// 잘 알려진 훅 이름
// ============================================================================

/// 코어가 발행하는 라이프사이클 액션과 필터 포인트
pub mod names {
    /// 플러그인 로드 완료 (payload: 플러그인 디스크립터)
    pub const PLUGIN_LOADED: &str = "plugin:loaded";

    /// 플러그인 언로드 완료 (payload: 플러그인 디스크립터)
    pub const PLUGIN_UNLOADED: &str = "plugin:unloaded";

    /// 테마 로드 완료 (payload: 테마 디스크립터)
    pub const THEME_LOADED: &str = "theme:loaded";

    /// 템플릿 props 변환 필터 (extra: 템플릿 ID)
    pub const TEMPLATE_PROPS: &str = "template:props";

    /// 테마 CSS 변수 맵 변환 필터 (extra: 테마 디스크립터)
    pub const THEME_VARIABLES: &str = "theme:variables";
}

// ============================================================================
// 콜백 타입
// ============================================================================

/// 액션 콜백 - 인자를 받고 반환값은 소비되지 않음
pub type ActionCallback = Arc<dyn Fn(&[Value]) -> Result<()> + Send + Sync>;

/// 필터 콜백 - 값을 받아 변환된 값을 반환
///
/// 두 번째 인자는 파이프라인 내내 변하지 않는 extra 인자들입니다.
pub type FilterCallback = Arc<dyn Fn(Value, &[Value]) -> Result<Value> + Send + Sync>;

/// 훅 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Action,
    Filter,
}

impl std::fmt::Display for HookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Action => write!(f, "action"),
            Self::Filter => write!(f, "filter"),
        }
    }
}

/// 등록 가능한 훅 콜백
///
/// 액션과 필터는 같은 엔트리 저장소를 공유하지만 타입이 구분되어
/// 호출 규약을 잘못 쓸 수 없습니다.
#[derive(Clone)]
pub enum HookCallback {
    Action(ActionCallback),
    Filter(FilterCallback),
}

impl HookCallback {
    /// 클로저로 액션 콜백 생성
    pub fn action<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<()> + Send + Sync + 'static,
    {
        Self::Action(Arc::new(f))
    }

    /// 클로저로 필터 콜백 생성
    pub fn filter<F>(f: F) -> Self
    where
        F: Fn(Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self::Filter(Arc::new(f))
    }

    /// 종류 반환
    pub fn kind(&self) -> HookKind {
        match self {
            Self::Action(_) => HookKind::Action,
            Self::Filter(_) => HookKind::Filter,
        }
    }

    /// 동일한 콜백 인스턴스인지 확인 (포인터 비교)
    ///
    /// 제거 연산의 매칭 기준입니다. 클론된 `HookCallback`은 같은
    /// `Arc`를 공유하므로 서로 매칭됩니다.
    pub fn ptr_eq(&self, other: &HookCallback) -> bool {
        match (self, other) {
            (Self::Action(a), Self::Action(b)) => Arc::ptr_eq(a, b),
            (Self::Filter(a), Self::Filter(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for HookCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HookCallback::{}", self.kind())
    }
}

// ============================================================================
// HookEntry - 훅 이름 하나에 매달린 등록 항목
// ============================================================================

/// 등록된 훅 엔트리
#[derive(Clone)]
pub struct HookEntry {
    /// 콜백
    pub callback: HookCallback,

    /// 우선순위 (오름차순 실행)
    pub priority: i32,

    /// 등록 주체 (플러그인 slug) - 일괄 제거에 사용
    pub owner: Option<String>,

    /// 프로세스 전역 삽입 순번. 같은 우선순위의 타이브레이커.
    pub(crate) seq: u64,
}

impl HookEntry {
    pub(crate) fn new(
        callback: HookCallback,
        priority: i32,
        owner: Option<String>,
        seq: u64,
    ) -> Self {
        Self {
            callback,
            priority,
            owner,
            seq,
        }
    }

    /// 정렬 키: 우선순위, 그 다음 삽입 순서
    pub(crate) fn sort_key(&self) -> (i32, u64) {
        (self.priority, self.seq)
    }
}

impl std::fmt::Debug for HookEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookEntry")
            .field("kind", &self.callback.kind())
            .field("priority", &self.priority)
            .field("owner", &self.owner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_ptr_eq() {
        let a = HookCallback::action(|_args| Ok(()));
        let b = a.clone();
        let c = HookCallback::action(|_args| Ok(()));

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn test_ptr_eq_across_kinds() {
        let action = HookCallback::action(|_args| Ok(()));
        let filter = HookCallback::filter(|value, _extra| Ok(value));

        assert!(!action.ptr_eq(&filter));
        assert_eq!(action.kind(), HookKind::Action);
        assert_eq!(filter.kind(), HookKind::Filter);
    }
}
