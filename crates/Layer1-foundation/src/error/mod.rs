//! Error types for Verse
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Verse 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 조회 관련
    // ========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    // ========================================================================
    // Plugin 관련
    // ========================================================================
    #[error("Plugin is not active: {0}")]
    Inactive(String),

    #[error("Dependency error: {plugin} requires {dependency} - {message}")]
    Dependency {
        plugin: String,
        dependency: String,
        message: String,
    },

    #[error("Module load error: {0}")]
    ModuleLoad(String),

    // ========================================================================
    // Hook 관련
    // ========================================================================
    /// 훅 콜백 내부 실패. 디스패치 경계에서 로깅만 하며 호출자에게
    /// 다시 던지지 않는다.
    #[error("Hook execution failed: {hook} ({owner}) - {message}")]
    HookExecution {
        hook: String,
        owner: String,
        message: String,
    },

    // ========================================================================
    // 저장소 관련
    // ========================================================================
    #[error("Storage error: {0}")]
    Storage(String),

    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 로드 전체를 중단시키는 구조적 에러인지 확인
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::Inactive(_)
                | Error::Dependency { .. }
                | Error::ModuleLoad(_)
        )
    }

    /// 사용자에게 보여줄 수 있는 에러인지 확인
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::Duplicate(_)
                | Error::Inactive(_)
                | Error::Dependency { .. }
                | Error::InvalidInput(_)
                | Error::Validation(_)
        )
    }

    /// Dependency 에러 생성 헬퍼
    pub fn dependency(
        plugin: impl Into<String>,
        dependency: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Dependency {
            plugin: plugin.into(),
            dependency: dependency.into(),
            message: message.into(),
        }
    }

    /// HookExecution 에러 생성 헬퍼
    ///
    /// owner가 없으면 "unknown"으로 기록합니다.
    pub fn hook_execution(
        hook: impl Into<String>,
        owner: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Error::HookExecution {
            hook: hook.into(),
            owner: owner.unwrap_or("unknown").to_string(),
            message: message.into(),
        }
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_classification() {
        assert!(Error::NotFound("x".into()).is_structural());
        assert!(Error::Inactive("x".into()).is_structural());
        assert!(Error::dependency("a", "b", "missing").is_structural());
        assert!(Error::ModuleLoad("x".into()).is_structural());

        assert!(!Error::hook_execution("page:head", Some("seo"), "boom").is_structural());
        assert!(!Error::Storage("disk".into()).is_structural());
    }

    #[test]
    fn test_hook_execution_display() {
        let err = Error::hook_execution("page:head", None, "boom");
        assert_eq!(
            err.to_string(),
            "Hook execution failed: page:head (unknown) - boom"
        );
    }
}
