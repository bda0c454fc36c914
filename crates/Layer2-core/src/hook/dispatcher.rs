//! Hook Dispatcher - 액션/필터 디스패치 엔진
//!
//! 이름별 콜백 목록을 관리하고 우선순위 순서로 실행합니다.
//! 디스패치는 동기이며, 등록 목록의 스냅샷 위에서 실행되므로 콜백이
//! 디스패처를 재진입(등록/조회)해도 안전합니다.

use super::types::{ActionCallback, FilterCallback, HookCallback, HookEntry};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, trace};
use verse_foundation::Error;

/// 훅 디스패처 - 프로세스 전역 확장 포인트 레지스트리
///
/// 등록 상태는 영속화되지 않으며 플러그인 레코드로부터 매 기동마다
/// 재구성됩니다.
pub struct HookDispatcher {
    /// 훅 이름 -> 정렬된 엔트리 목록
    hooks: RwLock<HashMap<String, Vec<HookEntry>>>,

    /// 삽입 순번 카운터 (안정 정렬 타이브레이커)
    seq: AtomicU64,
}

impl HookDispatcher {
    /// 새 디스패처 생성
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(HashMap::new()),
            seq: AtomicU64::new(0),
        }
    }

    // ========================================================================
    // 등록
    // ========================================================================

    /// 액션 콜백 등록
    pub fn add_action(
        &self,
        hook_name: &str,
        callback: ActionCallback,
        priority: i32,
        owner: Option<&str>,
    ) {
        self.add_hook(hook_name, HookCallback::Action(callback), priority, owner);
    }

    /// 필터 콜백 등록
    pub fn add_filter(
        &self,
        hook_name: &str,
        callback: FilterCallback,
        priority: i32,
        owner: Option<&str>,
    ) {
        self.add_hook(hook_name, HookCallback::Filter(callback), priority, owner);
    }

    /// 액션/필터 공용 등록 연산
    ///
    /// 플러그인 매니저가 모듈의 콜백 테이블을 그대로 등록할 때 사용합니다.
    pub fn add_hook(
        &self,
        hook_name: &str,
        callback: HookCallback,
        priority: i32,
        owner: Option<&str>,
    ) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let entry = HookEntry::new(callback, priority, owner.map(String::from), seq);

        debug!(
            hook = hook_name,
            kind = %entry.callback.kind(),
            priority,
            owner = owner.unwrap_or("-"),
            "Registering hook callback"
        );

        let mut hooks = self.hooks.write();
        let entries = hooks.entry(hook_name.to_string()).or_default();
        entries.push(entry);
        // seq가 타이브레이커라 재정렬해도 삽입 순서가 유지됩니다
        entries.sort_by_key(HookEntry::sort_key);
    }

    // ========================================================================
    // 디스패치
    // ========================================================================

    /// 액션 디스패치 - 등록된 모든 액션 콜백을 우선순위 순서로 호출
    ///
    /// 콜백 하나의 실패는 로깅 후 격리되며 이후 콜백 실행을 막지 않습니다.
    pub fn do_action(&self, hook_name: &str, args: &[Value]) {
        let entries = self.snapshot(hook_name);
        if entries.is_empty() {
            trace!(hook = hook_name, "No listeners for action");
            return;
        }

        for entry in &entries {
            match &entry.callback {
                HookCallback::Action(cb) => {
                    if let Err(e) = cb(args) {
                        let err = Error::hook_execution(
                            hook_name,
                            entry.owner.as_deref(),
                            e.to_string(),
                        );
                        error!(
                            hook = hook_name,
                            owner = entry.owner.as_deref().unwrap_or("unknown"),
                            "{}",
                            err
                        );
                    }
                }
                HookCallback::Filter(_) => {
                    debug!(
                        hook = hook_name,
                        "Skipping filter entry during action dispatch"
                    );
                }
            }
        }
    }

    /// 필터 적용 - 값을 등록된 필터 콜백 체인에 순서대로 통과
    ///
    /// 콜백 `i+1`은 콜백 `i`의 반환값을 받습니다. 실패한 콜백의 단계는
    /// no-op이 되어 직전 값이 그대로 다음 콜백으로 넘어갑니다.
    /// 등록된 콜백이 없으면 입력값을 그대로 반환합니다.
    pub fn apply_filters(&self, hook_name: &str, value: Value, extra: &[Value]) -> Value {
        let entries = self.snapshot(hook_name);
        if entries.is_empty() {
            return value;
        }

        let mut current = value;
        for entry in &entries {
            match &entry.callback {
                HookCallback::Filter(cb) => match cb(current.clone(), extra) {
                    Ok(next) => current = next,
                    Err(e) => {
                        let err = Error::hook_execution(
                            hook_name,
                            entry.owner.as_deref(),
                            e.to_string(),
                        );
                        error!(
                            hook = hook_name,
                            owner = entry.owner.as_deref().unwrap_or("unknown"),
                            "{}",
                            err
                        );
                    }
                },
                HookCallback::Action(_) => {
                    debug!(
                        hook = hook_name,
                        "Skipping action entry during filter dispatch"
                    );
                }
            }
        }

        current
    }

    // ========================================================================
    // 제거
    // ========================================================================

    /// 콜백 제거 - 첫 번째로 매칭되는 엔트리 하나를 제거
    ///
    /// 매칭 기준은 콜백 포인터 동일성이며, `priority`가 주어지면
    /// 우선순위까지 일치해야 합니다. 없으면 no-op이고 false를 반환합니다.
    pub fn remove_hook(
        &self,
        hook_name: &str,
        callback: &HookCallback,
        priority: Option<i32>,
    ) -> bool {
        let mut hooks = self.hooks.write();
        let Some(entries) = hooks.get_mut(hook_name) else {
            return false;
        };

        let position = entries.iter().position(|entry| {
            entry.callback.ptr_eq(callback)
                && priority.map_or(true, |p| entry.priority == p)
        });

        match position {
            Some(idx) => {
                entries.remove(idx);
                if entries.is_empty() {
                    hooks.remove(hook_name);
                }
                debug!(hook = hook_name, "Removed hook callback");
                true
            }
            None => false,
        }
    }

    /// 소유자의 모든 훅 일괄 제거
    ///
    /// 플러그인 언로드 시 해당 플러그인의 영향력을 전부 걷어냅니다.
    /// 제거된 엔트리 수를 반환합니다.
    pub fn remove_owner_hooks(&self, owner: &str) -> usize {
        let mut hooks = self.hooks.write();
        let mut removed = 0;

        hooks.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|entry| entry.owner.as_deref() != Some(owner));
            removed += before - entries.len();
            !entries.is_empty()
        });

        if removed > 0 {
            debug!(owner, removed, "Removed owner hooks");
        }
        removed
    }

    /// 모든 훅 제거 (테스트/teardown용)
    pub fn clear(&self) {
        self.hooks.write().clear();
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// 해당 이름에 등록된 엔트리가 있는지 확인
    pub fn has_hook(&self, hook_name: &str) -> bool {
        self.hooks.read().contains_key(hook_name)
    }

    /// 등록된 훅 이름 목록 (정렬됨)
    pub fn hook_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.hooks.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// 해당 이름에 등록된 콜백 수
    pub fn callback_count(&self, hook_name: &str) -> usize {
        self.hooks
            .read()
            .get(hook_name)
            .map_or(0, |entries| entries.len())
    }

    /// 디스패치용 엔트리 스냅샷
    ///
    /// 락을 쥔 채 콜백을 실행하지 않기 위한 복사입니다. 콜백이
    /// 디스패처를 재진입해도 데드락이 없습니다.
    fn snapshot(&self, hook_name: &str) -> Vec<HookEntry> {
        self.hooks
            .read()
            .get(hook_name)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for HookDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HookDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hooks = self.hooks.read();
        f.debug_struct("HookDispatcher")
            .field("hook_count", &hooks.len())
            .finish()
    }
}

// ============================================================================
// 테스트
// ============================================================================
