//! バックエンドハンドルの管理
//!
//! バックエンドの状態はマネージャごとに高々一度だけ作成され、作成後は不変のまま
//! すべての問い合わせから共有されます。破棄はせず、プロセス終了まで生存します。

use crate::bridge::ErrorBridge;
use crate::{Error, Result};
use framesym_dwarf::DebugInfoBackend;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::{debug, warn};

/// 作成済みのバックエンド状態への共有ハンドル
pub struct BackendHandle<B: DebugInfoBackend> {
    inner: Arc<HandleInner<B>>,
}

struct HandleInner<B: DebugInfoBackend> {
    backend: Arc<B>,
    state: B::State,
    program_name: String,
    threaded: bool,
}

impl<B: DebugInfoBackend> BackendHandle<B> {
    /// 作成済みの状態からハンドルを組み立てる
    pub fn new(backend: Arc<B>, state: B::State, program_name: String, threaded: bool) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                backend,
                state,
                program_name,
                threaded,
            }),
        }
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    pub fn state(&self) -> &B::State {
        &self.inner.state
    }

    pub fn program_name(&self) -> &str {
        &self.inner.program_name
    }

    pub fn is_threaded(&self) -> bool {
        self.inner.threaded
    }

    /// 同じハンドルかどうか
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<B: DebugInfoBackend> Clone for BackendHandle<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: DebugInfoBackend> std::fmt::Debug for BackendHandle<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("BackendHandle")
            .field("program_name", &self.inner.program_name)
            .field("threaded", &self.inner.threaded)
            .finish_non_exhaustive()
    }
}

/// 作成の状態
enum Creation {
    NotCreated,
    Failed(Error),
}

/// バックエンドハンドルのマネージャ
pub struct HandleManager<B: DebugInfoBackend> {
    backend: Arc<B>,
    program_name: String,
    threaded: bool,
    /// 作成済みハンドル（ロックなしで読める）
    ready: OnceLock<BackendHandle<B>>,
    /// 作成処理とその失敗を守るロック
    creation: Mutex<Creation>,
}

impl<B: DebugInfoBackend> HandleManager<B> {
    pub fn new(backend: B, program_name: impl Into<String>, threaded: bool) -> Self {
        Self {
            backend: Arc::new(backend),
            program_name: program_name.into(),
            threaded,
            ready: OnceLock::new(),
            creation: Mutex::new(Creation::NotCreated),
        }
    }

    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// 作成を試みたことがあるか
    pub fn is_initialized(&self) -> bool {
        self.ready.get().is_some()
            || matches!(
                *self.creation.lock().unwrap_or_else(PoisonError::into_inner),
                Creation::Failed(_)
            )
    }

    /// ハンドルを取得する（初回のみ作成する）
    ///
    /// 作成に失敗した場合は、以後も同じエラーを返し続けます。
    pub fn get_handle(&self) -> Result<BackendHandle<B>> {
        if let Some(handle) = self.ready.get() {
            return Ok(handle.clone());
        }

        let mut creation = self
            .creation
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // ロック待ちの間に他のスレッドが作成しているかもしれない
        if let Some(handle) = self.ready.get() {
            return Ok(handle.clone());
        }
        if let Creation::Failed(err) = &*creation {
            return Err(err.clone());
        }

        match self.create() {
            Ok(handle) => Ok(self.ready.get_or_init(|| handle).clone()),
            Err(err) => {
                *creation = Creation::Failed(err.clone());
                Err(err)
            }
        }
    }

    fn create(&self) -> Result<BackendHandle<B>> {
        debug!(
            "Creating debug info backend state for '{}' (threaded={})",
            self.program_name, self.threaded
        );

        let mut bridge = ErrorBridge::new();
        let state = self.backend.create_state(
            &self.program_name,
            self.threaded,
            &mut |message, code| bridge.record(message, code),
        );

        if bridge.has_failed() && state.is_some() {
            warn!("Backend reported an error but returned a state; discarding it");
        }
        bridge.into_creation_result(&self.program_name)?;

        let state = state.ok_or_else(|| Error::BackendCreation {
            program: self.program_name.clone(),
            message: "backend returned no state".to_string(),
            code: framesym_dwarf::NO_ERRNO,
        })?;

        Ok(BackendHandle::new(
            Arc::clone(&self.backend),
            state,
            self.program_name.clone(),
            self.threaded,
        ))
    }
}
