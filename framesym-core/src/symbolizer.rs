//! シンボライザ
//!
//! ハンドルマネージャと失敗の扱いをまとめ、ハンドルの作成から解決までを行います。
//! バックエンドの作成失敗は失敗の扱いに関係なく常に呼び出し元に返されます。

use crate::config::SymbolizerConfig;
use crate::handle::{BackendHandle, HandleManager};
use crate::resolver::{self, FailurePolicy};
use crate::{ResolvedFrame, Result};
use framesym_dwarf::{Address, DebugInfoBackend, DwarfBackend};
use std::sync::OnceLock;

/// シンボライザ
pub struct Symbolizer<B: DebugInfoBackend> {
    manager: HandleManager<B>,
    policy: FailurePolicy,
}

impl<B: DebugInfoBackend> Symbolizer<B> {
    /// バックエンドと設定からシンボライザを作成する
    ///
    /// バックエンドの状態は最初の解決時に作成される。
    /// `DwarfBackend` の状態は対象バイナリの内容を1コピー保持し、プロセス終了まで解放しないため、
    /// 同じバイナリには `process_symbolizer` か1つのインスタンスを使い回すこと。
    pub fn new(backend: B, config: SymbolizerConfig) -> Self {
        let program_name = config.resolve_program_name();
        Self {
            manager: HandleManager::new(backend, program_name, config.threaded),
            policy: config.failure_policy,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: FailurePolicy) {
        self.policy = policy;
    }

    pub fn manager(&self) -> &HandleManager<B> {
        &self.manager
    }

    /// バックエンドハンドルを取得する
    pub fn handle(&self) -> Result<BackendHandle<B>> {
        self.manager.get_handle()
    }

    pub fn resolve_frame(&self, address: Address) -> Result<ResolvedFrame> {
        let handle = self.handle()?;
        resolver::resolve_frame(&handle, address, self.policy)
    }

    pub fn resolve_frames(&self, addresses: &[Address]) -> Result<Vec<ResolvedFrame>> {
        let handle = self.handle()?;
        resolver::resolve_frames(&handle, addresses, self.policy)
    }

    pub fn resolve_inline_chain(&self, address: Address) -> Result<Vec<ResolvedFrame>> {
        let handle = self.handle()?;
        resolver::resolve_inline_chain(&handle, address, self.policy)
    }
}

/// プロセス全体で共有するシンボライザ
///
/// 設定は最初の呼び出し時に環境変数から読み込まれる。
pub fn process_symbolizer() -> &'static Symbolizer<DwarfBackend> {
    static SYMBOLIZER: OnceLock<Symbolizer<DwarfBackend>> = OnceLock::new();
    SYMBOLIZER.get_or_init(|| Symbolizer::new(DwarfBackend::new(), SymbolizerConfig::from_env()))
}
