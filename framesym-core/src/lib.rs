//! framesym コア
//!
//! このクレートは、スタック巻き戻しで得た命令アドレスをソース位置（ファイル・行・シンボル名）に
//! 解決する層を提供します。デバッグ情報の解析そのものはバックエンドに任せ、
//! バックエンドの状態の一度きりの作成、コールバックから値への変換、
//! シンボル問い合わせへのフォールバック、エラーコールバックの構造化エラーへの変換を行います。

pub mod bridge;
pub mod config;
pub mod error;
pub mod frame;
pub mod handle;
pub mod resolver;
pub mod symbolizer;

pub use bridge::{ErrorBridge, Failure};
pub use config::SymbolizerConfig;
pub use error::{Error, Result};
pub use frame::{ResolvedFrame, NULL_FRAME};
pub use handle::{BackendHandle, HandleManager};
pub use resolver::{resolve_frame, resolve_frames, resolve_inline_chain, FailurePolicy};
pub use symbolizer::{process_symbolizer, Symbolizer};

// 他のクレートから使用するために再エクスポート
pub use framesym_dwarf::{
    Address, DebugInfoBackend, DwarfBackend, ErrorCallback, FrameCallback, LoadBias, SymbolCallback,
};
