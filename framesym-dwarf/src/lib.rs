//! framesym DWARFバックエンド
//!
//! このクレートは、デバッグ情報バックエンドのコールバックプロトコルと、
//! ELF/DWARFを用いたその実装を提供します。
//! アドレスからファイル・行・関数名を求める詳細問い合わせと、
//! シンボルテーブルだけを引くシンボル問い合わせの2種類があります。

pub mod backend;
pub mod dwarf_backend;
pub mod lines;
pub mod loader;
pub mod memory_maps;
pub mod symbols;

pub use backend::{
    Address, DebugInfoBackend, ErrorCallback, FrameCallback, SymbolCallback, NO_ERRNO,
};
pub use dwarf_backend::{DwarfBackend, DwarfState, LoadBias};
pub use lines::{LineInfo, LineInfoProvider};
pub use loader::DwarfLoader;
pub use symbols::{Symbol, SymbolTable};

/// DWARF解析の結果型
pub type Result<T> = anyhow::Result<T>;
