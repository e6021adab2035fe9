//! シンボル化のエラー

use framesym_dwarf::Address;
use thiserror::Error;

/// シンボル化のエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// バックエンドの状態作成に失敗した（以後のシンボル化はすべて不可能）
    #[error("Failed to create debug info backend for '{program}': {message}, code {code}")]
    BackendCreation {
        program: String,
        message: String,
        code: i32,
    },

    /// 1つのアドレスの問い合わせ中にバックエンドがエラーを報告した
    #[error("Debug info backend error at 0x{address:x}: {message}, code {code}")]
    Query {
        address: Address,
        message: String,
        code: i32,
    },
}

impl Error {
    /// バックエンドが報告したメッセージ
    pub fn message(&self) -> &str {
        match self {
            Error::BackendCreation { message, .. } | Error::Query { message, .. } => message,
        }
    }

    /// バックエンドが報告したエラーコード
    pub fn code(&self) -> i32 {
        match self {
            Error::BackendCreation { code, .. } | Error::Query { code, .. } => *code,
        }
    }
}

/// シンボル化の結果型
pub type Result<T> = std::result::Result<T, Error>;
