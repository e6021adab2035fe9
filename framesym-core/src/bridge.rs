//! バックエンドのエラーコールバックと構造化エラーの橋渡し
//!
//! エラーコールバックはバックエンドの呼び出しの内側で実行されるため、
//! そこでは失敗を記録するだけにして、呼び出しが戻った後にエラーへ変換します。

use crate::Error;
use framesym_dwarf::Address;
use tracing::debug;

/// バックエンドが報告した失敗
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub message: String,
    pub code: i32,
}

/// 実行中の1回のバックエンド呼び出しに対応する失敗の記録先
#[derive(Debug, Default)]
pub struct ErrorBridge {
    /// 最初に報告された失敗
    first: Option<Failure>,
    /// それ以降に報告された失敗の数
    extra: usize,
}

impl ErrorBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// エラーコールバックから呼ばれる
    pub fn record(&mut self, message: &str, code: i32) {
        if self.first.is_none() {
            self.first = Some(Failure {
                message: message.to_string(),
                code,
            });
        } else {
            self.extra += 1;
            debug!("Additional backend error ignored: {} (code {})", message, code);
        }
    }

    pub fn has_failed(&self) -> bool {
        self.first.is_some()
    }

    /// 追加で報告された失敗の数
    pub fn suppressed(&self) -> usize {
        self.extra
    }

    /// 記録を取り出して空に戻す
    pub fn take(&mut self) -> Option<Failure> {
        self.extra = 0;
        self.first.take()
    }

    /// 問い合わせ中の失敗をエラーに変換する
    pub fn into_query_result(mut self, address: Address) -> Result<(), Error> {
        match self.take() {
            Some(Failure { message, code }) => Err(Error::Query {
                address,
                message,
                code,
            }),
            None => Ok(()),
        }
    }

    /// 状態作成中の失敗をエラーに変換する
    pub fn into_creation_result(mut self, program: &str) -> Result<(), Error> {
        match self.take() {
            Some(Failure { message, code }) => Err(Error::BackendCreation {
                program: program.to_string(),
                message,
                code,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_failure() {
        let bridge = ErrorBridge::new();
        assert!(!bridge.has_failed());
        assert_eq!(bridge.into_query_result(0x1000), Ok(()));
    }

    #[test]
    fn test_first_failure_wins() {
        let mut bridge = ErrorBridge::new();
        bridge.record("first", 1);
        bridge.record("second", 2);
        bridge.record("third", 3);
        assert!(bridge.has_failed());
        assert_eq!(bridge.suppressed(), 2);

        let err = bridge.into_query_result(0x2000).unwrap_err();
        assert_eq!(
            err,
            Error::Query {
                address: 0x2000,
                message: "first".to_string(),
                code: 1,
            }
        );
    }

    #[test]
    fn test_creation_failure() {
        let mut bridge = ErrorBridge::new();
        bridge.record("no such file", 2);
        let err = bridge.into_creation_result("/bin/app").unwrap_err();
        assert!(matches!(err, Error::BackendCreation { ref program, code: 2, .. } if program == "/bin/app"));
    }

    #[test]
    fn test_take_resets() {
        let mut bridge = ErrorBridge::new();
        bridge.record("oops", -1);
        assert!(bridge.take().is_some());
        assert!(bridge.take().is_none());
        assert!(!bridge.has_failed());
    }
}
