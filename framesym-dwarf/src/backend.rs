//! デバッグ情報バックエンドのコールバックプロトコル
//!
//! バックエンドは結果を戻り値ではなくコールバックで通知します。
//! 1回の問い合わせでコールバックが0回・1回・複数回（インライン展開）呼ばれることがあり、
//! 失敗もエラーコールバック経由でのみ報告されます。

use std::ops::ControlFlow;

/// 命令アドレス
pub type Address = u64;

/// エラーコードが存在しない場合に使う値
pub const NO_ERRNO: i32 = -1;

/// エラー報告コールバック（メッセージ、エラーコード）
pub type ErrorCallback<'a> = dyn FnMut(&str, i32) + 'a;

/// 詳細問い合わせのフレームコールバック（pc、ファイル、行、関数名）
///
/// 列番号は通知しない。解決結果の列は常に未設定となる。
///
/// `ControlFlow::Break` を返すと、それ以降の（外側の）インラインフレームは通知されません。
pub type FrameCallback<'a> =
    dyn FnMut(Address, Option<&str>, u32, Option<&str>) -> ControlFlow<()> + 'a;

/// シンボル問い合わせのコールバック（pc、シンボル名、シンボルアドレス、シンボルサイズ）
pub type SymbolCallback<'a> = dyn FnMut(Address, Option<&str>, Address, u64) + 'a;

/// デバッグ情報バックエンド
///
/// 状態（`State`）はプロセスにつき一度だけ作成され、以後は読み取り専用で
/// 複数スレッドから共有されます。
pub trait DebugInfoBackend: Send + Sync {
    /// バックエンドの内部状態
    type State: Send + Sync;

    /// 内部状態を作成する
    ///
    /// 失敗した場合は `on_error` を呼び出して `None` を返します。
    fn create_state(
        &self,
        program_name: &str,
        threaded: bool,
        on_error: &mut ErrorCallback<'_>,
    ) -> Option<Self::State>;

    /// アドレスからファイル・行・関数名を問い合わせる
    fn pcinfo(
        &self,
        state: &Self::State,
        pc: Address,
        on_frame: &mut FrameCallback<'_>,
        on_error: &mut ErrorCallback<'_>,
    );

    /// アドレスからシンボル名だけを問い合わせる
    fn syminfo(
        &self,
        state: &Self::State,
        pc: Address,
        on_symbol: &mut SymbolCallback<'_>,
        on_error: &mut ErrorCallback<'_>,
    );
}
