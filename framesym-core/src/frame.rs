//! 解決済みフレーム

use framesym_dwarf::Address;

/// アドレスを解決した結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResolvedFrame {
    /// 問い合わせたアドレス（バックエンドが報告したアドレスで上書きされる）
    pub raw_address: Address,
    /// 行番号（不明なら0）
    pub line: u32,
    /// 列番号（報告されなければNone）
    pub column: Option<u32>,
    /// ファイル名（不明なら空）
    pub filename: String,
    /// シンボル名（どちらの問い合わせでも見つからなければ空）
    pub symbol: String,
}

/// 吸収された失敗の代わりに返す空のフレーム
pub const NULL_FRAME: ResolvedFrame = ResolvedFrame {
    raw_address: 0,
    line: 0,
    column: None,
    filename: String::new(),
    symbol: String::new(),
};

impl ResolvedFrame {
    /// アドレスだけを持つ未解決のフレームを作成する
    pub fn new(address: Address) -> Self {
        Self {
            raw_address: address,
            ..NULL_FRAME
        }
    }

    /// 空のフレームか
    pub fn is_null(&self) -> bool {
        *self == NULL_FRAME
    }

    /// シンボル名が分かっているか
    pub fn is_resolved(&self) -> bool {
        !self.symbol.is_empty()
    }

    /// 詳細問い合わせのコールバック1回分を反映する
    pub(crate) fn apply_pcinfo(
        &mut self,
        address: Address,
        file: Option<&str>,
        line: u32,
        function: Option<&str>,
    ) {
        self.raw_address = address;
        self.line = line;
        self.filename = file.unwrap_or_default().to_string();
        self.symbol = function.unwrap_or_default().to_string();
    }

    /// シンボル問い合わせのコールバックを反映する
    ///
    /// シンボル問い合わせには行情報がないため、行とファイル名は消える。
    pub(crate) fn apply_syminfo(&mut self, address: Address, symbol: Option<&str>) {
        self.raw_address = address;
        self.line = 0;
        self.filename.clear();
        self.symbol = symbol.unwrap_or_default().to_string();
    }
}
