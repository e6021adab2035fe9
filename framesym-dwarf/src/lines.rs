//! ソース行情報

use crate::loader::StaticReader;
use crate::Result;

/// ソース行情報（インライン展開の1段分）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineInfo {
    pub file: Option<String>,
    pub line: Option<u32>,
    /// 関数名（マングルされたまま）
    pub function: Option<String>,
}

/// ソース行情報の取得
pub struct LineInfoProvider {
    ctx: addr2line::Context<StaticReader>,
}

impl LineInfoProvider {
    /// DWARFセクションからプロバイダを作成する
    pub fn new(dwarf: gimli::Dwarf<StaticReader>) -> Result<Self> {
        let ctx = addr2line::Context::from_dwarf(dwarf)
            .map_err(|e| anyhow::anyhow!("Failed to load DWARF debug information: {}", e))?;
        Ok(Self { ctx })
    }

    /// アドレスに対応するインラインフレーム列を取得する
    ///
    /// 最も内側のフレームが先頭。DWARFで覆われていないアドレスは空を返す。
    pub fn frames(&self, probe: u64) -> Result<Vec<LineInfo>> {
        let mut frames = Vec::new();
        let mut iter = self
            .ctx
            .find_frames(probe)
            .skip_all_loads()
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        while let Some(frame) = iter.next().map_err(|e| anyhow::anyhow!("{}", e))? {
            let function = match frame.function {
                Some(name) => Some(
                    name.raw_name()
                        .map_err(|e| anyhow::anyhow!("{}", e))?
                        .into_owned(),
                ),
                None => None,
            };

            let (file, line) = match frame.location {
                Some(loc) => (loc.file.map(str::to_string), loc.line),
                None => (None, None),
            };

            frames.push(LineInfo {
                file,
                line,
                function,
            });
        }

        Ok(frames)
    }
}
