//! ELFとDWARFの読み込み機能

use crate::Result;
use object::{Object, ObjectSection, ObjectSegment};
use std::fs;
use std::path::{Path, PathBuf};

/// 'staticなDWARFリーダー
pub type StaticReader = gimli::EndianSlice<'static, gimli::RunTimeEndian>;

/// DWARFローダー
///
/// ELFとして解析できたファイルの内容はリークされ、プロセス終了まで解放されません。
/// 読み込むたびに1コピーずつ保持されます。
pub struct DwarfLoader {
    /// 読み込んだファイルの正規化済みパス
    path: PathBuf,
    /// オブジェクトファイル
    object_file: object::File<'static>,
    /// DWARFセクション
    dwarf: gimli::Dwarf<StaticReader>,
    /// .debug_infoが存在するか
    has_debug_info: bool,
}

impl DwarfLoader {
    /// ELFファイルからDWARF情報を読み込む
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        // ファイルを読み込む
        let file_data = fs::read(&path)?;

        // ELFとして読めることを確かめてからリークする
        object::File::parse(file_data.as_slice())
            .map_err(|e| anyhow::anyhow!("Failed to parse ELF file {:?}: {}", path, e))?;

        // Box::leakを使用して'staticライフタイムを得る
        let file_data: &'static [u8] = Box::leak(file_data.into_boxed_slice());

        // objectクレートでELFファイルをパース
        let object_file = object::File::parse(file_data)
            .map_err(|e| anyhow::anyhow!("Failed to parse ELF file {:?}: {}", path, e))?;

        // エンディアンを取得
        let endian = if object_file.is_little_endian() {
            gimli::RunTimeEndian::Little
        } else {
            gimli::RunTimeEndian::Big
        };

        // DWARFセクションを読み込む
        let load_section = |id: gimli::SectionId| -> Result<StaticReader> {
            let data = object_file
                .section_by_name(id.name())
                .and_then(|section| section.data().ok())
                .unwrap_or(&[]);
            Ok(gimli::EndianSlice::new(data, endian))
        };

        // DWARFコンテキストを構築
        let dwarf = gimli::Dwarf::load(load_section)
            .map_err(|e| anyhow::anyhow!("Failed to load DWARF sections: {}", e))?;

        let has_debug_info = object_file
            .section_by_name(".debug_info")
            .is_some_and(|section| section.size() > 0);

        Ok(Self {
            path,
            object_file,
            dwarf,
            has_debug_info,
        })
    }

    /// 正規化済みのパスを取得
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// オブジェクトファイルへの参照を取得
    pub fn object_file(&self) -> &object::File<'static> {
        &self.object_file
    }

    /// DWARF情報を持っているか
    pub fn has_debug_info(&self) -> bool {
        self.has_debug_info
    }

    /// PIE（Position Independent Executable）かどうかを判定する
    ///
    /// ET_DYNならPIE実行ファイルまたは共有ライブラリで、
    /// 実行時アドレスからロードバイアスを引く必要があります。
    pub fn is_pie(&self) -> bool {
        matches!(self.object_file.kind(), object::ObjectKind::Dynamic)
    }

    /// ロード可能セグメントの最小アドレス（ページ境界に切り下げ）
    pub fn min_segment_address(&self) -> u64 {
        self.object_file
            .segments()
            .map(|segment| segment.address())
            .min()
            .unwrap_or(0)
            & !0xfff
    }

    /// DWARFセクションを取り出す
    pub fn into_dwarf(self) -> gimli::Dwarf<StaticReader> {
        self.dwarf
    }
}

/// I/Oエラーからエラーコードを取り出す
pub(crate) fn error_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<std::io::Error>()
        .and_then(std::io::Error::raw_os_error)
        .unwrap_or(crate::backend::NO_ERRNO)
}
