//! /proc/self/maps の解析
//!
//! PIE実行ファイルは実行時に任意のアドレスへロードされるため、
//! DWARFのアドレスと実行時アドレスの差（ロードバイアス）をマッピングから求めます。

use crate::Result;
use std::path::Path;

/// マッピング1行分
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    pub start: u64,
    pub end: u64,
    pub offset: u64,
    pub path: String,
}

/// 自プロセスのマッピングを読み込む
pub fn read_self_maps() -> Result<String> {
    Ok(std::fs::read_to_string("/proc/self/maps")?)
}

/// マッピングを解析する
///
/// 形式: "start-end perms offset dev inode pathname"
/// パス名のない行（匿名マッピング）や壊れた行は無視する。
pub fn parse_maps(maps: &str) -> Vec<MapEntry> {
    maps.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<MapEntry> {
    let mut parts = line.split_whitespace();
    let (start, end) = parts.next()?.split_once('-')?;
    let _perms = parts.next()?;
    let offset = parts.next()?;
    let _dev = parts.next()?;
    let _inode = parts.next()?;
    // パス名には空白が含まれることがある
    let path = parts.collect::<Vec<_>>().join(" ");
    if path.is_empty() {
        return None;
    }

    Some(MapEntry {
        start: u64::from_str_radix(start, 16).ok()?,
        end: u64::from_str_radix(end, 16).ok()?,
        offset: u64::from_str_radix(offset, 16).ok()?,
        path,
    })
}

/// ファイルのロードベース（ファイルオフセット0のマッピングの開始アドレス）を求める
pub fn load_base(entries: &[MapEntry], path: &Path) -> Option<u64> {
    let path = path.to_string_lossy();
    entries
        .iter()
        .filter(|entry| entry.offset == 0 && entry.path == path)
        .map(|entry| entry.start)
        .min()
}
