//! シンボルテーブル

use crate::DwarfLoader;
use object::{Object, ObjectSymbol, SymbolKind};

/// シンボル情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// シンボル名（マングルされたまま）
    pub name: String,
    pub address: u64,
    pub size: u64,
}

impl Symbol {
    pub fn new(name: impl Into<String>, address: u64, size: u64) -> Self {
        Self {
            name: name.into(),
            address,
            size,
        }
    }

    fn covers(&self, addr: u64) -> bool {
        if self.size > 0 {
            addr < self.address.saturating_add(self.size)
        } else {
            // サイズ情報がない場合は最も近いシンボルとみなす
            true
        }
    }
}

/// アドレス順にソートされた関数シンボルの表
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    /// シンボル列から表を作成する
    pub fn from_symbols(mut symbols: Vec<Symbol>) -> Self {
        symbols.sort_by_key(|s| s.address);
        symbols.dedup_by(|a, b| a.address == b.address && a.name == b.name);
        Self { symbols }
    }

    /// DWARFローダーから表を作成する
    ///
    /// .symtabがなければ.dynsymを使う。
    pub fn from_loader(loader: &DwarfLoader) -> Self {
        let object_file = loader.object_file();

        let mut symbols = collect_text_symbols(object_file.symbols());
        if symbols.is_empty() {
            symbols = collect_text_symbols(object_file.dynamic_symbols());
        }

        Self::from_symbols(symbols)
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// アドレスを含むシンボルを検索する
    pub fn lookup(&self, addr: u64) -> Option<&Symbol> {
        let idx = match self.symbols.binary_search_by_key(&addr, |s| s.address) {
            Ok(idx) => idx,
            Err(0) => return None,
            Err(idx) => idx - 1,
        };

        let sym = self.first_at(idx)?;
        sym.covers(addr).then_some(sym)
    }

    /// 同じアドレスに複数のシンボルがある場合は先頭を返す
    fn first_at(&self, mut idx: usize) -> Option<&Symbol> {
        let address = self.symbols[idx].address;
        while idx > 0 && self.symbols[idx - 1].address == address {
            idx -= 1;
        }
        self.symbols.get(idx)
    }
}

fn collect_text_symbols<'data, I, S>(iter: I) -> Vec<Symbol>
where
    I: Iterator<Item = S>,
    S: ObjectSymbol<'data>,
{
    iter.filter(|symbol| symbol.is_definition() && symbol.kind() == SymbolKind::Text)
        .filter_map(|symbol| {
            let name = symbol.name().ok()?;
            (!name.is_empty()).then(|| Symbol::new(name, symbol.address(), symbol.size()))
        })
        .collect()
}
