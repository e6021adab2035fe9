//! DWARF/ELFに基づくバックエンド実装

use crate::backend::{
    Address, DebugInfoBackend, ErrorCallback, FrameCallback, SymbolCallback, NO_ERRNO,
};
use crate::loader::error_code;
use crate::memory_maps::{load_base, parse_maps, read_self_maps};
use crate::{DwarfLoader, LineInfoProvider, SymbolTable};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// 実行時アドレスからDWARFアドレスへの変換方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadBias {
    /// PIEなら /proc/self/maps から求める（自プロセスのシンボル化）
    #[default]
    FromSelfMaps,
    /// 固定値（オフラインでのシンボル化など）
    Fixed(u64),
}

/// DWARF/ELFバックエンド
#[derive(Debug, Clone, Default)]
pub struct DwarfBackend {
    load_bias: LoadBias,
}

impl DwarfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_load_bias(load_bias: LoadBias) -> Self {
        Self { load_bias }
    }

    pub fn load_bias(&self) -> LoadBias {
        self.load_bias
    }

    fn compute_bias(&self, loader: &DwarfLoader) -> u64 {
        match self.load_bias {
            LoadBias::Fixed(bias) => bias,
            LoadBias::FromSelfMaps if !loader.is_pie() => 0,
            LoadBias::FromSelfMaps => {
                let base = read_self_maps()
                    .ok()
                    .and_then(|maps| load_base(&parse_maps(&maps), loader.path()));
                match base {
                    Some(base) => base.wrapping_sub(loader.min_segment_address()),
                    None => {
                        warn!(
                            "{} is not mapped into this process, assuming load bias 0",
                            loader.path().display()
                        );
                        0
                    }
                }
            }
        }
    }
}

/// バックエンドの内部状態
pub struct DwarfState {
    /// addr2lineのコンテキストはSyncではないため内部でロックする
    lines: Option<Mutex<LineInfoProvider>>,
    symbols: SymbolTable,
    bias: u64,
    threaded: bool,
}

impl DwarfState {
    pub fn bias(&self) -> u64 {
        self.bias
    }

    pub fn is_threaded(&self) -> bool {
        self.threaded
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }
}

impl DebugInfoBackend for DwarfBackend {
    type State = DwarfState;

    fn create_state(
        &self,
        program_name: &str,
        threaded: bool,
        on_error: &mut ErrorCallback<'_>,
    ) -> Option<DwarfState> {
        let loader = match DwarfLoader::load(program_name) {
            Ok(loader) => loader,
            Err(e) => {
                on_error(&format!("{:#}", e), error_code(&e));
                return None;
            }
        };

        let bias = self.compute_bias(&loader);
        let symbols = SymbolTable::from_loader(&loader);
        let has_debug_info = loader.has_debug_info();
        let path = loader.path().to_path_buf();

        let lines = if has_debug_info {
            match LineInfoProvider::new(loader.into_dwarf()) {
                Ok(provider) => Some(Mutex::new(provider)),
                Err(e) => {
                    on_error(&format!("{:#}", e), NO_ERRNO);
                    return None;
                }
            }
        } else {
            None
        };

        debug!(
            "Created DWARF state for {}: bias=0x{:x}, symbols={}, debug_info={}, threaded={}",
            path.display(),
            bias,
            symbols.len(),
            has_debug_info,
            threaded
        );

        Some(DwarfState {
            lines,
            symbols,
            bias,
            threaded,
        })
    }

    fn pcinfo(
        &self,
        state: &DwarfState,
        pc: Address,
        on_frame: &mut FrameCallback<'_>,
        on_error: &mut ErrorCallback<'_>,
    ) {
        let Some(probe) = pc.checked_sub(state.bias) else {
            let _ = on_frame(pc, None, 0, None);
            return;
        };

        let Some(lines) = &state.lines else {
            // DWARFがなければシンボルテーブルから関数名だけ返す
            if state.symbols.is_empty() {
                on_error("no debug info in ELF executable", NO_ERRNO);
            } else {
                let name = state.symbols.lookup(probe).map(|sym| sym.name.as_str());
                let _ = on_frame(pc, None, 0, name);
            }
            return;
        };

        // コールバック中はロックを保持しない
        let frames = lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .frames(probe);

        let frames = match frames {
            Ok(frames) => frames,
            Err(e) => {
                on_error(&format!("{:#}", e), NO_ERRNO);
                return;
            }
        };

        if frames.is_empty() {
            let _ = on_frame(pc, None, 0, None);
            return;
        }

        for frame in &frames {
            let flow = on_frame(
                pc,
                frame.file.as_deref(),
                frame.line.unwrap_or(0),
                frame.function.as_deref(),
            );
            if flow.is_break() {
                break;
            }
        }
    }

    fn syminfo(
        &self,
        state: &DwarfState,
        pc: Address,
        on_symbol: &mut SymbolCallback<'_>,
        on_error: &mut ErrorCallback<'_>,
    ) {
        if state.symbols.is_empty() {
            on_error("no symbol table in ELF executable", NO_ERRNO);
            return;
        }

        let symbol = pc
            .checked_sub(state.bias)
            .and_then(|probe| state.symbols.lookup(probe));

        match symbol {
            Some(sym) => on_symbol(
                pc,
                Some(sym.name.as_str()),
                sym.address.wrapping_add(state.bias),
                sym.size,
            ),
            None => on_symbol(pc, None, 0, 0),
        }
    }
}
