//! アドレス解決
//!
//! 1つのアドレスに対して、まず詳細問い合わせ（ファイル・行・関数名）を行い、
//! シンボル名が得られなかった場合にシンボル問い合わせへフォールバックします。
//!
//! 詳細問い合わせのコールバックはインライン展開されたフレームごとに呼ばれますが、
//! `resolve_frame` では後の呼び出しが前の結果を上書きします（最も外側のフレームが残る）。
//! すべての段が必要な場合は `resolve_inline_chain` を使います。

use crate::bridge::ErrorBridge;
use crate::frame::{ResolvedFrame, NULL_FRAME};
use crate::handle::BackendHandle;
use crate::Result;
use framesym_dwarf::{Address, DebugInfoBackend};
use std::ops::ControlFlow;
use tracing::{debug, trace};

/// 問い合わせ中の失敗の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// 失敗したアドレスを空のフレームに置き換えて続行する
    #[default]
    Absorb,
    /// 失敗を呼び出し元に返す
    Propagate,
}

impl FailurePolicy {
    fn absorbs(self) -> bool {
        self == FailurePolicy::Absorb
    }
}

/// 1つのアドレスを解決する
pub fn resolve_frame<B: DebugInfoBackend>(
    handle: &BackendHandle<B>,
    address: Address,
    policy: FailurePolicy,
) -> Result<ResolvedFrame> {
    absorb(address, policy, try_resolve_frame(handle, address), || {
        NULL_FRAME
    })
}

/// 複数のアドレスを入力順に解決する
///
/// 各アドレスは独立に解決される。`Absorb` なら失敗した位置だけ空のフレームになり、
/// `Propagate` なら最初の失敗で全体が中断される。
pub fn resolve_frames<B: DebugInfoBackend>(
    handle: &BackendHandle<B>,
    addresses: &[Address],
    policy: FailurePolicy,
) -> Result<Vec<ResolvedFrame>> {
    let mut trace = Vec::with_capacity(addresses.len());
    for &address in addresses {
        trace.push(resolve_frame(handle, address, policy)?);
    }
    Ok(trace)
}

/// インライン展開の各段を内側から順に解決する
///
/// 最後の要素は常に `resolve_frame` の結果と一致する。
pub fn resolve_inline_chain<B: DebugInfoBackend>(
    handle: &BackendHandle<B>,
    address: Address,
    policy: FailurePolicy,
) -> Result<Vec<ResolvedFrame>> {
    absorb(address, policy, try_resolve_chain(handle, address), || {
        vec![NULL_FRAME]
    })
}

fn absorb<T>(
    address: Address,
    policy: FailurePolicy,
    result: Result<T>,
    null: impl FnOnce() -> T,
) -> Result<T> {
    match result {
        Err(err) if policy.absorbs() => {
            debug!("Absorbed resolution failure at 0x{:x}: {}", address, err);
            Ok(null())
        }
        other => other,
    }
}

fn try_resolve_frame<B: DebugInfoBackend>(
    handle: &BackendHandle<B>,
    address: Address,
) -> Result<ResolvedFrame> {
    let mut frame = ResolvedFrame::new(address);

    pcinfo(handle, address, |pc, file, line, function| {
        frame.apply_pcinfo(pc, file, line, function);
    })?;

    if frame.symbol.is_empty() {
        syminfo(handle, address, &mut frame)?;
    }

    trace!("Resolved 0x{:x}: {:?}", address, frame);
    Ok(frame)
}

fn try_resolve_chain<B: DebugInfoBackend>(
    handle: &BackendHandle<B>,
    address: Address,
) -> Result<Vec<ResolvedFrame>> {
    let mut chain = Vec::new();

    pcinfo(handle, address, |pc, file, line, function| {
        let mut frame = ResolvedFrame::new(address);
        frame.apply_pcinfo(pc, file, line, function);
        chain.push(frame);
    })?;

    if chain.is_empty() {
        chain.push(ResolvedFrame::new(address));
    }

    if let Some(outermost) = chain.last_mut() {
        if outermost.symbol.is_empty() {
            syminfo(handle, address, outermost)?;
        }
    }

    Ok(chain)
}

/// 詳細問い合わせを発行し、報告された失敗をエラーに変換する
fn pcinfo<B: DebugInfoBackend>(
    handle: &BackendHandle<B>,
    address: Address,
    mut on_frame: impl FnMut(Address, Option<&str>, u32, Option<&str>),
) -> Result<()> {
    let mut bridge = ErrorBridge::new();
    handle.backend().pcinfo(
        handle.state(),
        address,
        &mut |pc, file, line, function| {
            on_frame(pc, file, line, function);
            ControlFlow::Continue(())
        },
        &mut |message, code| bridge.record(message, code),
    );
    bridge.into_query_result(address)
}

/// シンボル問い合わせを発行する
fn syminfo<B: DebugInfoBackend>(
    handle: &BackendHandle<B>,
    address: Address,
    frame: &mut ResolvedFrame,
) -> Result<()> {
    let mut bridge = ErrorBridge::new();
    handle.backend().syminfo(
        handle.state(),
        address,
        &mut |pc, symbol, _, _| frame.apply_syminfo(pc, symbol),
        &mut |message, code| bridge.record(message, code),
    );
    bridge.into_query_result(address)
}
