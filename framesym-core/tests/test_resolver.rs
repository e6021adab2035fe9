//! アドレス解決のテスト

mod common;

use common::ScriptedBackend;
use framesym_core::{
    resolve_frame, resolve_frames, resolve_inline_chain, BackendHandle, Error, FailurePolicy,
    HandleManager, ResolvedFrame, NULL_FRAME,
};

fn handle(backend: ScriptedBackend) -> BackendHandle<ScriptedBackend> {
    HandleManager::new(backend, "scripted", true)
        .get_handle()
        .expect("Failed to create handle")
}

#[test]
fn test_detailed_query() {
    let handle = handle(ScriptedBackend::new().frame(0x1000, Some("a.c"), 42, Some("foo")));

    let frame = resolve_frame(&handle, 0x1000, FailurePolicy::Propagate).unwrap();
    assert_eq!(
        frame,
        ResolvedFrame {
            raw_address: 0x1000,
            line: 42,
            column: None,
            filename: "a.c".to_string(),
            symbol: "foo".to_string(),
        }
    );
    // シンボルが得られたのでフォールバックしない
    assert_eq!(handle.backend().syminfo_calls(), 0);
}

#[test]
fn test_fallback_to_symbol_query() {
    let handle = handle(
        ScriptedBackend::new()
            .frame(0x2000, None, 0, None)
            .symbol(0x2000, Some("bar")),
    );

    let frame = resolve_frame(&handle, 0x2000, FailurePolicy::Propagate).unwrap();
    assert_eq!(frame.raw_address, 0x2000);
    assert_eq!(frame.line, 0);
    assert_eq!(frame.filename, "");
    assert_eq!(frame.symbol, "bar");
    assert_eq!(frame.column, None);
    assert_eq!(handle.backend().syminfo_calls(), 1);
}

#[test]
fn test_fallback_resets_line() {
    let handle = handle(
        ScriptedBackend::new()
            .frame(0x2100, Some("b.c"), 17, None)
            .symbol(0x2100, Some("baz")),
    );

    let frame = resolve_frame(&handle, 0x2100, FailurePolicy::Propagate).unwrap();
    assert_eq!(frame.symbol, "baz");
    assert_eq!(frame.line, 0);
    assert!(frame.filename.is_empty());
}

#[test]
fn test_no_callbacks_at_all() {
    let handle = handle(ScriptedBackend::new());

    let frame = resolve_frame(&handle, 0x3000, FailurePolicy::Propagate).unwrap();
    assert_eq!(frame, ResolvedFrame::new(0x3000));
    assert!(!frame.is_resolved());
    assert_eq!(handle.backend().pcinfo_calls(), 1);
    assert_eq!(handle.backend().syminfo_calls(), 1);
}

#[test]
fn test_fallback_without_symbol() {
    let handle = handle(ScriptedBackend::new().symbol(0x3100, None));

    let frame = resolve_frame(&handle, 0x3100, FailurePolicy::Propagate).unwrap();
    assert_eq!(frame.raw_address, 0x3100);
    assert!(frame.symbol.is_empty());
}

#[test]
fn test_inlined_frames_last_write_wins() {
    let handle = handle(
        ScriptedBackend::new()
            .frame(0x4000, Some("inner.rs"), 3, Some("inner"))
            .frame(0x4000, Some("outer.rs"), 30, Some("outer")),
    );

    let frame = resolve_frame(&handle, 0x4000, FailurePolicy::Propagate).unwrap();
    assert_eq!(frame.filename, "outer.rs");
    assert_eq!(frame.line, 30);
    assert_eq!(frame.symbol, "outer");
}

#[test]
fn test_inline_chain() {
    let handle = handle(
        ScriptedBackend::new()
            .frame(0x4000, Some("inner.rs"), 3, Some("inner"))
            .frame(0x4000, Some("middle.rs"), 12, Some("middle"))
            .frame(0x4000, Some("outer.rs"), 30, None)
            .symbol(0x4000, Some("outer_sym")),
    );

    let chain = resolve_inline_chain(&handle, 0x4000, FailurePolicy::Propagate).unwrap();
    let symbols: Vec<_> = chain.iter().map(|f| f.symbol.as_str()).collect();
    assert_eq!(symbols, ["inner", "middle", "outer_sym"]);
    assert_eq!(chain[0].filename, "inner.rs");
    assert_eq!(chain[1].line, 12);

    let frame = resolve_frame(&handle, 0x4000, FailurePolicy::Propagate).unwrap();
    assert_eq!(chain.last(), Some(&frame));
}

#[test]
fn test_inline_chain_without_frames() {
    let handle = handle(ScriptedBackend::new().symbol(0x4100, Some("lonely")));

    let chain = resolve_inline_chain(&handle, 0x4100, FailurePolicy::Propagate).unwrap();
    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0].symbol, "lonely");
}

#[test]
fn test_idempotent() {
    let handle = handle(
        ScriptedBackend::new()
            .frame(0x1000, Some("a.c"), 42, Some("foo"))
            .symbol(0x2000, Some("bar")),
    );

    for address in [0x1000, 0x2000, 0x5000] {
        let first = resolve_frame(&handle, address, FailurePolicy::Propagate).unwrap();
        let second = resolve_frame(&handle, address, FailurePolicy::Propagate).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_absorbed_failure_returns_null_frame() {
    let handle = handle(ScriptedBackend::new().pcinfo_error(0xdead, "bad dwarf", 22));

    let frame = resolve_frame(&handle, 0xdead, FailurePolicy::Absorb).unwrap();
    assert_eq!(frame, NULL_FRAME);
    assert!(frame.symbol.is_empty());
    assert!(frame.filename.is_empty());
    assert_eq!(frame.line, 0);
    assert_eq!(frame.column, None);
}

#[test]
fn test_propagated_failure() {
    let handle = handle(ScriptedBackend::new().pcinfo_error(0xdead, "bad dwarf", 22));

    let err = resolve_frame(&handle, 0xdead, FailurePolicy::Propagate).unwrap_err();
    assert_eq!(
        err,
        Error::Query {
            address: 0xdead,
            message: "bad dwarf".to_string(),
            code: 22,
        }
    );
    assert_eq!(err.message(), "bad dwarf");
    assert_eq!(err.code(), 22);
}

#[test]
fn test_detailed_query_error_skips_fallback() {
    let handle = handle(
        ScriptedBackend::new()
            .frame(0xdead, Some("a.c"), 1, None)
            .pcinfo_error(0xdead, "truncated", -1)
            .symbol(0xdead, Some("never")),
    );

    assert!(resolve_frame(&handle, 0xdead, FailurePolicy::Propagate).is_err());
    assert_eq!(handle.backend().syminfo_calls(), 0);
}

#[test]
fn test_symbol_query_error() {
    let handle = handle(ScriptedBackend::new().syminfo_error(0xbeef, "no symbol table", -1));

    let err = resolve_frame(&handle, 0xbeef, FailurePolicy::Propagate).unwrap_err();
    assert!(matches!(err, Error::Query { address: 0xbeef, code: -1, .. }));

    let frame = resolve_frame(&handle, 0xbeef, FailurePolicy::Absorb).unwrap();
    assert!(frame.is_null());
}

#[test]
fn test_batch_shape_and_order() {
    let handle = handle(
        ScriptedBackend::new()
            .frame(0x1000, Some("a.c"), 42, Some("foo"))
            .symbol(0x2000, Some("bar"))
            .frame(0x3000, Some("c.c"), 7, Some("qux")),
    );

    let empty = resolve_frames(&handle, &[], FailurePolicy::Propagate).unwrap();
    assert!(empty.is_empty());

    let addresses = [0x3000, 0x1000, 0x9000, 0x2000, 0x1000];
    let frames = resolve_frames(&handle, &addresses, FailurePolicy::Propagate).unwrap();
    assert_eq!(frames.len(), addresses.len());
    for (frame, address) in frames.iter().zip(addresses) {
        assert_eq!(frame.raw_address, address);
    }
    let symbols: Vec<_> = frames.iter().map(|f| f.symbol.as_str()).collect();
    assert_eq!(symbols, ["qux", "foo", "", "bar", "foo"]);
}

#[test]
fn test_batch_absorbs_poisoned_address() {
    let handle = handle(
        ScriptedBackend::new()
            .frame(0x1000, Some("a.c"), 42, Some("foo"))
            .pcinfo_error(0xdead, "bad dwarf", -1)
            .symbol(0x2000, Some("bar")),
    );

    let frames =
        resolve_frames(&handle, &[0x1000, 0xdead, 0x2000], FailurePolicy::Absorb).unwrap();
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].symbol, "foo");
    assert!(frames[1].is_null());
    assert_eq!(frames[2].symbol, "bar");
}

#[test]
fn test_batch_propagates_first_failure() {
    let handle = handle(
        ScriptedBackend::new()
            .frame(0x1000, Some("a.c"), 42, Some("foo"))
            .pcinfo_error(0xdead, "bad dwarf", -1)
            .frame(0x2000, Some("b.c"), 1, Some("bar")),
    );

    let err = resolve_frames(&handle, &[0x1000, 0xdead, 0x2000], FailurePolicy::Propagate)
        .unwrap_err();
    assert!(matches!(err, Error::Query { address: 0xdead, .. }));
    // 失敗したアドレス以降は問い合わせない
    assert_eq!(handle.backend().pcinfo_calls(), 2);
}
