//! テスト用の台本どおりに応答するバックエンド

#![allow(dead_code)]

use framesym_core::{Address, DebugInfoBackend, ErrorCallback, FrameCallback, SymbolCallback};
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// バックエンドが1回の問い合わせ中に起こす出来事
#[derive(Debug, Clone)]
pub enum Event {
    Frame {
        file: Option<&'static str>,
        line: u32,
        function: Option<&'static str>,
    },
    Symbol(Option<&'static str>),
    Error(&'static str, i32),
}

#[derive(Debug)]
pub struct ScriptedState {
    pub program_name: String,
    pub threaded: bool,
}

#[derive(Debug, Default)]
pub struct ScriptedBackend {
    pcinfo_script: HashMap<Address, Vec<Event>>,
    syminfo_script: HashMap<Address, Vec<Event>>,
    create_error: Option<(&'static str, i32)>,
    create_without_state: bool,
    create_delay: Duration,
    pub creations: AtomicUsize,
    pub pcinfo_calls: AtomicUsize,
    pub syminfo_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(
        mut self,
        address: Address,
        file: Option<&'static str>,
        line: u32,
        function: Option<&'static str>,
    ) -> Self {
        self.pcinfo_script
            .entry(address)
            .or_default()
            .push(Event::Frame {
                file,
                line,
                function,
            });
        self
    }

    pub fn pcinfo_error(mut self, address: Address, message: &'static str, code: i32) -> Self {
        self.pcinfo_script
            .entry(address)
            .or_default()
            .push(Event::Error(message, code));
        self
    }

    pub fn symbol(mut self, address: Address, symbol: Option<&'static str>) -> Self {
        self.syminfo_script
            .entry(address)
            .or_default()
            .push(Event::Symbol(symbol));
        self
    }

    pub fn syminfo_error(mut self, address: Address, message: &'static str, code: i32) -> Self {
        self.syminfo_script
            .entry(address)
            .or_default()
            .push(Event::Error(message, code));
        self
    }

    pub fn failing_creation(mut self, message: &'static str, code: i32) -> Self {
        self.create_error = Some((message, code));
        self
    }

    pub fn creation_without_state(mut self) -> Self {
        self.create_without_state = true;
        self
    }

    pub fn slow_creation(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    pub fn pcinfo_calls(&self) -> usize {
        self.pcinfo_calls.load(Ordering::SeqCst)
    }

    pub fn syminfo_calls(&self) -> usize {
        self.syminfo_calls.load(Ordering::SeqCst)
    }
}

impl DebugInfoBackend for ScriptedBackend {
    type State = ScriptedState;

    fn create_state(
        &self,
        program_name: &str,
        threaded: bool,
        on_error: &mut ErrorCallback<'_>,
    ) -> Option<ScriptedState> {
        self.creations.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.create_delay);

        if let Some((message, code)) = self.create_error {
            on_error(message, code);
        }
        if self.create_without_state {
            return None;
        }
        Some(ScriptedState {
            program_name: program_name.to_string(),
            threaded,
        })
    }

    fn pcinfo(
        &self,
        _state: &ScriptedState,
        pc: Address,
        on_frame: &mut FrameCallback<'_>,
        on_error: &mut ErrorCallback<'_>,
    ) {
        self.pcinfo_calls.fetch_add(1, Ordering::SeqCst);
        for event in self.pcinfo_script.get(&pc).into_iter().flatten() {
            match *event {
                Event::Frame {
                    file,
                    line,
                    function,
                } => {
                    if on_frame(pc, file, line, function) == ControlFlow::Break(()) {
                        return;
                    }
                }
                Event::Error(message, code) => on_error(message, code),
                Event::Symbol(_) => unreachable!("symbol event in pcinfo script"),
            }
        }
    }

    fn syminfo(
        &self,
        _state: &ScriptedState,
        pc: Address,
        on_symbol: &mut SymbolCallback<'_>,
        on_error: &mut ErrorCallback<'_>,
    ) {
        self.syminfo_calls.fetch_add(1, Ordering::SeqCst);
        for event in self.syminfo_script.get(&pc).into_iter().flatten() {
            match *event {
                Event::Symbol(symbol) => on_symbol(pc, symbol, pc, 0),
                Event::Error(message, code) => on_error(message, code),
                Event::Frame { .. } => unreachable!("frame event in syminfo script"),
            }
        }
    }
}
