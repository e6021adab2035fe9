//! 対話モードのコマンド

use framesym_core::{Address, FailurePolicy};

/// 対話モードのコマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// アドレスを解決
    Resolve(Vec<Address>),
    /// インライン展開の各段を表示
    Inline(Address),
    /// 失敗の扱いを変更
    Policy(FailurePolicy),
    /// ヘルプ表示
    Help,
    /// 終了
    Quit,
}

/// アドレスを解釈する（0xの有無を問わず16進数）
pub fn parse_address(input: &str) -> Option<Address> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    Address::from_str_radix(digits, 16).ok()
}

impl Command {
    /// コマンド文字列をパースする
    pub fn parse(input: &str) -> Option<Self> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let (&first, rest) = parts.split_first()?;

        match first {
            "inline" | "i" => match rest {
                [addr] => parse_address(addr).map(Command::Inline),
                _ => None,
            },
            "policy" | "p" => match rest {
                ["absorb"] => Some(Command::Policy(FailurePolicy::Absorb)),
                ["propagate"] => Some(Command::Policy(FailurePolicy::Propagate)),
                _ => None,
            },
            "help" | "h" | "?" => Some(Command::Help),
            "quit" | "q" | "exit" => Some(Command::Quit),
            _ => parts
                .iter()
                .map(|part| parse_address(part))
                .collect::<Option<Vec<_>>>()
                .map(Command::Resolve),
        }
    }
}
