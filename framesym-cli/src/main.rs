//! framesym CLI - コマンドラインインターフェース
//!
//! 命令アドレスをファイル・行・シンボル名に解決する

mod command;

use anyhow::Result;
use clap::{Parser, Subcommand};
use command::{parse_address, Command};
use framesym_core::{
    Address, DwarfBackend, FailurePolicy, LoadBias, ResolvedFrame, Symbolizer, SymbolizerConfig,
};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::BufRead;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// framesym - resolve instruction addresses to source locations
#[derive(Parser)]
#[command(name = "framesym")]
#[command(version = "0.1.0")]
#[command(about = "Resolve instruction addresses to file, line and symbol", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: SymCommand,
}

#[derive(Subcommand)]
enum SymCommand {
    /// Resolve addresses given as arguments, or read them from stdin
    Resolve {
        /// Path to the binary with debug information
        binary: String,

        /// Hexadecimal addresses to resolve
        addresses: Vec<String>,

        #[command(flatten)]
        options: ResolveOptions,
    },

    /// Resolve addresses interactively
    Repl {
        /// Path to the binary with debug information
        binary: String,

        #[command(flatten)]
        options: ResolveOptions,
    },
}

#[derive(clap::Args)]
struct ResolveOptions {
    /// Load bias subtracted from every address (hexadecimal)
    #[arg(long, value_parser = parse_bias, default_value = "0")]
    bias: Address,

    /// Stop at the first failing address instead of printing an empty frame
    #[arg(long)]
    propagate: bool,

    /// Print every inlined frame instead of only the outermost one
    #[arg(long)]
    inline: bool,

    /// Demangle Rust symbol names
    #[arg(long)]
    demangle: bool,
}

fn parse_bias(input: &str) -> std::result::Result<Address, String> {
    parse_address(input).ok_or_else(|| format!("invalid hexadecimal address: {}", input))
}

/// 出力の形式
#[derive(Clone, Copy)]
struct Output {
    inline: bool,
    demangle: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        SymCommand::Resolve {
            binary,
            addresses,
            options,
        } => {
            let (symbolizer, output) = init_symbolizer(&binary, &options);
            let addresses = if addresses.is_empty() {
                read_addresses(std::io::stdin().lock())?
            } else {
                addresses
                    .iter()
                    .map(|s| parse_bias(s).map_err(anyhow::Error::msg))
                    .collect::<Result<Vec<_>>>()?
            };
            print_resolved(&symbolizer, &addresses, output)?;
        }
        SymCommand::Repl { binary, options } => {
            let (mut symbolizer, output) = init_symbolizer(&binary, &options);
            // 作成の失敗はここで報告する
            symbolizer.handle()?;
            println!("Loaded debug information from {}", binary);
            run_repl(&mut symbolizer, output)?;
        }
    }

    Ok(())
}

/// シンボライザを初期化する（バックエンドは最初の解決時に作られる）
fn init_symbolizer(binary: &str, options: &ResolveOptions) -> (Symbolizer<DwarfBackend>, Output) {
    let policy = if options.propagate {
        FailurePolicy::Propagate
    } else {
        FailurePolicy::Absorb
    };
    let config = SymbolizerConfig::from_env()
        .with_program_name(binary)
        .with_failure_policy(policy);
    let backend = DwarfBackend::with_load_bias(LoadBias::Fixed(options.bias));

    let output = Output {
        inline: options.inline,
        demangle: options.demangle,
    };
    (Symbolizer::new(backend, config), output)
}

/// 入力から1行ずつアドレスを読む（空行と#から始まる行は無視）
fn read_addresses(input: impl BufRead) -> Result<Vec<Address>> {
    let mut addresses = Vec::new();
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        for word in line.split_whitespace() {
            addresses.push(parse_bias(word).map_err(anyhow::Error::msg)?);
        }
    }
    Ok(addresses)
}

fn print_resolved(
    symbolizer: &Symbolizer<DwarfBackend>,
    addresses: &[Address],
    output: Output,
) -> Result<()> {
    debug!("Resolving {} addresses (policy {:?})", addresses.len(), symbolizer.policy());
    if output.inline {
        for (i, &address) in addresses.iter().enumerate() {
            let chain = symbolizer.resolve_inline_chain(address)?;
            print_chain(i, address, &chain, output);
        }
    } else {
        let frames = symbolizer.resolve_frames(addresses)?;
        for (i, (frame, &address)) in frames.iter().zip(addresses).enumerate() {
            print_chain(i, address, std::slice::from_ref(frame), output);
        }
    }
    Ok(())
}

/// 1アドレス分を表示する（インライン展開は外側が先）
fn print_chain(index: usize, address: Address, chain: &[ResolvedFrame], output: Output) {
    for (depth, frame) in chain.iter().rev().enumerate() {
        let prefix = if depth == 0 {
            format!("#{:<2} 0x{:016x}", index, address)
        } else {
            format!("    {:18}", "(inlined)")
        };
        println!("{} {}", prefix, describe(frame, output));
    }
}

fn describe(frame: &ResolvedFrame, output: Output) -> String {
    let symbol = if frame.symbol.is_empty() {
        "??".to_string()
    } else if output.demangle {
        format!("{:#}", rustc_demangle::demangle(&frame.symbol))
    } else {
        frame.symbol.clone()
    };

    if frame.filename.is_empty() {
        symbol
    } else {
        match frame.column {
            Some(column) => format!("{} at {}:{}:{}", symbol, frame.filename, frame.line, column),
            None => format!("{} at {}:{}", symbol, frame.filename, frame.line),
        }
    }
}

/// REPLループを実行する
fn run_repl(symbolizer: &mut Symbolizer<DwarfBackend>, output: Output) -> Result<()> {
    println!("Type 'help' for available commands, 'quit' to exit.");
    println!();

    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline("(framesym) ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                rl.add_history_entry(line)?;

                match Command::parse(line) {
                    Some(Command::Quit) => break,
                    Some(command) => {
                        if let Err(e) = handle_command(symbolizer, command, output) {
                            eprintln!("Error: {}", e);
                        }
                    }
                    None => {
                        println!("Unknown command: {}", line);
                        println!("Type 'help' for available commands.");
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

fn handle_command(
    symbolizer: &mut Symbolizer<DwarfBackend>,
    command: Command,
    output: Output,
) -> Result<()> {
    match command {
        Command::Resolve(addresses) => print_resolved(symbolizer, &addresses, output)?,
        Command::Inline(address) => {
            let chain = symbolizer.resolve_inline_chain(address)?;
            print_chain(0, address, &chain, output);
        }
        Command::Policy(policy) => {
            symbolizer.set_policy(policy);
            println!("Failure policy set to {:?}", policy);
        }
        Command::Help => print_help(),
        Command::Quit => {}
    }
    Ok(())
}

fn print_help() {
    println!("Available commands:");
    println!();
    println!("  <addr>...                 - Resolve one or more hexadecimal addresses");
    println!("  inline <addr>             - Show every inlined frame at an address");
    println!("  policy absorb|propagate   - Choose how resolution failures are reported");
    println!("  help                      - Show this help message");
    println!("  quit/exit/q               - Exit");
    println!();
    println!("Examples:");
    println!("  0x1139");
    println!("  0x1139 0x1150");
    println!("  inline 0x1139");
}
