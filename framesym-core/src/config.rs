//! シンボル化の設定

use crate::resolver::FailurePolicy;
use tracing::warn;

/// プログラム名を指定する環境変数
pub const ENV_PROGRAM: &str = "FRAMESYM_PROGRAM";
/// バックエンドをスレッドセーフに作成するかを指定する環境変数
pub const ENV_THREADED: &str = "FRAMESYM_THREADED";
/// 解決の失敗を吸収するかを指定する環境変数
pub const ENV_ABSORB_FAILURES: &str = "FRAMESYM_ABSORB_FAILURES";

/// シンボル化の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolizerConfig {
    /// バックエンドに渡すプログラム名（Noneなら実行中のプログラム）
    pub program_name: Option<String>,
    /// バックエンドに複数スレッドからの利用を要求するか
    pub threaded: bool,
    /// 問い合わせ中の失敗の扱い
    pub failure_policy: FailurePolicy,
}

impl Default for SymbolizerConfig {
    fn default() -> Self {
        Self {
            program_name: None,
            threaded: true,
            failure_policy: FailurePolicy::Absorb,
        }
    }
}

impl SymbolizerConfig {
    pub fn with_program_name(mut self, program_name: impl Into<String>) -> Self {
        self.program_name = Some(program_name.into());
        self
    }

    pub fn with_threaded(mut self, threaded: bool) -> Self {
        self.threaded = threaded;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// 環境変数で既定値を上書きした設定を作成する
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の参照関数で既定値を上書きした設定を作成する
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(program) = lookup(ENV_PROGRAM).filter(|p| !p.is_empty()) {
            config.program_name = Some(program);
        }
        if let Some(threaded) = lookup_bool(&lookup, ENV_THREADED) {
            config.threaded = threaded;
        }
        if let Some(absorb) = lookup_bool(&lookup, ENV_ABSORB_FAILURES) {
            config.failure_policy = if absorb {
                FailurePolicy::Absorb
            } else {
                FailurePolicy::Propagate
            };
        }

        config
    }

    /// バックエンドに渡すプログラム名を決定する
    ///
    /// 設定がなければ実行ファイルのパス、それも取れなければargv[0]を使う。
    pub fn resolve_program_name(&self) -> String {
        if let Some(program) = &self.program_name {
            return program.clone();
        }

        std::env::current_exe()
            .map(|path| path.to_string_lossy().into_owned())
            .ok()
            .or_else(|| std::env::args().next())
            .unwrap_or_default()
    }
}

fn lookup_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    let value = lookup(key)?;
    let parsed = parse_bool(&value);
    if parsed.is_none() {
        warn!("Ignoring invalid value for {}: '{}'", key, value);
    }
    parsed
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = SymbolizerConfig::default();
        assert_eq!(config.program_name, None);
        assert!(config.threaded);
        assert_eq!(config.failure_policy, FailurePolicy::Absorb);
    }

    #[test]
    fn test_from_lookup() {
        let config = SymbolizerConfig::from_lookup(lookup_from(&[
            (ENV_PROGRAM, "/opt/app"),
            (ENV_THREADED, "off"),
            (ENV_ABSORB_FAILURES, "FALSE"),
        ]));
        assert_eq!(config.program_name.as_deref(), Some("/opt/app"));
        assert!(!config.threaded);
        assert_eq!(config.failure_policy, FailurePolicy::Propagate);
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let config = SymbolizerConfig::from_lookup(lookup_from(&[
            (ENV_PROGRAM, ""),
            (ENV_THREADED, "maybe"),
            (ENV_ABSORB_FAILURES, "2"),
        ]));
        assert_eq!(config, SymbolizerConfig::default());
    }

    #[test]
    fn test_resolve_program_name() {
        let config = SymbolizerConfig::default().with_program_name("/bin/true");
        assert_eq!(config.resolve_program_name(), "/bin/true");

        let exe = std::env::current_exe().unwrap();
        assert_eq!(
            SymbolizerConfig::default().resolve_program_name(),
            exe.to_string_lossy()
        );
    }
}
