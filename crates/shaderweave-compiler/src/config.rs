// 設定管理を行うモジュール
// ファイル解決、マーカー書式、置換ルールの設定を TOML から読み込みます

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::backend::rewrite::{ReplaceRule, DEFAULT_NAMESPACE_PREFIXES};
use crate::error::{CompilerError, Result};

/// 設定ファイルのデフォルト名
pub const DEFAULT_CONFIG_FILE: &str = "shaderweave.toml";

/// コンパイラ全体の設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// ファイル解決の設定
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// マーカー書式の設定
    #[serde(default)]
    pub markers: MarkerConfig,

    /// 置換パスの設定
    #[serde(default)]
    pub rewrite: RewriteConfig,
}

/// ファイル解決の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// 変換対象ソースの拡張子 (ドットなし)
    pub source_extension: String,

    /// 隠しファイルを示す接頭辞
    pub hidden_prefix: String,

    /// パッケージ名の記録から除外する共有サポートパッケージ
    pub shared_package: String,

    /// パッケージメタデータ取得に使う go コマンド
    pub go_command: String,

    /// 固定のパッケージ定義 (インポートパス -> ファイル一覧)
    pub packages: BTreeMap<String, Vec<PathBuf>>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            source_extension: "go".to_string(),
            hidden_prefix: ".".to_string(),
            shared_package: "mat32".to_string(),
            go_command: "go".to_string(),
            packages: BTreeMap::new(),
        }
    }
}

/// マーカー書式の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// 構造体宣言行の接頭辞
    pub class_prefix: String,
    /// 行コメントの接頭辞
    pub comment_prefix: String,
    /// マーカー開始トークン
    pub open: String,
    /// マーカー終了トークン
    pub close: String,
    /// 構造体終了タグの接頭辞
    pub end_class: String,
    /// メソッド開始タグの接頭辞
    pub method: String,
    /// メソッド終了タグ
    pub end_method: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            class_prefix: "struct ".to_string(),
            comment_prefix: "//".to_string(),
            open: "<<<<".to_string(),
            close: ">>>>".to_string(),
            end_class: "EndClass: ".to_string(),
            method: "Method: ".to_string(),
            end_method: "EndMethod".to_string(),
        }
    }
}

/// 置換パスの設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// 組み込みの置換表の後に適用する追加ルール
    pub extra_rules: Vec<ReplaceRule>,

    /// 名前空間を取り除いて先頭を小文字化する接頭辞
    pub namespace_prefixes: Vec<String>,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            extra_rules: Vec::new(),
            namespace_prefixes: DEFAULT_NAMESPACE_PREFIXES.iter().map(|prefix| prefix.to_string()).collect(),
        }
    }
}

impl CompilerConfig {
    /// 設定をロード
    ///
    /// ファイルが存在しない場合はデフォルト設定を返します。
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            log::debug!("設定ファイルがありません。デフォルト設定を使用します: {}", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| CompilerError::Filesystem {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&contents).map_err(|err| match err {
            CompilerError::Config { message, .. } => CompilerError::Config {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// TOML 文字列から設定を作成
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|err| CompilerError::Config {
            path: PathBuf::new(),
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = CompilerConfig::from_toml_str("").unwrap();
        assert_eq!(config, CompilerConfig::default());
        assert_eq!(config.resolver.shared_package, "mat32");
        assert_eq!(config.markers.open, "<<<<");
        assert_eq!(config.rewrite.namespace_prefixes, vec!["mat32.", "math."]);
    }

    #[test]
    fn test_default_prefixes_follow_builtin_table() {
        let prefixes = RewriteConfig::default().namespace_prefixes;
        assert_eq!(prefixes, DEFAULT_NAMESPACE_PREFIXES);
    }

    #[test]
    fn test_partial_tables_keep_other_defaults() {
        let config = CompilerConfig::from_toml_str(
            r#"
            [resolver]
            shared_package = "vecmath"

            [resolver.packages]
            "example.com/kinase" = ["kinase/params.go"]

            [[rewrite.extra_rules]]
            from = "math32.Exp("
            to = "exp("
            "#,
        )
        .unwrap();

        assert_eq!(config.resolver.shared_package, "vecmath");
        assert_eq!(config.resolver.source_extension, "go");
        assert_eq!(
            config.resolver.packages["example.com/kinase"],
            vec![PathBuf::from("kinase/params.go")]
        );
        assert_eq!(config.rewrite.extra_rules.len(), 1);
        assert_eq!(config.rewrite.extra_rules[0].from, "math32.Exp(");
        assert_eq!(config.markers, MarkerConfig::default());
    }

    #[test]
    fn test_malformed_config_is_error() {
        let result = CompilerConfig::from_toml_str("[resolver\nsource_extension = 1");
        assert!(matches!(result, Err(CompilerError::Config { .. })));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CompilerConfig::load(dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(config, CompilerConfig::default());
    }
}
