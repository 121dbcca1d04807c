//! # shaderweave ドライバー
//!
//! 変換対象となる Go ソースファイルの集合を決定するモジュールです。
//! ファイル・ディレクトリ・パッケージ指定子の一覧を受け取り、重複の無い
//! 順序付きのファイル一覧と、読み込まれたパッケージ名の集合を作ります。
//! 1つの指定子の失敗は記録されるだけで、一覧全体の解決は継続します。

pub mod file_set;
pub mod package;

// 再エクスポート
pub use self::file_set::{FileSet, FileSetResolver};
pub use self::package::{GoListResolver, SourcePackageResolver, StaticPackageResolver};

use crate::config::ResolverConfig;

/// 設定に従って標準のパッケージ解決器を作成
///
/// `[resolver.packages]` に定義されたパッケージを優先し、それ以外は `go list` に問い合わせます。
pub fn default_package_resolver(config: &ResolverConfig) -> StaticPackageResolver {
    StaticPackageResolver::from_config(config).with_fallback(GoListResolver::new(config.go_command.clone()))
}

/// 設定に従ってファイル集合を解決
pub fn resolve_files<S: AsRef<str>>(config: &ResolverConfig, specs: &[S]) -> FileSet {
    let mut resolver = FileSetResolver::new(config.clone(), default_package_resolver(config));
    resolver.resolve_file_set(specs)
}
