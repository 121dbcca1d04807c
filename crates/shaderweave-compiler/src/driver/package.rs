// パッケージメタデータの解決を担当するモジュール
// インポートパスから、そのパッケージを構成する Go ソースファイルの一覧を取得します

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;

use serde::Deserialize;

use crate::config::ResolverConfig;
use crate::error::{CompilerError, Result};

/// ソースパッケージの解決器
///
/// ファイルシステム上に存在しない指定子はインポートパスとして扱われ、
/// この解決器に問い合わせられます。
pub trait SourcePackageResolver {
    /// パッケージのソースファイルを報告順に返す
    fn package_files(&self, import_path: &str) -> Result<Vec<PathBuf>>;
}

impl<R: SourcePackageResolver + ?Sized> SourcePackageResolver for &R {
    fn package_files(&self, import_path: &str) -> Result<Vec<PathBuf>> {
        (**self).package_files(import_path)
    }
}

impl<R: SourcePackageResolver + ?Sized> SourcePackageResolver for Box<R> {
    fn package_files(&self, import_path: &str) -> Result<Vec<PathBuf>> {
        (**self).package_files(import_path)
    }
}

/// `go list -json` の出力のうち必要な部分
#[derive(Debug, Deserialize)]
struct GoListPackage {
    #[serde(rename = "ImportPath", default)]
    import_path: String,
    #[serde(rename = "Dir", default)]
    dir: PathBuf,
    #[serde(rename = "GoFiles", default)]
    go_files: Vec<String>,
    #[serde(rename = "Error", default)]
    error: Option<GoListError>,
}

#[derive(Debug, Deserialize)]
struct GoListError {
    #[serde(rename = "Err", default)]
    err: String,
}

/// `go list` コマンドを使う解決器
#[derive(Debug, Clone)]
pub struct GoListResolver {
    go_command: String,
}

impl Default for GoListResolver {
    fn default() -> Self {
        Self::new("go")
    }
}

impl GoListResolver {
    pub fn new(go_command: impl Into<String>) -> Self {
        Self {
            go_command: go_command.into(),
        }
    }

    /// `go list -json` の出力を解析
    ///
    /// 複数のパッケージが出力された場合は最初のものを使います。
    fn parse_output(import_path: &str, stdout: &[u8]) -> Result<Vec<PathBuf>> {
        let mut stream = serde_json::Deserializer::from_slice(stdout).into_iter::<GoListPackage>();
        let package = match stream.next() {
            Some(package) => package?,
            None => return Err(CompilerError::package(import_path, "パッケージが出力されませんでした")),
        };

        if let Some(error) = package.error {
            return Err(CompilerError::package(import_path, error.err));
        }

        log::debug!(
            "パッケージ '{}' ({}) のファイル数: {}",
            package.import_path,
            package.dir.display(),
            package.go_files.len()
        );
        Ok(package
            .go_files
            .iter()
            .map(|file| package.dir.join(file))
            .collect())
    }
}

impl SourcePackageResolver for GoListResolver {
    fn package_files(&self, import_path: &str) -> Result<Vec<PathBuf>> {
        let mut command = Command::new(&self.go_command);
        command.args(["list", "-json", import_path]);

        let output = command.output().map_err(|err| {
            CompilerError::package(import_path, format!("'{}' を実行できません: {}", self.go_command, err))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CompilerError::package(import_path, stderr.trim().to_string()));
        }

        Self::parse_output(import_path, &output.stdout)
    }
}

/// メモリ上の対応表を使う解決器
///
/// 設定ファイルで固定したパッケージやテストに使います。
/// 対応表に無いインポートパスは、設定されていればフォールバックに委ねます。
#[derive(Default)]
pub struct StaticPackageResolver {
    packages: BTreeMap<String, Vec<PathBuf>>,
    fallback: Option<Box<dyn SourcePackageResolver>>,
}

impl std::fmt::Debug for StaticPackageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticPackageResolver")
            .field("packages", &self.packages)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl StaticPackageResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 設定の `[resolver.packages]` から作成
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            packages: config.packages.clone(),
            fallback: None,
        }
    }

    /// パッケージを登録
    pub fn with_package<I, P>(mut self, import_path: impl Into<String>, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.packages
            .insert(import_path.into(), files.into_iter().map(Into::into).collect());
        self
    }

    /// 対応表に無いパッケージの問い合わせ先を設定
    pub fn with_fallback<R: SourcePackageResolver + 'static>(mut self, fallback: R) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }
}

impl SourcePackageResolver for StaticPackageResolver {
    fn package_files(&self, import_path: &str) -> Result<Vec<PathBuf>> {
        if let Some(files) = self.packages.get(import_path) {
            return Ok(files.clone());
        }
        match &self.fallback {
            Some(fallback) => fallback.package_files(import_path),
            None => Err(CompilerError::package(import_path, "パッケージが見つかりません")),
        }
    }
}
