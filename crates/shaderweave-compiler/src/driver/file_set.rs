// 変換対象ファイルの解決を担当するモジュール
// パスやパッケージ指定子の一覧を、重複の無い順序付きのソースファイル一覧に変換します

use std::collections::{BTreeSet, HashSet};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::config::ResolverConfig;
use crate::diagnostics::{codes, Diagnostic, DiagnosticEmitter};
use crate::driver::package::SourcePackageResolver;

/// 解決結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileSet {
    /// ソースファイル (発見順)
    pub files: Vec<PathBuf>,
    /// 読み込まれたパッケージ名
    pub packages: BTreeSet<String>,
}

/// ファイル集合の解決器
///
/// 解決中に見つかったパッケージ名は解決器に蓄積され、同じ実行の間は
/// [`FileSetResolver::loaded_packages`] で参照できます。
#[derive(Debug)]
pub struct FileSetResolver<R> {
    config: ResolverConfig,
    packages: R,
    loaded_packages: BTreeSet<String>,
    diagnostics: DiagnosticEmitter,
}

/// 1回の解決呼び出しの間だけ使う出力先
struct Collected {
    files: Vec<PathBuf>,
    seen: HashSet<OsString>,
}

impl<R: SourcePackageResolver> FileSetResolver<R> {
    pub fn new(config: ResolverConfig, packages: R) -> Self {
        Self {
            config,
            packages,
            loaded_packages: BTreeSet::new(),
            diagnostics: DiagnosticEmitter::new(),
        }
    }

    /// 指定子の一覧を解決
    ///
    /// 解決できない指定子は診断情報として記録され、ファイルを追加しません。
    pub fn resolve<S: AsRef<str>>(&mut self, specs: &[S]) -> Vec<PathBuf> {
        let mut collected = Collected {
            files: Vec::with_capacity(specs.len()),
            seen: HashSet::new(),
        };

        for spec in specs {
            let spec = spec.as_ref();
            match fs::metadata(spec) {
                Err(err) => {
                    log::debug!("'{}' はパスではないためパッケージとして解決します ({})", spec, err);
                    self.resolve_package(spec, &mut collected);
                }
                Ok(info) if info.is_dir() => self.walk_dir(Path::new(spec), &mut collected),
                Ok(_) => self.add_file(PathBuf::from(spec), &mut collected),
            }
        }

        log::info!("{} 個のソースファイルを解決しました", collected.files.len());
        collected.files
    }

    /// 解決してパッケージ名と合わせて返す
    pub fn resolve_file_set<S: AsRef<str>>(&mut self, specs: &[S]) -> FileSet {
        let files = self.resolve(specs);
        FileSet {
            files,
            packages: self.loaded_packages.clone(),
        }
    }

    /// 読み込まれたパッケージ名
    pub fn loaded_packages(&self) -> &BTreeSet<String> {
        &self.loaded_packages
    }

    /// 解決中の診断情報
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.diagnostics()
    }

    /// 変換対象のソースファイル名か
    pub fn is_source_file_name(&self, name: &str) -> bool {
        !name.starts_with(&self.config.hidden_prefix)
            && name
                .strip_suffix(&self.config.source_extension)
                .map_or(false, |stem| stem.ends_with('.'))
    }

    fn walk_dir(&mut self, root: &Path, collected: &mut Collected) {
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.diagnostics.emit(
                        Diagnostic::warning(format!("{} の走査中にエラー: {}", root.display(), err))
                            .with_code(codes::WALK_ERROR),
                    );
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }
            let is_source = entry
                .file_name()
                .to_str()
                .map_or(false, |name| self.is_source_file_name(name));
            if !is_source {
                log::trace!("対象外のファイルをスキップ: {}", entry.path().display());
                continue;
            }
            if let Err(err) = entry.metadata() {
                self.diagnostics.emit(
                    Diagnostic::warning(format!("{} の情報を取得できません: {}", entry.path().display(), err))
                        .with_code(codes::WALK_ERROR),
                );
                continue;
            }

            self.add_file(entry.into_path(), collected);
        }
    }

    fn resolve_package(&mut self, spec: &str, collected: &mut Collected) {
        // `import/path/file.go` はパッケージ内の1ファイルだけを指す
        let target = spec
            .rsplit_once('/')
            .filter(|(dir, file)| !dir.is_empty() && self.is_source_file_name(file));

        let (import_path, file) = match target {
            Some((dir, file)) => (dir, Some(file)),
            None => (spec, None),
        };

        let files = match self.packages.package_files(import_path) {
            Ok(files) => files,
            Err(err) => {
                self.diagnostics.emit(
                    Diagnostic::warning(format!("'{}' を解決できません: {}", spec, err))
                        .with_code(codes::UNRESOLVED_PATH),
                );
                return;
            }
        };

        match file {
            Some(file) => {
                let exact = files
                    .iter()
                    .position(|candidate| candidate.file_name().map_or(false, |name| name == file));
                let found = match exact {
                    Some(idx) => Some(files[idx].clone()),
                    None => files
                        .into_iter()
                        .find(|candidate| candidate.to_string_lossy().ends_with(file)),
                };
                match found {
                    Some(found) => self.add_file(found, collected),
                    None => self.diagnostics.emit(
                        Diagnostic::warning(format!(
                            "パッケージ '{}' にファイル '{}' がありません",
                            import_path, file
                        ))
                        .with_code(codes::UNRESOLVED_PATH),
                    ),
                }
            }
            None => {
                for found in files {
                    self.add_file(found, collected);
                }
            }
        }
    }

    fn add_file(&mut self, path: PathBuf, collected: &mut Collected) {
        if !collected.seen.insert(path.as_os_str().to_os_string()) {
            return;
        }

        if let Some(name) = package_name(&path) {
            if name != self.config.shared_package && self.loaded_packages.insert(name.clone()) {
                log::debug!("パッケージ: {}", name);
            }
        }
        collected.files.push(path);
    }
}

/// ファイルの親ディレクトリ名
fn package_name(path: &Path) -> Option<String> {
    let parent = path.parent()?;
    let name = parent.file_name()?.to_string_lossy();
    if name.is_empty() {
        None
    } else {
        Some(name.into_owned())
    }
}
