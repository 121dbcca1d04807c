//! # エラー処理モジュール
//!
//! shaderweave の変換処理で発生するエラーを定義します。
//! 解決できないパスやマーカーの不整合は診断情報として扱われ、
//! ここで定義するエラーは処理全体を中断させるものに限られます。

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// コンパイラのエラー型
#[derive(Error, Debug)]
pub enum CompilerError {
    #[error("ファイル '{}' の操作に失敗しました: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("設定ファイルの解析に失敗しました [パス: {}]: {message}", .path.display())]
    Config {
        path: PathBuf,
        message: String,
    },

    #[error("パッケージ '{spec}' を解決できません: {message}")]
    PackageResolution {
        spec: String,
        message: String,
    },

    #[error("パッケージメタデータの解析に失敗しました: {0}")]
    PackageMetadata(#[from] serde_json::Error),

    #[error("構造体 '{name}' が重複して宣言されています (行 {first_line} と 行 {second_line})")]
    DuplicateClass {
        name: String,
        first_line: usize,
        second_line: usize,
    },
}

impl CompilerError {
    /// パッケージ解決エラーを作成
    pub fn package(spec: impl Into<String>, message: impl Into<String>) -> Self {
        CompilerError::PackageResolution {
            spec: spec.into(),
            message: message.into(),
        }
    }
}

/// コンパイラ処理の結果型
pub type Result<T> = std::result::Result<T, CompilerError>;
