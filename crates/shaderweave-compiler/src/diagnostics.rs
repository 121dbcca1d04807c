//! 診断情報モジュール
//!
//! 変換処理の診断情報を収集し、`log` を通じて出力するためのユーティリティを提供します。
//! 個々の入力に関する問題は処理を中断せず、ここに記録されます。

use std::fmt;

/// 診断情報のレベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticLevel {
    /// 注意
    Note,
    /// 情報
    Info,
    /// 警告
    Warning,
    /// エラー
    Error,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Error => write!(f, "エラー"),
            DiagnosticLevel::Warning => write!(f, "警告"),
            DiagnosticLevel::Info => write!(f, "情報"),
            DiagnosticLevel::Note => write!(f, "注意"),
        }
    }
}

/// 診断コード
pub mod codes {
    /// 対応する構造体が無い、または開いているメソッドが無いマーカー
    pub const ORPHAN_MARKER: &str = "orphan-marker";
    /// 閉じトークンが無い、または未知のタグを持つマーカー
    pub const MALFORMED_MARKER: &str = "malformed-marker";
    /// 宣言されていない構造体への終了マーカー
    pub const UNDECLARED_CLASS: &str = "undeclared-class";
    /// 終了マーカーの前に次のメソッドが始まった
    pub const UNTERMINATED_METHOD: &str = "unterminated-method";
    /// 構造体名を取り出せない宣言行
    pub const EMPTY_CLASS_NAME: &str = "empty-class-name";
    /// パスまたはパッケージを解決できない
    pub const UNRESOLVED_PATH: &str = "unresolved-path";
    /// ディレクトリ走査中のエラー
    pub const WALK_ERROR: &str = "walk-error";
}

/// 診断情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// レベル
    pub level: DiagnosticLevel,
    /// メッセージ
    pub message: String,
    /// コード
    pub code: Option<&'static str>,
    /// 入力テキスト上の行 (0始まり)
    pub line: Option<usize>,
}

impl Diagnostic {
    /// 新しい診断情報を作成
    pub fn new(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            code: None,
            line: None,
        }
    }

    /// 警告を作成
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warning, message)
    }

    /// コードを設定
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    /// 行番号を設定
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        if let Some(line) = self.line {
            write!(f, " {}行目", line + 1)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// 診断情報エミッタ - 診断情報を記録してログに出力する
#[derive(Debug, Default)]
pub struct DiagnosticEmitter {
    /// 診断情報
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticEmitter {
    /// 新しい診断エミッタを作成
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    /// 診断情報をログに出力して記録
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        match diagnostic.level {
            DiagnosticLevel::Error => log::error!("{}", diagnostic),
            DiagnosticLevel::Warning => log::warn!("{}", diagnostic),
            DiagnosticLevel::Info => log::info!("{}", diagnostic),
            DiagnosticLevel::Note => log::debug!("{}", diagnostic),
        }
        self.diagnostics.push(diagnostic);
    }

    /// 診断情報を取得
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// 記録した診断情報を取り出す
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

}
