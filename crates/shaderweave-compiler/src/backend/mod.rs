//! # shaderweave 後処理バックエンド
//!
//! トークン単位で HLSL 表記に変換されたテキストを最終的なシェーダーソースに整えます。
//! 構造の移動 ([`reorganize`]) を先に行い、その後で行単位の置換 ([`rewrite`]) を適用します。
//! 置換は行ごとに独立しているため、移動済みの位置を追跡する必要はありません。

pub mod reorganize;
pub mod rewrite;

// 再エクスポート
pub use self::reorganize::{apply_edits, ClassRecord, Edit, EditPlan, Reorganized, Reorganizer};
pub use self::rewrite::{NamespaceLowering, ReplaceRule, ReplacementTable};

use crate::config::CompilerConfig;
use crate::diagnostics::Diagnostic;
use crate::error::Result;

/// 後処理の結果
#[derive(Debug, Clone, Default)]
pub struct PostProcessed {
    /// 出力テキスト
    pub text: String,
    /// 移動後の構造体数
    pub class_count: usize,
    /// 診断情報
    pub diagnostics: Vec<Diagnostic>,
}

/// 後処理パイプライン
#[derive(Debug, Clone)]
pub struct PostProcessor {
    reorganizer: Reorganizer,
    table: ReplacementTable,
    rewrite: bool,
}

impl Default for PostProcessor {
    fn default() -> Self {
        Self::new(&CompilerConfig::default())
    }
}

impl PostProcessor {
    /// 設定から後処理パイプラインを作成
    pub fn new(config: &CompilerConfig) -> Self {
        Self {
            reorganizer: Reorganizer::new(config.markers.clone()),
            table: ReplacementTable::from_config(&config.rewrite),
            rewrite: true,
        }
    }

    /// 置換パスを有効/無効にする
    pub fn with_rewrite(mut self, enabled: bool) -> Self {
        self.rewrite = enabled;
        self
    }

    /// 置換表
    pub fn table(&self) -> &ReplacementTable {
        &self.table
    }

    /// テキスト全体を処理
    pub fn process(&self, src: &str) -> Result<PostProcessed> {
        let lines: Vec<&str> = src.split('\n').collect();
        let mut reorganized = self.reorganizer.reorganize(&lines)?;

        if self.rewrite {
            self.table.rewrite(&mut reorganized.lines);
        }

        Ok(PostProcessed {
            text: reorganized.lines.join("\n"),
            class_count: reorganized.classes.len(),
            diagnostics: reorganized.diagnostics,
        })
    }
}

/// デフォルト設定でテキストを後処理
pub fn post_process(src: &str) -> Result<String> {
    PostProcessor::default().process(src).map(|processed| processed.text)
}
