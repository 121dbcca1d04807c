//! 置換パス
//!
//! 構造の移動が終わった後に各行へ適用するリテラル置換です。
//! Go の数値型・組み込み関数・`slbool` ラッパーを HLSL の表記に置き換え、
//! 名前空間付きの関数呼び出しを先頭小文字の識別子に平坦化します。

use std::borrow::Cow;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::config::RewriteConfig;

/// 組み込みの置換表 (適用順)
pub const DEFAULT_REPLACES: &[(&str, &str)] = &[
    ("float32", "float"),
    ("float64", "double"),
    ("uint32", "uint"),
    ("int32", "int"),
    ("mat32.FastExp(", "FastExp("),
    ("math.Float32frombits(", "asfloat("),
    ("slbool.Bool", "int"),
    ("slbool.True", "1"),
    ("slbool.False", "0"),
    ("slbool.IsTrue(", "(1 == "),
    ("slbool.IsFalse(", "(0 == "),
    ("slbool.FromBool(", "int("),
];

/// 組み込みの名前空間接頭辞
pub const DEFAULT_NAMESPACE_PREFIXES: &[&str] = &["mat32.", "math."];

/// リテラル置換ルール
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceRule {
    /// 置換前のテキスト
    pub from: String,
    /// 置換後のテキスト
    pub to: String,
}

impl ReplaceRule {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// 名前空間の除去と先頭文字の小文字化
///
/// `ns.ComputeValue(` は `computeValue(` になります。
#[derive(Debug, Clone)]
pub struct NamespaceLowering {
    pattern: Regex,
}

impl NamespaceLowering {
    pub fn new(prefix: &str) -> Self {
        // 接頭辞はエスケープ済みなので常に有効なパターンになる
        let pattern = Regex::new(&format!("{}(.)", regex::escape(prefix)))
            .expect("エスケープ済みの接頭辞パターン");
        Self { pattern }
    }

    /// 1行に含まれる全ての出現を処理
    ///
    /// 小文字化した文字の直後から走査を続けます。行末の接頭辞は
    /// 後続文字が無いためそのまま残ります。
    pub fn apply<'a>(&self, line: &'a str) -> Cow<'a, str> {
        self.pattern
            .replace_all(line, |caps: &Captures<'_>| caps[1].to_lowercase())
    }
}

/// 置換表
#[derive(Debug, Clone)]
pub struct ReplacementTable {
    rules: Vec<ReplaceRule>,
    namespaces: Vec<NamespaceLowering>,
}

impl Default for ReplacementTable {
    fn default() -> Self {
        Self::from_config(&RewriteConfig::default())
    }
}

impl ReplacementTable {
    /// 設定から置換表を構築
    ///
    /// 組み込みの置換表の後に設定の追加ルールを並べます。
    pub fn from_config(config: &RewriteConfig) -> Self {
        let mut rules: Vec<ReplaceRule> = DEFAULT_REPLACES
            .iter()
            .map(|(from, to)| ReplaceRule::new(*from, *to))
            .collect();

        for rule in &config.extra_rules {
            if rule.from.is_empty() {
                log::warn!("置換元が空のルールを無視します (置換先: {:?})", rule.to);
                continue;
            }
            rules.push(rule.clone());
        }

        let namespaces = config
            .namespace_prefixes
            .iter()
            .filter(|prefix| !prefix.is_empty())
            .map(|prefix| NamespaceLowering::new(prefix))
            .collect();

        Self { rules, namespaces }
    }

    /// 置換ルール
    pub fn rules(&self) -> &[ReplaceRule] {
        &self.rules
    }

    /// 1行を書き換える
    pub fn rewrite_line(&self, line: &str) -> String {
        let mut out = line.to_string();
        for rule in &self.rules {
            if out.contains(&rule.from) {
                out = out.replace(&rule.from, &rule.to);
            }
        }
        for ns in &self.namespaces {
            if let Cow::Owned(lowered) = ns.apply(&out) {
                out = lowered;
            }
        }
        out
    }

    /// 全ての行を書き換える
    pub fn rewrite(&self, lines: &mut [String]) {
        for line in lines.iter_mut() {
            *line = self.rewrite_line(line);
        }
    }
}
