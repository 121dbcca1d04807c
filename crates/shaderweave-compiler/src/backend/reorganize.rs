//! 行再編成パス
//!
//! トークン変換済みのテキストはまだ Go のモジュール構造に従っており、
//! メソッドは構造体宣言とは独立したトップレベルのブロックとして並んでいます。
//! 上流の変換器が埋め込んだマーカーを手がかりに、各メソッドを所属する
//! 構造体の終端直後へ移動します。
//!
//! 処理は二段階です。
//!
//! 1. [`Reorganizer::plan`] が元の行番号だけを使って走査し、削除と移動の
//!    編集操作 ([`Edit`]) を組み立てます。走査中に行番号がずれることはありません。
//! 2. [`apply_edits`] が元の行を参照しながら最終的な順序で書き出します。
//!    移動したブロックは挿入位置 (スロット) に紐付けられ、同じスロットへの
//!    ブロックは登録順に並びます。

use std::collections::HashMap;
use std::ops::Range;

use crate::config::MarkerConfig;
use crate::diagnostics::{codes, Diagnostic, DiagnosticEmitter};
use crate::error::{CompilerError, Result};

/// 構造体の記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRecord {
    /// 構造体名
    pub name: String,
    /// 宣言行
    pub start: usize,
    /// 終了マーカーの行 (未確定なら None)
    end_marker: Option<usize>,
    /// 宣言行から作成されたか
    declared: bool,
}

impl ClassRecord {
    fn declared(name: String, start: usize) -> Self {
        Self {
            name,
            start,
            end_marker: None,
            declared: true,
        }
    }

    /// 構造体の最終行 (終了マーカーの直前の行)
    pub fn end(&self) -> Option<usize> {
        self.end_marker.and_then(|marker| marker.checked_sub(1))
    }

    /// 終了マーカーが見つかっているか
    pub fn is_closed(&self) -> bool {
        self.end_marker.is_some()
    }
}

/// 編集操作
///
/// 行番号は全て入力テキストの元の行番号です。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// 1行を削除
    Delete { line: usize },
    /// 範囲をスロットの位置へ移動
    ///
    /// スロットは構造体終了マーカーの行で、ブロックはその直前の行の後ろに入ります。
    Move { lines: Range<usize>, slot: usize },
}

/// 編集計画
#[derive(Debug, Clone, Default)]
pub struct EditPlan {
    /// 編集操作 (発生順)
    pub edits: Vec<Edit>,
    /// 見つかった構造体 (宣言行順)
    pub classes: Vec<ClassRecord>,
    /// 診断情報
    pub diagnostics: Vec<Diagnostic>,
}

/// 再編成の結果
#[derive(Debug, Clone, Default)]
pub struct Reorganized {
    /// 再編成後の行
    pub lines: Vec<String>,
    /// 見つかった構造体 (宣言行順)
    pub classes: Vec<ClassRecord>,
    /// 診断情報
    pub diagnostics: Vec<Diagnostic>,
}

/// 開いているメソッド
#[derive(Debug)]
struct MethodSpan {
    class: String,
    start: usize,
    marker_line: usize,
}

/// 直前のコメント行の連なり
#[derive(Debug, Default)]
struct CommentRun {
    current: Option<usize>,
    last: Option<(usize, usize)>,
}

impl CommentRun {
    fn track(&mut self, line: usize, is_comment: bool) {
        if !is_comment {
            self.current = None;
            return;
        }
        let first = *self.current.get_or_insert(line);
        self.last = Some((first, line));
    }

    /// `line` の直前で終わっている連なりの先頭行
    fn ending_before(&self, line: usize) -> Option<usize> {
        match self.last {
            Some((first, last)) if last + 1 == line => Some(first),
            _ => None,
        }
    }
}

/// マーカー付きテキストの再編成器
#[derive(Debug, Clone, Default)]
pub struct Reorganizer {
    markers: MarkerConfig,
}

impl Reorganizer {
    pub fn new(markers: MarkerConfig) -> Self {
        Self { markers }
    }

    /// 再編成して結果を返す
    pub fn reorganize<S: AsRef<str>>(&self, lines: &[S]) -> Result<Reorganized> {
        let plan = self.plan(lines)?;
        Ok(Reorganized {
            lines: apply_edits(lines, &plan.edits),
            classes: plan.classes,
            diagnostics: plan.diagnostics,
        })
    }

    /// 編集計画を作成
    ///
    /// 同名の構造体が二度宣言された場合のみエラーになります。
    /// それ以外の不整合は診断情報として記録され、該当マーカーは何もしません。
    pub fn plan<S: AsRef<str>>(&self, lines: &[S]) -> Result<EditPlan> {
        let mut emitter = DiagnosticEmitter::new();
        let mut edits = Vec::new();
        let mut classes: HashMap<String, ClassRecord> = HashMap::new();
        let mut comments = CommentRun::default();
        let mut method: Option<MethodSpan> = None;

        for (li, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            comments.track(li, line.trim_start().starts_with(&self.markers.comment_prefix));

            if let Some(rest) = line.strip_prefix(&self.markers.class_prefix) {
                self.record_class(rest, li, &mut classes, &mut emitter)?;
                continue;
            }

            let Some(rest) = line.strip_prefix(&self.markers.open) else {
                continue;
            };
            let Some(close) = rest.find(&self.markers.close) else {
                emitter.emit(
                    Diagnostic::warning(format!(
                        "マーカーに閉じトークン '{}' がありません",
                        self.markers.close
                    ))
                    .with_code(codes::MALFORMED_MARKER)
                    .at_line(li),
                );
                continue;
            };
            let tag = &rest[..close];

            if let Some(name) = tag.strip_prefix(&self.markers.end_class) {
                let name = name.trim();
                edits.push(Edit::Delete { line: li });
                match classes.get_mut(name) {
                    Some(record) => record.end_marker = Some(li),
                    None => {
                        emitter.emit(
                            Diagnostic::warning(format!("宣言されていない構造体 '{}' の終了マーカーです", name))
                                .with_code(codes::UNDECLARED_CLASS)
                                .at_line(li),
                        );
                        classes.insert(
                            name.to_string(),
                            ClassRecord {
                                name: name.to_string(),
                                start: li.saturating_sub(1),
                                end_marker: Some(li),
                                declared: false,
                            },
                        );
                    }
                }
                log::trace!("構造体 '{}' は {}行目で終了", name, li);
            } else if let Some(name) = tag.strip_prefix(&self.markers.method) {
                edits.push(Edit::Delete { line: li });
                if let Some(open) = method.take() {
                    emitter.emit(
                        Diagnostic::warning(format!(
                            "構造体 '{}' のメソッド ({}行目) が終了しないまま次のメソッドが始まりました",
                            open.class,
                            open.marker_line + 1
                        ))
                        .with_code(codes::UNTERMINATED_METHOD)
                        .at_line(li),
                    );
                }
                // 直前に隙間なく続くコメントはメソッドと一緒に移動する
                let start = comments.ending_before(li).unwrap_or(li + 1);
                method = Some(MethodSpan {
                    class: name.trim().to_string(),
                    start,
                    marker_line: li,
                });
            } else if tag == self.markers.end_method {
                if let Some(edit) = self.close_method(method.take(), li, &classes, &mut emitter) {
                    edits.push(Edit::Delete { line: li });
                    edits.push(edit);
                }
            } else {
                emitter.emit(
                    Diagnostic::warning(format!("不明なマーカータグ '{}'", tag))
                        .with_code(codes::MALFORMED_MARKER)
                        .at_line(li),
                );
            }
        }

        if let Some(open) = method {
            emitter.emit(
                Diagnostic::warning(format!("構造体 '{}' のメソッドが終了していません", open.class))
                    .with_code(codes::UNTERMINATED_METHOD)
                    .at_line(open.marker_line),
            );
        }

        let mut classes: Vec<ClassRecord> = classes.into_values().collect();
        classes.sort_by_key(|record| record.start);

        Ok(EditPlan {
            edits,
            classes,
            diagnostics: emitter.into_diagnostics(),
        })
    }

    fn record_class(
        &self,
        rest: &str,
        li: usize,
        classes: &mut HashMap<String, ClassRecord>,
        emitter: &mut DiagnosticEmitter,
    ) -> Result<()> {
        let name = match rest.find(&['(', '{'][..]) {
            Some(idx) => &rest[..idx],
            None => rest,
        }
        .trim();

        if name.is_empty() {
            emitter.emit(
                Diagnostic::warning("構造体宣言から名前を取り出せません")
                    .with_code(codes::EMPTY_CLASS_NAME)
                    .at_line(li),
            );
            return Ok(());
        }

        // 終了マーカーだけで作られた記録は、その終端を引き継ぐ
        let end_marker = match classes.get(name) {
            Some(existing) if existing.declared => {
                return Err(CompilerError::DuplicateClass {
                    name: name.to_string(),
                    first_line: existing.start + 1,
                    second_line: li + 1,
                });
            }
            Some(existing) => existing.end_marker,
            None => None,
        };

        log::trace!("構造体 '{}' を {}行目で宣言", name, li);
        let mut record = ClassRecord::declared(name.to_string(), li);
        record.end_marker = end_marker;
        classes.insert(name.to_string(), record);
        Ok(())
    }

    /// メソッド終了マーカーを処理し、移動操作を返す
    fn close_method(
        &self,
        open: Option<MethodSpan>,
        li: usize,
        classes: &HashMap<String, ClassRecord>,
        emitter: &mut DiagnosticEmitter,
    ) -> Option<Edit> {
        let orphan = |message: String| Diagnostic::warning(message).with_code(codes::ORPHAN_MARKER).at_line(li);

        let Some(open) = open else {
            emitter.emit(orphan("開いているメソッドがありません".to_string()));
            return None;
        };

        let Some(slot) = classes.get(&open.class).and_then(|record| record.end_marker) else {
            emitter.emit(orphan(format!(
                "構造体 '{}' の終端が見つからないためメソッドを移動できません",
                open.class
            )));
            return None;
        };

        if slot >= open.start {
            emitter.emit(orphan(format!(
                "構造体 '{}' の終端がメソッドの内側にあります",
                open.class
            )));
            return None;
        }

        log::debug!(
            "構造体 '{}' のメソッド ({}..{}行目) を移動",
            open.class,
            open.start + 1,
            li
        );
        Some(Edit::Move {
            lines: open.start..li,
            slot,
        })
    }
}

/// 編集操作を適用して最終的な行を作成
///
/// 同じ行が二度書き出されることはありません。スロットが自分の範囲内にある移動は無視します。
pub fn apply_edits<S: AsRef<str>>(lines: &[S], edits: &[Edit]) -> Vec<String> {
    let mut state = EmitState {
        lines,
        deleted: vec![false; lines.len()],
        emitted: vec![false; lines.len()],
        attachments: HashMap::new(),
        out: Vec::with_capacity(lines.len()),
    };
    let mut moved = vec![false; lines.len()];

    for edit in edits {
        match edit {
            Edit::Delete { line } => {
                if let Some(flag) = state.deleted.get_mut(*line) {
                    *flag = true;
                }
            }
            Edit::Move { lines: range, slot } => {
                if range.contains(slot) {
                    log::warn!("スロット {} が移動範囲 {:?} の内側にあるため移動しません", slot, range);
                    continue;
                }
                for flag in moved.iter_mut().take(range.end).skip(range.start) {
                    *flag = true;
                }
                state.attachments.entry(*slot).or_default().push(range.clone());
            }
        }
    }

    for li in 0..lines.len() {
        if !moved[li] {
            state.emit_slot(li);
        }
    }
    state.out
}

struct EmitState<'a, S> {
    lines: &'a [S],
    deleted: Vec<bool>,
    emitted: Vec<bool>,
    attachments: HashMap<usize, Vec<Range<usize>>>,
    out: Vec<String>,
}

impl<S: AsRef<str>> EmitState<'_, S> {
    fn emit_slot(&mut self, li: usize) {
        if li >= self.lines.len() || self.emitted[li] {
            return;
        }
        self.emitted[li] = true;
        if !self.deleted[li] {
            self.out.push(self.lines[li].as_ref().to_string());
        }
        if let Some(blocks) = self.attachments.remove(&li) {
            for block in blocks {
                for inner in block {
                    self.emit_slot(inner);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(src: &str) -> Vec<&str> {
        src.split('\n').collect()
    }

    #[test]
    fn test_plan_records_deletes_and_move() {
        let src = "struct A {\n\tfloat x;\n};\n<<<<EndClass: A>>>>\n<<<<Method: A>>>>\nvoid Go() {\n}\n<<<<EndMethod>>>>";
        let plan = Reorganizer::default().plan(&split(src)).unwrap();

        assert_eq!(
            plan.edits,
            vec![
                Edit::Delete { line: 3 },
                Edit::Delete { line: 4 },
                Edit::Delete { line: 7 },
                Edit::Move { lines: 5..7, slot: 3 },
            ]
        );
        assert_eq!(plan.classes.len(), 1);
        assert_eq!(plan.classes[0].name, "A");
        assert_eq!(plan.classes[0].start, 0);
        assert_eq!(plan.classes[0].end(), Some(2));
        assert!(plan.diagnostics.is_empty());
    }

    #[test]
    fn test_class_name_stops_at_paren_or_brace() {
        let lines = ["struct Neuron {", "<<<<EndClass: Neuron>>>>", "struct Pair(int a) {", "<<<<EndClass: Pair>>>>"];
        let plan = Reorganizer::default().plan(&lines).unwrap();
        let names: Vec<_> = plan.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Neuron", "Pair"]);
        assert!(plan.classes.iter().all(ClassRecord::is_closed));
    }

    #[test]
    fn test_apply_edits_keeps_untouched_lines() {
        let lines = ["a", "b", "c"];
        assert_eq!(apply_edits(&lines, &[]), vec!["a", "b", "c"]);
        assert_eq!(apply_edits(&lines, &[Edit::Delete { line: 1 }]), vec!["a", "c"]);
    }

    #[test]
    fn test_apply_edits_orders_blocks_on_same_slot() {
        let lines = ["head", "slot", "m1", "m2", "tail"];
        let edits = [
            Edit::Delete { line: 1 },
            Edit::Move { lines: 2..3, slot: 1 },
            Edit::Move { lines: 3..4, slot: 1 },
        ];
        assert_eq!(apply_edits(&lines, &edits), vec!["head", "m1", "m2", "tail"]);
    }

    #[test]
    fn test_apply_edits_ignores_self_enclosing_move() {
        let lines = ["a", "b", "c"];
        let edits = [Edit::Move { lines: 0..2, slot: 1 }];
        assert_eq!(apply_edits(&lines, &edits), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_comment_run_detection() {
        let mut run = CommentRun::default();
        run.track(0, true);
        run.track(1, true);
        run.track(2, false);
        assert_eq!(run.ending_before(2), Some(0));
        assert_eq!(run.ending_before(3), None);
        run.track(3, true);
        assert_eq!(run.ending_before(4), Some(3));
    }
}
