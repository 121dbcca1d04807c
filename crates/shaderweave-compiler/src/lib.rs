// shaderweave Compiler Library
// Go から HLSL への変換の後処理ライブラリ

//! # shaderweave Compiler
//!
//! Go のソースをトークン単位で HLSL 表記に変換した中間テキストを、
//! 最終的なシェーダーソースに仕上げるライブラリです。
//!
//! - [`driver`]: 変換対象となるソースファイルの集合を決定します。
//! - [`backend`]: マーカーに従ってメソッドを構造体の中へ移動し、
//!   Go 固有のリテラルを HLSL の表記に置き換えます。
//!
//! ```
//! use shaderweave_compiler::backend::post_process;
//!
//! let src = "struct A {\n\tfloat32 x;\n<<<<EndClass: A>>>>\n};\n<<<<Method: A>>>>\nfloat32 Get() { return x; }\n<<<<EndMethod>>>>";
//! let out = post_process(src).unwrap();
//! assert_eq!(out, "struct A {\n\tfloat x;\nfloat Get() { return x; }\n};");
//! ```

pub mod backend;
pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod error;

// 再エクスポート
pub use self::backend::{PostProcessed, PostProcessor};
pub use self::config::CompilerConfig;
pub use self::diagnostics::{Diagnostic, DiagnosticEmitter, DiagnosticLevel};
pub use self::driver::{FileSet, FileSetResolver};
pub use self::error::{CompilerError, Result};

/// コンパイラのバージョン
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
