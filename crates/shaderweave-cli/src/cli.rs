/*
 * shaderweave CLI - コマンドライン引数処理モジュール
 *
 * このモジュールでは、コマンドライン引数を処理し、
 * ファイル解決と後処理のライブラリ呼び出しに変換します。
 */

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use log::{debug, info, warn};
use shaderweave_compiler::config::DEFAULT_CONFIG_FILE;
use shaderweave_compiler::{driver, CompilerConfig, DiagnosticLevel, PostProcessor, VERSION};

/// Go から HLSL への変換の後処理ツール
#[derive(Parser)]
#[command(name = "shaderweave")]
#[command(version = VERSION)]
#[command(about = "Go から HLSL への変換の後処理ツール", long_about = None)]
pub struct Cli {
    /// 詳細なログ出力を有効にする
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    /// 不要な出力を抑制する
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// 設定ファイルへのパス (省略時はカレントディレクトリの shaderweave.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// サブコマンド
    #[command(subcommand)]
    pub command: Commands,
}

/// サブコマンド
#[derive(Subcommand)]
pub enum Commands {
    /// 変換対象のソースファイルを解決して一覧表示
    Files(FilesArgs),

    /// マーカー付き中間テキストを後処理
    Process(ProcessArgs),
}

/// ファイル解決サブコマンドの引数
#[derive(Args)]
pub struct FilesArgs {
    /// ファイル、ディレクトリ、またはパッケージ指定子
    #[arg(required = true)]
    pub specs: Vec<String>,

    /// JSON 形式で出力
    #[arg(long, default_value = "false")]
    pub json: bool,
}

/// 後処理サブコマンドの引数
#[derive(Args)]
pub struct ProcessArgs {
    /// 入力ファイル (`-` は標準入力)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// 出力ディレクトリ (省略時は標準出力)
    #[arg(short, long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// 出力ファイルの拡張子
    #[arg(long, default_value = "hlsl")]
    pub extension: String,

    /// 置換パスを実行しない
    #[arg(long, default_value = "false")]
    pub no_rewrite: bool,

    /// 警告をエラーとして扱う
    #[arg(long, default_value = "false")]
    pub deny_warnings: bool,
}

/// CLIから処理を実行
pub fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Files(args) => list_files(args, &config),
        Commands::Process(args) => process(args, &config),
    }
}

/// ログ設定を初期化
pub fn setup_logging(verbose: bool, quiet: bool) {
    let env = env_logger::Env::default().filter_or(
        "SHADERWEAVE_LOG",
        if verbose {
            "debug"
        } else if quiet {
            "error"
        } else {
            "info"
        },
    );

    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(verbose)
        .init();
}

/// 設定ファイルを読み込む
///
/// 明示的に指定されたファイルが存在しない場合はエラーになります。
fn load_config(path: Option<&Path>) -> Result<CompilerConfig> {
    match path {
        Some(path) => {
            if !path.exists() {
                bail!("設定ファイルが見つかりません: {}", path.display());
            }
            CompilerConfig::load(path)
                .with_context(|| format!("設定ファイル {} の読み込みに失敗しました", path.display()))
        }
        None => CompilerConfig::load(DEFAULT_CONFIG_FILE).context("設定ファイルの読み込みに失敗しました"),
    }
}

/// ファイル解決コマンドの処理
fn list_files(args: &FilesArgs, config: &CompilerConfig) -> Result<()> {
    let file_set = driver::resolve_files(&config.resolver, &args.specs);

    if args.json {
        let json = serde_json::to_string_pretty(&file_set).context("JSONへの変換に失敗しました")?;
        println!("{}", json);
        return Ok(());
    }

    for file in &file_set.files {
        println!("{}", file.display());
    }

    if file_set.files.is_empty() {
        warn!("⚠️ 解決できたソースファイルがありません");
    }
    if !file_set.packages.is_empty() {
        let names: Vec<&str> = file_set.packages.iter().map(String::as_str).collect();
        info!("📦 パッケージ: {}", names.join(", ").cyan());
    }
    Ok(())
}

/// 後処理コマンドの処理
fn process(args: &ProcessArgs, config: &CompilerConfig) -> Result<()> {
    let processor = PostProcessor::new(config).with_rewrite(!args.no_rewrite);
    debug!("置換ルール: {} 件", processor.table().rules().len());

    if let Some(dir) = &args.out_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("出力ディレクトリ {} を作成できません", dir.display()))?;
    }

    let mut warnings = 0;
    for input in &args.inputs {
        let source = read_input(input)?;
        let processed = processor
            .process(&source)
            .with_context(|| format!("{} の後処理に失敗しました", input.display()))?;

        warnings += processed
            .diagnostics
            .iter()
            .filter(|d| d.level >= DiagnosticLevel::Warning)
            .count();

        match &args.out_dir {
            Some(dir) => {
                let out_path = output_path(dir, input, &args.extension);
                fs::write(&out_path, &processed.text)
                    .with_context(|| format!("{} に書き込めません", out_path.display()))?;
                info!(
                    "✨ {} → {} (構造体 {} 個)",
                    input.display(),
                    out_path.display().to_string().green(),
                    processed.class_count
                );
            }
            // 標準出力への各出力は改行で終わる
            None if processed.text.ends_with('\n') => print!("{}", processed.text),
            None => println!("{}", processed.text),
        }
    }

    if args.deny_warnings && warnings > 0 {
        bail!("{} 件の警告があります", warnings);
    }
    Ok(())
}

/// 入力を読み込む
fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("標準入力を読み込めません")?;
        return Ok(source);
    }
    fs::read_to_string(input).with_context(|| format!("{} を読み込めません", input.display()))
}

/// 出力ファイルのパス
fn output_path(dir: &Path, input: &Path, extension: &str) -> PathBuf {
    let stem = if input == Path::new("-") {
        "stdin".into()
    } else {
        input
            .file_stem()
            .map(|stem| stem.to_os_string())
            .unwrap_or_else(|| "out".into())
    };
    dir.join(stem).with_extension(extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_uses_stem() {
        let dir = Path::new("shaders");
        assert_eq!(
            output_path(dir, Path::new("gen/neuron.go.txt"), "hlsl"),
            PathBuf::from("shaders/neuron.go.hlsl")
        );
        assert_eq!(output_path(dir, Path::new("-"), "hlsl"), PathBuf::from("shaders/stdin.hlsl"));
    }

    #[test]
    fn test_cli_parses_process_flags() {
        let cli = Cli::try_parse_from([
            "shaderweave",
            "-v",
            "process",
            "a.txt",
            "b.txt",
            "-o",
            "out",
            "--no-rewrite",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Process(args) => {
                assert_eq!(args.inputs, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
                assert_eq!(args.out_dir, Some(PathBuf::from("out")));
                assert!(args.no_rewrite);
                assert!(!args.deny_warnings);
                assert_eq!(args.extension, "hlsl");
            }
            Commands::Files(_) => panic!("process サブコマンドになるべき"),
        }
    }
}
