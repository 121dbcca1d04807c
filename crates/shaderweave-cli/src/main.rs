/*
 * shaderweave CLI - メインエントリーポイント
 *
 * Go から HLSL への変換の後処理ツールのエントリーポイントです。
 * コマンドライン引数の解析と処理ロジックを呼び出します。
 */

use clap::Parser;
use log::{debug, error};
use std::process;
use std::time::Instant;

mod cli;

fn main() {
    // コマンドライン引数の解析
    let cli = cli::Cli::parse();

    // ロギングの初期化
    cli::setup_logging(cli.verbose, cli.quiet);

    let start_time = Instant::now();
    let result = cli::run(&cli);
    debug!("処理時間: {:.3}秒", start_time.elapsed().as_secs_f64());

    if let Err(e) = result {
        error!("{:#}", e);
        process::exit(1);
    }
}
