use anyhow::{Context, Result};
use clap::Parser;
use iso19139_gbl::{
    collect_metadata_files, CompanionIndex, Converter, Mapper, MapperConfig, OgrReader,
};
use rayon::ThreadPoolBuilder;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ISO 19139メタデータ（<name>.shp.xml / <name>.tif.xml）のディレクトリ
    #[arg(value_name = "METADATA_DIR")]
    metadata_dir: PathBuf,

    /// 元のシェープファイル・ラスタが置かれたディレクトリ
    #[arg(short, long, value_name = "DIR")]
    data_dir: PathBuf,

    /// JSON出力ディレクトリ
    #[arg(short, long, value_name = "DIR")]
    output: PathBuf,

    /// データディレクトリの走査から除外するサブディレクトリ名
    #[arg(long, value_name = "NAME", default_value = "ARIA")]
    exclude: Vec<String>,

    /// 並列処理スレッド数（デフォルト: CPUコア数）
    #[arg(short, long)]
    threads: Option<usize>,
}

fn main() -> Result<()> {
    // ログの初期化
    tracing_subscriber::fmt::init();

    // CLI引数の解析
    let args = Args::parse();

    // 処理開始時間を記録
    let start_time = std::time::Instant::now();

    // スレッドプールの設定
    if let Some(threads) = args.threads {
        ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to build thread pool")?;
    }

    if !args.metadata_dir.is_dir() {
        error!("Invalid metadata directory: {:?}", args.metadata_dir);
        anyhow::bail!("Metadata path must be a directory");
    }

    // 出力ディレクトリの作成
    fs::create_dir_all(&args.output)?;

    // データファイルの索引を作成
    info!("Indexing data files under {:?}", args.data_dir);
    let companions = CompanionIndex::scan(&args.data_dir, &args.exclude)
        .with_context(|| format!("Failed to scan data directory {:?}", args.data_dir))?;
    info!("Found {} data files (SHP/TIF)", companions.len());

    let mapper = Mapper::new(MapperConfig::default())?;
    let converter = Converter::new(mapper, companions, OgrReader::new(), &args.output);

    let inputs = collect_metadata_files(&args.metadata_dir)?;
    info!("Found {} metadata files", inputs.len());

    let report = converter.convert_all(&inputs);
    report.log_summary();

    // 処理時間を表示
    let elapsed = start_time.elapsed();
    info!("Total processing time: {:?}", elapsed);

    if !report.is_success() {
        anyhow::bail!("{} files failed to process", report.failures.len());
    }

    Ok(())
}
