//! # Spotlight CLI
//!
//! 无窗口的聚光动画宿主：按固定帧率驱动展示组件，把事件和快照输出为 JSON Lines。
//!
//! ## 用法
//!
//! ```bash
//! # 使用内置车辆池模拟 30 秒
//! cargo run -p spotlight-cli -- simulate
//!
//! # 固定种子、指定视口，并在第 3 秒缩小到 400x600
//! cargo run -p spotlight-cli -- simulate --seed 7 --width 800 --height 600 --resize-at 3:400x600
//!
//! # 输出每一帧的快照
//! cargo run -p spotlight-cli -- simulate --seconds 5 --frames
//!
//! # 筛选车辆记录并查看生成的车辆池
//! cargo run -p spotlight-cli -- pool --records data/vehicles.json --type van --sort desc
//!
//! # 校验发布车辆的表单草稿，或只校验其中一步
//! cargo run -p spotlight-cli -- listing --draft draft.json --step pricing
//! ```

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use spotlight_runtime::{
    HeroShowcase, ListingError, ListingStep, PriceSort, ShowcaseConfig, ShowcaseEvent,
    ShowcaseFrame, ShowcasePool, VehicleDraft, VehicleFilter, VehicleRecord, ViewportGeometry,
    catalog,
};
use tracing::{info, level_filters::LevelFilter};

#[derive(Parser)]
#[command(name = "spotlight")]
#[command(about = "VanBNB 首页车辆聚光动画模拟器")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 输出更多日志（-v 调试，-vv 跟踪）
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行一段模拟，逐行输出事件
    Simulate(SimulateArgs),

    /// 筛选车辆记录并生成车辆池
    Pool(PoolArgs),

    /// 校验发布车辆的表单草稿
    Listing(ListingArgs),
}

#[derive(Args)]
struct SimulateArgs {
    /// 动画配置文件（JSON）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 车辆池或车辆记录文件（JSON），默认使用内置车辆池
    #[arg(short, long)]
    pool: Option<PathBuf>,

    /// 模拟时长（秒）
    #[arg(long, default_value_t = 30.0)]
    seconds: f32,

    /// 帧率
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=1000))]
    fps: u32,

    /// 随机种子，不指定时随机生成
    #[arg(long)]
    seed: Option<u64>,

    /// 初始视口宽度
    #[arg(long, default_value_t = 1280.0)]
    width: f32,

    /// 初始视口高度
    #[arg(long, default_value_t = 720.0)]
    height: f32,

    /// 在指定时刻改变视口尺寸，格式 `秒:宽x高`，可重复
    #[arg(long = "resize-at", value_parser = parse_resize)]
    resize_at: Vec<ResizeAt>,

    /// 在指定时刻卸载组件
    #[arg(long)]
    unmount_at: Option<f32>,

    /// 同时输出每一帧的快照
    #[arg(long)]
    frames: bool,
}

#[derive(Args)]
struct PoolArgs {
    /// 车辆记录文件（JSON 数组）
    #[arg(short, long)]
    records: PathBuf,

    /// 车型（`all` 表示不限）
    #[arg(long = "type")]
    vehicle_type: Option<String>,

    /// 地点关键字
    #[arg(long)]
    location: Option<String>,

    /// 最少载客数
    #[arg(long)]
    min_capacity: Option<u32>,

    /// 价格排序（asc / desc）
    #[arg(long, default_value = "asc")]
    sort: PriceSort,

    /// 只保留可预订的车辆
    #[arg(long)]
    available_only: bool,

    /// 聚光车辆数量
    #[arg(long, default_value_t = 5)]
    featured: usize,
}

#[derive(Args)]
struct ListingArgs {
    /// 表单草稿文件（JSON）
    #[arg(short, long)]
    draft: PathBuf,

    /// 只校验指定步骤
    #[arg(long)]
    step: Option<ListingStep>,
}

/// 定时尺寸变化
#[derive(Debug, Clone, Copy)]
struct ResizeAt {
    at: f32,
    geometry: ViewportGeometry,
}

fn parse_resize(s: &str) -> Result<ResizeAt, String> {
    let (at, size) = s
        .split_once(':')
        .ok_or_else(|| format!("格式应为 秒:宽x高，实际为 {s}"))?;
    let (width, height) = size
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("尺寸格式应为 宽x高，实际为 {size}"))?;

    let at = parse_number(at, "时刻")?;
    let width = parse_number(width, "宽度")?;
    let height = parse_number(height, "高度")?;
    if !at.is_finite() || at < 0.0 {
        return Err(format!("时刻不能为负: {at}"));
    }
    Ok(ResizeAt {
        at,
        geometry: ViewportGeometry::new(width, height),
    })
}

fn parse_number(value: &str, name: &str) -> Result<f32, String> {
    value.trim().parse().map_err(|e| format!("{name}无效: {e}"))
}

#[derive(Serialize)]
struct EventLine<'a> {
    time: f64,
    event: &'a ShowcaseEvent,
}

#[derive(Serialize)]
struct FrameLine<'a> {
    time: f64,
    frame: &'a ShowcaseFrame,
}

#[derive(Serialize)]
struct PoolReport<'a> {
    matched: Vec<&'a VehicleRecord>,
    pool: ShowcasePool,
}

#[derive(Serialize)]
struct ListingReport {
    valid: bool,
    step: Option<ListingStep>,
    error: Option<String>,
    weekly_price: Option<f32>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Simulate(args) => simulate(args),
        Commands::Pool(args) => pool(args),
        Commands::Listing(args) => listing(args),
    }
}

/// 日志输出到 stderr，stdout 只留给 JSON
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn simulate(args: SimulateArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ShowcaseConfig::default(),
    };
    let pool = match &args.pool {
        Some(path) => load_pool(path)?,
        None => ShowcasePool::builtin(),
    };
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(
        seed,
        min_cycle = config.min_cycle_duration(),
        max_cycle = config.max_cycle_duration(),
        "开始模拟"
    );

    let mut hero = HeroShowcase::with_seed(pool, config, seed).context("无法创建展示组件")?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let mut resizes = args.resize_at.clone();
    resizes.sort_by(|a, b| a.at.total_cmp(&b.at));
    let mut resizes = resizes.into_iter().peekable();

    let dt = 1.0 / args.fps as f32;
    let total_frames = (args.seconds.max(0.0) * args.fps as f32).ceil() as u64;

    let events = hero.mount(ViewportGeometry::new(args.width, args.height));
    write_events(&mut out, 0.0, &events)?;

    for frame in 0..total_frames {
        let time = frame as f64 * f64::from(dt);

        while let Some(resize) = resizes.next_if(|r| f64::from(r.at) <= time) {
            info!(
                width = resize.geometry.width,
                height = resize.geometry.height,
                "请求改变视口尺寸"
            );
            hero.request_resize(resize.geometry);
        }
        if args.unmount_at.is_some_and(|at| f64::from(at) <= time) {
            hero.unmount();
            info!(time, "组件已卸载");
            break;
        }

        let events = hero.tick(dt);
        let now = time + f64::from(dt);
        write_events(&mut out, now, &events)?;
        if args.frames {
            if let Some(snapshot) = hero.frame() {
                let line = FrameLine {
                    time: now,
                    frame: &snapshot,
                };
                serde_json::to_writer(&mut out, &line)?;
                writeln!(out)?;
            }
        }
    }
    out.flush()?;

    info!(
        completed = hero.completed_cycles(),
        featured_index = hero.featured_index(),
        "模拟结束"
    );
    Ok(())
}

fn write_events(out: &mut impl Write, time: f64, events: &[ShowcaseEvent]) -> Result<()> {
    for event in events {
        serde_json::to_writer(&mut *out, &EventLine { time, event })?;
        writeln!(out)?;
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<ShowcaseConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
    ShowcaseConfig::from_json(&content)
        .with_context(|| format!("无法解析配置文件: {}", path.display()))
}

/// 按内容识别车辆池或车辆记录
fn load_pool(path: &Path) -> Result<ShowcasePool> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("无法读取车辆文件: {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("车辆文件不是有效的 JSON: {}", path.display()))?;

    let pool = if value.is_array() {
        let records = catalog::parse_records(&content)?;
        ShowcasePool::from_records(&records, 5)?
    } else {
        ShowcasePool::from_json(&content)?
    };
    info!(
        featured = pool.featured().len(),
        background = pool.background().len(),
        "已加载车辆池"
    );
    Ok(pool)
}

fn pool(args: PoolArgs) -> Result<()> {
    let records = catalog::load_records(&args.records)
        .with_context(|| format!("无法加载车辆记录: {}", args.records.display()))?;

    let filter = VehicleFilter {
        vehicle_type: args.vehicle_type,
        location: args.location,
        min_capacity: args.min_capacity,
        price_sort: args.sort,
        available_only: args.available_only,
        ..Default::default()
    };
    let matched = filter.apply(&records);
    info!(total = records.len(), matched = matched.len(), "筛选完成");

    let owned: Vec<VehicleRecord> = matched.iter().map(|r| (*r).clone()).collect();
    let pool = ShowcasePool::from_records(&owned, args.featured)
        .context("筛选结果无法生成车辆池")?;

    let report = PoolReport { matched, pool };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// 输出校验报告，未通过时以错误退出
fn listing(args: ListingArgs) -> Result<()> {
    let content = fs::read_to_string(&args.draft)
        .with_context(|| format!("无法读取草稿文件: {}", args.draft.display()))?;
    let draft = VehicleDraft::from_json(&content)
        .with_context(|| format!("无法解析草稿文件: {}", args.draft.display()))?;

    let result = match args.step {
        Some(step) => draft.validate_step(step),
        None => draft.validate(),
    };
    let report = ListingReport {
        valid: result.is_ok(),
        step: result.as_ref().err().map(ListingError::step),
        error: result.as_ref().err().map(ToString::to_string),
        weekly_price: draft.weekly_price(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Err(err) = result {
        anyhow::bail!("草稿未通过校验: {err}");
    }
    info!(step = ?args.step, "草稿校验通过");
    Ok(())
}
