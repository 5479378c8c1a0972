//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 spotlight-runtime 覆盖率
//! - `pool-check`: 检查数据文件（车辆记录、车辆池、动画配置）

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use serde_json::Value;
use spotlight_runtime::{ImageSource, ShowcaseConfig, ShowcasePool, catalog};
use walkdir::WalkDir;

/// 由车辆记录生成车辆池时的聚光数量
const FEATURED_COUNT: usize = 5;

fn run(step: &str, cmd: &mut Command) -> anyhow::Result<()> {
    eprintln!("\n==> {step}");
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{step} failed with {status}");
    }
    Ok(())
}

fn ensure_cargo_llvm_cov_available() -> anyhow::Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["llvm-cov", "--version"]);
    let status = cmd.status();
    match status {
        Ok(s) if s.success() => Ok(()),
        _ => anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        ),
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => {
            let mut fmt = Command::new("cargo");
            fmt.args(["fmt", "--all", "--", "--check"]);
            run("cargo fmt --all -- --check", &mut fmt)?;

            let mut clippy = Command::new("cargo");
            clippy.args(["clippy", "--workspace", "--all-targets"]);
            run("cargo clippy --workspace --all-targets", &mut clippy)?;

            let mut test = Command::new("cargo");
            test.args(["test", "--workspace"]);
            run("cargo test --workspace", &mut test)?;
        }
        "cov-runtime" => {
            ensure_cargo_llvm_cov_available()?;

            let mut cov = Command::new("cargo");
            cov.args(["llvm-cov", "-p", "spotlight-runtime", "--html"]);
            run("cargo llvm-cov -p spotlight-runtime --html", &mut cov)?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "pool-check" => {
            let path = args.next();
            pool_check(path.as_deref())?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  cov-runtime     运行 spotlight-runtime 覆盖率报告
  pool-check      检查数据文件

POOL-CHECK:
  cargo xtask pool-check [path]

  不带参数：检查 data/ 下所有 .json 文件
  带路径参数：检查指定文件或目录

  按内容识别文件类型：
    - 数组：车辆记录，检查能否生成车辆池、图片地址是否可用
    - 含 featured 数组的对象：车辆池
    - 其他对象：动画配置

ALIASES (in .cargo/config.toml):
  cargo check-all     -> cargo xtask check-all
  cargo cov-runtime   -> cargo xtask cov-runtime
  cargo pool-check    -> cargo xtask pool-check
"#
    );
}

//=============================================================================
// pool-check 命令实现
//=============================================================================

/// 默认数据目录（相对于 workspace root）
const DATA_DIR: &str = "data";

/// 检查结果
#[derive(Default)]
struct PoolCheckResult {
    files_checked: usize,
    errors: Vec<String>,
    warnings: Vec<String>,
}

/// 执行数据文件检查
fn pool_check(path: Option<&str>) -> anyhow::Result<()> {
    let root = PathBuf::from(path.unwrap_or(DATA_DIR));
    if !root.exists() {
        anyhow::bail!(
            "路径不存在: {}\n请在 workspace 根目录运行，或指定数据路径",
            root.display()
        );
    }

    let files = collect_json_files(&root)?;
    if files.is_empty() {
        eprintln!("未找到数据文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个数据文件...\n", files.len());

    let mut result = PoolCheckResult::default();
    for file in &files {
        check_file(file, &mut result);
    }

    print_check_result(&result);

    if !result.errors.is_empty() {
        anyhow::bail!("数据检查发现错误");
    }
    Ok(())
}

/// 收集 `.json` 文件
fn collect_json_files(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// 检查单个文件
fn check_file(file: &Path, result: &mut PoolCheckResult) {
    let id = file.display().to_string();
    result.files_checked += 1;

    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            result.errors.push(format!("{id}: 无法读取文件 - {e}"));
            return;
        }
    };
    let value: Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            result.errors.push(format!("{id}: JSON 格式错误 - {e}"));
            return;
        }
    };

    if value.is_array() {
        check_records(&id, &content, result);
    } else if value.get("featured").is_some_and(Value::is_array) {
        match ShowcasePool::from_json(&content) {
            Ok(pool) => check_images(&id, &pool, result),
            Err(e) => result.errors.push(format!("{id}: {e}")),
        }
    } else if let Err(e) = ShowcaseConfig::from_json(&content) {
        result.errors.push(format!("{id}: {e}"));
    }
}

fn check_records(id: &str, content: &str, result: &mut PoolCheckResult) {
    let records = match catalog::parse_records(content) {
        Ok(r) => r,
        Err(e) => {
            result.errors.push(format!("{id}: {e}"));
            return;
        }
    };

    for record in &records {
        if !(0.0..=5.0).contains(&record.rating) {
            result.warnings.push(format!(
                "{id}: 车辆 {} 的评分 {} 超出 0 - 5，将被截断",
                record.id, record.rating
            ));
        }
        if record.price_per_day <= 0.0 {
            result
                .warnings
                .push(format!("{id}: 车辆 {} 的日租价格无效", record.id));
        }
    }

    match ShowcasePool::from_records(&records, FEATURED_COUNT) {
        Ok(pool) => check_images(id, &pool, result),
        Err(e) => result.errors.push(format!("{id}: {e}")),
    }
}

fn check_images(id: &str, pool: &ShowcasePool, result: &mut PoolCheckResult) {
    for item in pool.featured().iter().chain(pool.background()) {
        if item.image() == ImageSource::Placeholder {
            result.warnings.push(format!(
                "{id}: {} 的图片地址不可用，将显示占位图",
                item.display_name
            ));
        }
    }
}

/// 输出检查结果
fn print_check_result(result: &PoolCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个文件", result.files_checked);
    eprintln!();

    for error in &result.errors {
        eprintln!("[ERROR] {error}");
    }
    for warning in &result.warnings {
        eprintln!("[WARN] {warning}");
    }

    let error_count = result.errors.len();
    let warn_count = result.warnings.len();

    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
