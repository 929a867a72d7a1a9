// ==========================================
// 会众管理系统 - 会员批量导入命令行入口
// ==========================================
// 子命令: import / history / template
// stdout 输出 JSON 结果，提示与日志输出到 stderr
// ==========================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use congregation_import::api::ImportApi;
use congregation_import::config::get_default_db_path;
use congregation_import::i18n::{self, t, t_with_args};
use congregation_import::logging::{self, LogFormat};
use std::path::PathBuf;
use tracing::info;

/// Command-line arguments for congregation-import
#[derive(Parser, Debug)]
#[command(name = "congregation-import")]
#[command(about = "Bulk import congregation members from CSV, spreadsheet or JSON files")]
#[command(version)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "CONGREGATION_IMPORT_DB_PATH")]
    db: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Message language (en, zh-CN)
    #[arg(long, global = true, default_value = "en", env = "CONGREGATION_IMPORT_LOCALE")]
    locale: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import members from a file and print the summary as JSON
    Import {
        /// Source file (.csv, .xlsx, .xls, .xlsm, .xlsb, .ods, .json)
        file: PathBuf,
    },

    /// Print recent import batches as JSON
    History {
        /// Number of batches to return
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the CSV header of recognized columns
    Template,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_with_format(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    });
    i18n::set_locale(&cli.locale);

    match cli.command {
        Command::Template => {
            eprintln!("# {}", t("template.header_comment"));
            print!("{}", ImportApi::template_csv()?);
        }
        Command::Import { file } => {
            if !file.exists() {
                anyhow::bail!(t_with_args(
                    "import.file_not_found",
                    &[("path", &file.display().to_string())]
                ));
            }

            let api = ImportApi::new(resolve_db_path(cli.db));
            info!(version = congregation_import::VERSION, db_path = %api.db_path(), "启动会员导入");

            let summary = api
                .import_members(&file.to_string_lossy())
                .await
                .with_context(|| t("common.failed"))?;

            eprintln!(
                "{}",
                t_with_args(
                    "import.summary",
                    &[
                        ("total", &summary.total.to_string()),
                        ("created", &summary.created.to_string()),
                        ("updated", &summary.updated.to_string()),
                        ("failed", &summary.failed.to_string()),
                    ],
                )
            );
            for failure in &summary.errors {
                eprintln!(
                    "  {}",
                    t_with_args(
                        "import.row_failed",
                        &[("row", &failure.row.to_string()), ("error", &failure.error)],
                    )
                );
            }

            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::History { limit } => {
            let api = ImportApi::new(resolve_db_path(cli.db));
            let batches = api
                .list_recent_batches(limit)
                .await
                .with_context(|| t("common.failed"))?;

            if batches.is_empty() {
                eprintln!("{}", t("history.empty"));
            }
            println!("{}", serde_json::to_string_pretty(&batches)?);
        }
    }

    Ok(())
}

fn resolve_db_path(explicit: Option<String>) -> String {
    let path = explicit
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(get_default_db_path);
    eprintln!("{}", t_with_args("import.database", &[("path", &path)]));
    path
}
