use std::path::{Path, PathBuf};

use caixa_core::{ClassificationRules, ReportRange};
use caixa_extract::{ExtractionResolver, ExtractorConfig};

mod commands;
mod refresh;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let Some(command) = args.next() else {
        print_usage();
        return Ok(());
    };

    let data_dir = data_dir()?;
    std::fs::create_dir_all(&data_dir)?;

    let db = caixa_storage::create_db(&data_dir.join("ledger.db")).await?;
    caixa_storage::seed_default_categories(&db).await?;

    let resolver = ExtractionResolver::from_config(&ExtractorConfig::from_env());
    let rules = ClassificationRules::default();

    match command.as_str() {
        "import" => {
            let path = args
                .next()
                .ok_or_else(|| anyhow::anyhow!("usage: caixa import <statement.ofx>"))?;
            if resolver.provider_count() == 0 {
                tracing::info!("no inference provider configured; candidates keep their bank memos");
            }
            let report = commands::import_statement(&db, &resolver, Path::new(&path)).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "classify" => {
            let text = args.collect::<Vec<_>>().join(" ");
            match commands::classify_message(&db, &resolver, &text).await? {
                Some(report) => println!("{}", serde_json::to_string_pretty(&report)?),
                None => println!("no classification available"),
            }
        }
        "projection" => {
            let horizon = args.next().and_then(|s| s.parse().ok()).unwrap_or(30);
            let guard = refresh::RefreshGuard::default();
            if let Some(report) =
                commands::project_cash_flow(&db, &rules, &guard, horizon).await?
            {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        "totals" => {
            let range = args
                .next()
                .and_then(|s| s.parse().ok())
                .unwrap_or(ReportRange::Monthly);
            let report = commands::totals(&db, &rules, range).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        other => {
            eprintln!("unknown command: {other}");
            print_usage();
        }
    }

    Ok(())
}

fn data_dir() -> anyhow::Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("br", "caixa", "Caixa")
        .ok_or_else(|| anyhow::anyhow!("could not determine a data directory"))?;
    Ok(dirs.data_dir().to_path_buf())
}

fn print_usage() {
    eprintln!(
        "usage:\n  \
         caixa import <statement.ofx>      parse, classify and commit a bank export\n  \
         caixa classify <free text>        extract a record from a message\n  \
         caixa projection [days]           daily balance projection (default 30)\n  \
         caixa totals [monthly|quarterly|annual]"
    );
}
