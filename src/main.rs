use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use policy_brief::cli::{Args, Command};
use policy_brief::generator::workflow::{BriefRequest, launch};
use policy_brief::server;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("policy_brief={},tower_http=info", default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let command = args.command();
    let config = args.into_config()?;

    // 缺少凭据时直接退出
    if let Err(e) = config.validate() {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }

    match command {
        Command::Serve { check, .. } => server::run(&config, check).await,
        Command::Generate {
            topic,
            engine,
            document,
            output_dir,
        } => {
            let request = match document {
                Some(path) => {
                    let bytes = tokio::fs::read(&path)
                        .await
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    let file_name = path
                        .file_name()
                        .map(|name| name.to_string_lossy().to_string())
                        .unwrap_or_else(|| path.display().to_string());
                    BriefRequest::Document {
                        topic,
                        file_name,
                        bytes,
                    }
                }
                None => BriefRequest::Search { topic, engine },
            };

            let written = launch(&config, request, &output_dir).await?;
            for path in written {
                println!("💾 {}", path.display());
            }
            Ok(())
        }
    }
}
