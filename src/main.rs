use anyhow::Context;
use clap::Parser;
use matchbox_api_utils::utils::{logger, validation::Validate};
use matchbox_api_utils::{CliArgs, Config, Connector, Outcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }
    tracing::debug!("CLI args: {:?}", args);

    // 驗證參數
    if let Err(e) = args.validate() {
        tracing::error!("❌ Argument validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let config = Config::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;
    tracing::debug!("Loaded config: {:?}", config);

    let connector = Connector::new(args.connector_options());

    match connector.acquire(&config).await {
        Ok(Outcome::Loaded(matchbox)) => {
            if args.print {
                println!("{}", matchbox);
            }
            if let Some(path) = matchbox.raw_dump() {
                tracing::info!("📁 Raw dump saved to: {}", path.display());
            }
            if !args.quiet {
                tracing::info!(
                    "✅ Acquired {} records via {}",
                    matchbox.api_data().len(),
                    matchbox.method()
                );
            }
        }
        Ok(Outcome::Aborted(reason)) => {
            eprintln!("❌ {}", reason);
            std::process::exit(2);
        }
        Ok(Outcome::Fatal(reason)) => {
            eprintln!("❌ ERROR: {}", reason);
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!(
                "❌ Acquisition failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(3);
        }
    }

    Ok(())
}
