use clap::Parser;
use sheetstat::app::render;
use sheetstat::utils::error::ErrorSeverity;
use sheetstat::utils::logger;
use sheetstat::{AnalysisEngine, AnalysisRequest, CliConfig, LocalStorage};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting sheetstat CLI");
    tracing::debug!("CLI args: {:?}", cli);

    // 載入並驗證配置
    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let monitor_enabled = config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let source = LocalStorage::new(".".to_string());
    let sink = LocalStorage::new(config.output_path().to_string());
    let mut engine = AnalysisEngine::new_with_monitoring(source, sink, &config, monitor_enabled);

    let request = AnalysisRequest {
        input: cli.input.clone(),
        analysis: cli.analysis,
        export: cli.export,
    };

    match engine.run(&request).await {
        Ok(outcome) => {
            print!("{}", render::render_profile(&outcome.file_name, &outcome.profile));
            println!();
            print!("{}", render::render_preview(&outcome.preview));

            if let Some(report) = &outcome.report {
                println!();
                print!("{}", render::render_report(report));
            }

            if let Some(exported) = &outcome.exported {
                let path = Path::new(config.output_path()).join(&exported.filename);
                tracing::info!(path = %path.display(), bytes = exported.bytes, "Export written");
                println!();
                println!("📁 Export saved to: {}", path.display());
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Analysis failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }

    Ok(())
}
