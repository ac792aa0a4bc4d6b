use anyhow::Context;
use clap::Parser;
use funding_scanner::core::collector::ConnectivityStatus;
use funding_scanner::core::report;
use funding_scanner::utils::{logger, validation::Validate};
use funding_scanner::{
    docs, CliArgs, Command, FundingRateCollector, LocalStorage, ScanEngine, ScanError, ScanOutcome,
    ScannerConfig, Scheduler,
};
use std::io::{BufRead, Write};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let config = args.load_config().unwrap_or_else(|e| exit_with(&e));

    // 初始化日誌
    if config.logging.json {
        logger::init_json_logger(&config.logging.level);
    } else {
        logger::init_cli_logger(
            &config.logging.level,
            args.verbose,
            config.logging.file.as_deref().map(Path::new),
        );
    }
    tracing::debug!("Effective config: {:?}", config);

    if let Some(Command::LintDocs {
        template,
        changelog,
    }) = &args.command
    {
        return lint_docs(template, changelog);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }

    println!("{}", report::banner());

    let command = match args.command.clone() {
        Some(command) => command,
        None => match prompt_menu().context("failed to read menu choice")? {
            Some(command) => command,
            None => {
                println!("❌ Invalid choice");
                return Ok(());
            }
        },
    };

    let collector = FundingRateCollector::from_config(&config).unwrap_or_else(|e| exit_with(&e));
    let engine = ScanEngine::new(collector, LocalStorage::new(config.data_dir()), &config);

    match command {
        Command::Scan => match engine.scan_once().await {
            Ok(ScanOutcome::NoData) => println!("\n❌ No data collected from any exchange"),
            Ok(_) => {}
            Err(e) => exit_with(&e),
        },
        Command::Continuous => run_continuous(&engine, &config).await,
        Command::Connectivity => check_connectivity(engine.collector()).await,
        Command::LintDocs { .. } => {}
    }

    Ok(())
}

fn prompt_menu() -> std::io::Result<Option<Command>> {
    println!("\n📋 OPTIONS:");
    println!("1. Single scan");
    println!("2. Continuous mode (every 30 minutes by default)");
    println!("3. Test connectivity");
    print!("\nChoose (1-3): ");
    std::io::stdout().flush()?;

    let mut choice = String::new();
    std::io::stdin().lock().read_line(&mut choice)?;

    Ok(match choice.trim() {
        "1" => Some(Command::Scan),
        "2" => Some(Command::Continuous),
        "3" => Some(Command::Connectivity),
        _ => None,
    })
}

async fn run_continuous(engine: &ScanEngine<LocalStorage>, config: &ScannerConfig) {
    let scheduler = Scheduler::from_config(config);

    println!(
        "⏰ Scanner scheduled: every {} minutes",
        config.scanner.scan_interval_minutes
    );
    println!("🛑 Ctrl+C to stop");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("❌ Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        println!("\n🛑 Scanner stopped by user");
    };

    scheduler.run(move || engine.scan_once(), shutdown).await;
}

async fn check_connectivity(collector: &FundingRateCollector) {
    println!("🔍 Testing exchange connectivity...");
    for (exchange, status) in collector.check_connectivity().await {
        match status {
            ConnectivityStatus::Ok(count) => println!("✅ {}: OK ({} rates)", exchange, count),
            ConnectivityStatus::NoData => println!("⚠️  {}: reachable but no data", exchange),
            ConnectivityStatus::Failed(e) => println!("❌ {}: {}", exchange, e),
        }
    }
}

fn lint_docs(template: &Path, changelog: &Path) -> anyhow::Result<()> {
    let issues = docs::lint_files(template, changelog).unwrap_or_else(|e| exit_with(&e));

    if issues.is_empty() {
        println!("✅ {} and {} look good", template.display(), changelog.display());
        return Ok(());
    }

    for issue in &issues {
        println!("❌ {}", issue);
    }
    anyhow::bail!("{} documentation issue(s) found", issues.len())
}

fn exit_with(e: &ScanError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code())
}
