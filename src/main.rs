use clap::Parser;
use market_discovery::utils::error::{DiscoveryError, ErrorSeverity};
use market_discovery::utils::logger;
use market_discovery::{
    render, CliConfig, InMemoryStore, MarketStore, OutputFormat, ResolvedConfig, RestStore,
    SearchEngine, StoreSettings,
};

async fn run_search<S: MarketStore>(
    store: S,
    cli: &CliConfig,
    resolved: &ResolvedConfig,
) -> Result<String, DiscoveryError> {
    let engine = SearchEngine::from_config(store, resolved);
    let result = engine
        .search(cli.q.as_deref(), cli.city.as_deref(), cli.plz.as_deref())
        .await?;
    render(&result, cli.format)
}

async fn execute(cli: &CliConfig, resolved: &ResolvedConfig) -> Result<String, DiscoveryError> {
    match &resolved.store {
        StoreSettings::Memory { fixtures } => {
            tracing::debug!("Using in-memory store from {}", fixtures);
            let store = InMemoryStore::from_file(fixtures).await?;
            run_search(store, cli, resolved).await
        }
        StoreSettings::Rest { endpoint, api_key } => {
            tracing::debug!("Using REST store at {}", endpoint);
            let store = RestStore::new(endpoint, api_key.clone())?;
            run_search(store, cli, resolved).await
        }
    }
}

fn exit_code(error: &DiscoveryError) -> i32 {
    match error.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(error: DiscoveryError) -> ! {
    tracing::error!(
        "❌ Search failed: {} (Category: {:?}, Severity: {:?})",
        error,
        error.category(),
        error.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", error.recovery_suggestion());

    eprintln!("❌ {}", error.user_friendly_message());
    eprintln!("💡 {}", error.recovery_suggestion());
    std::process::exit(exit_code(&error).max(1));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 設定檔錯誤發生在 logger 初始化之前，直接輸出
    let resolved = match cli.load_file().and_then(|file| cli.resolve(file.as_ref())) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(exit_code(&e).max(1));
        }
    };

    if resolved.log_json {
        logger::init_json_logger(resolved.verbose);
    } else {
        logger::init_cli_logger(resolved.verbose);
    }

    tracing::info!("Starting market-search");
    tracing::debug!("Resolved config: {:?}", resolved);

    match execute(&cli, &resolved).await {
        Ok(output) => {
            print!("{}", output);
            if cli.format != OutputFormat::Table && !output.ends_with('\n') {
                println!();
            }
        }
        Err(e) => fail(e),
    }

    Ok(())
}
