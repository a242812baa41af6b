use clap::Parser;
use x402_discovery::utils::logger::{self, LogFormat};
use x402_discovery::utils::validation::Validate;
use x402_discovery::{
    CliArgs, Command, DiscoverRequest, DiscoveryService, DiscoveryTools, HttpBackend,
    RegisterRequest,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    logger::init_logger(LogFormat::from_flag(args.json_logs), args.verbose);

    let config = match args.resolve_config().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };
    tracing::debug!("Resolved config: {:?}", config);

    let backend = HttpBackend::new(config.clone())?;
    let tools = DiscoveryTools::new(DiscoveryService::new(backend, config));

    let output = match args.command {
        Command::Discover {
            query,
            capability,
            max_price,
            min_quality,
        } => {
            tools
                .discover(DiscoverRequest {
                    query,
                    capability,
                    max_price_usd: max_price,
                    min_quality: min_quality.to_string(),
                })
                .await
        }
        Command::Browse { category } => tools.browse(category.as_deref()).await,
        Command::Health { service_id } => tools.health(&service_id).await,
        Command::Register {
            name,
            endpoint_url,
            description,
            price,
            capability_tags,
            category,
            wallet_address,
            network,
            auth_required,
            not_agent_callable,
        } => {
            tools
                .register(RegisterRequest {
                    name,
                    endpoint_url,
                    description,
                    price_per_call: price,
                    capability_tags,
                    category,
                    wallet_address,
                    network,
                    auth_required: Some(auth_required),
                    agent_callable: Some(!not_agent_callable),
                })
                .await
        }
        Command::Attest { service_id, raw } => tools.attest(&service_id, raw).await,
    };

    println!("{}", output);
    Ok(())
}
