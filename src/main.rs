use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{debug, info};

use cli::{Cli, Command, PlanArgs, RoutesSubCommand};
use motoplan::config::MotoPlanConfig;
use motoplan::planner::{InsightKind, PlanReport};
use motoplan::store::{FjallRouteStore, RouteStore, subscribe};
use motoplan::web::{self, AppState};
use motoplan::{GeoApiClient, RoutePlanner, telemetry};

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let config = MotoPlanConfig::load_from_path(args.config.clone())?;
    telemetry::init(&config.logging, args.verbose);
    debug!("Loaded configuration: {:?}", config.keys);

    match args.cmd {
        Command::Plan(plan_args) => plan(&config, plan_args).await,
        Command::Routes(routes) => match routes.cmd {
            RoutesSubCommand::List => list_routes(&config).await,
            RoutesSubCommand::Delete { id } => {
                let store = open_store(&config)?;
                store.delete(&id).await.map_err(user_error)?;
                println!("🗑️  Deleted saved route {id}");
                Ok(())
            }
            RoutesSubCommand::Replay { id, json } => replay(&config, &id, json).await,
            RoutesSubCommand::Watch => watch_routes(&config).await,
        },
        Command::Serve { port } => {
            let store: Arc<dyn RouteStore> = Arc::new(open_store(&config)?);
            let _changes = subscribe(store.as_ref(), |routes| {
                info!("Saved routes now hold {} trips", routes.len());
            });
            let planner = planner(&config)?;
            web::run(port.unwrap_or(config.server.port), AppState::new(planner, store)).await
        }
    }
}

fn planner(config: &MotoPlanConfig) -> Result<RoutePlanner<GeoApiClient>> {
    let client = GeoApiClient::new(&config.services).context("Failed to create HTTP client")?;
    Ok(RoutePlanner::new(client, config.keys.clone(), &config.sampling))
}

fn open_store(config: &MotoPlanConfig) -> Result<FjallRouteStore> {
    let store = FjallRouteStore::open(
        &config.store.location,
        &config.store.app_id,
        config.store.user_id.clone(),
    )?;
    let identity = store.identity();
    info!(
        "Using saved routes of {} user {}",
        if identity.anonymous { "anonymous" } else { "configured" },
        identity.uid
    );
    Ok(store)
}

fn user_error(err: motoplan::MotoPlanError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}

async fn plan(config: &MotoPlanConfig, args: PlanArgs) -> Result<()> {
    let mut planner = planner(config)?;
    let report = match planner.plan(&args.start, &args.end).await {
        Ok(report) => report,
        Err(failure) => {
            if failure.reveal_settings() {
                eprintln!(
                    "🔑 Set your keys in {} or via MOTOPLAN_KEYS__ROUTING / \
                     MOTOPLAN_KEYS__WEATHER / MOTOPLAN_KEYS__INSIGHT",
                    MotoPlanConfig::get_config_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "config.toml".to_string())
                );
            }
            bail!(failure.to_string());
        }
    };
    print_report(&report, args.json)?;

    if args.save {
        let store = open_store(config)?;
        let saved = planner
            .save_current(&store)
            .await
            .map_err(user_error)?;
        println!("💾 Saved {} as {}", saved, saved.id);
    }

    let mut kinds = Vec::new();
    if args.insight {
        kinds.push(InsightKind::Insight);
    }
    if args.packing {
        kinds.push(InsightKind::Packing);
    }
    for kind in kinds {
        let text = planner.insight(kind).await.map_err(user_error)?;
        println!("\n✨ {}\n{}", kind, text.trim());
    }

    Ok(())
}

async fn replay(config: &MotoPlanConfig, id: &str, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let saved = store
        .list()
        .await
        .map_err(user_error)?
        .into_iter()
        .find(|route| route.id == id)
        .ok_or_else(|| user_error(motoplan::MotoPlanError::UnknownRoute { id: id.to_string() }))?;

    let mut planner = planner(config)?;
    let report = planner
        .replay(&saved)
        .await
        .map_err(|failure| anyhow::anyhow!(failure.to_string()))?;
    print_report(&report, json)
}

async fn list_routes(config: &MotoPlanConfig) -> Result<()> {
    let store = open_store(config)?;
    let routes = store.list().await.map_err(user_error)?;
    if routes.is_empty() {
        println!("No saved routes yet.");
    }
    for route in routes {
        println!(
            "{}  {}  {}",
            route.id,
            route.created_at.format("%Y-%m-%d %H:%M"),
            route
        );
    }
    Ok(())
}

async fn watch_routes(config: &MotoPlanConfig) -> Result<()> {
    let store = open_store(config)?;
    let subscription = subscribe(&store, |routes| {
        println!("📚 {} saved routes", routes.len());
        for route in routes {
            println!("   {}  {}", route.id, route);
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    subscription.unsubscribe();
    Ok(())
}

fn print_report(report: &PlanReport, json: bool) -> Result<()> {
    if json {
        let output = serde_json::to_string_pretty(report).context("Failed to encode plan")?;
        println!("{output}");
    } else {
        print!("{report}");
    }
    Ok(())
}
