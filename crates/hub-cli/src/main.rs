use std::env;
use std::net::SocketAddr;

use chrono::Utc;
use contracts::PlayerUpdate;
use hub_api::{serve, HubConfig, SqlitePlayerStore};
use hub_core::{Lookup, PlayerService, SaveReceipt};
use tracing::error;
use tracing_subscriber::EnvFilter;

const DEFAULT_LIST_LIMIT: usize = 50;

fn print_usage() {
    println!("hub-cli <command>");
    println!("commands:");
    println!("  serve [addr]");
    println!("    default addr: $HUB_ADDR or 127.0.0.1:8080");
    println!("  get <code>");
    println!("  save <code> <player_json>");
    println!("    player_json: {{\"name\":\"KADU\",\"servant\":{{\"class\":\"SABER\"}}}}");
    println!("  debug");
    println!("  codes [limit]");
    println!("environment:");
    println!("  HUB_SQLITE_PATH, HUB_STORE (sqlite|memory), HUB_ADDR, HUB_BUSY_TIMEOUT_MS, RUST_LOG");
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn parse_socket_addr(value: Option<&String>) -> Result<Option<SocketAddr>, String> {
    value
        .map(|raw| {
            raw.parse::<SocketAddr>()
                .map_err(|_| format!("invalid addr: {raw}"))
        })
        .transpose()
}

fn parse_limit(value: Option<&String>) -> Result<usize, String> {
    value
        .map(|raw| {
            raw.parse::<usize>()
                .map_err(|_| format!("invalid limit: {raw}"))
        })
        .transpose()
        .map(|limit| limit.unwrap_or(DEFAULT_LIST_LIMIT))
}

fn print_json(value: &impl serde::Serialize) -> Result<(), String> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|err| format!("failed to render json: {err}"))?;
    println!("{rendered}");
    Ok(())
}

fn get_player(service: &PlayerService, args: &[String]) -> Result<(), String> {
    let code = args.get(2).ok_or_else(|| "missing code".to_string())?;
    let lookup = service
        .get_player(code, Utc::now())
        .map_err(|err| err.to_string())?;

    match lookup {
        Lookup::Found { player, source, .. } => {
            println!("source={source}");
            print_json(&player)
        }
        Lookup::NotFound {
            code,
            available_codes,
        } => {
            if available_codes.is_empty() {
                Err(format!("player {code} not found"))
            } else {
                Err(format!(
                    "player {code} not found; available codes: {}",
                    available_codes.join(", ")
                ))
            }
        }
    }
}

fn save_player(service: &PlayerService, args: &[String]) -> Result<(), String> {
    let code = args.get(2).ok_or_else(|| "missing code".to_string())?;
    let raw = args
        .get(3)
        .ok_or_else(|| "missing player_json".to_string())?;
    let update: PlayerUpdate =
        serde_json::from_str(raw).map_err(|err| format!("invalid player_json: {err}"))?;

    let receipt = service
        .save_player(Some(code.as_str()), Some(&update), Utc::now())
        .map_err(|err| err.to_string())?;

    match receipt {
        SaveReceipt::Persisted { code, outcome, at } => {
            println!("saved code={code} outcome={outcome:?} at={}", at.to_rfc3339());
        }
        SaveReceipt::Simulated { code, reason, at } => {
            println!(
                "saved locally code={code} reason={reason:?} at={}",
                at.to_rfc3339()
            );
        }
    }
    Ok(())
}

fn list_codes(config: &HubConfig, service: &PlayerService, args: &[String]) -> Result<(), String> {
    let limit = parse_limit(args.get(2))?;

    println!("fallback codes: {}", service.catalog().codes().join(", "));

    let Some(path) = config.sqlite_path.as_ref() else {
        println!("no sqlite store configured");
        return Ok(());
    };

    let store = SqlitePlayerStore::new(path, config.busy_timeout);
    let players = store
        .list_players(limit)
        .map_err(|err| format!("failed to list stored players: {err}"))?;

    for player in players {
        let updated = player
            .last_updated
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        println!("{} {} {}", player.code, player.name, updated);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    let config = match HubConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    };

    let result = match command {
        Some("serve") => match parse_socket_addr(args.get(2)) {
            Ok(addr) => {
                let config = match addr {
                    Some(addr) => config.with_addr(addr),
                    None => config,
                };
                println!("serving api on http://{}", config.addr);
                serve(&config).await.map_err(|err| {
                    error!(error = %err, "server stopped");
                    format!("server error: {err}")
                })
            }
            Err(err) => Err(err),
        },
        Some("get") => get_player(&config.build_service(), &args),
        Some("save") => save_player(&config.build_service(), &args),
        Some("debug") => print_json(&config.build_service().diagnose(Utc::now())),
        Some("codes") => list_codes(&config, &config.build_service(), &args),
        _ => {
            print_usage();
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        print_usage();
        std::process::exit(2);
    }
}
