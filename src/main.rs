use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

use curve_engine::{math, Config, CurveEngine};

const USAGE: &str = "usage: curve-engine [--config <path>] [buy|sell|quote-buy|quote-sell <amount>]...";

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{}", USAGE);
        return Ok(());
    }

    let explicit = match take_config_path(&mut args)? {
        Some(path) => Some(Config::load(&path)?),
        None => None,
    };

    // 1. Logger: RUST_LOG wins, then the configured level
    let level = explicit
        .as_ref()
        .map(|c| c.app.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    let config = explicit.unwrap_or_else(Config::load_default);

    // 2. Curve
    let mut engine = CurveEngine::new(config.curve)?;
    let events = engine.subscribe();
    tracing::info!(
        "📈 Curve ready: price={} market_cap={}",
        engine.current_price(),
        engine.market_cap()
    );

    // 3. Replay the scripted trades in order
    if args.len() % 2 != 0 {
        anyhow::bail!("every command needs an amount\n{}", USAGE);
    }
    for pair in args.chunks(2) {
        let (command, raw) = (pair[0].as_str(), pair[1].as_str());
        let amount = match math::parse_amount(raw) {
            Ok(a) => a,
            Err(e) => {
                tracing::error!("{} {}: {}", command, raw, e);
                continue;
            }
        };

        let outcome = match command {
            "buy" => engine.execute_buy(amount).map(|t| serde_json::to_string(&t)),
            "sell" => engine.execute_sell(amount).map(|t| serde_json::to_string(&t)),
            "quote-buy" => engine.quote_buy(amount).map(|q| serde_json::to_string(&q)),
            "quote-sell" => engine.quote_sell(amount).map(|q| serde_json::to_string(&q)),
            other => anyhow::bail!("unknown command '{}'\n{}", other, USAGE),
        };
        match outcome {
            Ok(json) => println!("{}", json?),
            Err(e) => tracing::error!("{} {}: {}", command, amount, e),
        }

        for event in events.try_iter() {
            println!("{}", serde_json::to_string(&event)?);
        }
    }

    // 4. Final state
    println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
    Ok(())
}

fn take_config_path(args: &mut Vec<String>) -> anyhow::Result<Option<PathBuf>> {
    let Some(idx) = args.iter().position(|a| a == "--config") else {
        return Ok(None);
    };
    if idx + 1 >= args.len() {
        anyhow::bail!("--config needs a path\n{}", USAGE);
    }
    let path = args.remove(idx + 1);
    args.remove(idx);
    Ok(Some(PathBuf::from(path)))
}
