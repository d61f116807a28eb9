//! Scripted crawl example
//!
//! Runs the crawler against a simulated swarm that announces random infohashes and
//! answers metadata fetches with a mix of resolutions, errors and stalls. Reports are
//! printed as they complete. Type `s` and Enter (or press Ctrl+C) to stop.
//!
//! ```text
//! RUST_LOG=dhtx=debug cargo run --example scripted_crawl
//! ```

use std::collections::HashMap;
use std::time::Duration;

use dhtx::engine::{self, EngineBridge, EngineCommand};
use dhtx::{
    Config, CrawlEvent, Crawler, Descriptor, EngineEvent, FetchHandle, FetchPhase, FetchStatus,
    InfoHash, InfoHashV2, magnet, utils,
};
use rand::Rng;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = Config::default();
    config.crawl.fetch_timeout = Duration::from_secs(10);
    config.crawl.max_active_fetches = 5;

    // A real engine would keep partial downloads here
    utils::reset_dir(&config.engine.scratch_dir).await?;
    let port = utils::random_port(config.engine.listen_port_range);
    tracing::info!(
        port,
        user_agent = %config.engine.user_agent,
        bootstrap = %config.engine.bootstrap_list(),
        "Simulated engine configured"
    );

    let scratch_dir = config.engine.scratch_dir.clone();
    let (engine, bridge) = engine::channel(1024);
    let crawler = Crawler::new(config, Box::new(engine))?;

    let mut events = crawler.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                CrawlEvent::Completed { report } => println!("{}", report),
                CrawlEvent::Removed {
                    info_hash, reason, ..
                } => println!("✗ Dropped {}: {:?}", info_hash, reason),
                CrawlEvent::Shutdown { stats } => println!("Final stats: {:?}", stats),
                _ => {}
            }
        }
    });

    tokio::spawn(simulate_swarm(bridge));

    let handle = crawler.spawn();
    println!("Crawling. Type 's' and press Enter to stop.");
    let stats = dhtx::run_until_stop(handle, tokio::io::stdin()).await?;
    println!(
        "Resolved {} of {} admitted fetches",
        stats.completed, stats.admitted
    );

    utils::clean_dir(&scratch_dir).await?;
    Ok(())
}

enum Script {
    Resolve { remaining: u32 },
    /// Hybrid torrent the engine reports under its truncated v2 hash
    ResolveHybrid { v2: InfoHashV2 },
    Fail,
    Stall,
}

async fn simulate_swarm(mut bridge: EngineBridge) {
    let mut fetches: HashMap<FetchHandle, (InfoHash, Script)> = HashMap::new();
    let mut announce = tokio::time::interval(Duration::from_millis(300));

    loop {
        tokio::select! {
            _ = announce.tick() => {
                let info_hash = InfoHash::new(rand::thread_rng().r#gen());
                if !bridge.try_send_event(EngineEvent::Discovery { info_hash }) {
                    return;
                }
            }
            command = bridge.next_command() => {
                let Some(command) = command else { return };
                match command {
                    EngineCommand::Submit { handle, info_hash, .. } => {
                        let script = match rand::thread_rng().gen_range(0..5) {
                            0 | 1 => Script::Resolve { remaining: rand::thread_rng().gen_range(1..5) },
                            2 => Script::ResolveHybrid { v2: InfoHashV2::new(rand::thread_rng().r#gen()) },
                            3 => Script::Fail,
                            _ => Script::Stall,
                        };
                        fetches.insert(handle, (info_hash, script));
                    }
                    EngineCommand::Cancel { handle } => {
                        fetches.remove(&handle);
                    }
                    EngineCommand::FlushStatus => {
                        let statuses = fetches.iter_mut().map(|(handle, (info_hash, script))| {
                            let status = FetchStatus::new(*handle, *info_hash, FetchPhase::Resolving);
                            match script {
                                Script::Resolve { remaining: 0 } => {
                                    let mut status = status;
                                    status.phase = FetchPhase::PastMetadata;
                                    status.with_descriptor(
                                        Descriptor::new(format!("torrent-{}", &info_hash.to_string()[..8]), 1 << 20, 4)
                                            .with_locator(magnet::v1(info_hash)),
                                    )
                                }
                                Script::ResolveHybrid { v2 } => {
                                    let mut status = FetchStatus::new(*handle, v2.truncated(), FetchPhase::PastMetadata);
                                    status.descriptor = Some(
                                        Descriptor::new(format!("hybrid-{}", &v2.to_string()[..8]), 1 << 24, 12)
                                            .with_locator(magnet::v1(info_hash))
                                            .with_locator(magnet::v2(v2)),
                                    );
                                    status
                                }
                                Script::Resolve { remaining } => {
                                    *remaining -= 1;
                                    status
                                }
                                Script::Fail => status.with_error(-2, "no peers responded"),
                                Script::Stall => status,
                            }
                        }).collect();
                        if bridge.send_event(EngineEvent::Status { statuses }).await.is_err() {
                            return;
                        }
                    }
                    EngineCommand::Shutdown => return,
                }
            }
        }
    }
}
