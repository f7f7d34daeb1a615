//! Leaderboard Demo
//!
//! Replays the reference leaderboard scenario, then drives the index from
//! many concurrent tasks and checks that it is still consistent.

use std::time::Instant;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use leaderboard::{
    IndexSnapshot, LeaderboardConfig, LeaderboardService, RankInfo, VERSION,
};

/// Concurrent writer tasks in the load phase.
const WRITERS: u64 = 8;

/// Concurrent reader tasks in the load phase.
const READERS: u64 = 4;

/// Updates issued by each writer.
const UPDATES_PER_WRITER: u64 = 5_000;

/// Distinct players each writer cycles through.
const PLAYERS_PER_WRITER: u64 = 250;

#[tokio::main]
async fn main() -> Result<()> {
    let config = LeaderboardConfig::from_env();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Leaderboard Index v{}", VERSION);
    info!("Leaderboard: {} (capacity {})", config.name, config.initial_capacity);

    let board = LeaderboardService::new(&config);

    demo_scenario(&board)?;
    demo_load(&board).await?;
    demo_snapshot(&board, &config)?;

    Ok(())
}

fn render(rows: &[RankInfo]) -> Result<String> {
    Ok(serde_json::to_string(rows)?)
}

/// The three-player scenario: rank, top 2, and a window of 2.
fn demo_scenario(board: &LeaderboardService) -> Result<()> {
    info!("=== Scenario ===");

    board.update_score("player1", 100, 1743150268969)?;
    board.update_score("player3", 150, 1743150268969)?;
    board.update_score("player2", 100, 1743150268970)?;

    let rank = board.get_player_rank("player1")?;
    info!("Rank of player1: {}", rank.to_json()?);

    let top = board.get_top_n(2)?;
    info!("Top 2: {}", render(&top)?);

    let around = board.get_player_rank_range("player1", 2)?;
    info!("Around player1 (window 2): {}", render(&around)?);

    let unknown = board.get_player_rank("unknown_player")?;
    info!("Rank of unknown_player: {}", unknown.to_json()?);

    if rank.rank != 2 || top.first().map(|r| r.player_id.as_str()) != Some("player3") {
        bail!("scenario produced an unexpected ordering");
    }
    Ok(())
}

/// Many writers and readers sharing one index.
async fn demo_load(board: &LeaderboardService) -> Result<()> {
    info!("=== Concurrent Load ===");
    info!(
        "{} writers x {} updates, {} readers",
        WRITERS, UPDATES_PER_WRITER, READERS
    );

    let started = Instant::now();
    let mut writers = Vec::new();
    for w in 0..WRITERS {
        let board = board.clone();
        writers.push(tokio::spawn(async move {
            for i in 0..UPDATES_PER_WRITER {
                let player = format!("w{}-p{}", w, i % PLAYERS_PER_WRITER);
                // Deterministic but scattered scores
                let score = ((i * (w + 1) * 7919) % 100_000) as i64;
                let timestamp = 1743150268969 + i as i64;
                board.update_score(&player, score, timestamp)?;
                if i % 512 == 0 {
                    tokio::task::yield_now().await;
                }
            }
            Ok::<_, leaderboard::LeaderboardError>(())
        }));
    }

    let mut readers = Vec::new();
    for r in 0..READERS {
        let board = board.clone();
        readers.push(tokio::spawn(async move {
            let mut queries = 0u64;
            for i in 0..1_000u64 {
                let player = format!("w{}-p{}", r % WRITERS, i % PLAYERS_PER_WRITER);
                board.get_player_rank_range(&player, 3)?;
                board.get_top_n(10)?;
                queries += 2;
                if i % 128 == 0 {
                    tokio::task::yield_now().await;
                }
            }
            Ok::<_, leaderboard::LeaderboardError>(queries)
        }));
    }

    for handle in writers {
        handle.await.context("writer task panicked")??;
    }
    let mut queries = 0;
    for handle in readers {
        queries += handle.await.context("reader task panicked")??;
    }

    let elapsed = started.elapsed();
    let players = board.len()?;
    info!(
        "{} updates and {} queries in {:?}, {} players ranked",
        WRITERS * UPDATES_PER_WRITER,
        queries,
        elapsed,
        players
    );

    board.index().verify().context("index inconsistent after load")?;
    info!("Index verified: map and tree agree");

    for row in board.get_top_n(5)? {
        info!("#{}: {} - Score: {}", row.rank, row.player_id, row.score.unwrap_or_default());
    }
    Ok(())
}

/// Snapshot the index, optionally persist it, and reload it.
fn demo_snapshot(board: &LeaderboardService, config: &LeaderboardConfig) -> Result<()> {
    info!("=== Snapshot ===");

    let snapshot = board.snapshot()?;
    info!("Snapshot: {} players, digest {}", snapshot.len(), snapshot.digest_hex());

    let reloaded = match &config.snapshot_path {
        Some(path) => {
            snapshot
                .write_to(path)
                .with_context(|| format!("writing snapshot to {}", path.display()))?;
            info!("Snapshot written to {}", path.display());
            IndexSnapshot::read_from(path)
                .with_context(|| format!("reading snapshot from {}", path.display()))?
        }
        None => IndexSnapshot::from_bytes(&snapshot.to_bytes()?)?,
    };

    let replica = LeaderboardService::new(config);
    replica.restore(&reloaded)?;
    let replica_digest = replica.snapshot()?.digest();

    if replica_digest == snapshot.digest() {
        info!("RESTORE VERIFIED: digests match");
        Ok(())
    } else {
        bail!(
            "restore mismatch: {} vs {}",
            hex::encode(replica_digest),
            snapshot.digest_hex()
        )
    }
}
