//! fsize - human-readable file sizes, memoised through the LRU/TTL cache
//!
//! Reads editor-style events from stdin, one per line, and prints a size label
//! for each:
//! - `focus <path>` - answer from the cache when possible
//! - `save <path>` / `change <path>` - re-stat the file and refresh the cache

use std::fs;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lru_ttl::{CacheConfig, CacheStore};

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// An editor notification and whether it may be answered from the cache.
#[derive(Debug, PartialEq, Eq)]
struct Event<'a> {
    path: &'a str,
    use_cache: bool,
}

impl<'a> Event<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let (kind, path) = line.trim().split_once(char::is_whitespace)?;
        let path = path.trim();
        if path.is_empty() {
            return None;
        }

        let use_cache = match kind {
            "focus" => true,
            "save" | "change" => false,
            _ => return None,
        };
        Some(Self { path, use_cache })
    }
}

fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lru_ttl=info,fsize=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = CacheConfig::from_env().context("failed to load cache configuration")?;
    info!(
        "Configuration loaded: capacity={}, ttl={}s",
        config.capacity,
        config.ttl.as_secs_f64()
    );

    let mut cache = CacheStore::from_config(&config)?;

    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read event")?;
        let Some(event) = Event::parse(&line) else {
            if !line.trim().is_empty() {
                warn!("Ignoring unrecognised event: {:?}", line);
            }
            continue;
        };

        let label = size_label(&mut cache, &event).unwrap_or_else(|err| {
            warn!("{:#}", err);
            String::new()
        });
        writeln!(out, "{}", label)?;
    }

    let stats = serde_json::to_string(&cache.stats())?;
    info!("Session finished: {}", stats);
    Ok(())
}

/// Produces the label for `event`, consulting the cache only for focus events.
fn size_label<C: lru_ttl::Clock>(
    cache: &mut CacheStore<String, C>,
    event: &Event<'_>,
) -> Result<String> {
    if event.use_cache {
        if let Some(label) = cache.get(event.path) {
            debug!(path = event.path, "cache hit");
            return Ok(label.clone());
        }
    }

    let size = fs::metadata(event.path)
        .with_context(|| format!("failed to stat {}", event.path))?
        .len();
    let label = format_size(size);
    cache.set(event.path, label.clone())?;
    Ok(label)
}

/// Formats a byte count as `B`, `KB` or `MB`, truncated to two decimals.
fn format_size(size: u64) -> String {
    let scaled = u128::from(size) * 100;
    if size >= MIB {
        format!("{} MB", hundredths(scaled / u128::from(MIB)))
    } else if size >= KIB {
        format!("{} KB", hundredths(scaled / u128::from(KIB)))
    } else {
        format!("{} B", size)
    }
}

/// Renders a fixed-point value without trailing zeros: 150 -> "1.5".
fn hundredths(value: u128) -> String {
    let (whole, frac) = (value / 100, value % 100);
    match frac {
        0 => whole.to_string(),
        f if f % 10 == 0 => format!("{}.{}", whole, f / 10),
        f => format!("{}.{:02}", whole, f),
    }
}
