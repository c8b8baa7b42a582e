//! Load Generator
//!
//! Closed-loop HTTP load against a running KV Cache server. Each worker sends
//! one request, waits for the response, then sends the next, until the test
//! duration elapses.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin load_gen -- --threads 16 --duration 60 --workload get_put
//! ```
//!
//! ## Workloads
//!
//! - `put_all`: writes a fresh key on every request
//! - `get_all`: reads keys that were never written (every read misses)
//! - `get_popular`: reads from a hot set of 50 keys
//! - `get_put`: 70% hot-set reads, 30% fresh writes

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{ensure, Context, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use tracing::{debug, info, warn};

/// Size of the hot key set read by `get_popular` and `get_put`.
const POPULAR_KEYS: u32 = 50;
const MAX_RANDOM_VALUE: u32 = 1_000_000;
/// Share of `get_put` requests that are reads.
const GET_PERCENT: u32 = 70;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Workload {
    #[value(name = "put_all")]
    PutAll,
    #[value(name = "get_all")]
    GetAll,
    #[value(name = "get_popular")]
    GetPopular,
    #[value(name = "get_put")]
    GetPut,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Closed-loop load generator for the KV Cache server", long_about = None)]
struct Args {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Number of concurrent clients
    #[arg(short, long, default_value_t = 8)]
    threads: usize,

    /// Test duration in seconds
    #[arg(short, long, default_value_t = 30)]
    duration: u64,

    /// Request mix
    #[arg(short, long, value_enum, default_value_t = Workload::GetPopular)]
    workload: Workload,
}

/// A single request to send.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Op {
    Get { key: String },
    Put { key: String, value: String },
}

fn unique_key(worker: usize, seq: u64) -> String {
    format!("key_t{}_{}", worker, seq)
}

fn popular_key(index: u32) -> String {
    format!("popular_key_{}", index)
}

fn popular_get<R: Rng>(rng: &mut R) -> Op {
    Op::Get {
        key: popular_key(rng.gen_range(0..POPULAR_KEYS)),
    }
}

fn fresh_put<R: Rng>(worker: usize, seq: u64, rng: &mut R) -> Op {
    Op::Put {
        key: unique_key(worker, seq),
        value: format!("val_{}", rng.gen_range(0..=MAX_RANDOM_VALUE)),
    }
}

/// Picks the next request for `worker`, whose request counter is `seq`.
fn next_op<R: Rng>(workload: Workload, worker: usize, seq: u64, rng: &mut R) -> Op {
    match workload {
        Workload::PutAll => fresh_put(worker, seq, rng),
        Workload::GetAll => Op::Get {
            key: unique_key(worker, seq),
        },
        Workload::GetPopular => popular_get(rng),
        Workload::GetPut => {
            if rng.gen_range(0..100) < GET_PERCENT {
                popular_get(rng)
            } else {
                fresh_put(worker, seq, rng)
            }
        }
    }
}

/// A 404 is a completed round trip, not a failure.
fn is_success(status: u16) -> bool {
    matches!(status, 200 | 201 | 404)
}

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    response_micros: AtomicU64,
}

impl Counters {
    fn record(&self, elapsed: Duration) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.response_micros
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Report {
    requests: u64,
    duration_secs: f64,
    throughput: f64,
    avg_response_ms: f64,
}

impl Report {
    fn new(requests: u64, total_response: Duration, duration: Duration) -> Self {
        let duration_secs = duration.as_secs_f64();
        let (throughput, avg_response_ms) = if requests == 0 || duration_secs == 0.0 {
            (0.0, 0.0)
        } else {
            (
                requests as f64 / duration_secs,
                total_response.as_secs_f64() * 1000.0 / requests as f64,
            )
        };

        Self {
            requests,
            duration_secs,
            throughput,
            avg_response_ms,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Requests: {}", self.requests)?;
        writeln!(f, "Total Test Time: {:.0} s", self.duration_secs)?;
        writeln!(f, "----------------------------------")?;
        writeln!(f, "Average Throughput: {:.2} req/sec", self.throughput)?;
        write!(f, "Average Response Time: {:.3} ms", self.avg_response_ms)
    }
}

async fn run_worker(
    id: usize,
    base_url: Arc<str>,
    workload: Workload,
    deadline: Instant,
    counters: Arc<Counters>,
) -> Result<()> {
    let client = reqwest::Client::builder()
        .connect_timeout(REQUEST_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;
    let mut rng = StdRng::from_entropy();
    let mut seq = 0u64;

    while Instant::now() < deadline {
        let op = next_op(workload, id, seq, &mut rng);
        let started = Instant::now();

        let sent = match &op {
            Op::Get { key } => client.get(format!("{}/kv/{}", base_url, key)).send().await,
            Op::Put { key, value } => {
                client
                    .post(format!("{}/kv", base_url))
                    .json(&json!({ "key": key, "value": value }))
                    .send()
                    .await
            }
        };

        match sent {
            Ok(response) => {
                let status = response.status();
                // Read the body so the latency covers the full response
                let body = response.bytes().await;
                if body.is_ok() && is_success(status.as_u16()) {
                    counters.record(started.elapsed());
                } else {
                    debug!("Worker {}: {:?} returned {}", id, op, status);
                }
            }
            Err(err) => debug!("Worker {}: request failed: {}", id, err),
        }
        seq += 1;
    }

    debug!("Worker {} finished after {} requests", id, seq);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "load_gen=info".into()),
        )
        .init();

    let args = Args::parse();
    ensure!(args.threads > 0, "--threads must be greater than 0");
    ensure!(args.duration > 0, "--duration must be greater than 0");

    info!("Starting load generator");
    info!("  Target: {}:{}", args.host, args.port);
    info!("  Threads: {}", args.threads);
    info!("  Duration: {} seconds", args.duration);
    info!("  Workload: {:?}", args.workload);

    let base_url: Arc<str> = format!("http://{}:{}", args.host, args.port).into();
    let duration = Duration::from_secs(args.duration);
    let deadline = Instant::now() + duration;
    let counters = Arc::new(Counters::default());

    let workers: Vec<_> = (0..args.threads)
        .map(|id| {
            tokio::spawn(run_worker(
                id,
                Arc::clone(&base_url),
                args.workload,
                deadline,
                Arc::clone(&counters),
            ))
        })
        .collect();

    for (id, worker) in workers.into_iter().enumerate() {
        match worker.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("Worker {} stopped early: {:#}", id, err),
            Err(err) => warn!("Worker {} panicked: {}", id, err),
        }
    }

    let report = Report::new(
        counters.requests.load(Ordering::Relaxed),
        Duration::from_micros(counters.response_micros.load(Ordering::Relaxed)),
        duration,
    );
    println!("\n--- Load test finished ---");
    println!("{}", report);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_put_all_writes_fresh_keys() {
        let mut rng = rng();

        match next_op(Workload::PutAll, 3, 7, &mut rng) {
            Op::Put { key, value } => {
                assert_eq!(key, "key_t3_7");
                let n: u32 = value.strip_prefix("val_").unwrap().parse().unwrap();
                assert!(n <= MAX_RANDOM_VALUE);
            }
            other => panic!("expected a put, got {:?}", other),
        }
    }

    #[test]
    fn test_get_all_reads_unwritten_keys() {
        let mut rng = rng();

        assert_eq!(
            next_op(Workload::GetAll, 0, 12, &mut rng),
            Op::Get {
                key: "key_t0_12".to_string()
            }
        );
    }

    #[test]
    fn test_get_popular_stays_in_hot_set() {
        let mut rng = rng();
        let hot: Vec<String> = (0..POPULAR_KEYS).map(popular_key).collect();
        let mut seen = std::collections::HashSet::new();

        for seq in 0..2000 {
            match next_op(Workload::GetPopular, 1, seq, &mut rng) {
                Op::Get { key } => {
                    assert!(hot.contains(&key), "{} outside hot set", key);
                    seen.insert(key);
                }
                other => panic!("expected a get, got {:?}", other),
            }
        }
        // 2000 draws over 50 keys touch nearly all of them
        assert!(seen.len() > 40);
    }

    #[test]
    fn test_get_put_mix() {
        let mut rng = rng();
        let total = 10_000;
        let mut gets = 0;

        for seq in 0..total {
            match next_op(Workload::GetPut, 2, seq, &mut rng) {
                Op::Get { key } => {
                    assert!(key.starts_with("popular_key_"));
                    gets += 1;
                }
                Op::Put { key, .. } => assert_eq!(key, unique_key(2, seq)),
            }
        }

        let ratio = gets as f64 / total as f64;
        assert!((0.67..0.73).contains(&ratio), "get ratio {}", ratio);
    }

    #[test]
    fn test_success_statuses() {
        for status in [200, 201, 404] {
            assert!(is_success(status));
        }
        for status in [400, 500, 503] {
            assert!(!is_success(status));
        }
    }

    #[test]
    fn test_report_averages() {
        let report = Report::new(100, Duration::from_millis(250), Duration::from_secs(10));

        assert_eq!(report.requests, 100);
        assert!((report.throughput - 10.0).abs() < 1e-9);
        assert!((report.avg_response_ms - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_report_without_requests() {
        let report = Report::new(0, Duration::ZERO, Duration::from_secs(5));

        assert_eq!(report.throughput, 0.0);
        assert_eq!(report.avg_response_ms, 0.0);
    }

    #[test]
    fn test_counters_record() {
        let counters = Counters::default();
        counters.record(Duration::from_millis(3));
        counters.record(Duration::from_millis(5));

        assert_eq!(counters.requests.load(Ordering::Relaxed), 2);
        assert_eq!(counters.response_micros.load(Ordering::Relaxed), 8000);
    }

    #[test]
    fn test_args_defaults_and_workload_names() {
        let args = Args::try_parse_from(["load_gen"]).unwrap();
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 8080);
        assert_eq!(args.threads, 8);
        assert_eq!(args.duration, 30);
        assert_eq!(args.workload, Workload::GetPopular);

        let args =
            Args::try_parse_from(["load_gen", "--workload", "get_put", "-t", "4"]).unwrap();
        assert_eq!(args.workload, Workload::GetPut);
        assert_eq!(args.threads, 4);

        assert!(Args::try_parse_from(["load_gen", "--workload", "get-put"]).is_err());
    }
}
