use anyhow::Result;
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_property_graph::config::{init_logging, Config};
use rust_property_graph::{
    intersect, Database, Direction, EdgeTypeId, ElementId, ElementSet, Graph, GraphError, GraphId,
    NodeTypeId, PropertyTypeId, Session,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

#[derive(Debug, Clone, ValueEnum)]
enum WorkloadType {
    /// Two-hop queries against a graph opened once per worker
    Query,
    /// A read transaction that opens the graph per operation
    Open,
    /// Queries mixed with update transactions that persist a changed graph
    Mixed,
}

#[derive(Parser, Debug)]
#[command(name = "concurrent_bench")]
#[command(about = "Concurrent benchmark tool for the property graph", long_about = None)]
struct Args {
    /// Workload type
    #[arg(short, long, value_enum)]
    workload: WorkloadType,

    /// Graph id printed by data_generator
    #[arg(short, long)]
    graph: GraphId,

    /// Number of threads (defaults to the number of CPUs)
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Duration in seconds
    #[arg(short, long, default_value_t = 30)]
    duration: u64,

    /// Database path (defaults to GRAPH_DB_PATH)
    #[arg(short = 'p', long)]
    db_path: Option<PathBuf>,

    /// Read/write ratio for mixed workload (0.0-1.0, where 0.9 means 90% reads)
    #[arg(short, long, default_value_t = 0.9)]
    read_ratio: f64,

    /// Output JSON results to file
    #[arg(short, long)]
    output: Option<String>,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct BenchmarkResults {
    workload_type: String,
    threads: usize,
    duration_secs: u64,
    total_operations: u64,
    successful_operations: u64,
    failed_operations: u64,
    throughput_ops_per_sec: f64,
    latencies_ms: LatencyStats,
    per_thread_ops: Vec<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LatencyStats {
    min: f64,
    max: f64,
    mean: f64,
    p50: f64,
    p95: f64,
    p99: f64,
}

struct WorkerStats {
    operations: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    latencies: parking_lot::Mutex<Vec<Duration>>,
}

impl WorkerStats {
    fn new() -> Self {
        Self {
            operations: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            latencies: parking_lot::Mutex::new(Vec::new()),
        }
    }

    fn record_success(&self, latency: Duration) {
        self.operations.fetch_add(1, Ordering::Relaxed);
        self.successes.fetch_add(1, Ordering::Relaxed);
        self.latencies.lock().push(latency);
    }

    fn record_failure(&self) {
        self.operations.fetch_add(1, Ordering::Relaxed);
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// Type ids the queries need, resolved by name
struct MovieTypes {
    person: NodeTypeId,
    acted_in: EdgeTypeId,
    knows: EdgeTypeId,
    born: PropertyTypeId,
}

impl MovieTypes {
    fn resolve(graph: &Graph) -> Result<Self, GraphError> {
        let person = graph.find_node_type("PERSON")?;
        Ok(Self {
            person,
            acted_in: graph.find_edge_type("ACTED_IN")?,
            knows: graph.find_edge_type("KNOWS")?,
            born: graph.find_property_type(person, "BORN")?,
        })
    }

    /// Acquaintances of `person` who acted in a movie with them
    fn co_actor_acquaintances(
        &self,
        graph: &Graph,
        person: ElementId,
    ) -> Result<ElementSet, GraphError> {
        let movies = graph.neighbors(person, self.acted_in, Direction::Outgoing)?;
        let co_actors = graph.neighbors_of_set(&movies, self.acted_in, Direction::Incoming)?;
        let known = graph.neighbors(person, self.knows, Direction::Any)?;
        Ok(intersect(&co_actors, &known))
    }
}

struct Worker {
    db: Arc<Database>,
    graph_id: GraphId,
    duration: Duration,
    stats: Arc<WorkerStats>,
    thread_id: usize,
    seed: u64,
}

impl Worker {
    fn run_query(&self) -> Result<u64> {
        let mut rng = StdRng::seed_from_u64(self.seed + self.thread_id as u64);
        let mut session = self.db.session();
        session.begin_read()?;
        let graph = session.open(self.graph_id)?;
        let types = MovieTypes::resolve(&graph)?;
        let people = graph.all_elements_of_type(types.person)?.to_vec();
        anyhow::ensure!(!people.is_empty(), "graph {} has no people", self.graph_id);

        let start = Instant::now();
        let mut local_ops = 0u64;
        while start.elapsed() < self.duration {
            let person = people[rng.gen_range(0..people.len())];
            let op_start = Instant::now();
            match types.co_actor_acquaintances(&graph, person) {
                Ok(_) => {
                    self.stats.record_success(op_start.elapsed());
                    local_ops += 1;
                }
                Err(_) => self.stats.record_failure(),
            }
        }

        session.commit()?;
        Ok(local_ops)
    }

    fn run_open(&self) -> Result<u64> {
        let mut session = self.db.session();
        let start = Instant::now();
        let mut local_ops = 0u64;

        while start.elapsed() < self.duration {
            let op_start = Instant::now();
            let result = (|| -> Result<(), GraphError> {
                session.begin_read()?;
                let graph = session.open(self.graph_id)?;
                graph.node_count()?;
                session.commit()
            })();
            match result {
                Ok(()) => {
                    self.stats.record_success(op_start.elapsed());
                    local_ops += 1;
                }
                Err(_) => {
                    abandon(&mut session);
                    self.stats.record_failure();
                }
            }
        }

        Ok(local_ops)
    }

    fn run_mixed(&self, read_ratio: f64) -> Result<u64> {
        let mut rng = StdRng::seed_from_u64(self.seed + self.thread_id as u64);
        let mut session = self.db.session();
        let start = Instant::now();
        let mut local_ops = 0u64;

        while start.elapsed() < self.duration {
            let op_start = Instant::now();
            let read = rng.gen::<f64>() < read_ratio;
            let result = if read {
                mixed_read(&mut session, self.graph_id, &mut rng)
            } else {
                mixed_write(&mut session, self.graph_id, &mut rng)
            };
            match result {
                Ok(()) => {
                    self.stats.record_success(op_start.elapsed());
                    local_ops += 1;
                }
                Err(_) => {
                    abandon(&mut session);
                    self.stats.record_failure();
                }
            }
        }

        Ok(local_ops)
    }
}

fn mixed_read(session: &mut Session<'_>, id: GraphId, rng: &mut StdRng) -> Result<(), GraphError> {
    session.begin_read()?;
    let graph = session.open(id)?;
    let types = MovieTypes::resolve(&graph)?;
    let people = graph.all_elements_of_type(types.person)?;
    if !people.is_empty() {
        let person = people[rng.gen_range(0..people.len())];
        types.co_actor_acquaintances(&graph, person)?;
    }
    session.commit()
}

/// Rewrites one person's birth year; fails fast if another writer holds
/// the update lock
fn mixed_write(session: &mut Session<'_>, id: GraphId, rng: &mut StdRng) -> Result<(), GraphError> {
    session.begin_update()?;
    let mut graph = session.open(id)?;
    let types = MovieTypes::resolve(&graph)?;
    let people = graph.all_elements_of_type(types.person)?.to_vec();
    if !people.is_empty() {
        let person = people[rng.gen_range(0..people.len())];
        graph.set_property(person, types.born, rng.gen_range(1930..2005i32))?;
    }
    session.persist(&mut graph)?;
    session.commit()
}

fn abandon(session: &mut Session<'_>) {
    if session.is_active() {
        let _ = session.abort();
    }
}

fn calculate_latency_stats(latencies: &[Duration]) -> LatencyStats {
    if latencies.is_empty() {
        return LatencyStats {
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            p50: 0.0,
            p95: 0.0,
            p99: 0.0,
        };
    }

    let mut sorted: Vec<f64> = latencies
        .iter()
        .map(|d| d.as_secs_f64() * 1000.0)
        .collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let len = sorted.len();
    let sum: f64 = sorted.iter().sum();

    LatencyStats {
        min: sorted[0],
        max: sorted[len - 1],
        mean: sum / len as f64,
        p50: sorted[len / 2],
        p95: sorted[(len * 95) / 100],
        p99: sorted[(len * 99) / 100],
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::from_env()?;
    init_logging(&config.logging);
    if let Some(path) = &args.db_path {
        config.database.path = path.clone();
    }
    config.database.create_if_missing = false;
    let threads = args.threads.unwrap_or_else(num_cpus::get).max(1);

    println!("=== Concurrent Benchmark Configuration ===");
    println!("Workload: {:?}", args.workload);
    println!("Threads: {}", threads);
    println!("Duration: {}s", args.duration);
    println!("Database: {:?} (graph: {})", config.database.path, args.graph);
    println!("==========================================\n");

    let db = Arc::new(Database::open(config.database.clone())?);

    println!("Starting benchmark...\n");

    let stats = Arc::new(WorkerStats::new());
    let duration = Duration::from_secs(args.duration);

    let mut join_set = JoinSet::new();
    let start_time = Instant::now();

    for thread_id in 0..threads {
        let worker = Worker {
            db: db.clone(),
            graph_id: args.graph,
            duration,
            stats: stats.clone(),
            thread_id,
            seed: args.seed,
        };
        let workload = args.workload.clone();
        let read_ratio = args.read_ratio;

        join_set.spawn_blocking(move || {
            let ops = match workload {
                WorkloadType::Query => worker.run_query(),
                WorkloadType::Open => worker.run_open(),
                WorkloadType::Mixed => worker.run_mixed(read_ratio),
            };
            (thread_id, ops)
        });
    }

    let mut per_thread_ops = vec![0u64; threads];
    while let Some(result) = join_set.join_next().await {
        match result? {
            (thread_id, Ok(ops)) => {
                println!("Thread {} completed {} operations", thread_id, ops);
                per_thread_ops[thread_id] = ops;
            }
            (thread_id, Err(e)) => eprintln!("Thread {} failed: {:#}", thread_id, e),
        }
    }

    let actual_duration = start_time.elapsed();

    let total_ops = stats.operations.load(Ordering::Relaxed);
    let successes = stats.successes.load(Ordering::Relaxed);
    let failures = stats.failures.load(Ordering::Relaxed);
    let latencies = stats.latencies.lock().clone();

    let throughput = successes as f64 / actual_duration.as_secs_f64();
    let latency_stats = calculate_latency_stats(&latencies);

    let results = BenchmarkResults {
        workload_type: format!("{:?}", args.workload),
        threads,
        duration_secs: actual_duration.as_secs(),
        total_operations: total_ops,
        successful_operations: successes,
        failed_operations: failures,
        throughput_ops_per_sec: throughput,
        latencies_ms: latency_stats,
        per_thread_ops,
    };

    println!("\n=== Benchmark Results ===");
    println!("Total operations: {}", results.total_operations);
    println!("Successful: {}", results.successful_operations);
    println!("Failed: {}", results.failed_operations);
    println!("Duration: {:.2}s", actual_duration.as_secs_f64());
    println!("Throughput: {:.2} ops/sec", results.throughput_ops_per_sec);
    println!("\nLatency (ms):");
    println!("  Min: {:.3}", results.latencies_ms.min);
    println!("  Mean: {:.3}", results.latencies_ms.mean);
    println!("  P50: {:.3}", results.latencies_ms.p50);
    println!("  P95: {:.3}", results.latencies_ms.p95);
    println!("  P99: {:.3}", results.latencies_ms.p99);
    println!("  Max: {:.3}", results.latencies_ms.max);

    if let Some(output_path) = args.output {
        let json_output = serde_json::to_string_pretty(&results)?;
        std::fs::write(&output_path, json_output)?;
        println!("\n✅ Results saved to: {}", output_path);
    }

    Ok(())
}
