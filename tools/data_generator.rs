use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_property_graph::config::{init_logging, Config};
use rust_property_graph::{
    export_to_json, Database, Direction, EdgeTypeId, ElementId, ExportOptions, Graph, IndexKind,
    NodeTypeId, PropertyTypeId, ValueKind,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Clone, ValueEnum)]
enum CastingModel {
    /// Every person is equally likely to be cast
    Uniform,
    /// People who already have many roles are more likely to be cast again
    PowerLaw,
}

#[derive(Parser, Debug)]
#[command(name = "data_generator")]
#[command(about = "Generate and persist a synthetic movie graph", long_about = None)]
struct Args {
    /// How actors are picked for each movie
    #[arg(short = 'm', long, value_enum, default_value = "power-law")]
    model: CastingModel,

    /// Number of people
    #[arg(short = 'p', long, default_value_t = 10000)]
    people: usize,

    /// Number of movies
    #[arg(short = 'n', long, default_value_t = 2000)]
    movies: usize,

    /// Actors cast per movie
    #[arg(short = 'c', long, default_value_t = 8)]
    cast_size: usize,

    /// KNOWS edges per person
    #[arg(short = 'k', long, default_value_t = 5)]
    acquaintances: usize,

    /// Database path (defaults to GRAPH_DB_PATH)
    #[arg(short = 'd', long)]
    db_path: Option<PathBuf>,

    /// Also export the generated graph as a JSON image
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

struct MovieSchema {
    person: NodeTypeId,
    movie: NodeTypeId,
    acted_in: EdgeTypeId,
    directed: EdgeTypeId,
    knows: EdgeTypeId,
    name: PropertyTypeId,
    born: PropertyTypeId,
    title: PropertyTypeId,
    year: PropertyTypeId,
}

fn define_schema(graph: &mut Graph) -> Result<MovieSchema> {
    let person = graph.define_node_type("PERSON")?;
    let movie = graph.define_node_type("MOVIE")?;
    Ok(MovieSchema {
        person,
        movie,
        acted_in: graph.define_edge_type("ACTED_IN", true, Some((person, movie)))?,
        directed: graph.define_edge_type("DIRECTED", true, Some((person, movie)))?,
        knows: graph.define_edge_type("KNOWS", false, Some((person, person)))?,
        name: graph.define_property(person, "NAME", ValueKind::Text, IndexKind::Unique)?,
        born: graph.define_property(person, "BORN", ValueKind::Integer, IndexKind::Indexed)?,
        title: graph.define_property(movie, "TITLE", ValueKind::Text, IndexKind::Unique)?,
        year: graph.define_property(movie, "YEAR", ValueKind::Integer, IndexKind::Indexed)?,
    })
}

struct MovieGenerator {
    rng: StdRng,
    model: CastingModel,
    /// One entry per role already held, plus one per person
    attachment: Vec<usize>,
}

impl MovieGenerator {
    fn new(seed: u64, model: CastingModel) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            model,
            attachment: Vec::new(),
        }
    }

    fn pick_person(&mut self, people: usize) -> usize {
        match self.model {
            CastingModel::Uniform => self.rng.gen_range(0..people),
            CastingModel::PowerLaw => {
                let idx = self.rng.gen_range(0..self.attachment.len());
                self.attachment[idx]
            }
        }
    }

    fn populate(&mut self, graph: &mut Graph, schema: &MovieSchema, args: &Args) -> Result<()> {
        println!("Creating {} people...", args.people);
        let mut people: Vec<ElementId> = Vec::with_capacity(args.people);
        for i in 0..args.people {
            let id = graph.new_node(schema.person)?;
            graph.set_property(id, schema.name, format!("Person{}", i))?;
            graph.set_property(id, schema.born, self.rng.gen_range(1930..2005i32))?;
            people.push(id);
            self.attachment.push(i);
        }

        println!("Creating {} movies...", args.movies);
        for i in 0..args.movies {
            let movie = graph.new_node(schema.movie)?;
            graph.set_property(movie, schema.title, format!("Movie{}", i))?;
            graph.set_property(movie, schema.year, self.rng.gen_range(1950..2024i32))?;

            let director = self.rng.gen_range(0..people.len());
            graph.new_edge(schema.directed, people[director], movie)?;

            let mut cast = HashSet::new();
            let mut attempts = 0;
            while cast.len() < args.cast_size.min(people.len()) && attempts < args.cast_size * 10 {
                cast.insert(self.pick_person(people.len()));
                attempts += 1;
            }
            for actor in cast {
                graph.new_edge(schema.acted_in, people[actor], movie)?;
                self.attachment.push(actor);
            }
        }

        println!("Creating acquaintances...");
        for (i, &person) in people.iter().enumerate() {
            for _ in 0..args.acquaintances {
                let other = self.rng.gen_range(0..people.len());
                if other != i {
                    graph.new_edge(schema.knows, person, people[other])?;
                }
            }
        }

        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    anyhow::ensure!(args.people > 0, "at least one person is required");
    let mut config = Config::from_env()?;
    init_logging(&config.logging);
    if let Some(path) = &args.db_path {
        config.database.path = path.clone();
    }

    std::fs::create_dir_all(&config.database.path)
        .context("Failed to create database directory")?;
    let db = Database::open(config.database.clone())?;
    let mut session = db.session();

    let start = Instant::now();
    session.begin_update()?;
    let mut graph = session.new_graph()?;
    let schema = define_schema(&mut graph)?;

    let mut generator = MovieGenerator::new(args.seed, args.model.clone());
    generator.populate(&mut graph, &schema, &args)?;

    if let Some(path) = &args.export {
        export_to_json(&graph, path, &ExportOptions::default())
            .with_context(|| format!("Failed to export to {}", path.display()))?;
    }

    let id = session.persist(&mut graph)?;
    let nodes = graph.node_count()?;
    let edges = graph.edge_count()?;
    let busiest = graph
        .all_elements_of_type(schema.person)?
        .iter()
        .map(|&p| graph.degree(p, schema.acted_in, Direction::Outgoing).map(|d| (d, p)))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .max();
    session.commit()?;

    println!("\n✅ Data generation complete!");
    println!("Database: {:?}", config.database.path);
    println!("Graph id: {}", id);
    println!("Graph statistics:");
    println!("  - Nodes: {}", nodes);
    println!("  - Edges: {}", edges);
    if let Some((roles, person)) = busiest {
        println!("  - Busiest actor: {} with {} roles", person, roles);
    }
    println!("  - Elapsed: {:.2?}", start.elapsed());

    Ok(())
}
