//! Movie sample: schema, data, a two-director cast query, then persist and
//! reopen in a read session.
//!
//! Run with `cargo run --example movies`.

use anyhow::{Context, Result};
use rust_property_graph::config::{init_logging, Config};
use rust_property_graph::{intersect, Database, Direction, IndexKind, Value, ValueKind};

fn main() -> Result<()> {
    let mut config = Config::from_env()?;
    init_logging(&config.logging);
    if std::env::var("GRAPH_DB_PATH").is_err() {
        config.database.path = std::env::temp_dir().join("property-graph-movies");
    }
    if config.database.path.exists() {
        std::fs::remove_dir_all(&config.database.path)
            .context("Failed to remove database from a prior run")?;
    }

    let db = Database::open(config.database.clone())?;

    let graph_id = {
        let mut session = db.session();
        session.begin_update()?;
        let mut g = session.new_graph()?;

        // SCHEMA
        let movie_type = g.define_node_type("MOVIE")?;
        let movie_id =
            g.define_property(movie_type, "ID", ValueKind::Long, IndexKind::Unique)?;
        let movie_title =
            g.define_property(movie_type, "TITLE", ValueKind::Text, IndexKind::Indexed)?;
        let movie_year =
            g.define_property(movie_type, "YEAR", ValueKind::Integer, IndexKind::Indexed)?;

        let people_type = g.define_node_type("PEOPLE")?;
        let people_id =
            g.define_property(people_type, "ID", ValueKind::Long, IndexKind::Unique)?;
        let people_name =
            g.define_property(people_type, "NAME", ValueKind::Text, IndexKind::Indexed)?;

        let cast_type = g.define_edge_type("CAST", false, None)?;
        let cast_character =
            g.define_property(cast_type, "CHARACTER", ValueKind::Text, IndexKind::Basic)?;

        let directs_type = g.define_edge_type("DIRECTS", true, Some((people_type, movie_type)))?;

        // DATA
        let mut movie = |id: i64, title: &str, year: i32| -> Result<_> {
            let m = g.new_node(movie_type)?;
            g.set_property(m, movie_id, id)?;
            g.set_property(m, movie_title, title)?;
            g.set_property(m, movie_year, year)?;
            Ok(m)
        };
        let m_lost_in_translation = movie(1, "Lost in Translation", 2003)?;
        let m_vicky_cb = movie(2, "Vicky Cristina Barcelona", 2008)?;
        let m_manhattan = movie(3, "Manhattan", 1979)?;

        let mut person = |id: i64, name: &str| -> Result<_> {
            let p = g.new_node(people_type)?;
            g.set_property(p, people_id, id)?;
            g.set_property(p, people_name, name)?;
            Ok(p)
        };
        let p_scarlett = person(1, "Scarlett Johansson")?;
        let p_bill = person(2, "Bill Murray")?;
        let p_sofia = person(3, "Sofia Coppola")?;
        let p_woody = person(4, "Woody Allen")?;
        let p_penelope = person(5, "Penélope Cruz")?;
        let p_diane = person(6, "Diane Keaton")?;

        for (m, p, character) in [
            (m_lost_in_translation, p_scarlett, "Charlotte"),
            (m_lost_in_translation, p_bill, "Bob Harris"),
            (m_vicky_cb, p_scarlett, "Cristina"),
            (m_vicky_cb, p_penelope, "Maria Elena"),
            (m_manhattan, p_diane, "Mary"),
            (m_manhattan, p_woody, "Isaac"),
        ] {
            let edge = g.new_edge(cast_type, m, p)?;
            g.set_property(edge, cast_character, character)?;
        }

        g.new_edge(directs_type, p_sofia, m_lost_in_translation)?;
        g.new_edge(directs_type, p_woody, m_vicky_cb)?;
        g.new_edge(directs_type, p_woody, m_manhattan)?;

        // QUERIES
        let directed_by_woody = g.neighbors(p_woody, directs_type, Direction::Outgoing)?;
        let cast_directed_by_woody =
            g.neighbors_of_set(&directed_by_woody, cast_type, Direction::Any)?;

        let directed_by_sofia = g.neighbors(p_sofia, directs_type, Direction::Outgoing)?;
        let cast_directed_by_sofia =
            g.neighbors_of_set(&directed_by_sofia, cast_type, Direction::Any)?;

        // People who acted in movies directed by Woody AND in movies directed by Sofia
        let cast_from_both = intersect(&cast_directed_by_woody, &cast_directed_by_sofia);
        for p in cast_from_both.to_sorted_vec() {
            if let Some(name) = g.get_property(p, people_name)?.and_then(Value::as_text) {
                println!("Hello {}", name);
            }
        }

        let id = session.persist(&mut g)?;
        session.commit()?;
        id
    };

    let mut session = db.session();
    session.begin_read()?;
    let g = session.open(graph_id)?;
    let people_type = g.find_node_type("PEOPLE")?;
    let people_name = g.find_property_type(people_type, "NAME")?;
    let woody = g.find_by_indexed(people_name, "Woody Allen")?;
    println!(
        "Reopened graph {}: {} nodes, {} edges, Woody Allen is {:?}",
        graph_id,
        g.node_count()?,
        g.edge_count()?,
        woody.to_sorted_vec()
    );
    session.commit()?;

    Ok(())
}
