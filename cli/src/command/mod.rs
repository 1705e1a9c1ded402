//! The CLI surface: `generate` / `check` / `test-isolation` subcommands
//! built strictly on `adya-core`'s public API, plus the generator/nemesis/db
//! collaborators this crate owns.

use crate::config::CliConfig;
use crate::db::SimConn;
use crate::generator::{gen_history, GeneratorOptions};
use crate::nemesis::NoOpNemesis;
use adya_core::checker::check_history;
use adya_core::codec;
use adya_core::dot;
use adya_core::history::HistoryIndex;
use adya_core::log::HistoryElem;
use adya_core::policy::{parse_isolation_level, proscribed_anomalies, IsolationLevel};
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use log::info;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Flags shared by `generate` and `test-isolation`: everything needed to
/// parameterize [`GeneratorOptions`].
#[derive(Args, Debug, Clone)]
pub struct GenFlags {
    #[clap(long = "abort-rate", default_value_t = 0.1)]
    pub abort_rate: f64,

    #[clap(long = "write-rate", default_value_t = 0.5)]
    pub write_rate: f64,

    #[clap(long = "predicate-read-rate", default_value_t = 0.05)]
    pub predicate_read_rate: f64,

    #[clap(long = "connections", default_value_t = 4)]
    pub connections: usize,

    #[clap(long = "objects", default_value_t = 5)]
    pub objects: usize,

    #[clap(long = "transactions", default_value_t = 50)]
    pub transactions: usize,

    #[clap(long = "for-update", default_value_t = false)]
    pub for_update: bool,

    /// Since no real network-speaking `DbConn` is implemented, each entry
    /// only causes one more `SimConn` worker to be spun up rather than an
    /// actual connection to that node.
    #[clap(long = "nodes", value_delimiter = ' ')]
    pub nodes: Vec<String>,
}

impl From<GenFlags> for GeneratorOptions {
    fn from(f: GenFlags) -> Self {
        GeneratorOptions {
            abort_rate: f.abort_rate,
            write_rate: f.write_rate,
            predicate_read_rate: f.predicate_read_rate,
            connections: f.connections.max(f.nodes.len()).max(1),
            objects: f.objects,
            transactions: f.transactions,
            for_update: f.for_update,
        }
    }
}

/// Flags shared by `check` and `test-isolation`: everything about how to
/// report what was found.
#[derive(Args, Debug, Clone)]
pub struct ReportFlags {
    #[clap(long)]
    pub limit: Option<usize>,

    #[clap(long = "full-graph")]
    pub full_graph: bool,

    #[clap(long)]
    pub graph: Option<PathBuf>,

    #[clap(long = "separate-cycles")]
    pub separate_cycles: bool,

    #[clap(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a workload and pickle the resulting history to disk.
    Generate {
        #[clap(long)]
        isolation: Option<String>,

        #[clap(long = "output", short = 'o')]
        output: PathBuf,

        #[clap(flatten)]
        gen: GenFlags,
    },

    /// Load a history and verify it against `--target-isolation`.
    Check {
        #[clap(long = "history")]
        history: PathBuf,

        #[clap(long = "target-isolation")]
        target_isolation: Option<String>,

        #[clap(flatten)]
        report: ReportFlags,
    },

    /// Generate then check in one step.
    TestIsolation {
        #[clap(long = "target-isolation", alias = "isolation")]
        target_isolation: Option<String>,

        #[clap(flatten)]
        gen: GenFlags,

        #[clap(flatten)]
        report: ReportFlags,
    },
}

/// A spinner shown while the generator is driving its workers; `adya`'s
/// generation is synchronous so this doesn't tick during the run, but it
/// gives the operator an immediate "it's doing something" signal and a
/// final transaction count.
fn progress_spinner(transactions: usize) -> indicatif::ProgressBar {
    let bar = indicatif::ProgressBar::new_spinner();
    bar.set_message(format!("generating {transactions} transactions..."));
    bar
}

/// Parses `host:port` entries (`--nodes`) into socket addresses purely for
/// validation/logging — see `GenFlags::nodes`'s doc comment for why they
/// don't drive a real connection.
fn parse_nodes(nodes: &[String]) -> Vec<SocketAddr> {
    nodes.iter().filter_map(|s| s.parse().ok()).collect()
}

fn resolve_isolation(requested: Option<&str>, cfg: &CliConfig) -> Result<IsolationLevel> {
    let raw = requested.or(cfg.default_isolation.as_deref());
    parse_isolation_level(raw).map_err(|e| anyhow::anyhow!(e))
}

fn write_history(path: &PathBuf, elems: &[HistoryElem]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating history file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    codec::encode_stream(&mut writer, elems).context("encoding history")?;
    Ok(())
}

fn read_history(path: &PathBuf) -> Result<Vec<HistoryElem>> {
    let file = File::open(path).with_context(|| format!("opening history file {}", path.display()))?;
    let reader = BufReader::new(file);
    codec::iter_decode(reader).context("decoding history")
}

/// Reports a checked history's anomalies to stdout, and optionally writes
/// DOT graphs per `--graph`/`--full-graph`/`--separate-cycles`.
fn report(hist: &HistoryIndex, level: IsolationLevel, cfg: &CliConfig, report: &ReportFlags) -> Result<()> {
    use colored::Colorize;

    let limit = report.limit.or(cfg.default_limit);
    let anomalies = check_history(hist, level, limit)?;

    if anomalies.is_empty() {
        println!("{}", "Everyone is happy and there are no cycles".green());
    } else {
        println!(
            "{}",
            format!("Found {} anomal{}:", anomalies.len(), if anomalies.len() == 1 { "y" } else { "ies" }).red()
        );
        for anomaly in &anomalies {
            println!("{anomaly}");
        }
    }

    if let Some(graph_path) = &report.graph {
        let dsg = adya_core::checker::build_dsg(hist)?;
        let cyclical = adya_core::taxonomy::cyclical_closure_preimage(proscribed_anomalies(level));

        if report.separate_cycles {
            for (idx, dot_src) in dot::cycles_to_dot(&dsg, &cyclical).into_iter().enumerate() {
                let path = graph_path.with_file_name(format!(
                    "{}-{idx}.dot",
                    graph_path.file_stem().and_then(|s| s.to_str()).unwrap_or("cycle")
                ));
                std::fs::write(&path, dot_src).with_context(|| format!("writing {}", path.display()))?;
            }
        } else {
            let dot_src = dot::to_dot(&dsg, &cyclical, report.full_graph);
            std::fs::write(graph_path, dot_src).with_context(|| format!("writing {}", graph_path.display()))?;
        }
    }

    if anomalies.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("isolation violated: found {} anomalies", anomalies.len());
    }
}

pub fn run(cmd: Command, cfg: &CliConfig) -> Result<()> {
    match cmd {
        Command::Generate { isolation, output, gen } => {
            let _ = resolve_isolation(isolation.as_deref(), cfg)?;
            let nodes = parse_nodes(&gen.nodes);
            if !nodes.is_empty() {
                info!("--nodes given ({} entries); spinning up in-process connections only", nodes.len());
            }
            let opts: GeneratorOptions = gen.into();
            let mut nemesis = NoOpNemesis;
            let spinner = progress_spinner(opts.transactions);
            let history = gen_history(opts, &mut nemesis)?;
            spinner.finish_and_clear();
            write_history(&output, &history)?;
            println!("wrote {} history elements to {}", history.len(), output.display());
            Ok(())
        }

        Command::Check { history, target_isolation, report: report_flags } => {
            let level = resolve_isolation(target_isolation.as_deref(), cfg)?;
            let elems = read_history(&history)?;
            let hist = HistoryIndex::new(elems)?;
            report(&hist, level, cfg, &report_flags)
        }

        Command::TestIsolation { target_isolation, gen, report: report_flags } => {
            let level = resolve_isolation(target_isolation.as_deref(), cfg)?;
            let nodes = parse_nodes(&gen.nodes);
            if !nodes.is_empty() {
                info!("--nodes given ({} entries); spinning up in-process connections only", nodes.len());
            }
            let opts: GeneratorOptions = gen.into();
            let mut nemesis = NoOpNemesis;
            let spinner = progress_spinner(opts.transactions);
            let history = gen_history(opts, &mut nemesis)?;
            spinner.finish_and_clear();
            let hist = HistoryIndex::new(history)?;
            report(&hist, level, cfg, &report_flags)
        }
    }
}

/// Exercises a single `SimConn` roundtrip with no generator involved, used
/// by `adya-cli`'s own tests to pin the reference `DbConn`'s semantics.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{new_store, DbConn, Statement};

    #[test]
    fn sim_conn_write_then_read_roundtrip() {
        let store = new_store();
        let mut conn = SimConn::new(store);
        conn.execute(&Statement::Write { table: "tab".into(), object: 0, value: 0 }).unwrap();
        conn.execute(&Statement::Write { table: "tab".into(), object: 0, value: 7 }).unwrap();
        let rows = conn
            .execute(&Statement::Read { table: "tab".into(), object: 0 })
            .unwrap()
            .expect("read returns rows");
        match &rows[0][1] {
            crate::db::ColumnValue::Text(s) => assert_eq!(s, "0,7"),
            _ => panic!("expected text column"),
        }
    }
}
