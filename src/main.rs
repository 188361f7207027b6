use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use era_resolve::error::{ResolveError, Result};
use era_resolve::ganzhi::{ganzhi_name, jdn_to_gz};
use era_resolve::julian::jdn_to_iso;
use era_resolve::loader::{load_tables, read_json};
use era_resolve::normalise::{TaggedDate, normalise_all};
use era_resolve::{Civilization, DateResolver, ImpliedContext, RunParams};

#[derive(Parser)]
#[command(name = "era_resolve", about = "East-Asian historical date resolver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve tagged dates → resolved rows + final implied context (JSON)
    Resolve {
        /// Reference table directory
        #[arg(long)]
        tables: PathBuf,
        /// Run parameters file (JSON); flags below override it
        #[arg(long)]
        params: Option<PathBuf>,
        /// Implied context to start from, e.g. the output of a previous batch
        #[arg(long)]
        implied: Option<PathBuf>,
        #[arg(long)]
        tpq: Option<i32>,
        #[arg(long)]
        taq: Option<i32>,
        /// Civilisations in play, e.g. "c,j,k"
        #[arg(long, value_delimiter = ',', value_parser = parse_civilization)]
        civ: Vec<Civilization>,
        #[arg(long)]
        proleptic: bool,
        /// Solve every date on its own, without carried context
        #[arg(long)]
        no_sequential: bool,
        /// Search the lunar tables for dates with no dynasty, ruler or era
        #[arg(long)]
        proliferate: bool,
        /// Write here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Tagged dates (JSON array)
        input: PathBuf,
    },
    /// Print the civil date and sexagenary day of a Julian Day Number
    Jdn {
        jdn: i64,
        #[arg(long)]
        proleptic: bool,
    },
    /// Load a table directory and report its size
    Tables { dir: PathBuf },
}

fn parse_civilization(s: &str) -> std::result::Result<Civilization, String> {
    Civilization::from_code(s).ok_or_else(|| format!("unknown civilisation: {s} (expected c, j or k)"))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Resolve {
            tables,
            params,
            implied,
            tpq,
            taq,
            civ,
            proleptic,
            no_sequential,
            proliferate,
            output,
            input,
        } => {
            let overrides = Overrides {
                tpq,
                taq,
                civ,
                proleptic,
                no_sequential,
                proliferate,
            };
            run_resolve(&tables, params.as_deref(), implied.as_deref(), overrides, &input, output.as_deref())
        }
        Command::Jdn { jdn, proleptic } => {
            run_jdn(jdn, proleptic);
            Ok(())
        }
        Command::Tables { dir } => run_tables(&dir),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  OUTPUT HELPERS
// ═══════════════════════════════════════════════════════════════════════

/// Pretty JSON to `path`, or stdout when no path is given.
fn write_json<T: serde::Serialize>(path: Option<&Path>, data: &T) -> Result<()> {
    let target = path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("<stdout>"));
    let json = serde_json::to_string_pretty(data).map_err(|source| ResolveError::Json {
        path: target.clone(),
        source,
    })?;
    match path {
        Some(p) => {
            std::fs::write(p, &json).map_err(|source| ResolveError::Io { path: target, source })?;
            info!(path = %p.display(), bytes = json.len(), "written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
//  RESOLVE MODE
// ═══════════════════════════════════════════════════════════════════════

struct Overrides {
    tpq: Option<i32>,
    taq: Option<i32>,
    civ: Vec<Civilization>,
    proleptic: bool,
    no_sequential: bool,
    proliferate: bool,
}

impl Overrides {
    fn apply(self, mut params: RunParams) -> RunParams {
        if let Some(y) = self.tpq {
            params.tpq = y;
        }
        if let Some(y) = self.taq {
            params.taq = y;
        }
        if !self.civ.is_empty() {
            params.civilizations = self.civ;
        }
        params.proleptic_gregorian |= self.proleptic;
        params.sequential &= !self.no_sequential;
        params.proliferate |= self.proliferate;
        params
    }
}

fn run_resolve(
    table_dir: &Path,
    params_path: Option<&Path>,
    implied_path: Option<&Path>,
    overrides: Overrides,
    input: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let tables = load_tables(table_dir)?;
    let params = match params_path {
        Some(p) => read_json(p)?,
        None => RunParams::default(),
    };
    let params = overrides.apply(params);
    let implied: ImpliedContext = match implied_path {
        Some(p) => read_json(p)?,
        None => ImpliedContext::default(),
    };

    let dates: Vec<TaggedDate> = read_json(input)?;
    let tokens = normalise_all(&dates);
    info!(dates = tokens.len(), "tagged dates read");

    let resolution = DateResolver::new(&tables, params).resolve(&tokens, implied);
    write_json(output, &resolution)
}

// ═══════════════════════════════════════════════════════════════════════
//  JDN MODE
// ═══════════════════════════════════════════════════════════════════════

fn run_jdn(jdn: i64, proleptic: bool) {
    let start = RunParams::default().gregorian_start;
    let gz = jdn_to_gz(jdn);
    println!(
        "{}\t{}\t{}",
        jdn_to_iso(jdn, proleptic, start),
        gz,
        ganzhi_name(gz).unwrap_or_default()
    );
}

// ═══════════════════════════════════════════════════════════════════════
//  TABLES MODE
// ═══════════════════════════════════════════════════════════════════════

fn run_tables(dir: &Path) -> Result<()> {
    let summary = load_tables(dir)?.summary();
    println!(
        "{} dynasties, {} rulers, {} eras, {} lunar years",
        summary.dynasties, summary.rulers, summary.eras, summary.lunar_years
    );
    Ok(())
}
