//! Mapkit CLI - run named CSV mappings declared in a manifest
//!
//! # Commands
//!
//! ```bash
//! mapkit import Address address addresses.csv     # Import through a mapping
//! mapkit export Address address out.csv           # Export through a mapping
//! mapkit export Address address out.csv --where state=MH --order-by zip_code --limit 10
//! ```
//!
//! # Inspection
//!
//! ```bash
//! mapkit columns Address       # Default columns of a class
//! mapkit mappings Address      # Declared import/export mappings
//! mapkit operations            # Operations usable in manifest hooks
//! mapkit capabilities          # Capabilities a manifest can attach
//! ```
//!
//! Classes come from the manifest (`--manifest`, default `mapkit.json`);
//! records live in one JSON file per class under the store directory.

use clap::{Parser, Subcommand};
use mapkit::{
    operations_description, Catalog, Criteria, DocumentClass, EngineConfig, JsonStore, Manifest,
    SortOrder, STANDARD_LOADER,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mapkit")]
#[command(
    about = "Import and export document classes through named CSV mappings",
    long_about = None
)]
struct Cli {
    /// Manifest declaring classes and mappings
    #[arg(long, global = true, default_value = mapkit::manifest::DEFAULT_MANIFEST)]
    manifest: PathBuf,

    /// Directory holding the JSON stores (overrides MAPKIT_STORE_DIR)
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Records per export batch (overrides MAPKIT_BATCH_SIZE)
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a CSV file through an import mapping
    Import {
        /// Class name
        class: String,
        /// Import mapping name
        mapping: String,
        /// Input CSV file
        input: PathBuf,
    },

    /// Export records through an export mapping
    Export {
        /// Class name
        class: String,
        /// Export mapping name
        mapping: String,
        /// Output CSV file
        output: PathBuf,

        /// Equality filter, `field=value` (repeatable)
        #[arg(long = "where")]
        filters: Vec<String>,

        /// Sort by this field
        #[arg(long)]
        order_by: Option<String>,

        /// Sort descending
        #[arg(long, requires = "order_by")]
        desc: bool,

        /// Export at most this many records
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the default columns of a class
    Columns {
        /// Class name
        class: String,
    },

    /// List the mappings of a class
    Mappings {
        /// Class name
        class: String,
    },

    /// Show available hook operations
    Operations,

    /// List attachable capabilities
    Capabilities,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = EngineConfig::from_env()?;
    if let Some(dir) = cli.store_dir {
        config.store_dir = dir;
    }
    if let Some(size) = cli.batch_size {
        config.batch_size = size.max(1);
    }

    match cli.command {
        Commands::Import {
            class,
            mapping,
            input,
        } => {
            let catalog = load_catalog(&cli.manifest, &config)?;
            cmd_import(catalog.class(&class)?, &mapping, &input, &config)
        }

        Commands::Export {
            class,
            mapping,
            output,
            filters,
            order_by,
            desc,
            limit,
        } => {
            let catalog = load_catalog(&cli.manifest, &config)?;
            let class = catalog.class(&class)?;
            let criteria = build_criteria(class, &filters, order_by, desc, limit)?;
            cmd_export(class, &mapping, &output, criteria, &config)
        }

        Commands::Columns { class } => {
            let catalog = load_catalog(&cli.manifest, &config)?;
            cmd_columns(catalog.class(&class)?)
        }

        Commands::Mappings { class } => {
            let catalog = load_catalog(&cli.manifest, &config)?;
            cmd_mappings(catalog.class(&class)?)
        }

        Commands::Operations => {
            println!("{}", operations_description());
            Ok(())
        }

        Commands::Capabilities => {
            for name in STANDARD_LOADER.names() {
                println!("{}", name);
            }
            Ok(())
        }
    }
}

fn load_catalog(path: &Path, config: &EngineConfig) -> Result<Catalog, Box<dyn std::error::Error>> {
    let catalog = Manifest::load(path)?.build(config)?;
    eprintln!("📋 Manifest: {} ({} classes)", path.display(), catalog.len());
    Ok(catalog)
}

fn cmd_import(
    class: &DocumentClass,
    mapping: &str,
    input: &Path,
    config: &EngineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📥 Importing: {} → {} ({})", input.display(), class.name(), mapping);

    let mut store = JsonStore::open(&config.store_dir, class.schema().clone())?;
    let before = store.len();
    let result = class.import_via(mapping, input, &mut store);

    // Records created before a failure are kept.
    if store.len() > before {
        store.save()?;
        eprintln!("   💾 Store: {} ({} records)", store.path().display(), store.len());
    }

    let summary = result?;
    eprintln!("✅ {}", summary.summary());
    Ok(())
}

fn cmd_export(
    class: &DocumentClass,
    mapping: &str,
    output: &Path,
    criteria: Criteria,
    config: &EngineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📤 Exporting: {} ({}) → {}", class.name(), mapping, output.display());

    let store = JsonStore::open(&config.store_dir, class.schema().clone())?;
    eprintln!("   {} stored records", store.len());

    let summary = class.export_via(mapping, output, &store, Some(criteria))?;
    eprintln!("✅ {}", summary.summary());
    Ok(())
}

fn cmd_columns(class: &DocumentClass) -> Result<(), Box<dyn std::error::Error>> {
    for column in class.resolve_default_columns(None) {
        let kind = class
            .schema()
            .get(&column.field)
            .map(|f| f.kind.as_str())
            .unwrap_or("unknown");
        println!("{}\t{}", column.field, kind);
    }
    Ok(())
}

fn cmd_mappings(class: &DocumentClass) -> Result<(), Box<dyn std::error::Error>> {
    let registry = class.mappings()?;

    for mapping in registry.imports() {
        println!("import\t{}\t{}", mapping.name, mapping.columns.join(","));
    }
    for mapping in registry.exports() {
        println!("export\t{}\t{}", mapping.name, mapping.columns.join(","));
    }
    Ok(())
}

/// Build export criteria. Filter values are coerced through the field kind
/// so they compare equal to stored values.
fn build_criteria(
    class: &DocumentClass,
    filters: &[String],
    order_by: Option<String>,
    desc: bool,
    limit: Option<usize>,
) -> Result<Criteria, Box<dyn std::error::Error>> {
    let mut criteria = Criteria::all();

    for filter in filters {
        let (field, raw) = filter
            .split_once('=')
            .ok_or_else(|| format!("Invalid filter '{}', expected field=value", filter))?;
        let descriptor = class
            .schema()
            .get(field)
            .ok_or_else(|| format!("Unknown field '{}' in filter", field))?;
        let value = descriptor.kind.coerce(field, Value::String(raw.to_string()))?;
        criteria = criteria.where_eq(field, value);
    }

    if let Some(field) = order_by {
        let order = if desc {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        };
        criteria = criteria.order_by(field, order);
    }
    if let Some(limit) = limit {
        criteria = criteria.limit(limit);
    }

    Ok(criteria)
}
