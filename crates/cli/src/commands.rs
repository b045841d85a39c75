use clap::{Args, Subcommand, ValueEnum};
use connectors::BackendKind;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a filter and print the predicate and its SQL rendering
    Compile {
        #[arg(long, help = "Schema file path (JSON)")]
        schema: PathBuf,

        #[arg(long, help = "Entity the filter applies to")]
        entity: String,

        #[arg(long, help = "Filter document path (JSON)")]
        filter: PathBuf,

        #[arg(long, value_enum, default_value_t = SqlDialect::Sqlite)]
        dialect: SqlDialect,
    },
    /// Print the rows matching a filter as JSON
    Find {
        #[command(flatten)]
        store: StoreArgs,

        #[arg(long, help = "Sort key as <field>[:asc|:desc]; repeatable")]
        order_by: Vec<String>,

        #[arg(long, default_value_t = 0)]
        skip: usize,

        #[arg(long)]
        take: Option<usize>,
    },
    /// Print the number of rows matching a filter
    Count {
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Apply a data payload to every row matching a filter
    UpdateMany {
        #[command(flatten)]
        store: StoreArgs,

        #[arg(long, help = "Data payload path (JSON object of field values)")]
        set: PathBuf,
    },
}

#[derive(Args)]
pub struct StoreArgs {
    #[arg(long, help = "Schema file path (JSON)")]
    pub schema: PathBuf,

    #[arg(long, help = "Rows to load before running, keyed by entity (JSON)")]
    pub data: Option<PathBuf>,

    #[arg(long, help = "Entity the filter applies to")]
    pub entity: String,

    #[arg(long, help = "Filter document path (JSON); matches every row when omitted")]
    pub filter: Option<PathBuf>,

    #[arg(long, default_value_t = BackendKind::Memory, help = "Backend: memory or sqlite")]
    pub backend: BackendKind,

    #[arg(long, help = "SQLite database file; in-memory when omitted")]
    pub db: Option<PathBuf>,

    #[arg(long, help = "Engine config file path (JSON)")]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SqlDialect {
    Sqlite,
    Postgres,
}
