use crate::{
    commands::{Commands, SqlDialect, StoreArgs},
    error::CliError,
    fixtures::{DataSet, load_assignments, load_filter, load_json},
};
use clap::Parser;
use connectors::{Adapter, OrderBy, SortOrder};
use engine_core::{EngineConfig, FindManyArgs, QueryEngine, UpdateManyOperation};
use model::{filter::document::bind_assignments, schema::Schema};
use planner::{
    filter::{compiler::FilterCompiler, sql::SqlFilterCompiler},
    predicate::compile_filter,
    query::{
        dialect::{Dialect, Postgres, Sqlite},
        renderer::render,
    },
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod fixtures;
mod output;

#[derive(Parser)]
#[command(name = "filterc", version = "0.1.0", about = "Query filter compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            schema,
            entity,
            filter,
            dialect,
        } => {
            let schema: Schema = load_json(&schema)?;
            let filter = load_filter(Some(filter.as_path()), &schema, &entity)?;
            let predicate = compile_filter(&schema, &entity, &filter)?;

            let dialect: &dyn Dialect = match dialect {
                SqlDialect::Sqlite => &Sqlite,
                SqlDialect::Postgres => &Postgres,
            };
            let (sql, params) = render(&SqlFilterCompiler::compile(&predicate), dialect);

            println!("predicate: {predicate}");
            println!("sql:       {sql}");
            for (i, param) in params.iter().enumerate() {
                println!("  {} = {param}", dialect.get_placeholder(i));
            }
        }
        Commands::Find {
            store,
            order_by,
            skip,
            take,
        } => {
            let engine = open_engine(&store).await?;
            let filter = load_filter(store.filter.as_deref(), engine.schema(), &store.entity)?;
            let args = FindManyArgs {
                filter: Some(filter),
                order_by: order_by
                    .iter()
                    .map(|key| parse_order_by(key))
                    .collect::<Result<_, _>>()?,
                skip,
                take,
            };
            let rows = engine.find_many(&store.entity, args).await?;
            output::print_rows(&rows)?;
        }
        Commands::Count { store } => {
            let engine = open_engine(&store).await?;
            let filter = load_filter(store.filter.as_deref(), engine.schema(), &store.entity)?;
            println!("{}", engine.count(&store.entity, &filter).await?);
        }
        Commands::UpdateMany { store, set } => {
            let engine = open_engine(&store).await?;
            let filter = load_filter(store.filter.as_deref(), engine.schema(), &store.entity)?;
            let entity = engine.schema().resolve_entity(&store.entity)?;
            let data = load_assignments(&set, entity)?;

            let op = UpdateManyOperation::new(&store.entity, filter, data);
            let affected = engine.update_many(op).await?;
            println!("{affected}");
        }
    }

    Ok(())
}

/// Builds an engine over the requested backend and loads the seed rows.
async fn open_engine(args: &StoreArgs) -> Result<QueryEngine, CliError> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    }
    .apply_env()?;

    let schema: Arc<Schema> = Arc::new(load_json(&args.schema)?);
    let adapter = Adapter::open(
        args.backend,
        Arc::clone(&schema),
        args.db.as_deref(),
        &config.sqlite,
    )?;
    info!(backend = %adapter.kind(), "Opened storage");

    let engine = QueryEngine::new(Arc::clone(&schema), adapter.storage(), config);

    if let Some(path) = &args.data {
        let data: DataSet = load_json(path)?;
        for (entity_name, rows) in &data {
            let entity = schema.resolve_entity(entity_name)?;
            for row in rows {
                engine
                    .create(entity_name, bind_assignments(entity, row)?)
                    .await?;
            }
            info!(entity = %entity_name, rows = rows.len(), "Loaded rows");
        }
    }

    Ok(engine)
}

fn parse_order_by(key: &str) -> Result<OrderBy, CliError> {
    let (field, order) = match key.split_once(':') {
        Some((field, "asc")) => (field, SortOrder::Asc),
        Some((field, "desc")) => (field, SortOrder::Desc),
        Some(_) => return Err(CliError::InvalidOrderBy(key.to_string())),
        None => (key, SortOrder::Asc),
    };
    if field.is_empty() {
        return Err(CliError::InvalidOrderBy(key.to_string()));
    }
    Ok(OrderBy {
        field: field.to_string(),
        order,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_order_by() {
        assert_eq!(parse_order_by("date").unwrap(), OrderBy::asc("date"));
        assert_eq!(parse_order_by("date:desc").unwrap(), OrderBy::desc("date"));
        assert!(parse_order_by("date:sideways").is_err());
        assert!(parse_order_by(":asc").is_err());
    }
}
