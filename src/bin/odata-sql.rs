//! odata-sql: translate OData query options from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Full translation
//! odata-sql translate "\$filter=products/any(p: p/name eq 'test')"
//!
//! # Only the WHERE clause, with a partition predicate
//! odata-sql translate "\$filter=id eq 1" --clauses where --where "c._t = 'doc'"
//!
//! # Show the parsed tree
//! odata-sql explain "\$filter=group/id eq 'x'"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use odata_sql::config::FunctionMapping;
use odata_sql::prelude::*;
use odata_sql::transpiler::KeywordEscaper;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "odata-sql")]
#[command(version)]
#[command(about = "Translate OData query options into document-store SQL", long_about = None)]
#[command(after_help = "EXAMPLES:
    odata-sql translate '$select=id, name&$top=10'
    odata-sql translate '$filter=tags/any(t: t eq 1)' --clauses where --json
    odata-sql explain \"$filter=startswith(toupper(name),'A')\"
    odata-sql keywords --config ./odata-sql.toml")]
struct Cli {
    /// Log translation decisions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a query string into SQL
    Translate {
        /// The OData query string ($filter=...&$orderby=...)
        query: String,

        /// Clauses to emit
        #[arg(short, long, default_value = "all")]
        clauses: String,

        /// Extra predicate ANDed with the filter
        #[arg(short, long = "where")]
        extra_where: Option<String>,

        /// Dialect configuration file
        #[arg(long, env = "ODATA_SQL_CONFIG")]
        config: Option<PathBuf>,

        /// Print the clause parts as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the parsed tree and its translation
    Explain {
        /// The OData query string
        query: String,

        /// Dialect configuration file
        #[arg(long, env = "ODATA_SQL_CONFIG")]
        config: Option<PathBuf>,
    },
    /// List reserved keywords and function mappings
    Keywords {
        /// Dialect configuration file
        #[arg(long, env = "ODATA_SQL_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Translate {
            query,
            clauses,
            extra_where,
            config,
            json,
        } => run_translate(query, clauses, extra_where.as_deref(), config.as_deref(), *json),
        Commands::Explain { query, config } => run_explain(query, config.as_deref()),
        Commands::Keywords { config } => run_keywords(config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "odata_sql=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<DialectConfig> {
    match path {
        Some(path) => DialectConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => DialectConfig::load_or_default().context("Failed to load discovered config"),
    }
}

fn run_translate(
    query: &str,
    clauses: &str,
    extra_where: Option<&str>,
    config: Option<&Path>,
    json: bool,
) -> Result<()> {
    let clauses: TranslateOptions = clauses.parse()?;
    let options = parse_query(query)?;
    let translator = Translator::with_config(load_config(config)?);
    let parts = translator.translate_parts(&options, clauses, extra_where);
    let search = options
        .search
        .as_ref()
        .map(|node| translator.translate_search(node));
    if search.is_some() {
        tracing::warn!("$search has no SQL clause; its translation is reported separately");
    }

    if json {
        let mut value = serde_json::to_value(&parts)?;
        if let Some(search) = &search {
            value["search"] = json!(search);
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", parts.to_string().white());
    if let Some(limit) = parts.item_limit {
        println!("{} {}", "Item limit:".dimmed(), limit.to_string().cyan());
    }
    if let Some(search) = search {
        println!("{} {}", "Search:".yellow(), search.white());
    }
    Ok(())
}

fn run_explain(query: &str, config: Option<&Path>) -> Result<()> {
    println!("{}", "OData Query Explanation".cyan().bold());
    println!();
    println!("{} {}", "Query:".dimmed(), query.yellow());
    println!();

    let options = parse_query(query)?;
    let translator = Translator::with_config(load_config(config)?);

    let tree = json!({
        "filter": options.filter,
        "orderby": options.order_by,
        "select": options.select_fields(),
        "top": options.top,
        "search": options.search,
    });
    println!("{}", "Parsed Structure:".green().bold());
    println!("{}", serde_json::to_string_pretty(&tree)?);

    let parts = translator.translate_parts(&options, TranslateOptions::ALL, None);
    if !parts.joins.is_empty() {
        println!();
        println!("{}", "Joins:".green().bold());
        for join in &parts.joins {
            println!("  {} {} {}", join.alias.cyan(), "IN".dimmed(), join.source.white());
        }
    }

    println!();
    println!("{}", "Generated SQL:".green().bold());
    println!("  {}", parts.to_string().white());

    if let Some(search) = &options.search {
        println!();
        println!("{}", "Search:".green().bold());
        println!("  {}", translator.translate_search(search).white());
    }
    Ok(())
}

fn run_keywords(config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;

    println!(
        "{} {}",
        "Reserved keywords".white().bold(),
        if config.keywords_case_insensitive {
            "(case-insensitive)".dimmed()
        } else {
            "(case-sensitive)".dimmed()
        }
    );
    let escaper = KeywordEscaper::from_config(&config);
    for word in &config.reserved_keywords {
        let example = escaper.escape_path(&format!("{}.{}.id", config.root_alias, word));
        println!("  {:16} {}", word.cyan(), example.dimmed());
    }

    println!();
    println!("{:16} {}", "Function".white().bold(), "Dialect".white().bold());
    println!("{}", "─".repeat(40).dimmed());
    for (name, mapping) in &config.functions {
        let spelling = match mapping {
            FunctionMapping::Name(target) => format!("{}(..)", target),
            FunctionMapping::Nested(chain) => {
                format!("{}(..{}", chain.join("("), ")".repeat(chain.len()))
            }
        };
        println!("{:16} {}", name.yellow(), spelling);
    }

    if !config.case_insensitive_functions.is_empty() {
        println!();
        println!(
            "{} {} {} {}",
            "Case-insensitive:".dimmed(),
            config.case_insensitive_functions.join(", ").cyan(),
            "folding".dimmed(),
            config.case_fold_functions.join(", ").cyan()
        );
    }
    Ok(())
}
