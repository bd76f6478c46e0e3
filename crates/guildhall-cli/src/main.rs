use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use guildhall::aggregate::aggregate;
use guildhall::rows::RowSet;
use guildhall::scraper::WebScraper;
use guildhall::types::{CommitteesDocument, MemberDocument, MembersDocument, Meta, WardsDocument};
use guildhall::utils::{RosterStats, SeedFilter};
use guildhall::{CrawlConfig, Crawler, DocumentStore};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "guildhall")]
#[command(about = "A City of London members' register scraper", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        short = 'd',
        long = "data-dir",
        default_value = "data",
        global = true,
        help = "Directory holding the member and summary documents"
    )]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, ValueEnum)]
enum SchemaKind {
    Member,
    Members,
    Wards,
    Committees,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl every member listed in the index, then rebuild the summaries
    Crawl {
        #[arg(long, help = "Maximum number of members to crawl")]
        limit: Option<usize>,

        #[arg(long, help = "Number of index rows to skip from the beginning")]
        offset: Option<usize>,

        #[arg(long, help = "Only crawl members of this ward (case-insensitive)")]
        ward: Option<String>,

        #[arg(
            long,
            value_name = "MILLISECONDS",
            help = "Pause between member fetches [default: 1000]"
        )]
        delay_ms: Option<u64>,
    },
    /// Crawl a single member by their UID and save their document
    Member {
        #[arg(help = "The member's UID on the democracy site")]
        id: u32,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Rebuild members.json, wards.json and committees.json from saved member documents
    Aggregate,
    /// Flatten the saved member documents into relational rows
    Rows {
        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "json",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Print the JSON schema of a document
    Schema {
        #[arg(value_enum, help = "Which document to describe")]
        document: SchemaKind,
    },
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn web_scraper() -> WebScraper {
    WebScraper::new().unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let store = DocumentStore::new(&cli.data_dir);

    match cli.command {
        Commands::Crawl {
            limit,
            offset,
            ward,
            delay_ms,
        } => {
            let filter = SeedFilter {
                ward,
                limit,
                offset,
            };

            let filter = filter.validate().unwrap_or_else(|e| {
                log::error!("Invalid args: {e}");
                process::exit(1);
            });

            let mut config = CrawlConfig::default();
            if let Some(ms) = delay_ms {
                config.delay = Duration::from_millis(ms);
            }

            let scraper = web_scraper();
            let mut crawler = Crawler::new(&scraper, &store, config).unwrap_or_else(|e| {
                log::error!("Invalid crawl configuration: {}", e);
                process::exit(1);
            });

            let report = crawler.run(filter).await.unwrap_or_else(|e| {
                log::error!("Crawl failed: {}", e);
                process::exit(1);
            });

            if report.roster.is_empty() {
                println!("No members crawled.");
            } else {
                for (i, member) in report.roster.iter().enumerate() {
                    println!("{:>3}. {}", i + 1, member);
                }
                print!("{}", RosterStats::from_roster(&report.roster));
            }

            if !report.failures.is_empty() {
                println!("\nSkipped:");
                for (id, error) in &report.failures {
                    println!("  #{}: {}", id, error);
                }
            }

            print!("{}", report.summaries);
        }

        Commands::Member { id, format } => {
            let scraper = web_scraper();
            let mut crawler =
                Crawler::new(&scraper, &store, CrawlConfig::default()).unwrap_or_else(|e| {
                    log::error!("Invalid crawl configuration: {}", e);
                    process::exit(1);
                });

            let document = crawler.crawl_single(id).await.unwrap_or_else(|e| {
                log::error!("Error crawling member {}: {}", id, e);
                process::exit(1);
            });

            match format {
                OutputFormat::Json => serialize_json(&document),
                OutputFormat::Text => println!("{}", document),
            }
        }

        Commands::Aggregate => {
            let report = aggregate(&store, &Meta::now()).unwrap_or_else(|e| {
                log::error!("Error aggregating member documents: {}", e);
                process::exit(1);
            });

            print!("{}", report);
        }

        Commands::Rows { format } => {
            let loaded = store.read_members().unwrap_or_else(|e| {
                log::error!("Error reading member documents: {}", e);
                process::exit(1);
            });

            let rows = RowSet::from_documents(&loaded.documents);

            match format {
                OutputFormat::Json => serialize_json(&rows),
                OutputFormat::Text => print!("{}", rows),
            }
        }

        Commands::Schema { document } => {
            let schema = match document {
                SchemaKind::Member => schemars::schema_for!(MemberDocument),
                SchemaKind::Members => schemars::schema_for!(MembersDocument),
                SchemaKind::Wards => schemars::schema_for!(WardsDocument),
                SchemaKind::Committees => schemars::schema_for!(CommitteesDocument),
            };
            serialize_json(&schema);
        }
    }
}
