use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "newshub")]
#[command(about = "News aggregator: collect feeds, query cached listings")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every source, store new items and purge cached listings
    Collect,

    /// List news from the given sources, newest first
    News {
        /// Source name to include (repeatable)
        #[arg(short, long = "source", required = true)]
        sources: Vec<String>,

        /// Page number, starting at 1
        #[arg(short, long, allow_negative_numbers = true)]
        page: Option<i64>,

        /// Items per page (1-100, default 20)
        #[arg(short, long, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// List source names that have stored news
    Tags,

    /// Delete news older than the retention window
    Prune {
        /// Retention window in days (defaults to NEWSHUB_RETENTION_DAYS)
        #[arg(long)]
        days: Option<i64>,
    },

    /// Manage feed sources
    Source {
        #[command(subcommand)]
        command: SourceCommands,
    },
}

#[derive(Subcommand)]
pub enum SourceCommands {
    /// Register a feed source
    Add {
        /// Display name, stored with every item from this feed
        name: String,

        /// Feed URL (RSS, Atom or JSON Feed)
        url: String,

        /// Free-form tags
        #[arg(short, long)]
        tags: Option<String>,
    },

    /// List sources
    List {
        /// Page number, starting at 1
        #[arg(short, long)]
        page: Option<u64>,

        /// Sources per page
        #[arg(short, long, default_value_t = 50)]
        limit: u64,
    },

    /// Remove a source by id
    Remove {
        id: i64,
    },

    /// Import sources from OPML file
    Import {
        /// Path to OPML file
        path: String,
    },

    /// Export sources to OPML format
    Export {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}
