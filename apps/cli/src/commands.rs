//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use url::Url;
use vendorwatch_core::{
    ProgressReporter, RunOptions, RunRequest, StageContext, run_pipeline,
};
use vendorwatch_fetch::{HttpFetcher, HttpUploader, LocalNotesStore, TranscriptConfig};
use vendorwatch_model::OpenRouterClient;
use vendorwatch_shared::{
    AppConfig, SynthesisDepth, VendorProfile, config_file_path, db_path, expand_home, init_config,
    load_config, validate_api_key,
};
use vendorwatch_storage::Storage;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Vendorwatch — automated competitive intelligence for product teams.
#[derive(Parser)]
#[command(
    name = "vendorwatch",
    version,
    about = "Collect vendor signal, synthesize intelligence, and track what changed.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the intelligence pipeline for a set of vendors.
    Run {
        /// Vendor names to analyze (comma-separated or repeated).
        #[arg(long, value_delimiter = ',', required = true)]
        vendors: Vec<String>,

        /// The research focus steering the synthesis.
        #[arg(long)]
        query: String,

        /// Synthesis depth: standard or deep (defaults to config).
        #[arg(long)]
        depth: Option<String>,

        /// Scrapbook directory (defaults to config).
        #[arg(long)]
        notes_dir: Option<String>,

        /// Write the report markdown to this file instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Manage the vendor registry.
    Vendor {
        #[command(subcommand)]
        action: VendorAction,
    },

    /// Browse persisted reports.
    Reports {
        #[command(subcommand)]
        action: ReportsAction,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Vendor registry subcommands.
#[derive(Subcommand)]
pub(crate) enum VendorAction {
    /// Register a new vendor.
    Add {
        /// Vendor name (the key every run correlates on).
        name: String,

        /// Marketing site URL.
        #[arg(long)]
        website: Option<String>,

        /// Blog URL.
        #[arg(long)]
        blog: Option<String>,

        /// Product docs URL.
        #[arg(long)]
        docs: Option<String>,

        /// Changelog URL.
        #[arg(long)]
        changelog: Option<String>,

        /// Video channel handle or id.
        #[arg(long)]
        channel: Option<String>,
    },

    /// List registered vendors.
    List,

    /// Update a vendor's sources (only the provided flags change).
    Update {
        name: String,

        #[arg(long)]
        website: Option<String>,

        #[arg(long)]
        blog: Option<String>,

        #[arg(long)]
        docs: Option<String>,

        #[arg(long)]
        changelog: Option<String>,

        #[arg(long)]
        channel: Option<String>,
    },

    /// Remove a vendor from the registry.
    Remove { name: String },
}

/// Report browsing subcommands.
#[derive(Subcommand)]
pub(crate) enum ReportsAction {
    /// List persisted reports, most recent first.
    List,

    /// Print one report's markdown.
    Show { id: String },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "vendorwatch=info",
        1 => "vendorwatch=debug",
        _ => "vendorwatch=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            vendors,
            query,
            depth,
            notes_dir,
            out,
        } => cmd_run(vendors, &query, depth.as_deref(), notes_dir.as_deref(), out).await,
        Command::Vendor { action } => match action {
            VendorAction::Add {
                name,
                website,
                blog,
                docs,
                changelog,
                channel,
            } => cmd_vendor_add(&name, website, blog, docs, changelog, channel).await,
            VendorAction::List => cmd_vendor_list().await,
            VendorAction::Update {
                name,
                website,
                blog,
                docs,
                changelog,
                channel,
            } => cmd_vendor_update(&name, website, blog, docs, changelog, channel).await,
            VendorAction::Remove { name } => cmd_vendor_remove(&name).await,
        },
        Command::Reports { action } => match action {
            ReportsAction::List => cmd_reports_list().await,
            ReportsAction::Show { id } => cmd_reports_show(&id).await,
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

/// Stage-by-stage progress shown as an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn stage(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

async fn cmd_run(
    vendors: Vec<String>,
    query: &str,
    depth: Option<&str>,
    notes_dir: Option<&str>,
    out: Option<PathBuf>,
) -> Result<()> {
    let config = load_config()?;
    validate_api_key(&config)?;

    let depth = match depth {
        Some(raw) => raw
            .parse::<SynthesisDepth>()
            .map_err(|e| eyre!("invalid --depth: {e}"))?,
        None => config.defaults.depth,
    };

    let storage = Storage::open(&db_path(&config)).await?;

    let api_key = std::env::var(&config.openrouter.api_key_env).unwrap_or_default();
    let model = OpenRouterClient::new(api_key, config.openrouter.default_model.clone())?;

    let fetcher = HttpFetcher::new(TranscriptConfig::from_env(&config.transcripts.api_key_env))?;

    let notes_root = expand_home(notes_dir.unwrap_or(&config.defaults.notes_dir));
    let notes = LocalNotesStore::new(notes_root);

    let upload_token = std::env::var(&config.upload.token_env)
        .ok()
        .filter(|t| !t.is_empty());
    let uploader = HttpUploader::new(config.upload.endpoint.clone(), upload_token)?;

    let ctx = StageContext::new(&storage, &fetcher, &notes, &model, &uploader).with_options(
        RunOptions {
            depth,
            max_videos: config.defaults.max_videos,
        },
    );

    let request = RunRequest {
        vendors,
        research_query: query.to_string(),
    };

    let progress = CliProgress::new();
    let result = run_pipeline(request, &ctx, &progress).await;
    progress.finish();
    let record = result?;

    match out {
        Some(path) => {
            std::fs::write(&path, &record.final_report)?;
            println!("Report written to {}", path.display());
        }
        None => println!("{}", record.final_report),
    }

    if !record.report_link.is_empty() {
        println!("Upload link: {}", record.report_link);
    }

    // A partial report is still a report; surface what went wrong alongside it
    for error in &record.errors {
        eprintln!("warning: {error}");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// vendor
// ---------------------------------------------------------------------------

fn validated(url: Option<String>, flag: &str) -> Result<Option<String>> {
    match url {
        Some(raw) if !raw.is_empty() => {
            Url::parse(&raw).map_err(|e| eyre!("invalid --{flag} '{raw}': {e}"))?;
            Ok(Some(raw))
        }
        _ => Ok(None),
    }
}

async fn open_storage() -> Result<Storage> {
    let config = load_config()?;
    Ok(Storage::open(&db_path(&config)).await?)
}

async fn cmd_vendor_add(
    name: &str,
    website: Option<String>,
    blog: Option<String>,
    docs: Option<String>,
    changelog: Option<String>,
    channel: Option<String>,
) -> Result<()> {
    if name.trim().is_empty() {
        return Err(eyre!("vendor name must not be empty"));
    }

    let storage = open_storage().await?;

    let mut profile = VendorProfile::new(name.trim());
    profile.website_url = validated(website, "website")?;
    profile.blog_url = validated(blog, "blog")?;
    profile.docs_url = validated(docs, "docs")?;
    profile.changelog_url = validated(changelog, "changelog")?;
    profile.video_channel = channel.filter(|c| !c.is_empty());

    match storage.insert_vendor(&profile).await {
        Ok(()) => {
            println!("Registered vendor '{}'", profile.name);
            Ok(())
        }
        Err(e) if e.to_string().contains("UNIQUE") => {
            Err(eyre!("vendor '{}' is already registered", profile.name))
        }
        Err(e) => Err(e.into()),
    }
}

async fn cmd_vendor_list() -> Result<()> {
    let storage = open_storage().await?;
    let vendors = storage.list_vendors().await?;

    if vendors.is_empty() {
        println!("No vendors registered. Add one with `vendorwatch vendor add <name>`.");
        return Ok(());
    }

    for vendor in vendors {
        let mut sources = Vec::new();
        if vendor.website_url.is_some() {
            sources.push("website");
        }
        if vendor.blog_url.is_some() {
            sources.push("blog");
        }
        if vendor.docs_url.is_some() {
            sources.push("docs");
        }
        if vendor.changelog_url.is_some() {
            sources.push("changelog");
        }
        if vendor.video_channel.is_some() {
            sources.push("video");
        }
        let sources = if sources.is_empty() {
            "no sources".to_string()
        } else {
            sources.join(", ")
        };
        println!("{:<24} {}", vendor.name, sources);
    }
    Ok(())
}

async fn cmd_vendor_update(
    name: &str,
    website: Option<String>,
    blog: Option<String>,
    docs: Option<String>,
    changelog: Option<String>,
    channel: Option<String>,
) -> Result<()> {
    let storage = open_storage().await?;

    let Some(mut profile) = storage.get_vendor(name).await? else {
        return Err(eyre!("vendor '{name}' is not registered"));
    };

    if let Some(url) = validated(website, "website")? {
        profile.website_url = Some(url);
    }
    if let Some(url) = validated(blog, "blog")? {
        profile.blog_url = Some(url);
    }
    if let Some(url) = validated(docs, "docs")? {
        profile.docs_url = Some(url);
    }
    if let Some(url) = validated(changelog, "changelog")? {
        profile.changelog_url = Some(url);
    }
    if let Some(c) = channel.filter(|c| !c.is_empty()) {
        profile.video_channel = Some(c);
    }

    storage.update_vendor(&profile).await?;
    println!("Updated vendor '{name}'");
    Ok(())
}

async fn cmd_vendor_remove(name: &str) -> Result<()> {
    let storage = open_storage().await?;

    if storage.get_vendor(name).await?.is_none() {
        return Err(eyre!("vendor '{name}' is not registered"));
    }

    storage.delete_vendor(name).await?;
    println!("Removed vendor '{name}'");
    Ok(())
}

// ---------------------------------------------------------------------------
// reports
// ---------------------------------------------------------------------------

async fn cmd_reports_list() -> Result<()> {
    let storage = open_storage().await?;
    let reports = storage.list_reports().await?;

    if reports.is_empty() {
        println!("No reports yet. Run `vendorwatch run --vendors ... --query ...`.");
        return Ok(());
    }

    for report in reports {
        println!(
            "{}  {}  [{}]  {}",
            report.id,
            report.created_at.format("%Y-%m-%d %H:%M"),
            report.vendors.join(", "),
            report.research_query,
        );
    }
    Ok(())
}

async fn cmd_reports_show(id: &str) -> Result<()> {
    let storage = open_storage().await?;

    let Some(report) = storage.get_report(id).await? else {
        return Err(eyre!("no report with id '{id}'"));
    };

    println!("{}", report.markdown);
    if !report.upload_link.is_empty() {
        println!("\nUpload link: {}", report.upload_link);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    println!("config file: {}", config_file_path()?.display());
    println!("database:    {}", db_path(&config).display());
    println!("notes dir:   {}", expand_home(&config.defaults.notes_dir).display());
    println!("depth:       {}", config.defaults.depth);
    println!("max videos:  {}", config.defaults.max_videos);
    println!("model:       {}", config.openrouter.default_model);
    println!(
        "upload:      {}",
        config.upload.endpoint.as_deref().unwrap_or("(disabled)")
    );
    Ok(())
}
