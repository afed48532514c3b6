//! CLI entry point for `iosevidence`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use iosevidence::config::{self, Config};
use iosevidence::export::{self, table::TextTableRenderer, OutputFormat, Renderer};
use iosevidence::filter::{FilterConfig, Module, OptionDefault};
use iosevidence::model::table::{Cell, Table};
use iosevidence::report::{self, Report, RunSettings};

#[derive(Parser)]
#[command(
    name = "iosevidence",
    version,
    about = "Extract contacts, conversations and messages from an iOS backup",
    after_help = "Module options are given as -o KEY=VALUE; run `iosevidence options <module>` to list them."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List contacts from the Address Book
    Contacts(RunArgs),
    /// List conversations from the Messages database
    Conversations(RunArgs),
    /// Extract message transcripts for selected conversations
    Extract {
        #[command(flatten)]
        run: RunArgs,
        /// Conversation ids or ranges, e.g. "1,3-5" (sets CONVERSATION_IDS)
        #[arg(short, long, value_name = "IDS")]
        ids: Option<String>,
    },
    /// Show a module's options with their defaults
    Options {
        /// contacts, conversations or extract
        module: String,
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

#[derive(Args)]
struct RunArgs {
    /// iOS backup directory (sets BACKUP_DIR)
    #[arg(short, long, value_name = "DIR")]
    backup: Option<PathBuf>,

    /// Module option as KEY=VALUE; repeatable
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    options: Vec<String>,

    /// Output format: stdout, html, csv or json (default from config)
    #[arg(short, long)]
    format: Option<String>,

    /// Directory for report files (default from config, else ./output)
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Contacts(args) => cmd_run(Module::Contacts, &args, &[], &config),
        Commands::Conversations(args) => cmd_run(Module::Conversations, &args, &[], &config),
        Commands::Extract { run, ids } => {
            let extra: Vec<(&str, &str)> = ids
                .as_deref()
                .map(|ids| vec![("CONVERSATION_IDS", ids)])
                .unwrap_or_default();
            cmd_run(Module::Extract, &run, &extra, &config)
        }
        Commands::Options { module, json } => cmd_options(&module, json, &config),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "iosevidence.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "iosevidence", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::stdout().write_all(&buf)?;
    Ok(())
}

fn parse_module(name: &str) -> anyhow::Result<Module> {
    Module::from_name(name).with_context(|| {
        let known: Vec<&str> = Module::ALL.iter().map(|m| m.name()).collect();
        format!("unknown module '{name}' (expected one of: {})", known.join(", "))
    })
}

/// Print a module's option table.
fn cmd_options(module: &str, json: bool, config: &Config) -> anyhow::Result<()> {
    let module = parse_module(module)?;

    if json {
        let items: Vec<serde_json::Value> = module
            .options()
            .iter()
            .map(|spec| {
                let default = match spec.default {
                    OptionDefault::Flag(b) => serde_json::json!(b),
                    OptionDefault::Text(s) => serde_json::json!(s),
                };
                serde_json::json!({
                    "name": spec.name,
                    "default": default,
                    "required": spec.required,
                    "description": spec.description,
                })
            })
            .collect();
        let output = serde_json::json!({
            "module": module.name(),
            "description": module.description(),
            "options": items,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let mut table = Table::new(
        format!("{} ({})", module.name(), module.description()),
        &["Name", "Default", "Required", "Description"],
    );
    for spec in module.options() {
        let default = match spec.default {
            OptionDefault::Flag(b) => b.to_string(),
            OptionDefault::Text(s) => s.to_string(),
        };
        table.push(vec![
            Cell::text(spec.name),
            Cell::text(default),
            Cell::text(if spec.required { "yes" } else { "no" }),
            Cell::text(spec.description),
        ]);
    }
    let renderer = TextTableRenderer {
        wrap_width: config.export.wrap_width,
    };
    renderer.render(&table, &mut std::io::stdout().lock())?;
    Ok(())
}

/// Build the module's option set, run it and emit the reports.
fn cmd_run(
    module: Module,
    args: &RunArgs,
    extra: &[(&str, &str)],
    config: &Config,
) -> anyhow::Result<()> {
    let mut builder = FilterConfig::builder(module);
    if let Some(backup) = &args.backup {
        builder = builder.set("BACKUP_DIR", &backup.to_string_lossy())?;
    }
    for (name, value) in extra {
        builder = builder.set(name, value)?;
    }
    for assignment in &args.options {
        builder = builder.assign(assignment)?;
    }
    let filter = builder.build()?;
    for (spec, value) in filter.iter() {
        tracing::debug!(module = module.name(), option = spec.name, value = %value, "Option");
    }

    let format: OutputFormat = args
        .format
        .as_deref()
        .unwrap_or(&config.export.default_format)
        .parse()?;
    let settings = RunSettings::from_config(config, format.embeds_attachments());

    let start = Instant::now();
    let reports = if module == Module::Extract {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} Extracting [{bar:40.cyan/blue}] {pos}/{len}")
                .context("progress template")?
                .progress_chars("#>-"),
        );
        let reports = report::run(
            &filter,
            &settings,
            Some(&|current, total| {
                pb.set_length(total as u64);
                pb.set_position(current as u64);
            }),
        );
        pb.finish_and_clear();
        reports?
    } else {
        report::run(&filter, &settings, None)?
    };
    tracing::info!(tables = reports.len(), elapsed = ?start.elapsed(), "Module finished");

    if reports.is_empty() {
        eprintln!("No matching records.");
        return Ok(());
    }

    let renderer = format.renderer(&config.export);
    if format.extension().is_none() {
        let mut out = std::io::stdout().lock();
        for report in &reports {
            renderer.render(&report.table, &mut out)?;
        }
        return Ok(());
    }

    let dir = args
        .output
        .clone()
        .unwrap_or_else(|| config::output_dir(config));
    let prefix = filter.text("OUTPUT_FILE_NAME_PREFIX");
    for report in &reports {
        let path = report_file(&dir, prefix, report, format);
        export::write_report(&report.table, renderer.as_ref(), &path)?;
        print_digest(&path)?;
    }
    Ok(())
}

fn report_file(dir: &Path, prefix: &str, report: &Report, format: OutputFormat) -> PathBuf {
    let suffix = report
        .conversation_id
        .map(|id| id.to_string())
        .unwrap_or_default();
    export::report_path(dir, prefix, &suffix, format)
}

/// Print the report path with its SHA-256 and size.
fn print_digest(path: &Path) -> anyhow::Result<()> {
    use humansize::{format_size, BINARY};

    let (digest, size) = export::file_digest(path)?;
    println!("  {:<10} {}", "Report", path.display());
    println!("  {:<10} {}", "SHA-256", digest);
    println!("  {:<10} {}", "Size", format_size(size, BINARY));
    println!();
    Ok(())
}
