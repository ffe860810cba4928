//! CLI entry point for `docmail`.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};

use docmail::config::Config;
use docmail::convert::{ConversionSession, ConvertOptions};
use docmail::host::memory::MemoryMailHost;
use docmail::host::template::PlaceholderRenderer;
use docmail::host::text::TextDocumentHost;
use docmail::host::RenderContext;

#[derive(Parser)]
#[command(
    name = "docmail",
    version,
    about = "Convert documents with a YAML property header into mail items"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a document into a message and write it as JSON
    Convert {
        /// Source document
        path: PathBuf,
        /// JSON object with template variables
        #[arg(short, long, value_name = "FILE")]
        context: Option<PathBuf>,
        /// JSON list describing the mail folder tree
        #[arg(long, value_name = "FILE")]
        folders: Option<PathBuf>,
        /// Where to write the message (stdout if omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Display the message after conversion
        #[arg(long)]
        display: bool,
        /// Save the message to drafts after conversion
        #[arg(long)]
        save: bool,
        /// Reject properties the mail item does not expose
        #[arg(long)]
        strict: bool,
    },
    /// Print the typed header properties of a document
    Inspect {
        path: PathBuf,
        #[arg(short, long, value_name = "FILE")]
        context: Option<PathBuf>,
    },
    /// Write the default configuration file
    InitConfig,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = docmail::config::load_config()?;

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Convert {
            path,
            context,
            folders,
            output,
            display,
            save,
            strict,
        } => {
            let mut options = config.convert_options();
            options.display |= display;
            options.save |= save;
            options.save_as = output;
            let strict = strict || config.host.strict;
            cmd_convert(&path, context.as_deref(), folders.as_deref(), options, strict)
        }
        Commands::Inspect { path, context } => cmd_inspect(&path, context.as_deref(), &config),
        Commands::InitConfig => cmd_init_config(&config),
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
    let log_dir = docmail::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let log_file = docmail::config::log_file_path(config);
        let file_name = log_file
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "docmail.log".into());
        let file_appender = tracing_appender::rolling::never(&log_dir, file_name);
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

/// Convert a document and write the resulting message as JSON.
fn cmd_convert(
    path: &Path,
    context: Option<&Path>,
    folders: Option<&Path>,
    options: ConvertOptions,
    strict: bool,
) -> anyhow::Result<()> {
    let stores = match folders {
        Some(file) => MemoryMailHost::load_stores(file)?,
        None => MemoryMailHost::default().stores().to_vec(),
    };
    let mut mail = MemoryMailHost::new(stores).strict(strict);
    let mut documents = TextDocumentHost::new();
    let to_stdout = options.save_as.is_none();

    let message = {
        let mut session = ConversionSession::open(path, &mut documents, &mut mail, options)?;
        if let Some(file) = context {
            session.render(&PlaceholderRenderer::new(), &load_context(file)?)?;
        }
        session.convert()?
    };

    if to_stdout {
        println!("{}", message.to_json_pretty()?);
    }
    Ok(())
}

/// Print the typed header of a document as JSON.
fn cmd_inspect(path: &Path, context: Option<&Path>, config: &Config) -> anyhow::Result<()> {
    let mut mail = MemoryMailHost::default();
    let mut documents = TextDocumentHost::new();

    let mut session =
        ConversionSession::open(path, &mut documents, &mut mail, config.convert_options())?;
    if let Some(file) = context {
        session.render(&PlaceholderRenderer::new(), &load_context(file)?)?;
    }
    let typed = session.headers()?;

    println!("{}", serde_json::to_string_pretty(&typed.to_json())?);
    Ok(())
}

/// Read a JSON object of template variables.
fn load_context(path: &Path) -> anyhow::Result<RenderContext> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read context '{}': {e}", path.display()))?;
    match serde_json::from_str::<serde_json::Value>(&contents)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => anyhow::bail!("Context '{}' must be a JSON object", path.display()),
    }
}

/// Write the current configuration to the standard location.
fn cmd_init_config(config: &Config) -> anyhow::Result<()> {
    docmail::config::save_config(config)?;
    if let Some(path) = docmail::config::config_file_path() {
        println!("  Wrote {}", path.display());
    }
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "docmail", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
