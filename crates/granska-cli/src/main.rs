mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "granska",
    version,
    about = "Extract text and financial statements from due-diligence documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PdfBackend {
    /// pdftotext when installed, else the built-in parser
    Auto,
    Pdftotext,
    Native,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the text of a document (PDF, spreadsheet, Word, PowerPoint, text or image)
    Read {
        /// Path to the document
        input_file: PathBuf,

        /// MIME type supplied with the upload (guessed from the extension if omitted)
        #[arg(long)]
        mime: Option<String>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// PDF text backend
        #[arg(long, value_enum, default_value = "auto")]
        pdf_backend: PdfBackend,

        /// Reader configuration (JSON)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Extract a multi-year financial statement with add-back suggestions
    Financials {
        /// Path to the document
        input_file: PathBuf,

        /// MIME type supplied with the upload (guessed from the extension if omitted)
        #[arg(long)]
        mime: Option<String>,

        /// Custom JSON keyword file (default: the sv-en preset)
        #[arg(short, long, value_name = "FILE")]
        keywords: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the parsed statement to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// PDF text backend
        #[arg(long, value_enum, default_value = "auto")]
        pdf_backend: PdfBackend,

        /// Reader configuration (JSON)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Show the detected format of a file
    Detect {
        /// Path to the file
        input_file: PathBuf,

        /// MIME type supplied with the upload
        #[arg(long)]
        mime: Option<String>,
    },
    /// Manage and inspect keyword tables
    Keywords {
        #[command(subcommand)]
        action: KeywordsAction,
    },
}

#[derive(Subcommand)]
enum KeywordsAction {
    /// List built-in keyword tables
    List,
    /// Print the keywords of a built-in table
    Show {
        /// Preset name (e.g., "sv-en")
        preset: String,
    },
    /// Validate a custom keyword file
    Validate {
        /// Path to JSON keyword file
        file: PathBuf,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Read {
            input_file,
            mime,
            output,
            pdf_backend,
            config,
        } => commands::read::run(input_file, mime, &output, pdf_backend, config),
        Commands::Financials {
            input_file,
            mime,
            keywords,
            output,
            out,
            pdf_backend,
            config,
        } => commands::financials::run(commands::financials::Args {
            input_file,
            mime,
            keywords,
            output_format: output,
            output_file: out,
            pdf_backend,
            config,
        }),
        Commands::Detect { input_file, mime } => commands::detect::run(&input_file, mime),
        Commands::Keywords { action } => match action {
            KeywordsAction::List => commands::keywords::list(),
            KeywordsAction::Show { preset } => commands::keywords::show(&preset),
            KeywordsAction::Validate { file } => commands::keywords::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
