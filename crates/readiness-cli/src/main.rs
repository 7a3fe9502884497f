//! readiness CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod session;

#[derive(Parser)]
#[command(name = "readiness", version, about = "Resumable governance readiness self-assessment")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config and the reference catalog
    Init,

    /// Validate question catalog TOML files
    Validate {
        /// Path to catalog file or directory
        #[arg(long)]
        catalog: PathBuf,
    },

    /// Enter the company profile and begin the first section
    Start {
        #[arg(long)]
        company: String,
        #[arg(long)]
        sector: String,
        #[arg(long)]
        size: String,
        /// Current GRC maturity
        #[arg(long)]
        maturity: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
    },

    /// Show progress, save status and any resume offer
    Status,

    /// Answer a question in the current section
    Answer {
        /// Question id within the current section
        #[arg(long)]
        question: u32,

        /// Option label, or its 0-based position
        #[arg(long)]
        option: String,
    },

    /// Confirm the current section and move on
    Next,

    /// Go back one step
    Previous,

    /// Confirm that progress is saved
    Save,

    /// Continue or discard a partially completed assessment
    Resume {
        /// Go to the recorded step
        #[arg(long = "continue", conflicts_with = "fresh")]
        continue_: bool,

        /// Discard saved answers and start over
        #[arg(long)]
        fresh: bool,
    },

    /// Show scores, maturity tier and recommendations
    Results {
        /// Email the report to this address
        #[arg(long)]
        email: Option<String>,

        /// Also write the results as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Request a consultation
    Consult {
        #[arg(long)]
        name: String,
        /// Defaults to the profile email
        #[arg(long)]
        email: Option<String>,
        /// Defaults to the profile company name
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        message: Option<String>,
    },

    /// Clear the saved assessment
    Reset,
}

#[tokio::main]
async fn main() {
    let directive = match "readiness=info".parse() {
        Ok(directive) => directive,
        Err(e) => {
            eprintln!("Error: invalid log directive: {e}");
            process::exit(1);
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { catalog } => commands::validate::execute(catalog),
        Commands::Start {
            company,
            sector,
            size,
            maturity,
            email,
            phone,
        } => {
            let profile = readiness_core::model::CompanyProfile {
                company_name: company,
                industry_sector: sector,
                company_size: size,
                grc_maturity: maturity,
                email,
                phone,
            };
            commands::start::execute(config, profile).await
        }
        Commands::Status => commands::status::execute(config).await,
        Commands::Answer { question, option } => {
            commands::answer::execute(config, question, option).await
        }
        Commands::Next => commands::navigate::next(config).await,
        Commands::Previous => commands::navigate::previous(config).await,
        Commands::Save => commands::save::execute(config).await,
        Commands::Resume { continue_, fresh } => {
            commands::resume::execute(config, continue_, fresh).await
        }
        Commands::Results { email, output } => {
            commands::results::execute(config, email, output).await
        }
        Commands::Consult {
            name,
            email,
            company,
            phone,
            message,
        } => commands::consult::execute(config, name, email, company, phone, message).await,
        Commands::Reset => commands::reset::execute(config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
