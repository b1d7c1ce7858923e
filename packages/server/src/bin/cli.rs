// Command-line control for the pipeline stages.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use leadgen_core::domains::daily::{run_daily, set_daily_target};
use leadgen_core::domains::leads::{run_enrich, run_scrape, ScrapeParams};
use leadgen_core::domains::outreach::{
    add_template, delete_template, ensure_templates, run_send, set_default_template,
};
use leadgen_core::domains::status::get_status;
use leadgen_core::domains::websites::{run_generate, GenerateParams};
use leadgen_core::{Config, PipelineDeps};

#[derive(Parser)]
#[command(name = "cli", about = "Lead pipeline control", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Verify required environment keys are present
    Check,
    /// Discover businesses for a query in a location
    Scrape {
        query: String,
        /// Location; multiple words allowed
        location: Vec<String>,
    },
    /// Pull emails and socials for every unenriched lead in a file
    Enrich { leads_file: String },
    /// Generate the preview site for one lead (by index in the file)
    GenerateSite {
        leads_file: String,
        index: usize,
        #[arg(long)]
        template_style: Option<String>,
        #[arg(long)]
        force: bool,
    },
    /// Send outreach email for eligible leads in a file
    Send { leads_file: String },
    /// List outreach templates
    TemplateList,
    /// Add an outreach template
    TemplateAdd {
        name: String,
        subject: String,
        body: String,
    },
    /// Make a template the default
    TemplateDefault { name: String },
    /// Delete a template by name
    TemplateDelete { name: String },
    /// Set the recurring daily query/location target
    DailySet { query: String, location: Vec<String> },
    /// Run today's scrape -> enrich -> send sequence
    DailyRun,
    /// Summarize leads files, websites, outreach and daily state
    Status,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("ERROR: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Command::Check = cli.command {
        let _ = Config::from_env().context("Failed to load configuration")?;
        let report = Config::check();
        if !report.ok {
            println!("MISSING: {}", report.missing.join(", "));
            std::process::exit(1);
        }
        println!("All required keys present.");
        return Ok(());
    }

    let config = Config::from_env().context("Failed to load configuration")?;
    let deps = Arc::new(PipelineDeps::from_config(config).context("Failed to build dependencies")?);

    match cli.command {
        Command::Check => unreachable!("handled above"),
        Command::Scrape { query, location } => {
            let params = ScrapeParams {
                query,
                location: location.join(" "),
                max_results: None,
            };
            print_json(&run_scrape(&deps, params).await?)?;
        }
        Command::Enrich { leads_file } => {
            print_json(&run_enrich(&deps, &leads_file).await?)?;
        }
        Command::GenerateSite {
            leads_file,
            index,
            template_style,
            force,
        } => {
            let params = GenerateParams {
                leads_file,
                index,
                template_style,
                force_regenerate: force,
            };
            print_json(&run_generate(&deps, params).await?)?;
        }
        Command::Send { leads_file } => {
            print_json(&run_send(&deps, &leads_file).await?)?;
        }
        Command::TemplateList => {
            print_json(&ensure_templates(&deps.local).await?)?;
        }
        Command::TemplateAdd {
            name,
            subject,
            body,
        } => {
            add_template(&deps.local, &name, &subject, &body).await?;
            println!("ok");
        }
        Command::TemplateDefault { name } => {
            set_default_template(&deps.local, &name).await?;
            println!("ok");
        }
        Command::TemplateDelete { name } => {
            delete_template(&deps.local, &name).await?;
            println!("ok");
        }
        Command::DailySet { query, location } => {
            print_json(&set_daily_target(&deps, &query, &location.join(" ")).await?)?;
        }
        Command::DailyRun => {
            print_json(&run_daily(&deps).await?)?;
        }
        Command::Status => {
            print_json(&get_status(&deps).await?)?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
