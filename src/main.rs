//! wafprobe - WAF detection rate tester CLI

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing_subscriber::EnvFilter;

use wafprobe::catalogue;
use wafprobe::config::{self, CliOverrides};
use wafprobe::error::WafProbeError;
use wafprobe::models::TesterConfig;
use wafprobe::report;
use wafprobe::tester::WafTester;

/// wafprobe - fire attack payloads at a WAF and measure what it catches
#[derive(Parser)]
#[command(name = "wafprobe", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the payload catalogue against a target and correlate the audit log
    Run {
        /// Target base URL (e.g. http://192.168.1.25)
        #[arg(short, long)]
        target: Option<String>,

        /// Path to the firewall's JSON audit log
        #[arg(short, long)]
        log_file: Option<PathBuf>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of concurrent dispatch workers
        #[arg(long)]
        concurrency: Option<usize>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Delay between dispatches in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Seconds to wait for the audit log before correlating
        #[arg(long)]
        grace_secs: Option<u64>,

        /// Only send these attack categories (comma-separated)
        #[arg(long, value_delimiter = ',')]
        only: Option<Vec<String>>,

        /// JSON report path
        #[arg(long)]
        json_out: Option<PathBuf>,

        /// Plain-text report path
        #[arg(long)]
        text_out: Option<PathBuf>,

        /// Do not write report files
        #[arg(long)]
        no_save: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the payload catalogue
    Payloads {
        /// Only list this attack category
        #[arg(long)]
        category: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "wafprobe=debug"
    } else {
        "wafprobe=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

fn print_banner() {
    let banner = r#"
    ╔═══════════════════════════════════════╗
    ║  wafprobe                             ║
    ║  WAF detection rate tester            ║
    ╚═══════════════════════════════════════╝
    "#;
    println!("{}", banner.cyan());
}

fn load_base_config(config_path: Option<&Path>) -> wafprobe::error::Result<TesterConfig> {
    if let Some(path) = config_path {
        return config::load_config(path);
    }
    let default_path = Path::new("config/default.toml");
    if default_path.exists() {
        config::load_config(default_path)
    } else {
        Ok(TesterConfig::default())
    }
}

fn print_catalogue(category: Option<&str>) {
    let cases = match category {
        Some(c) => catalogue::cases_by_type(c),
        None => catalogue::all_cases(),
    };

    let mut builder = Builder::default();
    builder.push_record(["ID", "Type", "Endpoint", "Param", "Payload"]);
    for case in &cases {
        builder.push_record([
            case.id.clone(),
            case.attack_type.clone(),
            case.endpoint.clone(),
            case.parameter.clone(),
            case.payload.clone(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    println!("{table}");
    println!("\n  {} {}", "Total:".bold(), cases.len().to_string().cyan());
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            target,
            log_file,
            config: config_path,
            concurrency,
            timeout,
            delay_ms,
            grace_secs,
            only,
            json_out,
            text_out,
            no_save,
            verbose,
        } => {
            init_tracing(verbose);
            print_banner();

            let mut tester_config = load_base_config(config_path.as_deref())?;
            config::merge_cli_args(
                &mut tester_config,
                CliOverrides {
                    target,
                    log_file,
                    concurrency,
                    timeout_secs: timeout,
                    delay_ms,
                    grace_secs,
                    json_report: json_out,
                    text_report: text_out,
                    no_save,
                },
            );
            config::validate(&mut tester_config)?;

            let only = only.unwrap_or_default();
            let cases = catalogue::build(&tester_config, &only);

            println!("  {} {}", "Target:".bold(), tester_config.target.green());
            println!(
                "  {} {}",
                "Audit log:".bold(),
                tester_config.log_file.display().to_string().green()
            );
            println!(
                "  {} {}",
                "Payloads:".bold(),
                cases.len().to_string().cyan()
            );
            println!(
                "  {} {}\n",
                "Workers:".bold(),
                tester_config.concurrency.to_string().cyan()
            );

            let save = tester_config.save_results;
            let json_path = tester_config.json_report.clone();
            let text_path = tester_config.text_report.clone();

            let tester = WafTester::new(tester_config)?;
            let run_report = match tester.run(cases).await {
                Ok(r) => r,
                Err(e @ WafProbeError::TargetUnreachable(_)) => {
                    eprintln!("  {} {e}", "Error:".red().bold());
                    eprintln!("  {}", "Test run aborted.".red());
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            };

            report::console::print_report(&run_report);

            if save {
                report::json::export(&run_report, &json_path)?;
                report::text::export(&run_report, &text_path)?;
                println!(
                    "\n  {} {}, {}",
                    "Reports saved to:".bold(),
                    json_path.display().to_string().green(),
                    text_path.display().to_string().green()
                );
            }
        }

        Commands::Payloads { category } => {
            print_banner();
            print_catalogue(category.as_deref());
        }
    }

    Ok(())
}
