use anyhow::Context;
use clap::{Parser, Subcommand};
use pan_tamper_detector::config::{load_config_or_default, ConfigFormat};
use pan_tamper_detector::logging::init_logging;
use pan_tamper_detector::{Config, FsReference, SimilarityJudge, TamperServer, Verdict};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pan-detector")]
#[command(about = "Detect tampered PAN card images by structural similarity to a reference")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP upload service
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Working directory for uploads and the reference image
        #[arg(short, long)]
        upload_dir: Option<PathBuf>,
    },

    /// Compare a single image against the reference
    Check {
        /// Path to the image to check
        #[arg(short, long)]
        file: PathBuf,

        /// Path to the reference image (defaults to the configured one)
        #[arg(short, long)]
        reference: Option<PathBuf>,

        /// Output file for the verdict as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Destination file
        #[arg(short, long, default_value = "pan-detector.toml")]
        output: PathBuf,

        /// Output format: toml or json
        #[arg(long, default_value = "toml")]
        format: ConfigFormat,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config_or_default(cli.config.as_deref());
    config.logging = config.logging.clone().with_verbosity(cli.verbose);
    let _log_guard = init_logging(&config.logging)?;

    match cli.command {
        Commands::Serve { port, upload_dir } => {
            handle_serve(config, port, upload_dir).await?;
        }
        Commands::Check { file, reference, output } => {
            handle_check(config, file, reference, output)?;
        }
        Commands::InitConfig { output, format } => {
            handle_init_config(output, format)?;
        }
    }

    Ok(())
}

async fn handle_serve(mut config: Config, port: Option<u16>, upload_dir: Option<PathBuf>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(dir) = upload_dir {
        config.upload.upload_dir = dir;
    }

    config.ensure_valid()?;

    TamperServer::new(config).run().await
}

fn handle_check(
    config: Config,
    file: PathBuf,
    reference: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let reference_path = reference.unwrap_or_else(|| config.upload.reference_path());
    let judge = SimilarityJudge::new(Arc::new(FsReference::new(&reference_path)), &config.judge);

    let verdict = judge
        .judge_file(&file, None)
        .with_context(|| format!("Failed to check {}", file.display()))?;

    print_verdict(&file, &reference_path, &verdict);

    if let Some(output_path) = output {
        let json = serde_json::to_string_pretty(&verdict)?;
        std::fs::write(&output_path, json)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        println!("Verdict saved to {}", output_path.display());
    }

    Ok(())
}

fn handle_init_config(output: PathBuf, format: ConfigFormat) -> anyhow::Result<()> {
    Config::default()
        .save_to_file(&output, format)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Default configuration written to {}", output.display());
    Ok(())
}

fn print_verdict(file: &std::path::Path, reference: &std::path::Path, verdict: &Verdict) {
    println!("=== Tamper Check ===");
    println!("Upload:     {}", file.display());
    println!("Reference:  {}", reference.display());
    println!("Compared:   {}x{}{}", verdict.dimensions.0, verdict.dimensions.1,
             if verdict.resized { " (upload resized)" } else { "" });
    println!("SSIM score: {:.4} (threshold {:.2})", verdict.score, verdict.threshold);
    println!("Time:       {:.2}ms", verdict.processing_time_ms);
    println!("Result:     {}", verdict.message);
}
