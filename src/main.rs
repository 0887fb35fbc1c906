mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use conflict_democracy::{detect_source, export_report, ExportFormat, Pipeline, StudyConfig};

#[derive(Parser)]
#[command(name = "conflict-democracy")]
#[command(about = "Civil war fatalities vs. democracy index shifts")]
#[command(version)]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => ExportFormat::Csv,
            Format::Json => ExportFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full study and export the tables
    Run {
        /// TOML config file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Civil war register (overrides config)
        #[arg(long)]
        war: Option<PathBuf>,
        /// Civil war codebook (overrides config)
        #[arg(long)]
        codebook: Option<PathBuf>,
        /// Democracy index TSV (overrides config)
        #[arg(long)]
        democracy: Option<PathBuf>,
        /// Restoration lag in years; repeat for several scenarios
        #[arg(long = "lag")]
        lags: Vec<i64>,
        /// Output directory
        #[arg(long, default_value = "output")]
        out: PathBuf,
        #[arg(long, value_enum, default_value = "csv")]
        format: Format,
    },
    /// Show which study input each file looks like
    Detect {
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            war,
            codebook,
            democracy,
            lags,
            out,
            format,
        } => {
            let mut study = match config {
                Some(path) => StudyConfig::load(&path)
                    .with_context(|| format!("Failed to load config: {}", path.display()))?,
                None => StudyConfig::default(),
            };
            if let Some(path) = war {
                study.inputs.war_register = path;
            }
            if let Some(path) = codebook {
                study.inputs.codebook = path;
            }
            if let Some(path) = democracy {
                study.inputs.democracy_index = path;
            }
            if !lags.is_empty() {
                study.lags = lags;
            }

            run_study(study, &out, format.into())
        }
        Commands::Detect { files } => {
            for file in files {
                match detect_source(&file) {
                    Ok(kind) => println!("{}: {}", file.display(), kind.name()),
                    Err(e) => println!("{}: {}", file.display(), e),
                }
            }
            Ok(())
        }
    }
}

fn run_study(config: StudyConfig, out: &Path, format: ExportFormat) -> Result<()> {
    println!("📂 Running study...");

    let pipeline = Pipeline::new(config).context("Invalid study configuration")?;
    let report = pipeline.run().context("Study pipeline failed")?;

    println!("✓ {}", report.summary());
    println!(
        "✓ Dropped {} wars without a codebook entry",
        report.counts.merge.unmatched_wars
    );

    println!("\n📊 Scenarios");
    for scenario in &report.scenarios {
        println!(
            "   {:<10} joined {:>4} / {:<4}",
            scenario.name, scenario.stats.joined, scenario.stats.wars_in
        );
    }

    println!("\n💀 Top fatalities");
    for row in report.fatalities.iter().take(5) {
        println!("   {:<24} {:>10}", row.ctryname, row.total);
    }

    let written = export_report(&report, out, format)
        .with_context(|| format!("Failed to export to {}", out.display()))?;
    println!("\n💾 Wrote {} files to {}", written.len(), out.display());

    Ok(())
}
