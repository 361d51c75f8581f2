use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use charter::config::ConfigError;
use charter::policy::PolicyStore;
use classifier::risk::{self, RiskOptions, StressRecord};
use classifier::LinearModel;
use engine::audit::JsonlAuditLog;
use engine::service::{DecideError, GovernedInferenceService};

#[derive(Parser)]
#[command(name = "arbiterctl", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a document under the governance charter
    Decide {
        /// Document text (or use --file)
        #[arg(value_name = "TEXT")]
        text: Option<String>,
        /// Read the document from a file instead
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
        /// Intended use case, checked against the charter
        #[arg(long = "use-case")]
        use_case: String,
        /// Identity recorded in the audit log
        #[arg(long)]
        requester: String,
        /// Path to the governance charter YAML
        #[arg(
            long,
            env = "ARBITER_GOVERNANCE",
            default_value = "config/governance.yaml"
        )]
        governance: PathBuf,
        /// Path to the model artifact JSON
        #[arg(long, env = "ARBITER_MODEL", default_value = "models/model.json")]
        model: PathBuf,
        /// Path to the JSON Lines audit log
        #[arg(
            long = "audit-log",
            env = "ARBITER_AUDIT_LOG",
            default_value = "logs/inference_log.jsonl"
        )]
        audit_log: PathBuf,
    },
    /// Validate a governance charter file
    Validate {
        #[arg(
            long,
            env = "ARBITER_GOVERNANCE",
            default_value = "config/governance.yaml"
        )]
        governance: PathBuf,
    },
    /// Probe a model with stress documents and report risk signals
    Risk {
        /// JSON array of {id, text} stress records
        #[arg(long, value_name = "FILE")]
        stress: PathBuf,
        #[arg(long, env = "ARBITER_MODEL", default_value = "models/model.json")]
        model: PathBuf,
        /// Write low_confidence_predictions.json and confusion_pairs.json here
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
        /// Top probabilities below this are flagged as low confidence
        #[arg(long, default_value_t = risk::DEFAULT_CONFIDENCE_THRESHOLD)]
        threshold: f64,
        /// Top-two gaps below this are flagged as confusion pairs
        #[arg(long, default_value_t = risk::DEFAULT_CONFUSION_GAP)]
        gap: f64,
    },
    /// Print version and exit
    Version,
}

fn init_tracing() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Decide {
            text,
            file,
            use_case,
            requester,
            governance,
            model,
            audit_log,
        } => {
            let text = read_document(text, file)?;

            let policy = PolicyStore::new(charter::config::load_from_file(&governance)?);
            let model = LinearModel::from_file(&model)?;
            let log = JsonlAuditLog::open(&audit_log)?;
            let mut service = GovernedInferenceService::new(policy, model, log);

            match service.decide(&text, &use_case, &requester) {
                Ok(decision) => {
                    if decision.human_review_required {
                        eprintln!("Human review required: confidence below charter threshold");
                    }
                    println!("{}", serde_json::to_string_pretty(&decision)?);
                }
                Err(DecideError::Policy(reason)) => {
                    eprintln!("Blocked by governance: {}", reason);
                    std::process::exit(2);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Validate { governance } => match charter::config::load_from_file(&governance) {
            Ok(config) => {
                println!(
                    "OK: {} ({} approved, {} prohibited, confidence threshold {})",
                    governance.display(),
                    config.usage.approved.len(),
                    config.usage.prohibited.len(),
                    config.risk_controls.confidence_threshold
                );
            }
            Err(ConfigError::ValidationFailed { errors }) => {
                eprintln!("Invalid charter: {}", governance.display());
                for error in errors {
                    eprintln!("  {}: {}", error.json_pointer, error.message);
                }
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("Invalid charter: {}", e);
                std::process::exit(1);
            }
        },
        Commands::Risk {
            stress,
            model,
            out,
            threshold,
            gap,
        } => {
            let model = LinearModel::from_file(&model)?;

            let content = fs::read_to_string(&stress)
                .with_context(|| format!("Failed to read stress records from {}", stress.display()))?;
            let records: Vec<StressRecord> = serde_json::from_str(&content)
                .context("Stress records must be a JSON array of {id, text} objects")?;
            info!("Loaded {} stress records", records.len());

            let report = risk::analyze(
                &model,
                &records,
                RiskOptions {
                    confidence_threshold: threshold,
                    confusion_gap: gap,
                },
            )?;
            info!(
                low_confidence = report.low_confidence.len(),
                confusion_pairs = report.confusion_pairs.len(),
                "Risk analysis complete"
            );

            match out {
                Some(dir) => {
                    fs::create_dir_all(&dir).with_context(|| {
                        format!("Failed to create output directory {}", dir.display())
                    })?;
                    fs::write(
                        dir.join("low_confidence_predictions.json"),
                        serde_json::to_vec_pretty(&report.low_confidence)?,
                    )?;
                    fs::write(
                        dir.join("confusion_pairs.json"),
                        serde_json::to_vec_pretty(&report.confusion_pairs)?,
                    )?;
                    println!("Risk artifacts written to {}", dir.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
    }
    Ok(())
}

fn read_document(text: Option<String>, file: Option<PathBuf>) -> Result<String> {
    match (text, file) {
        (Some(_), Some(_)) => bail!("Provide either TEXT or --file, not both"),
        (Some(text), None) => Ok(text),
        (None, Some(path)) => fs::read_to_string(&path)
            .with_context(|| format!("Failed to read document from {}", path.display())),
        (None, None) => bail!("Provide document TEXT or --file"),
    }
}
