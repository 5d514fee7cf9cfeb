//! `vigil verify` - Verify attestations against a key set.
//!
//! Succeeds when at least one attestation is authentic and asserts the
//! expected digest.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use vigil_verify::{
    load_key_set, AllRejected, Attestation, AttestationVerifier, RegistryDiagnostic, VerificationError,
    VerifierConfig,
};

use crate::cli::args::OutputFormat;
use crate::exit_codes;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Attestation files (JSON); any one verifying is enough
    #[arg(required = true)]
    pub attestations: Vec<PathBuf>,

    /// Key set file (YAML or JSON)
    #[arg(long)]
    pub keys: PathBuf,

    /// Expected image manifest digest (sha256:...)
    #[arg(long)]
    pub digest: String,

    /// Verifier configuration file (YAML); VIGIL_* env vars override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Quiet mode - only exit code, no output
    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    verified: bool,
    expected_digest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    accepted: Option<Accepted>,
    rejections: Vec<Rejected>,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Accepted {
    attestation: PathBuf,
    key_id: String,
}

#[derive(Debug, Serialize)]
struct Rejected {
    attestation: PathBuf,
    kind: String,
    error: String,
}

pub fn cmd_verify(args: VerifyArgs) -> i32 {
    match run_verify(&args) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            if let Some(rejected) = e.downcast_ref::<AllRejected>() {
                // Per-attestation details are in the report.
                return rejected.exit_code();
            }
            if !args.quiet {
                eprintln!("error: {e:#}");
            }
            if let Some(verify_err) = e.downcast_ref::<VerificationError>() {
                verify_err.exit_code()
            } else {
                exit_codes::CONFIG_ERROR
            }
        }
    }
}

fn run_verify(args: &VerifyArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => VerifierConfig::from_file(path)?,
        None => VerifierConfig::default(),
    };
    config.apply_env()?;

    let keys = load_key_set(&args.keys)?;
    let verifier = AttestationVerifier::builder()
        .keys(keys)
        .config(config)
        .build()
        .context("failed to build key registry")?;

    let attestations = args
        .attestations
        .iter()
        .map(|path| Attestation::from_file(path))
        .collect::<Result<Vec<_>, _>>()?;

    let warnings: Vec<String> = verifier
        .registry()
        .diagnostics()
        .iter()
        .map(|d| match d {
            RegistryDiagnostic::DuplicateKeyId {
                key_id,
                replaced_position,
                position,
            } => format!(
                "duplicate key id {key_id:?}: entry {position} replaces entry {replaced_position}"
            ),
        })
        .collect();

    let outcome = verifier.verify_any(&attestations, &args.digest);

    let report = Report {
        verified: outcome.is_ok(),
        expected_digest: args.digest.clone(),
        accepted: outcome.as_ref().ok().map(|a| Accepted {
            attestation: args.attestations[a.index].clone(),
            key_id: a.key_id.clone(),
        }),
        rejections: match &outcome {
            Ok(_) => Vec::new(),
            Err(all) => all
                .rejections
                .iter()
                .map(|r| Rejected {
                    attestation: args.attestations[r.index].clone(),
                    kind: r.error.kind().to_string(),
                    error: r.error.to_string(),
                })
                .collect(),
        },
        warnings,
    };

    if !args.quiet {
        print_report(&report, args.format)?;
    }

    outcome.map(|_| ()).map_err(Into::into)
}

fn print_report(report: &Report, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(report).context("failed to serialize report")?
            );
        }
        OutputFormat::Text => {
            for warning in &report.warnings {
                eprintln!("warning: {warning}");
            }
            if let Some(accepted) = &report.accepted {
                println!("Verification successful!");
                println!();
                println!("  attestation: {}", accepted.attestation.display());
                println!("  key_id:      {}", accepted.key_id);
                println!("  digest:      {}", report.expected_digest);
            } else {
                println!("Verification failed: no attestation verified");
                println!();
                for rejected in &report.rejections {
                    println!(
                        "  {}: [{}] {}",
                        rejected.attestation.display(),
                        rejected.kind,
                        rejected.error
                    );
                }
            }
        }
    }
    Ok(())
}
