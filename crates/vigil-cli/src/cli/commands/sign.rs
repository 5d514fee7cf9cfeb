//! `vigil sign` - Sign an image digest as a PKIX attestation.

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use vigil_verify::{key_id_from_ed25519, load_private_key_pem, sign_pkix_ed25519, SimpleSigningPayload};

use crate::exit_codes;

#[derive(Args, Debug)]
pub struct SignArgs {
    /// Private key file (PKCS#8 PEM)
    #[arg(long, short)]
    pub key: PathBuf,

    /// Image manifest digest to attest (sha256:...)
    #[arg(long)]
    pub digest: String,

    /// Docker reference the digest belongs to
    #[arg(long)]
    pub reference: Option<String>,

    /// Key ID to record (default: derived from the public key)
    #[arg(long)]
    pub key_id: Option<String>,

    /// Output attestation file (JSON)
    #[arg(long, short)]
    pub out: PathBuf,
}

pub fn cmd_sign(args: SignArgs) -> i32 {
    match run_sign(args) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            exit_codes::CONFIG_ERROR
        }
    }
}

fn run_sign(args: SignArgs) -> Result<()> {
    if args.digest.trim().is_empty() {
        anyhow::bail!("--digest must not be empty");
    }

    let signing_key = load_private_key_pem(&args.key)?;
    let key_id = match args.key_id {
        Some(id) => id,
        None => key_id_from_ed25519(&signing_key.verifying_key())?,
    };

    let mut payload = SimpleSigningPayload::new(args.digest.trim())
        .with_creator(concat!("vigil ", env!("CARGO_PKG_VERSION")));
    if let Some(reference) = &args.reference {
        payload = payload.with_reference(reference);
    }
    if let Ok(now) = SystemTime::now().duration_since(UNIX_EPOCH) {
        payload = payload.with_timestamp(now.as_secs() as i64);
    }
    let payload = payload.to_vec().context("failed to serialize payload")?;

    let attestation = sign_pkix_ed25519(&signing_key, &key_id, payload);
    let json = attestation.to_json()?;
    fs::write(&args.out, json)
        .with_context(|| format!("failed to write attestation: {}", args.out.display()))?;

    tracing::info!(key_id = %key_id, out = %args.out.display(), "attestation signed");

    println!("Attestation signed successfully:");
    println!("  key_id: {key_id}");
    println!("  digest: {}", args.digest.trim());
    println!("  output: {}", args.out.display());

    Ok(())
}
