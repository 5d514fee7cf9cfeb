//! `vigil key-id` - Print the key ID of a public key.

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;

use vigil_verify::compute_key_id_from_key_data;

use crate::exit_codes;

#[derive(Args, Debug)]
pub struct KeyIdArgs {
    /// Public key file (SPKI PEM or DER)
    pub public_key: PathBuf,
}

pub fn cmd_key_id(args: KeyIdArgs) -> i32 {
    match run_key_id(&args) {
        Ok(key_id) => {
            println!("{key_id}");
            exit_codes::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            exit_codes::CONFIG_ERROR
        }
    }
}

fn run_key_id(args: &KeyIdArgs) -> Result<String> {
    let key_data = fs::read(&args.public_key)
        .with_context(|| format!("failed to read public key: {}", args.public_key.display()))?;

    compute_key_id_from_key_data(&key_data).with_context(|| {
        format!(
            "not an SPKI public key: {}",
            args.public_key.display()
        )
    })
}
