//! `vigil keygen` - Create an Ed25519 signing key and its key-set entry.
//!
//! Writes `private_key.pem` (PKCS#8, owner-only) and `public_key.pem` (SPKI)
//! into `--out`, then prints the derived key ID and a key-set entry that
//! `vigil verify --keys` accepts as is.

use anyhow::{Context, Result};
use clap::Args;
use ed25519_dalek::SigningKey;
use pkcs8::{EncodePrivateKey, LineEnding};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use vigil_verify::{public_key_from_ed25519, KeyEntry, KeySetFile, PublicKey};

use crate::exit_codes;

const PRIVATE_KEY_FILE: &str = "private_key.pem";
const PUBLIC_KEY_FILE: &str = "public_key.pem";

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Directory receiving the key files
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Display name recorded in the printed key-set entry
    #[arg(long)]
    pub name: Option<String>,

    /// Replace key files that already exist
    #[arg(long, short)]
    pub force: bool,
}

pub fn cmd_keygen(args: KeygenArgs) -> i32 {
    match run_keygen(&args) {
        Ok(entry) => {
            print_summary(&args.out, &entry);
            exit_codes::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            exit_codes::CONFIG_ERROR
        }
    }
}

fn run_keygen(args: &KeygenArgs) -> Result<KeyEntry> {
    let private_path = args.out.join(PRIVATE_KEY_FILE);
    let public_path = args.out.join(PUBLIC_KEY_FILE);

    if !args.force {
        if let Some(existing) = [&private_path, &public_path].into_iter().find(|p| p.exists()) {
            anyhow::bail!("refusing to overwrite {} (pass --force)", existing.display());
        }
    }
    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;

    let signing_key = SigningKey::generate(&mut rand::thread_rng());
    let public = public_key_from_ed25519(&signing_key.verifying_key())?;

    let private_pem = signing_key
        .to_pkcs8_pem(LineEnding::LF)
        .context("failed to encode private key")?;
    write_owner_only(&private_path, private_pem.as_bytes())?;

    let public_pem = public
        .to_spki_pem()
        .context("failed to encode public key")?;
    fs::write(&public_path, public_pem)
        .with_context(|| format!("failed to write {}", public_path.display()))?;

    tracing::info!(key_id = %public.id(), out = %args.out.display(), "generated signing key");
    Ok(key_entry(&public, PathBuf::from(PUBLIC_KEY_FILE), args.name.clone()))
}

/// Key-set entry for `public`, pointing at its PEM file.
fn key_entry(public: &PublicKey, path: PathBuf, name: Option<String>) -> KeyEntry {
    KeyEntry {
        id: public.id().to_string(),
        key_type: public.key_type().clone(),
        pem: None,
        der_base64: None,
        path: Some(path),
        name,
    }
}

/// Create `path` with mode 0600.
fn write_owner_only(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(0o600);
        // `mode` only applies on creation; tighten a key being replaced.
        if path.exists() {
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))
                .with_context(|| format!("failed to restrict {}", path.display()))?;
        }
    }
    options
        .open(path)
        .and_then(|mut file| file.write_all(contents))
        .with_context(|| format!("failed to write {}", path.display()))
}

fn print_summary(out: &Path, entry: &KeyEntry) {
    println!("Wrote {} and {}", out.join(PRIVATE_KEY_FILE).display(), out.join(PUBLIC_KEY_FILE).display());
    println!();
    println!("key_id: {}", entry.id);
    println!();

    let snippet = KeySetFile {
        keys: vec![entry.clone()],
    };
    match serde_yaml::to_string(&snippet) {
        Ok(yaml) => {
            println!("Key-set entry (path relative to {}):", out.display());
            println!();
            print!("{yaml}");
        }
        Err(e) => tracing::warn!(error = %e, "failed to render key-set entry"),
    }
}
