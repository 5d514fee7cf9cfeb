use clap::{Parser, Subcommand, ValueEnum};

use super::commands::{key_id, keygen, sign, verify};

#[derive(Parser, Debug)]
#[command(
    name = "vigil",
    version,
    about = "Sign and verify container image attestations"
)]
pub struct Cli {
    /// Log output format (stderr)
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate an ed25519 keypair for signing
    Keygen(keygen::KeygenArgs),

    /// Print the key ID of a public key
    KeyId(key_id::KeyIdArgs),

    /// Sign an image digest, producing an attestation
    Sign(sign::SignArgs),

    /// Verify attestations against a key set and an expected digest
    Verify(verify::VerifyArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
