//! Subcommand implementations.
//!
//! Each command exposes `cmd_*(args) -> i32` and keeps its logic in a
//! `run_*` function returning `anyhow::Result`.

pub mod key_id;
pub mod keygen;
pub mod sign;
pub mod verify;

use super::args::Command;

pub fn dispatch(command: Command) -> i32 {
    match command {
        Command::Keygen(args) => keygen::cmd_keygen(args),
        Command::KeyId(args) => key_id::cmd_key_id(args),
        Command::Sign(args) => sign::cmd_sign(args),
        Command::Verify(args) => verify::cmd_verify(args),
    }
}
