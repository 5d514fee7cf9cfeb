//! Process exit codes. Part of the public contract.
//!
//! Verification failures use [`vigil_verify::VerificationError::exit_code`]:
//! 3 for key problems, 4 for signature or digest failures, 5 for payload
//! extraction. Usage errors exit with clap's code 2.

pub const SUCCESS: i32 = 0;
pub const CONFIG_ERROR: i32 = 1; // Unreadable key set, config or input files
