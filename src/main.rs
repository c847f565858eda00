// Command-line front end: hash a new password, or check one against a
// stored hash.

mod auth;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eksblowfish::{generate_salt, verify, BCrypt, Version, DEFAULT_COST};
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

#[derive(Debug, Parser)]
#[command(name = "eksblowfish")]
#[command(version, about = "bcrypt password hashing.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Hashes a password under a fresh random salt
    Hash {
        /// Work factor: the key schedule runs 2^cost rounds (4 to 31)
        #[arg(short, long, env = "EKSBLOWFISH_COST", default_value_t = DEFAULT_COST)]
        cost: u32,

        /// Version tag written into the hash (2, 2a, 2b or 2y)
        #[arg(long, env = "EKSBLOWFISH_SCHEME", default_value = "2b")]
        scheme: Version,
    },

    /// Checks a password against a stored hash
    #[command(arg_required_else_help = true)]
    Verify { hash: String },
}

// Compose to NFKC so that equivalent Unicode input hashes identically
fn normalize_password(password: &str) -> Zeroizing<String> {
    Zeroizing::new(password.nfkc().collect())
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let args = Cli::parse();

    match args.command {
        Commands::Hash { cost, scheme } => {
            let password = normalize_password(&auth::read_password("Enter password to hash: ")?);
            let bcrypt = BCrypt::new(cost, generate_salt())?.with_version(scheme);
            let hashed = bcrypt.hash(password.as_bytes())?;
            println!("{hashed}");
        }
        Commands::Verify { hash } => {
            let password =
                normalize_password(&auth::read_password("Enter password to verify: ")?);
            let is_valid = verify(password.as_bytes(), &hash)
                .context("cannot verify against this hash")?;
            println!(
                "Password verification: {}",
                if is_valid { "success" } else { "failed" }
            );
            if !is_valid {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
