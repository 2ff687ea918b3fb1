// Interactive front end: hash a password, or check one against a stored hash.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use bcrypt_rust::{hash, hash_with_salt, normalize_password, radix64, verify, DEFAULT_COST, SALT_LEN};
use clap::{Parser, Subcommand};
use rpassword::read_password;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroizing;

#[derive(Debug, Parser)]
#[command(name = "bcrypt-rust", version, about = "Hash and verify passwords with bcrypt")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read a password and print its bcrypt hash
    Hash {
        /// Work factor, 4 to 31
        #[arg(short, long, env = "BCRYPT_COST", default_value_t = DEFAULT_COST)]
        cost: u32,

        /// Fixed salt as 22 radix-64 characters, instead of a random one
        #[arg(long)]
        salt: Option<String>,

        /// Apply Unicode NFKC normalization to the password first
        #[arg(long)]
        normalize: bool,
    },
    /// Read a password and check it against a bcrypt hash
    Verify {
        /// The stored `$2a$`/`$2b$` hash
        hash: String,

        /// Apply Unicode NFKC normalization to the password first
        #[arg(long)]
        normalize: bool,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Hash {
            cost,
            salt,
            normalize,
        } => {
            let password = prompt("Enter password to hash: ", normalize)?;
            let hashed = match salt {
                Some(encoded) => {
                    let salt = decode_salt(&encoded)?;
                    hash_with_salt(password.as_bytes(), &salt, cost)?
                }
                None => hash(password.as_bytes(), cost)?,
            };
            info!(cost, "hashed password");
            println!("{}", hashed);
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify { hash, normalize } => {
            let password = prompt("Enter password to verify: ", normalize)?;
            let is_valid = verify(password.as_bytes(), &hash)
                .context("Could not read the stored hash")?;
            if is_valid {
                println!("match");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("no match");
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn prompt(message: &str, normalize: bool) -> Result<Zeroizing<String>> {
    // Read password securely (without displaying it)
    eprint!("{}", message);
    io::stderr().flush()?;
    let password = Zeroizing::new(read_password().context("Could not read password")?);

    if normalize {
        Ok(Zeroizing::new(normalize_password(&password)))
    } else {
        Ok(password)
    }
}

fn decode_salt(encoded: &str) -> Result<Vec<u8>> {
    if encoded.len() != 22 {
        bail!("Salt must be 22 radix-64 characters, got {}", encoded.len());
    }
    let salt = radix64::decode(encoded, SALT_LEN)?;
    Ok(salt)
}
