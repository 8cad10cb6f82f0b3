//! Prints an Argon2 PHC hash for a password, for provisioning account rows.
//!
//! $ cargo run --bin hash_password -- 'S3cret#pass'

use clap::Parser;
use loginguard::application_impl::Argon2CredentialVerifier;

#[derive(Parser, Debug)]
struct Args {
    password: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let hash = Argon2CredentialVerifier::hash_password(&args.password)?;
    println!("{}", hash);
    Ok(())
}
