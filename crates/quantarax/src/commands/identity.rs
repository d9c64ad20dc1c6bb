//! Identity command implementation

use base64::{engine::general_purpose::STANDARD, Engine};
use quantarax_store::identity::{fingerprint_emoji, fingerprint_hex, load_or_generate};
use quantarax_store::persistence::identity_file;

use crate::cli::{IdentityArgs, IdentityCommands};

/// Execute identity command
pub async fn execute(args: IdentityArgs) -> anyhow::Result<()> {
    match args.command {
        Some(IdentityCommands::Generate) => generate(),
        Some(IdentityCommands::Show) => show(),
        Some(IdentityCommands::Fingerprint { emoji }) => fingerprint(emoji),
        None => show(),
    }
}

fn generate() -> anyhow::Result<()> {
    let path = identity_file()?;
    let already_existed = path.exists();
    let signer = load_or_generate(&path)?;

    if already_existed {
        crate::output::color::info("Identity already exists; kept the existing keypair.");
    } else {
        crate::output::color::success("Identity generated.");
    }
    println!("Fingerprint: {}", fingerprint_hex(&signer.verifying_key_bytes()));
    Ok(())
}

fn show() -> anyhow::Result<()> {
    let path = identity_file()?;
    let signer = load_or_generate(&path)?;
    let pk = signer.verifying_key_bytes();

    println!("Identity");
    println!("  Public key:  {}", STANDARD.encode(pk));
    println!("  Fingerprint: {}", fingerprint_hex(&pk));
    println!("  Stored at:   {}", path.display());
    Ok(())
}

fn fingerprint(emoji: bool) -> anyhow::Result<()> {
    let path = identity_file()?;
    let signer = load_or_generate(&path)?;
    let pk = signer.verifying_key_bytes();

    let fp = if emoji { fingerprint_emoji(&pk) } else { fingerprint_hex(&pk) };
    println!("{}", fp);
    Ok(())
}
