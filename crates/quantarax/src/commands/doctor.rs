//! Doctor command for diagnostics

use quantarax_store::persistence::{config_dir, data_dir, identity_file};

use crate::sandbox;

/// Execute doctor command
pub async fn execute() -> anyhow::Result<()> {
    println!("QuantaraX System Diagnostics");
    println!("============================\n");

    println!("Platform:     {}", std::env::consts::OS);
    println!("Architecture: {}", std::env::consts::ARCH);

    match config_dir() {
        Ok(dir) => println!("Config dir:   {} ({})", dir.display(), if dir.exists() { "present" } else { "missing" }),
        Err(e) => crate::output::color::warning(&format!("Config dir unavailable: {e}")),
    }
    match data_dir() {
        Ok(dir) => println!("Data dir:     {} ({})", dir.display(), if dir.exists() { "present" } else { "missing" }),
        Err(e) => crate::output::color::warning(&format!("Data dir unavailable: {e}")),
    }
    match identity_file() {
        Ok(path) => println!(
            "Identity:     {} ({})",
            path.display(),
            if path.exists() { "present" } else { "not yet generated" }
        ),
        Err(e) => crate::output::color::warning(&format!("Identity path unavailable: {e}")),
    }

    println!(
        "Sandbox:      {} ({})",
        sandbox::sandbox_status(),
        if sandbox::is_sandbox_supported() { "supported" } else { "unsupported, core dumps still disabled" }
    );

    Ok(())
}
