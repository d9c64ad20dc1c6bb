//! Colored output helpers

use owo_colors::OwoColorize;

/// Render `text` in `style`'s color without printing it.
pub fn styled(text: &str, style: &str) -> String {
    match style {
        "red" => text.red().to_string(),
        "green" => text.green().to_string(),
        "yellow" => text.yellow().to_string(),
        "blue" => text.blue().to_string(),
        "cyan" => text.cyan().to_string(),
        "dimmed" => text.dimmed().to_string(),
        _ => text.to_string(),
    }
}

/// Print warning message
pub fn warning(text: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), text);
}

/// Print error message
pub fn error(text: &str) {
    eprintln!("{} {}", "error:".red().bold(), text);
}

/// Print success message
pub fn success(text: &str) {
    println!("{} {}", "✓".green().bold(), text);
}

/// Print info message
pub fn info(text: &str) {
    println!("{} {}", "info:".cyan(), text);
}
