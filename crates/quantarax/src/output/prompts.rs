//! User prompts and input

use std::io;

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Password, Select};

/// Prompt for yes/no confirmation
pub fn confirm(message: &str) -> io::Result<bool> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
}

/// Prompt for password input (input is not echoed)
pub fn password_prompt(message: &str) -> io::Result<String> {
    Password::with_theme(&ColorfulTheme::default())
        .with_prompt(message)
        .interact()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
}

/// Select from a list of options, returning the chosen index
pub fn select<T: ToString>(message: &str, options: &[T]) -> io::Result<usize> {
    Select::with_theme(&ColorfulTheme::default())
        .with_prompt(message)
        .items(options)
        .default(0)
        .interact()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
}
