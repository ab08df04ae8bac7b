use console::style;
use std::fmt::Display;

/// Centralized output formatting utilities for consistent CLI presentation
pub struct Output;

impl Output {
    /// Print a success message with checkmark
    pub fn success<T: Display>(message: T) {
        println!("{} {}", style("✓").green(), message);
    }

    /// Print an error message with X mark
    pub fn error<T: Display>(message: T) {
        println!("{} {}", style("✗").red(), message);
    }

    /// Print a warning message with warning emoji
    pub fn warning<T: Display>(message: T) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    /// Print an info message with info emoji
    pub fn info<T: Display>(message: T) {
        println!("{} {}", style("ℹ").cyan(), message);
    }

    /// Print a sub-item with arrow prefix
    pub fn sub_item<T: Display>(message: T) {
        println!("  {} {}", style("→").dim(), message);
    }

    /// Print a section header
    pub fn section<T: Display>(title: T) {
        println!("\n{}", style(title).bold().underlined());
    }

    /// Print a tip/suggestion
    pub fn tip<T: Display>(message: T) {
        println!("{} {}", style("TIP:").cyan(), style(message).dim());
    }

    /// Print a command example
    pub fn command_example<T: Display>(command: T) {
        println!("  {}", style(command).yellow());
    }

    /// Print a `key = value` line, masking secrets
    pub fn key_value(key: &str, value: &str) {
        println!("{} = {}", style(key).cyan(), display_value(key, value));
    }
}

/// What to show for a configuration value: `(not set)` for empty values,
/// and only a short prefix of tokens.
pub fn display_value(key: &str, value: &str) -> String {
    if value.is_empty() {
        "(not set)".to_string()
    } else if key.contains("token") || key.contains("password") {
        let prefix: String = value.chars().take(4).collect();
        format!("{prefix}***")
    } else {
        value.to_string()
    }
}
