use colored::Colorize;
use console::Term;
use std::io;
use std::path::Path;

use crate::application::use_cases::materialize_application::MaterializeEvent;

/// Display utilities for the CLI interface
#[derive(Clone)]
pub struct DisplayHelper {
    pub use_color: bool,
    pub verbose: bool,
    pub terminal: Term,
}

impl DisplayHelper {
    /// Create a new DisplayHelper
    pub fn new(use_color: bool) -> Self {
        Self {
            use_color,
            verbose: false,
            terminal: Term::stdout(),
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.use_color {
            println!("{} {}", "✓".green().bold(), message);
        } else {
            println!("[SUCCESS] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "✗".red().bold(), message);
        } else {
            eprintln!("[ERROR] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.use_color {
            println!("{} {}", "⚠".yellow().bold(), message);
        } else {
            println!("[WARNING] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.use_color {
            println!("{} {}", "::".blue().bold(), message);
        } else {
            println!("[INFO] {}", message);
        }
    }

    /// Print a debug message (only if verbose is enabled)
    pub fn debug(&self, message: &str) {
        if self.verbose {
            if self.use_color {
                println!("{} {}", "->".dimmed(), message.dimmed());
            } else {
                println!("[DEBUG] {}", message);
            }
        }
    }

    /// Format a file path relative to the current directory when possible
    pub fn format_path(&self, path: &Path) -> String {
        let shown = std::env::current_dir()
            .ok()
            .and_then(|cwd| pathdiff::diff_paths(path, cwd))
            .filter(|relative| !relative.as_os_str().is_empty())
            .unwrap_or_else(|| path.to_path_buf());
        let shown = shown.display().to_string();

        if self.use_color {
            shown.cyan().to_string()
        } else {
            format!("'{}'", shown)
        }
    }

    /// Format a URL with appropriate styling
    pub fn format_url(&self, url: &str) -> String {
        if self.use_color {
            url.blue().underline().to_string()
        } else {
            url.to_string()
        }
    }

    /// Format a command with appropriate styling
    pub fn format_command(&self, command: &str) -> String {
        if self.use_color {
            command.magenta().bold().to_string()
        } else {
            format!("`{}`", command)
        }
    }

    /// Format a repository or application name with appropriate styling
    pub fn format_name(&self, name: &str) -> String {
        if self.use_color {
            name.cyan().bold().to_string()
        } else {
            format!("'{}'", name)
        }
    }

    /// Print a list with bullets
    pub fn print_list(&self, items: &[&str]) {
        for item in items {
            if self.use_color {
                println!("  {} {}", "•".blue(), item);
            } else {
                println!("  - {}", item);
            }
        }
    }

    /// Print a progress line for one materialization step
    pub fn print_materialize_event(&self, event: &MaterializeEvent) {
        match event {
            MaterializeEvent::PreSetupStarted { command } => {
                self.info(&format!("Running pre-setup: {}", self.format_command(command)));
            }
            MaterializeEvent::RepositoryPresent { name } => {
                self.success(&format!("Repository {} already cloned", self.format_name(name)));
            }
            MaterializeEvent::CloningRepository { name, url } => {
                self.info(&format!(
                    "Cloning {} from {}",
                    self.format_name(name),
                    self.format_url(url)
                ));
            }
            MaterializeEvent::RepositoryCloned { name, .. } => {
                self.success(&format!("Cloned {}", self.format_name(name)));
            }
            MaterializeEvent::DependencySkipped { name } => {
                self.warning(&format!(
                    "Repository {} is not defined in the manifest, skipping",
                    self.format_name(name)
                ));
            }
            MaterializeEvent::Linked { name, link, .. } => {
                self.debug(&format!("Linked {} at {}", name, link.display()));
            }
            MaterializeEvent::PostSetupStarted { command } => {
                self.info(&format!("Running post-setup: {}", self.format_command(command)));
            }
        }
    }

    /// Prompt for confirmation; only `y` or `Y` confirms
    pub fn confirm(&self, message: &str) -> io::Result<bool> {
        let prompt = if self.use_color {
            format!("{} {} (y/N): ", "?".yellow().bold(), message)
        } else {
            format!("[CONFIRM] {} (y/N): ", message)
        };
        self.terminal.write_str(&prompt)?;
        self.terminal.flush()?;

        let input = self.terminal.read_line()?;
        Ok(is_confirmation(&input))
    }
}

fn is_confirmation(input: &str) -> bool {
    matches!(input.trim(), "y" | "Y")
}

/// Helper functions for common display patterns
pub mod helpers {
    use super::*;

    /// Create a display helper with color detection
    pub fn auto_display(no_color: bool) -> DisplayHelper {
        let use_color = !no_color
            && atty::is(atty::Stream::Stdout)
            && std::env::var_os("NO_COLOR").is_none();
        DisplayHelper::new(use_color)
    }
}
