//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for the rag-search CLI.

use crate::rag::persist::BuildInfo;
use crate::types::QueryHit;
use owo_colors::OwoColorize;

/// Longest hit excerpt printed before truncation, in chars.
const EXCERPT_CHARS: usize = 240;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a step message (for multi-step operations)
    pub fn step(&self, step_num: u32, total: u32, message: &str) {
        if self.colored {
            println!(
                "  {} {}",
                format!("[{}/{}]", step_num, total).dimmed(),
                message.bright_white()
            );
        } else {
            println!("  [{}/{}] {}", step_num, total, message);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print a hint/tip message
    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "💡".dimmed(), message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// Print a command suggestion
    pub fn command(&self, cmd: &str) {
        if self.colored {
            println!("     {}", format!("$ {}", cmd).bright_cyan());
        } else {
            println!("     $ {}", cmd);
        }
    }

    /// Print one retrieved chunk with its rank and distance
    pub fn hit(&self, rank: usize, hit: &QueryHit) {
        let excerpt = excerpt(&hit.text);
        if self.colored {
            println!(
                "\n  {} {} {}",
                format!("#{}", rank).bright_cyan().bold(),
                hit.source.bright_white(),
                format!("(distance {:.4}, position {})", hit.distance, hit.position).dimmed()
            );
            println!("    {}", excerpt);
        } else {
            println!(
                "\n  #{} {} (distance {:.4}, position {})",
                rank, hit.source, hit.distance, hit.position
            );
            println!("    {}", excerpt);
        }
    }

    /// Print an LLM answer
    pub fn answer(&self, text: &str) {
        if self.colored {
            println!("\n{}\n", text.bright_white());
        } else {
            println!("\n{}\n", text);
        }
    }

    /// Print the build info of a persisted store
    pub fn build_info(&self, info: &BuildInfo, vectors: usize) {
        self.kv("Build", &info.build_id);
        self.kv("Created", &info.created_at.to_rfc3339());
        self.kv("Embedding model", &info.embedding_model);
        self.kv("Dimensions", &info.dimensions.to_string());
        self.kv(
            "Chunking",
            &format!("{} chars, {} overlap", info.chunk_size, info.chunk_overlap),
        );
        self.kv("Vectors", &vectors.to_string());
    }
}

/// Collapse whitespace and cut to [`EXCERPT_CHARS`].
fn excerpt(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= EXCERPT_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_no_color() {
        assert!(Output::new().colored);
        assert!(!Output::no_color().colored);
        assert!(Output::default().colored);
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("a\n\n  b\tc"), "a b c");

        let long = "é".repeat(EXCERPT_CHARS + 10);
        let cut = excerpt(&long);
        assert_eq!(cut.chars().count(), EXCERPT_CHARS + 1);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_output_methods_no_panic() {
        let hit = QueryHit {
            position: 4,
            distance: 0.25,
            text: "SELECT * FROM invoices;".to_string(),
            source: "data/schema.sql".to_string(),
        };

        for output in [Output::no_color(), Output::new()] {
            output.success("test success");
            output.info("test info");
            output.warning("test warning");
            output.error("test error");
            output.step(1, 3, "step message");
            output.header("Test Header");
            output.kv("key", "value");
            output.hint("hint message");
            output.command("some command");
            output.hit(1, &hit);
            output.answer("an answer");
        }
    }
}
