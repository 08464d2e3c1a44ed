use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub input: Option<PathBuf>,
    pub format: OutputFormat,
    pub strict: bool,
    pub log_level: String,
}

#[derive(Parser, Debug)]
#[command(name = "lsp-capture")]
#[command(about = "Classify captured LSP JSON-RPC traffic", long_about = None)]
pub struct Cli {
    /// Capture file with one JSON log record per line (stdin when omitted)
    input: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Abort on the first record that cannot be parsed
    #[arg(long)]
    pub strict: bool,
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn from_args() -> Self {
        Self::parse()
    }

    pub fn into_config(self) -> Config {
        Config {
            input: self.input.filter(|p| p.as_os_str() != "-"),
            format: self.format,
            strict: self.strict,
            log_level: self.log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Cli::parse_from(["lsp-capture"]).into_config();
        assert_eq!(config.input, None);
        assert_eq!(config.format, OutputFormat::Text);
        assert!(!config.strict);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_explicit_args() {
        let config = Cli::parse_from([
            "lsp-capture",
            "capture.jsonl",
            "--format",
            "json",
            "--strict",
            "--log-level",
            "debug",
        ])
        .into_config();
        assert_eq!(config.input, Some(PathBuf::from("capture.jsonl")));
        assert_eq!(config.format, OutputFormat::Json);
        assert!(config.strict);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_dash_means_stdin() {
        let config = Cli::parse_from(["lsp-capture", "-"]).into_config();
        assert_eq!(config.input, None);
    }
}
