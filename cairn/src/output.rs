//! Output formatting for CLI commands.
//!
//! Every command produces a serializable DTO; text mode renders it through a
//! closure, JSON mode prints it as-is.

use anyhow::Result;
use cairn_core::{Hash, Node, ObjectType, Path, TreeEntry};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Writes command results to stdout and errors to stderr.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
        }
    }

    /// Write `data` as JSON, or the result of `text_fn` in text mode.
    pub fn write<T: Serialize>(&self, data: &T, text_fn: impl FnOnce() -> String) -> Result<()> {
        let mut stdout = io::stdout().lock();
        match self.format {
            OutputFormat::Json => {
                writeln!(stdout, "{}", serde_json::to_string_pretty(data)?)?;
            }
            OutputFormat::Text => {
                let text = text_fn();
                if !text.is_empty() {
                    write!(stdout, "{}", text)?;
                }
            }
        }
        Ok(())
    }

    /// Report a failed command on stderr.
    pub fn write_error(&self, error: &anyhow::Error, result_code: u8) {
        let mut stderr = io::stderr().lock();
        match self.format {
            OutputFormat::Json => {
                let output = ErrorOutput {
                    success: false,
                    result_code,
                    error: format!("{:#}", error),
                };
                if let Ok(json) = serde_json::to_string_pretty(&output) {
                    let _ = writeln!(stderr, "{}", json);
                }
            }
            OutputFormat::Text => {
                let _ = writeln!(stderr, "Error: {:#}", error);
            }
        }
    }
}

// ============================================================================
// Data Transfer Objects (DTOs) for JSON output
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub success: bool,
    pub result_code: u8,
    pub error: String,
}

/// Output for `init`.
#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub result_code: u8,
    pub root: String,
    pub algorithm: String,
}

/// One imported path in `add`.
#[derive(Debug, Clone, Serialize)]
pub struct AddedObject {
    pub hash: Hash,
    pub path: String,
    pub content_path: Path,
}

/// Output for `add`.
#[derive(Debug, Serialize)]
pub struct AddOutput {
    pub success: bool,
    pub result_code: u8,
    pub objects: Vec<AddedObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<NameInfo>,
}

/// Output for `resolve`.
#[derive(Debug, Serialize)]
pub struct ResolveOutput {
    pub success: bool,
    pub result_code: u8,
    pub input: Path,
    pub node: Node,
}

/// A tree entry as shown by `ls`.
#[derive(Debug, Clone, Serialize)]
pub struct EntryInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ObjectType,
    pub mode: String,
    pub hash: Hash,
}

impl From<TreeEntry> for EntryInfo {
    fn from(entry: TreeEntry) -> Self {
        Self {
            name: entry.name,
            kind: entry.kind,
            mode: format!("{:06o}", entry.mode),
            hash: entry.hash,
        }
    }
}

/// Output for `ls`.
#[derive(Debug, Serialize)]
pub struct LsOutput {
    pub success: bool,
    pub result_code: u8,
    pub node: Node,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<EntryInfo>,
}

/// A name and its current target.
#[derive(Debug, Clone, Serialize)]
pub struct NameInfo {
    pub name: String,
    pub target: Path,
}

/// Output for `name set` and `name get`.
#[derive(Debug, Serialize)]
pub struct NameOutput {
    pub success: bool,
    pub result_code: u8,
    #[serde(flatten)]
    pub name: NameInfo,
}

/// Output for `name list`.
#[derive(Debug, Serialize)]
pub struct NameListOutput {
    pub success: bool,
    pub result_code: u8,
    pub names: Vec<NameInfo>,
}

/// Output for `name rm`.
#[derive(Debug, Serialize)]
pub struct NameRmOutput {
    pub success: bool,
    pub result_code: u8,
    pub name: String,
}
