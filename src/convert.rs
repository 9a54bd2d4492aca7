//! External texture-compression wrapper.
//!
//! Composed sheets stay plain PNG; shipping them in a compressed
//! texture format is delegated to whatever converter the project uses
//! (etcpack, astcenc, ...). This module spawns the configured tool
//! with explicit flags and renames its output to the target extension.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::error::{PressError, Result};

/// Converter configuration, embedded in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressSpec {
    /// Converter executable name.
    pub tool: String,

    /// Target compressed format, passed to the tool as `-<format>`.
    pub format: String,

    /// Flip sheets vertically during conversion.
    #[serde(default)]
    pub flip_vertical: bool,

    /// Rename the tool's output to this extension.
    #[serde(default)]
    pub extension: Option<String>,
}

/// Return `true` when the converter can be invoked from `PATH`.
pub fn is_tool_on_path(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

/// Run the converter on one file, writing into `out_dir`.
///
/// The tool is expected to keep the input's filename; when
/// `spec.extension` is set the produced file is renamed to it.
/// Returns the path of the converted file.
pub fn convert_file(input: &Path, spec: &CompressSpec, out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir).map_err(|e| PressError::Io {
        path: out_dir.to_path_buf(),
        message: format!("could not create output directory: {}", e),
    })?;

    let output = Command::new(&spec.tool)
        .args(command_args(input, spec, out_dir))
        .output()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PressError::Convert {
                message: format!("could not run '{}'", spec.tool),
                help: Some(format!("is '{}' installed and on PATH?", spec.tool)),
            },
            _ => PressError::Convert {
                message: format!("failed to run '{}': {}", spec.tool, e),
                help: None,
            },
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PressError::Convert {
            message: format!(
                "'{}' exited with status {}: {}",
                spec.tool,
                output.status,
                stderr.trim()
            ),
            help: None,
        });
    }

    let filename = input.file_name().ok_or_else(|| PressError::Convert {
        message: format!("input '{}' has no filename", input.display()),
        help: None,
    })?;
    let produced = out_dir.join(filename);
    if !produced.exists() {
        return Err(PressError::Convert {
            message: format!(
                "'{}' succeeded but produced no output at {}",
                spec.tool,
                produced.display()
            ),
            help: None,
        });
    }

    match &spec.extension {
        Some(ext) => {
            let renamed = produced.with_extension(ext);
            fs::rename(&produced, &renamed).map_err(|e| PressError::Io {
                path: produced,
                message: format!("could not rename converted output: {}", e),
            })?;
            Ok(renamed)
        }
        None => Ok(produced),
    }
}

fn command_args(input: &Path, spec: &CompressSpec, out_dir: &Path) -> Vec<OsString> {
    let mut args = vec![OsString::from(format!(
        "-{}",
        spec.format.to_ascii_lowercase()
    ))];
    if spec.flip_vertical {
        args.push("-flip".into());
    }
    args.push(input.as_os_str().to_os_string());
    args.push(out_dir.as_os_str().to_os_string());
    args
}
