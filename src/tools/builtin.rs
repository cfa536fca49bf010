//! Built-in filesystem tools.
//!
//! `list_files` and `read_file` resolve paths against a working directory
//! fixed when the tool is created. Each is constructed via [`AgentTool::new`]
//! and returned as `Arc<dyn Tool>`.
//!
//! ```rust,no_run
//! use skiff::tools::builtin::all_tools;
//!
//! let tools = all_tools(".");
//! assert_eq!(tools.len(), 2);
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::SkiffError;
use crate::tools::tool::{AgentTool, Tool};
use crate::tools::types::AgentToolParameters;

/// Create the `list_files` tool: names of the regular files in a directory.
///
/// Subdirectories are skipped. Names come back sorted.
pub fn list_files_tool(workdir: impl Into<PathBuf>) -> Arc<dyn Tool> {
    let workdir = workdir.into();
    Arc::new(AgentTool::new(
        "list_files",
        "Returns a list of files in the directory.",
        AgentToolParameters::object()
            .string(
                "directory",
                "Directory to list, relative to the working directory. Defaults to '.'",
                false,
            )
            .build(),
        move |args| {
            let workdir = workdir.clone();
            async move {
                let directory = args.get_str_opt("directory").unwrap_or(".").to_string();
                let files = list_files(&workdir.join(&directory), &directory).await?;
                Ok(serde_json::json!(files))
            }
        },
    ))
}

/// Create the `read_file` tool: full text content of one file.
pub fn read_file_tool(workdir: impl Into<PathBuf>) -> Arc<dyn Tool> {
    let workdir = workdir.into();
    Arc::new(AgentTool::new(
        "read_file",
        "Reads the content of a specified file in the directory.",
        AgentToolParameters::object()
            .string("file_name", "The name of the file to read.", true)
            .build(),
        move |args| {
            let workdir = workdir.clone();
            async move {
                let file_name = args.get_str("file_name")?.to_string();
                let content = read_file(&workdir.join(&file_name), &file_name).await?;
                Ok(serde_json::json!(content))
            }
        },
    ))
}

/// Both built-in tools rooted at `workdir`.
pub fn all_tools(workdir: impl Into<PathBuf>) -> Vec<Arc<dyn Tool>> {
    let workdir = workdir.into();
    vec![list_files_tool(workdir.clone()), read_file_tool(workdir)]
}

async fn list_files(path: &Path, shown: &str) -> Result<Vec<String>, SkiffError> {
    let fail = |message: String| SkiffError::tool("list_files", message);

    let mut read_dir = tokio::fs::read_dir(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => fail(format!("Directory '{shown}' does not exist")),
        ErrorKind::PermissionDenied => {
            fail(format!("Permission denied to access directory '{shown}'"))
        }
        _ => fail(format!("Error listing files: {e}")),
    })?;

    let mut files = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| fail(format!("Error listing files: {e}")))?
    {
        // Follows symlinks, so a link to a regular file counts as a file.
        let is_file = tokio::fs::metadata(entry.path())
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if is_file {
            files.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    files.sort();
    Ok(files)
}

async fn read_file(path: &Path, shown: &str) -> Result<String, SkiffError> {
    let fail = |message: String| SkiffError::tool("read_file", message);

    let metadata = tokio::fs::metadata(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => fail(format!("File '{shown}' does not exist")),
        ErrorKind::PermissionDenied => fail(format!("Permission denied to read file '{shown}'")),
        _ => fail(format!("Error reading file: {e}")),
    })?;
    if !metadata.is_file() {
        return Err(fail(format!("'{shown}' is not a file")));
    }

    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => fail(format!("Permission denied to read file '{shown}'")),
        _ => fail(format!("Error reading file: {e}")),
    })?;

    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => decode_latin1(e.as_bytes()),
    })
}

/// Every byte maps to the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
