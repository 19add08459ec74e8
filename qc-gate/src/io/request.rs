//! Decode the hook request document from stdin.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::core::types::{InvocationRequest, ToolCall, ToolKind};

/// Wire shape. `null` and absent fields both decode as empty.
#[derive(Debug, Deserialize)]
struct RawRequest {
    #[serde(default)]
    tool_name: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    cwd: Option<String>,
    #[serde(default)]
    tool_input: Option<Map<String, Value>>,
}

/// Decode one request document.
///
/// Missing fields default to empty; an empty `cwd` is replaced by
/// `fallback_cwd` so relative targets can still be resolved.
pub fn decode_request(bytes: &[u8], fallback_cwd: &Path) -> Result<InvocationRequest> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        bail!("empty request");
    }
    let raw: RawRequest = serde_json::from_slice(bytes).context("parse request json")?;
    let tool_name = raw.tool_name.unwrap_or_default();
    let tool_input = raw.tool_input.unwrap_or_default();
    let call = match ToolKind::from_tool_name(&tool_name) {
        ToolKind::Execute => ToolCall::Execute {
            command: string_param(&tool_input, "command"),
        },
        ToolKind::EditFile => ToolCall::EditFile {
            file_path: string_param(&tool_input, "file_path"),
        },
        ToolKind::WriteFile => ToolCall::WriteFile {
            file_path: string_param(&tool_input, "file_path"),
        },
        ToolKind::Other => ToolCall::Other,
    };
    let cwd = match raw.cwd {
        Some(cwd) if !cwd.is_empty() => PathBuf::from(cwd),
        _ => fallback_cwd.to_path_buf(),
    };
    Ok(InvocationRequest {
        tool_name,
        session_id: raw.session_id.unwrap_or_default(),
        cwd,
        call,
    })
}

fn string_param(input: &Map<String, Value>, key: &str) -> Option<String> {
    input.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(text: &str) -> Result<InvocationRequest> {
        decode_request(text.as_bytes(), Path::new("/fallback"))
    }

    #[test]
    fn decodes_edit_request() {
        let request = decode(
            r#"{"tool_name":"Edit","session_id":"s1","cwd":"/repo",
                "tool_input":{"file_path":"src/lib.rs","old_string":"a"}}"#,
        )
        .expect("decode");
        assert_eq!(request.tool_name, "Edit");
        assert_eq!(request.session_id, "s1");
        assert_eq!(request.cwd, PathBuf::from("/repo"));
        assert_eq!(request.call.file_path(), Some("src/lib.rs"));
    }

    #[test]
    fn decodes_bash_command() {
        let request = decode(r#"{"tool_name":"Bash","tool_input":{"command":"ls"}}"#)
            .expect("decode");
        assert_eq!(request.call.command(), Some("ls"));
        assert_eq!(request.cwd, PathBuf::from("/fallback"));
    }

    #[test]
    fn non_string_parameters_are_missing() {
        let request =
            decode(r#"{"tool_name":"Write","tool_input":{"file_path":42}}"#).expect("decode");
        assert_eq!(request.call, ToolCall::WriteFile { file_path: None });
    }

    #[test]
    fn unknown_tools_decode_as_other() {
        let request = decode(r#"{"tool_name":"Read","tool_input":{"file_path":"x"}}"#)
            .expect("decode");
        assert_eq!(request.call, ToolCall::Other);
    }

    #[test]
    fn empty_and_malformed_input_fail() {
        assert!(decode("").is_err());
        assert!(decode("  \n").is_err());
        assert!(decode("{not json").is_err());
        assert!(decode("[1,2]").is_err());
        assert!(decode(r#"{"tool_name":7}"#).is_err());
    }

    #[test]
    fn null_fields_decode_as_empty() {
        let request = decode(
            r#"{"tool_name":"Edit","session_id":null,"cwd":null,
                "tool_input":{"file_path":"/repo/src/lib.rs"}}"#,
        )
        .expect("decode");
        assert_eq!(request.session_id, "");
        assert_eq!(request.cwd, PathBuf::from("/fallback"));
        assert_eq!(request.call.file_path(), Some("/repo/src/lib.rs"));

        let request =
            decode(r#"{"tool_name":"Bash","tool_input":null}"#).expect("decode");
        assert_eq!(request.call, ToolCall::Execute { command: None });

        let request = decode(r#"{"tool_name":null}"#).expect("decode");
        assert_eq!(request.call, ToolCall::Other);
    }

    #[test]
    fn session_start_document_decodes() {
        let request =
            decode(r#"{"session_id":"code-tester-1","cwd":"/srv"}"#).expect("decode");
        assert_eq!(request.kind(), ToolKind::Other);
        assert_eq!(request.session_id, "code-tester-1");
    }
}
