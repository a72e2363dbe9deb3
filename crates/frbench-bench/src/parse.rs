//! Turn model output into workspace changes.
//!
//! Write mode expects exactly one fenced `go` code block holding one or more
//! segments, each opened by `// start of <relative path>` on its own line and
//! closed by `// end of <relative path>`. Patch mode expects a unified diff,
//! possibly wrapped in fences or `<patch>` tags.

use crate::error::BenchError;
use frbench_store::workspace::is_test_file;
use frbench_store::FileWrite;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::warn;

static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)```go\n(.*?)```").unwrap());

static START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^// start of (\S.*?)\s*$").unwrap());

static END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^// end of (\S.*?)\s*$").unwrap());

/// Extract the files of a write-mode response.
///
/// Test files are dropped; the model may not change tests. Markers must sit
/// on their own line and every segment must be closed by the end marker for
/// its own path; anything else is a parse error.
pub fn parse_files(content: &str) -> Result<Vec<FileWrite>, BenchError> {
    let blocks: Vec<_> = BLOCK_RE.captures_iter(content).collect();
    let block = match blocks.as_slice() {
        [] => return Err(BenchError::Parse("no code block found".into())),
        [one] => one.get(1).map_or("", |m| m.as_str()),
        many => {
            return Err(BenchError::Parse(format!(
                "{} code blocks found, expected one",
                many.len()
            )))
        }
    };

    let mut files = Vec::new();
    let mut open: Option<(&str, String)> = None;
    for line in block.split_inclusive('\n') {
        let bare = line.trim_end_matches(['\n', '\r']);
        let start = START_RE.captures(bare).and_then(|c| c.get(1)).map(|m| m.as_str());
        let end = END_RE.captures(bare).and_then(|c| c.get(1)).map(|m| m.as_str());

        match (open.take(), start, end) {
            (None, Some(rel), _) => open = Some((rel, String::new())),
            (None, None, Some(rel)) => {
                return Err(BenchError::Parse(format!(
                    "end of {rel} without a matching start marker"
                )))
            }
            (None, None, None) => {}
            (Some((cur, _)), Some(rel), _) => {
                return Err(BenchError::Parse(format!(
                    "start of {rel} inside open segment {cur}"
                )))
            }
            (Some((cur, _)), None, Some(rel)) if rel != cur => {
                return Err(BenchError::Parse(format!(
                    "end of {rel} closes open segment {cur}"
                )))
            }
            (Some((cur, body)), None, Some(_)) => push_file(&mut files, cur, body),
            (Some((cur, mut body)), None, None) => {
                body.push_str(line);
                open = Some((cur, body));
            }
        }
    }

    if let Some((cur, _)) = open {
        return Err(BenchError::Parse(format!("segment {cur} has no end marker")));
    }
    if files.is_empty() {
        return Err(BenchError::Parse("no file segments in code block".into()));
    }
    Ok(files)
}

fn push_file(files: &mut Vec<FileWrite>, rel: &str, body: String) {
    if is_test_file(Path::new(rel)) {
        warn!(file = rel, "ignoring test file in model output");
        return;
    }
    files.push(FileWrite::new(rel, body));
}

/// Strip fences and `<patch>` tags from a diff and make it newline-terminated.
pub fn clean_patch(content: &str) -> Result<Vec<u8>, BenchError> {
    let mut patch = content.to_string();
    if !patch.ends_with('\n') {
        patch.push('\n');
    }
    for wrapper in ["```diff\n", "```\n", "<patch>\n", "</patch>\n"] {
        patch = patch.replace(wrapper, "");
    }
    if patch.trim().is_empty() {
        return Err(BenchError::Parse("empty patch".into()));
    }
    if !patch.ends_with('\n') {
        patch.push('\n');
    }
    Ok(patch.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parses_multiple_segments() {
        let response = "Here you go:\n```go\n// start of main.go\npackage main\n\nfunc main() {}\n// end of main.go\n// start of pkg/util.go\npackage pkg\n// end of pkg/util.go\n```\n";
        let files = parse_files(response).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].rel_path, PathBuf::from("main.go"));
        assert_eq!(files[0].content, b"package main\n\nfunc main() {}\n");
        assert_eq!(files[1].rel_path, PathBuf::from("pkg/util.go"));
        assert_eq!(files[1].content, b"package pkg\n");
    }

    #[test]
    fn todo_greeting_response() {
        let response = "```go\n// start of main.go\npackage main\n\nimport \"fmt\"\n\nfunc getMessage() string {\n\treturn \"This will be a TODO list!\"\n}\n\nfunc main() {\n\tfmt.Println(getMessage())\n}\n// end of main.go\n```";
        let files = parse_files(response).unwrap();
        assert_eq!(files.len(), 1);
        let body = String::from_utf8(files[0].content.clone()).unwrap();
        assert!(body.contains("return \"This will be a TODO list!\""));
    }

    #[test]
    fn missing_block_is_error() {
        let err = parse_files("// start of main.go\npackage main\n// end of main.go\n").unwrap_err();
        assert!(err.to_string().contains("no code block"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn multiple_blocks_are_ambiguous() {
        let response = "```go\n// start of a.go\na\n// end of a.go\n```\ntext\n```go\n// start of b.go\nb\n// end of b.go\n```\n";
        let err = parse_files(response).unwrap_err();
        assert!(err.to_string().contains("2 code blocks"));
    }

    #[test]
    fn block_without_markers_is_error() {
        let err = parse_files("```go\npackage main\n```\n").unwrap_err();
        assert!(err.to_string().contains("no file segments"));
    }

    #[test]
    fn test_files_are_dropped() {
        let response = "```go\n// start of main.go\nm\n// end of main.go\n// start of 1_test.go\nt\n// end of 1_test.go\n```";
        let files = parse_files(response).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].rel_path, PathBuf::from("main.go"));
    }

    #[test]
    fn end_prefixed_comment_stays_in_body() {
        let response = "```go\n// start of main.go\npackage main\n// endpoint handler\nfunc h() {}\n// end of main.go\n```\n";
        let files = parse_files(response).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(
            files[0].content,
            b"package main\n// endpoint handler\nfunc h() {}\n"
        );
    }

    #[test]
    fn unterminated_segment_is_error() {
        let response = "```go\n// start of main.go\npackage main\n```\n";
        let err = parse_files(response).unwrap_err();
        assert!(err.to_string().contains("main.go has no end marker"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn start_inside_open_segment_is_error() {
        let response = "```go\n// start of a.go\npackage a\n// start of b.go\npackage b\n// end of b.go\n```\n";
        let err = parse_files(response).unwrap_err();
        assert!(err.to_string().contains("start of b.go inside open segment a.go"));
    }

    #[test]
    fn mismatched_end_path_is_error() {
        let response = "```go\n// start of a.go\npackage a\n// end of b.go\n```\n";
        let err = parse_files(response).unwrap_err();
        assert!(err.to_string().contains("end of b.go closes open segment a.go"));
    }

    #[test]
    fn stray_end_marker_is_error() {
        let response = "```go\n// end of a.go\n```\n";
        let err = parse_files(response).unwrap_err();
        assert!(err.to_string().contains("without a matching start marker"));
    }

    #[test]
    fn clean_patch_strips_wrappers() {
        let raw = "```diff\n--- a/app/main.go\n+++ b/app/main.go\n@@ -1 +1 @@\n-a\n+b\n```";
        let patch = clean_patch(raw).unwrap();
        assert_eq!(
            String::from_utf8(patch).unwrap(),
            "--- a/app/main.go\n+++ b/app/main.go\n@@ -1 +1 @@\n-a\n+b\n"
        );

        let tagged = clean_patch("<patch>\n--- x\n+++ x\n</patch>\n").unwrap();
        assert_eq!(tagged, b"--- x\n+++ x\n");
    }

    #[test]
    fn empty_patch_is_error() {
        assert!(clean_patch("```diff\n```\n").is_err());
    }
}
