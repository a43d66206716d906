//! Bulk upload handling with per-file outcomes.
//!
//! An upload batch is best-effort: every file move is attempted
//! independently and concurrently, and one failure never aborts or rolls
//! back its siblings. Outcomes are returned as data so the caller can
//! summarize successes and failures in one response.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::future::join_all;
use tokio::fs;
use tracing::debug;

/// One file pulled out of a multipart upload.
#[derive(Debug, Clone)]
pub struct FilePayload {
    /// Filename as it arrived on the wire.
    pub name: String,
    pub data: Bytes,
}

/// Result of a single file move. The error is captured as a string so it
/// can cross the batch boundary as plain data.
#[derive(Debug)]
pub struct UploadOutcome {
    pub target_path: PathBuf,
    pub result: Result<(), String>,
}

/// Outcomes of a whole batch, partitioned for the response summary.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub succeeded: Vec<UploadOutcome>,
    pub failed: Vec<UploadOutcome>,
}

/// Multipart filenames sometimes arrive with their UTF-8 bytes widened
/// into latin-1 code points by the transport. Narrow them back before
/// touching the filesystem. Names containing anything above U+00FF are
/// already proper unicode and pass through untouched, as does anything
/// whose narrowed bytes are not valid UTF-8.
pub fn redecode_transport_name(raw: &str) -> String {
    let narrowed: Option<Vec<u8>> = raw
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect();
    match narrowed {
        Some(bytes) => String::from_utf8(bytes).unwrap_or_else(|_| raw.to_string()),
        None => raw.to_string(),
    }
}

/// Reduce an uploaded filename to a single safe path component. Returns
/// None if nothing usable remains.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == ' ');
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Move every payload into `target_dir`, waiting for all moves to settle.
///
/// Assumes at least one payload; empty input is rejected upstream by the
/// HTTP layer. No retries: a failed move is reported once and re-attempting
/// is the caller's responsibility.
pub async fn move_all(target_dir: &Path, payloads: Vec<FilePayload>) -> UploadReport {
    let moves = payloads
        .into_iter()
        .map(|payload| move_one(target_dir, payload));
    let outcomes = join_all(moves).await;

    let (succeeded, failed): (Vec<_>, Vec<_>) =
        outcomes.into_iter().partition(|o| o.result.is_ok());
    UploadReport { succeeded, failed }
}

async fn move_one(target_dir: &Path, payload: FilePayload) -> UploadOutcome {
    let decoded = redecode_transport_name(&payload.name);
    let Some(file_name) = sanitize_file_name(&decoded) else {
        return UploadOutcome {
            target_path: target_dir.to_path_buf(),
            result: Err(format!("invalid file name: {:?}", payload.name)),
        };
    };

    let target_path = target_dir.join(&file_name);
    debug!(path = %target_path.display(), bytes = payload.data.len(), "moving upload into place");

    let result = fs::write(&target_path, &payload.data)
        .await
        .map_err(|err| err.to_string());
    UploadOutcome {
        target_path,
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn payload(name: &str, data: &str) -> FilePayload {
        FilePayload {
            name: name.to_string(),
            data: Bytes::from(data.to_string()),
        }
    }

    #[test]
    fn test_redecode_widened_utf8() {
        // "é" (0xC3 0xA9) widened into latin-1 code points is "Ã©"
        assert_eq!(redecode_transport_name("Ã©"), "é");
        assert_eq!(redecode_transport_name("rÃ©sumÃ©.pdf"), "résumé.pdf");
    }

    #[test]
    fn test_redecode_passthrough() {
        // plain ASCII is valid either way
        assert_eq!(redecode_transport_name("notes.txt"), "notes.txt");
        // already-unicode names are left alone
        assert_eq!(redecode_transport_name("写真.png"), "写真.png");
        // narrowed bytes that are not valid UTF-8 fall back to the original
        assert_eq!(redecode_transport_name("ü"), "ü");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("a.txt"), Some("a.txt".to_string()));
        assert_eq!(
            sanitize_file_name("../../etc/passwd"),
            Some("_.._etc_passwd".to_string())
        );
        assert_eq!(
            sanitize_file_name("a\\b.txt"),
            Some("a_b.txt".to_string())
        );
        assert_eq!(sanitize_file_name("a\0b\x01.txt"), Some("ab.txt".to_string()));
        assert_eq!(sanitize_file_name(""), None);
        assert_eq!(sanitize_file_name("..."), None);
        assert_eq!(sanitize_file_name("   "), None);
    }

    #[tokio::test]
    async fn test_move_all_success() {
        let dir = TempDir::new().unwrap();
        let report = move_all(
            dir.path(),
            vec![payload("a.txt", "aaa"), payload("b.txt", "bbb")],
        )
        .await;

        assert_eq!(report.succeeded.len(), 2);
        assert!(report.failed.is_empty());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "aaa"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("b.txt")).unwrap(),
            "bbb"
        );
    }

    #[tokio::test]
    async fn test_move_all_partial_failure() {
        let dir = TempDir::new().unwrap();
        // a directory squatting on one target name makes that single write fail
        std::fs::create_dir(dir.path().join("taken")).unwrap();

        let report = move_all(
            dir.path(),
            vec![
                payload("a.txt", "aaa"),
                payload("taken", "nope"),
                payload("b.txt", "bbb"),
            ],
        )
        .await;

        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].target_path, dir.path().join("taken"));
        assert!(report.failed[0].result.is_err());
        // siblings landed despite the failure
        assert!(dir.path().join("a.txt").exists());
        assert!(dir.path().join("b.txt").exists());
    }

    #[tokio::test]
    async fn test_move_all_invalid_name_is_per_file_failure() {
        let dir = TempDir::new().unwrap();
        let report = move_all(
            dir.path(),
            vec![payload("...", "x"), payload("ok.txt", "y")],
        )
        .await;

        assert_eq!(report.succeeded.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert!(dir.path().join("ok.txt").exists());
    }
}
