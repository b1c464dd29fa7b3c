//! End-to-end tests running the `soot` binary against temp session files.
//!
//! None of these reach a backend: they cover commands that either stay local
//! or fail before any request is sent.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::json;

struct Run {
	success: bool,
	stdout: serde_json::Value,
	stderr: String,
}

fn soot(workspace: &Path, args: &[&str]) -> Run {
	let output = Command::new(env!("CARGO_BIN_EXE_soot"))
		.current_dir(workspace)
		.env("XDG_CONFIG_HOME", workspace.join("xdg"))
		.env("HOME", workspace)
		.env_remove("SOOT_API_URL")
		.env_remove("SOOT_MASH_URL")
		.env_remove("RUST_LOG")
		// Unroutable, so an accidental request fails fast instead of hitting a real server.
		.args(["--api-url", "http://127.0.0.1:9", "--mash-url", "http://127.0.0.1:9"])
		.args(args)
		.output()
		.expect("failed to execute soot");

	let stdout = String::from_utf8_lossy(&output.stdout).to_string();
	Run {
		success: output.status.success(),
		stdout: serde_json::from_str(&stdout).unwrap_or_else(|_| json!({ "raw": stdout })),
		stderr: String::from_utf8_lossy(&output.stderr).to_string(),
	}
}

fn now_ms() -> i64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.unwrap()
		.as_millis() as i64
}

fn write_session(path: &Path, expires_at: i64) {
	let session = json!({
		"soot_auth_token": "access-abcdefghijkl",
		"soot_refresh_token": "refresh-abcdefghijkl",
		"soot_token_expiry": expires_at.to_string(),
	});
	std::fs::write(path, session.to_string()).unwrap();
}

fn session_arg(path: &Path) -> String {
	path.display().to_string()
}

#[test]
fn status_without_session_is_unauthenticated() {
	let dir = tempfile::tempdir().unwrap();

	let run = soot(dir.path(), &["status"]);
	assert!(run.success, "stderr: {}", run.stderr);
	assert_eq!(run.stdout["ok"], true);
	assert_eq!(run.stdout["command"], "status");
	assert_eq!(run.stdout["data"]["state"], "unauthenticated");
	assert_eq!(run.stdout["data"]["hasAccessToken"], false);
}

#[test]
fn status_reports_stored_session() {
	let dir = tempfile::tempdir().unwrap();
	let session = dir.path().join("session.json");
	let expires_at = now_ms() + 3_600_000;
	write_session(&session, expires_at);

	let run = soot(dir.path(), &["--session", &session_arg(&session), "status"]);
	assert!(run.success, "stderr: {}", run.stderr);
	assert_eq!(run.stdout["data"]["state"], "authenticated");
	assert_eq!(run.stdout["data"]["hasRefreshToken"], true);
	assert_eq!(run.stdout["data"]["expiresAt"], expires_at);
}

#[test]
fn status_treats_expired_session_as_unauthenticated() {
	let dir = tempfile::tempdir().unwrap();
	let session = dir.path().join("session.json");
	write_session(&session, now_ms() - 1_000);

	let run = soot(dir.path(), &["--session", &session_arg(&session), "status"]);
	assert_eq!(run.stdout["data"]["state"], "unauthenticated");
	assert_eq!(run.stdout["data"]["hasAccessToken"], true);
	assert!(run.stdout["data"]["remainingMs"].as_i64().unwrap() < 0);
}

#[test]
fn logout_clears_session_file() {
	let dir = tempfile::tempdir().unwrap();
	let session = dir.path().join("session.json");
	write_session(&session, now_ms() + 3_600_000);

	let run = soot(dir.path(), &["--session", &session_arg(&session), "logout"]);
	assert!(run.success, "stderr: {}", run.stderr);
	assert_eq!(run.stdout["data"]["loggedOut"], true);

	let stored: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&session).unwrap()).unwrap();
	assert_eq!(stored, json!({}));
}

#[test]
fn refresh_without_session_fails_with_auth_error() {
	let dir = tempfile::tempdir().unwrap();

	let run = soot(dir.path(), &["refresh"]);
	assert!(!run.success);
	assert_eq!(run.stdout["ok"], false);
	assert_eq!(run.stdout["command"], "refresh");
	assert_eq!(run.stdout["error"]["code"], "AUTH_ERROR");
	assert!(run.stderr.contains("AUTH_ERROR"));
}

#[test]
fn default_session_lives_under_xdg_config() {
	let dir = tempfile::tempdir().unwrap();
	let session: PathBuf = dir.path().join("xdg").join("soot").join("session.json");
	std::fs::create_dir_all(session.parent().unwrap()).unwrap();
	write_session(&session, now_ms() + 3_600_000);

	let run = soot(dir.path(), &["status"]);
	assert_eq!(run.stdout["data"]["state"], "authenticated");
}

#[test]
fn ingest_without_submit_correlates_snapshot() {
	let dir = tempfile::tempdir().unwrap();
	std::fs::write(dir.path().join("shot.png"), b"\x89PNG").unwrap();
	let metadata = json!({
		"spaces": [{
			"spaceId": "s1",
			"operation": "copy",
			"entries": [{ "imageURL": "http://127.0.0.1:9/1.png", "instanceId": "i1", "filename": "a.png" }]
		}]
	});
	let snapshot = json!([
		{ "types": { "web text/soot-json": { "text": metadata.to_string() } } },
		{ "types": { "image/png": { "path": "shot.png" } } },
		{ "types": { "image/png": { "base64": "AAAA" } } }
	]);
	std::fs::write(dir.path().join("clip.json"), snapshot.to_string()).unwrap();

	let run = soot(dir.path(), &["ingest", "--snapshot", "clip.json", "--no-submit"]);
	assert!(run.success, "stderr: {}", run.stderr);
	let data = &run.stdout["data"];
	assert_eq!(data["submitted"], false);
	assert_eq!(data["unusedImages"], 1);
	assert_eq!(data["payloads"][0]["metadata"]["instanceId"], "i1");
	assert_eq!(data["payloads"][0]["imageBase64"], "iVBORw==");
	assert_eq!(run.stdout["diagnostics"][0]["level"], "warning");
}

#[test]
fn ingest_with_missing_snapshot_is_clipboard_error() {
	let dir = tempfile::tempdir().unwrap();

	let run = soot(dir.path(), &["ingest", "--snapshot", "absent.json", "--no-submit"]);
	assert!(!run.success);
	assert_eq!(run.stdout["error"]["code"], "CLIPBOARD_ERROR");
}

#[test]
fn explicit_missing_config_is_config_error() {
	let dir = tempfile::tempdir().unwrap();

	let run = soot(dir.path(), &["--config", "nope.json", "status"]);
	assert!(!run.success);
	assert_eq!(run.stdout["error"]["code"], "CONFIG_ERROR");
}

#[test]
fn text_format_keeps_errors_off_stdout() {
	let dir = tempfile::tempdir().unwrap();

	let run = soot(dir.path(), &["-f", "text", "refresh"]);
	assert!(!run.success);
	assert!(run.stdout.get("ok").is_none());
	assert!(run.stderr.contains("Error [AUTH_ERROR]"));
}
