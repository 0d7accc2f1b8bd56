//! Saved state files.
//!
//! The file holds a `SavedState` as pretty-printed JSON. Writes go through a
//! sibling temporary file and a rename so a crash never leaves half a file.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use ztvctl_core::SavedState;

use crate::error::CliError;

/// Read and parse a state file.
pub fn load(path: &Path) -> Result<SavedState, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&text).map_err(|e| CliError::State(format!("{}: {e}", path.display())))
}

/// Write `state` to `path`, replacing any previous file.
pub fn save(path: &Path, state: &SavedState) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(state)
        .map_err(|e| CliError::State(format!("Failed to encode state: {e}")))?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, json + "\n")?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Consistency problems that would make an import fail part way.
///
/// Checks duplicate channel, tunnel and stream ids, streams whose
/// `channelId` disagrees with their channel, and tunnel references to
/// tunnels the file does not define.
pub fn problems(state: &SavedState) -> Vec<String> {
    let mut problems = Vec::new();

    let mut tunnel_ids = BTreeSet::new();
    for tunnel in &state.tunnels {
        if !tunnel_ids.insert(tunnel.tunnel_id) {
            problems.push(format!("Tunnel {} is defined twice", tunnel.tunnel_id));
        }
    }

    let mut channel_ids = HashSet::new();
    for channel in &state.channels {
        let id = channel.channel_id;
        if !channel_ids.insert(id) {
            problems.push(format!("Channel {id} is defined twice"));
        }

        let mut inputs = HashSet::new();
        for input in &channel.inputs {
            if !inputs.insert(input.stream_id()) {
                problems.push(format!(
                    "Channel {id}: input stream {} is defined twice",
                    input.stream_id()
                ));
            }
            if input.channel_id() != id {
                problems.push(format!(
                    "Channel {id}: input stream {} names channel {}",
                    input.stream_id(),
                    input.channel_id()
                ));
            }
            if let Some(tunnel_id) = input.tunnel_id().filter(|t| !tunnel_ids.contains(t)) {
                problems.push(format!(
                    "Channel {id}: input stream {} uses unknown tunnel {tunnel_id}",
                    input.stream_id()
                ));
            }
        }

        let mut outputs = HashSet::new();
        for output in &channel.outputs {
            if !outputs.insert(output.stream_id()) {
                problems.push(format!(
                    "Channel {id}: output stream {} is defined twice",
                    output.stream_id()
                ));
            }
            if output.channel_id() != id {
                problems.push(format!(
                    "Channel {id}: output stream {} names channel {}",
                    output.stream_id(),
                    output.channel_id()
                ));
            }
            if let Some(tunnel_id) = output.tunnel_id().filter(|t| !tunnel_ids.contains(t)) {
                problems.push(format!(
                    "Channel {id}: output stream {} uses unknown tunnel {tunnel_id}",
                    output.stream_id()
                ));
            }
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const STATE: &str = r#"{
        "channels": [
            {
                "channelId": 1,
                "description": "contribution",
                "bufferDurationMs": 500,
                "inputs": [
                    {"type": "rist", "channelId": 1, "streamId": 1, "tunnelId": 9,
                     "localIp": "0.0.0.0", "localPort": 7000}
                ],
                "outputs": [
                    {"type": "udp", "channelId": 2, "streamId": 1, "localIp": "0.0.0.0",
                     "localPort": 0, "remoteIp": "239.1.1.1", "remotePort": 5000},
                    {"type": "udp", "channelId": 1, "streamId": 1, "localIp": "0.0.0.0",
                     "localPort": 0, "remoteIp": "239.1.1.2", "remotePort": 5000}
                ]
            }
        ],
        "tunnels": []
    }"#;

    #[test]
    fn test_problems_are_reported() {
        let state: SavedState = serde_json::from_str(STATE).unwrap();
        let problems = problems(&state);
        assert_eq!(problems.len(), 3, "{problems:#?}");
        assert!(problems.iter().any(|p| p.contains("unknown tunnel 9")));
        assert!(problems.iter().any(|p| p.contains("names channel 2")));
        assert!(problems.iter().any(|p| p.contains("defined twice")));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let state: SavedState = serde_json::from_str(STATE).unwrap();

        save(&path, &state).unwrap();
        assert_eq!(load(&path).unwrap(), state);
        assert!(!dir.path().join("state.json.tmp").exists());
    }

    #[test]
    fn test_load_reports_parse_errors_as_state_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(load(&path), Err(CliError::State(_))));
        assert!(matches!(
            load(&dir.path().join("missing.json")),
            Err(CliError::Io(_))
        ));
    }
}
