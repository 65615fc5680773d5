use crate::competition::Competition;
use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Competition ids still owed to each channel, keyed by channel name.
pub type PendingLedger = BTreeMap<String, Vec<String>>;

// ─── CompetitionStore ─────────────────────────────────────────────────────

/// The competitions seen on the last announcing run, kept as a JSON array.
///
/// The file is pretty-printed with a four-space indent so diffs stay readable
/// when the scheduled workflow commits it back to the repository.
///
/// Announcements a channel failed to deliver are kept next to it in
/// `<stem>.pending.json` (e.g. `prev_comps.pending.json`). The file exists
/// only while something is outstanding.
pub struct CompetitionStore {
    path: PathBuf,
    pending_path: PathBuf,
}

impl CompetitionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let pending_path = path.with_extension("pending.json");
        CompetitionStore { path, pending_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pending_path(&self) -> &Path {
        &self.pending_path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the stored competitions. A missing file means a first run.
    pub fn load(&self) -> Result<Vec<Competition>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        let comps: Vec<Competition> = serde_json::from_str(&data)?;
        Ok(comps)
    }

    pub fn save(&self, competitions: &[Competition]) -> Result<()> {
        let data = to_pretty_json(competitions)?;
        crate::io::atomic_write(&self.path, &data)?;
        tracing::debug!(path = %self.path.display(), count = competitions.len(), "state saved");
        Ok(())
    }

    pub fn load_pending(&self) -> Result<PendingLedger> {
        if !self.pending_path.exists() {
            return Ok(PendingLedger::new());
        }
        let data = std::fs::read_to_string(&self.pending_path)?;
        if data.trim().is_empty() {
            return Ok(PendingLedger::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    /// Persist the ledger. Channels with nothing owed are dropped, and an
    /// empty ledger removes the file.
    pub fn save_pending(&self, pending: &PendingLedger) -> Result<()> {
        let owed: PendingLedger = pending
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(channel, ids)| (channel.clone(), ids.clone()))
            .collect();
        if owed.is_empty() {
            crate::io::remove_if_exists(&self.pending_path)?;
            return Ok(());
        }
        let data = to_pretty_json(&owed)?;
        crate::io::atomic_write(&self.pending_path, &data)
    }

    /// Delete the state file and any pending ledger. Returns true if there
    /// was a state file.
    pub fn clear(&self) -> Result<bool> {
        crate::io::remove_if_exists(&self.pending_path)?;
        crate::io::remove_if_exists(&self.path)
    }
}

fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::competition::fixtures::competition;
    use tempfile::TempDir;

    #[test]
    fn load_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = CompetitionStore::new(dir.path().join("prev_comps.json"));
        assert!(!store.exists());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn load_blank_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prev_comps.json");
        std::fs::write(&path, "\n").unwrap();
        assert!(CompetitionStore::new(path).load().unwrap().is_empty());
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = CompetitionStore::new(dir.path().join("prev_comps.json"));
        let comps = vec![
            competition("ChileOpen2025", "2025-03-01", "2025-03-02"),
            competition("SantiagoCube2025", "2025-05-10", "2025-05-10"),
        ];
        store.save(&comps).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, comps);
    }

    #[test]
    fn saved_file_uses_four_space_indent() {
        let dir = TempDir::new().unwrap();
        let store = CompetitionStore::new(dir.path().join("prev_comps.json"));
        store
            .save(&[competition("ChileOpen2025", "2025-03-01", "2025-03-01")])
            .unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.starts_with("[\n    {\n        \""));
        assert!(text.ends_with("]\n"));
    }

    #[test]
    fn reads_file_written_by_previous_tooling() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prev_comps.json");
        std::fs::write(
            &path,
            r#"[
    {
        "id": "ChileOpen2024",
        "name": "Chile Open 2024",
        "city": "Santiago, Región Metropolitana",
        "country_iso2": "CL",
        "start_date": "2024-11-02",
        "end_date": "2024-11-03",
        "url": "https://www.worldcubeassociation.org/competitions/ChileOpen2024",
        "website": "https://www.worldcubeassociation.org/competitions/ChileOpen2024",
        "latitude_degrees": -33.45,
        "longitude_degrees": -70.66
    }
]"#,
        )
        .unwrap();

        let comps = CompetitionStore::new(path).load().unwrap();
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].city, "Santiago, Región Metropolitana");
        assert!(comps[0].extra.contains_key("latitude_degrees"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prev_comps.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(CompetitionStore::new(path).load().is_err());
    }

    #[test]
    fn save_slice_writes_array() {
        let dir = TempDir::new().unwrap();
        let store = CompetitionStore::new(dir.path().join("prev_comps.json"));
        let comps = [competition("ChileOpen2025", "2025-03-01", "2025-03-01")];
        store.save(&comps[..]).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(value[0]["id"], "ChileOpen2025");
    }

    #[test]
    fn pending_path_sits_next_to_state() {
        let store = CompetitionStore::new("/tmp/bot/prev_comps.json");
        assert_eq!(
            store.pending_path(),
            Path::new("/tmp/bot/prev_comps.pending.json")
        );
    }

    #[test]
    fn pending_ledger_round_trip_and_cleanup() {
        let dir = TempDir::new().unwrap();
        let store = CompetitionStore::new(dir.path().join("prev_comps.json"));
        assert!(store.load_pending().unwrap().is_empty());

        let mut pending = PendingLedger::new();
        pending.insert("telegram".to_string(), vec!["A2025".to_string()]);
        pending.insert("discord".to_string(), Vec::new());
        store.save_pending(&pending).unwrap();

        let loaded = store.load_pending().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["telegram"], ["A2025"]);

        store.save_pending(&PendingLedger::new()).unwrap();
        assert!(!store.pending_path().exists());
    }

    #[test]
    fn clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let store = CompetitionStore::new(dir.path().join("prev_comps.json"));
        store.save(&[]).unwrap();
        assert!(store.clear().unwrap());
        assert!(!store.exists());
        assert!(!store.clear().unwrap());
    }

    #[test]
    fn clear_removes_pending_ledger() {
        let dir = TempDir::new().unwrap();
        let store = CompetitionStore::new(dir.path().join("prev_comps.json"));
        store.save(&[]).unwrap();
        let mut pending = PendingLedger::new();
        pending.insert("discord".to_string(), vec!["A2025".to_string()]);
        store.save_pending(&pending).unwrap();

        store.clear().unwrap();
        assert!(!store.pending_path().exists());
    }
}
