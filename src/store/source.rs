use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use futures::channel::oneshot;
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::snapshot::{SnapshotDocument, SnapshotKey, decode_document};

/// Capability to fetch the raw document for one snapshot.
///
/// A snapshot that does not exist must come back as an error, never as an
/// empty document.
#[async_trait(?Send)]
pub trait SnapshotSource {
    async fn fetch(&self, key: &SnapshotKey) -> Result<SnapshotDocument>;
}

/// Reads `<arch>.json` (step 0) and `<arch><step>.json` from one directory.
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &SnapshotKey) -> PathBuf {
        let file_name = if key.step == 0 {
            format!("{}.json", key.architecture)
        } else {
            format!("{}{}.json", key.architecture, key.step)
        };
        self.root.join(file_name)
    }

    pub fn architectures(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root)
            .with_context(|| format!("failed to list {}", self.root.display()))?;

        let mut names = BTreeSet::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let name = stem.trim_end_matches(|c: char| c.is_ascii_digit());
            if !name.is_empty() {
                names.insert(name.to_owned());
            }
        }

        Ok(names.into_iter().collect())
    }
}

fn read_document(path: &Path) -> Result<SnapshotDocument> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    decode_document(&raw).with_context(|| format!("failed to decode {}", path.display()))
}

#[async_trait(?Send)]
impl SnapshotSource for DirectorySource {
    async fn fetch(&self, key: &SnapshotKey) -> Result<SnapshotDocument> {
        let path = self.path_for(key);
        let (tx, rx) = oneshot::channel();

        thread::spawn(move || {
            let _ = tx.send(read_document(&path));
        });

        rx.await
            .map_err(|_| anyhow!("snapshot loader for {key} exited without a result"))?
    }
}

/// Exact match first, then the best fuzzy match among `known`.
pub fn closest_architecture<'a>(known: &'a [String], query: &str) -> Option<&'a str> {
    if let Some(exact) = known.iter().find(|name| name.as_str() == query) {
        return Some(exact);
    }

    let matcher = SkimMatcherV2::default();
    known
        .iter()
        .filter_map(|name| {
            matcher
                .fuzzy_match(name, query)
                .or_else(|| {
                    matcher.fuzzy_match(&name.to_ascii_lowercase(), &query.to_ascii_lowercase())
                })
                .map(|score| (score, name.as_str()))
        })
        .max_by_key(|(score, _)| *score)
        .map(|(_, name)| name)
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::snapshot::GraphElement;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).expect("write fixture");
    }

    #[test]
    fn step_zero_has_no_suffix() {
        let source = DirectorySource::new("json");
        assert_eq!(
            source.path_for(&SnapshotKey::new("lamp", 0)),
            Path::new("json").join("lamp.json")
        );
        assert_eq!(
            source.path_for(&SnapshotKey::new("migration", 3)),
            Path::new("json").join("migration3.json")
        );
    }

    #[test]
    fn fetches_documents_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            "lamp1.json",
            r#"{"graph": [{"node": "web"}, {"node": "db"}, {"edge": "e1", "source": "web", "target": "db"}]}"#,
        );

        let source = DirectorySource::new(dir.path());
        let document =
            block_on(source.fetch(&SnapshotKey::new("lamp", 1))).expect("document loads");

        assert_eq!(document.graph.len(), 3);
        assert!(matches!(&document.graph[0], GraphElement::Node { name, .. } if name == "web"));
    }

    #[test]
    fn missing_snapshot_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = DirectorySource::new(dir.path());

        let error = block_on(source.fetch(&SnapshotKey::new("lamp", 4))).unwrap_err();
        assert!(format!("{error:#}").contains("lamp4.json"));
    }

    #[test]
    fn lists_architectures_without_step_suffixes() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["lamp.json", "lamp1.json", "migration.json", "migration12.json", "notes.txt"] {
            write(dir.path(), name, "{}");
        }

        let source = DirectorySource::new(dir.path());
        assert_eq!(
            source.architectures().expect("listing works"),
            vec!["lamp".to_owned(), "migration".to_owned()]
        );
    }

    #[test]
    fn resolves_architecture_names() {
        let known = vec![
            "lamp".to_owned(),
            "migration".to_owned(),
            "netflixoss".to_owned(),
        ];

        assert_eq!(closest_architecture(&known, "lamp"), Some("lamp"));
        assert_eq!(closest_architecture(&known, "migr"), Some("migration"));
        assert_eq!(closest_architecture(&known, "NetflixOSS"), Some("netflixoss"));
        assert_eq!(closest_architecture(&known, "zzz"), None);
    }
}
