//! Scanner for Markdown notes.

use super::{chunk_file, read_text, walk_files, Scanner, WatermarkFilter};
use crate::chunker::Chunker;
use crate::error::IngestResult;
use crate::markdown::to_plain_text;
use citations_core::{ChunkBatch, ScanTarget, SourceKind};
use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Scans a directory tree of `*.md` files.
///
/// Chunk ids are `{path as walked}-{ordinal}`, so moving or renaming a note
/// produces new ids and leaves the old chunks in the index.
pub struct MarkdownScanner {
    target: ScanTarget,
    filter: WatermarkFilter,
    chunker: Arc<Chunker>,
}

impl MarkdownScanner {
    pub fn new(target: ScanTarget, filter: WatermarkFilter, chunker: Arc<Chunker>) -> Self {
        Self {
            target,
            filter,
            chunker,
        }
    }
}

/// The path as walked, joined with `/`, used as the id stem.
///
/// Walking `.` gives bare relative stems such as `a.md`; any other target
/// keeps its directory in the stem, so two targets holding the same relative
/// path never share ids.
fn id_stem(path: &Path) -> String {
    let mut parts: Vec<Cow<'_, str>> = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => parts.push(prefix.as_os_str().to_string_lossy()),
            // A leading empty part renders the root as a leading `/`
            Component::RootDir if parts.is_empty() => parts.push(Cow::Borrowed("")),
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => parts.push(Cow::Borrowed("..")),
            Component::Normal(part) => parts.push(part.to_string_lossy()),
        }
    }
    parts.join("/")
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

impl Scanner for MarkdownScanner {
    fn kind(&self) -> SourceKind {
        SourceKind::Markdown
    }

    fn root(&self) -> &Path {
        &self.target.directory
    }

    fn list_candidate_files(&self) -> Box<dyn Iterator<Item = PathBuf> + '_> {
        Box::new(walk_files(self.root()).filter(|p| is_markdown(p)))
    }

    fn is_changed(&self, path: &Path) -> IngestResult<bool> {
        self.filter.check(path)
    }

    fn load_batch(&self, path: &Path) -> IngestResult<Option<ChunkBatch>> {
        let raw = read_text(path)?;
        let text = if self.target.strip_markup {
            to_plain_text(&raw)
        } else {
            raw
        };

        let metadata = self.target.static_metadata();
        chunk_file(&self.chunker, path, &text, &id_stem(path), &metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::test_support::{chunker, write_at};
    use chrono::{TimeZone, Utc};

    const NEW: i64 = 1_700_000_100;

    fn scanner(target: ScanTarget) -> MarkdownScanner {
        let watermark = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        MarkdownScanner::new(target, WatermarkFilter::new(watermark), chunker())
    }

    #[test]
    fn test_two_paragraphs_keep_target_metadata() {
        let dir = tempfile::tempdir().unwrap();
        write_at(
            &dir.path().join("a.md"),
            "The first paragraph of the note.\n\nThe second paragraph of the note.\n",
            NEW,
        );

        let scanner = scanner(ScanTarget::markdown(dir.path()).with_metadata("source", "notes"));
        let batches: Vec<ChunkBatch> = scanner.run().map(|r| r.unwrap()).collect();

        assert_eq!(batches.len(), 1);
        let stem = dir.path().join("a.md").display().to_string();
        assert_eq!(
            batches[0].ids(),
            vec![format!("{stem}-0"), format!("{stem}-1")]
        );
        for metadata in batches[0].metadatas() {
            assert_eq!(metadata.get("source").map(String::as_str), Some("notes"));
            assert_eq!(metadata.len(), 1);
        }
    }

    #[test]
    fn test_nested_ids_use_forward_slashes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal").join("2024").join("day.md");
        write_at(&path, "Entry.", NEW);

        let scanner = scanner(ScanTarget::markdown(dir.path()));
        let batch = scanner.load_batch(&path).unwrap().unwrap();

        assert_eq!(batch.ids(), vec![format!("{}-0", path.display())]);
        assert_eq!(batch.source_path(), path.as_path());
    }

    #[test]
    fn test_only_changed_markdown_files() {
        let dir = tempfile::tempdir().unwrap();
        write_at(&dir.path().join("old.md"), "Old.", 1_600_000_000);
        write_at(&dir.path().join("new.MD"), "New.", NEW);
        write_at(&dir.path().join("notes.txt"), "Not markdown.", NEW);

        let scanner = scanner(ScanTarget::markdown(dir.path()));
        let mut run = scanner.run();
        let ids: Vec<String> = run
            .by_ref()
            .flat_map(|r| r.unwrap().chunks.into_iter().map(|c| c.id))
            .collect();

        assert_eq!(ids, vec![format!("{}-0", dir.path().join("new.MD").display())]);
        assert_eq!(run.unchanged(), 1);
    }

    #[test]
    fn test_strip_markup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        write_at(&path, "# Title\n\nSome **bold** words.", NEW);

        let raw = scanner(ScanTarget::markdown(dir.path()))
            .load_batch(&path)
            .unwrap()
            .unwrap();
        assert!(raw.chunks[0].text.starts_with("# Title"));

        let plain = scanner(ScanTarget::markdown(dir.path()).with_strip_markup(true))
            .load_batch(&path)
            .unwrap()
            .unwrap();
        let joined: String = plain.texts().concat();
        assert!(joined.contains("Title"));
        assert!(joined.contains("Some bold words."));
        assert!(!joined.contains('#'));
        assert!(!joined.contains("**"));
    }

    #[test]
    fn test_whitespace_note_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_at(&dir.path().join("blank.md"), "\n   \n", NEW);

        let scanner = scanner(ScanTarget::markdown(dir.path()));
        assert_eq!(scanner.run().count(), 0);
    }

    #[test]
    fn test_id_stem_follows_walked_path() {
        assert_eq!(id_stem(Path::new("./a.md")), "a.md");
        assert_eq!(id_stem(Path::new("./journal/day.md")), "journal/day.md");
        assert_eq!(id_stem(Path::new("notes/a.md")), "notes/a.md");
        assert_eq!(id_stem(Path::new("/home/me/notes/a.md")), "/home/me/notes/a.md");
        assert_ne!(
            id_stem(Path::new("/personal/a.md")),
            id_stem(Path::new("/work/a.md"))
        );
    }

    #[test]
    fn test_same_name_in_two_targets_gets_distinct_ids() {
        let personal = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        write_at(&personal.path().join("a.md"), "Personal.", NEW);
        write_at(&work.path().join("a.md"), "Work.", NEW);

        let ids: Vec<String> = [personal.path(), work.path()]
            .into_iter()
            .flat_map(|root| {
                let path = root.join("a.md");
                scanner(ScanTarget::markdown(root))
                    .load_batch(&path)
                    .unwrap()
                    .unwrap()
                    .chunks
                    .into_iter()
                    .map(|c| c.id)
            })
            .collect();

        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }
}
