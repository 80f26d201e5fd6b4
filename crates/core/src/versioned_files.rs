//! Git-backed version chains for library items.
//!
//! Every library item lives in its own sharded directory holding a local Git repository
//! (`git2`/libgit2). The working tree contains the latest snapshot (`item.yaml`); the commit
//! history is the item's append-only version chain, one commit per saved version.
//!
//! This module provides:
//!
//! - [`FileToWrite`] for describing atomic multi-file writes,
//! - [`VersionedFileService`] for initialising repositories, committing with rollback and
//!   reading a file's content at every commit,
//! - [`MdrCommitMessage`] for structured, predictable commit messages.
//!
//! ## Branch Policy
//!
//! All item repositories use `refs/heads/main`.
//!
//! ## Commit Messages
//!
//! ```text
//! activity:approve: Approved version
//!
//! Author-Name: Jane Doe
//! Library: Sponsor
//! Status: Final
//! Version: 1.0
//! ```

use crate::author::Author;
use crate::versioning::ItemKind;
use crate::{MdrError, MdrResult};
use mdr_types::NonEmptyText;
use std::fmt;
use std::path::{Path, PathBuf};

#[cfg(test)]
use std::collections::HashSet;
#[cfg(test)]
use std::sync::{LazyLock, Mutex};

const MAIN_REF: &str = "refs/heads/main";

/// Controlled vocabulary of item changes recorded in commit subjects.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub(crate) enum MdrCommitAction {
    Create,
    Edit,
    Approve,
    NewVersion,
    Inactivate,
    Reactivate,
    Delete,
}

impl MdrCommitAction {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Approve => "approve",
            Self::NewVersion => "new-version",
            Self::Inactivate => "inactivate",
            Self::Reactivate => "reactivate",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for MdrCommitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single commit trailer line in standard Git trailer format (`Key: Value`).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct MdrCommitTrailer {
    key: String,
    value: String,
}

impl MdrCommitTrailer {
    /// # Errors
    ///
    /// Returns [`MdrError::Validation`] for empty or multi-line keys/values, or keys with ':'.
    pub(crate) fn new(key: impl Into<String>, value: impl Into<String>) -> MdrResult<Self> {
        let key = key.into().trim().to_string();
        let value = value.into().trim().to_string();

        if key.is_empty()
            || key.contains(['\n', '\r'])
            || key.contains(':')
            || value.is_empty()
            || value.contains(['\n', '\r'])
        {
            return Err(MdrError::Validation(
                "commit trailer key/value must be non-empty and single-line (key cannot contain ':')"
                    .into(),
            ));
        }

        Ok(Self { key, value })
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn value(&self) -> &str {
        &self.value
    }
}

/// A structured commit message.
///
/// - Subject line: `<kind>:<action>: <summary>`
/// - A blank line, then `Author-Name` followed by the other trailers sorted by key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct MdrCommitMessage {
    kind: ItemKind,
    action: MdrCommitAction,
    summary: NonEmptyText,
    trailers: Vec<MdrCommitTrailer>,
}

impl MdrCommitMessage {
    /// # Errors
    ///
    /// Returns [`MdrError::Validation`] if `summary` is empty or spans several lines.
    pub(crate) fn new(
        kind: ItemKind,
        action: MdrCommitAction,
        summary: impl AsRef<str>,
    ) -> MdrResult<Self> {
        let summary = NonEmptyText::single_line(summary)
            .map_err(|e| MdrError::Validation(format!("change description: {e}")))?;
        Ok(Self {
            kind,
            action,
            summary,
            trailers: Vec::new(),
        })
    }

    /// Add a trailer. `Author-*` keys are reserved for [`Self::render_with_author`].
    pub(crate) fn with_trailer(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> MdrResult<Self> {
        let trailer = MdrCommitTrailer::new(key, value)?;
        if trailer.key().starts_with("Author-") {
            return Err(MdrError::Validation(
                "Author-* commit trailer keys are reserved".into(),
            ));
        }
        self.trailers.push(trailer);
        Ok(self)
    }

    pub(crate) fn render_with_author(&self, author: &Author) -> MdrResult<String> {
        author.validate_commit_author()?;

        let mut rendered = format!(
            "{}:{}: {}",
            self.kind.commit_domain(),
            self.action,
            self.summary
        );
        rendered.push_str("\n\nAuthor-Name: ");
        rendered.push_str(author.name());

        let mut other = self.trailers.clone();
        other.sort_by(|a, b| (a.key(), a.value()).cmp(&(b.key(), b.value())));
        for trailer in other {
            rendered.push('\n');
            rendered.push_str(trailer.key());
            rendered.push_str(": ");
            rendered.push_str(trailer.value());
        }

        Ok(rendered)
    }
}

/// Represents a file to be written and committed.
#[derive(Debug, Clone)]
pub struct FileToWrite<'a> {
    /// Path relative to the repository directory.
    pub relative_path: &'a Path,
    pub content: &'a str,
    /// Previous content for rollback. `None` if this is a new file.
    pub old_content: Option<&'a str>,
}

/// Content of one file as of one commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRevision {
    pub commit: String,
    pub content: String,
}

/// Git operations on a repository rooted at `workdir`.
pub struct VersionedFileService {
    repo: git2::Repository,
    workdir: PathBuf,
}

impl VersionedFileService {
    /// Create a new Git repository at `workdir`.
    pub(crate) fn init(workdir: &Path) -> MdrResult<Self> {
        let repo = git2::Repository::init(workdir).map_err(MdrError::GitInit)?;
        // git2 may canonicalise the path; use its view so path stripping works.
        let actual_workdir = repo
            .workdir()
            .ok_or_else(|| {
                MdrError::GitInit(git2::Error::from_str("repository has no working directory"))
            })?
            .to_path_buf();
        Ok(Self {
            repo,
            workdir: actual_workdir,
        })
    }

    /// Open the repository at exactly `workdir`, without searching parent directories.
    pub(crate) fn open(workdir: &Path) -> MdrResult<Self> {
        let repo = git2::Repository::open_ext(
            workdir,
            git2::RepositoryOpenFlags::NO_SEARCH,
            std::iter::empty::<&std::ffi::OsStr>(),
        )
        .map_err(MdrError::GitOpen)?;
        let actual_workdir = repo
            .workdir()
            .ok_or_else(|| {
                MdrError::GitOpen(git2::Error::from_str("repository has no working directory"))
            })?
            .to_path_buf();
        Ok(Self {
            repo,
            workdir: actual_workdir,
        })
    }

    fn ensure_main_head(&self) -> MdrResult<()> {
        self.repo.set_head(MAIN_REF).map_err(MdrError::GitSetHead)?;
        Ok(())
    }

    /// Id of the current head commit, or `None` for an empty repository.
    pub(crate) fn head_id(&self) -> MdrResult<Option<String>> {
        Ok(self
            .resolve_head_parents()?
            .first()
            .map(|c| c.id().to_string()))
    }

    /// Commit only the given paths (relative to, or absolute under, the workdir).
    ///
    /// Paths containing `..` are rejected.
    pub(crate) fn commit_paths(
        &self,
        author: &Author,
        message: &MdrCommitMessage,
        relative_paths: &[PathBuf],
    ) -> MdrResult<git2::Oid> {
        let rendered = message.render_with_author(author)?;
        self.ensure_main_head()?;
        let mut index = self.repo.index().map_err(MdrError::GitIndex)?;

        for path in relative_paths {
            let rel = if path.is_absolute() {
                path.strip_prefix(&self.workdir)
                    .map_err(|_| {
                        MdrError::Validation(
                            "path is outside the repository working directory".into(),
                        )
                    })?
                    .to_path_buf()
            } else {
                path.to_path_buf()
            };

            if rel
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
            {
                return Err(MdrError::Validation(
                    "path must not contain parent directory references (..)".into(),
                ));
            }

            index.add_path(&rel).map_err(MdrError::GitAdd)?;
        }
        index.write().map_err(MdrError::GitIndex)?;

        self.commit_from_index(author, &rendered, &mut index)
    }

    /// Write `files` and commit them in a single commit.
    ///
    /// On failure, previously existing files are restored, new files removed and any
    /// directories created here are removed again.
    pub(crate) fn write_and_commit_files(
        repo_path: &Path,
        author: &Author,
        msg: &MdrCommitMessage,
        files: &[FileToWrite<'_>],
    ) -> MdrResult<git2::Oid> {
        let repo = Self::open(repo_path)?;

        let mut created_dirs: Vec<PathBuf> = Vec::new();
        let mut written_files: Vec<(PathBuf, Option<String>)> = Vec::new();

        let result: MdrResult<git2::Oid> = (|| {
            let mut dirs_needed = std::collections::HashSet::new();
            for file in files {
                let full_path = repo.workdir.join(file.relative_path);
                if let Some(parent) = full_path.parent() {
                    let mut current = parent;
                    while current != repo.workdir && !current.exists() {
                        dirs_needed.insert(current.to_path_buf());
                        match current.parent() {
                            Some(p) => current = p,
                            None => break,
                        }
                    }
                }
            }

            let mut dirs_to_create: Vec<PathBuf> = dirs_needed.into_iter().collect();
            dirs_to_create.sort_by_key(|p| p.components().count());
            for dir in &dirs_to_create {
                std::fs::create_dir(dir).map_err(MdrError::FileWrite)?;
                created_dirs.push(dir.clone());
            }

            for file in files {
                let full_path = repo.workdir.join(file.relative_path);
                std::fs::write(&full_path, file.content).map_err(MdrError::FileWrite)?;
                written_files.push((full_path, file.old_content.map(str::to_string)));
            }

            let paths: Vec<PathBuf> = files
                .iter()
                .map(|f| f.relative_path.to_path_buf())
                .collect();
            repo.commit_paths(author, msg, &paths)
        })();

        match result {
            Ok(oid) => Ok(oid),
            Err(write_error) => {
                for (full_path, old_content) in written_files.iter().rev() {
                    match old_content {
                        Some(contents) => {
                            let _ = std::fs::write(full_path, contents);
                        }
                        None => {
                            let _ = std::fs::remove_file(full_path);
                        }
                    }
                }
                for dir in created_dirs.iter().rev() {
                    let _ = std::fs::remove_dir(dir);
                }
                Err(write_error)
            }
        }
    }

    /// Initialise a repository in `item_dir` and commit the initial files.
    ///
    /// Either the repository exists with its first commit afterwards or `item_dir` is removed.
    /// If removal fails too, [`MdrError::CleanupAfterInitialiseFailed`] carries both errors.
    pub(crate) fn init_and_commit(
        item_dir: &Path,
        author: &Author,
        message: &MdrCommitMessage,
        files: &[FileToWrite<'_>],
    ) -> MdrResult<git2::Oid> {
        let result: MdrResult<git2::Oid> = (|| {
            std::fs::create_dir_all(item_dir).map_err(MdrError::ItemDirCreation)?;
            let _repo = Self::init(item_dir)?;
            Self::write_and_commit_files(item_dir, author, message, files)
        })();

        match result {
            Ok(oid) => Ok(oid),
            Err(init_error) => {
                if let Err(cleanup_err) = cleanup_item_dir(item_dir) {
                    return Err(MdrError::CleanupAfterInitialiseFailed {
                        path: item_dir.to_path_buf(),
                        init_error: Box::new(init_error),
                        cleanup_error: cleanup_err,
                    });
                }
                Err(init_error)
            }
        }
    }

    fn commit_from_index(
        &self,
        author: &Author,
        message: &str,
        index: &mut git2::Index,
    ) -> MdrResult<git2::Oid> {
        let tree_id = index.write_tree().map_err(MdrError::GitWriteTree)?;
        let tree = self
            .repo
            .find_tree(tree_id)
            .map_err(MdrError::GitFindTree)?;

        let sig = git2::Signature::now(author.name(), author.signature_email())
            .map_err(MdrError::GitSignature)?;

        let parents = self.resolve_head_parents()?;
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .map_err(MdrError::GitCommit)
    }

    /// Parent list for the next commit: the head commit, or nothing for an empty repository.
    fn resolve_head_parents(&self) -> MdrResult<Vec<git2::Commit<'_>>> {
        match self.repo.head() {
            Ok(head) => {
                let commit = head.peel_to_commit().map_err(MdrError::GitPeel)?;
                Ok(vec![commit])
            }
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => Ok(vec![]),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(vec![]),
            Err(e) => Err(MdrError::GitHead(e)),
        }
    }

    /// Content of `relative_path` at every commit that contains it, oldest first.
    pub(crate) fn file_history(&self, relative_path: &Path) -> MdrResult<Vec<FileRevision>> {
        let mut walk = self.repo.revwalk().map_err(MdrError::GitRevwalk)?;
        walk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::REVERSE)
            .map_err(MdrError::GitRevwalk)?;
        match walk.push_head() {
            Ok(()) => {}
            Err(e)
                if e.code() == git2::ErrorCode::UnbornBranch
                    || e.code() == git2::ErrorCode::NotFound =>
            {
                return Ok(Vec::new());
            }
            Err(e) => return Err(MdrError::GitRevwalk(e)),
        }

        let mut revisions = Vec::new();
        for oid in walk {
            let oid = oid.map_err(MdrError::GitRevwalk)?;
            let commit = self.repo.find_commit(oid).map_err(MdrError::GitRead)?;
            let tree = commit.tree().map_err(MdrError::GitRead)?;
            let entry = match tree.get_path(relative_path) {
                Ok(entry) => entry,
                Err(e) if e.code() == git2::ErrorCode::NotFound => continue,
                Err(e) => return Err(MdrError::GitRead(e)),
            };
            let blob = self
                .repo
                .find_blob(entry.id())
                .map_err(MdrError::GitRead)?;
            let content = std::str::from_utf8(blob.content())
                .map_err(|e| {
                    MdrError::CorruptMetadata(format!(
                        "{} at {oid} is not UTF-8: {e}",
                        relative_path.display()
                    ))
                })?
                .to_string();
            revisions.push(FileRevision {
                commit: oid.to_string(),
                content,
            });
        }
        Ok(revisions)
    }
}

#[cfg(test)]
static FORCE_CLEANUP_ERROR_FOR_THREADS: LazyLock<Mutex<HashSet<std::thread::ThreadId>>> =
    LazyLock::new(|| Mutex::new(HashSet::new()));

fn cleanup_item_dir(item_dir: &Path) -> std::io::Result<()> {
    #[cfg(test)]
    {
        let current_id = std::thread::current().id();
        let mut guard = FORCE_CLEANUP_ERROR_FOR_THREADS
            .lock()
            .expect("FORCE_CLEANUP_ERROR_FOR_THREADS mutex poisoned");

        if guard.remove(&current_id) {
            return Err(std::io::Error::other("forced cleanup failure (test hook)"));
        }
    }

    std::fs::remove_dir_all(item_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn author() -> Author {
        Author::new("Test Author", Some("test@example.com")).unwrap()
    }

    fn message(action: MdrCommitAction, summary: &str) -> MdrCommitMessage {
        MdrCommitMessage::new(ItemKind::Activity, action, summary).unwrap()
    }

    #[test]
    fn render_puts_author_first_then_sorted_trailers() {
        let msg = message(MdrCommitAction::Approve, "Approved version")
            .with_trailer("Version", "1.0")
            .unwrap()
            .with_trailer("Library", "Sponsor")
            .unwrap();
        let rendered = msg.render_with_author(&author()).unwrap();
        assert_eq!(
            rendered,
            "activity:approve: Approved version\n\nAuthor-Name: Test Author\nLibrary: Sponsor\nVersion: 1.0"
        );
    }

    #[test]
    fn rejects_multiline_summary() {
        let err =
            MdrCommitMessage::new(ItemKind::Activity, MdrCommitAction::Edit, "a\nb").unwrap_err();
        assert!(matches!(err, MdrError::Validation(_)));
    }

    #[test]
    fn rejects_reserved_and_invalid_trailers() {
        assert!(message(MdrCommitAction::Edit, "x")
            .with_trailer("Author-Name", "someone")
            .is_err());
        assert!(MdrCommitTrailer::new("Bad:Key", "v").is_err());
        assert!(MdrCommitTrailer::new("Key", "").is_err());
    }

    #[test]
    fn subject_uses_hyphenated_action() {
        let rendered = message(MdrCommitAction::NewVersion, "New draft created")
            .render_with_author(&author())
            .unwrap();
        assert!(rendered.starts_with("activity:new-version: New draft created\n\n"));
    }

    #[test]
    fn init_and_commit_then_history() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("aa").join("bb").join("item");
        let path = Path::new("item.yaml");

        let first = VersionedFileService::init_and_commit(
            &dir,
            &author(),
            &message(MdrCommitAction::Create, "Initial version"),
            &[FileToWrite {
                relative_path: path,
                content: "v: 1\n",
                old_content: None,
            }],
        )
        .unwrap();

        let second = VersionedFileService::write_and_commit_files(
            &dir,
            &author(),
            &message(MdrCommitAction::Edit, "changed"),
            &[FileToWrite {
                relative_path: path,
                content: "v: 2\n",
                old_content: Some("v: 1\n"),
            }],
        )
        .unwrap();

        let service = VersionedFileService::open(&dir).unwrap();
        assert_eq!(service.head_id().unwrap(), Some(second.to_string()));

        let history = service.file_history(path).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].commit, first.to_string());
        assert_eq!(history[0].content, "v: 1\n");
        assert_eq!(history[1].content, "v: 2\n");

        let repo = git2::Repository::open(&dir).unwrap();
        let head = repo.head().unwrap();
        assert_eq!(head.name(), Some(MAIN_REF));
        let commit = head.peel_to_commit().unwrap();
        assert!(commit
            .message()
            .unwrap()
            .starts_with("activity:edit: changed\n\nAuthor-Name: Test Author"));
    }

    #[test]
    fn empty_repository_has_no_head_or_history() {
        let temp = TempDir::new().unwrap();
        let service = VersionedFileService::init(temp.path()).unwrap();
        assert_eq!(service.head_id().unwrap(), None);
        assert!(service.file_history(Path::new("item.yaml")).unwrap().is_empty());
    }

    #[test]
    fn commit_paths_rejects_parent_references() {
        let temp = TempDir::new().unwrap();
        let service = VersionedFileService::init(temp.path()).unwrap();
        let err = service
            .commit_paths(
                &author(),
                &message(MdrCommitAction::Edit, "x"),
                &[PathBuf::from("../escape.yaml")],
            )
            .unwrap_err();
        assert!(matches!(err, MdrError::Validation(_)));
    }

    #[test]
    fn failed_write_rolls_back_files() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("item");
        VersionedFileService::init_and_commit(
            &dir,
            &author(),
            &message(MdrCommitAction::Create, "Initial version"),
            &[FileToWrite {
                relative_path: Path::new("item.yaml"),
                content: "v: 1\n",
                old_content: None,
            }],
        )
        .unwrap();

        let bad_author = Author::new("Bad <author>", None).unwrap();
        let err = VersionedFileService::write_and_commit_files(
            &dir,
            &bad_author,
            &message(MdrCommitAction::Edit, "changed"),
            &[
                FileToWrite {
                    relative_path: Path::new("item.yaml"),
                    content: "v: 2\n",
                    old_content: Some("v: 1\n"),
                },
                FileToWrite {
                    relative_path: Path::new("extra/new.yaml"),
                    content: "x\n",
                    old_content: None,
                },
            ],
        )
        .unwrap_err();
        assert!(matches!(err, MdrError::Validation(_)));
        assert_eq!(std::fs::read_to_string(dir.join("item.yaml")).unwrap(), "v: 1\n");
        assert!(!dir.join("extra").exists());
    }

    #[test]
    fn failed_init_removes_item_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("item");
        let bad_author = Author::new("Bad <author>", None).unwrap();
        let result = VersionedFileService::init_and_commit(
            &dir,
            &bad_author,
            &message(MdrCommitAction::Create, "Initial version"),
            &[FileToWrite {
                relative_path: Path::new("item.yaml"),
                content: "v: 1\n",
                old_content: None,
            }],
        );
        assert!(result.is_err());
        assert!(!dir.exists());
    }

    #[test]
    fn failed_cleanup_reports_both_errors() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("item");
        FORCE_CLEANUP_ERROR_FOR_THREADS
            .lock()
            .unwrap()
            .insert(std::thread::current().id());

        let bad_author = Author::new("Bad <author>", None).unwrap();
        let err = VersionedFileService::init_and_commit(
            &dir,
            &bad_author,
            &message(MdrCommitAction::Create, "Initial version"),
            &[FileToWrite {
                relative_path: Path::new("item.yaml"),
                content: "v: 1\n",
                old_content: None,
            }],
        )
        .unwrap_err();
        assert!(matches!(err, MdrError::CleanupAfterInitialiseFailed { .. }));
    }
}
