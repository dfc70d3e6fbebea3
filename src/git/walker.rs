use super::{CommitOrder, CommitRecord, CommitSource, DateRange};
use crate::error::GitError;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use git2::{DiffFormat, DiffOptions, ErrorCode, Oid, Repository, Sort};
use std::path::{Path, PathBuf};

/// Git repository walker backed by libgit2
pub struct GitWalker {
    repo: Repository,
    repo_path: PathBuf,
    /// Diffs longer than this are truncated; 0 keeps them whole
    max_diff_bytes: usize,
}

impl GitWalker {
    /// Open the repository rooted at `path`.
    ///
    /// Unlike discovery from a subdirectory, the path itself must be the
    /// repository (or its working tree root).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GitError> {
        let path = path.as_ref();

        if !path.is_dir() {
            return Err(GitError::RepositoryNotFound(path.display().to_string()));
        }

        let repo = Repository::open(path).map_err(|e| match e.code() {
            ErrorCode::NotFound => GitError::RepositoryNotFound(path.display().to_string()),
            _ => GitError::OpenFailed(format!("{}: {}", path.display(), e.message())),
        })?;

        let repo_path = repo
            .workdir()
            .unwrap_or_else(|| repo.path())
            .to_path_buf();

        tracing::info!("Opened git repository at: {}", repo_path.display());

        Ok(Self {
            repo,
            repo_path,
            max_diff_bytes: 0,
        })
    }

    /// Truncate diffs longer than `max_diff_bytes` (0 disables truncation)
    pub fn with_max_diff_bytes(mut self, max_diff_bytes: usize) -> Self {
        self.max_diff_bytes = max_diff_bytes;
        self
    }

    /// Get the repository root path
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Check if repository has any commits
    pub fn has_commits(&self) -> bool {
        self.repo.head().is_ok()
    }

    /// Repository name taken from the `origin` remote, or the directory name
    pub fn repo_name(&self) -> String {
        self.repo
            .find_remote("origin")
            .ok()
            .and_then(|remote| remote.url().and_then(repo_name_from_url))
            .unwrap_or_else(|| dir_name(&self.repo_path))
    }

    fn list_commits(&self, range: &DateRange, order: CommitOrder) -> Result<Vec<String>, GitError> {
        if range.is_empty() {
            tracing::info!(
                "Date range {} to {} is empty, nothing to discover",
                range.start,
                range.end
            );
            return Ok(Vec::new());
        }

        if !self.has_commits() {
            tracing::info!("Repository has no commits");
            return Ok(Vec::new());
        }

        let mut revwalk = self
            .repo
            .revwalk()
            .map_err(|e| GitError::IterFailed(e.message().to_string()))?;

        let mut sorting = Sort::TIME | Sort::TOPOLOGICAL;
        if order == CommitOrder::OldestFirst {
            sorting |= Sort::REVERSE;
        }
        revwalk
            .set_sorting(sorting)
            .map_err(|e| GitError::IterFailed(e.message().to_string()))?;
        revwalk
            .push_head()
            .map_err(|e| GitError::IterFailed(e.message().to_string()))?;

        let mut hashes = Vec::new();
        for oid in revwalk {
            let oid = oid.map_err(|e| GitError::IterFailed(e.message().to_string()))?;
            let commit = self
                .repo
                .find_commit(oid)
                .map_err(|e| GitError::IterFailed(e.message().to_string()))?;

            // Committer time, matching `git log --since/--until`
            if range.contains(commit.time().seconds()) {
                hashes.push(oid.to_string());
            }
        }

        tracing::debug!(
            "Revwalk matched {} commits between {} and {}",
            hashes.len(),
            range.start,
            range.end
        );
        Ok(hashes)
    }

    fn read_commit(&self, hash: &str) -> Result<CommitRecord, GitError> {
        let read_failed = |e: git2::Error| GitError::CommitReadFailed {
            hash: hash.to_string(),
            reason: e.message().to_string(),
        };

        let oid = Oid::from_str(hash).map_err(read_failed)?;
        let commit = self.repo.find_commit(oid).map_err(read_failed)?;

        let author = commit.author();
        let author = match author.email() {
            Some(email) if !email.is_empty() => {
                format!("{} <{}>", author.name().unwrap_or("Unknown"), email)
            }
            _ => author.name().unwrap_or("Unknown").to_string(),
        };

        let time = commit.author().when();
        let date = commit_date(time.seconds(), time.offset_minutes());

        let message = String::from_utf8_lossy(commit.message_bytes())
            .trim()
            .to_string();

        let diff = self.extract_diff(&commit).map_err(read_failed)?;

        Ok(CommitRecord {
            hash: hash.to_string(),
            author,
            date,
            message,
            diff,
        })
    }

    /// Unified diff of a commit against its first parent (or the empty tree)
    fn extract_diff(&self, commit: &git2::Commit) -> Result<String, git2::Error> {
        let tree = commit.tree()?;
        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0)?.tree()?)
        } else {
            None
        };

        let mut diff_opts = DiffOptions::new();
        diff_opts.context_lines(3).ignore_whitespace(false);

        let diff =
            self.repo
                .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut diff_opts))?;

        let mut diff_content = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            let content = String::from_utf8_lossy(line.content());
            match line.origin() {
                origin @ ('+' | '-' | ' ') => {
                    diff_content.push(origin);
                    diff_content.push_str(&content);
                }
                _ => diff_content.push_str(&content),
            }
            true
        })?;

        if self.max_diff_bytes > 0 && diff_content.len() > self.max_diff_bytes {
            let mut cut = self.max_diff_bytes;
            while !diff_content.is_char_boundary(cut) {
                cut -= 1;
            }
            diff_content.truncate(cut);
            diff_content.push_str("\n\n[... diff truncated ...]");
            tracing::warn!("Truncated large diff for commit {}", commit.id());
        }

        Ok(diff_content)
    }
}

impl CommitSource for GitWalker {
    fn discover(&self, range: &DateRange, order: CommitOrder) -> Result<Vec<String>, GitError> {
        self.list_commits(range, order)
    }

    fn load(&self, hash: &str) -> Result<CommitRecord, GitError> {
        self.read_commit(hash)
    }
}

fn commit_date(seconds: i64, offset_minutes: i32) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(offset_minutes * 60).unwrap_or(Utc.fix());
    DateTime::from_timestamp(seconds, 0)
        .unwrap_or_default()
        .with_timezone(&offset)
}

/// Extract a repository name from a remote URL.
///
/// `https://github.com/user/repo.git`, `git@github.com:user/repo.git` and
/// `https://github.com/user/repo` all yield `repo`.
pub fn repo_name_from_url(url: &str) -> Option<String> {
    let url = url.trim().trim_end_matches('/');
    let url = url.strip_suffix(".git").unwrap_or(url);
    let name = url.rsplit('/').next()?.rsplit(':').next()?;
    (!name.is_empty()).then(|| name.to_string())
}

fn dir_name(path: &Path) -> String {
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "repository".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use git2::{Commit, Signature, Time};
    use tempfile::TempDir;

    const DAY: i64 = 86_400;
    // 2024-01-01T00:00:00Z
    const JAN_1: i64 = 1_704_067_200;

    fn commit_file(repo: &Repository, name: &str, content: &str, message: &str, time: i64) -> Oid {
        let workdir = repo.workdir().unwrap().to_path_buf();
        std::fs::write(workdir.join(name), content).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::new("Test Author", "test@example.com", &Time::new(time, 0)).unwrap();
        let parents: Vec<Commit> = repo
            .head()
            .ok()
            .map(|head| vec![head.peel_to_commit().unwrap()])
            .unwrap_or_default();
        let parent_refs: Vec<&Commit> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sample_repo() -> (TempDir, Vec<Oid>) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let oids = vec![
            commit_file(&repo, "a.txt", "one\n", "first commit", JAN_1 + 3600),
            commit_file(&repo, "a.txt", "one\ntwo\n", "second commit", JAN_1 + DAY + 3600),
            commit_file(&repo, "b.txt", "three\n", "third commit", JAN_1 + 2 * DAY + 3600),
        ];
        (dir, oids)
    }

    #[test]
    fn test_open_missing_path() {
        let result = GitWalker::open("/nonexistent/repo/path");
        assert!(matches!(result, Err(GitError::RepositoryNotFound(_))));
    }

    #[test]
    fn test_open_plain_directory() {
        let dir = TempDir::new().unwrap();
        let result = GitWalker::open(dir.path());
        assert!(matches!(result, Err(GitError::RepositoryNotFound(_))));
    }

    #[test]
    fn test_discover_newest_first() {
        let (dir, oids) = sample_repo();
        let walker = GitWalker::open(dir.path()).unwrap();

        let hashes = walker
            .discover(&DateRange::new(jan(1), jan(3)), CommitOrder::NewestFirst)
            .unwrap();

        let expected: Vec<String> = oids.iter().rev().map(|o| o.to_string()).collect();
        assert_eq!(hashes, expected);
    }

    #[test]
    fn test_discover_oldest_first() {
        let (dir, oids) = sample_repo();
        let walker = GitWalker::open(dir.path()).unwrap();

        let hashes = walker
            .discover(&DateRange::new(jan(1), jan(3)), CommitOrder::OldestFirst)
            .unwrap();

        let expected: Vec<String> = oids.iter().map(|o| o.to_string()).collect();
        assert_eq!(hashes, expected);
    }

    #[test]
    fn test_discover_respects_inclusive_range() {
        let (dir, oids) = sample_repo();
        let walker = GitWalker::open(dir.path()).unwrap();

        let hashes = walker
            .discover(&DateRange::new(jan(2), jan(2)), CommitOrder::NewestFirst)
            .unwrap();
        assert_eq!(hashes, vec![oids[1].to_string()]);
    }

    #[test]
    fn test_discover_empty_and_reversed_ranges() {
        let (dir, _) = sample_repo();
        let walker = GitWalker::open(dir.path()).unwrap();

        let none = walker
            .discover(&DateRange::new(jan(10), jan(20)), CommitOrder::NewestFirst)
            .unwrap();
        assert!(none.is_empty());

        let reversed = walker
            .discover(&DateRange::new(jan(3), jan(1)), CommitOrder::NewestFirst)
            .unwrap();
        assert!(reversed.is_empty());
    }

    #[test]
    fn test_discover_in_repo_without_commits() {
        let dir = TempDir::new().unwrap();
        Repository::init(dir.path()).unwrap();
        let walker = GitWalker::open(dir.path()).unwrap();

        let hashes = walker
            .discover(&DateRange::new(jan(1), jan(3)), CommitOrder::NewestFirst)
            .unwrap();
        assert!(hashes.is_empty());
    }

    #[test]
    fn test_load_commit_record() {
        let (dir, oids) = sample_repo();
        let walker = GitWalker::open(dir.path()).unwrap();

        let record = walker.load(&oids[1].to_string()).unwrap();
        assert_eq!(record.hash, oids[1].to_string());
        assert_eq!(record.author, "Test Author <test@example.com>");
        assert_eq!(record.message, "second commit");
        assert_eq!(record.date.timestamp(), JAN_1 + DAY + 3600);
        assert!(record.diff.contains("diff --git a/a.txt b/a.txt"));
        assert!(record.diff.contains("+two"));
        assert!(record.diff.contains(" one"));
    }

    #[test]
    fn test_root_commit_diffs_against_empty_tree() {
        let (dir, oids) = sample_repo();
        let walker = GitWalker::open(dir.path()).unwrap();

        let record = walker.load(&oids[0].to_string()).unwrap();
        assert!(record.diff.contains("new file mode"));
        assert!(record.diff.contains("+one"));
    }

    #[test]
    fn test_load_unknown_commit() {
        let (dir, _) = sample_repo();
        let walker = GitWalker::open(dir.path()).unwrap();

        let result = walker.load("0123456789abcdef0123456789abcdef01234567");
        assert!(matches!(result, Err(GitError::CommitReadFailed { .. })));
    }

    #[test]
    fn test_diff_truncation() {
        let (dir, oids) = sample_repo();
        let walker = GitWalker::open(dir.path()).unwrap().with_max_diff_bytes(20);

        let record = walker.load(&oids[0].to_string()).unwrap();
        assert!(record.diff.ends_with("[... diff truncated ...]"));
    }

    #[test]
    fn test_repo_name_from_remote() {
        let (dir, _) = sample_repo();
        let repo = Repository::open(dir.path()).unwrap();
        repo.remote("origin", "git@github.com:acme/widgets.git")
            .unwrap();

        let walker = GitWalker::open(dir.path()).unwrap();
        assert_eq!(walker.repo_name(), "widgets");
    }

    #[test]
    fn test_repo_name_falls_back_to_directory() {
        let parent = TempDir::new().unwrap();
        let path = parent.path().join("my-project");
        std::fs::create_dir(&path).unwrap();
        Repository::init(&path).unwrap();

        let walker = GitWalker::open(&path).unwrap();
        assert_eq!(walker.repo_name(), "my-project");
    }

    #[test]
    fn test_repo_name_from_url_variants() {
        assert_eq!(
            repo_name_from_url("https://github.com/user/repo.git").as_deref(),
            Some("repo")
        );
        assert_eq!(
            repo_name_from_url("git@github.com:user/repo.git").as_deref(),
            Some("repo")
        );
        assert_eq!(
            repo_name_from_url("https://github.com/user/repo/").as_deref(),
            Some("repo")
        );
        assert_eq!(repo_name_from_url(""), None);
    }
}
