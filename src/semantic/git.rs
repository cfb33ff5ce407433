//! Commit history mining via libgit2.

use std::path::Path;

use git2::{Repository, Sort};

use crate::errors::Result;

use super::SemanticConfig;

/// One commit reduced to what the neighborhood pass needs.
#[derive(Debug, Clone)]
pub struct CommitRecord {
    /// Repository-relative paths touched by the commit, forward slashes.
    pub files: Vec<String>,
    /// Commit time, UNIX seconds.
    pub timestamp: i64,
}

/// Walks commits newer than the configured window, newest first.
///
/// Returns `Ok(None)` when `target_dir` is not inside a git working tree.
/// An unborn HEAD (fresh `git init`) yields an empty history rather than
/// an error. Merge commits are diffed against their first parent only.
pub fn collect_history(
    target_dir: &Path,
    config: &SemanticConfig,
) -> Result<Option<Vec<CommitRecord>>> {
    let repo = match Repository::discover(target_dir) {
        Ok(repo) => repo,
        Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TIME)?;
    if let Err(e) = revwalk.push_head() {
        if e.code() == git2::ErrorCode::UnbornBranch || e.code() == git2::ErrorCode::NotFound {
            return Ok(Some(Vec::new()));
        }
        return Err(e.into());
    }

    let cutoff = chrono::Utc::now().timestamp() - config.window_days * 86_400;
    let mut records = Vec::new();

    for oid in revwalk {
        if records.len() >= config.max_commits {
            break;
        }
        let commit = repo.find_commit(oid?)?;
        let timestamp = commit.time().seconds();
        if timestamp < cutoff {
            break;
        }

        let tree = commit.tree()?;
        let parent_tree = commit.parent(0).ok().and_then(|p| p.tree().ok());
        let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

        let mut files: Vec<String> = diff
            .deltas()
            .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()))
            .map(|p| p.display().to_string().replace('\\', "/"))
            .collect();
        files.sort_unstable();
        files.dedup();

        if !files.is_empty() {
            records.push(CommitRecord { files, timestamp });
        }
    }

    Ok(Some(records))
}
