use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{Cred, FetchOptions, RemoteCallbacks, Repository};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::error::{DetectiveError, Result};

/// Where a working copy lives for the duration of one history call.
#[derive(Debug)]
pub(crate) enum RepositoryHandle {
    /// The process's working directory, used as-is
    Ambient(PathBuf),
    /// A caller-chosen directory; never removed by us
    Local(PathBuf),
    /// A throwaway clone, removed when the handle is dropped
    Temporary(TempDir),
}

impl RepositoryHandle {
    pub(crate) fn path(&self) -> &Path {
        match self {
            Self::Ambient(p) | Self::Local(p) => p,
            Self::Temporary(dir) => dir.path(),
        }
    }
}

/// An open repository together with the handle that keeps it on disk.
///
/// Field order matters: the repository is closed before a temporary
/// directory is removed.
pub(crate) struct OpenedRepository {
    pub(crate) repo: Repository,
    pub(crate) handle: RepositoryHandle,
}

/// Resolves a request to a working copy and walks its history.
#[derive(Debug, Clone, Default)]
pub struct RepositoryAccessor {
    git_token: Option<String>,
    scratch_dir: Option<PathBuf>,
    ambient_dir: Option<PathBuf>,
}

impl RepositoryAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token supplied as HTTPS credentials on clone and fetch
    #[must_use]
    pub fn with_git_token(mut self, token: Option<String>) -> Self {
        self.git_token = token;
        self
    }

    /// Parent directory for throwaway clones (defaults to the system temp dir)
    #[must_use]
    pub fn with_scratch_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.scratch_dir = dir;
        self
    }

    /// Repository used when neither a URL nor a local directory is given
    /// (defaults to the process's current directory)
    #[must_use]
    pub fn with_ambient_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ambient_dir = Some(dir.into());
        self
    }

    /// Materialize a working copy. First match wins:
    ///
    /// 1. URL + existing local dir: open it and try to fast-forward it
    /// 2. URL + missing local dir: create it and clone into it
    /// 3. URL alone: clone into a temporary directory
    /// 4. Local dir alone: open it and try to fast-forward it
    /// 5. Neither: open the ambient working directory
    pub(crate) fn open(
        &self,
        repository_url: Option<&str>,
        local_directory: Option<&Path>,
    ) -> Result<OpenedRepository> {
        match (repository_url, local_directory) {
            (_, Some(dir)) if dir.exists() => {
                tracing::info!("Reusing local checkout at {}", dir.display());
                let repo = open_repo(dir)?;
                match pull_repo(&repo, self.git_token.as_deref()) {
                    Ok(head) => tracing::info!("Local checkout {} is at {head}", dir.display()),
                    Err(e) => tracing::warn!(
                        "Pull failed for {}, continuing with local history: {e}",
                        dir.display()
                    ),
                }
                Ok(OpenedRepository {
                    repo,
                    handle: RepositoryHandle::Local(dir.to_path_buf()),
                })
            }
            (Some(url), Some(dir)) => {
                std::fs::create_dir_all(dir).map_err(|e| {
                    DetectiveError::repo(format!("Failed to create {}", dir.display()), e)
                })?;
                let repo = clone_repo(url, dir, self.git_token.as_deref())?;
                Ok(OpenedRepository {
                    repo,
                    handle: RepositoryHandle::Local(dir.to_path_buf()),
                })
            }
            (None, Some(dir)) => Err(DetectiveError::RepositoryAccess(format!(
                "Local directory {} does not exist and no repository URL was given",
                dir.display()
            ))),
            (Some(url), None) => {
                let tmp = self.temp_dir()?;
                // An early return here drops `tmp` and removes the partial clone.
                let repo = clone_repo(url, tmp.path(), self.git_token.as_deref())?;
                Ok(OpenedRepository {
                    repo,
                    handle: RepositoryHandle::Temporary(tmp),
                })
            }
            (None, None) => {
                let dir = match &self.ambient_dir {
                    Some(dir) => dir.clone(),
                    None => std::env::current_dir().map_err(|e| {
                        DetectiveError::repo("Failed to read current directory", e)
                    })?,
                };
                tracing::info!("Using working directory {}", dir.display());
                let repo = open_repo(&dir)?;
                Ok(OpenedRepository {
                    repo,
                    handle: RepositoryHandle::Ambient(dir),
                })
            }
        }
    }

    fn temp_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("commit-detective-");
        let dir = match &self.scratch_dir {
            Some(parent) => {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DetectiveError::repo(format!("Failed to create {}", parent.display()), e)
                })?;
                builder.tempdir_in(parent)
            }
            None => builder.tempdir(),
        };
        dir.map_err(|e| DetectiveError::repo("Failed to create temporary directory", e))
    }
}

fn open_repo(path: &Path) -> Result<Repository> {
    Repository::open(path)
        .map_err(|e| DetectiveError::repo(format!("Failed to open repository {}", path.display()), e))
}

fn fetch_options(git_token: Option<&str>) -> FetchOptions<'_> {
    let mut callbacks = RemoteCallbacks::new();
    if let Some(token) = git_token {
        callbacks.credentials(move |_url, username, _allowed| {
            Cred::userpass_plaintext(username.unwrap_or("x-access-token"), token)
        });
    }
    let mut opts = FetchOptions::new();
    opts.remote_callbacks(callbacks);
    opts
}

/// Clone a git repository to the target directory.
pub fn clone_repo(url: &str, target: &Path, git_token: Option<&str>) -> Result<Repository> {
    tracing::info!("Cloning {} into {}", url, target.display());
    let repo = RepoBuilder::new()
        .fetch_options(fetch_options(git_token))
        .clone(url, target)
        .map_err(|e| DetectiveError::repo(format!("Failed to clone {url}"), e))?;
    tracing::info!("Clone complete: {}", target.display());
    Ok(repo)
}

/// Fetch the current branch's upstream and fast-forward onto it.
/// Returns the resulting HEAD SHA.
pub fn pull_repo(repo: &Repository, git_token: Option<&str>) -> Result<String, git2::Error> {
    let head = repo.head()?;
    if !head.is_branch() {
        return Err(git2::Error::from_str("HEAD is detached, nothing to pull"));
    }
    let branch_ref = head
        .name()
        .ok_or_else(|| git2::Error::from_str("branch name is not valid UTF-8"))?
        .to_string();
    let head_oid = head
        .target()
        .ok_or_else(|| git2::Error::from_str("HEAD has no target"))?;

    let remote_name = repo.branch_upstream_remote(&branch_ref)?;
    let remote_name = remote_name
        .as_str()
        .ok_or_else(|| git2::Error::from_str("remote name is not valid UTF-8"))?;
    let mut remote = repo.find_remote(remote_name)?;
    remote.fetch::<&str>(&[], Some(&mut fetch_options(git_token)), None)?;

    let upstream_ref = repo.branch_upstream_name(&branch_ref)?;
    let upstream_ref = upstream_ref
        .as_str()
        .ok_or_else(|| git2::Error::from_str("upstream name is not valid UTF-8"))?;
    let upstream_oid = repo.refname_to_id(upstream_ref)?;
    let upstream = repo.find_annotated_commit(upstream_oid)?;

    let (analysis, _) = repo.merge_analysis(&[&upstream])?;
    if analysis.is_up_to_date() {
        return Ok(head_oid.to_string());
    }
    if !analysis.is_fast_forward() {
        return Err(git2::Error::from_str(
            "local branch has diverged from upstream, cannot fast-forward",
        ));
    }

    // Update the working tree before moving the branch: a safe checkout
    // refuses to overwrite uncommitted edits, leaving HEAD where it was.
    let target = repo.find_object(upstream_oid, None)?;
    repo.checkout_tree(&target, Some(CheckoutBuilder::new().safe()))?;
    repo.find_reference(&branch_ref)?
        .set_target(upstream_oid, "commit-detective: fast-forward")?;
    repo.set_head(&branch_ref)?;
    Ok(upstream_oid.to_string())
}
