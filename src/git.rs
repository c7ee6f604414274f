use crate::error::{ReleaseError, Result};
use git2::{
    Cred, CredentialType, Direction, ErrorClass, ErrorCode, Oid, PushOptions, Remote, RemoteCallbacks, Repository,
    Signature,
};
use log::{debug, info, warn};
use std::cell::{Cell, OnceCell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// The version control operations a release needs.
///
/// Every call blocks until the operation finished. Failures are fatal to the
/// release; nothing is retried or undone.
pub trait SourceControl {
    /// URL of the remote releases are pushed to
    fn current_remote_url(&self) -> Result<String>;
    /// Tag names matching a glob, in the order the repository reports them
    fn list_tags(&self, pattern: &str) -> Result<Vec<String>>;
    fn stage(&self, paths: &[PathBuf]) -> Result<()>;
    fn stage_all(&self) -> Result<()>;
    fn commit(&self, message: &str) -> Result<()>;
    /// Creates an annotated tag on `HEAD`
    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()>;
    fn push_branch(&self, name: &str) -> Result<()>;
    fn push_tag(&self, name: &str) -> Result<()>;
    fn current_branch(&self) -> Result<String>;
}

pub struct GitTracker {
    pub repository: Repository,
    remote: String,
}

impl GitTracker {
    /// Opens the repository containing `path`, pushing to `remote`
    pub fn open(path: impl AsRef<Path>, remote: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let repository = Repository::discover(path)
            .map_err(ReleaseError::git(format!("open repository at {}", path.display())))?;

        debug!("Opened repository at {:?}", repository.path());

        Ok(GitTracker { repository, remote: remote.into() })
    }

    /// Creates authentication callbacks that use local git credentials
    fn create_auth_callbacks() -> RemoteCallbacks<'static> {
        let mut callbacks = RemoteCallbacks::new();
        let attempts = Cell::new(0u32);

        callbacks.credentials(move |url, username_from_url, allowed_types| {
            let attempt = attempts.get() + 1;
            attempts.set(attempt);
            debug!(
                "Credentials callback attempt {}: url={}, allowed_types={:?}",
                attempt, url, allowed_types
            );

            // libgit2 keeps asking as long as we keep answering
            if attempt > 5 {
                warn!("Too many credential attempts, authentication likely failing");
                return Err(git2::Error::from_str("authentication failed after multiple attempts"));
            }

            let username = username_from_url.unwrap_or("git");

            if allowed_types.contains(CredentialType::SSH_KEY) {
                if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                    return Ok(cred);
                }

                if let Some(home) = dirs::home_dir() {
                    let ssh_dir = home.join(".ssh");
                    for key_name in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                        let private_key = ssh_dir.join(key_name);
                        let public_key = ssh_dir.join(format!("{key_name}.pub"));
                        if !private_key.exists() {
                            continue;
                        }
                        debug!("Trying SSH key: {:?}", private_key);
                        let public_key = public_key.exists().then_some(public_key.as_path());
                        if let Ok(cred) = Cred::ssh_key(username, public_key, &private_key, None) {
                            return Ok(cred);
                        }
                    }
                }
            }

            if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
                debug!("Trying credential helper");
                if let Ok(cred) = Cred::credential_helper(&git2::Config::open_default()?, url, username_from_url) {
                    return Ok(cred);
                }
            }

            if allowed_types.contains(CredentialType::DEFAULT) {
                return Cred::default();
            }

            Err(git2::Error::from_str("no suitable credentials found"))
        });

        callbacks
    }

    fn get_signature(&self) -> Result<Signature<'_>> {
        self.repository.signature().map_err(ReleaseError::git("read user.name/user.email"))
    }

    /// Pushes `local_ref` to the same name on the remote.
    ///
    /// The remote's current value is checked first: a branch only moves
    /// forward and an existing tag is never replaced. libgit2's local
    /// transport would otherwise overwrite either without complaint.
    fn push_ref(&self, operation: &str, local_ref: &str) -> Result<()> {
        let mut remote = self
            .repository
            .find_remote(&self.remote)
            .map_err(|_| ReleaseError::RemoteNotConfigured { remote: self.remote.clone() })?;

        let local = self.repository.refname_to_id(local_ref).map_err(ReleaseError::git(operation))?;
        if let Some(current) = Self::remote_ref_target(&mut remote, operation, local_ref)? {
            self.ensure_fast_forward(operation, local_ref, local, current)?;
        }

        let rejections = PushRejections::default();
        let mut callbacks = Self::create_auth_callbacks();
        let recorder = rejections.clone();
        callbacks.push_update_reference(move |refname, status| {
            recorder.record(refname, status);
            Ok(())
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let refspec = format!("{local_ref}:{local_ref}");
        remote.push(&[refspec.as_str()], Some(&mut push_options)).map_err(ReleaseError::git(operation))?;
        rejections.into_result(operation)
    }

    /// What `refname` points at on the remote, if it exists there
    fn remote_ref_target(remote: &mut Remote<'_>, operation: &str, refname: &str) -> Result<Option<Oid>> {
        let connection = remote
            .connect_auth(Direction::Push, Some(Self::create_auth_callbacks()), None)
            .map_err(ReleaseError::git(operation))?;
        let heads = connection.list().map_err(ReleaseError::git(operation))?;
        let target = heads.iter().find(|head| head.name() == refname).map(|head| head.oid());
        debug!("{} on remote: {:?}", refname, target);
        Ok(target)
    }

    fn ensure_fast_forward(&self, operation: &str, refname: &str, local: Oid, remote: Oid) -> Result<()> {
        if local == remote {
            return Ok(());
        }
        // an unknown remote commit means our history cannot contain it
        let descends = refname.starts_with("refs/heads/")
            && self.repository.graph_descendant_of(local, remote).unwrap_or(false);
        if descends {
            return Ok(());
        }

        let message = format!("{refname} on '{}' ({remote}) is not an ancestor of {local}", self.remote);
        warn!("Refusing to push: {}", message);
        Err(ReleaseError::git(operation)(git2::Error::new(
            ErrorCode::NotFastForward,
            ErrorClass::Reference,
            message,
        )))
    }

    /// Path of `path` relative to the working directory, as the index expects it
    fn index_path(&self, path: &Path) -> Result<PathBuf> {
        let workdir = self
            .repository
            .workdir()
            .ok_or_else(|| ReleaseError::git("stage")(git2::Error::from_str("repository has no working directory")))?;
        let workdir = std::fs::canonicalize(workdir)?;
        let absolute = std::fs::canonicalize(path)?;
        absolute.strip_prefix(&workdir).map(Path::to_path_buf).map_err(|_| {
            let message = format!("'{}' is outside the repository", path.display());
            ReleaseError::git("stage")(git2::Error::from_str(&message))
        })
    }

    /// Whether the index differs from the tree `HEAD` points at
    fn has_staged_changes(&self) -> Result<bool> {
        let head_tree = match self.repository.head() {
            Ok(head) => Some(head.peel_to_tree().map_err(ReleaseError::git("read HEAD tree"))?),
            Err(_) => None,
        };
        let diff = self
            .repository
            .diff_tree_to_index(head_tree.as_ref(), None, None)
            .map_err(ReleaseError::git("diff index"))?;
        Ok(diff.deltas().len() > 0)
    }
}

impl SourceControl for GitTracker {
    fn current_remote_url(&self) -> Result<String> {
        let remote = self
            .repository
            .find_remote(&self.remote)
            .map_err(|_| ReleaseError::RemoteNotConfigured { remote: self.remote.clone() })?;
        remote
            .url()
            .map(str::to_string)
            .ok_or_else(|| ReleaseError::RemoteNotConfigured { remote: self.remote.clone() })
    }

    fn list_tags(&self, pattern: &str) -> Result<Vec<String>> {
        let tags = self.repository.tag_names(Some(pattern)).map_err(ReleaseError::git("list tags"))?;
        Ok(tags.iter().flatten().map(str::to_string).collect())
    }

    fn stage(&self, paths: &[PathBuf]) -> Result<()> {
        let mut index = self.repository.index().map_err(ReleaseError::git("stage"))?;
        for path in paths {
            let relative = self.index_path(path)?;
            debug!("Staging {}", relative.display());
            index.add_path(&relative).map_err(ReleaseError::git("stage"))?;
        }
        index.write().map_err(ReleaseError::git("stage"))?;
        Ok(())
    }

    fn stage_all(&self) -> Result<()> {
        let mut index = self.repository.index().map_err(ReleaseError::git("stage all"))?;
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .map_err(ReleaseError::git("stage all"))?;
        // picks up deletions as well
        index.update_all(["*"].iter(), None).map_err(ReleaseError::git("stage all"))?;
        index.write().map_err(ReleaseError::git("stage all"))?;

        debug!("Staged all changes");
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        if !self.has_staged_changes()? {
            warn!("No changes to commit");
            return Ok(());
        }

        info!("Creating commit: {}", message);

        let mut index = self.repository.index().map_err(ReleaseError::git("commit"))?;
        let tree_id = index.write_tree().map_err(ReleaseError::git("commit"))?;
        let tree = self.repository.find_tree(tree_id).map_err(ReleaseError::git("commit"))?;
        let sig = self.get_signature()?;

        let parent_commit = match self.repository.head() {
            Ok(head) => Some(head.peel_to_commit().map_err(ReleaseError::git("commit"))?),
            Err(_) => {
                warn!("No parent commit found - this will be the initial commit");
                None
            }
        };
        let parents: Vec<&git2::Commit> = parent_commit.iter().collect();

        let commit_id = self
            .repository
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .map_err(ReleaseError::git("commit"))?;

        info!("Created commit: {}", commit_id);
        Ok(())
    }

    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()> {
        info!("Creating tag: {}", name);

        let sig = self.get_signature()?;
        let head = self
            .repository
            .head()
            .and_then(|head| head.peel(git2::ObjectType::Commit))
            .map_err(ReleaseError::git("tag"))?;

        self.repository.tag(name, &head, &sig, message, false).map_err(ReleaseError::git("tag"))?;
        Ok(())
    }

    fn push_branch(&self, name: &str) -> Result<()> {
        info!("Pushing {} to {}", name, self.remote);
        self.push_ref("push branch", &format!("refs/heads/{name}"))
    }

    fn push_tag(&self, name: &str) -> Result<()> {
        info!("Pushing tag {} to {}", name, self.remote);
        self.push_ref("push tag", &format!("refs/tags/{name}"))
    }

    fn current_branch(&self) -> Result<String> {
        let head = self.repository.head().map_err(ReleaseError::git("read current branch"))?;
        head.shorthand().map(str::to_string).ok_or_else(|| {
            ReleaseError::git("read current branch")(git2::Error::from_str("HEAD is not a valid branch name"))
        })
    }
}

/// Ref updates the remote refused.
///
/// `Remote::push` only fails on transport errors; a server turning down a
/// ref (hook, protected branch) is reported per ref through the
/// `push_update_reference` callback.
#[derive(Clone, Default)]
struct PushRejections(Rc<RefCell<Vec<String>>>);

impl PushRejections {
    fn record(&self, refname: &str, status: Option<&str>) {
        match status {
            Some(status) => {
                warn!("Remote rejected {}: {}", refname, status);
                self.0.borrow_mut().push(format!("{refname}: {status}"));
            }
            None => debug!("Remote accepted {}", refname),
        }
    }

    fn into_result(self, operation: &str) -> Result<()> {
        let rejected = self.0.borrow();
        if rejected.is_empty() {
            return Ok(());
        }
        let message = format!("remote rejected {}", rejected.join(", "));
        Err(ReleaseError::git(operation)(git2::Error::new(ErrorCode::GenericError, ErrorClass::Net, message)))
    }
}

/// A [`GitTracker`] that opens the repository on first use.
///
/// Runs that never touch git (a manifest-sourced dry run) then work outside
/// a repository. A failed open is retried on the next call.
pub struct LazyGitTracker {
    path: PathBuf,
    remote: String,
    tracker: OnceCell<GitTracker>,
}

impl LazyGitTracker {
    pub fn new(path: impl Into<PathBuf>, remote: impl Into<String>) -> Self {
        Self { path: path.into(), remote: remote.into(), tracker: OnceCell::new() }
    }

    /// Opens the repository now if it is not open yet
    pub fn tracker(&self) -> Result<&GitTracker> {
        if let Some(tracker) = self.tracker.get() {
            return Ok(tracker);
        }
        let tracker = GitTracker::open(&self.path, self.remote.clone())?;
        Ok(self.tracker.get_or_init(|| tracker))
    }
}

impl SourceControl for LazyGitTracker {
    fn current_remote_url(&self) -> Result<String> {
        self.tracker()?.current_remote_url()
    }

    fn list_tags(&self, pattern: &str) -> Result<Vec<String>> {
        self.tracker()?.list_tags(pattern)
    }

    fn stage(&self, paths: &[PathBuf]) -> Result<()> {
        self.tracker()?.stage(paths)
    }

    fn stage_all(&self) -> Result<()> {
        self.tracker()?.stage_all()
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.tracker()?.commit(message)
    }

    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()> {
        self.tracker()?.create_annotated_tag(name, message)
    }

    fn push_branch(&self, name: &str) -> Result<()> {
        self.tracker()?.push_branch(name)
    }

    fn push_tag(&self, name: &str) -> Result<()> {
        self.tracker()?.push_tag(name)
    }

    fn current_branch(&self) -> Result<String> {
        self.tracker()?.current_branch()
    }
}
