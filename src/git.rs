use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::defaults::DEFAULT_REF;
use crate::error::Error;
use crate::path::encode_url_path;

/// Clone a repository at a specific ref using shallow clone
///
/// A `ref_name` of `HEAD` clones the remote's default branch.
///
/// This uses the system git command, which automatically handles:
/// - SSH keys from ~/.ssh/
/// - Git credential helpers
/// - Personal access tokens
/// - Any authentication configured in ~/.gitconfig
pub fn clone_shallow(url: &str, ref_name: &str, target_dir: &Path) -> Result<(), Error> {
    // Remove target directory if it exists (git won't clone into existing non-empty dir)
    if target_dir.exists() {
        fs::remove_dir_all(target_dir)?;
    }

    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut command = Command::new("git");
    command.args(["clone", "--depth=1"]);
    if ref_name != DEFAULT_REF {
        command.args(["--branch", ref_name]);
    }
    let output = command
        .arg(url)
        .arg(target_dir)
        .output()
        .map_err(|e| Error::GitClone {
            url: url.to_string(),
            r#ref: ref_name.to_string(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);

        // Provide helpful error message for common auth failures
        let message = if stderr.contains("Authentication failed")
            || stderr.contains("Permission denied")
            || stderr.contains("Could not read from remote repository")
        {
            format!(
                "Authentication failed. Make sure you have access to the repository.\n\
                For private repos, ensure you have:\n\
                - SSH key added to ssh-agent\n\
                - Git credentials configured\n\
                - Personal access token set up\n\
                Error: {}",
                stderr
            )
        } else {
            stderr.to_string()
        };

        return Err(Error::GitClone {
            url: url.to_string(),
            r#ref: ref_name.to_string(),
            message,
        });
    }

    Ok(())
}

/// Whether a git failure means the repository does not exist, as opposed
/// to a transient network or authentication problem.
pub fn is_missing_repository(error: &Error) -> bool {
    match error {
        Error::GitClone { message, .. } => {
            message.contains("not found") || message.contains("does not exist")
        }
        _ => false,
    }
}

/// Convert URL and ref to cache path
pub fn url_to_cache_path(cache_root: &Path, url: &str, ref_name: &str) -> PathBuf {
    let safe_ref = ref_name.replace('/', "-");
    cache_root.join(format!("{}@{}", encode_url_path(url), safe_ref))
}
