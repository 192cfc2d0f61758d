//! Install and uninstall by symlinking the extension directory into the
//! Gemini CLI extensions folder.
//!
//! The CLI host discovers extensions under `~/.gemini/extensions`; a restart
//! is required after installing. Both operations are idempotent.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Name the extension is registered under in the extensions folder.
pub const EXTENSION_NAME: &str = "telegram";

/// Outcome of an install attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed { link: PathBuf },
    AlreadyInstalled { link: PathBuf },
}

/// Outcome of an uninstall attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallOutcome {
    Removed { link: PathBuf },
    NotInstalled { link: PathBuf },
}

/// Default extensions folder: `~/.gemini/extensions`.
pub fn default_extensions_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(".gemini").join("extensions"))
        .unwrap_or_else(|| PathBuf::from(".gemini/extensions"))
}

/// Symlink `source_dir` as `<extensions_dir>/telegram`.
///
/// A link already pointing at `source_dir` is left alone; a link pointing
/// elsewhere (a previous checkout, say) is replaced. A real file or
/// directory at the link path is never touched.
pub fn install(source_dir: &Path, extensions_dir: &Path) -> Result<InstallOutcome> {
    let source = source_dir.canonicalize().with_context(|| {
        format!("Extension directory not found: {}", source_dir.display())
    })?;
    if !source.is_dir() {
        bail!("Extension source is not a directory: {}", source.display());
    }

    std::fs::create_dir_all(extensions_dir).with_context(|| {
        format!(
            "Failed to create extensions folder: {}",
            extensions_dir.display()
        )
    })?;
    let link = extensions_dir.join(EXTENSION_NAME);

    match std::fs::read_link(&link) {
        Ok(existing) if existing == source => {
            return Ok(InstallOutcome::AlreadyInstalled { link });
        }
        Ok(_) => {
            // Stale link from another location
            std::fs::remove_file(&link)
                .with_context(|| format!("Failed to replace stale link at {}", link.display()))?;
        }
        Err(_) if link.exists() => {
            bail!(
                "{} exists and is not a symlink; remove it manually",
                link.display()
            );
        }
        Err(_) => {}
    }

    std::os::unix::fs::symlink(&source, &link)
        .with_context(|| format!("Failed to create symlink at {}", link.display()))?;
    Ok(InstallOutcome::Installed { link })
}

/// Remove the extension symlink if present. Running this twice is fine; the
/// second call reports [`UninstallOutcome::NotInstalled`].
pub fn uninstall(extensions_dir: &Path) -> Result<UninstallOutcome> {
    let link = extensions_dir.join(EXTENSION_NAME);
    if std::fs::symlink_metadata(&link).is_err() {
        return Ok(UninstallOutcome::NotInstalled { link });
    }
    std::fs::remove_file(&link)
        .with_context(|| format!("Failed to remove {}", link.display()))?;
    Ok(UninstallOutcome::Removed { link })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("extension");
        std::fs::create_dir(&source).unwrap();
        let extensions = root.path().join("gemini").join("extensions");
        (root, source, extensions)
    }

    #[test]
    fn install_then_uninstall_leaves_nothing_behind() {
        let (_root, source, extensions) = setup();

        let outcome = install(&source, &extensions).unwrap();
        let InstallOutcome::Installed { link } = outcome else {
            panic!("expected fresh install");
        };
        assert_eq!(std::fs::read_link(&link).unwrap(), source.canonicalize().unwrap());

        let outcome = uninstall(&extensions).unwrap();
        assert!(matches!(outcome, UninstallOutcome::Removed { .. }));
        assert!(std::fs::symlink_metadata(&link).is_err());
    }

    #[test]
    fn reinstall_reports_already_installed() {
        let (_root, source, extensions) = setup();

        install(&source, &extensions).unwrap();
        let outcome = install(&source, &extensions).unwrap();
        assert!(matches!(outcome, InstallOutcome::AlreadyInstalled { .. }));
    }

    #[test]
    fn install_replaces_link_to_another_location() {
        let (root, source, extensions) = setup();
        let other = root.path().join("old-checkout");
        std::fs::create_dir(&other).unwrap();

        install(&other, &extensions).unwrap();
        let outcome = install(&source, &extensions).unwrap();
        let InstallOutcome::Installed { link } = outcome else {
            panic!("expected replacement install");
        };
        assert_eq!(std::fs::read_link(&link).unwrap(), source.canonicalize().unwrap());
    }

    #[test]
    fn install_refuses_to_clobber_real_directory() {
        let (_root, source, extensions) = setup();
        let occupied = extensions.join(EXTENSION_NAME);
        std::fs::create_dir_all(&occupied).unwrap();

        let err = install(&source, &extensions).unwrap_err();
        assert!(err.to_string().contains("not a symlink"));
    }

    #[test]
    fn uninstall_twice_is_idempotent() {
        let (_root, source, extensions) = setup();

        install(&source, &extensions).unwrap();
        assert!(matches!(
            uninstall(&extensions).unwrap(),
            UninstallOutcome::Removed { .. }
        ));
        assert!(matches!(
            uninstall(&extensions).unwrap(),
            UninstallOutcome::NotInstalled { .. }
        ));
    }

    #[test]
    fn uninstall_with_no_extensions_folder_is_not_installed() {
        let root = tempfile::tempdir().unwrap();
        let extensions = root.path().join("never-created");
        assert!(matches!(
            uninstall(&extensions).unwrap(),
            UninstallOutcome::NotInstalled { .. }
        ));
    }

    #[test]
    fn install_missing_source_fails() {
        let root = tempfile::tempdir().unwrap();
        let extensions = root.path().join("ext");
        let err = install(&root.path().join("nope"), &extensions).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
