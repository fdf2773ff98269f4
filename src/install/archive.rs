use crate::command::{run_elevated, CommandRunner};
use crate::download::{copy_tree, extract_zip, make_executable};
use crate::platform::archive_arch;
use crate::remote::{release_archive_url, HttpClient};
use crate::types::Settings;
use crate::version::Version;
use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Installs the official prebuilt protoc release into `settings.prefix`.
///
/// Installing the same version twice overwrites the files with identical
/// content, so `install` doubles as upgrade and repair.
pub struct ArchiveInstaller<'a, R, H> {
    runner: &'a R,
    http: &'a H,
    settings: &'a Settings,
    arch: &'a str,
}

impl<'a, R: CommandRunner, H: HttpClient> ArchiveInstaller<'a, R, H> {
    pub fn new(runner: &'a R, http: &'a H, settings: &'a Settings, arch: &'a str) -> Self {
        Self {
            runner,
            http,
            settings,
            arch,
        }
    }

    fn prefix(&self) -> &Path {
        Path::new(&self.settings.prefix)
    }

    pub fn binary_path(&self) -> PathBuf {
        self.prefix().join("bin").join("protoc")
    }

    pub async fn install(&self, version: &Version) -> Result<PathBuf> {
        let arch = archive_arch(self.arch)?;
        let url = release_archive_url(&self.settings.github_repo, version, arch);

        // Dropped on every return path, taking the archive and staging tree with it
        let work_dir = TempDir::new().context("failed to create download directory")?;
        let archive_path = work_dir
            .path()
            .join(format!("protoc-{}-linux-{}.zip", version, arch));

        self.http
            .download(&url, &archive_path)
            .await
            .context("failed to download protoc")?;

        let staging = work_dir.path().join("staging");
        fs::create_dir_all(&staging)?;
        extract_zip(&archive_path, &staging).context("failed to unzip protoc")?;

        self.promote(&staging)?;

        let binary = self.binary_path();
        tracing::info!("Installed protoc {} to {}", version, binary.display());
        Ok(binary)
    }

    /// Copies the unpacked release into the prefix, falling back to the
    /// elevation wrapper when the prefix is not writable.
    fn promote(&self, staging: &Path) -> Result<()> {
        let prefix = self.prefix();
        let binary = self.binary_path();

        let direct = copy_tree(staging, prefix).and_then(|_| make_executable(&binary));
        match direct {
            Ok(()) => Ok(()),
            Err(e) if self.can_elevate(&e) => {
                tracing::info!(
                    "{} is not writable, retrying with {}",
                    prefix.display(),
                    self.settings.elevate_with
                );
                let prefix_arg = prefix.to_string_lossy().to_string();
                let source_arg = format!("{}/.", staging.display());
                let binary_arg = binary.to_string_lossy().to_string();
                let elevate = self.settings.elevate_with.as_str();

                run_elevated(self.runner, elevate, "mkdir", &["-p", prefix_arg.as_str()])?;
                run_elevated(
                    self.runner,
                    elevate,
                    "cp",
                    &["-R", source_arg.as_str(), prefix_arg.as_str()],
                )
                .context("failed to copy protoc into place")?;
                run_elevated(self.runner, elevate, "chmod", &["+x", binary_arg.as_str()])
                    .context("failed to chmod protoc")?;
                Ok(())
            }
            Err(e) => Err(e)
                .with_context(|| format!("failed to install protoc into {}", prefix.display())),
        }
    }

    fn can_elevate(&self, e: &io::Error) -> bool {
        e.kind() == io::ErrorKind::PermissionDenied && !self.settings.elevate_with.is_empty()
    }

    /// Removes what [`install`](Self::install) put under the prefix. Returns
    /// whether anything was there.
    pub fn uninstall(&self) -> Result<bool> {
        let targets = [
            self.binary_path(),
            self.prefix().join("include").join("google").join("protobuf"),
        ];

        let mut removed = false;
        for target in targets {
            if !target.exists() {
                continue;
            }
            let result = if target.is_dir() {
                fs::remove_dir_all(&target)
            } else {
                fs::remove_file(&target)
            };
            match result {
                Ok(()) => {}
                Err(e) if self.can_elevate(&e) => {
                    let target_arg = target.to_string_lossy().to_string();
                    let elevate = self.settings.elevate_with.as_str();
                    run_elevated(self.runner, elevate, "rm", &["-rf", target_arg.as_str()])?;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("failed to remove {}", target.display()));
                }
            }
            tracing::info!("Removed {}", target.display());
            removed = true;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::ScriptedRunner;
    use crate::download::testing::write_protoc_zip;
    use crate::error::InstallError;
    use crate::remote::testing::FakeHttp;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn settings_for(prefix: &Path) -> Settings {
        Settings {
            prefix: prefix.to_string_lossy().to_string(),
            elevate_with: String::new(),
            ..Settings::default()
        }
    }

    fn assert_work_dir_removed(archive: &RefCell<Option<PathBuf>>) {
        let archive = archive.borrow().clone().expect("download was attempted");
        let work_dir = archive.parent().unwrap();
        assert!(!archive.exists());
        assert!(!work_dir.exists(), "{} was left behind", work_dir.display());
    }

    #[cfg(unix)]
    fn set_mode(path: &Path, mode: u32) {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    /// Root ignores directory modes, so permission tests are meaningless there.
    #[cfg(unix)]
    fn mode_is_enforced(locked: &Path) -> bool {
        let check = locked.join(".write-check");
        if fs::write(&check, "").is_ok() {
            let _ = fs::remove_file(&check);
            return false;
        }
        true
    }

    #[tokio::test]
    async fn test_install_downloads_matching_archive_into_prefix() {
        let prefix = TempDir::new().unwrap();
        let settings = settings_for(prefix.path());
        let runner = ScriptedRunner::succeeding();
        let http = FakeHttp::new().with_downloads(|_, dest| write_protoc_zip(dest, "24.4"));

        let installer = ArchiveInstaller::new(&runner, &http, &settings, "arm64");
        let version = Version::parse_stable("24.4").unwrap();
        let binary = installer.install(&version).await.unwrap();

        assert_eq!(binary, prefix.path().join("bin/protoc"));
        assert!(fs::read_to_string(&binary).unwrap().contains("libprotoc 24.4"));
        assert!(prefix.path().join("include/google/protobuf/any.proto").exists());
        assert_eq!(
            http.downloads.borrow().as_slice(),
            ["https://github.com/protocolbuffers/protobuf/releases/download/v24.4/protoc-24.4-linux-aarch_64.zip"]
        );
        assert!(runner.calls().is_empty());

        // Same version again is harmless
        installer.install(&version).await.unwrap();
        assert_eq!(http.downloads.borrow().len(), 2);
    }

    #[tokio::test]
    async fn test_unsupported_arch_fails_before_download() {
        let prefix = TempDir::new().unwrap();
        let settings = settings_for(prefix.path());
        let runner = ScriptedRunner::succeeding();
        let http = FakeHttp::new();

        let installer = ArchiveInstaller::new(&runner, &http, &settings, "s390x");
        let err = installer
            .install(&Version::parse_stable("24.4").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::UnsupportedArchitecture(_))
        ));
        assert!(!http.touched_network());
    }

    #[tokio::test]
    async fn test_failed_download_leaves_prefix_untouched() {
        let prefix = TempDir::new().unwrap();
        let settings = settings_for(prefix.path());
        let runner = ScriptedRunner::succeeding();
        let archive = Rc::new(RefCell::new(None));
        let seen = archive.clone();
        let http = FakeHttp::new().with_downloads(move |_, dest| {
            *seen.borrow_mut() = Some(dest.to_path_buf());
            fs::write(dest, "partial")?;
            Err(anyhow::anyhow!("connection reset"))
        });

        let installer = ArchiveInstaller::new(&runner, &http, &settings, "amd64");
        let err = installer
            .install(&Version::parse_stable("24.4").unwrap())
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("failed to download protoc"));
        assert!(!installer.binary_path().exists());
        assert_work_dir_removed(&archive);
    }

    #[tokio::test]
    async fn test_work_dir_is_removed_after_install() {
        let prefix = TempDir::new().unwrap();
        let settings = settings_for(prefix.path());
        let runner = ScriptedRunner::succeeding();
        let archive = Rc::new(RefCell::new(None));
        let seen = archive.clone();
        let http = FakeHttp::new().with_downloads(move |_, dest| {
            *seen.borrow_mut() = Some(dest.to_path_buf());
            write_protoc_zip(dest, "24.4")
        });

        let installer = ArchiveInstaller::new(&runner, &http, &settings, "amd64");
        installer
            .install(&Version::parse_stable("24.4").unwrap())
            .await
            .unwrap();

        assert!(installer.binary_path().exists());
        assert_work_dir_removed(&archive);
    }

    #[tokio::test]
    async fn test_uninstall_removes_installed_files() {
        let prefix = TempDir::new().unwrap();
        let settings = settings_for(prefix.path());
        let runner = ScriptedRunner::succeeding();
        let http = FakeHttp::new().with_downloads(|_, dest| write_protoc_zip(dest, "24.4"));

        let installer = ArchiveInstaller::new(&runner, &http, &settings, "amd64");
        installer
            .install(&Version::parse_stable("24.4").unwrap())
            .await
            .unwrap();

        assert!(installer.uninstall().unwrap());
        assert!(!installer.binary_path().exists());
        assert!(!prefix.path().join("include/google/protobuf").exists());
        assert!(!installer.uninstall().unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_read_only_prefix_falls_back_to_elevation() {
        let root = TempDir::new().unwrap();
        let prefix = root.path().join("locked");
        fs::create_dir(&prefix).unwrap();
        set_mode(&prefix, 0o555);
        if !mode_is_enforced(&prefix) {
            set_mode(&prefix, 0o755);
            return;
        }

        let settings = Settings {
            elevate_with: "sudo".to_string(),
            ..settings_for(&prefix)
        };
        let runner = ScriptedRunner::succeeding();
        let http = FakeHttp::new().with_downloads(|_, dest| write_protoc_zip(dest, "24.4"));
        let installer = ArchiveInstaller::new(&runner, &http, &settings, "amd64");

        let binary = installer
            .install(&Version::parse_stable("24.4").unwrap())
            .await
            .unwrap();
        set_mode(&prefix, 0o755);

        assert_eq!(binary, prefix.join("bin/protoc"));
        let calls = runner.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], format!("sudo mkdir -p {}", prefix.display()));
        assert!(calls[1].starts_with("sudo cp -R "));
        assert!(calls[1].ends_with(&format!("/staging/. {}", prefix.display())));
        assert_eq!(calls[2], format!("sudo chmod +x {}", binary.display()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_read_only_prefix_without_wrapper_fails() {
        let root = TempDir::new().unwrap();
        let prefix = root.path().join("locked");
        fs::create_dir(&prefix).unwrap();
        set_mode(&prefix, 0o555);
        if !mode_is_enforced(&prefix) {
            set_mode(&prefix, 0o755);
            return;
        }

        let settings = settings_for(&prefix);
        let runner = ScriptedRunner::succeeding();
        let http = FakeHttp::new().with_downloads(|_, dest| write_protoc_zip(dest, "24.4"));
        let installer = ArchiveInstaller::new(&runner, &http, &settings, "amd64");

        let err = installer
            .install(&Version::parse_stable("24.4").unwrap())
            .await
            .unwrap_err();
        set_mode(&prefix, 0o755);

        assert!(format!("{:#}", err).contains("failed to install protoc into"));
        assert!(runner.calls().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_uninstall_from_read_only_prefix_uses_elevation() {
        let root = TempDir::new().unwrap();
        let prefix = root.path().join("locked");
        let bin = prefix.join("bin");
        let google = prefix.join("include/google");
        fs::create_dir_all(&bin).unwrap();
        fs::create_dir_all(google.join("protobuf")).unwrap();
        fs::write(bin.join("protoc"), "").unwrap();
        set_mode(&bin, 0o555);
        set_mode(&google, 0o555);
        if !mode_is_enforced(&bin) {
            set_mode(&bin, 0o755);
            set_mode(&google, 0o755);
            return;
        }

        let settings = Settings {
            elevate_with: "sudo".to_string(),
            ..settings_for(&prefix)
        };
        let runner = ScriptedRunner::succeeding();
        let http = FakeHttp::new();
        let installer = ArchiveInstaller::new(&runner, &http, &settings, "amd64");

        let removed = installer.uninstall().unwrap();
        set_mode(&bin, 0o755);
        set_mode(&google, 0o755);

        assert!(removed);
        assert_eq!(
            runner.calls(),
            vec![
                format!("sudo rm -rf {}", bin.join("protoc").display()),
                format!("sudo rm -rf {}", google.join("protobuf").display()),
            ]
        );
    }
}
