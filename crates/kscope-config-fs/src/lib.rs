// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem-backed `ConfigStore` for KernelScope tools.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use kscope_app_core::config::{ConfigError, ConfigStore};
use tracing::debug;

/// Config blobs as `<key>.json` files under one directory.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Store rooted at the platform config dir (e.g. `~/.config/KernelScope`).
    pub fn new() -> Result<Self, ConfigError> {
        let proj = ProjectDirs::from("dev", "flyingrobots", "KernelScope")
            .ok_or_else(|| ConfigError::Unavailable("could not resolve config dir".into()))?;
        Self::at(proj.config_dir())
    }

    /// Store rooted at an explicit directory, created if missing.
    pub fn at(base: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let base = base.as_ref().to_path_buf();
        fs::create_dir_all(&base)?;
        debug!(dir = %base.display(), "config store ready");
        Ok(Self { base })
    }

    /// Directory holding the blobs.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are logical names; keep them from escaping the base directory.
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.base.join(format!("{safe}.json"))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kscope_app_core::config::ConfigService;
    use kscope_app_core::config_port::ConfigPort;
    use kscope_app_core::prefs::ViewerPrefs;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kscope-config-fs-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn missing_key_is_not_found() {
        let store = FsConfigStore::at(scratch("missing")).unwrap();
        assert!(matches!(store.load_raw("nope"), Err(ConfigError::NotFound)));
    }

    #[test]
    fn prefs_persist_to_disk() {
        let dir = scratch("prefs");
        let svc = ConfigService::new(FsConfigStore::at(&dir).unwrap());
        let mut prefs = ViewerPrefs::default();
        prefs.hud.show_perf = true;
        svc.save_prefs(&prefs);
        assert!(dir.join("viewer_prefs.json").exists());

        let reopened = ConfigService::new(FsConfigStore::at(&dir).unwrap());
        assert_eq!(reopened.load_prefs(), Some(prefs));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn keys_cannot_escape_base() {
        let store = FsConfigStore::at(scratch("escape")).unwrap();
        let path = store.path_for("../../etc/passwd");
        assert_eq!(path.parent(), Some(store.base()));
    }
}
