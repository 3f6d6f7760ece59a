// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Prefs-facing port over [`ConfigService`].

use tracing::{debug, warn};

use crate::config::{ConfigService, ConfigStore};
use crate::prefs::ViewerPrefs;

/// Config key for viewer prefs.
pub const PREFS_KEY: &str = "viewer_prefs";

/// Load/save viewer preferences without surfacing storage errors.
pub trait ConfigPort {
    /// Saved prefs, or `None` when missing or unreadable.
    fn load_prefs(&self) -> Option<ViewerPrefs>;
    /// Persist prefs; failures are logged.
    fn save_prefs(&self, prefs: &ViewerPrefs);
}

impl<S: ConfigStore> ConfigPort for ConfigService<S> {
    fn load_prefs(&self) -> Option<ViewerPrefs> {
        match self.load::<ViewerPrefs>(PREFS_KEY) {
            Ok(found) => {
                debug!(found = found.is_some(), "loaded viewer prefs");
                found
            }
            Err(err) => {
                warn!(error = %err, "ignoring unreadable viewer prefs");
                None
            }
        }
    }

    fn save_prefs(&self, prefs: &ViewerPrefs) {
        if let Err(err) = self.save(PREFS_KEY, prefs) {
            warn!(error = %err, "failed to save viewer prefs");
        }
    }
}
