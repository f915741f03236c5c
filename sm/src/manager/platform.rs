//! Host environment and reactivation policy
//!
//! | Environment                 | Existing live window                              |
//! |-----------------------------|---------------------------------------------------|
//! | Native shell                | host activates it by name, reactivated notice     |
//! | Browser, refocusable engine | focus it, reactivated notice                      |
//! | Browser, no refocus         | pending-reactivate notice, then a fresh open      |

use serde::{Deserialize, Serialize};

/// Browser engine family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BrowserEngine {
    /// Ignores programmatic `focus()` on other windows
    Chromium,
    Gecko,
    WebKit,
    #[default]
    Other,
}

impl BrowserEngine {
    pub fn allows_programmatic_focus(&self) -> bool {
        !matches!(self, BrowserEngine::Chromium)
    }
}

/// Environment the main window runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Platform {
    /// Hosted by a native shell that can activate windows by name
    NativeShell,

    /// Plain browser tab
    Browser {
        #[serde(default)]
        engine: BrowserEngine,
    },
}

impl Default for Platform {
    fn default() -> Self {
        Platform::Browser {
            engine: BrowserEngine::default(),
        }
    }
}

/// What to do with a live window when its name is opened again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactivationPolicy {
    /// Ask the host shell to activate the window by name
    HostActivate,
    /// Focus the existing window
    Refocus,
    /// Warn the window, then open a replacement under the same name
    Reopen,
}

impl Platform {
    pub fn reactivation_policy(&self) -> ReactivationPolicy {
        match self {
            Platform::NativeShell => ReactivationPolicy::HostActivate,
            Platform::Browser { engine } if engine.allows_programmatic_focus() => ReactivationPolicy::Refocus,
            Platform::Browser { .. } => ReactivationPolicy::Reopen,
        }
    }

    pub fn is_native_shell(&self) -> bool {
        matches!(self, Platform::NativeShell)
    }
}
