//! Build and dev-server configuration for the app shell.
//!
//! # Design
//! The shell is packaged by a web build pipeline configured through
//! `shell.config.json`. This module gives that file a schema: output
//! layout, lint switch, and the dev server's port and proxy table. Every
//! field has the stock default, so an absent or partial file still yields
//! a working setup.
//!
//! During development the shell serves the frontend itself and proxies
//! backend paths; `DevServerConfig::resolve` answers where a given request
//! path would be forwarded.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::DEFAULT_BASE_URL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level shell build configuration, mirroring `shell.config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ShellConfig {
    /// Base path assets are referenced from. Relative by default so the
    /// bundle works from any mount point.
    pub public_path: String,
    pub output_dir: String,
    pub assets_dir: String,
    pub lint_on_save: bool,
    pub dev_server: DevServerConfig,
}

impl ShellConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            public_path: "./".to_string(),
            output_dir: "dist".to_string(),
            assets_dir: "static".to_string(),
            lint_on_save: false,
            dev_server: DevServerConfig::default(),
        }
    }
}

/// Dev server settings: the local port and the proxy table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct DevServerConfig {
    pub port: u16,
    /// Proxy rules keyed by request path prefix.
    pub proxy: BTreeMap<String, ProxyRule>,
}

impl DevServerConfig {
    /// Resolve a request path against the proxy table. The longest matching
    /// prefix wins; `None` means the dev server serves the path itself.
    pub fn resolve(&self, path: &str) -> Option<String> {
        let (_, rule) = self
            .proxy
            .iter()
            .filter(|(prefix, _)| path.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())?;
        Some(format!(
            "{}{}",
            rule.target.trim_end_matches('/'),
            rule.rewrite(path)
        ))
    }
}

impl Default for DevServerConfig {
    fn default() -> Self {
        let mut proxy = BTreeMap::new();
        proxy.insert("/api".to_string(), ProxyRule::default());
        Self { port: 8080, proxy }
    }
}

/// One proxy rule: forward to `target`, optionally rewriting the path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyRule {
    pub target: String,
    pub change_origin: bool,
    /// Prefix rewrites in the `^/prefix` form, applied before forwarding.
    pub path_rewrite: BTreeMap<String, String>,
}

impl ProxyRule {
    fn rewrite(&self, path: &str) -> String {
        for (pattern, replacement) in &self.path_rewrite {
            let prefix = pattern.strip_prefix('^').unwrap_or(pattern);
            if let Some(rest) = path.strip_prefix(prefix) {
                return format!("{replacement}{rest}");
            }
        }
        path.to_string()
    }
}

impl Default for ProxyRule {
    fn default() -> Self {
        let mut path_rewrite = BTreeMap::new();
        path_rewrite.insert("^/api".to_string(), "/api".to_string());
        Self {
            target: DEFAULT_BASE_URL.to_string(),
            change_origin: true,
            path_rewrite,
        }
    }
}
