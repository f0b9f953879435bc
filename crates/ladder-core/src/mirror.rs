//! Mirror resolution: rewrite an origin URL to a preferred mirror.
//!
//! The scheduler only depends on the `MirrorResolver` trait. Resolution is
//! pure and infallible; returning the input unchanged is always valid.

use crate::config::{MirrorConfig, MirrorRule};

/// Maps an origin URL to the URL that should be tried first.
pub trait MirrorResolver: Send + Sync {
    fn resolve(&self, url: &str) -> String;
}

/// Identity resolver: every URL is its own mirror.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMirror;

impl MirrorResolver for NoMirror {
    fn resolve(&self, url: &str) -> String {
        url.to_string()
    }
}

/// Prefix rewrite table built from `[[mirror.rules]]`.
#[derive(Debug, Clone, Default)]
pub struct MirrorTable {
    rules: Vec<MirrorRule>,
}

impl MirrorTable {
    /// Rules are kept longest-origin first so the most specific prefix wins.
    pub fn new(mut rules: Vec<MirrorRule>) -> Self {
        rules.retain(|r| !r.origin.is_empty());
        rules.sort_by(|a, b| b.origin.len().cmp(&a.origin.len()));
        Self { rules }
    }

    /// Disabled config yields an empty (identity) table.
    pub fn from_config(cfg: &MirrorConfig) -> Self {
        if !cfg.enabled {
            return Self::default();
        }
        Self::new(cfg.rules.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl MirrorResolver for MirrorTable {
    fn resolve(&self, url: &str) -> String {
        let Some(rule) = self.rules.iter().find(|r| url.starts_with(&r.origin)) else {
            return url.to_string();
        };
        let rewritten = format!("{}{}", rule.mirror, &url[rule.origin.len()..]);
        match url::Url::parse(&rewritten) {
            Ok(_) => rewritten,
            Err(e) => {
                tracing::warn!(url, rewritten, "mirror rewrite is not a valid URL: {}", e);
                url.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(origin: &str, mirror: &str) -> MirrorRule {
        MirrorRule {
            origin: origin.to_string(),
            mirror: mirror.to_string(),
        }
    }

    #[test]
    fn no_mirror_is_identity() {
        assert_eq!(NoMirror.resolve("https://origin/a.jar"), "https://origin/a.jar");
    }

    #[test]
    fn table_rewrites_matching_prefix() {
        let table = MirrorTable::new(vec![rule("https://origin/", "https://mirror/")]);
        assert_eq!(table.resolve("https://origin/a.jar"), "https://mirror/a.jar");
        assert_eq!(table.resolve("https://other/a.jar"), "https://other/a.jar");
    }

    #[test]
    fn longest_prefix_wins() {
        let table = MirrorTable::new(vec![
            rule("https://origin/", "https://mirror/"),
            rule("https://origin/assets/", "https://assets-mirror/objects/"),
        ]);
        assert_eq!(
            table.resolve("https://origin/assets/ab/abcdef"),
            "https://assets-mirror/objects/ab/abcdef"
        );
        assert_eq!(table.resolve("https://origin/lib.jar"), "https://mirror/lib.jar");
    }

    #[test]
    fn invalid_rewrite_falls_back_to_origin() {
        let table = MirrorTable::new(vec![rule("https://origin/", "not a url/")]);
        assert_eq!(table.resolve("https://origin/a.jar"), "https://origin/a.jar");
    }

    #[test]
    fn disabled_config_is_identity() {
        let cfg = MirrorConfig {
            enabled: false,
            rules: vec![rule("https://origin/", "https://mirror/")],
        };
        let table = MirrorTable::from_config(&cfg);
        assert!(table.is_empty());
        assert_eq!(table.resolve("https://origin/a.jar"), "https://origin/a.jar");
    }

    #[test]
    fn empty_origin_rules_are_ignored() {
        let table = MirrorTable::new(vec![rule("", "https://mirror/")]);
        assert!(table.is_empty());
    }
}
