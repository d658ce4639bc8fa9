//! Lightweight configuration loader and typed retrieval/cache sections.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `DECKQA_*`
//! env vars. Library constructors take the typed sections directly so tests
//! never touch the filesystem; the figment path is for the CLI.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Tuning knobs for retrieval. All of these are product tuning parameters,
/// so they live in configuration rather than code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Fusion weight for keyword scores.
    pub keyword_weight: f32,
    /// Fusion weight for semantic scores. Kept >= keyword_weight when both
    /// strategies are live.
    pub semantic_weight: f32,
    /// Multiplier applied to query tokens from the domain vocabulary
    /// (tier, product and feature names).
    pub vocab_boost: f32,
    /// Minimum combined score granted to chunks the matrix analyzer sourced
    /// a table from, so keyword noise cannot crowd them out.
    pub matrix_score_floor: f32,
    /// Cap on the final result count.
    pub max_results: usize,
    /// Result count below which recursive expansion triggers.
    pub min_sufficient: usize,
    /// Hard cap on recursive expansion passes.
    pub max_expansion_depth: usize,
    /// Deadline for the external embedding lookup before degrading to
    /// keyword-only scoring.
    pub embed_timeout_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            keyword_weight: 0.4,
            semantic_weight: 0.6,
            vocab_boost: 3.0,
            matrix_score_floor: 0.5,
            max_results: 10,
            min_sufficient: 2,
            max_expansion_depth: 2,
            embed_timeout_ms: 2000,
        }
    }
}

impl RetrievalConfig {
    /// Startup sanity check; a broken tuning file should stop the process
    /// before it serves a single query.
    pub fn validate(&self) -> crate::Result<()> {
        if self.keyword_weight < 0.0 || self.semantic_weight < 0.0 {
            return Err(crate::Error::InvalidConfig(
                "fusion weights must be non-negative".into(),
            ));
        }
        if self.keyword_weight == 0.0 && self.semantic_weight == 0.0 {
            return Err(crate::Error::InvalidConfig("all fusion weights are zero".into()));
        }
        if self.max_results == 0 {
            return Err(crate::Error::InvalidConfig("max_results must be positive".into()));
        }
        Ok(())
    }

    pub fn embed_timeout(&self) -> Duration {
        Duration::from_millis(self.embed_timeout_ms)
    }

    /// Stable digest of everything that changes retrieval output. Part of
    /// the cache key so differently-tuned runs never collide.
    pub fn fingerprint(&self) -> String {
        format!(
            "kw={:.4};sem={:.4};boost={:.4};floor={:.4};max={};min={};depth={}",
            self.keyword_weight,
            self.semantic_weight,
            self.vocab_boost,
            self.matrix_score_floor,
            self.max_results,
            self.min_sufficient,
            self.max_expansion_depth,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry lifetime in seconds. The original deployment answered the same
    /// deck questions day after day, hence the 24h default.
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_seconds: 86_400 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("DECKQA_"));

        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed `[retrieval]` section, falling back to defaults when absent.
    pub fn retrieval(&self) -> RetrievalConfig {
        self.get("retrieval").unwrap_or_default()
    }

    /// Typed `[cache]` section, falling back to defaults when absent.
    pub fn cache(&self) -> CacheConfig {
        self.get("cache").unwrap_or_default()
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_favor_semantic() {
        let cfg = RetrievalConfig::default();
        assert!(cfg.semantic_weight >= cfg.keyword_weight);
    }

    #[test]
    fn fingerprint_changes_with_weights() {
        let a = RetrievalConfig::default();
        let b = RetrievalConfig { keyword_weight: 0.5, ..RetrievalConfig::default() };
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_is_stable_for_equal_config() {
        let a = RetrievalConfig::default();
        assert_eq!(a.fingerprint(), RetrievalConfig::default().fingerprint());
    }

    #[test]
    fn expand_path_passes_plain_paths_through() {
        assert_eq!(expand_path("data/corpus.json"), PathBuf::from("data/corpus.json"));
    }

    #[test]
    fn validation_rejects_broken_tuning() {
        assert!(RetrievalConfig::default().validate().is_ok());
        let negative = RetrievalConfig { keyword_weight: -1.0, ..RetrievalConfig::default() };
        assert!(negative.validate().is_err());
        let zeroed = RetrievalConfig {
            keyword_weight: 0.0,
            semantic_weight: 0.0,
            ..RetrievalConfig::default()
        };
        assert!(zeroed.validate().is_err());
        let capless = RetrievalConfig { max_results: 0, ..RetrievalConfig::default() };
        assert!(capless.validate().is_err());
    }
}
