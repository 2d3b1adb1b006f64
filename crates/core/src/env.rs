//! Profile-aware environment lookups shared by the crate configs.
//!
//! An [`EnvProfile`] names a set of overrides: under profile `PROD`, the key
//! `BIGQUERY_LOCATION` is read from `PROD_BIGQUERY_LOCATION` before the bare
//! key. Empty values count as unset at both levels.

use std::env;
use std::str::FromStr;

/// Env var naming the active profile.
pub const PROFILE_VAR: &str = "BQRUN_PROFILE";

/// Load a `.env` file into the process environment, if there is one.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// A named override layer over the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvProfile {
    name: String,
}

impl EnvProfile {
    /// The profile selected by [`PROFILE_VAR`], or the unnamed profile.
    pub fn active() -> Self {
        Self::named(&non_empty(PROFILE_VAR).unwrap_or_default())
    }

    /// Profile names are case-insensitive; `staging` reads `STAGING_*` keys.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.trim().to_uppercase(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of `key` under this profile, falling back to the bare key.
    pub fn var(&self, key: &str) -> Option<String> {
        if self.name.is_empty() {
            return non_empty(key);
        }
        non_empty(&format!("{}_{}", self.name, key)).or_else(|| non_empty(key))
    }

    /// First of `keys` that is set, each checked with [`var`](Self::var).
    pub fn first_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.var(key))
    }

    /// Parsed value of `key`. Unparseable values count as unset.
    pub fn parse<T: FromStr>(&self, key: &str) -> Option<T> {
        self.var(key).and_then(|v| v.trim().parse().ok())
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}
