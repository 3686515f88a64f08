//! Process configuration, read once at startup.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `PORT` | `8080` | listen port |
//! | `ALLOWED_ORIGINS` | unset | comma-separated CORS allow-list; unset or empty = allow all |
//! | `ALLOW_CREDENTIALS` | `false` | exactly `"true"` enables credentialed CORS |
//! | `ARTIFACT_DIR` | `responses` | directory holding `<name>.json` artifacts |
//!
//! Nothing else in the crate reads the environment. The resulting [`Config`]
//! is handed to [`App::new`](crate::App::new) and never changes afterwards.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::error::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ARTIFACT_DIR: &str = "responses";

/// Immutable process configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    /// `None` allows every origin. `Some` is an allow-list, possibly with
    /// no entries, in which case no origin is allowed.
    pub allowed_origins: Option<Vec<String>>,
    pub allow_credentials: bool,
    pub artifact_dir: PathBuf,
}

impl Config {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key → value source. Unset and empty
    /// variables fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::Config { key: "PORT", value: raw })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            allowed_origins: get("ALLOWED_ORIGINS").map(|csv| parse_origin_list(&csv)),
            allow_credentials: get("ALLOW_CREDENTIALS").as_deref() == Some("true"),
            artifact_dir: get("ARTIFACT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_DIR)),
        })
    }

    /// Wildcard listen address on the configured port.
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            allowed_origins: None,
            allow_credentials: false,
            artifact_dir: PathBuf::from(DEFAULT_ARTIFACT_DIR),
        }
    }
}

/// Splits a comma-separated allow-list. Surrounding whitespace is dropped
/// from each entry and empty entries are skipped, so `"a, b,"` yields two
/// origins and `","` yields none. Entries are otherwise kept verbatim for
/// exact matching.
pub fn parse_origin_list(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, Error> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.addr().port(), 8080);
    }

    #[test]
    fn reads_every_variable() {
        let cfg = config(&[
            ("PORT", "9000"),
            ("ALLOWED_ORIGINS", "https://a.test,https://b.test"),
            ("ALLOW_CREDENTIALS", "true"),
            ("ARTIFACT_DIR", "/srv/stubs"),
        ])
        .unwrap();

        assert_eq!(cfg.port, 9000);
        assert_eq!(
            cfg.allowed_origins,
            Some(vec!["https://a.test".to_owned(), "https://b.test".to_owned()])
        );
        assert!(cfg.allow_credentials);
        assert_eq!(cfg.artifact_dir, PathBuf::from("/srv/stubs"));
    }

    #[test]
    fn credentials_require_the_exact_literal() {
        for value in ["TRUE", "1", "yes", "True"] {
            let cfg = config(&[("ALLOW_CREDENTIALS", value)]).unwrap();
            assert!(!cfg.allow_credentials, "{value} must not enable credentials");
        }
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, Error::Config { key: "PORT", .. }));
        assert!(err.to_string().contains("eighty"));
    }

    #[test]
    fn empty_entries_are_dropped_from_the_origin_list() {
        assert_eq!(parse_origin_list(" https://a.test , ,https://b.test,"), [
            "https://a.test",
            "https://b.test"
        ]);
        assert!(parse_origin_list(",").is_empty());
    }

    #[test]
    fn empty_origin_variable_allows_all() {
        let cfg = config(&[("ALLOWED_ORIGINS", "")]).unwrap();
        assert_eq!(cfg.allowed_origins, None);
    }

    #[test]
    fn blank_origin_list_is_an_empty_allow_list() {
        for value in [",", " ", " , "] {
            let cfg = config(&[("ALLOWED_ORIGINS", value)]).unwrap();
            assert_eq!(cfg.allowed_origins, Some(Vec::new()), "{value:?}");
        }
    }
}
