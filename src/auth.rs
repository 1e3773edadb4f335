// Auth resolution: decides which cookie header this run uses.
//
// Precedence is `--auth` > saved file > `$AUTH_HEADER_SOLUTIONS`.

use crate::store::{CredentialStore, StoreError};
use tracing::{debug, info, warn};

/// Fallback credential source.
pub const AUTH_ENV: &str = "AUTH_HEADER_SOLUTIONS";

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("no auth cookie found")]
    NoCredential,
}

/// Where the resolved cookie came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthSource {
    Flag,
    Store,
    Env,
}

#[derive(Debug)]
pub struct ResolvedAuth {
    pub header: String,
    pub source: AuthSource,
}

/// Resolve the cookie header for this run.
///
/// `explicit` is the `--auth` value and `env` the value of [`AUTH_ENV`].
/// With `persist` set, an explicit value is also saved to `store`; a failed
/// save is logged and otherwise ignored.
pub fn resolve(
    explicit: Option<&str>,
    persist: bool,
    store: &CredentialStore,
    env: Option<&str>,
) -> Result<ResolvedAuth, AuthError> {
    let resolved = pick(explicit, store, env)?;
    info!(source = ?resolved.source, "resolved auth cookie");

    if persist && resolved.source == AuthSource::Flag {
        if let Err(err) = store.save(&resolved.header) {
            warn!("could not persist --auth cookie: {err}");
        }
    }
    Ok(resolved)
}

fn pick(
    explicit: Option<&str>,
    store: &CredentialStore,
    env: Option<&str>,
) -> Result<ResolvedAuth, AuthError> {
    if let Some(header) = non_empty(explicit) {
        return Ok(ResolvedAuth {
            header,
            source: AuthSource::Flag,
        });
    }
    match store.load() {
        Ok(saved) if !saved.is_empty() => {
            return Ok(ResolvedAuth {
                header: saved,
                source: AuthSource::Store,
            })
        }
        Ok(_) => debug!("saved cookie at {} is empty", store.path().display()),
        Err(StoreError::NotFound(path)) => debug!("no saved cookie at {}", path.display()),
        Err(err) => warn!("ignoring saved cookie: {err}"),
    }
    if let Some(header) = non_empty(env) {
        return Ok(ResolvedAuth {
            header,
            source: AuthSource::Env,
        });
    }
    Err(AuthError::NoCredential)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with(saved: Option<&str>) -> (TempDir, CredentialStore) {
        let tmp = TempDir::new().expect("create temp dir");
        let store = CredentialStore::new(tmp.path().join("auth.json"));
        if let Some(saved) = saved {
            store.save(saved).expect("save");
        }
        (tmp, store)
    }

    #[test]
    fn flag_beats_file_and_env() {
        let (_tmp, store) = store_with(Some("file=1"));
        let got = resolve(Some("flag=1"), false, &store, Some("env=1")).expect("resolve");
        assert_eq!(got.header, "flag=1");
        assert_eq!(got.source, AuthSource::Flag);
    }

    #[test]
    fn file_beats_env() {
        let (_tmp, store) = store_with(Some("file=1"));
        let got = resolve(None, false, &store, Some("env=1")).expect("resolve");
        assert_eq!(got.header, "file=1");
        assert_eq!(got.source, AuthSource::Store);
    }

    #[test]
    fn env_used_when_nothing_else() {
        let (_tmp, store) = store_with(None);
        let got = resolve(Some("   "), false, &store, Some("env=1")).expect("resolve");
        assert_eq!(got.header, "env=1");
        assert_eq!(got.source, AuthSource::Env);
    }

    #[test]
    fn empty_saved_cookie_falls_through() {
        let (_tmp, store) = store_with(Some(""));
        let got = resolve(None, false, &store, Some("env=1")).expect("resolve");
        assert_eq!(got.source, AuthSource::Env);
    }

    #[test]
    fn nothing_set_fails() {
        let (_tmp, store) = store_with(None);
        assert!(matches!(
            resolve(None, false, &store, None),
            Err(AuthError::NoCredential)
        ));
        assert!(matches!(
            resolve(Some(""), true, &store, Some(" ")),
            Err(AuthError::NoCredential)
        ));
    }

    #[test]
    fn save_flag_persists_explicit_cookie() {
        let (_tmp, store) = store_with(Some("old=1"));
        resolve(Some(" new=2 "), true, &store, None).expect("resolve");
        assert_eq!(store.load().expect("load"), "new=2");
    }

    #[test]
    fn save_without_explicit_cookie_writes_nothing() {
        let (_tmp, store) = store_with(None);
        resolve(None, true, &store, Some("env=1")).expect("resolve");
        assert!(matches!(store.load(), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn failed_persist_does_not_abort() {
        let tmp = TempDir::new().expect("create temp dir");
        // Parent is a regular file, so the save cannot create the directory.
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "x").expect("write");
        let store = CredentialStore::new(blocker.join("auth.json"));
        let got = resolve(Some("flag=1"), true, &store, None).expect("resolve");
        assert_eq!(got.header, "flag=1");
    }
}
