// UI layer: login, logout and the search loop. Each flow is a small
// synchronous function; all network work is delegated to `api`.

use crate::api::{ApiClient, ApiError};
use crate::auth::{self, AuthError, AUTH_ENV};
use crate::cli::Cli;
use crate::format::{write_rows, OutputMode};
use crate::store::CredentialStore;
use anyhow::{Context, Result};
use clap::CommandFactory;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, BufRead, IsTerminal, Write};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, warn};

const LOGIN_PROMPT: &str = "Paste cookie header (visible input, e.g., JSESSIONID=...; other=...)";

/// Dispatch parsed flags. Setup failures come back as `Err` and map to
/// exit status 1 in `main`; per-term search failures are reported and
/// skipped.
pub fn run(cli: Cli) -> Result<ExitCode> {
    let store = CredentialStore::resolve(cli.store.clone());

    if cli.login {
        login(&store).context("login")?;
        println!("Saved auth cookie to: {}", store.path().display());
        return Ok(ExitCode::SUCCESS);
    }
    if cli.logout {
        store.delete().context("logout")?;
        println!("Deleted: {}", store.path().display());
        return Ok(ExitCode::SUCCESS);
    }

    if cli.terms.is_empty() {
        Cli::command().print_help()?;
        return Ok(ExitCode::from(2));
    }

    let env = std::env::var(AUTH_ENV).ok();
    let resolved = match auth::resolve(cli.auth.as_deref(), cli.save, &store, env.as_deref()) {
        Ok(resolved) => resolved,
        Err(AuthError::NoCredential) => {
            eprintln!("No auth cookie found. Run: {} --login", program_name());
            return Ok(ExitCode::from(1));
        }
    };

    let api = ApiClient::from_env()?;
    api.seed(&resolved.header);

    let mode = if cli.user_id_only {
        OutputMode::Ids
    } else {
        OutputMode::Table
    };
    // stderr stays unlocked: the spinner's ticker thread draws on it.
    search_terms(
        &api,
        &store,
        &cli.terms,
        mode,
        &mut io::stdout().lock(),
        &mut io::stderr(),
    )?;
    Ok(ExitCode::SUCCESS)
}

/// Search each term in order. A failing term is reported on `err` and
/// the loop moves on; after every call that reached the server the jar is
/// written back to the store.
pub fn search_terms<W: Write, E: Write>(
    api: &ApiClient,
    store: &CredentialStore,
    terms: &[String],
    mode: OutputMode,
    out: &mut W,
    err: &mut E,
) -> io::Result<()> {
    search_terms_drawn(api, store, terms, mode, out, err, ProgressDrawTarget::stderr)
}

fn search_terms_drawn<W: Write, E: Write>(
    api: &ApiClient,
    store: &CredentialStore,
    terms: &[String],
    mode: OutputMode,
    out: &mut W,
    err: &mut E,
    draw_target: impl Fn() -> ProgressDrawTarget,
) -> io::Result<()> {
    for term in terms {
        let spinner = spinner(term, draw_target());
        let result = api.quick_search(term);
        spinner.finish_and_clear();

        let refreshed = match &result {
            Ok(rows) => {
                write_rows(out, rows, mode)?;
                out.flush()?;
                true
            }
            Err(e) => {
                report(err, e)?;
                e.reached_server()
            }
        };
        if refreshed {
            persist_session(api, store);
        }
    }
    Ok(())
}

fn report<E: Write>(err: &mut E, e: &ApiError) -> io::Result<()> {
    match e {
        ApiError::Http { status, .. } if e.is_auth() => writeln!(
            err,
            "auth failed ({status}). Your session may be expired. Re-run with --login."
        ),
        _ => writeln!(err, "error: {e}"),
    }
}

fn persist_session(api: &ApiClient, store: &CredentialStore) {
    let header = api.cookie_header();
    if header.is_empty() {
        return;
    }
    match store.save(&header) {
        Ok(()) => debug!("session cookie written to {}", store.path().display()),
        Err(err) => warn!("could not persist session cookie: {err}"),
    }
}

fn spinner(term: &str, target: ProgressDrawTarget) -> ProgressBar {
    let spinner = ProgressBar::with_draw_target(None, target);
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Searching {term}..."));
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Ask for the cookie header and save it. A terminal gets an interactive
/// prompt; piped input is read as a single line.
fn login(store: &CredentialStore) -> Result<()> {
    let stdin = io::stdin();
    let cookie = if stdin.is_terminal() {
        Input::<String>::new()
            .with_prompt(LOGIN_PROMPT)
            .allow_empty(true)
            .interact_text()?
    } else {
        eprint!("{LOGIN_PROMPT}: ");
        read_cookie_line(stdin.lock())?
    };
    let cookie = cookie.trim();
    if cookie.is_empty() {
        anyhow::bail!("empty cookie");
    }
    store.save(cookie)?;
    Ok(())
}

fn read_cookie_line<R: BufRead>(mut reader: R) -> io::Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn program_name() -> String {
    std::env::args()
        .next()
        .unwrap_or_else(|| "solutions_search_cli".into())
}
