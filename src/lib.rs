// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) uses these modules to implement the quick-search client.
//
// Module responsibilities:
// - `cli`: Flag and argument definitions.
// - `store`: File-backed persistence of the session cookie header.
// - `auth`: Picks the cookie header for this run (flag, file or env).
// - `api`: Encapsulates the HTTP session (cookie jar) and the search call.
// - `format`: Renders result rows as ids or fixed-width table lines.
// - `ui`: Implements the login/logout/search flows and delegates
//   requests to `api`.
pub mod api;
pub mod auth;
pub mod cli;
pub mod format;
pub mod store;
pub mod ui;
