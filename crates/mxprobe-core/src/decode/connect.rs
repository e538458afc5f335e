//! Connect URIs.
//!
//! The game accepts `-connect "mxbikes://<authority>/<name>/<pw>/<track>/<layout>/<categories>"`
//! where the authority is `[remote]:port/[local]:port`, so the server name
//! is the fifth `/`-separated token.

use super::socket::RemoteEndpoint;

const NAME_TOKEN: usize = 4;

/// Server name embedded in a connect URI, empty when absent
pub fn server_name_from_connect_uri(uri: &str) -> String {
    uri.split('/').nth(NAME_TOKEN).unwrap_or_default().to_string()
}

/// Command line that rejoins the given server
pub fn build_connect_command(
    exe: &str,
    endpoint: &RemoteEndpoint,
    server_name: &str,
    password: &str,
    track_id: &str,
    categories: &str,
) -> String {
    let password_flag = if password.is_empty() { "0" } else { "1" };
    format!(
        "\"{}\" -connect \"mxbikes://{}/{}/{}/{}/0/{}\"",
        exe,
        endpoint.mapped_authority(),
        server_name,
        password_flag,
        track_id,
        categories
    )
}
