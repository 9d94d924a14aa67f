//! Graph API webhook verification handshake
//!
//! Facebook verifies a webhook callback URL with a GET carrying
//! `hub.mode=subscribe`, `hub.verify_token`, and `hub.challenge`; the
//! endpoint must echo the challenge only when the token matches.

/// Returns the challenge to echo when the handshake is valid.
pub fn verify_subscription<'a>(
    mode: Option<&str>,
    verify_token: Option<&str>,
    challenge: Option<&'a str>,
    expected_token: &str,
) -> Option<&'a str> {
    if mode != Some("subscribe") || verify_token != Some(expected_token) {
        return None;
    }
    challenge
}
