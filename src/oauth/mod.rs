//! Google OAuth authorization-code flow
//!
//! Three-legged flow for the fixed `gmail.readonly` scope:
//!
//! 1. `begin` redirects the user to Google's consent screen, passing the
//!    caller's opaque `state` through untouched.
//! 2. Google calls back with an authorization code.
//! 3. The code is exchanged server-side for tokens, which are used once to
//!    fetch the Gmail profile and then dropped.
//!
//! Tokens never cross back to the calling client and nothing is persisted.
//! Encrypted token persistence keyed to an authenticated user is a known
//! extension point, deliberately unimplemented.

mod flow;
mod google;
mod redirect;

pub use flow::{
    AuthCallback, FlowError, GMAIL_READONLY_SCOPE, IdentityProvider, OAuthFlow, Profile,
    TokenPayload,
};
pub use google::GoogleProvider;
pub use redirect::{redirect_uri, resolve_base_url};
