//! Mix sharing.
//!
//! A mix is shared as a compact, URL-safe token carried in the `mix` query
//! parameter of a link:
//!
//! ```text
//! https://ambience.example/?mix=eyJ2IjoxLCJ0IjpbWyJyYWluIiwwLjVdXSwibiI6IkV2ZW5pbmcifQ
//!                               └──────────── base64url(JSON envelope) ────────────┘
//! ```
//!
//! Decoding never fails loudly: any malformed token yields `None`.

mod codec;
mod link;

pub use codec::{decode, encode, SharedMix, MAX_NAME_LENGTH, TOKEN_VERSION};
pub use link::{share_url, strip_token, token_from_url, SHARE_PARAM};
