// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # tagview Fetch
//!
//! Registry I/O for tagview: everything between a repository name and
//! its complete raw tag list.
//!
//! - [`transport`] - subprocess transport over curl, with the
//!   [`Transport`] trait as the test seam
//! - [`response`] - manual HTTP response framing for `curl -i` output
//! - [`token`] - bearer token cache, issuance, and reactive refresh
//! - [`registry`] - Link-header pagination with partial-failure
//!   tolerance, plus the filtered listing entry point
//!
//! ## Example
//!
//! ```ignore
//! use tagview_fetch::RegistryClient;
//! use tagview_core::RepositoryPolicy;
//!
//! let client = RegistryClient::new("ublue-os/bazzite", None);
//! let tags = client
//!     .list_tags_filtered(&RepositoryPolicy::default(), None, 30)
//!     .await?;
//! ```

pub mod error;
pub mod registry;
pub mod response;
pub mod token;
pub mod transport;

// Errors
pub use error::{FetchError, ProcessError, TokenError};

// Registry client
pub use registry::{parse_link_header, RegistryClient, DEFAULT_REGISTRY};

// Response framing
pub use response::{parse_response, RawResponse};

// Tokens
pub use token::TokenManager;

// Transport
pub use transport::{CurlTransport, FetchOptions, Transport, TransportOutput};
