//! Static asset publishing for webpub.
//!
//! [`AssetPublisher`] decides whether a run publishes at all and turns the
//! configured `output.publicPath` into the remote path; the upload itself is
//! delegated to a [`Publisher`].

pub mod executor;
pub mod publish;

pub use executor::{CommandPublisher, PublishRequest, PublishResult, Publisher, PublisherError};
pub use publish::{AssetPublisher, PublishError, remote_path};
