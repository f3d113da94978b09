//! Repository access: fetching, caching and diffing module feeds
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ HttpClient  │────▶│ FeedReader  │────▶│ Repository  │
//! │ (transport) │     │ (fetch+ttl) │     │  Manager    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │                   │
//!                            ▼                   ▼
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │  FeedCache  │     │   Modules   │
//!                     │   (disk)    │     │(local sets) │
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`http`]: HTTP transport trait and reqwest implementation
//! - [`cache`]: Disk cache of parsed feeds keyed by URL
//! - [`reader`]: Feed fetching with cache freshness and stale fallback
//! - [`modules`]: Installed/disabled module providers and package installer
//! - [`search`]: Free-text ranking over module records
//! - [`store`]: Repository snapshot, search and package install
//! - [`error`]: Error types for transport, cache, reader and store

pub mod cache;
pub mod error;
pub mod http;
pub mod modules;
pub mod reader;
pub mod search;
pub mod store;

pub use cache::FeedCache;
pub use error::{
    CacheError, DownloadError, InstallError, ReaderError, StoreError, TransportError,
};
pub use http::{HttpClient, HttpRequest, HttpResponse, ReqwestClient};
pub use modules::{
    DisabledModules, InstallOutcome, InstalledModule, InstalledModules, JsonModuleList,
    ModuleInstaller,
};
pub use reader::FeedReader;
pub use store::{RepositoryManager, RepositorySnapshot};
