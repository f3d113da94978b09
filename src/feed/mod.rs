//! Feed layer
//! - types.rs: Module record and mapping types shared with the repository layer
//! - error.rs: Parse errors
//! - parser.rs: XML module feed parser with core version gate

pub mod error;
pub mod parser;
pub mod types;

pub use error::ParseError;
pub use parser::{EXTENSION_NAMESPACE, FeedParser};
pub use types::{ModuleMap, ModuleRecord};
