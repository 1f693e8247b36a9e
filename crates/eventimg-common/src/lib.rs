//! Eventimg-Common: shared types and error handling.
//!
//! - **Typed IDs**: positive integer wrappers for events and images
//! - **Core Types**: the [`Tier`] bounding-box presets
//! - **Error Handling**: the unified [`Error`] and [`Result`] alias
//!
//! # Examples
//!
//! ```
//! use eventimg_common::{Error, EventId, Tier};
//!
//! let event = EventId::new(42).unwrap();
//! assert_eq!(event.get(), 42);
//!
//! let tier: Tier = "thumbnail".parse().unwrap();
//! assert_eq!(tier, Tier::Thumbnail);
//!
//! assert!(matches!(EventId::new(0), Err(Error::Validation(_))));
//! ```

pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
