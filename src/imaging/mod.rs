//! Image access: storage lookup and size probing of source images.
//!
//! | Concern | Where |
//! |---|---|
//! | **Collaborator traits** | [`DataAccess`], [`ImageAccess`], [`UrlResolver`] |
//! | **Natural size** | [`RustBackend`] reads headers via the `image` crate and `avif-parse` |
//! | **Source lookup** | [`FileSystemLoader`] maps logical paths under a root directory |
//! | **Relative resize math** | [`calculations`], pure functions |

pub mod backend;
pub mod calculations;
pub mod rust_backend;

pub use backend::{BackendError, Binary, DataAccess, ImageAccess, UrlResolver};
pub use rust_backend::{FileSystemLoader, RustBackend};
