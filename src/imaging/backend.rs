//! Collaborator traits the engine consumes, and shared backend types.
//!
//! The engine never transforms images itself. It needs three things from
//! the outside world:
//!
//! | Trait | Question it answers |
//! |---|---|
//! | [`DataAccess`] | Can the source for this path be loaded, and where are its bytes? |
//! | [`ImageAccess`] | What is the natural size of these bytes? |
//! | [`UrlResolver`] | Which URL serves this path through this filter? |
//!
//! Bundled implementations live in
//! [`rust_backend`](super::rust_backend) and [`crate::urls`]. Hosts with their
//! own storage or image service implement the traits directly.

use crate::types::ImageSize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("source image \"{path}\" is not loadable: {reason}")]
    NotLoadable { path: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

impl BackendError {
    pub fn not_loadable(path: &str, reason: impl Into<String>) -> Self {
        BackendError::NotLoadable {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Raw source image handed from [`DataAccess`] to [`ImageAccess`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binary {
    /// Image stored on disk; readers may open it lazily.
    File(PathBuf),
    /// Image already held in memory.
    Bytes(Vec<u8>),
}

/// Locates source images.
pub trait DataAccess: Send + Sync {
    /// Retrieve the untransformed source for `path`.
    ///
    /// `filter` is passed through for stores that route by filter; the
    /// returned binary is always the natural, pre-filter image.
    fn find(&self, filter: &str, path: &str) -> Result<Binary, BackendError>;
}

/// Reads natural image dimensions.
pub trait ImageAccess: Send + Sync {
    /// Decode just enough of `binary` to report its pixel size.
    fn open(&self, binary: &Binary) -> Result<ImageSize, BackendError>;
}

/// Maps a (path, filter) pair to a browser-servable URL.
pub trait UrlResolver: Send + Sync {
    /// May trigger generation of the filtered rendition as a side effect.
    fn browser_path(&self, path: &str, filter: &str) -> String;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Call recorded by one of the mock collaborators.
    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Find { filter: String, path: String },
        Open(String),
        BrowserPath { path: String, filter: String },
    }

    /// Data access that only knows an explicit set of paths.
    /// Uses Mutex (not RefCell) so it is Sync and works across threads.
    #[derive(Default)]
    pub struct MockDataAccess {
        pub loadable: HashSet<String>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    impl MockDataAccess {
        pub fn with_paths(paths: &[&str]) -> Self {
            Self {
                loadable: paths.iter().map(|p| p.to_string()).collect(),
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl DataAccess for MockDataAccess {
        fn find(&self, filter: &str, path: &str) -> Result<Binary, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Find {
                filter: filter.to_string(),
                path: path.to_string(),
            });
            if self.loadable.contains(path) {
                Ok(Binary::File(PathBuf::from(path)))
            } else {
                Err(BackendError::not_loadable(path, "not in mock store"))
            }
        }
    }

    /// Image access answering from a fixed table of natural sizes.
    ///
    /// A mock built with [`MockImageAccess::forbidden`] panics when probed,
    /// for tests asserting that no image I/O happens.
    #[derive(Default)]
    pub struct MockImageAccess {
        pub sizes: HashMap<String, ImageSize>,
        pub forbid: bool,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    impl MockImageAccess {
        pub fn with_sizes(sizes: &[(&str, ImageSize)]) -> Self {
            Self {
                sizes: sizes.iter().map(|(p, s)| (p.to_string(), *s)).collect(),
                ..Self::default()
            }
        }

        pub fn forbidden() -> Self {
            Self {
                forbid: true,
                ..Self::default()
            }
        }

        pub fn probe_count(&self) -> usize {
            self.operations.lock().unwrap().len()
        }
    }

    impl ImageAccess for MockImageAccess {
        fn open(&self, binary: &Binary) -> Result<ImageSize, BackendError> {
            let key = match binary {
                Binary::File(p) => p.to_string_lossy().to_string(),
                Binary::Bytes(_) => "<bytes>".to_string(),
            };
            assert!(!self.forbid, "unexpected natural-size probe of {key}");
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Open(key.clone()));
            self.sizes
                .get(&key)
                .copied()
                .ok_or_else(|| BackendError::ProcessingFailed(format!("corrupt image {key}")))
        }
    }

    /// URL resolver producing `/cache/{filter}/{path}`.
    #[derive(Default)]
    pub struct MockUrlResolver {
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    impl MockUrlResolver {
        pub fn call_count(&self) -> usize {
            self.operations.lock().unwrap().len()
        }
    }

    impl UrlResolver for MockUrlResolver {
        fn browser_path(&self, path: &str, filter: &str) -> String {
            self.operations.lock().unwrap().push(RecordedOp::BrowserPath {
                path: path.to_string(),
                filter: filter.to_string(),
            });
            format!("/cache/{filter}/{path}")
        }
    }

    #[test]
    fn mock_data_access_records_find() {
        let data = MockDataAccess::with_paths(&["a.jpg"]);
        assert!(data.find("thumb", "a.jpg").is_ok());
        assert!(matches!(
            data.find("thumb", "b.jpg"),
            Err(BackendError::NotLoadable { .. })
        ));

        let ops = data.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], RecordedOp::Find { path, .. } if path == "a.jpg"));
    }

    #[test]
    fn mock_image_access_reports_sizes() {
        let images = MockImageAccess::with_sizes(&[("a.jpg", ImageSize::new(800, 600))]);
        let size = images.open(&Binary::File("a.jpg".into())).unwrap();
        assert_eq!(size, ImageSize::new(800, 600));
        assert!(images.open(&Binary::File("b.jpg".into())).is_err());
        assert_eq!(images.probe_count(), 2);
    }

    #[test]
    fn not_loadable_message_names_path() {
        let err = BackendError::not_loadable("missing.jpg", "no such file");
        assert_eq!(
            err.to_string(),
            "source image \"missing.jpg\" is not loadable: no such file"
        );
    }
}
