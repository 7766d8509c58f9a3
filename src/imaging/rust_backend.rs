//! Bundled filesystem and pure-Rust header-probing collaborators.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Natural size (JPEG, PNG, TIFF, WebP, GIF) | `image::ImageReader::into_dimensions` (header only) |
//! | Natural size (AVIF) | `avif-parse` container metadata (no AV1 decode) |
//! | Source lookup | [`FileSystemLoader`], a root directory on disk |

use super::backend::{BackendError, Binary, DataAccess, ImageAccess};
use crate::types::ImageSize;
use image::ImageReader;
use std::io::{BufRead, Cursor, Seek};
use std::path::{Component, Path, PathBuf};

/// Header-reading [`ImageAccess`] built on the `image` crate.
///
/// Never decodes pixel data: dimensions come from format headers, so probing
/// a 50 MB TIFF costs a few kilobytes of I/O.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn is_avif_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("avif"))
}

/// ISO-BMFF `ftyp` box with an AVIF brand.
fn is_avif_bytes(bytes: &[u8]) -> bool {
    matches!(bytes.get(4..12), Some(b"ftypavif") | Some(b"ftypavis"))
}

/// Dimensions from AVIF container metadata.
fn identify_avif(bytes: &[u8], label: &str) -> Result<ImageSize, BackendError> {
    let avif = avif_parse::read_avif(&mut Cursor::new(bytes)).map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to parse AVIF {label}: {e:?}"))
    })?;
    let meta = avif.primary_item_metadata().map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to read AVIF metadata {label}: {e:?}"))
    })?;
    Ok(ImageSize::new(
        meta.max_frame_width.get(),
        meta.max_frame_height.get(),
    ))
}

fn identify_with<R: BufRead + Seek>(
    reader: ImageReader<R>,
    label: &str,
) -> Result<ImageSize, BackendError> {
    let (width, height) = reader
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .into_dimensions()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions of {label}: {e}"))
        })?;
    Ok(ImageSize::new(width, height))
}

impl ImageAccess for RustBackend {
    fn open(&self, binary: &Binary) -> Result<ImageSize, BackendError> {
        match binary {
            Binary::File(path) => {
                let label = path.display().to_string();
                if is_avif_path(path) {
                    let bytes = std::fs::read(path)?;
                    return identify_avif(&bytes, &label);
                }
                identify_with(ImageReader::open(path)?, &label)
            }
            Binary::Bytes(bytes) => {
                if is_avif_bytes(bytes) {
                    return identify_avif(bytes, "<memory>");
                }
                identify_with(ImageReader::new(Cursor::new(bytes.as_slice())), "<memory>")
            }
        }
    }
}

/// [`DataAccess`] over a directory of source images.
///
/// Logical paths are relative to `root`; a leading `/` is ignored. Paths
/// that would escape the root (`..`) are reported as not loadable.
#[derive(Debug, Clone)]
pub struct FileSystemLoader {
    root: PathBuf,
}

impl FileSystemLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a logical path onto the root, refusing traversal.
    fn locate(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let mut located = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => located.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        (located != self.root).then_some(located)
    }
}

impl DataAccess for FileSystemLoader {
    fn find(&self, _filter: &str, path: &str) -> Result<Binary, BackendError> {
        let located = self
            .locate(path)
            .ok_or_else(|| BackendError::not_loadable(path, "path escapes the source root"))?;
        if !located.is_file() {
            return Err(BackendError::not_loadable(
                path,
                format!("{} does not exist", located.display()),
            ));
        }
        Ok(Binary::File(located))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageEncoder, RgbImage};

    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        image::codecs::jpeg::JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::new(width, height);
        let mut out = Vec::new();
        image::codecs::png::PngEncoder::new(&mut out)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
        out
    }

    #[test]
    fn open_synthetic_jpeg_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let size = RustBackend::new().open(&Binary::File(path)).unwrap();
        assert_eq!(size, ImageSize::new(200, 150));
    }

    #[test]
    fn open_png_bytes() {
        let size = RustBackend::new()
            .open(&Binary::Bytes(png_bytes(64, 32)))
            .unwrap();
        assert_eq!(size, ImageSize::new(64, 32));
    }

    #[test]
    fn open_misnamed_file_uses_content() {
        // PNG content behind a .jpg name still identifies
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("actually-png.jpg");
        std::fs::write(&path, png_bytes(10, 20)).unwrap();

        let size = RustBackend::new().open(&Binary::File(path)).unwrap();
        assert_eq!(size, ImageSize::new(10, 20));
    }

    #[test]
    fn open_garbage_bytes_errors() {
        let result = RustBackend::new().open(&Binary::Bytes(b"not an image".to_vec()));
        assert!(result.is_err());
    }

    #[test]
    fn open_nonexistent_file_errors() {
        let result = RustBackend::new().open(&Binary::File("/nonexistent/image.jpg".into()));
        assert!(result.is_err());
    }

    #[test]
    fn avif_brand_sniffing() {
        assert!(is_avif_bytes(b"\0\0\0\x1cftypavif\0\0"));
        assert!(!is_avif_bytes(b"\x89PNG\r\n\x1a\n\0\0\0\0"));
        assert!(!is_avif_bytes(b"short"));
    }

    #[test]
    fn loader_finds_existing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("uploads")).unwrap();
        std::fs::write(tmp.path().join("uploads/a.jpg"), b"x").unwrap();

        let loader = FileSystemLoader::new(tmp.path());
        assert_eq!(
            loader.find("thumb", "uploads/a.jpg").unwrap(),
            Binary::File(tmp.path().join("uploads/a.jpg"))
        );
        assert_eq!(
            loader.find("thumb", "/uploads/a.jpg").unwrap(),
            Binary::File(tmp.path().join("uploads/a.jpg"))
        );
    }

    #[test]
    fn loader_missing_file_is_not_loadable() {
        let tmp = tempfile::TempDir::new().unwrap();
        let loader = FileSystemLoader::new(tmp.path());
        assert!(matches!(
            loader.find("thumb", "missing.jpg"),
            Err(BackendError::NotLoadable { .. })
        ));
    }

    #[test]
    fn loader_rejects_traversal() {
        let tmp = tempfile::TempDir::new().unwrap();
        let inner = tmp.path().join("public");
        std::fs::create_dir_all(&inner).unwrap();
        std::fs::write(tmp.path().join("secret.jpg"), b"x").unwrap();

        let loader = FileSystemLoader::new(&inner);
        assert!(matches!(
            loader.find("thumb", "../secret.jpg"),
            Err(BackendError::NotLoadable { .. })
        ));
    }

    #[test]
    fn loader_rejects_directories_and_root() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("dir")).unwrap();
        let loader = FileSystemLoader::new(tmp.path());
        assert!(loader.find("thumb", "dir").is_err());
        assert!(loader.find("thumb", "/").is_err());
    }
}
