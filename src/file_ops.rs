//! File-level encrypt/decrypt operations
//!
//! High-level per-file operations composing the keystore, container codec,
//! and raster collaborator: encrypting one image file into a `.enc`
//! container, opening one container into an in-memory decoded image, and
//! exporting a decoded image on explicit request. Decrypted pixels never
//! touch persistent storage except through `export_image`.

use crate::container;
use crate::error::{ErrorCategory, ErrorKind, Result, ShadeboxError};
use crate::keystore::KeyMaterial;
use crate::raster::{self, DecodedImage};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Derives the container path for an input image: the input's extension
/// replaced with `.enc`, alongside the input.
pub fn enc_output_path(input: &Path) -> PathBuf {
    input.with_extension("enc")
}

/// Encrypt one image file into a container
///
/// Reads the source image from `input_path`, validates and canonicalizes
/// it (PNG re-encode), seals the canonical bytes under `key`, and writes
/// the container to `output_path`.
///
/// The output file is created with mode 0o600 (read/write for owner only)
/// on Unix systems.
pub fn encrypt_image_file(key: &KeyMaterial, input_path: &Path, output_path: &Path) -> Result<()> {
    let source = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let decoded = raster::decode(&source)
        .map_err(|e| e.with_context(format!("cannot decode {}", input_path.display())))?;
    let canonical = raster::encode_canonical(&decoded)?;
    let sealed = container::seal(key, &canonical).map_err(|e| e.with_context("sealing failed"))?;
    write_file_secure(output_path, &sealed)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;

    Ok(())
}

/// Open one container file into an in-memory decoded image
///
/// Reads the whole container (no partial reads), opens it under `key`,
/// and decodes the canonical bytes. Nothing is written to disk.
pub fn open_image_file(key: &KeyMaterial, path: &Path) -> Result<DecodedImage> {
    let blob = fs::read(path).map_err(|e| read_error(path, e))?;
    let canonical = container::open(key, &blob)
        .map_err(|e| e.with_context(format!("failed to open {}", path.display())))?;
    raster::decode(&canonical).map_err(|e| e.with_context("container held undecodable image bytes"))
}

/// Write a decoded image to disk as canonical PNG
///
/// The only path by which decrypted pixels reach persistent storage, and
/// only ever on an explicit export request. Written with mode 0o600 on
/// Unix systems.
pub fn export_image(decoded: &DecodedImage, path: &Path) -> Result<()> {
    let canonical = raster::encode_canonical(decoded)?;
    write_file_secure(path, &canonical)
        .map_err(|e| e.with_context(format!("failed to write to {}", path.display())))
}

/// Persist key material as a `.key` file with mode 0o600 on Unix systems.
pub fn write_key_file(key: &KeyMaterial, path: &Path) -> Result<()> {
    write_file_secure(path, key.encoded().as_bytes())
        .map_err(|e| e.with_context(format!("failed to write key file {}", path.display())))
}

/// Write file with secure permissions (0o600 on Unix)
fn write_file_secure(path: &Path, contents: &[u8]) -> Result<()> {
    #[cfg(unix)]
    {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .map_err(|e| {
                ShadeboxError::with_kind_and_source(
                    ErrorCategory::User,
                    ErrorKind::Io,
                    format!("failed to open {}", path.display()),
                    e,
                )
            })?;

        file.write_all(contents).map_err(|e| {
            ShadeboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to write {}", path.display()),
                e,
            )
        })?;
        Ok(())
    }

    #[cfg(not(unix))]
    {
        fs::write(path, contents).map_err(|e| {
            ShadeboxError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("failed to write {}", path.display()),
                e,
            )
        })?;
        Ok(())
    }
}

fn read_error(path: &Path, err: io::Error) -> ShadeboxError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    ShadeboxError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore;
    use image::{DynamicImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;

    fn write_test_png(path: &Path, width: u32, height: u32) {
        let image = RgbaImage::from_pixel(width, height, Rgba([0, 128, 255, 255]));
        DynamicImage::ImageRgba8(image).save(path).unwrap();
    }

    #[test]
    fn test_encrypt_open_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("photo.png");
        let crypt_path = temp_dir.path().join("photo.enc");
        write_test_png(&plain_path, 100, 50);

        let key = KeyMaterial::generate();
        encrypt_image_file(&key, &plain_path, &crypt_path).unwrap();
        assert!(crypt_path.exists());

        let blob = fs::read(&crypt_path).unwrap();
        assert!(blob.starts_with(b"shadebox1:"));
        // Container bytes are opaque: no PNG signature in the clear.
        assert!(!blob.windows(4).any(|w| w == b"\x89PNG"));

        let decoded = open_image_file(&key, &crypt_path).unwrap();
        assert_eq!(decoded.width(), 100);
        assert_eq!(decoded.height(), 50);
    }

    #[test]
    fn test_zero_key_scenario() {
        // A 32-zero-byte test key (never production) and a 100x50 PNG
        // must round-trip to the exact canonical bytes.
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("photo.png");
        let crypt_path = temp_dir.path().join("photo.enc");
        write_test_png(&plain_path, 100, 50);

        let key = KeyMaterial::from_bytes([0u8; keystore::KEY_LEN]);
        encrypt_image_file(&key, &plain_path, &crypt_path).unwrap();

        let blob = fs::read(&crypt_path).unwrap();
        let canonical = container::open(&key, &blob).unwrap();
        let source = raster::decode(&fs::read(&plain_path).unwrap()).unwrap();
        assert_eq!(canonical, raster::encode_canonical(&source).unwrap());
    }

    #[test]
    fn test_open_with_wrong_key_fails_closed() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("photo.png");
        let crypt_path = temp_dir.path().join("photo.enc");
        write_test_png(&plain_path, 8, 8);

        encrypt_image_file(&KeyMaterial::generate(), &plain_path, &crypt_path).unwrap();
        let err = open_image_file(&KeyMaterial::generate(), &crypt_path)
            .expect_err("expected authentication failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_encrypt_missing_input() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("absent.png");
        let crypt_path = temp_dir.path().join("absent.enc");

        let err = encrypt_image_file(&KeyMaterial::generate(), &missing, &crypt_path)
            .expect_err("expected read failure");
        assert_eq!(err.kind, Some(ErrorKind::Io));
        assert_eq!(err.category, ErrorCategory::User);
        assert!(!crypt_path.exists());
    }

    #[test]
    fn test_encrypt_non_image_input() {
        let temp_dir = TempDir::new().unwrap();
        let text_path = temp_dir.path().join("notes.txt");
        let crypt_path = temp_dir.path().join("notes.enc");
        fs::write(&text_path, "just text").unwrap();

        let err = encrypt_image_file(&KeyMaterial::generate(), &text_path, &crypt_path)
            .expect_err("expected decode failure");
        assert_eq!(err.kind, Some(ErrorKind::UnsupportedImageFormat));
        assert!(!crypt_path.exists());
    }

    #[test]
    fn test_open_missing_container() {
        let temp_dir = TempDir::new().unwrap();
        let err = open_image_file(&KeyMaterial::generate(), &temp_dir.path().join("absent.enc"))
            .expect_err("expected read failure");
        assert_eq!(err.kind, Some(ErrorKind::Io));
    }

    #[test]
    fn test_export_writes_canonical_png() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("photo.png");
        let crypt_path = temp_dir.path().join("photo.enc");
        let export_path = temp_dir.path().join("export.png");
        write_test_png(&plain_path, 20, 10);

        let key = KeyMaterial::generate();
        encrypt_image_file(&key, &plain_path, &crypt_path).unwrap();
        let decoded = open_image_file(&key, &crypt_path).unwrap();
        export_image(&decoded, &export_path).unwrap();

        let exported = raster::decode(&fs::read(&export_path).unwrap()).unwrap();
        assert_eq!(exported.width(), 20);
        assert_eq!(exported.height(), 10);
    }

    #[test]
    fn test_write_key_file_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let key_path = temp_dir.path().join("session.key");
        let key = KeyMaterial::generate();

        write_key_file(&key, &key_path).unwrap();
        let loaded = keystore::load(&key_path).unwrap();
        assert_eq!(key.bytes(), loaded.bytes());
    }

    #[test]
    #[cfg(unix)]
    fn test_file_permissions() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("photo.png");
        let crypt_path = temp_dir.path().join("photo.enc");
        write_test_png(&plain_path, 4, 4);

        let key = KeyMaterial::generate();
        encrypt_image_file(&key, &plain_path, &crypt_path).unwrap();
        let metadata = fs::metadata(&crypt_path).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);

        let key_path = temp_dir.path().join("session.key");
        write_key_file(&key, &key_path).unwrap();
        let metadata = fs::metadata(&key_path).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn test_enc_output_path() {
        assert_eq!(enc_output_path(Path::new("a/b/photo.png")), PathBuf::from("a/b/photo.enc"));
        assert_eq!(enc_output_path(Path::new("photo.jpeg")), PathBuf::from("photo.enc"));
        assert_eq!(enc_output_path(Path::new("archive.tar.webp")), PathBuf::from("archive.tar.enc"));
        assert_eq!(enc_output_path(Path::new("noext")), PathBuf::from("noext.enc"));
    }
}
