//! Cyclic navigation over an ordered list of encrypted-image paths
//!
//! The navigator is the only stateful piece of the viewer core: the path
//! list in user-selection order, the current index, and a one-slot cache
//! holding the decoded image for the current position. Every transition
//! that changes the current path drops the cached image; the caller
//! decrypts and decodes the new current file and stores the result.

use crate::error::{ErrorCategory, ErrorKind, Result, ShadeboxError};
use crate::raster::DecodedImage;
use std::path::{Path, PathBuf};

/// Navigation state over encrypted-image paths. Starts `Empty`; `load`
/// with a non-empty list positions it on index 0.
#[derive(Default)]
pub struct Navigator {
    paths: Vec<PathBuf>,
    index: usize,
    decoded: Option<DecodedImage>,
}

fn no_images() -> ShadeboxError {
    ShadeboxError::with_kind(
        ErrorCategory::User,
        ErrorKind::NoImagesLoaded,
        "no encrypted images loaded",
    )
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the path list, keeping the given order, and resets the
    /// position to the first entry. Any cached image is dropped.
    pub fn load(&mut self, paths: Vec<PathBuf>) {
        self.paths = paths;
        self.index = 0;
        self.decoded = None;
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Current index, `None` while no paths are loaded.
    pub fn position(&self) -> Option<usize> {
        if self.paths.is_empty() { None } else { Some(self.index) }
    }

    /// Advances to the next path, wrapping to the start after the last.
    /// Drops the cached image and returns the new current path.
    pub fn next(&mut self) -> Result<&Path> {
        if self.paths.is_empty() {
            return Err(no_images());
        }
        self.index = (self.index + 1) % self.paths.len();
        self.decoded = None;
        Ok(&self.paths[self.index])
    }

    /// Steps back to the previous path, wrapping to the end from the
    /// start. Drops the cached image and returns the new current path.
    pub fn previous(&mut self) -> Result<&Path> {
        if self.paths.is_empty() {
            return Err(no_images());
        }
        self.index = (self.index + self.paths.len() - 1) % self.paths.len();
        self.decoded = None;
        Ok(&self.paths[self.index])
    }

    /// Positions directly on an index, reduced modulo the list length.
    /// Drops the cached image and returns the new current path.
    pub fn jump_to(&mut self, index: usize) -> Result<&Path> {
        if self.paths.is_empty() {
            return Err(no_images());
        }
        self.index = index % self.paths.len();
        self.decoded = None;
        Ok(&self.paths[self.index])
    }

    /// The path at the current position.
    pub fn current_path(&self) -> Result<&Path> {
        self.paths
            .get(self.index)
            .map(PathBuf::as_path)
            .ok_or_else(no_images)
    }

    /// Stores the decoded image for the current position, replacing any
    /// previous one wholesale.
    pub fn store_decoded(&mut self, image: DecodedImage) {
        self.decoded = Some(image);
    }

    /// The cached decoded image for the current position, if any.
    pub fn current_decoded(&self) -> Option<&DecodedImage> {
        self.decoded.as_ref()
    }

    /// Takes ownership of the cached decoded image, leaving the slot empty.
    pub fn take_decoded(&mut self) -> Option<DecodedImage> {
        self.decoded.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    fn paths(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("img{}.enc", i))).collect()
    }

    fn tiny_image() -> DecodedImage {
        DecodedImage::new(DynamicImage::new_rgba8(1, 1))
    }

    #[test]
    fn test_empty_navigator_has_no_current_path() {
        let nav = Navigator::new();
        let err = nav.current_path().expect_err("expected empty navigator error");
        assert_eq!(err.kind, Some(ErrorKind::NoImagesLoaded));
        assert_eq!(nav.position(), None);
    }

    #[test]
    fn test_empty_navigator_rejects_transitions() {
        let mut nav = Navigator::new();
        assert_eq!(
            nav.next().expect_err("next on empty").kind,
            Some(ErrorKind::NoImagesLoaded)
        );
        assert_eq!(
            nav.previous().expect_err("previous on empty").kind,
            Some(ErrorKind::NoImagesLoaded)
        );
        assert_eq!(
            nav.jump_to(3).expect_err("jump on empty").kind,
            Some(ErrorKind::NoImagesLoaded)
        );
    }

    #[test]
    fn test_load_positions_on_first_entry() {
        let mut nav = Navigator::new();
        nav.load(paths(3));
        assert_eq!(nav.position(), Some(0));
        assert_eq!(nav.current_path().unwrap(), Path::new("img0.enc"));
    }

    #[test]
    fn test_next_wraps_after_full_cycle() {
        let mut nav = Navigator::new();
        nav.load(paths(4));
        for _ in 0..4 {
            nav.next().unwrap();
        }
        assert_eq!(nav.position(), Some(0));
    }

    #[test]
    fn test_previous_from_start_wraps_to_end() {
        let mut nav = Navigator::new();
        nav.load(paths(5));
        let path = nav.previous().unwrap().to_path_buf();
        assert_eq!(path, PathBuf::from("img4.enc"));
        assert_eq!(nav.position(), Some(4));
    }

    #[test]
    fn test_next_then_previous_returns_home() {
        let mut nav = Navigator::new();
        nav.load(paths(3));
        nav.next().unwrap();
        nav.previous().unwrap();
        assert_eq!(nav.position(), Some(0));
    }

    #[test]
    fn test_jump_to_reduces_modulo_length() {
        let mut nav = Navigator::new();
        nav.load(paths(3));
        nav.jump_to(7).unwrap();
        assert_eq!(nav.position(), Some(1));
    }

    #[test]
    fn test_single_entry_cycles_in_place() {
        let mut nav = Navigator::new();
        nav.load(paths(1));
        nav.next().unwrap();
        assert_eq!(nav.position(), Some(0));
        nav.previous().unwrap();
        assert_eq!(nav.position(), Some(0));
    }

    #[test]
    fn test_transitions_drop_cached_image() {
        let mut nav = Navigator::new();
        nav.load(paths(2));

        nav.store_decoded(tiny_image());
        assert!(nav.current_decoded().is_some());
        nav.next().unwrap();
        assert!(nav.current_decoded().is_none());

        nav.store_decoded(tiny_image());
        nav.previous().unwrap();
        assert!(nav.current_decoded().is_none());

        nav.store_decoded(tiny_image());
        nav.jump_to(1).unwrap();
        assert!(nav.current_decoded().is_none());

        nav.store_decoded(tiny_image());
        nav.load(paths(2));
        assert!(nav.current_decoded().is_none());
    }

    #[test]
    fn test_take_decoded_empties_the_slot() {
        let mut nav = Navigator::new();
        nav.load(paths(1));
        nav.store_decoded(tiny_image());
        assert!(nav.take_decoded().is_some());
        assert!(nav.take_decoded().is_none());
    }

    #[test]
    fn test_load_keeps_selection_order() {
        let mut nav = Navigator::new();
        let unsorted = vec![
            PathBuf::from("z.enc"),
            PathBuf::from("a.enc"),
            PathBuf::from("m.enc"),
        ];
        nav.load(unsorted);
        assert_eq!(nav.current_path().unwrap(), Path::new("z.enc"));
        assert_eq!(nav.next().unwrap(), Path::new("a.enc"));
        assert_eq!(nav.next().unwrap(), Path::new("m.enc"));
    }
}
