//! Bounded Collections on the Admin Form
//!
//! `SpecificationList` is append/remove only. `ImageGallery` keeps display
//! orders dense: after any change they read 1..=N in array order, and the
//! image at order 1 is the main image.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::FormsConfig;
use crate::product::{
    validate_image_file, ImageFile, ProductRules, SpecField, SpecificationInput, MAX_IMAGES,
    MAX_SPECIFICATIONS,
};
use crate::report::{FieldErrors, Violation};

#[derive(Debug, Error)]
pub enum SpecificationError {
    #[error("Maximum of {0} specifications reached")]
    Full(usize),

    #[error("Specification is invalid")]
    Invalid(FieldErrors<SpecField>),
}

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("Cannot upload more than {max} images total ({current} uploaded, {incoming} selected)")]
    TooMany {
        current: usize,
        incoming: usize,
        max: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    pub id: Uuid,
    #[serde(flatten)]
    pub detail: SpecificationInput,
}

#[derive(Debug, Clone)]
pub struct SpecificationList {
    items: Vec<Specification>,
    rules: ProductRules,
}

impl SpecificationList {
    pub fn new() -> Self {
        Self::with_config(&FormsConfig::default())
    }

    pub fn with_config(config: &FormsConfig) -> Self {
        Self {
            items: vec![],
            rules: ProductRules::new(config),
        }
    }

    /// Validate and append. A full list or a bad entry leaves the list as it was.
    pub fn add(&mut self, input: &SpecificationInput) -> Result<&Specification, SpecificationError> {
        if self.items.len() >= MAX_SPECIFICATIONS {
            tracing::debug!(count = self.items.len(), "specification list full");
            return Err(SpecificationError::Full(MAX_SPECIFICATIONS));
        }

        let check = self.rules.validate_specification(input);
        if !check.is_valid() {
            return Err(SpecificationError::Invalid(check.errors));
        }

        self.items.push(Specification {
            id: Uuid::new_v4(),
            detail: check.sanitized,
        });
        let index = self.items.len() - 1;
        Ok(&self.items[index])
    }

    pub fn remove(&mut self, id: Uuid) -> Option<Specification> {
        let index = self.items.iter().position(|s| s.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn items(&self) -> &[Specification] {
        &self.items
    }

    pub fn inputs(&self) -> impl Iterator<Item = &SpecificationInput> {
        self.items.iter().map(|s| &s.detail)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= MAX_SPECIFICATIONS
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl Default for SpecificationList {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub id: Uuid,
    /// `data:` URL used for the thumbnail.
    pub url: String,
    pub name: String,
    #[serde(skip)]
    pub file: ImageFile,
    /// 1-based; 1 is the main image.
    pub display_order: usize,
}

/// A file the gallery refused, with the reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRejection {
    pub name: String,
    pub violations: Vec<Violation>,
}

#[derive(Debug, Clone, Default)]
pub struct ImageGallery {
    images: Vec<UploadedImage>,
}

fn preview_url(file: &ImageFile) -> String {
    format!("data:{};base64,{}", file.mime_type, STANDARD.encode(&file.contents))
}

impl ImageGallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a batch of files.
    ///
    /// A batch that would push the gallery past its cap is refused whole.
    /// Otherwise valid files are appended in order and invalid ones are
    /// returned as rejections.
    pub fn add(&mut self, files: Vec<ImageFile>) -> Result<Vec<ImageRejection>, GalleryError> {
        if self.images.len() + files.len() > MAX_IMAGES {
            tracing::debug!(
                current = self.images.len(),
                incoming = files.len(),
                "image batch rejected"
            );
            return Err(GalleryError::TooMany {
                current: self.images.len(),
                incoming: files.len(),
                max: MAX_IMAGES,
            });
        }

        let mut rejections = vec![];
        for file in files {
            let violations = validate_image_file(&file);
            if !violations.is_empty() {
                rejections.push(ImageRejection {
                    name: file.name,
                    violations,
                });
                continue;
            }

            self.images.push(UploadedImage {
                id: Uuid::new_v4(),
                url: preview_url(&file),
                name: file.name.clone(),
                file,
                display_order: 0,
            });
        }

        self.renumber();
        Ok(rejections)
    }

    pub fn remove(&mut self, id: Uuid) -> Option<UploadedImage> {
        let index = self.images.iter().position(|img| img.id == id)?;
        let removed = self.images.remove(index);
        self.renumber();
        Some(removed)
    }

    /// Swap with the previous image. Returns false at the top or out of range.
    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.images.len() {
            return false;
        }
        self.images.swap(index - 1, index);
        self.renumber();
        true
    }

    /// Swap with the next image. Returns false at the bottom or out of range.
    pub fn move_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.images.len() {
            return false;
        }
        self.images.swap(index, index + 1);
        self.renumber();
        true
    }

    pub fn main_image(&self) -> Option<&UploadedImage> {
        self.images.first()
    }

    pub fn images(&self) -> &[UploadedImage] {
        &self.images
    }

    pub fn files(&self) -> impl Iterator<Item = &ImageFile> {
        self.images.iter().map(|img| &img.file)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    fn renumber(&mut self) {
        for (index, image) in self.images.iter_mut().enumerate() {
            image.display_order = index + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, description: &str) -> SpecificationInput {
        SpecificationInput {
            name: name.into(),
            description: description.into(),
        }
    }

    fn jpeg(name: &str) -> ImageFile {
        ImageFile::new(name, "image/jpeg", vec![0xFF, 0xD8, 0xFF])
    }

    fn orders(gallery: &ImageGallery) -> Vec<usize> {
        gallery.images().iter().map(|i| i.display_order).collect()
    }

    fn names(gallery: &ImageGallery) -> Vec<&str> {
        gallery.images().iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn specification_is_sanitized_on_add() {
        let mut list = SpecificationList::new();
        let added = list.add(&spec("  Weight ", "350 <b>grams</b>")).unwrap();
        assert_eq!(added.detail.name, "Weight");
        assert_eq!(added.detail.description, "350 bgramsb");
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn invalid_specification_is_not_added() {
        let mut list = SpecificationList::new();
        let err = list.add(&spec("X", "tiny")).unwrap_err();
        assert!(matches!(err, SpecificationError::Invalid(ref e) if e.len() == 2));
        assert!(list.is_empty());
    }

    #[test]
    fn full_list_rejects_without_mutation() {
        let mut list = SpecificationList::new();
        for i in 0..MAX_SPECIFICATIONS {
            list.add(&spec(&format!("Spec {i}"), "Some detail")).unwrap();
        }
        assert!(list.is_full());
        let before: Vec<Uuid> = list.items().iter().map(|s| s.id).collect();

        let err = list.add(&spec("One more", "Some detail")).unwrap_err();
        assert_eq!(err.to_string(), "Maximum of 20 specifications reached");

        let after: Vec<Uuid> = list.items().iter().map(|s| s.id).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn remove_keeps_insertion_order() {
        let mut list = SpecificationList::new();
        let a = list.add(&spec("Alpha", "First entry")).unwrap().id;
        let b = list.add(&spec("Beta", "Second entry")).unwrap().id;
        let c = list.add(&spec("Gamma", "Third entry")).unwrap().id;

        assert!(list.remove(b).is_some());
        assert!(list.remove(b).is_none());
        let ids: Vec<Uuid> = list.items().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn images_get_dense_orders_and_previews() {
        let mut gallery = ImageGallery::new();
        let rejected = gallery.add(vec![jpeg("a.jpg"), jpeg("b.jpg")]).unwrap();
        assert!(rejected.is_empty());
        assert_eq!(orders(&gallery), vec![1, 2]);
        assert_eq!(gallery.images()[0].url, "data:image/jpeg;base64,/9j/");
        assert_eq!(gallery.main_image().unwrap().name, "a.jpg");

        gallery.add(vec![jpeg("c.jpg")]).unwrap();
        assert_eq!(orders(&gallery), vec![1, 2, 3]);
    }

    #[test]
    fn moving_images_renumbers() {
        let mut gallery = ImageGallery::new();
        gallery.add(vec![jpeg("a.jpg"), jpeg("b.jpg"), jpeg("c.jpg")]).unwrap();

        assert!(gallery.move_up(2));
        assert_eq!(names(&gallery), vec!["a.jpg", "c.jpg", "b.jpg"]);
        assert!(gallery.move_up(1));
        assert_eq!(gallery.main_image().unwrap().name, "c.jpg");
        assert_eq!(orders(&gallery), vec![1, 2, 3]);

        assert!(!gallery.move_up(0));
        assert!(!gallery.move_down(2));
        assert!(!gallery.move_down(7));
        assert!(gallery.move_down(0));
        assert_eq!(names(&gallery), vec!["a.jpg", "c.jpg", "b.jpg"]);
    }

    #[test]
    fn invalid_files_are_reported_and_skipped() {
        let mut gallery = ImageGallery::new();
        let rejected = gallery
            .add(vec![jpeg("ok.jpg"), ImageFile::new("run.exe", "image/png", vec![1])])
            .unwrap();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].name, "run.exe");
        assert_eq!(names(&gallery), vec!["ok.jpg"]);
        assert_eq!(orders(&gallery), vec![1]);
    }

    #[test]
    fn oversized_batch_is_refused_whole() {
        let mut gallery = ImageGallery::new();
        gallery
            .add((0..8).map(|i| jpeg(&format!("{i}.jpg"))).collect())
            .unwrap();

        let err = gallery
            .add((0..3).map(|i| jpeg(&format!("extra{i}.jpg"))).collect())
            .unwrap_err();
        assert!(matches!(err, GalleryError::TooMany { current: 8, incoming: 3, max: 10 }));
        assert_eq!(gallery.len(), 8);
    }
}
