use crate::{Error, Result, error::MISSING_IMAGES_MESSAGE};
use axum::extract::Multipart;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// The three multipart fields the analyzer needs, in argument order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Image1,
    Image2,
    Image3,
}

impl ImageSlot {
    pub const ALL: [ImageSlot; 3] = [ImageSlot::Image1, ImageSlot::Image2, ImageSlot::Image3];

    pub fn from_field_name(name: &str) -> Option<Self> {
        match name {
            "image1" => Some(Self::Image1),
            "image2" => Some(Self::Image2),
            "image3" => Some(Self::Image3),
            _ => None,
        }
    }

    pub fn field_name(self) -> &'static str {
        match self {
            Self::Image1 => "image1",
            Self::Image2 => "image2",
            Self::Image3 => "image3",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Owns the three stored uploads of one request.
///
/// Files are removed by [`UploadedImageSet::cleanup`] once the analyzer has
/// exited. Dropping the set without calling it still removes them.
#[derive(Debug)]
pub struct UploadedImageSet {
    images: [TempPath; 3],
}

impl UploadedImageSet {
    pub fn new(image1: TempPath, image2: TempPath, image3: TempPath) -> Self {
        Self {
            images: [image1, image2, image3],
        }
    }

    /// Paths in the order image1, image2, image3.
    pub fn paths(&self) -> [&Path; 3] {
        [&*self.images[0], &*self.images[1], &*self.images[2]]
    }

    /// Deletes every file. A file that is already gone is not an error.
    pub async fn cleanup(self) {
        let images = self.images;
        let outcome = tokio::task::spawn_blocking(move || {
            images.map(|image| {
                let path = image.to_path_buf();
                (path, image.close())
            })
        })
        .await;

        let results = match outcome {
            Ok(results) => results,
            Err(e) => {
                warn!("Upload cleanup task failed: {}", e);
                return;
            }
        };

        for (path, result) in results {
            match result {
                Ok(()) => debug!("Removed upload {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("Upload {} was already gone", path.display())
                }
                Err(e) => warn!("Failed to remove upload {}: {}", path.display(), e),
            }
        }
    }
}

/// Uploads collected so far; anything held here is deleted on drop.
#[derive(Debug, Default)]
struct PendingImages {
    slots: [Option<TempPath>; 3],
}

impl PendingImages {
    /// Returns true when an earlier upload for the same slot was replaced.
    fn insert(&mut self, slot: ImageSlot, path: TempPath) -> bool {
        self.slots[slot.index()].replace(path).is_some()
    }

    fn complete(self) -> Result<UploadedImageSet> {
        match self.slots {
            [Some(image1), Some(image2), Some(image3)] => {
                Ok(UploadedImageSet::new(image1, image2, image3))
            }
            slots => {
                let missing: Vec<&str> = ImageSlot::ALL
                    .iter()
                    .zip(slots.iter())
                    .filter(|(_, path)| path.is_none())
                    .map(|(slot, _)| slot.field_name())
                    .collect();
                debug!("Rejecting upload, missing fields: {:?}", missing);
                Err(Error::validation(MISSING_IMAGES_MESSAGE))
            }
        }
    }
}

/// Writes multipart image fields into uniquely named files under one directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Stores `data` for `slot` and hands back the owning path.
    pub async fn store(&self, slot: ImageSlot, data: &[u8]) -> Result<TempPath> {
        let (mut file, path) = self.create(slot).await?;
        file.write_all(data).await?;
        file.flush().await?;
        Ok(path)
    }

    /// Streams the `image1`..`image3` fields to disk. Other fields are skipped.
    pub async fn receive(&self, mut multipart: Multipart) -> Result<UploadedImageSet> {
        let mut pending = PendingImages::default();

        while let Some(mut field) = multipart.next_field().await? {
            let Some(slot) = field.name().and_then(ImageSlot::from_field_name) else {
                debug!("Ignoring multipart field {:?}", field.name());
                continue;
            };

            let (mut file, path) = self.create(slot).await?;
            let mut written = 0usize;
            while let Some(chunk) = field.chunk().await? {
                file.write_all(&chunk).await?;
                written += chunk.len();
            }
            file.flush().await?;

            debug!(
                "Stored {} ({} bytes) at {}",
                slot.field_name(),
                written,
                path.display()
            );

            if pending.insert(slot, path) {
                debug!("Field {} sent twice, keeping the last one", slot.field_name());
            }
        }

        pending.complete()
    }

    /// Creates a uniquely named, empty file for `slot` on the blocking pool.
    async fn create(&self, slot: ImageSlot) -> Result<(tokio::fs::File, TempPath)> {
        let dir = self.dir.clone();
        let prefix = format!("{}-", slot.field_name());

        let file = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new().prefix(&prefix).tempfile_in(dir)
        })
        .await
        .map_err(|e| Error::internal(format!("upload file task failed: {}", e)))??;

        let (file, path) = file.into_parts();
        Ok((tokio::fs::File::from_std(file), path))
    }
}
