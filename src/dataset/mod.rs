//! Benchmark dataset discovery and loading.
//!
//! A benchmark dataset is a pair of directories under `SRF_<factor>/`:
//! `data/` holds the low-resolution inputs and `target/` holds the
//! ground-truth images under the same file names.
//!
//! ## Layouts
//!
//! | Layout | Directory structure | Dataset of a file |
//! |--------|---------------------|-------------------|
//! | [`DatasetLayout::PerDataset`] | `<root>/<name>/SRF_<f>/{data,target}` | its directory |
//! | [`DatasetLayout::Flat`] | `<root>/SRF_<f>/{data,target}` | file name prefix before `_` |
//!
//! ## Example
//!
//! ```rust,ignore
//! use sr_bench::dataset::{discover_datasets, DatasetLayout};
//!
//! let datasets = discover_datasets("data/test".as_ref(), &names, factor, DatasetLayout::PerDataset)?;
//! for sample in datasets[0].samples(4) {
//!     let sample = sample?;
//!     println!("{}", sample.image_id);
//! }
//! ```

mod discovery;
mod loader;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use discovery::{SUPPORTED_EXTENSIONS, list_images, list_subdirs, require_dir};
pub use loader::{Sample, SampleIter, load_sample};

use crate::error::{Error, Result};
use crate::model::UpscaleFactor;

/// Low-resolution input directory name.
pub const LOW_RES_DIR: &str = "data";

/// Ground-truth directory name.
pub const HIGH_RES_DIR: &str = "target";

/// How benchmark datasets are arranged on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetLayout {
    /// One directory per dataset.
    #[default]
    PerDataset,
    /// A single directory; each file name is prefixed with its dataset name.
    Flat,
}

/// Paths of one low-resolution / ground-truth pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplePaths {
    /// File name of the low-resolution image.
    pub image_id: String,
    /// Low-resolution image path.
    pub low_res: PathBuf,
    /// Ground-truth image path.
    pub high_res: PathBuf,
}

/// A named benchmark dataset with its image pairs in deterministic order.
#[derive(Debug, Clone)]
pub struct BenchmarkDataset {
    name: String,
    factor: UpscaleFactor,
    entries: Vec<SamplePaths>,
}

impl BenchmarkDataset {
    /// Open the `SRF_<factor>` directory of a dataset directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `data/` or `target/` is missing, or a
    /// low-resolution image has no ground-truth counterpart.
    pub fn open(dataset_dir: &Path, name: &str, factor: UpscaleFactor) -> Result<Self> {
        let entries = pair_images(&dataset_dir.join(factor.dir_name()))?;
        Ok(Self {
            name: name.to_string(),
            factor,
            entries,
        })
    }

    /// Create a dataset from already discovered pairs.
    #[must_use]
    pub fn from_entries(name: &str, factor: UpscaleFactor, entries: Vec<SamplePaths>) -> Self {
        Self {
            name: name.to_string(),
            factor,
            entries,
        }
    }

    /// Dataset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Upscale factor the pairs were discovered for.
    #[must_use]
    pub fn factor(&self) -> UpscaleFactor {
        self.factor
    }

    /// Image pairs in processing order.
    #[must_use]
    pub fn entries(&self) -> &[SamplePaths] {
        &self.entries
    }

    /// Number of image pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dataset has no images.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode samples in order, prefetching up to `prefetch` at a time.
    pub fn samples(&self, prefetch: usize) -> SampleIter<'_> {
        SampleIter::new(&self.entries, self.factor, prefetch)
    }
}

/// Pair every image in `<srf_dir>/data` with `<srf_dir>/target`.
fn pair_images(srf_dir: &Path) -> Result<Vec<SamplePaths>> {
    let lr_dir = srf_dir.join(LOW_RES_DIR);
    let hr_dir = srf_dir.join(HIGH_RES_DIR);
    require_dir(&lr_dir)?;
    require_dir(&hr_dir)?;

    list_images(&lr_dir)?
        .into_iter()
        .map(|low_res| {
            let image_id = low_res
                .file_name()
                .and_then(|s| s.to_str())
                .ok_or_else(|| {
                    Error::Dataset(format!("Non UTF-8 file name: {}", low_res.display()))
                })?
                .to_string();
            let high_res = hr_dir.join(&image_id);
            if !high_res.is_file() {
                return Err(Error::Dataset(format!(
                    "Missing ground truth for {}: expected {}",
                    image_id,
                    high_res.display()
                )));
            }
            Ok(SamplePaths {
                image_id,
                low_res,
                high_res,
            })
        })
        .collect()
}

/// Dataset name encoded in a flat-layout file name (`Set5_baby.png` -> `Set5`).
#[must_use]
pub fn dataset_prefix(image_id: &str) -> &str {
    image_id.split('_').next().unwrap_or(image_id)
}

/// Discover the configured datasets under `root`.
///
/// The result holds one dataset per configured name, in configured order.
///
/// The two layouts treat unconfigured data differently. A per-dataset root
/// may hold extra directories, which are logged at `warn` and skipped, since
/// nothing from them is read. In the flat layout every file under `SRF_<f>`
/// would be evaluated, so a file whose prefix names no configured dataset is
/// rejected.
///
/// # Errors
///
/// - [`DatasetLayout::PerDataset`]: a configured dataset directory is missing.
/// - [`DatasetLayout::Flat`]: a file's prefix is not a configured name
///   ([`Error::DatasetMismatch`]).
pub fn discover_datasets(
    root: &Path,
    names: &[String],
    factor: UpscaleFactor,
    layout: DatasetLayout,
) -> Result<Vec<BenchmarkDataset>> {
    require_dir(root)?;

    match layout {
        DatasetLayout::PerDataset => {
            for found in list_subdirs(root)? {
                if !names.contains(&found) {
                    tracing::warn!(dataset = %found, "skipping undeclared dataset directory");
                }
            }
            names
                .iter()
                .map(|name| {
                    let dir = root.join(name);
                    if !dir.is_dir() {
                        return Err(Error::Dataset(format!(
                            "Configured dataset {} not found at {}",
                            name,
                            dir.display()
                        )));
                    }
                    BenchmarkDataset::open(&dir, name, factor)
                })
                .collect()
        }
        DatasetLayout::Flat => {
            let entries = pair_images(&root.join(factor.dir_name()))?;
            let mut grouped: Vec<Vec<SamplePaths>> = vec![Vec::new(); names.len()];
            for entry in entries {
                let prefix = dataset_prefix(&entry.image_id);
                let index = names.iter().position(|n| n == prefix).ok_or_else(|| {
                    Error::DatasetMismatch {
                        expected: names.to_vec(),
                        found: prefix.to_string(),
                    }
                })?;
                grouped[index].push(entry);
            }
            Ok(names
                .iter()
                .zip(grouped)
                .map(|(name, entries)| BenchmarkDataset::from_entries(name, factor, entries))
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use image::{Rgb, RgbImage};

    fn write_png(path: &Path, width: u32, height: u32, value: u8) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::from_pixel(width, height, Rgb([value, value, value]))
            .save(path)
            .unwrap();
    }

    fn write_pair(srf_dir: &Path, name: &str) {
        write_png(&srf_dir.join(LOW_RES_DIR).join(name), 2, 2, 200);
        write_png(&srf_dir.join(HIGH_RES_DIR).join(name), 4, 4, 200);
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_dataset_prefix() {
        assert_eq!(dataset_prefix("Set5_baby.png"), "Set5");
        assert_eq!(dataset_prefix("plain.png"), "plain.png");
    }

    #[test]
    fn test_per_dataset_discovery() {
        let root = tempfile::tempdir().unwrap();
        write_pair(&root.path().join("B/SRF_2"), "z.png");
        write_pair(&root.path().join("B/SRF_2"), "a.png");
        std::fs::create_dir_all(root.path().join("A/SRF_2/data")).unwrap();
        std::fs::create_dir_all(root.path().join("A/SRF_2/target")).unwrap();
        std::fs::create_dir_all(root.path().join("Extra")).unwrap();

        let datasets =
            discover_datasets(root.path(), &names(&["B", "A"]), UpscaleFactor::X2, DatasetLayout::PerDataset)
                .unwrap();
        assert_eq!(datasets.len(), 2);
        assert_eq!(datasets[0].name(), "B");
        let ids: Vec<_> = datasets[0].entries().iter().map(|e| e.image_id.as_str()).collect();
        assert_eq!(ids, ["a.png", "z.png"]);
        assert!(datasets[1].is_empty());
    }

    #[test]
    fn test_missing_configured_dataset() {
        let root = tempfile::tempdir().unwrap();
        write_pair(&root.path().join("A/SRF_2"), "a.png");
        let result =
            discover_datasets(root.path(), &names(&["A", "Missing"]), UpscaleFactor::X2, DatasetLayout::PerDataset);
        assert!(matches!(result, Err(Error::Dataset(_))));
    }

    #[test]
    fn test_missing_ground_truth() {
        let root = tempfile::tempdir().unwrap();
        let srf = root.path().join("A/SRF_2");
        write_pair(&srf, "a.png");
        write_png(&srf.join(LOW_RES_DIR).join("b.png"), 2, 2, 0);
        assert!(BenchmarkDataset::open(&root.path().join("A"), "A", UpscaleFactor::X2).is_err());
    }

    #[test]
    fn test_flat_discovery_routes_by_prefix() {
        let root = tempfile::tempdir().unwrap();
        let srf = root.path().join("SRF_2");
        write_pair(&srf, "Set5_001.png");
        write_pair(&srf, "Set14_001.png");
        write_pair(&srf, "Set5_002.png");

        let datasets = discover_datasets(
            root.path(),
            &names(&["Set5", "Set14", "BSD100"]),
            UpscaleFactor::X2,
            DatasetLayout::Flat,
        )
        .unwrap();
        assert_eq!(datasets[0].len(), 2);
        assert_eq!(datasets[1].len(), 1);
        assert!(datasets[2].is_empty());
    }

    #[test]
    fn test_flat_unknown_prefix_fails() {
        let root = tempfile::tempdir().unwrap();
        write_pair(&root.path().join("SRF_2"), "Urban100_001.png");
        let result =
            discover_datasets(root.path(), &names(&["Set5"]), UpscaleFactor::X2, DatasetLayout::Flat);
        assert!(matches!(result, Err(Error::DatasetMismatch { found, .. }) if found == "Urban100"));
    }

    #[test]
    fn test_samples_decode_in_order() {
        let root = tempfile::tempdir().unwrap();
        let srf = root.path().join("A/SRF_2");
        for name in ["c.png", "a.png", "b.png", "d.png", "e.png"] {
            write_pair(&srf, name);
        }
        let dataset = BenchmarkDataset::open(&root.path().join("A"), "A", UpscaleFactor::X2).unwrap();

        let samples: Vec<Sample> = dataset.samples(2).collect::<Result<_>>().unwrap();
        let ids: Vec<_> = samples.iter().map(|s| s.image_id.as_str()).collect();
        assert_eq!(ids, ["a.png", "b.png", "c.png", "d.png", "e.png"]);

        let first = &samples[0];
        assert_eq!(first.low_res.shape(), (3, 2, 2));
        assert_eq!(first.bicubic.shape(), (3, 4, 4));
        assert_eq!(first.high_res.shape(), (3, 4, 4));
    }

    #[test]
    fn test_sample_size_mismatch() {
        let root = tempfile::tempdir().unwrap();
        let srf = root.path().join("A/SRF_2");
        write_png(&srf.join(LOW_RES_DIR).join("a.png"), 2, 2, 10);
        write_png(&srf.join(HIGH_RES_DIR).join("a.png"), 5, 4, 10);
        let dataset = BenchmarkDataset::open(&root.path().join("A"), "A", UpscaleFactor::X2).unwrap();
        let first = dataset.samples(1).next().unwrap();
        assert!(matches!(first, Err(Error::DimensionMismatch { .. })));
    }
}
