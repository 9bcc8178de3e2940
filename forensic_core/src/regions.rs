//! Luma / Region Extractor
//!
//! Converts a `RasterImage` into a luminance field once, then partitions it
//! into an `R x C` grid of rectangular regions with per-region aggregates.
//!
//! ```text
//! RasterImage -> LumaField -> GridSpec(rows, cols) -> Vec<Region>
//!                                                      |
//!                      mean / variance / edge density / sharpness / noise
//! ```
//!
//! Regions carry only bounds and computed numbers; they never hold pixel data.

use crate::raster::RasterImage;
use crate::stats::RunningStats;
use serde::{Deserialize, Serialize};

/// Edge-energy threshold (luma units) used for edge density.
pub const DEFAULT_EDGE_THRESHOLD: f64 = 30.0;

// ============================================================================
// LumaField
// ============================================================================

#[derive(Debug, Clone)]
pub struct LumaField {
    width: usize,
    height: usize,
    values: Vec<f64>,
}

impl LumaField {
    pub fn from_raster(raster: &RasterImage) -> Self {
        let width = raster.width() as usize;
        let height = raster.height() as usize;
        let channels = raster.channels() as usize;
        let pixels = raster.pixels();

        let values = if channels >= 3 {
            pixels
                .chunks_exact(channels)
                .map(|p| {
                    crate::raster::LUMA_R * p[0] as f64
                        + crate::raster::LUMA_G * p[1] as f64
                        + crate::raster::LUMA_B * p[2] as f64
                })
                .collect()
        } else {
            pixels.chunks_exact(channels).map(|p| p[0] as f64).collect()
        };

        Self {
            width,
            height,
            values,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.values[y * self.width + x]
    }

    /// Right + down absolute differences. Requires `x + 1 < width` and
    /// `y + 1 < height`.
    #[inline]
    pub fn edge_energy(&self, x: usize, y: usize) -> f64 {
        let c = self.get(x, y);
        (c - self.get(x + 1, y)).abs() + (c - self.get(x, y + 1)).abs()
    }

    /// `|8*L(x,y) - sum of the 8 neighbours|`. Requires an interior pixel.
    #[inline]
    pub fn laplacian(&self, x: usize, y: usize) -> f64 {
        let w = self.width;
        let v = &self.values;
        let idx = y * w + x;
        let neighbours = v[idx - 1]
            + v[idx + 1]
            + v[idx - w]
            + v[idx + w]
            + v[idx - w - 1]
            + v[idx - w + 1]
            + v[idx + w - 1]
            + v[idx + w + 1];
        (8.0 * v[idx] - neighbours).abs()
    }

    /// Whole-image interior pixels: both coordinates in `1..dim-1`.
    pub fn interior(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let (w, h) = (self.width, self.height);
        (1..h.saturating_sub(1)).flat_map(move |y| (1..w.saturating_sub(1)).map(move |x| (x, y)))
    }

    /// 256-bin histogram of rounded luma.
    pub fn histogram(&self) -> [u64; 256] {
        let mut hist = [0u64; 256];
        for &v in &self.values {
            hist[v.round().clamp(0.0, 255.0) as usize] += 1;
        }
        hist
    }
}

// ============================================================================
// Grid / Region
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    pub rows: u32,
    pub cols: u32,
}

impl GridSpec {
    pub const fn square(n: u32) -> Self {
        Self { rows: n, cols: n }
    }

    /// Never more bands than pixels along an axis, so every region is
    /// non-empty.
    pub fn clamped_to(&self, width: usize, height: usize) -> GridSpec {
        GridSpec {
            rows: (self.rows.max(1) as usize).min(height.max(1)) as u32,
            cols: (self.cols.max(1) as usize).min(width.max(1)) as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RegionStats {
    pub pixel_count: usize,
    pub mean_brightness: f64,
    /// Population variance of raw luma.
    pub brightness_variance: f64,
    /// Fraction of kernel pixels whose edge energy exceeds the threshold.
    pub edge_density: f64,
    /// Mean edge energy over kernel pixels.
    pub sharpness: f64,
    /// Variance of the 8-neighbour Laplacian magnitude over kernel pixels.
    pub noise_variance: f64,
    pub kernel_pixels: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Region {
    /// Row-major index into the grid.
    pub index: usize,
    pub gx: u32,
    pub gy: u32,
    pub x0: usize,
    pub y0: usize,
    /// Exclusive.
    pub x1: usize,
    /// Exclusive.
    pub y1: usize,
    pub stats: RegionStats,
}

fn band_bounds(index: usize, bands: usize, dim: usize) -> (usize, usize) {
    let size = dim / bands;
    let start = index * size;
    // last band absorbs the remainder
    let end = if index + 1 == bands { dim } else { start + size };
    (start, end)
}

/// Partition `luma` into `grid` and compute every aggregate per region.
///
/// Kernel statistics (edges, sharpness, Laplacian noise) skip the outer ring
/// of each region and of the image, so no neighbour lookup leaves the buffer.
pub fn extract_regions(luma: &LumaField, grid: GridSpec, edge_threshold: f64) -> Vec<Region> {
    let (width, height) = (luma.width(), luma.height());
    let grid = grid.clamped_to(width, height);
    let (rows, cols) = (grid.rows as usize, grid.cols as usize);

    let mut regions = Vec::with_capacity(rows * cols);
    for gy in 0..rows {
        let (y0, y1) = band_bounds(gy, rows, height);
        for gx in 0..cols {
            let (x0, x1) = band_bounds(gx, cols, width);
            let stats = region_stats(luma, x0, y0, x1, y1, edge_threshold);
            regions.push(Region {
                index: gy * cols + gx,
                gx: gx as u32,
                gy: gy as u32,
                x0,
                y0,
                x1,
                y1,
                stats,
            });
        }
    }
    regions
}

fn region_stats(
    luma: &LumaField,
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
    edge_threshold: f64,
) -> RegionStats {
    let mut brightness = RunningStats::default();
    for y in y0..y1 {
        for x in x0..x1 {
            brightness.push(luma.get(x, y));
        }
    }

    let kx_end = x1.saturating_sub(1).min(luma.width().saturating_sub(1));
    let ky_end = y1.saturating_sub(1).min(luma.height().saturating_sub(1));

    let mut edge_pixels = 0usize;
    let mut kernel_pixels = 0usize;
    let mut edge_sum = 0.0;
    let mut laplacian = RunningStats::default();
    for y in (y0 + 1)..ky_end {
        for x in (x0 + 1)..kx_end {
            let energy = luma.edge_energy(x, y);
            if energy > edge_threshold {
                edge_pixels += 1;
            }
            edge_sum += energy;
            laplacian.push(luma.laplacian(x, y));
            kernel_pixels += 1;
        }
    }

    let (edge_density, sharpness) = if kernel_pixels > 0 {
        (
            edge_pixels as f64 / kernel_pixels as f64,
            edge_sum / kernel_pixels as f64,
        )
    } else {
        (0.0, 0.0)
    };

    RegionStats {
        pixel_count: brightness.count() as usize,
        mean_brightness: brightness.mean(),
        brightness_variance: brightness.variance(),
        edge_density,
        sharpness,
        noise_variance: laplacian.variance(),
        kernel_pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> RasterImage {
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        RasterImage::new(width, height, 1, pixels).unwrap()
    }

    #[test]
    fn test_last_band_absorbs_remainder() {
        assert_eq!(band_bounds(0, 3, 10), (0, 3));
        assert_eq!(band_bounds(1, 3, 10), (3, 6));
        assert_eq!(band_bounds(2, 3, 10), (6, 10));
    }

    #[test]
    fn test_regions_cover_every_pixel_once() {
        let raster = gray(17, 11, |x, y| ((x * 7 + y * 3) % 256) as u8);
        let luma = LumaField::from_raster(&raster);
        let regions = extract_regions(&luma, GridSpec::square(4), DEFAULT_EDGE_THRESHOLD);
        assert_eq!(regions.len(), 16);
        let covered: usize = regions.iter().map(|r| r.stats.pixel_count).sum();
        assert_eq!(covered, 17 * 11);
        assert_eq!(regions[5].index, 5);
        assert_eq!((regions[5].gx, regions[5].gy), (1, 1));
    }

    #[test]
    fn test_grid_clamped_for_tiny_images() {
        let raster = gray(2, 3, |_, _| 10);
        let luma = LumaField::from_raster(&raster);
        let regions = extract_regions(&luma, GridSpec::square(5), DEFAULT_EDGE_THRESHOLD);
        assert_eq!(regions.len(), 6);
        assert!(regions.iter().all(|r| r.stats.pixel_count == 1));
        // no interior pixels anywhere: kernel stats are zero, never NaN
        assert!(regions.iter().all(|r| r.stats.sharpness == 0.0 && r.stats.edge_density == 0.0));
    }

    #[test]
    fn test_uniform_region_stats() {
        let raster = gray(40, 40, |_, _| 128);
        let luma = LumaField::from_raster(&raster);
        for region in extract_regions(&luma, GridSpec::square(4), DEFAULT_EDGE_THRESHOLD) {
            assert!((region.stats.mean_brightness - 128.0).abs() < 1e-9);
            assert!(region.stats.brightness_variance.abs() < 1e-9);
            assert_eq!(region.stats.edge_density, 0.0);
            assert_eq!(region.stats.sharpness, 0.0);
            assert!(region.stats.kernel_pixels > 0);
        }
    }

    #[test]
    fn test_checkerboard_is_all_edges() {
        let raster = gray(30, 30, |x, y| if (x + y) % 2 == 0 { 0 } else { 255 });
        let luma = LumaField::from_raster(&raster);
        let regions = extract_regions(&luma, GridSpec::square(3), DEFAULT_EDGE_THRESHOLD);
        for region in regions {
            assert_eq!(region.stats.edge_density, 1.0);
            assert!((region.stats.sharpness - 510.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_laplacian_of_isolated_spike() {
        let raster = gray(3, 3, |x, y| if x == 1 && y == 1 { 10 } else { 0 });
        let luma = LumaField::from_raster(&raster);
        assert_eq!(luma.laplacian(1, 1), 80.0);
        assert_eq!(luma.interior().count(), 1);
    }

    #[test]
    fn test_histogram_counts_all_pixels() {
        let raster = RasterImage::new(2, 1, 3, vec![255, 255, 255, 0, 0, 0]).unwrap();
        let hist = LumaField::from_raster(&raster).histogram();
        assert_eq!(hist[255], 1);
        assert_eq!(hist[0], 1);
        assert_eq!(hist.iter().sum::<u64>(), 2);
    }
}
