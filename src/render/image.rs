//! Colormap lookup from real-valued grids to BGRA pixel buffers.

use super::colormap::{Bgra, Colormap, ColormapRegistry};
use crate::error::{Result, SpectrogramError};
use rayon::prelude::*;
use tracing::debug;

/// Default height of a colormap legend strip.
pub const COLORMAP_IMAGE_HEIGHT: usize = 100;

/// Borrowed row-major grid of values.
#[derive(Debug, Clone, Copy)]
pub struct GridView<'a> {
    values: &'a [f32],
    rows: usize,
    cols: usize,
}

impl<'a> GridView<'a> {
    pub fn new(values: &'a [f32], rows: usize, cols: usize) -> Result<Self> {
        if rows.checked_mul(cols) != Some(values.len()) {
            return Err(SpectrogramError::InvalidParameter(format!(
                "{} values can't form a {rows}x{cols} grid",
                values.len()
            )));
        }
        Ok(Self { values, rows, cols })
    }

    pub(crate) fn from_matrix(values: &'a [f32], rows: usize, cols: usize) -> Self {
        debug_assert_eq!(rows * cols, values.len());
        Self { values, rows, cols }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn values(&self) -> &'a [f32] {
        self.values
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.values.get(row * self.cols + col).copied()
    }
}

/// Contiguous row-major BGRA image, 4 bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArray {
    width: usize,
    height: usize,
    pixels: Vec<Bgra>,
}

impl ImageArray {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width * std::mem::size_of::<Bgra>()
    }

    pub fn pixels(&self) -> &[Bgra] {
        &self.pixels
    }

    pub fn pixel(&self, row: usize, col: usize) -> Option<Bgra> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.pixels.get(row * self.width + col).copied()
    }

    pub fn row(&self, row: usize) -> Option<&[Bgra]> {
        let start = row.checked_mul(self.width)?;
        (row < self.height).then(|| &self.pixels[start..start + self.width])
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

#[derive(Debug, Clone, Copy)]
enum IndexMapping {
    Normalized { min: f32, range: f32, max_index: f32 },
    Direct { max_index: f32 },
}

impl IndexMapping {
    #[inline(always)]
    fn index(self, value: f32) -> usize {
        match self {
            IndexMapping::Normalized { range, .. } if range == 0.0 => 0,
            IndexMapping::Normalized {
                min,
                range,
                max_index,
            } => (max_index * (value - min) / range)
                .clamp(0.0, max_index)
                .round() as usize,
            IndexMapping::Direct { max_index } => value.clamp(0.0, max_index) as usize,
        }
    }
}

fn allocate_pixels(width: usize, height: usize) -> Result<Vec<Bgra>> {
    let count = width
        .checked_mul(height)
        .filter(|count| count.checked_mul(std::mem::size_of::<Bgra>()).is_some())
        .ok_or_else(|| {
            SpectrogramError::ImageConstruction(format!("{width}x{height} image overflows"))
        })?;

    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(count)
        .map_err(|err| SpectrogramError::ImageConstruction(format!("{width}x{height}: {err}")))?;
    pixels.resize(count, Bgra::default());
    Ok(pixels)
}

/// Maps every cell of `data` through `colormap`.
///
/// The image is the transpose of the grid: grid rows become image columns, so a
/// `[time x frequency]` matrix renders with time running left to right. With
/// `normalize`, `data_min` maps to the first entry and `data_max` to the last;
/// equal bounds map everything to the first entry. Without it, values are
/// truncated to integer indices and clamped into the table.
pub fn apply_bgra_lookup(
    data: GridView<'_>,
    colormap: &Colormap,
    data_min: Option<f32>,
    data_max: Option<f32>,
    normalize: bool,
) -> Result<ImageArray> {
    let max_index = colormap.max_index() as f32;
    let mapping = if normalize {
        let (Some(min), Some(max)) = (data_min, data_max) else {
            return Err(SpectrogramError::MissingBounds);
        };
        let range = max - min;
        if !range.is_finite() || min > max {
            return Err(SpectrogramError::InvalidParameter(format!(
                "normalization bounds [{min}, {max}] are not a finite range"
            )));
        }
        IndexMapping::Normalized {
            min,
            range,
            max_index,
        }
    } else {
        IndexMapping::Direct { max_index }
    };

    let width = data.rows();
    let height = data.cols();
    let mut pixels = allocate_pixels(width, height)?;

    if !pixels.is_empty() {
        let values = data.values();
        pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(image_row, row)| {
                for (image_col, pixel) in row.iter_mut().enumerate() {
                    let value = values[image_col * height + image_row];
                    *pixel = colormap.get_clamped(mapping.index(value));
                }
            });
    }

    debug!(
        "[render] {width}x{height} image via '{}' ({mapping:?})",
        colormap.name()
    );

    Ok(ImageArray {
        width,
        height,
        pixels,
    })
}

/// Legend strip: column `i` shows colormap entry `i` repeated over `height` rows.
pub fn colormap_strip(colormap: &Colormap, height: usize) -> Result<ImageArray> {
    if height == 0 {
        return Err(SpectrogramError::InvalidParameter(
            "colormap image height must be at least 1".into(),
        ));
    }

    let indices: Vec<f32> = (0..colormap.len())
        .flat_map(|index| std::iter::repeat_n(index as f32, height))
        .collect();
    let grid = GridView::new(&indices, colormap.len(), height)?;
    apply_bgra_lookup(grid, colormap, None, None, false)
}

/// Legend strip for the colormap registered as `colormap_name`.
pub fn create_colormap_image(
    registry: &ColormapRegistry,
    colormap_name: &str,
    height: usize,
) -> Result<ImageArray> {
    colormap_strip(registry.get(colormap_name)?, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Colormap {
        let entries = (0..len).map(|i| Bgra::new(i as u8, 0, 0, 255)).collect();
        Colormap::new("ramp", entries).unwrap()
    }

    #[test]
    fn bounds_map_to_first_and_last_entries() {
        crate::init_test_tracing();
        let colormap = ramp(256);
        let values = [-80.0, -20.0, 10.0];
        let grid = GridView::new(&values, 3, 1).unwrap();
        let image = apply_bgra_lookup(grid, &colormap, Some(-80.0), Some(10.0), true).unwrap();
        assert_eq!(image.pixel(0, 0).unwrap().b, 0);
        assert_eq!(image.pixel(0, 2).unwrap().b, 255);
        // 255 * 60 / 90 = 170
        assert_eq!(image.pixel(0, 1).unwrap().b, 170);
    }

    #[test]
    fn normalization_rounds_and_clamps() {
        let colormap = ramp(5);
        let values = [0.0, 0.1, 0.125, 0.9, -3.0, 7.0];
        let grid = GridView::new(&values, 6, 1).unwrap();
        let image = apply_bgra_lookup(grid, &colormap, Some(0.0), Some(1.0), true).unwrap();
        let indices: Vec<u8> = image.pixels().iter().map(|p| p.b).collect();
        assert_eq!(indices, [0, 0, 1, 4, 0, 4]);
    }

    #[test]
    fn missing_bounds_are_rejected() {
        let colormap = ramp(4);
        let values = [1.0];
        let grid = GridView::new(&values, 1, 1).unwrap();
        for (min, max) in [(None, None), (Some(0.0), None), (None, Some(1.0))] {
            assert_eq!(
                apply_bgra_lookup(grid, &colormap, min, max, true).unwrap_err(),
                SpectrogramError::MissingBounds
            );
        }
        assert!(apply_bgra_lookup(grid, &colormap, None, None, false).is_ok());
    }

    #[test]
    fn unusable_bounds_are_rejected() {
        let colormap = ramp(4);
        let values = [1.0];
        let grid = GridView::new(&values, 1, 1).unwrap();
        let extreme = (-3.0e38, 3.0e38);
        for (min, max) in [(2.0, 1.0), (f32::NAN, 1.0), (0.0, f32::INFINITY), extreme] {
            let err = apply_bgra_lookup(grid, &colormap, Some(min), Some(max), true).unwrap_err();
            assert!(matches!(err, SpectrogramError::InvalidParameter(_)));
        }
    }

    #[test]
    fn equal_bounds_give_index_zero() {
        let colormap = ramp(16);
        let values = [-160.0; 6];
        let grid = GridView::new(&values, 2, 3).unwrap();
        let image = apply_bgra_lookup(grid, &colormap, Some(-160.0), Some(-160.0), true).unwrap();
        assert!(image.pixels().iter().all(|p| *p == colormap.entries()[0]));
    }

    #[test]
    fn output_is_transposed() {
        let colormap = ramp(10);
        // 2 rows (time) x 3 cols (frequency)
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let grid = GridView::new(&values, 2, 3).unwrap();
        let image = apply_bgra_lookup(grid, &colormap, None, None, false).unwrap();
        assert_eq!((image.width(), image.height()), (2, 3));
        for time in 0..2 {
            for freq in 0..3 {
                let expected = grid.get(time, freq).unwrap() as u8;
                assert_eq!(image.pixel(freq, time).unwrap().b, expected);
            }
        }
    }

    #[test]
    fn direct_indices_clamp_into_table() {
        let colormap = ramp(4);
        let values = [-2.0, 1.9, 3.0, 250.0, f32::NAN];
        let grid = GridView::new(&values, 5, 1).unwrap();
        let image = apply_bgra_lookup(grid, &colormap, None, None, false).unwrap();
        let indices: Vec<u8> = image.pixels().iter().map(|p| p.b).collect();
        assert_eq!(indices, [0, 1, 3, 3, 0]);
    }

    #[test]
    fn bytes_are_contiguous_bgra_rows() {
        let colormap = Colormap::new(
            "pair",
            vec![Bgra::new(1, 2, 3, 4), Bgra::new(5, 6, 7, 8)],
        )
        .unwrap();
        let values = [0.0, 1.0];
        let grid = GridView::new(&values, 2, 1).unwrap();
        let image = apply_bgra_lookup(grid, &colormap, None, None, false).unwrap();
        assert_eq!(image.stride(), 8);
        assert_eq!(image.as_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(image.row(0).unwrap().len(), 2);
        assert!(image.row(1).is_none());
        assert_eq!(image.into_bytes().len(), 8);
    }

    #[test]
    fn grid_shape_must_match_values() {
        assert!(GridView::new(&[0.0; 5], 2, 3).is_err());
        assert!(GridView::new(&[], 0, 7).is_ok());
    }

    #[test]
    fn empty_grid_gives_empty_image() {
        let grid = GridView::new(&[], 0, 4).unwrap();
        let image = apply_bgra_lookup(grid, &ramp(3), None, None, false).unwrap();
        assert_eq!((image.width(), image.height()), (0, 4));
        assert!(image.as_bytes().is_empty());
    }

    #[test]
    fn colormap_strip_repeats_each_entry_down_a_column() {
        let registry = ColormapRegistry::builtin();
        let image = create_colormap_image(&registry, "magma", COLORMAP_IMAGE_HEIGHT).unwrap();
        let colormap = registry.get("magma").unwrap();
        assert_eq!(image.width(), colormap.len());
        assert_eq!(image.height(), COLORMAP_IMAGE_HEIGHT);
        for row in 0..image.height() {
            assert_eq!(image.row(row).unwrap(), colormap.entries());
        }
    }

    #[test]
    fn colormap_strip_rejects_bad_requests() {
        let registry = ColormapRegistry::builtin();
        assert!(matches!(
            create_colormap_image(&registry, "magma", 0),
            Err(SpectrogramError::InvalidParameter(_))
        ));
        assert!(matches!(
            create_colormap_image(&registry, "nope", 10),
            Err(SpectrogramError::UnknownColormap(_))
        ));
    }
}
