//! Colormap lookup tables and the name-keyed registry.
//!
//! Built-in maps are expanded from evenly spaced sRGB stops into
//! [`COLORMAP_SIZE`] entries stored in blue-green-red-alpha order, so an image
//! row can be written straight from the table.

use crate::error::{Result, SpectrogramError};
use bytemuck::{Pod, Zeroable};

pub const COLORMAP_SIZE: usize = 256;
pub const DEFAULT_COLORMAP: &str = "magma";

/// One 8-bit-per-channel pixel in memory order B, G, R, A.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct Bgra {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl Bgra {
    pub const fn new(b: u8, g: u8, r: u8, a: u8) -> Self {
        Self { b, g, r, a }
    }

    pub const fn opaque_rgb([r, g, b]: [u8; 3]) -> Self {
        Self { b, g, r, a: 255 }
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.b, self.g, self.r, self.a]
    }
}

// sRGB stops at t = 0, 1/8, ..., 1.
mod stops {
    pub const MAGMA: [[u8; 3]; 9] = [
        [0x00, 0x00, 0x04],
        [0x1c, 0x10, 0x44],
        [0x4f, 0x12, 0x7b],
        [0x81, 0x25, 0x81],
        [0xb5, 0x36, 0x7a],
        [0xe5, 0x50, 0x64],
        [0xfb, 0x87, 0x61],
        [0xfe, 0xc2, 0x87],
        [0xfc, 0xfd, 0xbf],
    ];

    pub const INFERNO: [[u8; 3]; 9] = [
        [0x00, 0x00, 0x04],
        [0x1f, 0x0c, 0x48],
        [0x55, 0x0f, 0x6d],
        [0x88, 0x22, 0x6a],
        [0xba, 0x36, 0x55],
        [0xe3, 0x59, 0x33],
        [0xf9, 0x8e, 0x09],
        [0xf8, 0xc9, 0x32],
        [0xfc, 0xff, 0xa4],
    ];

    pub const PLASMA: [[u8; 3]; 9] = [
        [0x0d, 0x08, 0x87],
        [0x4c, 0x02, 0xa1],
        [0x7e, 0x03, 0xa8],
        [0xa9, 0x23, 0x95],
        [0xcc, 0x47, 0x78],
        [0xe5, 0x6b, 0x5d],
        [0xf8, 0x95, 0x40],
        [0xfd, 0xc5, 0x27],
        [0xf0, 0xf9, 0x21],
    ];

    pub const VIRIDIS: [[u8; 3]; 9] = [
        [0x44, 0x01, 0x54],
        [0x47, 0x2d, 0x7b],
        [0x3b, 0x52, 0x8b],
        [0x2c, 0x72, 0x8e],
        [0x21, 0x91, 0x8c],
        [0x28, 0xae, 0x80],
        [0x5e, 0xc9, 0x62],
        [0xad, 0xdc, 0x30],
        [0xfd, 0xe7, 0x25],
    ];

    pub const GRAY: [[u8; 3]; 2] = [[0x00, 0x00, 0x00], [0xff, 0xff, 0xff]];
}

/// Fixed, ordered table of colors addressed by integer index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Colormap {
    name: String,
    entries: Vec<Bgra>,
}

impl Colormap {
    pub fn new(name: impl Into<String>, entries: Vec<Bgra>) -> Result<Self> {
        let name = name.into();
        if entries.is_empty() {
            return Err(SpectrogramError::InvalidParameter(format!(
                "colormap '{name}' has no entries"
            )));
        }
        Ok(Self { name, entries })
    }

    /// Expands evenly spaced RGB stops into `len` opaque entries by linear interpolation.
    pub fn from_stops(name: impl Into<String>, stops: &[[u8; 3]], len: usize) -> Result<Self> {
        let name = name.into();
        if stops.is_empty() || len == 0 {
            return Err(SpectrogramError::InvalidParameter(format!(
                "colormap '{name}' needs at least one stop and one entry"
            )));
        }

        let last = (len - 1).max(1) as f32;
        let entries = (0..len)
            .map(|index| Bgra::opaque_rgb(sample_gradient(stops, index as f32 / last)))
            .collect();
        Self::new(name, entries)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn entries(&self) -> &[Bgra] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn max_index(&self) -> usize {
        self.entries.len() - 1
    }

    /// Entry at `index`, clamped into the table.
    #[inline]
    pub fn get_clamped(&self, index: usize) -> Bgra {
        self.entries[index.min(self.max_index())]
    }
}

// Samples a gradient at position `t` (0.0 to 1.0) using linear interpolation.
fn sample_gradient(stops: &[[u8; 3]], t: f32) -> [u8; 3] {
    let n = stops.len();
    if n == 1 {
        return stops[0];
    }
    let pos = t.clamp(0.0, 1.0) * (n - 1) as f32;
    let i = (pos as usize).min(n - 2);
    let factor = pos - i as f32;
    let (a, b) = (stops[i], stops[i + 1]);
    std::array::from_fn(|channel| {
        let mixed = a[channel] as f32 + (b[channel] as f32 - a[channel] as f32) * factor;
        mixed.round().clamp(0.0, 255.0) as u8
    })
}

/// Name-keyed colormaps. Always holds the built-ins; registering a map under an
/// existing name replaces it.
#[derive(Debug, Clone)]
pub struct ColormapRegistry {
    colormaps: Vec<Colormap>,
}

impl Default for ColormapRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ColormapRegistry {
    pub fn builtin() -> Self {
        let builtin: [(&str, &[[u8; 3]]); 5] = [
            ("magma", &stops::MAGMA),
            ("inferno", &stops::INFERNO),
            ("plasma", &stops::PLASMA),
            ("viridis", &stops::VIRIDIS),
            ("gray", &stops::GRAY),
        ];
        let colormaps = builtin
            .into_iter()
            .filter_map(|(name, stops)| Colormap::from_stops(name, stops, COLORMAP_SIZE).ok())
            .collect();
        Self { colormaps }
    }

    /// Looks up a colormap by name, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Result<&Colormap> {
        self.colormaps
            .iter()
            .find(|colormap| colormap.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| SpectrogramError::UnknownColormap(name.to_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.colormaps.iter().map(Colormap::name)
    }

    /// Adds `colormap`, returning the one it replaced.
    pub fn register(&mut self, colormap: Colormap) -> Option<Colormap> {
        match self
            .colormaps
            .iter_mut()
            .find(|existing| existing.name.eq_ignore_ascii_case(&colormap.name))
        {
            Some(existing) => Some(std::mem::replace(existing, colormap)),
            None => {
                self.colormaps.push(colormap);
                None
            }
        }
    }

    pub fn default_colormap(&self) -> &Colormap {
        self.get(DEFAULT_COLORMAP)
            .unwrap_or_else(|_| &self.colormaps[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered_in_order() {
        let registry = ColormapRegistry::builtin();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, ["magma", "inferno", "plasma", "viridis", "gray"]);
        for name in names {
            assert_eq!(registry.get(name).unwrap().len(), COLORMAP_SIZE);
        }
        assert_eq!(registry.default_colormap().name(), DEFAULT_COLORMAP);
    }

    #[test]
    fn entries_hit_the_end_stops() {
        let registry = ColormapRegistry::builtin();
        let viridis = registry.get("viridis").unwrap();
        assert_eq!(viridis.entries()[0], Bgra::new(0x54, 0x01, 0x44, 255));
        assert_eq!(viridis.entries()[255], Bgra::new(0x25, 0xe7, 0xfd, 255));

        let gray = registry.get("GRAY").unwrap();
        assert_eq!(gray.entries()[0], Bgra::new(0, 0, 0, 255));
        assert_eq!(gray.entries()[128], Bgra::new(128, 128, 128, 255));
        assert_eq!(gray.entries()[255], Bgra::new(255, 255, 255, 255));
    }

    #[test]
    fn unknown_names_are_errors() {
        let registry = ColormapRegistry::builtin();
        assert_eq!(
            registry.get("jet").unwrap_err(),
            SpectrogramError::UnknownColormap("jet".into())
        );
        assert!(!registry.contains("jet"));
    }

    #[test]
    fn register_adds_or_replaces() {
        let mut registry = ColormapRegistry::builtin();
        let mono = Colormap::new("mono", vec![Bgra::new(1, 2, 3, 4)]).unwrap();
        assert!(registry.register(mono.clone()).is_none());
        assert_eq!(registry.get("mono").unwrap(), &mono);

        let gray = Colormap::from_stops("gray", &[[9, 9, 9]], 4).unwrap();
        let replaced = registry.register(gray).unwrap();
        assert_eq!(replaced.len(), COLORMAP_SIZE);
        assert_eq!(registry.get("gray").unwrap().len(), 4);
        assert_eq!(registry.names().count(), 6);
    }

    #[test]
    fn empty_colormaps_are_rejected() {
        assert!(Colormap::new("none", Vec::new()).is_err());
        assert!(Colormap::from_stops("none", &[], 8).is_err());
        assert!(Colormap::from_stops("none", &[[0, 0, 0]], 0).is_err());
    }

    #[test]
    fn clamped_lookup_stays_in_range() {
        let colormap = Colormap::from_stops("ramp", &[[0, 0, 0], [255, 255, 255]], 3).unwrap();
        assert_eq!(colormap.get_clamped(0), Bgra::new(0, 0, 0, 255));
        assert_eq!(colormap.get_clamped(99), Bgra::new(255, 255, 255, 255));
    }

    #[test]
    fn pixels_cast_to_bgra_bytes() {
        let pixels = [Bgra::opaque_rgb([10, 20, 30])];
        let bytes: &[u8] = bytemuck::cast_slice(&pixels);
        assert_eq!(bytes, &[30, 20, 10, 255]);
    }
}
