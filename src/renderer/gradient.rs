//! Memoized balloon gradients
//!
//! Building a radial gradient means allocating a gradient object and three
//! color stops, so identical balloons share one. Keys only take values from
//! finite sets (pool colors, the field's radius, a few shade levels), which
//! keeps the map bounded without eviction.

use std::collections::HashMap;

use crate::color::Rgb;

/// Shade levels either side of the base color
pub const SHADE_LEVELS: i8 = 2;
/// Lighten/darken amount per shade level
pub const SHADE_STEP: f32 = 0.05;

/// A color stop within a radial gradient (offset in [0, 1])
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgb,
}

/// Highlight, body and rim stops for a balloon of `color`
pub fn balloon_stops(color: Rgb) -> [GradientStop; 3] {
    [
        GradientStop {
            offset: 0.0,
            color: color.shade(0.45),
        },
        GradientStop {
            offset: 0.6,
            color,
        },
        GradientStop {
            offset: 1.0,
            color: color.shade(-0.25),
        },
    ]
}

/// Quantize a color-cycle offset into a shade level
pub fn shade_level(cycle: f32) -> i8 {
    if !cycle.is_finite() {
        return 0;
    }
    (cycle / SHADE_STEP)
        .round()
        .clamp(-(SHADE_LEVELS as f32), SHADE_LEVELS as f32) as i8
}

/// Visual parameters that fully determine a balloon gradient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GradientKey {
    /// 0xRRGGBB after shading
    pub color: u32,
    /// Radius in tenths of a pixel
    pub radius_tenths: u32,
}

impl GradientKey {
    pub fn new(color: Rgb, radius: f32) -> Self {
        Self {
            color: color.packed(),
            radius_tenths: (radius.max(0.0) * 10.0).round() as u32,
        }
    }
}

/// Gradient cache, generic over the backend's gradient handle
#[derive(Debug)]
pub struct GradientCache<G> {
    entries: HashMap<GradientKey, G>,
    created: u64,
}

impl<G> Default for GradientCache<G> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            created: 0,
        }
    }
}

impl<G> GradientCache<G> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `key`, building it with `create` on a miss. A failed build is
    /// not cached, so it is retried next time.
    pub fn get_or_create(&mut self, key: GradientKey, create: impl FnOnce() -> Option<G>) -> Option<&G> {
        if !self.entries.contains_key(&key) {
            let gradient = create()?;
            self.entries.insert(key, gradient);
            self.created += 1;
        }
        self.entries.get(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total gradients built over the cache's lifetime
    pub fn created(&self) -> u64 {
        self.created
    }

    /// Forget everything (new drawing context)
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
