//! Edge tracking seam.
//!
//! An edge tracker turns raw "currently held" words into hold/trigger/release
//! deltas, decides whether a sample is a new poll step at all, and evaluates
//! configured combos against the last step it saw. The turbo engine only
//! consumes its output. Default trackers for each device family live next to
//! their interceptors in [`crate::pad`].

use crate::buttons::ExtensionShape;
use crate::combo::Combo;

/// Level and edge bits for one button group during one poll step, in the
/// group's raw mask layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Levels {
    pub hold: u32,
    pub trigger: u32,
    pub release: u32,
}

impl Levels {
    /// Derive edges from the previous and current held words.
    pub fn advance(prev_hold: u32, hold: u32) -> Self {
        Self {
            hold,
            trigger: hold & !prev_hold,
            release: prev_hold & !hold,
        }
    }

    /// Levels for a sample with no edges: everything in `hold` is a steady level.
    pub fn steady(hold: u32) -> Self {
        Self {
            hold,
            trigger: 0,
            release: 0,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.hold == 0 && self.trigger == 0 && self.release == 0
    }
}

/// Extension group levels. The variant fixes which catalog the bits index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtLevels {
    Nunchuk(Levels),
    Classic(Levels),
    Pro(Levels),
}

impl ExtLevels {
    pub fn shape(&self) -> ExtensionShape {
        match self {
            ExtLevels::Nunchuk(_) => ExtensionShape::Nunchuk,
            ExtLevels::Classic(_) => ExtensionShape::Classic,
            ExtLevels::Pro(_) => ExtensionShape::Pro,
        }
    }

    pub fn levels(&self) -> &Levels {
        match self {
            ExtLevels::Nunchuk(l) | ExtLevels::Classic(l) | ExtLevels::Pro(l) => l,
        }
    }

    pub fn levels_mut(&mut self) -> &mut Levels {
        match self {
            ExtLevels::Nunchuk(l) | ExtLevels::Classic(l) | ExtLevels::Pro(l) => l,
        }
    }
}

/// Everything a tracker reports for one channel and one poll step.
///
/// `core` is absent for pads with no core group (the Pro Controller reports
/// all of its buttons through the extension word).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Edges {
    pub core: Option<Levels>,
    pub ext: Option<ExtLevels>,
}

impl Edges {
    pub fn ext_shape(&self) -> ExtensionShape {
        self.ext
            .as_ref()
            .map_or(ExtensionShape::None, ExtLevels::shape)
    }

    /// Clear every emitted bit in every group.
    pub fn clear(&mut self) {
        if let Some(core) = &mut self.core {
            core.clear();
        }
        if let Some(ext) = &mut self.ext {
            ext.levels_mut().clear();
        }
    }
}

/// Edge tracker + combo matcher for one device family.
pub trait EdgeTracker {
    /// Decoded sample type the tracker consumes.
    type Sample;

    /// Feed one sample. Returns `None` when the sample does not represent a
    /// new discrete poll step (already seen, out of range channel, ...).
    fn update(&mut self, channel: usize, sample: &Self::Sample) -> Option<Edges>;

    /// Whether `combo` was just triggered on `channel` by the last update.
    fn triggered(&self, channel: usize, combo: &Combo) -> bool;

    /// Forget all history.
    fn reset(&mut self);
}

/// Wrapping "strictly newer" comparison for hardware sample ticks.
pub fn tick_is_newer(tick: u32, last: u32) -> bool {
    let delta = tick.wrapping_sub(last);
    delta != 0 && delta < u32::MAX / 2
}
