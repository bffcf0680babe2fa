//! Per-channel turbo state and the extension lifecycle.
//!
//! A channel owns the core group state, a tagged extension group state and
//! the assignment-mode flag. Engine calls never perform I/O: they return
//! [`Notice`]s and the interceptor decides how to log and notify them.

use crate::buttons::{classic, nunchuk, pro, ButtonGroup, ExtensionShape};
use crate::edge::{Edges, ExtLevels, Levels};
use crate::error::TurboError;

use super::turbo::{TurboChange, TurboState};

/// Side effect produced by a channel step, for the caller to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Assignment mode entered (`true`) or left (`false`) through a combo.
    Toggling(bool),
    /// A button's turbo flag was committed.
    Turbo(TurboChange),
}

/// Extension group state. The variant is the only thing that says which
/// catalog the indices refer to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExtensionState {
    #[default]
    None,
    Nunchuk(TurboState<{ nunchuk::WIDTH }>),
    Classic(TurboState<{ classic::WIDTH }>),
    Pro(TurboState<{ pro::WIDTH }>),
}

impl ExtensionState {
    pub fn for_shape(shape: ExtensionShape) -> Self {
        match shape {
            ExtensionShape::None => ExtensionState::None,
            ExtensionShape::Nunchuk => ExtensionState::Nunchuk(TurboState::new()),
            ExtensionShape::Classic => ExtensionState::Classic(TurboState::new()),
            ExtensionShape::Pro => ExtensionState::Pro(TurboState::new()),
        }
    }

    pub fn shape(&self) -> ExtensionShape {
        match self {
            ExtensionState::None => ExtensionShape::None,
            ExtensionState::Nunchuk(_) => ExtensionShape::Nunchuk,
            ExtensionState::Classic(_) => ExtensionShape::Classic,
            ExtensionState::Pro(_) => ExtensionShape::Pro,
        }
    }

    pub fn turbo_count(&self) -> usize {
        match self {
            ExtensionState::None => 0,
            ExtensionState::Nunchuk(st) => st.turbo_count(),
            ExtensionState::Classic(st) => st.turbo_count(),
            ExtensionState::Pro(st) => st.turbo_count(),
        }
    }
}

/// Turbo state for one physical controller channel. `N` is the width of the
/// channel's core group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelState<const N: usize> {
    pub core: TurboState<N>,
    pub ext: ExtensionState,
    pub toggling: bool,
    /// Raw bits held when a chord fired that have no turbo state of their
    /// own (VPAD `TV`, `HOME`, stick clicks). Hidden until released.
    chord_core: u32,
    chord_ext: u32,
}

impl<const N: usize> Default for ChannelState<N> {
    fn default() -> Self {
        Self {
            core: TurboState::new(),
            ext: ExtensionState::None,
            toggling: false,
            chord_core: 0,
            chord_ext: 0,
        }
    }
}

impl<const N: usize> ChannelState<N> {
    /// Make the extension slot match `shape`.
    ///
    /// A different shape discards the old state outright; bits are never
    /// carried across shapes. Returns `true` when the slot was replaced.
    pub fn ensure_extension(&mut self, shape: ExtensionShape) -> bool {
        if self.ext.shape() == shape {
            return false;
        }
        self.ext = ExtensionState::for_shape(shape);
        self.chord_ext = 0;
        true
    }

    /// Raw core and extension bits still hidden after a chord.
    pub fn chord_suppressed(&self) -> (u32, u32) {
        (self.chord_core, self.chord_ext)
    }

    /// Number of turbo-armed buttons across the core and extension groups.
    pub fn turbo_count(&self) -> usize {
        self.core.turbo_count() + self.ext.turbo_count()
    }

    /// Combo matched: flip assignment mode, suppress everything held, and
    /// hide the whole sample from the game.
    pub fn flip_toggling(
        &mut self,
        core_group: &ButtonGroup<N>,
        real: &Edges,
        out: &mut Edges,
    ) -> Notice {
        self.toggling = !self.toggling;

        if let Some(core) = &real.core {
            self.core.suppress_held(core_group, core.hold);
            self.chord_core |= core.hold & !core_group.mask();
        }
        match (&mut self.ext, &real.ext) {
            (ExtensionState::Nunchuk(st), Some(ExtLevels::Nunchuk(l))) => {
                st.suppress_held(&nunchuk::GROUP, l.hold);
                self.chord_ext |= l.hold & !nunchuk::GROUP.mask();
            }
            (ExtensionState::Classic(st), Some(ExtLevels::Classic(l))) => {
                st.suppress_held(&classic::GROUP, l.hold);
                self.chord_ext |= l.hold & !classic::GROUP.mask();
            }
            (ExtensionState::Pro(st), Some(ExtLevels::Pro(l))) => {
                st.suppress_held(&pro::GROUP, l.hold);
                self.chord_ext |= l.hold & !pro::GROUP.mask();
            }
            _ => {}
        }

        out.clear();
        Notice::Toggling(self.toggling)
    }

    /// Run the per-button transition over the core group and the active
    /// extension group.
    ///
    /// `real` and `out` must carry the same groups as the channel state;
    /// anything else is a [`TurboError::ShapeMismatch`] and nothing is
    /// mutated.
    pub fn run_turbo(
        &mut self,
        core_group: &ButtonGroup<N>,
        real: &Edges,
        out: &mut Edges,
        period: u8,
    ) -> Result<Vec<Notice>, TurboError> {
        if period == 0 {
            return Err(TurboError::InvalidPeriod);
        }

        let expected = self.ext.shape();
        if real.ext_shape() != expected || out.ext_shape() != expected {
            return Err(TurboError::ShapeMismatch {
                expected,
                reported: real.ext_shape(),
            });
        }

        if let (Some(r), Some(o)) = (&real.core, &mut out.core) {
            self.chord_core = hide_chord(self.chord_core, r, o);
        }
        if let (Some(r), Some(o)) = (&real.ext, &mut out.ext) {
            self.chord_ext = hide_chord(self.chord_ext, r.levels(), o.levels_mut());
        }

        let mut changes = Vec::new();

        if let (Some(real_core), Some(out_core)) = (&real.core, &mut out.core) {
            changes.extend(self.core.run(
                core_group,
                real_core,
                out_core,
                &mut self.toggling,
                period,
            ));
        }

        let toggling = &mut self.toggling;
        match (&mut self.ext, &real.ext, &mut out.ext) {
            (
                ExtensionState::Nunchuk(st),
                Some(ExtLevels::Nunchuk(r)),
                Some(ExtLevels::Nunchuk(o)),
            ) => changes.extend(st.run(&nunchuk::GROUP, r, o, toggling, period)),
            (
                ExtensionState::Classic(st),
                Some(ExtLevels::Classic(r)),
                Some(ExtLevels::Classic(o)),
            ) => changes.extend(st.run(&classic::GROUP, r, o, toggling, period)),
            (ExtensionState::Pro(st), Some(ExtLevels::Pro(r)), Some(ExtLevels::Pro(o))) => {
                changes.extend(st.run(&pro::GROUP, r, o, toggling, period))
            }
            _ => {}
        }

        Ok(changes.into_iter().map(Notice::Turbo).collect())
    }
}

/// Hide the chord bits in `mask` from `out`. Returns the bits that stay
/// hidden next step: those still held without a release edge.
fn hide_chord(mask: u32, real: &Levels, out: &mut Levels) -> u32 {
    if mask == 0 {
        return 0;
    }
    out.hold &= !mask;
    out.trigger &= !mask;
    out.release &= !mask;
    mask & real.hold & !real.release
}
