//! Per-button turbo state machine.
//!
//! For every button index of a group the machine is in one of:
//!   Idle        turbo off, not suppressed
//!   Armed-Low   turbo on, not currently faking a press
//!   Armed-High  turbo on, currently faking a press
//!   Suppressed  real signal hidden until the real button is released
//!
//! [`TurboState::step`] is the only transition function. It runs once per
//! poll step per button and rewrites that button's bits in the outgoing
//! levels.

use crate::buttons::{Button, ButtonGroup};
use crate::edge::Levels;

/// Fixed-width set of button indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonBits(u32);

impl ButtonBits {
    /// Bit for `idx`; zero past the word width.
    fn bit(idx: usize) -> u32 {
        u32::try_from(idx)
            .ok()
            .and_then(|i| 1u32.checked_shl(i))
            .unwrap_or(0)
    }

    pub fn test(self, idx: usize) -> bool {
        self.0 & Self::bit(idx) != 0
    }

    pub fn set(&mut self, idx: usize) {
        self.0 |= Self::bit(idx);
    }

    pub fn reset(&mut self, idx: usize) {
        self.0 &= !Self::bit(idx);
    }

    pub fn assign(&mut self, idx: usize, val: bool) {
        if val {
            self.set(idx);
        } else {
            self.reset(idx);
        }
    }

    pub fn flip(&mut self, idx: usize) {
        self.0 ^= Self::bit(idx);
    }

    pub fn none(self) -> bool {
        self.0 == 0
    }

    pub fn count(self) -> usize {
        self.0.count_ones() as usize
    }
}

/// What a single transition did to its button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Real signal hidden; suppression may have ended this step.
    Suppressed,
    /// Toggle commit: turbo flag flipped, assignment mode ended.
    Committed { enabled: bool },
    /// Turbo button held, period not reached yet; real level passed.
    Charging,
    /// Turbo button flipped its synthetic level.
    Flipped { pressed: bool },
    /// No turbo action; real level passed.
    Passed,
}

/// A button whose turbo flag was flipped during assignment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurboChange {
    pub index: usize,
    pub button: Button,
    pub enabled: bool,
}

/// Turbo state for one button group on one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurboState<const N: usize> {
    turbo: ButtonBits,
    fake_hold: ButtonBits,
    suppressed: ButtonBits,
    age: [u8; N],
}

impl<const N: usize> Default for TurboState<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TurboState<N> {
    pub fn new() -> Self {
        Self {
            turbo: ButtonBits::default(),
            fake_hold: ButtonBits::default(),
            suppressed: ButtonBits::default(),
            age: [0; N],
        }
    }

    pub fn is_turbo(&self, idx: usize) -> bool {
        idx < N && self.turbo.test(idx)
    }

    pub fn set_turbo(&mut self, idx: usize, on: bool) {
        if idx < N {
            self.turbo.assign(idx, on);
        }
    }

    /// Number of buttons with turbo armed.
    pub fn turbo_count(&self) -> usize {
        self.turbo.count()
    }

    pub fn is_suppressed(&self, idx: usize) -> bool {
        idx < N && self.suppressed.test(idx)
    }

    pub fn fake_hold(&self, idx: usize) -> bool {
        idx < N && self.fake_hold.test(idx)
    }

    pub fn age(&self, idx: usize) -> u8 {
        self.age.get(idx).copied().unwrap_or(0)
    }

    /// Mark every button held in `hold` as suppressed.
    pub fn suppress_held(&mut self, group: &ButtonGroup<N>, hold: u32) {
        for (idx, btn) in group.buttons.iter().enumerate() {
            if hold & btn.mask != 0 {
                self.suppressed.set(idx);
            }
        }
    }

    /// Run one transition for button `idx` (raw bit `mask`).
    ///
    /// `real` carries the tracker's levels for this step, `out` the levels
    /// that will be emitted to the game. `toggling` is the channel-wide
    /// assignment flag; a commit clears it.
    ///
    /// A button that is not held has its `age` zeroed, so a turbo button that
    /// is let go mid-period starts the next press from zero and always gets
    /// its first synthetic press exactly `period` steps after the real one.
    /// An index outside the group is passed through.
    pub fn step(
        &mut self,
        idx: usize,
        mask: u32,
        real: &Levels,
        out: &mut Levels,
        toggling: &mut bool,
        period: u8,
    ) -> Step {
        if idx >= N {
            return Step::Passed;
        }
        let held = real.hold & mask != 0;

        if self.suppressed.test(idx) {
            if !held || real.release & mask != 0 {
                self.suppressed.reset(idx);
            }
            hide(out, mask);
            return Step::Suppressed;
        }

        if *toggling && real.trigger & mask != 0 {
            *toggling = false;
            self.turbo.flip(idx);
            hide(out, mask);
            self.fake_hold.reset(idx);
            // The commit press stays hidden until it is released.
            self.suppressed.set(idx);
            self.age[idx] = 0;
            return Step::Committed {
                enabled: self.turbo.test(idx),
            };
        }

        if self.turbo.test(idx) && held {
            self.age[idx] = self.age[idx].saturating_add(1);
            if self.age[idx] < period {
                return Step::Charging;
            }

            self.fake_hold.flip(idx);
            self.age[idx] = 0;

            let pressed = self.fake_hold.test(idx);
            if pressed {
                out.hold |= mask;
                out.trigger |= mask;
                out.release &= !mask;
            } else {
                out.hold &= !mask;
                out.trigger &= !mask;
                out.release |= mask;
            }
            return Step::Flipped { pressed };
        }

        self.fake_hold.assign(idx, held);
        if !held {
            self.age[idx] = 0;
        }
        Step::Passed
    }

    /// Run the transition over every button in `group`.
    ///
    /// Returns the buttons whose turbo flag was committed this step (at most
    /// one per call while assignment mode is active, since a commit ends it).
    pub fn run(
        &mut self,
        group: &ButtonGroup<N>,
        real: &Levels,
        out: &mut Levels,
        toggling: &mut bool,
        period: u8,
    ) -> Vec<TurboChange> {
        let mut changes = Vec::new();
        for (idx, btn) in group.buttons.iter().enumerate() {
            if let Step::Committed { enabled } =
                self.step(idx, btn.mask, real, out, toggling, period)
            {
                changes.push(TurboChange {
                    index: idx,
                    button: *btn,
                    enabled,
                });
            }
        }
        changes
    }
}

fn hide(out: &mut Levels, mask: u32) {
    out.hold &= !mask;
    out.trigger &= !mask;
    out.release &= !mask;
}
