//! Wii U GamePad (VPAD) poll interceptor.
//!
//! `VPADRead` fills a caller buffer with up to `count` samples, newest at
//! index 0. In tight (buffered) mode every returned slot is a distinct
//! hardware sample, possibly overlapping the previous call; in loose mode
//! the slots all carry the same sample.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::buttons::vpad;
use crate::combo::{chord_triggered, Combo};
use crate::config::{self, SharedConfig};
use crate::edge::{tick_is_newer, EdgeTracker, Edges, Levels};
use crate::engine::{ChannelState, Notice};
use crate::error::TurboError;
use crate::notify::{self, Notifier};

pub const MAX_VPADS: usize = 2;

pub type VpadChannel = ChannelState<{ vpad::WIDTH }>;

/// One GamePad sample, reduced to the fields the interceptor touches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VpadStatus {
    /// Hardware sample counter.
    pub tick: u32,
    pub hold: u32,
    pub trigger: u32,
    pub release: u32,
}

impl VpadStatus {
    fn levels(&self) -> Levels {
        Levels {
            hold: self.hold,
            trigger: self.trigger,
            release: self.release,
        }
    }

    fn set_levels(&mut self, levels: &Levels) {
        self.hold = levels.hold;
        self.trigger = levels.trigger;
        self.release = levels.release;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VpadReadError {
    #[default]
    Success,
    NoSamples,
    InvalidController,
    Busy,
    Uninitialized,
}

impl VpadReadError {
    pub fn is_error(self) -> bool {
        self != VpadReadError::Success
    }
}

/// Button processing mode of a channel (`VPADGetButtonProcMode`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// One authoritative sample replicated across the returned slots.
    #[default]
    Loose,
    /// Every returned slot is its own buffered sample.
    Tight,
}

/// The real GamePad driver.
pub trait VpadHost {
    /// The unpatched `VPADRead`. Returns the number of samples written.
    fn read(
        &mut self,
        channel: u32,
        buf: Option<&mut [VpadStatus]>,
        error: Option<&mut VpadReadError>,
    ) -> i32;

    fn sampling_mode(&self, channel: u32) -> SamplingMode;
}

#[derive(Debug, Clone, Copy, Default)]
struct History {
    last_tick: Option<u32>,
    levels: Levels,
}

/// Default GamePad edge tracker.
#[derive(Debug, Default)]
pub struct VpadTracker {
    channels: [History; MAX_VPADS],
}

impl VpadTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EdgeTracker for VpadTracker {
    type Sample = VpadStatus;

    fn update(&mut self, channel: usize, sample: &VpadStatus) -> Option<Edges> {
        let h = self.channels.get_mut(channel)?;
        if let Some(last) = h.last_tick {
            if !tick_is_newer(sample.tick, last) {
                return None;
            }
        }
        h.last_tick = Some(sample.tick);
        h.levels = Levels::advance(h.levels.hold, sample.hold);
        Some(Edges {
            core: Some(h.levels),
            ext: None,
        })
    }

    fn triggered(&self, channel: usize, combo: &Combo) -> bool {
        match (self.channels.get(channel), combo) {
            (Some(h), Combo::Vpad(bits)) => chord_triggered(&[(*bits, &h.levels)]),
            _ => false,
        }
    }

    fn reset(&mut self) {
        self.channels = Default::default();
    }
}

/// Replacement for `VPADRead`.
pub struct VpadInterceptor<T = VpadTracker> {
    channels: [VpadChannel; MAX_VPADS],
    tracker: T,
    config: SharedConfig,
    notifier: Arc<dyn Notifier>,
}

impl VpadInterceptor {
    pub fn new(config: SharedConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_tracker(VpadTracker::new(), config, notifier)
    }
}

impl<T: EdgeTracker<Sample = VpadStatus>> VpadInterceptor<T> {
    pub fn with_tracker(tracker: T, config: SharedConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            channels: Default::default(),
            tracker,
            config,
            notifier,
        }
    }

    pub fn channel(&self, channel: usize) -> Option<&VpadChannel> {
        self.channels.get(channel)
    }

    pub fn channel_mut(&mut self, channel: usize) -> Option<&mut VpadChannel> {
        self.channels.get_mut(channel)
    }

    /// Zero every channel and forget tracker history.
    pub fn reset(&mut self) {
        self.channels = Default::default();
        self.tracker.reset();
    }

    /// Patched `VPADRead`: calls the real driver, then rewrites the samples.
    ///
    /// The real result is returned untouched when turbo is disabled, the
    /// driver reported an error or no samples, the buffer is absent or the
    /// channel is out of range.
    pub fn read<H: VpadHost>(
        &mut self,
        host: &mut H,
        channel: u32,
        mut buf: Option<&mut [VpadStatus]>,
        mut error: Option<&mut VpadReadError>,
    ) -> i32 {
        let result = host.read(channel, buf.as_deref_mut(), error.as_deref_mut());

        if error.as_deref().is_some_and(|e| e.is_error()) || result <= 0 {
            return result;
        }
        let Some(buf) = buf else {
            return result;
        };
        let ch = channel as usize;
        if ch >= MAX_VPADS {
            return result;
        }

        let shared = Arc::clone(&self.config);
        let cfg = config::read(&shared);
        if !cfg.enabled {
            return result;
        }

        let count = (result as usize).min(buf.len());
        match host.sampling_mode(channel) {
            SamplingMode::Tight => {
                // Oldest sample first.
                for status in buf[..count].iter_mut().rev() {
                    self.process_slot(ch, status, cfg.period, &cfg.combos);
                }
            }
            SamplingMode::Loose => {
                if let Some((first, rest)) = buf[..count].split_first_mut() {
                    if self.process_slot(ch, first, cfg.period, &cfg.combos) {
                        // Present one coherent state across every slot.
                        let levels = first.levels();
                        for status in rest {
                            status.set_levels(&levels);
                        }
                    }
                }
            }
        }

        result
    }

    /// Rewrite one slot. Returns whether the slot was a new poll step and was
    /// rewritten; a repeated or failed slot keeps the real sample.
    fn process_slot(
        &mut self,
        ch: usize,
        status: &mut VpadStatus,
        period: u8,
        combos: &[Combo],
    ) -> bool {
        match self.rewrite(ch, status, period, combos) {
            Ok(Some((rewritten, notices))) => {
                *status = rewritten;
                for notice in notices {
                    self.report(ch, notice);
                }
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("[VPAD] vpad {ch}: {e}; sample left untouched");
                false
            }
        }
    }

    fn rewrite(
        &mut self,
        ch: usize,
        real: &VpadStatus,
        period: u8,
        combos: &[Combo],
    ) -> Result<Option<(VpadStatus, Vec<Notice>)>, TurboError> {
        let mut status = *real;
        let Some(edges) = self.tracker.update(ch, real) else {
            return Ok(None);
        };
        let Some(pad) = self.channels.get_mut(ch) else {
            return Ok(None);
        };

        let mut out = Edges {
            core: Some(real.levels()),
            ext: None,
        };

        let tracker = &self.tracker;
        let notices = if combos.iter().any(|c| tracker.triggered(ch, c)) {
            vec![pad.flip_toggling(&vpad::GROUP, &edges, &mut out)]
        } else {
            pad.run_turbo(&vpad::GROUP, &edges, &mut out, period)?
        };

        status.set_levels(&out.core.unwrap_or_default());
        Ok(Some((status, notices)))
    }

    fn report(&self, ch: usize, notice: Notice) {
        match notice {
            Notice::Toggling(active) => {
                debug!("[VPAD] vpad {ch} assignment mode {}", if active { "on" } else { "off" });
                notify::send(self.notifier.as_ref(), notify::toggling_message(active));
            }
            Notice::Turbo(change) => {
                let state = if change.enabled { "turbo" } else { "normal" };
                info!("[VPAD] vpad {ch} button {} = {state}", change.button.name);
                notify::send(
                    self.notifier.as_ref(),
                    &notify::turbo_message(&change.button, change.enabled),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TurboConfig;
    use crate::notify::MemoryNotifier;

    const TV_ZL: u32 = vpad::TV.mask | vpad::ZL.mask;

    /// Scripted GamePad: every read returns the next queued batch.
    struct FakePad {
        mode: SamplingMode,
        batches: Vec<(Vec<VpadStatus>, VpadReadError)>,
        reads: usize,
    }

    impl FakePad {
        fn new(mode: SamplingMode) -> Self {
            Self {
                mode,
                batches: Vec::new(),
                reads: 0,
            }
        }
    }

    impl VpadHost for FakePad {
        fn read(
            &mut self,
            _channel: u32,
            buf: Option<&mut [VpadStatus]>,
            error: Option<&mut VpadReadError>,
        ) -> i32 {
            self.reads += 1;
            let (samples, err) = self.batches.remove(0);
            if let Some(e) = error {
                *e = err;
            }
            if err.is_error() {
                return 0;
            }
            match buf {
                Some(buf) => {
                    let n = samples.len().min(buf.len());
                    buf[..n].copy_from_slice(&samples[..n]);
                    n as i32
                }
                None => samples.len() as i32,
            }
        }

        fn sampling_mode(&self, _channel: u32) -> SamplingMode {
            self.mode
        }
    }

    struct Rig {
        pad: FakePad,
        icpt: VpadInterceptor,
        cfg: SharedConfig,
        notes: Arc<MemoryNotifier>,
        tick: u32,
        prev_hold: u32,
    }

    impl Rig {
        fn new(period: u8) -> Self {
            let cfg = config::shared(TurboConfig {
                enabled: true,
                period,
                combos: vec![Combo::default_toggle()],
            });
            let notes = Arc::new(MemoryNotifier::new());
            Self {
                pad: FakePad::new(SamplingMode::Loose),
                icpt: VpadInterceptor::new(cfg.clone(), notes.clone()),
                cfg,
                notes,
                tick: 0,
                prev_hold: 0,
            }
        }

        fn sample(&mut self, hold: u32) -> VpadStatus {
            self.tick += 1;
            let l = Levels::advance(self.prev_hold, hold);
            self.prev_hold = hold;
            VpadStatus {
                tick: self.tick,
                hold: l.hold,
                trigger: l.trigger,
                release: l.release,
            }
        }

        /// One loose-mode poll of a single slot on channel 0.
        fn poll(&mut self, hold: u32) -> VpadStatus {
            let s = self.sample(hold);
            self.pad.batches.push((vec![s], VpadReadError::Success));
            let mut buf = [VpadStatus::default(); 1];
            let mut err = VpadReadError::Success;
            let n = self.icpt.read(&mut self.pad, 0, Some(&mut buf[..]), Some(&mut err));
            assert_eq!(n, 1);
            buf[0]
        }
    }

    fn a_index() -> usize {
        vpad::GROUP.index_of("A").unwrap()
    }

    #[test]
    fn test_disabled_is_bit_identical() {
        let mut rig = Rig::new(1);
        rig.cfg.write().unwrap().enabled = false;
        rig.icpt.channel_mut(0).unwrap().core.set_turbo(a_index(), true);

        for hold in [TV_ZL, TV_ZL, vpad::A.mask, vpad::A.mask, 0] {
            let s = rig.sample(hold);
            rig.pad.batches.push((vec![s], VpadReadError::Success));
            let mut buf = [VpadStatus::default(); 1];
            rig.icpt.read(&mut rig.pad, 0, Some(&mut buf[..]), None);
            assert_eq!(buf[0], s);
        }
        assert!(!rig.icpt.channel(0).unwrap().toggling);
        assert!(rig.notes.take().is_empty());
    }

    #[test]
    fn test_real_read_always_happens() {
        let mut rig = Rig::new(1);
        rig.cfg.write().unwrap().enabled = false;
        rig.pad.batches.push((vec![], VpadReadError::NoSamples));
        let mut err = VpadReadError::Success;
        let n = rig.icpt.read(&mut rig.pad, 0, None, Some(&mut err));
        assert_eq!(n, 0);
        assert_eq!(err, VpadReadError::NoSamples);
        assert_eq!(rig.pad.reads, 1);
    }

    #[test]
    fn test_error_and_bad_channel_pass_through() {
        let mut rig = Rig::new(1);
        rig.icpt.channel_mut(0).unwrap().core.set_turbo(a_index(), true);

        // Driver error.
        let s = rig.sample(vpad::A.mask);
        rig.pad.batches.push((vec![s], VpadReadError::InvalidController));
        let mut buf = [s; 1];
        let mut err = VpadReadError::Success;
        rig.icpt.read(&mut rig.pad, 0, Some(&mut buf[..]), Some(&mut err));
        assert_eq!(buf[0], s);

        // Out of range channel.
        rig.pad.batches.push((vec![s], VpadReadError::Success));
        let mut buf = [VpadStatus::default(); 1];
        rig.icpt.read(&mut rig.pad, 7, Some(&mut buf[..]), None);
        assert_eq!(buf[0], s);

        // No buffer.
        rig.pad.batches.push((vec![s], VpadReadError::Success));
        assert_eq!(rig.icpt.read(&mut rig.pad, 0, None, None), 1);
    }

    #[test]
    fn test_turbo_period_three() {
        let mut rig = Rig::new(3);
        rig.icpt.channel_mut(0).unwrap().core.set_turbo(a_index(), true);
        let a = vpad::A.mask;

        let out: Vec<VpadStatus> = (0..6).map(|_| rig.poll(a)).collect();
        assert_eq!(out[1].trigger & a, 0);
        assert_eq!(out[2].trigger & a, a, "synthetic press on tick 3");
        assert_eq!(out[3].hold & a, a);
        assert_eq!(out[5].release & a, a, "synthetic release on tick 6");
        assert_eq!(out[5].hold & a, 0);
    }

    #[test]
    fn test_other_buttons_pass_through_while_turbo_runs() {
        let mut rig = Rig::new(1);
        rig.icpt.channel_mut(0).unwrap().core.set_turbo(a_index(), true);
        let b = vpad::B.mask;

        for hold in [b, b | vpad::A.mask, b | vpad::A.mask, vpad::HOME.mask, 0] {
            let out = rig.poll(hold);
            assert_eq!(out.hold & !vpad::A.mask, hold & !vpad::A.mask);
        }
    }

    #[test]
    fn test_combo_then_assign_button() {
        let mut rig = Rig::new(1);
        let a = vpad::A.mask;

        // Chord: ZL then TV. The completing press toggles assignment mode.
        let out = rig.poll(vpad::ZL.mask);
        assert_eq!(out.hold, vpad::ZL.mask);
        let out = rig.poll(TV_ZL);
        assert_eq!(out, VpadStatus { tick: out.tick, ..Default::default() });
        assert!(rig.icpt.channel(0).unwrap().toggling);

        // Releasing the chord never reaches the game.
        let out = rig.poll(0);
        assert_eq!((out.hold, out.trigger, out.release), (0, 0, 0));

        // Next pressed button gets turbo and its press is hidden.
        let out = rig.poll(a);
        assert_eq!(out.hold & a, 0);
        let ch = rig.icpt.channel(0).unwrap();
        assert!(!ch.toggling);
        assert!(ch.core.is_turbo(a_index()));

        // Still held: suppressed; released: suppression ends quietly.
        assert_eq!(rig.poll(a).hold & a, 0);
        assert_eq!(rig.poll(0).release & a, 0);
        assert!(!rig.icpt.channel(0).unwrap().core.is_suppressed(a_index()));

        // Now A is turbo: period 1 flips on the first held tick.
        let out = rig.poll(a);
        assert_eq!(out.trigger & a, a);
        let out = rig.poll(a);
        assert_eq!(out.release & a, a);

        let notes = rig.notes.take();
        assert_eq!(
            notes,
            vec![
                "[turbo-pad] Turbo assignment: press the buttons to toggle".to_string(),
                "[turbo-pad] A = turbo".to_string(),
            ]
        );
    }

    #[test]
    fn test_default_chord_release_is_invisible() {
        let mut rig = Rig::new(2);

        rig.poll(vpad::ZL.mask);
        rig.poll(TV_ZL);
        // ZL let go first, TV still held, then TV let go.
        for hold in [vpad::TV.mask, 0] {
            let out = rig.poll(hold);
            assert_eq!((out.hold, out.trigger, out.release), (0, 0, 0));
        }
        assert_eq!(rig.icpt.channel(0).unwrap().chord_suppressed(), (0, 0));

        // TV works normally afterwards.
        let out = rig.poll(vpad::TV.mask);
        assert_eq!(out.trigger, vpad::TV.mask);
    }

    #[test]
    fn test_loose_repeat_leaves_every_slot_alone() {
        let mut rig = Rig::new(1);
        rig.icpt.channel_mut(0).unwrap().core.set_turbo(a_index(), true);
        rig.poll(vpad::A.mask);

        // Slot 0 repeats the sample just processed.
        let repeat = VpadStatus {
            tick: rig.tick,
            hold: vpad::A.mask,
            ..Default::default()
        };
        let other = VpadStatus {
            tick: rig.tick,
            hold: vpad::B.mask,
            ..Default::default()
        };
        rig.pad.batches.push((vec![repeat, other], VpadReadError::Success));
        let mut buf = [VpadStatus::default(); 2];
        rig.icpt.read(&mut rig.pad, 0, Some(&mut buf[..]), None);
        assert_eq!(buf, [repeat, other]);
    }

    #[test]
    fn test_combo_suppresses_other_held_buttons() {
        let mut rig = Rig::new(1);
        let b = vpad::B.mask;
        rig.poll(b | vpad::ZL.mask);
        let out = rig.poll(b | TV_ZL);
        assert_eq!(out.hold, 0);
        assert!(rig.icpt.channel(0).unwrap().core.is_suppressed(1));

        // B stays hidden while held even though assignment mode is on and
        // nothing has been committed.
        assert_eq!(rig.poll(b).hold & b, 0);
        assert!(rig.icpt.channel(0).unwrap().toggling);
    }

    #[test]
    fn test_tight_mode_processes_oldest_first_and_skips_seen() {
        let mut rig = Rig::new(1);
        rig.pad.mode = SamplingMode::Tight;
        rig.icpt.channel_mut(0).unwrap().core.set_turbo(a_index(), true);
        let a = vpad::A.mask;

        let s1 = rig.sample(a);
        let s2 = rig.sample(a);
        let s3 = rig.sample(a);
        // Newest first, as the driver reports them.
        rig.pad.batches.push((vec![s3, s2, s1], VpadReadError::Success));
        let mut buf = [VpadStatus::default(); 3];
        rig.icpt.read(&mut rig.pad, 0, Some(&mut buf[..]), None);
        assert_eq!(buf[2].trigger & a, a); // s1: press
        assert_eq!(buf[1].release & a, a); // s2: release
        assert_eq!(buf[0].trigger & a, a); // s3: press

        // s3 is reported again alongside a new sample: the repeat is left alone.
        let s4 = rig.sample(a);
        rig.pad.batches.push((vec![s4, s3], VpadReadError::Success));
        let mut buf = [VpadStatus::default(); 2];
        rig.icpt.read(&mut rig.pad, 0, Some(&mut buf[..]), None);
        assert_eq!(buf[1], s3);
        assert_eq!(buf[0].release & a, a);
    }

    #[test]
    fn test_loose_mode_replicates_slot_zero() {
        let mut rig = Rig::new(1);
        rig.icpt.channel_mut(0).unwrap().core.set_turbo(a_index(), true);
        let s = rig.sample(vpad::A.mask | vpad::B.mask);
        let mut stale = s;
        stale.hold = vpad::X.mask;
        rig.pad.batches.push((vec![s, stale, stale], VpadReadError::Success));
        let mut buf = [VpadStatus::default(); 3];
        rig.icpt.read(&mut rig.pad, 0, Some(&mut buf[..]), None);

        assert_eq!(buf[0].trigger & vpad::A.mask, vpad::A.mask);
        for slot in &buf[1..] {
            assert_eq!(slot.hold, buf[0].hold);
            assert_eq!(slot.trigger, buf[0].trigger);
            assert_eq!(slot.release, buf[0].release);
        }
    }

    #[test]
    fn test_zero_period_leaves_sample_untouched() {
        let mut rig = Rig::new(1);
        rig.icpt.channel_mut(0).unwrap().core.set_turbo(a_index(), true);
        rig.cfg.write().unwrap().period = 0;
        let s = rig.sample(vpad::A.mask);
        rig.pad.batches.push((vec![s], VpadReadError::Success));
        let mut buf = [VpadStatus::default(); 1];
        rig.icpt.read(&mut rig.pad, 0, Some(&mut buf[..]), None);
        assert_eq!(buf[0], s);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut rig = Rig::new(1);
        rig.poll(vpad::ZL.mask);
        rig.poll(TV_ZL);
        rig.icpt.channel_mut(1).unwrap().core.set_turbo(3, true);

        rig.icpt.reset();
        let once: Vec<VpadChannel> = (0..MAX_VPADS)
            .map(|c| rig.icpt.channel(c).unwrap().clone())
            .collect();
        rig.icpt.reset();
        for (c, state) in once.iter().enumerate() {
            assert_eq!(rig.icpt.channel(c).unwrap(), state);
            assert_eq!(state, &VpadChannel::default());
        }
    }

    #[test]
    fn test_tracker_triggers_only_vpad_combos() {
        let mut t = VpadTracker::new();
        let s = VpadStatus {
            tick: 1,
            hold: TV_ZL,
            ..Default::default()
        };
        assert!(t.update(0, &s).is_some());
        assert!(t.triggered(0, &Combo::default_toggle()));
        assert!(!t.triggered(0, &Combo::Remote(0x1)));
        assert!(!t.triggered(1, &Combo::default_toggle()));
        assert!(t.update(0, &s).is_none(), "same tick is not a new step");
        assert!(t.update(MAX_VPADS, &s).is_none());
    }
}
