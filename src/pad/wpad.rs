//! Wii Remote family (WPAD) poll interceptor.
//!
//! `WPADRead` fills one status struct per call. Its layout depends on the
//! attached extension, so every status is first decoded into a
//! [`WpadSample`] tagged with the extension shape; button logic only ever
//! sees the decoded value.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::buttons::{classic, nunchuk, pro, remote, ExtensionShape};
use crate::combo::{chord_triggered, Combo};
use crate::config::{self, SharedConfig};
use crate::edge::{tick_is_newer, EdgeTracker, Edges, ExtLevels, Levels};
use crate::engine::{ChannelState, Notice};
use crate::error::TurboError;
use crate::notify::{self, Notifier};

pub const MAX_WPADS: usize = 7;

pub type WpadChannel = ChannelState<{ remote::WIDTH }>;

/// Extension type codes as reported in `WPADStatus::extensionType`.
pub mod ext_type {
    pub const CORE: u8 = 0;
    pub const NUNCHUK: u8 = 1;
    pub const CLASSIC: u8 = 2;
    pub const MPLUS: u8 = 5;
    pub const MPLUS_NUNCHUK: u8 = 6;
    pub const MPLUS_CLASSIC: u8 = 7;
    pub const PRO_CONTROLLER: u8 = 31;
}

/// Raw WPAD status, reduced to the fields the interceptor touches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WpadStatus {
    pub tick: u32,
    pub extension_type: u8,
    /// Nonzero when the read failed.
    pub error: i8,
    /// Remote buttons. Nunchuk Z/C share this word.
    pub buttons: u32,
    /// Classic or Pro Controller buttons.
    pub ext_buttons: u32,
}

/// Extension buttons, masked to the named buttons of their catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtButtons {
    #[default]
    None,
    Nunchuk(u32),
    Classic(u32),
    Pro(u32),
}

impl ExtButtons {
    pub fn shape(&self) -> ExtensionShape {
        match self {
            ExtButtons::None => ExtensionShape::None,
            ExtButtons::Nunchuk(_) => ExtensionShape::Nunchuk,
            ExtButtons::Classic(_) => ExtensionShape::Classic,
            ExtButtons::Pro(_) => ExtensionShape::Pro,
        }
    }

    pub fn hold(&self) -> u32 {
        match *self {
            ExtButtons::None => 0,
            ExtButtons::Nunchuk(b) | ExtButtons::Classic(b) | ExtButtons::Pro(b) => b,
        }
    }
}

/// A decoded WPAD status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WpadSample {
    pub tick: u32,
    /// Remote buttons; absent on the Pro Controller.
    pub remote: Option<u32>,
    pub ext: ExtButtons,
}

impl TryFrom<&WpadStatus> for WpadSample {
    type Error = TurboError;

    fn try_from(status: &WpadStatus) -> Result<Self, Self::Error> {
        let core = status.buttons & remote::NAMED_MASK;
        let (remote, ext) = match status.extension_type {
            ext_type::CORE | ext_type::MPLUS => (Some(core), ExtButtons::None),
            ext_type::NUNCHUK | ext_type::MPLUS_NUNCHUK => (
                Some(core),
                ExtButtons::Nunchuk(status.buttons & nunchuk::NAMED_MASK),
            ),
            ext_type::CLASSIC | ext_type::MPLUS_CLASSIC => (
                Some(core),
                ExtButtons::Classic(status.ext_buttons & classic::NAMED_MASK),
            ),
            ext_type::PRO_CONTROLLER => {
                (None, ExtButtons::Pro(status.ext_buttons & pro::NAMED_MASK))
            }
            other => return Err(TurboError::UnknownExtension(other)),
        };
        Ok(Self {
            tick: status.tick,
            remote,
            ext,
        })
    }
}

/// Replace the bits of `word` under `mask` with those of `bits`.
fn merge(word: u32, mask: u32, bits: u32) -> u32 {
    (word & !mask) | (bits & mask)
}

/// Write emitted levels back into a raw status.
///
/// WPAD carries levels only, so just `hold` is written. Bits outside the
/// named buttons of each group are left as read.
fn write_back(status: &mut WpadStatus, out: &Edges) {
    if let Some(core) = &out.core {
        status.buttons = merge(status.buttons, remote::NAMED_MASK, core.hold);
    }
    match &out.ext {
        Some(ExtLevels::Nunchuk(l)) => {
            status.buttons = merge(status.buttons, nunchuk::NAMED_MASK, l.hold)
        }
        Some(ExtLevels::Classic(l)) => {
            status.ext_buttons = merge(status.ext_buttons, classic::NAMED_MASK, l.hold)
        }
        Some(ExtLevels::Pro(l)) => {
            status.ext_buttons = merge(status.ext_buttons, pro::NAMED_MASK, l.hold)
        }
        None => {}
    }
}

/// The real Wii Remote driver.
pub trait WpadHost {
    /// The unpatched `WPADRead`.
    fn read(&mut self, channel: u32, status: Option<&mut WpadStatus>);
}

#[derive(Debug, Clone, Copy, Default)]
struct History {
    last_tick: Option<u32>,
    core: Option<Levels>,
    ext: Option<ExtLevels>,
}

/// Default Wii Remote edge tracker. Extension history is dropped whenever
/// the extension shape changes.
#[derive(Debug, Default)]
pub struct WpadTracker {
    channels: [History; MAX_WPADS],
}

impl WpadTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EdgeTracker for WpadTracker {
    type Sample = WpadSample;

    fn update(&mut self, channel: usize, sample: &WpadSample) -> Option<Edges> {
        let h = self.channels.get_mut(channel)?;
        if let Some(last) = h.last_tick {
            if !tick_is_newer(sample.tick, last) {
                return None;
            }
        }
        h.last_tick = Some(sample.tick);

        let prev_core = h.core.map_or(0, |l| l.hold);
        h.core = sample.remote.map(|hold| Levels::advance(prev_core, hold));

        let prev_ext = h
            .ext
            .filter(|l| l.shape() == sample.ext.shape())
            .map_or(0, |l| l.levels().hold);
        let levels = Levels::advance(prev_ext, sample.ext.hold());
        h.ext = match sample.ext {
            ExtButtons::None => None,
            ExtButtons::Nunchuk(_) => Some(ExtLevels::Nunchuk(levels)),
            ExtButtons::Classic(_) => Some(ExtLevels::Classic(levels)),
            ExtButtons::Pro(_) => Some(ExtLevels::Pro(levels)),
        };

        Some(Edges {
            core: h.core,
            ext: h.ext,
        })
    }

    fn triggered(&self, channel: usize, combo: &Combo) -> bool {
        let Some(h) = self.channels.get(channel) else {
            return false;
        };
        match (combo, &h.core, &h.ext) {
            (Combo::Remote(bits), Some(core), _) => chord_triggered(&[(*bits, core)]),
            (Combo::Nunchuk { remote, nunchuk }, Some(core), Some(ExtLevels::Nunchuk(ext))) => {
                chord_triggered(&[(*remote, core), (*nunchuk, ext)])
            }
            (Combo::Classic { remote, classic }, Some(core), Some(ExtLevels::Classic(ext))) => {
                chord_triggered(&[(*remote, core), (*classic, ext)])
            }
            (Combo::Pro(bits), _, Some(ExtLevels::Pro(ext))) => chord_triggered(&[(*bits, ext)]),
            _ => false,
        }
    }

    fn reset(&mut self) {
        self.channels = Default::default();
    }
}

/// Replacement for `WPADRead`.
pub struct WpadInterceptor<T = WpadTracker> {
    channels: [WpadChannel; MAX_WPADS],
    tracker: T,
    config: SharedConfig,
    notifier: Arc<dyn Notifier>,
}

impl WpadInterceptor {
    pub fn new(config: SharedConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_tracker(WpadTracker::new(), config, notifier)
    }
}

impl<T: EdgeTracker<Sample = WpadSample>> WpadInterceptor<T> {
    pub fn with_tracker(tracker: T, config: SharedConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            channels: Default::default(),
            tracker,
            config,
            notifier,
        }
    }

    pub fn channel(&self, channel: usize) -> Option<&WpadChannel> {
        self.channels.get(channel)
    }

    pub fn channel_mut(&mut self, channel: usize) -> Option<&mut WpadChannel> {
        self.channels.get_mut(channel)
    }

    /// Zero every channel (extension slots included) and forget tracker history.
    pub fn reset(&mut self) {
        self.channels = Default::default();
        self.tracker.reset();
    }

    /// Patched `WPADRead`: calls the real driver, then rewrites the status.
    pub fn read<H: WpadHost>(&mut self, host: &mut H, channel: u32, mut status: Option<&mut WpadStatus>) {
        host.read(channel, status.as_deref_mut());

        let Some(status) = status else {
            return;
        };
        let ch = channel as usize;
        if ch >= MAX_WPADS || status.error != 0 {
            return;
        }

        let shared = Arc::clone(&self.config);
        let cfg = config::read(&shared);
        if !cfg.enabled {
            return;
        }

        match self.rewrite(ch, status, cfg.period, &cfg.combos) {
            Ok((rewritten, notices)) => {
                *status = rewritten;
                for notice in notices {
                    self.report(ch, notice);
                }
            }
            Err(e) => warn!("[WPAD] wpad {ch}: {e}; status left untouched"),
        }
    }

    fn rewrite(
        &mut self,
        ch: usize,
        real: &WpadStatus,
        period: u8,
        combos: &[Combo],
    ) -> Result<(WpadStatus, Vec<Notice>), TurboError> {
        let mut status = *real;
        let sample = WpadSample::try_from(real)?;

        // A repeated status is not a new poll step and mutates nothing.
        let Some(edges) = self.tracker.update(ch, &sample) else {
            return Ok((status, Vec::new()));
        };
        let Some(pad) = self.channels.get_mut(ch) else {
            return Ok((status, Vec::new()));
        };
        let shape = sample.ext.shape();
        if pad.ensure_extension(shape) {
            debug!("[WPAD] wpad {ch} extension is now {shape}, turbo state reset");
        }

        let mut out = edges;

        let tracker = &self.tracker;
        let notices = if combos.iter().any(|c| tracker.triggered(ch, c)) {
            vec![pad.flip_toggling(&remote::GROUP, &edges, &mut out)]
        } else {
            pad.run_turbo(&remote::GROUP, &edges, &mut out, period)?
        };

        write_back(&mut status, &out);
        Ok((status, notices))
    }

    fn report(&self, ch: usize, notice: Notice) {
        match notice {
            Notice::Toggling(active) => {
                debug!("[WPAD] wpad {ch} assignment mode {}", if active { "on" } else { "off" });
                notify::send(self.notifier.as_ref(), notify::toggling_message(active));
            }
            Notice::Turbo(change) => {
                let state = if change.enabled { "turbo" } else { "normal" };
                info!("[WPAD] wpad {ch} button {} = {state}", change.button.name);
                notify::send(
                    self.notifier.as_ref(),
                    &notify::turbo_message(&change.button, change.enabled),
                );
            }
        }
    }
}
