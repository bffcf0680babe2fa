//! Poll trace replay.
//!
//! A trace is JSON lines, one event per line:
//!
//! ```text
//! {"kind":"vpad","channel":0,"mode":"tight","samples":[{"tick":3,"hold":32768}]}
//! {"kind":"wpad","channel":1,"status":{"tick":7,"extension_type":2,"ext_buttons":16}}
//! {"kind":"set_enabled","enabled":true}
//! {"kind":"reset"}
//! ```
//!
//! Each poll event is fed to the real-read side of a scripted host, run
//! through the plugin, and the rewritten result is reported.

use std::io::BufRead;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::notify::MemoryNotifier;
use crate::pad::{SamplingMode, VpadHost, VpadReadError, VpadStatus, WpadHost, WpadStatus};
use crate::plugin::Plugin;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEvent {
    Vpad {
        channel: u32,
        #[serde(default)]
        mode: SamplingMode,
        /// Newest first, as `VPADRead` reports them.
        #[serde(default)]
        samples: Vec<VpadStatus>,
        #[serde(default)]
        error: VpadReadError,
    },
    Wpad {
        channel: u32,
        status: WpadStatus,
    },
    /// Application end: clears every channel.
    Reset,
    SetEnabled {
        enabled: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceOutput {
    Vpad {
        channel: u32,
        result: i32,
        error: VpadReadError,
        samples: Vec<VpadStatus>,
    },
    Wpad {
        channel: u32,
        status: WpadStatus,
    },
    Notify {
        message: String,
    },
}

/// Host whose real reads return whatever was scripted for the current event.
#[derive(Debug, Default)]
pub struct ReplayHost {
    vpad_samples: Vec<VpadStatus>,
    vpad_error: VpadReadError,
    vpad_mode: SamplingMode,
    wpad_status: WpadStatus,
}

impl VpadHost for ReplayHost {
    fn read(
        &mut self,
        _channel: u32,
        buf: Option<&mut [VpadStatus]>,
        error: Option<&mut VpadReadError>,
    ) -> i32 {
        if let Some(e) = error {
            *e = self.vpad_error;
        }
        if self.vpad_error.is_error() {
            return 0;
        }
        let Some(buf) = buf else {
            return 0;
        };
        let n = self.vpad_samples.len().min(buf.len());
        buf[..n].copy_from_slice(&self.vpad_samples[..n]);
        n as i32
    }

    fn sampling_mode(&self, _channel: u32) -> SamplingMode {
        self.vpad_mode
    }
}

impl WpadHost for ReplayHost {
    fn read(&mut self, _channel: u32, status: Option<&mut WpadStatus>) {
        if let Some(s) = status {
            *s = self.wpad_status;
        }
    }
}

/// Parse a JSON-lines trace. Blank lines and `#` comments are skipped.
pub fn parse_trace<R: BufRead>(reader: R) -> anyhow::Result<Vec<TraceEvent>> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read trace line {}", idx + 1))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event = serde_json::from_str(line)
            .with_context(|| format!("Malformed trace event on line {}", idx + 1))?;
        events.push(event);
    }
    Ok(events)
}

/// Run `events` through `plugin`. Notifications delivered to `notes` are
/// reported right after the poll that caused them.
pub fn replay(
    plugin: &mut Plugin,
    notes: &MemoryNotifier,
    events: impl IntoIterator<Item = TraceEvent>,
) -> Vec<TraceOutput> {
    let mut host = ReplayHost::default();
    let mut outputs = Vec::new();

    for event in events {
        match event {
            TraceEvent::Vpad {
                channel,
                mode,
                samples,
                error,
            } => {
                let mut buf = vec![VpadStatus::default(); samples.len()];
                host.vpad_samples = samples;
                host.vpad_error = error;
                host.vpad_mode = mode;

                let mut error = VpadReadError::Success;
                let result = plugin
                    .vpad_mut()
                    .read(&mut host, channel, Some(&mut buf[..]), Some(&mut error));
                buf.truncate(result.max(0) as usize);
                outputs.push(TraceOutput::Vpad {
                    channel,
                    result,
                    error,
                    samples: buf,
                });
            }
            TraceEvent::Wpad { channel, status } => {
                host.wpad_status = status;
                let mut out = WpadStatus::default();
                plugin.wpad_mut().read(&mut host, channel, Some(&mut out));
                outputs.push(TraceOutput::Wpad {
                    channel,
                    status: out,
                });
            }
            TraceEvent::Reset => {
                debug!("[REPLAY] reset");
                plugin.on_application_end();
            }
            TraceEvent::SetEnabled { enabled } => plugin.set_enabled(enabled),
        }

        outputs.extend(
            notes
                .take()
                .into_iter()
                .map(|message| TraceOutput::Notify { message }),
        );
    }

    outputs
}
