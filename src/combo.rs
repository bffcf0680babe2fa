//! Toggle combos: button chords that enter or leave turbo assignment mode.
//!
//! A chord fires on the poll step where every one of its buttons is held and
//! at least one of them was just pressed. Holding the chord does not re-fire.
//!
//! In the settings file combos are stored by button name:
//!
//! ```json
//! { "vpad": ["TV", "ZL"] }
//! { "classic": { "remote": [], "classic": ["L", "R"] } }
//! ```

use serde::{Deserialize, Serialize};

use crate::buttons::{self, classic, nunchuk, pro, remote, vpad, Button};
use crate::edge::Levels;
use crate::error::ConfigError;

/// One configured chord. The variant names the device family (and extension)
/// the chord is read from; bits use that family's raw masks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ComboSpec", into = "ComboSpec")]
pub enum Combo {
    Vpad(u32),
    Remote(u32),
    Nunchuk { remote: u32, nunchuk: u32 },
    Classic { remote: u32, classic: u32 },
    Pro(u32),
}

impl Combo {
    /// Default chord: GamePad TV + ZL.
    pub fn default_toggle() -> Self {
        Combo::Vpad(vpad::TV.mask | vpad::ZL.mask)
    }

    pub fn is_empty(&self) -> bool {
        match *self {
            Combo::Vpad(b) | Combo::Remote(b) | Combo::Pro(b) => b == 0,
            Combo::Nunchuk { remote, nunchuk } => remote == 0 && nunchuk == 0,
            Combo::Classic { remote, classic } => remote == 0 && classic == 0,
        }
    }
}

impl std::fmt::Display for Combo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<&str> = match *self {
            Combo::Vpad(b) => buttons::names(vpad::NAMED, b),
            Combo::Remote(b) => buttons::names(remote::NAMED, b),
            Combo::Nunchuk { remote: r, nunchuk: n } => {
                let mut v = buttons::names(remote::NAMED, r);
                v.extend(buttons::names(nunchuk::NAMED, n));
                v
            }
            Combo::Classic { remote: r, classic: c } => {
                let mut v = buttons::names(remote::NAMED, r);
                v.extend(buttons::names(classic::NAMED, c));
                v
            }
            Combo::Pro(b) => buttons::names(pro::NAMED, b),
        };
        if parts.is_empty() {
            f.write_str("(none)")
        } else {
            f.write_str(&parts.join(" + "))
        }
    }
}

/// Whether a chord spread over one or more button groups was just triggered.
///
/// Every part's bits must be held, and at least one bit in some part must
/// have a trigger edge. Parts with no bits are ignored; an all-empty chord
/// never fires.
pub fn chord_triggered(parts: &[(u32, &Levels)]) -> bool {
    let mut fired = false;
    for &(bits, levels) in parts {
        if bits == 0 {
            continue;
        }
        if levels.hold & bits != bits {
            return false;
        }
        if levels.trigger & bits != 0 {
            fired = true;
        }
    }
    fired
}

/// Name-based settings representation of a [`Combo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComboSpec {
    Vpad(Vec<String>),
    Remote(Vec<String>),
    Nunchuk {
        #[serde(default)]
        remote: Vec<String>,
        nunchuk: Vec<String>,
    },
    Classic {
        #[serde(default)]
        remote: Vec<String>,
        classic: Vec<String>,
    },
    Pro(Vec<String>),
}

fn parse_bits(family: &'static str, table: &[Button], names: &[String]) -> Result<u32, ConfigError> {
    names.iter().try_fold(0, |acc, name| {
        buttons::find(table, name)
            .map(|b| acc | b.mask)
            .ok_or_else(|| ConfigError::UnknownButton {
                family,
                name: name.clone(),
            })
    })
}

fn to_names(table: &[Button], bits: u32) -> Vec<String> {
    buttons::names(table, bits)
        .into_iter()
        .map(str::to_owned)
        .collect()
}

impl TryFrom<ComboSpec> for Combo {
    type Error = ConfigError;

    fn try_from(spec: ComboSpec) -> Result<Self, Self::Error> {
        Ok(match spec {
            ComboSpec::Vpad(n) => Combo::Vpad(parse_bits("vpad", vpad::NAMED, &n)?),
            ComboSpec::Remote(n) => Combo::Remote(parse_bits("remote", remote::NAMED, &n)?),
            ComboSpec::Nunchuk { remote: r, nunchuk: n } => Combo::Nunchuk {
                remote: parse_bits("remote", remote::NAMED, &r)?,
                nunchuk: parse_bits("nunchuk", nunchuk::NAMED, &n)?,
            },
            ComboSpec::Classic { remote: r, classic: c } => Combo::Classic {
                remote: parse_bits("remote", remote::NAMED, &r)?,
                classic: parse_bits("classic", classic::NAMED, &c)?,
            },
            ComboSpec::Pro(n) => Combo::Pro(parse_bits("pro", pro::NAMED, &n)?),
        })
    }
}

impl From<Combo> for ComboSpec {
    fn from(combo: Combo) -> Self {
        match combo {
            Combo::Vpad(b) => ComboSpec::Vpad(to_names(vpad::NAMED, b)),
            Combo::Remote(b) => ComboSpec::Remote(to_names(remote::NAMED, b)),
            Combo::Nunchuk { remote: r, nunchuk: n } => ComboSpec::Nunchuk {
                remote: to_names(remote::NAMED, r),
                nunchuk: to_names(nunchuk::NAMED, n),
            },
            Combo::Classic { remote: r, classic: c } => ComboSpec::Classic {
                remote: to_names(remote::NAMED, r),
                classic: to_names(classic::NAMED, c),
            },
            Combo::Pro(b) => ComboSpec::Pro(to_names(pro::NAMED, b)),
        }
    }
}
