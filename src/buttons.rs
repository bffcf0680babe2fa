//! Button catalogs for every pad and extension shape.
//!
//! A catalog is a fixed, ordered list of buttons. A button's position in its
//! group is the index used by all per-button turbo state for that shape, so
//! the order here must never change between releases of saved state.
//!
//! Masks match the raw status words reported by the hardware:
//!   VPAD    -> `hold` / `trigger` / `release` (u32)
//!   Remote  -> core `buttons` word (nunchuk Z/C share this word)
//!   Classic -> extension `buttons` word
//!   Pro     -> extension `buttons` word

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pad or extension layout a button group belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Vpad,
    Core,
    Nunchuk,
    Classic,
    Pro,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Vpad => "vpad",
            Shape::Core => "core",
            Shape::Nunchuk => "nunchuk",
            Shape::Classic => "classic",
            Shape::Pro => "pro",
        };
        f.write_str(name)
    }
}

/// Extension currently attached to a Wii Remote channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExtensionShape {
    #[default]
    None,
    Nunchuk,
    Classic,
    Pro,
}

impl fmt::Display for ExtensionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtensionShape::None => "none",
            ExtensionShape::Nunchuk => "nunchuk",
            ExtensionShape::Classic => "classic",
            ExtensionShape::Pro => "pro",
        };
        f.write_str(name)
    }
}

/// A single physical button: display name plus its bit in the raw status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Button {
    pub name: &'static str,
    pub mask: u32,
}

impl Button {
    pub const fn new(name: &'static str, mask: u32) -> Self {
        Self { name, mask }
    }
}

/// Ordered button catalog for one shape. `N` is the width of all per-button
/// state kept for this shape.
#[derive(Debug)]
pub struct ButtonGroup<const N: usize> {
    pub shape: Shape,
    pub buttons: [Button; N],
}

impl<const N: usize> ButtonGroup<N> {
    /// Union of every button mask in the group.
    pub fn mask(&self) -> u32 {
        self.buttons.iter().fold(0, |acc, b| acc | b.mask)
    }

    pub fn button(&self, idx: usize) -> Option<Button> {
        self.buttons.get(idx).copied()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.buttons
            .iter()
            .position(|b| b.name.eq_ignore_ascii_case(name))
    }
}

/// Look up a button by name (case-insensitive) in a name table.
pub fn find(table: &[Button], name: &str) -> Option<Button> {
    table
        .iter()
        .find(|b| b.name.eq_ignore_ascii_case(name))
        .copied()
}

/// Names of every button in `table` whose bit is set in `bits`, in table order.
pub fn names(table: &[Button], bits: u32) -> Vec<&'static str> {
    table
        .iter()
        .filter(|b| bits & b.mask != 0)
        .map(|b| b.name)
        .collect()
}

/// Union of every mask in a name table.
pub const fn table_mask(table: &[Button]) -> u32 {
    let mut mask = 0;
    let mut i = 0;
    while i < table.len() {
        mask |= table[i].mask;
        i += 1;
    }
    mask
}

/// Wii U GamePad (DRC).
pub mod vpad {
    use super::{table_mask, Button, ButtonGroup, Shape};

    pub const SYNC: Button = Button::new("SYNC", 0x0000_0001);
    pub const HOME: Button = Button::new("HOME", 0x0000_0002);
    pub const MINUS: Button = Button::new("MINUS", 0x0000_0004);
    pub const PLUS: Button = Button::new("PLUS", 0x0000_0008);
    pub const R: Button = Button::new("R", 0x0000_0010);
    pub const L: Button = Button::new("L", 0x0000_0020);
    pub const ZR: Button = Button::new("ZR", 0x0000_0040);
    pub const ZL: Button = Button::new("ZL", 0x0000_0080);
    pub const DOWN: Button = Button::new("DOWN", 0x0000_0100);
    pub const UP: Button = Button::new("UP", 0x0000_0200);
    pub const RIGHT: Button = Button::new("RIGHT", 0x0000_0400);
    pub const LEFT: Button = Button::new("LEFT", 0x0000_0800);
    pub const Y: Button = Button::new("Y", 0x0000_1000);
    pub const X: Button = Button::new("X", 0x0000_2000);
    pub const B: Button = Button::new("B", 0x0000_4000);
    pub const A: Button = Button::new("A", 0x0000_8000);
    pub const TV: Button = Button::new("TV", 0x0001_0000);
    pub const STICK_R: Button = Button::new("STICK_R", 0x0002_0000);
    pub const STICK_L: Button = Button::new("STICK_L", 0x0004_0000);

    pub const WIDTH: usize = 14;

    /// Buttons that can be turbinated.
    pub const GROUP: ButtonGroup<WIDTH> = ButtonGroup {
        shape: Shape::Vpad,
        buttons: [A, B, X, Y, LEFT, RIGHT, UP, DOWN, L, ZL, R, ZR, PLUS, MINUS],
    };

    /// Every named button, including the ones only usable in combos.
    pub const NAMED: &[Button] = &[
        A, B, X, Y, LEFT, RIGHT, UP, DOWN, L, ZL, R, ZR, PLUS, MINUS, HOME, SYNC, TV, STICK_L,
        STICK_R,
    ];

    pub const NAMED_MASK: u32 = table_mask(NAMED);
}

/// Wii Remote core buttons.
pub mod remote {
    use super::{table_mask, Button, ButtonGroup, Shape};

    pub const LEFT: Button = Button::new("LEFT", 0x0001);
    pub const RIGHT: Button = Button::new("RIGHT", 0x0002);
    pub const DOWN: Button = Button::new("DOWN", 0x0004);
    pub const UP: Button = Button::new("UP", 0x0008);
    pub const PLUS: Button = Button::new("PLUS", 0x0010);
    pub const TWO: Button = Button::new("2", 0x0100);
    pub const ONE: Button = Button::new("1", 0x0200);
    pub const B: Button = Button::new("B", 0x0400);
    pub const A: Button = Button::new("A", 0x0800);
    pub const MINUS: Button = Button::new("MINUS", 0x1000);
    pub const HOME: Button = Button::new("HOME", 0x8000);

    pub const WIDTH: usize = 10;

    pub const GROUP: ButtonGroup<WIDTH> = ButtonGroup {
        shape: Shape::Core,
        buttons: [LEFT, RIGHT, DOWN, UP, PLUS, TWO, ONE, B, A, MINUS],
    };

    pub const NAMED: &[Button] = &[LEFT, RIGHT, DOWN, UP, PLUS, TWO, ONE, B, A, MINUS, HOME];

    pub const NAMED_MASK: u32 = table_mask(NAMED);
}

/// Nunchuk buttons. These live in the Wii Remote core word.
pub mod nunchuk {
    use super::{table_mask, Button, ButtonGroup, Shape};

    pub const Z: Button = Button::new("Z", 0x2000);
    pub const C: Button = Button::new("C", 0x4000);

    pub const WIDTH: usize = 2;

    pub const GROUP: ButtonGroup<WIDTH> = ButtonGroup {
        shape: Shape::Nunchuk,
        buttons: [Z, C],
    };

    pub const NAMED: &[Button] = &[Z, C];

    pub const NAMED_MASK: u32 = table_mask(NAMED);
}

/// Classic Controller (and Classic Controller Pro) extension buttons.
pub mod classic {
    use super::{table_mask, Button, ButtonGroup, Shape};

    pub const UP: Button = Button::new("UP", 0x0001);
    pub const LEFT: Button = Button::new("LEFT", 0x0002);
    pub const ZR: Button = Button::new("ZR", 0x0004);
    pub const X: Button = Button::new("X", 0x0008);
    pub const A: Button = Button::new("A", 0x0010);
    pub const Y: Button = Button::new("Y", 0x0020);
    pub const B: Button = Button::new("B", 0x0040);
    pub const ZL: Button = Button::new("ZL", 0x0080);
    pub const R: Button = Button::new("R", 0x0200);
    pub const PLUS: Button = Button::new("PLUS", 0x0400);
    pub const HOME: Button = Button::new("HOME", 0x0800);
    pub const MINUS: Button = Button::new("MINUS", 0x1000);
    pub const L: Button = Button::new("L", 0x2000);
    pub const DOWN: Button = Button::new("DOWN", 0x4000);
    pub const RIGHT: Button = Button::new("RIGHT", 0x8000);

    pub const WIDTH: usize = 14;

    pub const GROUP: ButtonGroup<WIDTH> = ButtonGroup {
        shape: Shape::Classic,
        buttons: [UP, LEFT, ZR, X, A, Y, B, ZL, R, PLUS, MINUS, L, DOWN, RIGHT],
    };

    pub const NAMED: &[Button] = &[
        UP, LEFT, ZR, X, A, Y, B, ZL, R, PLUS, MINUS, L, DOWN, RIGHT, HOME,
    ];

    pub const NAMED_MASK: u32 = table_mask(NAMED);
}

/// Wii U Pro Controller buttons.
pub mod pro {
    use super::{table_mask, Button, ButtonGroup, Shape};

    pub const UP: Button = Button::new("UP", 0x0000_0001);
    pub const LEFT: Button = Button::new("LEFT", 0x0000_0002);
    pub const ZR: Button = Button::new("ZR", 0x0000_0004);
    pub const X: Button = Button::new("X", 0x0000_0008);
    pub const A: Button = Button::new("A", 0x0000_0010);
    pub const Y: Button = Button::new("Y", 0x0000_0020);
    pub const B: Button = Button::new("B", 0x0000_0040);
    pub const ZL: Button = Button::new("ZL", 0x0000_0080);
    pub const R: Button = Button::new("R", 0x0000_0200);
    pub const PLUS: Button = Button::new("PLUS", 0x0000_0400);
    pub const HOME: Button = Button::new("HOME", 0x0000_0800);
    pub const MINUS: Button = Button::new("MINUS", 0x0000_1000);
    pub const L: Button = Button::new("L", 0x0000_2000);
    pub const DOWN: Button = Button::new("DOWN", 0x0000_4000);
    pub const RIGHT: Button = Button::new("RIGHT", 0x0000_8000);
    pub const STICK_R: Button = Button::new("STICK_R", 0x0001_0000);
    pub const STICK_L: Button = Button::new("STICK_L", 0x0002_0000);

    pub const WIDTH: usize = 14;

    pub const GROUP: ButtonGroup<WIDTH> = ButtonGroup {
        shape: Shape::Pro,
        buttons: [UP, LEFT, ZR, X, A, Y, B, ZL, R, PLUS, MINUS, L, DOWN, RIGHT],
    };

    pub const NAMED: &[Button] = &[
        UP, LEFT, ZR, X, A, Y, B, ZL, R, PLUS, MINUS, L, DOWN, RIGHT, HOME, STICK_L, STICK_R,
    ];

    pub const NAMED_MASK: u32 = table_mask(NAMED);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_distinct<const N: usize>(group: &ButtonGroup<N>) {
        for (i, a) in group.buttons.iter().enumerate() {
            assert_eq!(a.mask.count_ones(), 1, "{}: {} is not a single bit", group.shape, a.name);
            for b in &group.buttons[i + 1..] {
                assert_ne!(a.mask, b.mask, "{}: {} and {} share a bit", group.shape, a.name, b.name);
                assert_ne!(a.name, b.name, "{}: duplicate name {}", group.shape, a.name);
            }
        }
    }

    #[test]
    fn test_groups_have_distinct_single_bit_buttons() {
        assert_distinct(&vpad::GROUP);
        assert_distinct(&remote::GROUP);
        assert_distinct(&nunchuk::GROUP);
        assert_distinct(&classic::GROUP);
        assert_distinct(&pro::GROUP);
    }

    #[test]
    fn test_groups_fit_in_bitset() {
        // Per-button state is indexed into a u32 bitset.
        assert!(vpad::WIDTH <= 32);
        assert!(classic::WIDTH <= 32);
        assert!(pro::WIDTH <= 32);
    }

    #[test]
    fn test_nunchuk_bits_do_not_overlap_remote() {
        assert_eq!(remote::NAMED_MASK & nunchuk::NAMED_MASK, 0);
    }

    #[test]
    fn test_group_order_is_stable() {
        assert_eq!(vpad::GROUP.index_of("A"), Some(0));
        assert_eq!(vpad::GROUP.index_of("minus"), Some(13));
        assert_eq!(remote::GROUP.index_of("LEFT"), Some(0));
        assert_eq!(remote::GROUP.index_of("1"), Some(6));
        assert_eq!(nunchuk::GROUP.index_of("C"), Some(1));
        assert_eq!(classic::GROUP.index_of("RIGHT"), Some(13));
        // Combo-only buttons are not part of the turbo group.
        assert_eq!(vpad::GROUP.index_of("TV"), None);
        assert_eq!(pro::GROUP.index_of("HOME"), None);
    }

    #[test]
    fn test_find_is_case_insensitive() {
        assert_eq!(find(vpad::NAMED, "zl"), Some(vpad::ZL));
        assert_eq!(find(vpad::NAMED, "tv"), Some(vpad::TV));
        assert_eq!(find(remote::NAMED, "Home"), Some(remote::HOME));
        assert_eq!(find(remote::NAMED, "ZL"), None);
    }

    #[test]
    fn test_names_follow_table_order() {
        let bits = vpad::ZL.mask | vpad::TV.mask | vpad::A.mask;
        assert_eq!(names(vpad::NAMED, bits), vec!["A", "ZL", "TV"]);
        assert!(names(vpad::NAMED, 0).is_empty());
    }

    #[test]
    fn test_group_mask_covers_every_button() {
        let mask = classic::GROUP.mask();
        for b in classic::GROUP.buttons {
            assert_ne!(mask & b.mask, 0);
        }
        assert_eq!(mask & classic::HOME.mask, 0);
    }
}
