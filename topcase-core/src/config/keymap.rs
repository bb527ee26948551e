//! HID usage to input key code translation
//!
//! Key codes follow the Linux input event numbering, which is what evdev
//! style sinks on every supported host expect.

/// Input key code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyCode(pub u16);

pub const KEY_ESC: KeyCode = KeyCode(1);
pub const KEY_A: KeyCode = KeyCode(30);
pub const KEY_B: KeyCode = KeyCode(48);
pub const KEY_C: KeyCode = KeyCode(46);
pub const KEY_LEFTCTRL: KeyCode = KeyCode(29);
pub const KEY_LEFTSHIFT: KeyCode = KeyCode(42);
pub const KEY_LEFTALT: KeyCode = KeyCode(56);
pub const KEY_LEFTMETA: KeyCode = KeyCode(125);
pub const KEY_RIGHTSHIFT: KeyCode = KeyCode(54);
pub const KEY_RIGHTALT: KeyCode = KeyCode(100);
pub const KEY_RIGHTMETA: KeyCode = KeyCode(126);
pub const KEY_FN: KeyCode = KeyCode(0x1D0);
pub const BTN_LEFT: KeyCode = KeyCode(0x110);

/// Key per modifier bit, LSB first
///
/// Bit 4 would be right control, which these keyboards do not have.
pub const MODIFIER_KEYS: [Option<KeyCode>; 8] = [
    Some(KEY_LEFTCTRL),
    Some(KEY_LEFTSHIFT),
    Some(KEY_LEFTALT),
    Some(KEY_LEFTMETA),
    None,
    Some(KEY_RIGHTSHIFT),
    Some(KEY_RIGHTALT),
    Some(KEY_RIGHTMETA),
];

/// Key code per HID keyboard usage, zero where unmapped
#[rustfmt::skip]
static HID_TO_KEY: [u16; 256] = [
    // 0x00: reserved, rollover, POST fail, undefined, a-l
      0,   0,   0,   0,  30,  48,  46,  32,  18,  33,  34,  35,  23,  36,  37,  38,
    // 0x10: m-z, 1-2
     50,  49,  24,  25,  16,  19,  31,  20,  22,  47,  17,  45,  21,  44,   2,   3,
    // 0x20: 3-0, enter, esc, backspace, tab, space, minus, equal, [, ]
      4,   5,   6,   7,   8,   9,  10,  11,  28,   1,  14,  15,  57,  12,  13,  26,
    // 0x30: ], \, non-US #, ;, ', `, comma, dot, slash, caps, F1-F6
     27,  43,  43,  39,  40,  41,  51,  52,  53,  58,  59,  60,  61,  62,  63,  64,
    // 0x40: F7-F12, sysrq, scroll lock, pause, insert, home, pgup, delete, end, pgdn, right
     65,  66,  67,  68,  87,  88,  99,  70, 119, 110, 102, 104, 111, 107, 109, 106,
    // 0x50: left, down, up, num lock, keypad
    105, 108, 103,  69,  98,  55,  74,  78,  96,  79,  80,  81,  75,  76,  77,  71,
    // 0x60: keypad 8, 9, 0, dot, non-US \, compose, power, keypad =, F13-F20
     72,  73,  82,  83,  86, 127, 116, 117, 183, 184, 185, 186, 187, 188, 189, 190,
    // 0x70: F21-F24, open, help, props, front, stop, again, undo, cut, copy, paste, find, mute
    191, 192, 193, 194, 134, 138, 130, 132, 128, 129, 131, 137, 133, 135, 136, 113,
    // 0x80: volume up, volume down, locking keys, keypad comma, international
    115, 114,   0,   0,   0, 121,   0,  89,  93, 124,  92,  94,  95,   0,   0,   0,
    // 0x90: LANG1-LANG5
    122, 123,  90,  91,  85,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
    // 0xA0
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
    // 0xB0: keypad ( )
      0,   0,   0,   0,   0,   0, 179, 180,   0,   0,   0,   0,   0,   0,   0,   0,
    // 0xC0
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
    // 0xD0
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
    // 0xE0: modifiers
     29,  42,  56, 125,  97,  54, 100, 126,   0,   0,   0,   0,   0,   0,   0,   0,
    // 0xF0
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
];

/// Translate a HID keyboard usage, `None` when unmapped
pub fn hid_to_key(usage: u8) -> Option<KeyCode> {
    match HID_TO_KEY[usage as usize] {
        0 => None,
        code => Some(KeyCode(code)),
    }
}

/// Every key code a keyboard report can produce
pub fn keyboard_keys() -> impl Iterator<Item = KeyCode> {
    (0..=u8::MAX)
        .filter_map(hid_to_key)
        .chain(MODIFIER_KEYS.iter().flatten().copied())
        .chain(core::iter::once(KEY_FN))
}
