//! Keyboard report decoder
//!
//! The keyboard sends its full state (held keys, modifiers, fn) on every
//! change. Events are produced by diffing each report against the last one
//! that was accepted.

use topcase_protocol::payload::{KeyboardReport, KEY_SLOTS};

use crate::config::keymap::{hid_to_key, KEY_FN, MODIFIER_KEYS};
use crate::traits::KeyboardSink;

/// Last accepted keyboard state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyboardState {
    keys: [u8; KEY_SLOTS],
    modifiers: u8,
    fn_key: bool,
}

impl KeyboardState {
    pub const fn new() -> Self {
        Self {
            keys: [0; KEY_SLOTS],
            modifiers: 0,
            fn_key: false,
        }
    }

    /// Emit the edges between the current state and `report`, then adopt it
    ///
    /// Rollover reports carry no usable key state and are discarded.
    pub fn process<S: KeyboardSink>(&mut self, report: &KeyboardReport, sink: &mut S) {
        if report.is_rollover() {
            debug!("keyboard rollover, report ignored");
            return;
        }

        // Releases: keys, modifiers, fn
        for &usage in self.keys.iter().filter(|&&k| k != 0) {
            if !report.keys.contains(&usage) {
                emit_usage(sink, usage, false);
            }
        }
        for (bit, key) in MODIFIER_KEYS.iter().enumerate() {
            let mask = 1 << bit;
            if self.modifiers & mask != 0 && report.modifiers & mask == 0 {
                if let Some(key) = key {
                    sink.key(*key, false);
                }
            }
        }
        if self.fn_key && !report.fn_key {
            sink.key(KEY_FN, false);
        }

        // Presses: modifiers, fn, keys
        for (bit, key) in MODIFIER_KEYS.iter().enumerate() {
            let mask = 1 << bit;
            if self.modifiers & mask == 0 && report.modifiers & mask != 0 {
                if let Some(key) = key {
                    sink.key(*key, true);
                }
            }
        }
        if !self.fn_key && report.fn_key {
            sink.key(KEY_FN, true);
        }
        for &usage in report.keys.iter().filter(|&&k| k != 0) {
            if !self.keys.contains(&usage) {
                emit_usage(sink, usage, true);
            }
        }

        sink.sync();

        self.keys = report.keys;
        self.modifiers = report.modifiers;
        self.fn_key = report.fn_key;
    }

    /// HID usages currently held
    pub fn keys(&self) -> &[u8; KEY_SLOTS] {
        &self.keys
    }

    pub fn modifiers(&self) -> u8 {
        self.modifiers
    }

    pub fn fn_key(&self) -> bool {
        self.fn_key
    }
}

fn emit_usage<S: KeyboardSink>(sink: &mut S, usage: u8, pressed: bool) {
    match hid_to_key(usage) {
        Some(key) => sink.key(key, pressed),
        None => trace!("no key for usage {=u8:#x}", usage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::keymap::*;
    use crate::testing::{KeyEvent, RecordingKeyboard};
    use proptest::prelude::*;
    use topcase_protocol::payload::KEY_ROLLOVER;

    fn report(modifiers: u8, keys: &[u8], fn_key: bool) -> KeyboardReport {
        let mut slots = [0u8; KEY_SLOTS];
        slots[..keys.len()].copy_from_slice(keys);
        KeyboardReport {
            modifiers,
            keys: slots,
            fn_key,
        }
    }

    #[test]
    fn test_single_key_press_and_release() {
        let mut state = KeyboardState::new();
        let mut sink = RecordingKeyboard::default();

        state.process(&report(0, &[0x04], false), &mut sink);
        assert_eq!(sink.take(), [KeyEvent::Key(KEY_A, true), KeyEvent::Sync]);

        state.process(&report(0, &[], false), &mut sink);
        assert_eq!(sink.take(), [KeyEvent::Key(KEY_A, false), KeyEvent::Sync]);
    }

    #[test]
    fn test_held_key_not_repeated() {
        let mut state = KeyboardState::new();
        let mut sink = RecordingKeyboard::default();

        state.process(&report(0, &[0x04], false), &mut sink);
        sink.take();
        // a stays held, b is added in a different slot
        state.process(&report(0, &[0x05, 0x04], false), &mut sink);
        assert_eq!(sink.take(), [KeyEvent::Key(KEY_B, true), KeyEvent::Sync]);
    }

    #[test]
    fn test_event_order() {
        let mut state = KeyboardState::new();
        let mut sink = RecordingKeyboard::default();

        // ctrl + a held
        state.process(&report(0x01, &[0x04], false), &mut sink);
        sink.take();

        // a, ctrl released; b, shift, fn pressed
        state.process(&report(0x02, &[0x05], true), &mut sink);
        assert_eq!(
            sink.take(),
            [
                KeyEvent::Key(KEY_A, false),
                KeyEvent::Key(KEY_LEFTCTRL, false),
                KeyEvent::Key(KEY_LEFTSHIFT, true),
                KeyEvent::Key(KEY_FN, true),
                KeyEvent::Key(KEY_B, true),
                KeyEvent::Sync,
            ]
        );

        // everything released
        state.process(&report(0, &[], false), &mut sink);
        assert_eq!(
            sink.take(),
            [
                KeyEvent::Key(KEY_B, false),
                KeyEvent::Key(KEY_LEFTSHIFT, false),
                KeyEvent::Key(KEY_FN, false),
                KeyEvent::Sync,
            ]
        );
    }

    #[test]
    fn test_rollover_ignored() {
        let mut state = KeyboardState::new();
        let mut sink = RecordingKeyboard::default();

        state.process(&report(0, &[0x04], false), &mut sink);
        sink.take();
        let before = state;

        state.process(&report(0x01, &[KEY_ROLLOVER; KEY_SLOTS], true), &mut sink);
        assert!(sink.take().is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn test_unmapped_usage_skipped_but_tracked() {
        let mut state = KeyboardState::new();
        let mut sink = RecordingKeyboard::default();

        state.process(&report(0, &[0xA5], false), &mut sink);
        assert_eq!(sink.take(), [KeyEvent::Sync]);
        assert_eq!(state.keys()[0], 0xA5);
    }

    #[test]
    fn test_missing_right_ctrl_bit() {
        let mut state = KeyboardState::new();
        let mut sink = RecordingKeyboard::default();

        state.process(&report(0x10, &[], false), &mut sink);
        assert_eq!(sink.take(), [KeyEvent::Sync]);
        assert_eq!(state.modifiers(), 0x10);
    }

    fn key_set(keys: &[u8]) -> std::collections::BTreeSet<KeyCode> {
        keys.iter().filter_map(|&k| hid_to_key(k)).collect()
    }

    fn mod_set(mods: u8, fn_key: bool) -> std::collections::BTreeSet<KeyCode> {
        let mut set: std::collections::BTreeSet<KeyCode> = MODIFIER_KEYS
            .iter()
            .enumerate()
            .filter(|(bit, _)| mods & (1 << bit) != 0)
            .filter_map(|(_, key)| *key)
            .collect();
        if fn_key {
            set.insert(KEY_FN);
        }
        set
    }

    fn distinct_keys() -> impl Strategy<Value = Vec<u8>> {
        proptest::sample::subsequence((0x04u8..0x31).collect::<Vec<_>>(), 0..=KEY_SLOTS)
    }

    proptest! {
        #[test]
        fn prop_events_are_exact_edges(
            old_keys in distinct_keys(), old_mods in any::<u8>(), old_fn in any::<bool>(),
            new_keys in distinct_keys(), new_mods in any::<u8>(), new_fn in any::<bool>(),
        ) {
            let mut state = KeyboardState::new();
            let mut sink = RecordingKeyboard::default();
            state.process(&report(old_mods, &old_keys, old_fn), &mut sink);
            sink.take();

            state.process(&report(new_mods, &new_keys, new_fn), &mut sink);
            let events = sink.take();
            prop_assert_eq!(events.last(), Some(&KeyEvent::Sync));

            let old = key_set(&old_keys);
            let new = key_set(&new_keys);
            let old_m = mod_set(old_mods, old_fn);
            let new_m = mod_set(new_mods, new_fn);

            let released: std::collections::BTreeSet<KeyCode> = events.iter().filter_map(|e| match e {
                KeyEvent::Key(k, false) => Some(*k),
                _ => None,
            }).collect();
            let pressed: std::collections::BTreeSet<KeyCode> = events.iter().filter_map(|e| match e {
                KeyEvent::Key(k, true) => Some(*k),
                _ => None,
            }).collect();

            let expect_released: std::collections::BTreeSet<KeyCode> =
                old.difference(&new).chain(old_m.difference(&new_m)).copied().collect();
            let expect_pressed: std::collections::BTreeSet<KeyCode> =
                new.difference(&old).chain(new_m.difference(&old_m)).copied().collect();
            prop_assert_eq!(released, expect_released);
            prop_assert_eq!(pressed, expect_pressed);

            // Every release precedes every press
            let first_press = events.iter().position(|e| matches!(e, KeyEvent::Key(_, true)));
            let last_release = events.iter().rposition(|e| matches!(e, KeyEvent::Key(_, false)));
            if let (Some(p), Some(r)) = (first_press, last_release) {
                prop_assert!(r < p);
            }
        }
    }
}
