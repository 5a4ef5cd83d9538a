//! Keyboard definitions shared by windows and widgets.

use bitflags::bitflags;
use std::ffi::c_int;

bitflags! {
    /// `XPLMKeyFlags`
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct KeyFlags: c_int {
        const SHIFT = 1;
        const OPTION_ALT = 2;
        const CONTROL = 4;
        const DOWN = 8;
        const UP = 16;
    }
}

/// ASCII codes the host uses for control keys in key events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AsciiControlKey {
    Delete = 8,
    Tab = 9,
    Return = 13,
    Escape = 27,
    Left = 28,
    Right = 29,
    Up = 30,
    Down = 31,
    Decimal = 46,
    Num0 = 48,
    Num1 = 49,
    Num2 = 50,
    Num3 = 51,
    Num4 = 52,
    Num5 = 53,
    Num6 = 54,
    Num7 = 55,
    Num8 = 56,
    Num9 = 57,
}

/// `XPLM_VK_*` virtual key codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VirtualKey {
    Back = 0x08,
    Tab = 0x09,
    Clear = 0x0C,
    Return = 0x0D,
    Escape = 0x1B,
    Space = 0x20,
    Prior = 0x21,
    Next = 0x22,
    End = 0x23,
    Home = 0x24,
    Left = 0x25,
    Up = 0x26,
    Right = 0x27,
    Down = 0x28,
    Select = 0x29,
    Print = 0x2A,
    Execute = 0x2B,
    Snapshot = 0x2C,
    Insert = 0x2D,
    Delete = 0x2E,
    Help = 0x2F,
    Num0 = 0x30,
    Num1 = 0x31,
    Num2 = 0x32,
    Num3 = 0x33,
    Num4 = 0x34,
    Num5 = 0x35,
    Num6 = 0x36,
    Num7 = 0x37,
    Num8 = 0x38,
    Num9 = 0x39,
    A = 0x41,
    B = 0x42,
    C = 0x43,
    D = 0x44,
    E = 0x45,
    F = 0x46,
    G = 0x47,
    H = 0x48,
    I = 0x49,
    J = 0x4A,
    K = 0x4B,
    L = 0x4C,
    M = 0x4D,
    N = 0x4E,
    O = 0x4F,
    P = 0x50,
    Q = 0x51,
    R = 0x52,
    S = 0x53,
    T = 0x54,
    U = 0x55,
    V = 0x56,
    W = 0x57,
    X = 0x58,
    Y = 0x59,
    Z = 0x5A,
    NumPad0 = 0x60,
    NumPad1 = 0x61,
    NumPad2 = 0x62,
    NumPad3 = 0x63,
    NumPad4 = 0x64,
    NumPad5 = 0x65,
    NumPad6 = 0x66,
    NumPad7 = 0x67,
    NumPad8 = 0x68,
    NumPad9 = 0x69,
    Multiply = 0x6A,
    Add = 0x6B,
    Separator = 0x6C,
    Subtract = 0x6D,
    Decimal = 0x6E,
    Divide = 0x6F,
    F1 = 0x70,
    F2 = 0x71,
    F3 = 0x72,
    F4 = 0x73,
    F5 = 0x74,
    F6 = 0x75,
    F7 = 0x76,
    F8 = 0x77,
    F9 = 0x78,
    F10 = 0x79,
    F11 = 0x7A,
    F12 = 0x7B,
    F13 = 0x7C,
    F14 = 0x7D,
    F15 = 0x7E,
    F16 = 0x7F,
    F17 = 0x80,
    F18 = 0x81,
    F19 = 0x82,
    F20 = 0x83,
    F21 = 0x84,
    F22 = 0x85,
    F23 = 0x86,
    F24 = 0x87,
    Equal = 0xB0,
    Minus = 0xB1,
    RBrace = 0xB2,
    LBrace = 0xB3,
    Quote = 0xB4,
    Semicolon = 0xB5,
    Backslash = 0xB6,
    Comma = 0xB7,
    Slash = 0xB8,
    Period = 0xB9,
    Backquote = 0xBA,
    Enter = 0xBB,
    NumPadEnter = 0xBC,
    NumPadEqual = 0xBD,
}

impl VirtualKey {
    pub fn from_raw(raw: u8) -> Option<Self> {
        use VirtualKey::*;
        Some(match raw {
            0x08 => Back,
            0x09 => Tab,
            0x0C => Clear,
            0x0D => Return,
            0x1B => Escape,
            0x20 => Space,
            0x21 => Prior,
            0x22 => Next,
            0x23 => End,
            0x24 => Home,
            0x25 => Left,
            0x26 => Up,
            0x27 => Right,
            0x28 => Down,
            0x29 => Select,
            0x2A => Print,
            0x2B => Execute,
            0x2C => Snapshot,
            0x2D => Insert,
            0x2E => Delete,
            0x2F => Help,
            0x30 => Num0,
            0x31 => Num1,
            0x32 => Num2,
            0x33 => Num3,
            0x34 => Num4,
            0x35 => Num5,
            0x36 => Num6,
            0x37 => Num7,
            0x38 => Num8,
            0x39 => Num9,
            0x41 => A,
            0x42 => B,
            0x43 => C,
            0x44 => D,
            0x45 => E,
            0x46 => F,
            0x47 => G,
            0x48 => H,
            0x49 => I,
            0x4A => J,
            0x4B => K,
            0x4C => L,
            0x4D => M,
            0x4E => N,
            0x4F => O,
            0x50 => P,
            0x51 => Q,
            0x52 => R,
            0x53 => S,
            0x54 => T,
            0x55 => U,
            0x56 => V,
            0x57 => W,
            0x58 => X,
            0x59 => Y,
            0x5A => Z,
            0x60 => NumPad0,
            0x61 => NumPad1,
            0x62 => NumPad2,
            0x63 => NumPad3,
            0x64 => NumPad4,
            0x65 => NumPad5,
            0x66 => NumPad6,
            0x67 => NumPad7,
            0x68 => NumPad8,
            0x69 => NumPad9,
            0x6A => Multiply,
            0x6B => Add,
            0x6C => Separator,
            0x6D => Subtract,
            0x6E => Decimal,
            0x6F => Divide,
            0x70 => F1,
            0x71 => F2,
            0x72 => F3,
            0x73 => F4,
            0x74 => F5,
            0x75 => F6,
            0x76 => F7,
            0x77 => F8,
            0x78 => F9,
            0x79 => F10,
            0x7A => F11,
            0x7B => F12,
            0x7C => F13,
            0x7D => F14,
            0x7E => F15,
            0x7F => F16,
            0x80 => F17,
            0x81 => F18,
            0x82 => F19,
            0x83 => F20,
            0x84 => F21,
            0x85 => F22,
            0x86 => F23,
            0x87 => F24,
            0xB0 => Equal,
            0xB1 => Minus,
            0xB2 => RBrace,
            0xB3 => LBrace,
            0xB4 => Quote,
            0xB5 => Semicolon,
            0xB6 => Backslash,
            0xB7 => Comma,
            0xB8 => Slash,
            0xB9 => Period,
            0xBA => Backquote,
            0xBB => Enter,
            0xBC => NumPadEnter,
            0xBD => NumPadEqual,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_keys_keep_sdk_codes() {
        assert_eq!(VirtualKey::Space as u8, 0x20);
        assert_eq!(VirtualKey::Help as u8, 0x2F);
        assert_eq!(VirtualKey::Num9 as u8, 0x39);
        assert_eq!(VirtualKey::Z as u8, 0x5A);
        assert_eq!(VirtualKey::F24 as u8, 0x87);
        assert_eq!(VirtualKey::NumPadEqual as u8, 0xBD);
    }

    #[test]
    fn raw_codes_map_back() {
        for raw in 0..=u8::MAX {
            if let Some(key) = VirtualKey::from_raw(raw) {
                assert_eq!(key as u8, raw);
            }
        }
        assert_eq!(VirtualKey::from_raw(0x41), Some(VirtualKey::A));
        assert_eq!(VirtualKey::from_raw(0x00), None);
    }
}
