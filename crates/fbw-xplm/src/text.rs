//! Text drawing with the simulator's bitmap fonts.

use crate::api::xplm;
use crate::error::XplmResult;
use crate::strings::to_cstring;
use std::ffi::c_int;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum FontId {
    Basic = 0,
    Proportional = 18,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontDimensions {
    pub char_width: i32,
    pub char_height: i32,
    pub digits_only: bool,
}

/// Draws `text` with its baseline at `(x, y)`. With `word_wrap` the text wraps at that width.
pub fn draw_string(
    color: [f32; 3],
    x: i32,
    y: i32,
    text: &str,
    word_wrap: Option<i32>,
    font: FontId,
) -> XplmResult<()> {
    let text = to_cstring(text)?;
    let mut color = color;
    let mut wrap = word_wrap.unwrap_or(0);
    let wrap_ptr = if word_wrap.is_some() {
        &mut wrap as *mut c_int
    } else {
        std::ptr::null_mut()
    };
    unsafe { (xplm().draw_string)(color.as_mut_ptr(), x, y, text.as_ptr(), wrap_ptr, font as c_int) };
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn draw_number(
    color: [f32; 3],
    x: i32,
    y: i32,
    value: f64,
    digits: i32,
    decimals: i32,
    show_sign: bool,
    font: FontId,
) {
    let mut color = color;
    unsafe {
        (xplm().draw_number)(
            color.as_mut_ptr(),
            x,
            y,
            value,
            digits,
            decimals,
            show_sign as c_int,
            font as c_int,
        )
    };
}

pub fn font_dimensions(font: FontId) -> FontDimensions {
    let (mut w, mut h, mut digits) = (0, 0, 0);
    unsafe { (xplm().get_font_dimensions)(font as c_int, &mut w, &mut h, &mut digits) };
    FontDimensions {
        char_width: w,
        char_height: h,
        digits_only: digits != 0,
    }
}

/// Width in boxels of `text` drawn in `font`. The host counts bytes, not chars.
pub fn measure_string(font: FontId, text: &str) -> f32 {
    unsafe { (xplm().measure_string)(font as c_int, text.as_ptr().cast(), text.len() as c_int) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_host::TestHost;

    #[test]
    fn strings_and_numbers_are_drawn() {
        let host = TestHost::new();
        draw_string([1.0, 1.0, 1.0], 10, 20, "TCAS TA", None, FontId::Basic).unwrap();
        draw_string([1.0, 0.0, 0.0], 10, 40, "TRAFFIC", Some(80), FontId::Proportional).unwrap();
        draw_number([0.0, 1.0, 0.0], 0, 0, -3.25, 4, 1, true, FontId::Basic);
        assert_eq!(
            host.drawn(),
            vec![
                "string 10,20 font=0 wrap=- TCAS TA".to_owned(),
                "string 10,40 font=18 wrap=80 TRAFFIC".to_owned(),
                "number 0,0 font=0 -3.25 4.1 sign".to_owned(),
            ]
        );
        assert!(draw_string([0.0; 3], 0, 0, "a\0b", None, FontId::Basic).is_err());
    }

    #[test]
    fn measurement_counts_bytes() {
        let _host = TestHost::new();
        let dims = font_dimensions(FontId::Basic);
        assert_eq!((dims.char_width, dims.char_height, dims.digits_only), (8, 12, false));
        assert_eq!(measure_string(FontId::Basic, "abc"), 24.0);
        assert_eq!(measure_string(FontId::Basic, "é"), 16.0);
    }
}
