//! Drawing state, textures and coordinate conversion.

use crate::api::xplm;
use std::ffi::c_int;

/// Screen rectangle in boxels. `top` is greater than `bottom`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    #[inline]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    #[inline]
    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    #[inline]
    pub const fn height(&self) -> i32 {
        self.top - self.bottom
    }

    #[inline]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y <= self.top && y > self.bottom
    }

    #[inline]
    pub const fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

/// OpenGL state the host tracks on the plugin's behalf. Fog and lighting are always off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphicsState {
    pub texture_units: i32,
    pub alpha_testing: bool,
    pub alpha_blending: bool,
    pub depth_testing: bool,
    pub depth_writing: bool,
}

pub fn set_state(state: GraphicsState) {
    unsafe {
        (xplm().set_graphics_state)(
            0,
            state.texture_units,
            0,
            state.alpha_testing as c_int,
            state.alpha_blending as c_int,
            state.depth_testing as c_int,
            state.depth_writing as c_int,
        )
    };
}

#[inline]
pub fn bind_texture_2d(texture: i32, unit: i32) {
    unsafe { (xplm().bind_texture_2d)(texture, unit) };
}

/// Fills `ids` with fresh texture names.
pub fn generate_texture_numbers(ids: &mut [i32]) {
    if ids.is_empty() {
        return;
    }
    unsafe { (xplm().generate_texture_numbers)(ids.as_mut_ptr(), ids.len() as c_int) };
}

/// Latitude, longitude (degrees) and altitude (meters MSL) to local OpenGL coordinates.
pub fn world_to_local(latitude: f64, longitude: f64, altitude: f64) -> (f64, f64, f64) {
    let (mut x, mut y, mut z) = (0.0, 0.0, 0.0);
    unsafe { (xplm().world_to_local)(latitude, longitude, altitude, &mut x, &mut y, &mut z) };
    (x, y, z)
}

pub fn local_to_world(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let (mut lat, mut lon, mut alt) = (0.0, 0.0, 0.0);
    unsafe { (xplm().local_to_world)(x, y, z, &mut lat, &mut lon, &mut alt) };
    (lat, lon, alt)
}

#[inline]
pub fn draw_translucent_dark_box(rect: Rect) {
    unsafe { (xplm().draw_translucent_dark_box)(rect.left, rect.top, rect.right, rect.bottom) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_host::TestHost;

    #[test]
    fn rect_geometry() {
        let r = Rect::new(10, 110, 210, 10);
        assert_eq!((r.width(), r.height()), (200, 100));
        assert!(r.contains(10, 110));
        assert!(!r.contains(210, 50));
        assert_eq!(r.offset(5, -5), Rect::new(15, 105, 215, 5));
    }

    #[test]
    fn state_is_forwarded_with_fog_and_lighting_off() {
        let host = TestHost::new();
        set_state(GraphicsState {
            texture_units: 1,
            alpha_blending: true,
            ..Default::default()
        });
        assert_eq!(host.graphics_state(), Some([0, 1, 0, 0, 1, 0, 0]));
    }

    #[test]
    fn texture_numbers_and_coordinates() {
        let host = TestHost::new();
        let mut ids = [0; 3];
        generate_texture_numbers(&mut ids);
        assert_eq!(ids, [1, 2, 3]);
        generate_texture_numbers(&mut []);
        assert_eq!(host.calls("XPLMGenerateTextureNumbers"), 1);

        let (x, y, z) = world_to_local(47.0, -122.0, 100.0);
        assert_eq!(local_to_world(x, y, z), (47.0, -122.0, 100.0));

        draw_translucent_dark_box(Rect::new(0, 50, 100, 0));
        assert_eq!(host.drawn(), vec!["dark_box 0,50,100,0".to_owned()]);
    }
}
