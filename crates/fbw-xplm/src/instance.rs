//! Instanced drawing of scenery objects.

use crate::api::xplm;
use crate::error::{XplmError, XplmResult};
use crate::handle::InstanceId;
use crate::scenery::SceneryObject;
use crate::strings::CStrArray;
use std::ffi::c_int;

/// `XPLMDrawInfo_t`: local OpenGL coordinates and orientation in degrees.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawInfo {
    pub struct_size: c_int,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub pitch: f32,
    pub heading: f32,
    pub roll: f32,
}

impl DrawInfo {
    #[inline]
    pub fn new(x: f32, y: f32, z: f32, pitch: f32, heading: f32, roll: f32) -> Self {
        Self {
            struct_size: std::mem::size_of::<Self>() as c_int,
            x,
            y,
            z,
            pitch,
            heading,
            roll,
        }
    }
}

/// An instance of a scenery object, drawn by the host every frame.
pub struct Instance {
    id: InstanceId,
    dataref_count: usize,
    released: bool,
}

impl Instance {
    /// `datarefs` names the per-instance animation datarefs, in the order `set_position`
    /// expects their values.
    pub fn new<S: AsRef<str>>(object: &SceneryObject, datarefs: &[S]) -> XplmResult<Self> {
        let names = CStrArray::new(datarefs)?;
        let raw = unsafe { (xplm().create_instance)(object.id().as_raw(), names.as_ptr()) };
        InstanceId::from_raw(raw)
            .map(|id| Self {
                id,
                dataref_count: datarefs.len(),
                released: false,
            })
            .ok_or_else(|| XplmError::create_failed("instance"))
    }

    /// `data` holds one value per dataref given at creation.
    pub fn set_position(&self, position: &DrawInfo, data: &[f32]) {
        debug_assert_eq!(data.len(), self.dataref_count);
        let ptr = if data.is_empty() {
            std::ptr::null()
        } else {
            data.as_ptr()
        };
        unsafe { (xplm().instance_set_position)(self.id.as_raw(), position, ptr) };
    }

    #[inline]
    pub fn destroy(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        unsafe { (xplm().destroy_instance)(self.id.as_raw()) };
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_host::TestHost;

    #[test]
    fn draw_info_layout() {
        assert_eq!(std::mem::size_of::<DrawInfo>(), 28);
        assert_eq!(DrawInfo::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0).struct_size, 28);
    }

    #[test]
    fn instance_receives_datarefs_and_positions() {
        let host = TestHost::new();
        let obj = SceneryObject::load("lib/airport/aircraft/jets/A320.obj").unwrap();
        let inst = Instance::new(&obj, &["sim/graphics/animation/gear", "fbw/beacon"]).unwrap();
        assert_eq!(
            host.instance_datarefs(),
            vec!["sim/graphics/animation/gear".to_owned(), "fbw/beacon".to_owned()]
        );

        let pos = DrawInfo::new(1.0, 2.0, 3.0, 0.0, 270.0, 0.0);
        inst.set_position(&pos, &[1.0, 0.0]);
        assert_eq!(host.last_instance_position(), Some((pos, vec![1.0, 0.0])));

        inst.destroy();
        assert_eq!(host.calls("XPLMDestroyInstance"), 1);
        drop(obj);
    }

    #[test]
    fn instance_of_unknown_object_fails() {
        let host = TestHost::new();
        let obj = SceneryObject::load("lib/x.obj").unwrap();
        host.refuse_creation(true);
        assert!(Instance::new::<&str>(&obj, &[]).is_err());
    }
}
