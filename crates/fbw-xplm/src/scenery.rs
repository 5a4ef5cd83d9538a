//! Terrain probes, scenery objects and magnetic variation.

use crate::api::{xplm, Handle, Refcon};
use crate::callback::{collect_names, guard, CallbackArena};
use crate::error::{XplmError, XplmResult};
use crate::handle::{ObjectId, ProbeId};
use crate::strings::to_cstring;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::ffi::c_int;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum ProbeType {
    /// Straight down along the local Y axis.
    Y = 0,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeResult {
    HitTerrain,
    Error,
    Missed,
}

impl ProbeResult {
    #[inline]
    fn from_raw(raw: c_int) -> Self {
        match raw {
            0 => Self::HitTerrain,
            2 => Self::Missed,
            _ => Self::Error,
        }
    }
}

/// `XPLMProbeInfo_t`
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeInfo {
    pub struct_size: c_int,
    pub location_x: f32,
    pub location_y: f32,
    pub location_z: f32,
    pub normal_x: f32,
    pub normal_y: f32,
    pub normal_z: f32,
    pub velocity_x: f32,
    pub velocity_y: f32,
    pub velocity_z: f32,
    pub is_wet: c_int,
}

impl ProbeInfo {
    #[inline]
    pub fn is_wet(&self) -> bool {
        self.is_wet != 0
    }
}

impl Default for ProbeInfo {
    fn default() -> Self {
        Self {
            struct_size: std::mem::size_of::<Self>() as c_int,
            location_x: 0.0,
            location_y: 0.0,
            location_z: 0.0,
            normal_x: 0.0,
            normal_y: 0.0,
            normal_z: 0.0,
            velocity_x: 0.0,
            velocity_y: 0.0,
            velocity_z: 0.0,
            is_wet: 0,
        }
    }
}

pub struct Probe {
    id: ProbeId,
    released: bool,
}

impl Probe {
    pub fn new(probe_type: ProbeType) -> XplmResult<Self> {
        let raw = unsafe { (xplm().create_probe)(probe_type as c_int) };
        ProbeId::from_raw(raw)
            .map(|id| Self { id, released: false })
            .ok_or_else(|| XplmError::create_failed("terrain probe"))
    }

    /// Probes the terrain below the local point `(x, y, z)`.
    pub fn terrain_xyz(&self, x: f32, y: f32, z: f32) -> (ProbeResult, ProbeInfo) {
        let mut info = ProbeInfo::default();
        let raw = unsafe { (xplm().probe_terrain_xyz)(self.id.as_raw(), x, y, z, &mut info) };
        (ProbeResult::from_raw(raw), info)
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
        unsafe { (xplm().destroy_probe)(self.id.as_raw()) };
    }
}

impl Drop for Probe {
    fn drop(&mut self) {
        self.release();
    }
}

#[inline]
pub fn magnetic_variation(latitude: f64, longitude: f64) -> f32 {
    unsafe { (xplm().get_magnetic_variation)(latitude, longitude) }
}

#[inline]
pub fn deg_true_to_magnetic(heading_true: f32) -> f32 {
    unsafe { (xplm().deg_true_to_deg_magnetic)(heading_true) }
}

#[inline]
pub fn deg_magnetic_to_true(heading_magnetic: f32) -> f32 {
    unsafe { (xplm().deg_magnetic_to_deg_true)(heading_magnetic) }
}

/// A loaded `.obj` scenery object. Unloaded on [`destroy`](Self::destroy) or drop.
pub struct SceneryObject {
    id: ObjectId,
    released: bool,
}

type LoadResult = XplmResult<SceneryObject>;

thread_local! {
    static LOADS: CallbackArena<Sender<LoadResult>> = CallbackArena::new();
}

pub(crate) fn pending_loads() -> usize {
    LOADS.with(|a| a.len())
}

unsafe extern "C" fn object_loaded(object: Handle, refcon: Refcon) {
    guard("object loaded", (), || {
        let Some(id) = crate::callback::CallbackId::from_refcon(refcon) else {
            return;
        };
        let Some(tx) = LOADS.with(|a| a.remove(id)) else {
            return;
        };
        let result = ObjectId::from_raw(object)
            .map(|id| SceneryObject { id, released: false })
            .ok_or_else(|| XplmError::create_failed("scenery object"));
        // A dropped receiver hands the object back here, and dropping it unloads it.
        let _ = tx.send(result);
    })
}

impl SceneryObject {
    pub fn load(path: &str) -> XplmResult<Self> {
        let path = to_cstring(path)?;
        let raw = unsafe { (xplm().load_object)(path.as_ptr()) };
        ObjectId::from_raw(raw)
            .map(|id| Self { id, released: false })
            .ok_or_else(|| XplmError::create_failed("scenery object"))
    }

    /// Starts a background load. The host completes it on its main thread.
    pub fn load_async(path: &str) -> XplmResult<PendingObject> {
        let path = to_cstring(path)?;
        let (tx, rx) = crossbeam_channel::bounded(1);
        let slot = LOADS.with(|a| a.insert(Rc::new(tx)));
        unsafe { (xplm().load_object_async)(path.as_ptr(), Some(object_loaded), slot.to_refcon()) };
        Ok(PendingObject { rx })
    }

    /// Virtual paths of the library objects matching `path` near the given location.
    pub fn lookup(path: &str, latitude: f32, longitude: f32) -> Vec<String> {
        let Ok(path) = to_cstring(path) else {
            return Vec::new();
        };
        let mut names: Vec<String> = Vec::new();
        unsafe {
            (xplm().lookup_objects)(
                path.as_ptr(),
                latitude,
                longitude,
                Some(collect_names),
                (&mut names as *mut Vec<String>).cast(),
            )
        };
        names
    }

    #[inline]
    pub fn id(&self) -> ObjectId {
        self.id
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
        unsafe { (xplm().unload_object)(self.id.as_raw()) };
    }
}

impl Drop for SceneryObject {
    fn drop(&mut self) {
        self.release();
    }
}

/// Completion of [`SceneryObject::load_async`].
pub struct PendingObject {
    rx: Receiver<LoadResult>,
}

impl PendingObject {
    /// `None` while the host is still loading.
    pub fn try_take(&self) -> Option<LoadResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(XplmError::Cancelled)),
        }
    }

    #[inline]
    pub fn into_receiver(self) -> Receiver<LoadResult> {
        self.rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_host::TestHost;

    #[test]
    fn probe_info_layout() {
        assert_eq!(std::mem::size_of::<ProbeInfo>(), 44);
        let info = ProbeInfo::default();
        assert_eq!(info.struct_size, 44);
        assert!(!info.is_wet());
    }

    #[test]
    fn terrain_probe_reports_hit() {
        let host = TestHost::new();
        host.set_terrain_height(-12.5);
        let probe = Probe::new(ProbeType::Y).unwrap();
        let (result, info) = probe.terrain_xyz(100.0, 500.0, -40.0);
        assert_eq!(result, ProbeResult::HitTerrain);
        assert_eq!((info.location_x, info.location_y, info.location_z), (100.0, -12.5, -40.0));
        assert_eq!(info.normal_y, 1.0);

        probe.destroy();
        assert_eq!(host.calls("XPLMDestroyProbe"), 1);
    }

    #[test]
    fn load_and_unload_once() {
        let host = TestHost::new();
        let obj = SceneryObject::load("lib/airport/vehicles/pushback/tug.obj").unwrap();
        assert_eq!(host.live_objects(), 1);
        obj.destroy();
        assert_eq!(host.live_objects(), 0);
        assert_eq!(host.calls("XPLMUnloadObject"), 1);

        assert!(matches!(
            SceneryObject::load("missing/thing.obj"),
            Err(XplmError::CreateFailed { .. })
        ));
    }

    #[test]
    fn async_load_completes_on_host_callback() {
        let host = TestHost::new();
        let before = pending_loads();
        let pending = SceneryObject::load_async("lib/g10/autogen/tree.obj").unwrap();
        let failing = SceneryObject::load_async("missing/tree.obj").unwrap();
        assert!(pending.try_take().is_none());
        assert_eq!(pending_loads(), before + 2);

        host.complete_object_loads();
        assert_eq!(pending_loads(), before);
        let obj = pending.try_take().unwrap().unwrap();
        assert_eq!(host.live_objects(), 1);
        assert!(matches!(failing.try_take(), Some(Err(XplmError::CreateFailed { .. }))));
        drop(obj);
        assert_eq!(host.live_objects(), 0);
    }

    #[test]
    fn abandoned_async_load_unloads_the_late_object() {
        let host = TestHost::new();
        drop(SceneryObject::load_async("lib/g10/autogen/tree.obj").unwrap());
        host.complete_object_loads();
        assert_eq!(host.calls("XPLMUnloadObject"), 1);
        assert_eq!(host.live_objects(), 0);
    }

    #[test]
    fn lookup_and_magnetic_helpers() {
        let host = TestHost::new();
        host.define_library("lib/airport/Ramp_Equipment/Uniform_Cart.obj", &["a/cart1.obj", "a/cart2.obj"]);
        assert_eq!(
            SceneryObject::lookup("lib/airport/Ramp_Equipment/Uniform_Cart.obj", 47.4, -122.3),
            vec!["a/cart1.obj".to_owned(), "a/cart2.obj".to_owned()]
        );
        assert!(SceneryObject::lookup("lib/none.obj", 0.0, 0.0).is_empty());

        host.set_magnetic_variation(15.0);
        assert_eq!(magnetic_variation(47.4, -122.3), 15.0);
        assert_eq!(deg_true_to_magnetic(90.0), 75.0);
        assert_eq!(deg_magnetic_to_true(75.0), 90.0);
    }
}
