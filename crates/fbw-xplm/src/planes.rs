//! User aircraft placement and multiplayer plane acquisition.

use crate::api::{xplm, Refcon};
use crate::callback::guard;
use crate::error::{XplmError, XplmResult};
use crate::plugin::PluginId;
use crate::strings::{to_cstring, CStrArray, FixedBuf, INFO_BUF, PATH_BUF};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::cell::RefCell;
use std::ffi::c_int;

pub fn set_users_aircraft(path: &str) -> XplmResult<()> {
    let path = to_cstring(path)?;
    unsafe { (xplm().set_users_aircraft)(path.as_ptr()) };
    Ok(())
}

pub fn place_user_at_airport(code: &str) -> XplmResult<()> {
    let code = to_cstring(code)?;
    unsafe { (xplm().place_user_at_airport)(code.as_ptr()) };
    Ok(())
}

#[inline]
pub fn place_user_at_location(
    latitude: f64,
    longitude: f64,
    elevation_msl: f32,
    heading_true: f32,
    speed: f32,
) {
    unsafe {
        (xplm().place_user_at_location)(latitude, longitude, elevation_msl, heading_true, speed)
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AircraftCount {
    pub total: i32,
    pub active: i32,
    /// Plugin currently holding the planes.
    pub controller: Option<PluginId>,
}

pub fn count_aircraft() -> AircraftCount {
    let (mut total, mut active, mut controller) = (0, 0, -1);
    unsafe { (xplm().count_aircraft)(&mut total, &mut active, &mut controller) };
    AircraftCount {
        total,
        active,
        controller: PluginId::from_raw(controller),
    }
}

/// File name and full path of the model loaded for aircraft `index` (0 is the user).
pub fn nth_aircraft_model(index: i32) -> (String, String) {
    let mut file = FixedBuf::<INFO_BUF>::new();
    let mut path = FixedBuf::<PATH_BUF>::new();
    unsafe { (xplm().get_nth_aircraft_model)(index, file.as_mut_ptr(), path.as_mut_ptr()) };
    (file.to_string_lossy(), path.to_string_lossy())
}

/// Exclusive control of the AI aircraft. Released on [`destroy`](Self::destroy) or drop.
pub struct Planes {
    released: bool,
}

pub enum Acquisition {
    Acquired(Planes),
    Pending(PendingPlanes),
}

type AcquireResult = XplmResult<Planes>;

thread_local! {
    // At most one request is waiting on the host.
    static PENDING: RefCell<Option<Sender<AcquireResult>>> = const { RefCell::new(None) };
}

unsafe extern "C" fn planes_available(_refcon: Refcon) {
    guard("planes available", (), || {
        let Some(tx) = PENDING.with(|p| p.borrow_mut().take()) else {
            return;
        };
        // Nobody is waiting any more: the returned value is dropped, which releases the planes.
        let _ = tx.send(Ok(Planes { released: false }));
    })
}

impl Planes {
    /// Requests the AI planes, loading `aircraft` models into slots 1 and up.
    ///
    /// A request made while another is still pending cancels the older one.
    pub fn acquire<S: AsRef<str>>(aircraft: &[S]) -> XplmResult<Acquisition> {
        let models = CStrArray::new(aircraft)?;
        let (tx, rx) = crossbeam_channel::bounded(1);
        if let Some(prev) = PENDING.with(|p| p.borrow_mut().replace(tx)) {
            log::debug!(target: "fbw_xplm", "plane acquisition superseded by a newer request");
            let _ = prev.send(Err(XplmError::Cancelled));
        }
        let granted =
            unsafe { (xplm().acquire_planes)(models.as_ptr(), Some(planes_available), std::ptr::null_mut()) };
        if granted != 0 {
            PENDING.with(|p| p.borrow_mut().take());
            return Ok(Acquisition::Acquired(Planes { released: false }));
        }
        Ok(Acquisition::Pending(PendingPlanes { rx }))
    }

    pub fn set_aircraft_model(&self, index: i32, path: &str) -> XplmResult<()> {
        debug_assert!(!self.released);
        let path = to_cstring(path)?;
        unsafe { (xplm().set_aircraft_model)(index as c_int, path.as_ptr()) };
        Ok(())
    }

    #[inline]
    pub fn disable_ai_for_plane(&self, index: i32) {
        debug_assert!(!self.released);
        unsafe { (xplm().disable_ai_for_plane)(index) };
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
        unsafe { (xplm().release_planes)() };
    }
}

impl Drop for Planes {
    fn drop(&mut self) {
        self.release();
    }
}

/// Outstanding [`Planes::acquire`] request.
pub struct PendingPlanes {
    rx: Receiver<AcquireResult>,
}

impl PendingPlanes {
    /// `None` while the planes are still held by someone else.
    pub fn try_take(&self) -> Option<AcquireResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(XplmError::Cancelled)),
        }
    }

    #[inline]
    pub fn into_receiver(self) -> Receiver<AcquireResult> {
        self.rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_host::TestHost;

    #[test]
    fn placement_and_model_queries() {
        let host = TestHost::new();
        set_users_aircraft("Aircraft/Laminar Research/Cessna 172SP/Cessna_172SP.acf").unwrap();
        assert_eq!(
            nth_aircraft_model(0),
            (
                "Cessna_172SP.acf".to_owned(),
                "Aircraft/Laminar Research/Cessna 172SP/Cessna_172SP.acf".to_owned()
            )
        );
        place_user_at_airport("KSEA").unwrap();
        assert_eq!(host.calls("XPLMPlaceUserAtAirport"), 1);
        assert!(place_user_at_airport("KS\0EA").is_err());

        let count = count_aircraft();
        assert_eq!((count.total, count.active), (20, 1));
        assert_eq!(count.controller, None);
    }

    #[test]
    fn immediate_grant_releases_once() {
        let host = TestHost::new();
        let Acquisition::Acquired(planes) = Planes::acquire(&["a.acf", "b.acf"]).unwrap() else {
            panic!("expected immediate grant");
        };
        assert_eq!(host.acquired_models(), vec!["a.acf".to_owned(), "b.acf".to_owned()]);
        planes.set_aircraft_model(1, "c.acf").unwrap();
        planes.disable_ai_for_plane(1);
        planes.destroy();
        assert_eq!(host.calls("XPLMReleasePlanes"), 1);
    }

    #[test]
    fn newer_request_cancels_pending_one() {
        let host = TestHost::new();
        host.hold_planes(true);
        let Acquisition::Pending(first) = Planes::acquire::<&str>(&[]).unwrap() else {
            panic!("expected pending");
        };
        let Acquisition::Pending(second) = Planes::acquire::<&str>(&[]).unwrap() else {
            panic!("expected pending");
        };
        assert!(matches!(first.try_take(), Some(Err(XplmError::Cancelled))));
        assert!(second.try_take().is_none());

        host.hold_planes(false);
        host.planes_available();
        let planes = second.try_take().unwrap().unwrap();
        drop(planes);
        assert_eq!(host.calls("XPLMReleasePlanes"), 1);
    }

    #[test]
    fn late_grant_without_receiver_is_released() {
        let host = TestHost::new();
        host.hold_planes(true);
        drop(Planes::acquire::<&str>(&[]).unwrap());
        host.planes_available();
        assert_eq!(host.calls("XPLMReleasePlanes"), 1);
    }
}
