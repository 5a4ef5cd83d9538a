//! Flight loop callbacks scheduled by the host.

use crate::api::{xplm, FlightLoopFn, Refcon};
use crate::callback::{guard, CallbackArena, CallbackId};
use crate::error::{XplmError, XplmResult};
use crate::handle::FlightLoopId;
use std::cell::RefCell;
use std::ffi::c_int;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum FlightLoopPhase {
    BeforeFlightModel = 0,
    AfterFlightModel = 1,
}

/// `XPLMCreateFlightLoop_t`
#[repr(C)]
#[derive(Debug)]
pub struct CreateFlightLoop {
    pub struct_size: c_int,
    pub phase: c_int,
    pub callback: FlightLoopFn,
    pub refcon: Refcon,
}

impl CreateFlightLoop {
    #[inline]
    pub fn new(phase: FlightLoopPhase, callback: FlightLoopFn, refcon: Refcon) -> Self {
        Self {
            struct_size: std::mem::size_of::<Self>() as c_int,
            phase: phase as c_int,
            callback,
            refcon,
        }
    }
}

/// Arguments: seconds since this loop last ran, seconds since the last flight loop, and the
/// loop counter. Returns the next interval: seconds when positive, flight loops when negative,
/// zero to stop.
type LoopFn = RefCell<Box<dyn FnMut(f32, f32, i32) -> f32>>;

thread_local! {
    static LOOPS: CallbackArena<LoopFn> = CallbackArena::new();
}

pub(crate) fn live_callbacks() -> usize {
    LOOPS.with(|a| a.len())
}

unsafe extern "C" fn flight_loop_trampoline(
    since_last_call: f32,
    since_last_loop: f32,
    counter: c_int,
    refcon: Refcon,
) -> f32 {
    guard("flight loop", 0.0, || {
        let Some(ctx) = LOOPS.with(|a| a.resolve(refcon)) else {
            return 0.0;
        };
        let Ok(mut callback) = ctx.try_borrow_mut() else {
            return 0.0;
        };
        callback(since_last_call, since_last_loop, counter)
    })
}

/// A host flight loop. Created unscheduled; call [`FlightLoop::schedule`] to start it.
pub struct FlightLoop {
    id: FlightLoopId,
    ctx: CallbackId,
    released: bool,
}

impl FlightLoop {
    pub fn new<F>(phase: FlightLoopPhase, callback: F) -> XplmResult<Self>
    where
        F: FnMut(f32, f32, i32) -> f32 + 'static,
    {
        let boxed: Box<dyn FnMut(f32, f32, i32) -> f32> = Box::new(callback);
        let ctx = LOOPS.with(|a| a.insert(Rc::new(RefCell::new(boxed))));
        let mut params = CreateFlightLoop::new(phase, Some(flight_loop_trampoline), ctx.to_refcon());

        let raw = unsafe { (xplm().create_flight_loop)(&mut params) };
        match FlightLoopId::from_raw(raw) {
            Some(id) => Ok(Self {
                id,
                ctx,
                released: false,
            }),
            None => {
                LOOPS.with(|a| a.remove(ctx));
                Err(XplmError::create_failed("flight loop"))
            }
        }
    }

    #[inline]
    pub fn id(&self) -> FlightLoopId {
        self.id
    }

    /// Schedules the next call. `interval` follows the callback return convention.
    pub fn schedule(&self, interval: f32, relative_to_now: bool) {
        unsafe {
            (xplm().schedule_flight_loop)(self.id.as_raw(), interval, relative_to_now as c_int)
        };
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
        unsafe { (xplm().destroy_flight_loop)(self.id.as_raw()) };
        LOOPS.with(|a| a.remove(self.ctx));
    }
}

impl Drop for FlightLoop {
    fn drop(&mut self) {
        self.release();
    }
}

/// Seconds since the simulator started.
#[inline]
pub fn elapsed_time() -> f32 {
    unsafe { (xplm().get_elapsed_time)() }
}

#[inline]
pub fn cycle_number() -> i32 {
    unsafe { (xplm().get_cycle_number)() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_host::TestHost;
    use std::cell::Cell;

    #[test]
    fn create_struct_has_size_first() {
        let params = CreateFlightLoop::new(FlightLoopPhase::AfterFlightModel, None, std::ptr::null_mut());
        assert_eq!(params.struct_size as usize, std::mem::size_of::<CreateFlightLoop>());
        #[cfg(target_pointer_width = "64")]
        assert_eq!(std::mem::size_of::<CreateFlightLoop>(), 24);
        assert_eq!(params.phase, 1);
    }

    #[test]
    fn scheduled_loop_runs_until_it_returns_zero() {
        let host = TestHost::new();
        let runs = Rc::new(Cell::new(0));
        let seen = runs.clone();
        let fl = FlightLoop::new(FlightLoopPhase::BeforeFlightModel, move |_, _, _| {
            seen.set(seen.get() + 1);
            if seen.get() < 3 {
                -1.0
            } else {
                0.0
            }
        })
        .unwrap();
        assert_eq!(host.last_flight_loop_struct_size(), std::mem::size_of::<CreateFlightLoop>());

        host.run_flight_loops(0.05);
        assert_eq!(runs.get(), 0, "unscheduled loops do not run");

        fl.schedule(-1.0, true);
        for _ in 0..5 {
            host.run_flight_loops(0.05);
        }
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn destroy_releases_host_loop_and_context_once() {
        let host = TestHost::new();
        let before = live_callbacks();
        let fl = FlightLoop::new(FlightLoopPhase::AfterFlightModel, |_, _, _| 1.0).unwrap();
        assert_eq!(live_callbacks(), before + 1);
        assert_eq!(host.live_flight_loops(), 1);

        fl.destroy();
        assert_eq!(host.calls("XPLMDestroyFlightLoop"), 1);
        assert_eq!(host.live_flight_loops(), 0);
        assert_eq!(live_callbacks(), before);

        {
            let _scoped = FlightLoop::new(FlightLoopPhase::AfterFlightModel, |_, _, _| 1.0).unwrap();
        }
        assert_eq!(host.calls("XPLMDestroyFlightLoop"), 2);
    }

    #[test]
    fn panicking_callback_returns_zero_to_host() {
        let host = TestHost::new();
        let fl = FlightLoop::new(FlightLoopPhase::AfterFlightModel, |_, _, _| -> f32 {
            panic!("flight model diverged")
        })
        .unwrap();
        fl.schedule(1.0, true);
        host.run_flight_loops(1.0);

        assert_eq!(host.flight_loop_interval(fl.id()), Some(0.0));
        assert!(host.debug_log().contains("flight model diverged"));
    }

    #[test]
    fn refused_creation_is_an_error() {
        let host = TestHost::new();
        host.refuse_creation(true);
        let res = FlightLoop::new(FlightLoopPhase::AfterFlightModel, |_, _, _| 0.0);
        assert!(matches!(res, Err(XplmError::CreateFailed { what: "flight loop" })));
    }

    #[test]
    fn timing_queries_read_the_host() {
        let host = TestHost::new();
        host.run_flight_loops(0.5);
        host.run_flight_loops(0.25);
        assert_eq!(cycle_number(), 2);
        assert!((elapsed_time() - 0.75).abs() < 1e-6);
    }
}
