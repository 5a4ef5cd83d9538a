#![forbid(unsafe_op_in_unsafe_fn)]

//! Datarefs: host simulation variables, plugin-provided accessors and shared data.

use crate::api::{xplm, Refcon};
use crate::callback::{guard, CallbackArena, CallbackId};
use crate::error::{XplmError, XplmResult};
use crate::handle::DataRefId;
use crate::strings::{from_nul_padded, to_cstring};
use bitflags::bitflags;
use bytemuck::Pod;
use std::cell::RefCell;
use std::ffi::{c_int, c_void, CString};
use std::rc::Rc;

bitflags! {
    /// `XPLMDataTypeID`
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct DataTypes: c_int {
        const INT = 1;
        const FLOAT = 2;
        const DOUBLE = 4;
        const FLOAT_ARRAY = 8;
        const INT_ARRAY = 16;
        const DATA = 32;
    }
}

#[inline]
fn c_len(len: usize) -> c_int {
    c_int::try_from(len).unwrap_or(c_int::MAX)
}

#[inline]
fn c_offset(offset: usize) -> c_int {
    c_int::try_from(offset).unwrap_or(c_int::MAX)
}

/// A host dataref. Datarefs are owned by the host and stay valid while the simulator runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataRef {
    id: DataRefId,
}

impl DataRef {
    pub fn find(name: &str) -> Option<Self> {
        let name = to_cstring(name).ok()?;
        let raw = unsafe { (xplm().find_data_ref)(name.as_ptr()) };
        DataRefId::from_raw(raw).map(|id| Self { id })
    }

    #[inline]
    pub fn id(&self) -> DataRefId {
        self.id
    }

    #[inline]
    fn raw(&self) -> *mut c_void {
        self.id.as_raw()
    }

    #[inline]
    pub fn can_write(&self) -> bool {
        unsafe { (xplm().can_write_data_ref)(self.raw()) != 0 }
    }

    /// False once the plugin providing the dataref has unregistered it.
    #[inline]
    pub fn is_good(&self) -> bool {
        unsafe { (xplm().is_data_ref_good)(self.raw()) != 0 }
    }

    #[inline]
    pub fn types(&self) -> DataTypes {
        DataTypes::from_bits_retain(unsafe { (xplm().get_data_ref_types)(self.raw()) })
    }

    #[inline]
    pub fn get_int(&self) -> i32 {
        unsafe { (xplm().get_datai)(self.raw()) }
    }

    #[inline]
    pub fn set_int(&self, value: i32) {
        unsafe { (xplm().set_datai)(self.raw(), value) }
    }

    #[inline]
    pub fn get_float(&self) -> f32 {
        unsafe { (xplm().get_dataf)(self.raw()) }
    }

    #[inline]
    pub fn set_float(&self, value: f32) {
        unsafe { (xplm().set_dataf)(self.raw(), value) }
    }

    #[inline]
    pub fn get_double(&self) -> f64 {
        unsafe { (xplm().get_datad)(self.raw()) }
    }

    #[inline]
    pub fn set_double(&self, value: f64) {
        unsafe { (xplm().set_datad)(self.raw(), value) }
    }

    #[inline]
    pub fn int_vector(&self, offset: usize) -> IntVector {
        IntVector {
            data_ref: *self,
            offset,
        }
    }

    #[inline]
    pub fn float_vector(&self, offset: usize) -> FloatVector {
        FloatVector {
            data_ref: *self,
            offset,
        }
    }

    #[inline]
    pub fn byte_vector(&self, offset: usize) -> ByteVector {
        ByteVector {
            data_ref: *self,
            offset,
        }
    }

    /// Reads the byte array as UTF-8 text, up to the first NUL.
    pub fn get_string(&self) -> String {
        let bytes = self.byte_vector(0);
        let mut buf = vec![0u8; bytes.count()];
        let read = bytes.read(&mut buf);
        buf.truncate(read);
        from_nul_padded(&buf)
    }

    /// Writes `value` followed by a NUL terminator.
    pub fn set_string(&self, value: &str) {
        let mut bytes = Vec::with_capacity(value.len() + 1);
        bytes.extend_from_slice(value.as_bytes());
        bytes.push(0);
        self.byte_vector(0).write(&bytes);
    }

    /// Reads a plain-old-data struct from the byte array.
    pub fn get_data<T: Pod>(&self) -> T {
        let mut value = T::zeroed();
        let read = self.byte_vector(0).read(bytemuck::bytes_of_mut(&mut value));
        debug_assert!(read <= std::mem::size_of::<T>());
        value
    }

    pub fn set_data<T: Pod>(&self, value: &T) {
        self.byte_vector(0).write(bytemuck::bytes_of(value));
    }
}

macro_rules! vector_view {
    ($(#[$meta:meta])* $name:ident, $elem:ty, $get:ident, $set:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name {
            data_ref: DataRef,
            offset: usize,
        }

        impl $name {
            /// Total element count of the host array.
            #[inline]
            pub fn count(&self) -> usize {
                let n = unsafe { (xplm().$get)(self.data_ref.raw(), std::ptr::null_mut(), 0, 0) };
                n.max(0) as usize
            }

            /// Copies from the view's offset into `dst` and returns the element count the host
            /// reports. An empty `dst` is a probe: nothing is copied and the total is returned.
            pub fn read(&self, dst: &mut [$elem]) -> usize {
                let ptr = if dst.is_empty() {
                    std::ptr::null_mut()
                } else {
                    dst.as_mut_ptr()
                };
                let n = unsafe {
                    (xplm().$get)(self.data_ref.raw(), ptr.cast(), c_offset(self.offset), c_len(dst.len()))
                };
                n.max(0) as usize
            }

            /// Writes `src` starting at the view's offset. Bounds are the caller's concern.
            pub fn write(&self, src: &[$elem]) {
                unsafe {
                    (xplm().$set)(
                        self.data_ref.raw(),
                        src.as_ptr().cast_mut().cast(),
                        c_offset(self.offset),
                        c_len(src.len()),
                    )
                };
            }
        }
    };
}

vector_view!(
    /// `int` array dataref view starting at an offset.
    IntVector, i32, get_datavi, set_datavi
);
vector_view!(
    /// `float` array dataref view starting at an offset.
    FloatVector, f32, get_datavf, set_datavf
);
vector_view!(
    /// Byte array dataref view starting at an offset.
    ByteVector, u8, get_datab, set_datab
);

/// Plugin side of a registered dataref.
///
/// Only the callbacks matching the registered [`DataTypes`] are handed to the host; the
/// defaults read as zero and ignore writes.
pub trait Accessor {
    fn int(&self) -> i32 {
        0
    }
    fn set_int(&mut self, _value: i32) {}

    fn float(&self) -> f32 {
        0.0
    }
    fn set_float(&mut self, _value: f32) {}

    fn double(&self) -> f64 {
        0.0
    }
    fn set_double(&mut self, _value: f64) {}

    fn int_count(&self) -> usize {
        0
    }
    fn read_ints(&self, _offset: usize, _dst: &mut [i32]) -> usize {
        0
    }
    fn write_ints(&mut self, _offset: usize, _src: &[i32]) {}

    fn float_count(&self) -> usize {
        0
    }
    fn read_floats(&self, _offset: usize, _dst: &mut [f32]) -> usize {
        0
    }
    fn write_floats(&mut self, _offset: usize, _src: &[f32]) {}

    fn byte_count(&self) -> usize {
        0
    }
    fn read_bytes(&self, _offset: usize, _dst: &mut [u8]) -> usize {
        0
    }
    fn write_bytes(&mut self, _offset: usize, _src: &[u8]) {}
}

/// Accessor with a fixed set of types it serves.
pub trait TypedAccessor: Accessor {
    const TYPES: DataTypes;
}

// Host input is untrusted: offsets past the end read and write nothing.
fn read_clamped<T: Copy>(src: &[T], offset: usize, dst: &mut [T]) -> usize {
    let Some(tail) = src.get(offset..) else {
        return 0;
    };
    let n = tail.len().min(dst.len());
    dst[..n].copy_from_slice(&tail[..n]);
    n
}

fn write_clamped<T: Copy>(dst: &mut [T], offset: usize, src: &[T]) {
    let Some(tail) = dst.get_mut(offset..) else {
        return;
    };
    let n = tail.len().min(src.len());
    tail[..n].copy_from_slice(&src[..n]);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntAccessor {
    pub value: i32,
}

impl Accessor for IntAccessor {
    fn int(&self) -> i32 {
        self.value
    }
    fn set_int(&mut self, value: i32) {
        self.value = value;
    }
    fn float(&self) -> f32 {
        self.value as f32
    }
    fn set_float(&mut self, value: f32) {
        self.value = value as i32;
    }
    fn double(&self) -> f64 {
        self.value as f64
    }
    fn set_double(&mut self, value: f64) {
        self.value = value as i32;
    }
}

impl TypedAccessor for IntAccessor {
    const TYPES: DataTypes = DataTypes::INT.union(DataTypes::FLOAT).union(DataTypes::DOUBLE);
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FloatAccessor {
    pub value: f32,
}

impl Accessor for FloatAccessor {
    fn float(&self) -> f32 {
        self.value
    }
    fn set_float(&mut self, value: f32) {
        self.value = value;
    }
    fn double(&self) -> f64 {
        self.value as f64
    }
    fn set_double(&mut self, value: f64) {
        self.value = value as f32;
    }
}

impl TypedAccessor for FloatAccessor {
    const TYPES: DataTypes = DataTypes::FLOAT.union(DataTypes::DOUBLE);
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DoubleAccessor {
    pub value: f64,
}

impl Accessor for DoubleAccessor {
    fn float(&self) -> f32 {
        self.value as f32
    }
    fn set_float(&mut self, value: f32) {
        self.value = value as f64;
    }
    fn double(&self) -> f64 {
        self.value
    }
    fn set_double(&mut self, value: f64) {
        self.value = value;
    }
}

impl TypedAccessor for DoubleAccessor {
    const TYPES: DataTypes = DataTypes::FLOAT.union(DataTypes::DOUBLE);
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntArrayAccessor {
    pub values: Vec<i32>,
}

impl Accessor for IntArrayAccessor {
    fn int_count(&self) -> usize {
        self.values.len()
    }
    fn read_ints(&self, offset: usize, dst: &mut [i32]) -> usize {
        read_clamped(&self.values, offset, dst)
    }
    fn write_ints(&mut self, offset: usize, src: &[i32]) {
        write_clamped(&mut self.values, offset, src);
    }
}

impl TypedAccessor for IntArrayAccessor {
    const TYPES: DataTypes = DataTypes::INT_ARRAY;
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FloatArrayAccessor {
    pub values: Vec<f32>,
}

impl Accessor for FloatArrayAccessor {
    fn float_count(&self) -> usize {
        self.values.len()
    }
    fn read_floats(&self, offset: usize, dst: &mut [f32]) -> usize {
        read_clamped(&self.values, offset, dst)
    }
    fn write_floats(&mut self, offset: usize, src: &[f32]) {
        write_clamped(&mut self.values, offset, src);
    }
}

impl TypedAccessor for FloatArrayAccessor {
    const TYPES: DataTypes = DataTypes::FLOAT_ARRAY;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataAccessor {
    pub bytes: Vec<u8>,
}

impl Accessor for DataAccessor {
    fn byte_count(&self) -> usize {
        self.bytes.len()
    }
    fn read_bytes(&self, offset: usize, dst: &mut [u8]) -> usize {
        read_clamped(&self.bytes, offset, dst)
    }
    fn write_bytes(&mut self, offset: usize, src: &[u8]) {
        write_clamped(&mut self.bytes, offset, src);
    }
}

impl TypedAccessor for DataAccessor {
    const TYPES: DataTypes = DataTypes::DATA;
}

/// Serves a plain-old-data struct as a byte array dataref.
#[derive(Clone, Copy, Debug, Default)]
pub struct PodAccessor<T: Pod> {
    pub value: T,
}

impl<T: Pod> Accessor for PodAccessor<T> {
    fn byte_count(&self) -> usize {
        std::mem::size_of::<T>()
    }
    fn read_bytes(&self, offset: usize, dst: &mut [u8]) -> usize {
        read_clamped(bytemuck::bytes_of(&self.value), offset, dst)
    }
    fn write_bytes(&mut self, offset: usize, src: &[u8]) {
        write_clamped(bytemuck::bytes_of_mut(&mut self.value), offset, src);
    }
}

impl<T: Pod> TypedAccessor for PodAccessor<T> {
    const TYPES: DataTypes = DataTypes::DATA;
}

type AccessorCell = RefCell<dyn Accessor>;

thread_local! {
    static ACCESSORS: CallbackArena<AccessorCell> = CallbackArena::new();
    static SHARED: CallbackArena<RefCell<Box<dyn FnMut()>>> = CallbackArena::new();
}

pub(crate) fn live_callbacks() -> usize {
    ACCESSORS.with(|a| a.len()) + SHARED.with(|a| a.len())
}

#[inline]
fn accessor(refcon: Refcon) -> Option<Rc<AccessorCell>> {
    ACCESSORS.with(|a| a.resolve(refcon))
}

fn read_with<R: Default>(refcon: Refcon, f: impl FnOnce(&dyn Accessor) -> R) -> R {
    guard("dataref read", R::default(), || {
        let Some(cell) = accessor(refcon) else {
            return R::default();
        };
        let Ok(acc) = cell.try_borrow() else {
            return R::default();
        };
        f(&*acc)
    })
}

fn write_with(refcon: Refcon, f: impl FnOnce(&mut dyn Accessor)) {
    guard("dataref write", (), || {
        let Some(cell) = accessor(refcon) else {
            return;
        };
        if let Ok(mut acc) = cell.try_borrow_mut() {
            f(&mut *acc);
        };
    })
}

unsafe extern "C" fn read_int(refcon: Refcon) -> c_int {
    read_with(refcon, |a| a.int())
}

unsafe extern "C" fn write_int(refcon: Refcon, value: c_int) {
    write_with(refcon, |a| a.set_int(value))
}

unsafe extern "C" fn read_float(refcon: Refcon) -> f32 {
    read_with(refcon, |a| a.float())
}

unsafe extern "C" fn write_float(refcon: Refcon, value: f32) {
    write_with(refcon, |a| a.set_float(value))
}

unsafe extern "C" fn read_double(refcon: Refcon) -> f64 {
    read_with(refcon, |a| a.double())
}

unsafe extern "C" fn write_double(refcon: Refcon, value: f64) {
    write_with(refcon, |a| a.set_double(value))
}

macro_rules! vector_trampolines {
    ($read:ident, $write:ident, $elem:ty, $count:ident, $read_fn:ident, $write_fn:ident) => {
        /// A NULL destination asks for the element count.
        unsafe extern "C" fn $read(refcon: Refcon, values: *mut $elem, offset: c_int, max: c_int) -> c_int {
            read_with(refcon, |a| {
                if values.is_null() {
                    return c_len(a.$count());
                }
                let (Ok(offset), Ok(max)) = (usize::try_from(offset), usize::try_from(max)) else {
                    return 0;
                };
                let dst = unsafe { std::slice::from_raw_parts_mut(values, max) };
                c_len(a.$read_fn(offset, dst))
            })
        }

        unsafe extern "C" fn $write(refcon: Refcon, values: *mut $elem, offset: c_int, count: c_int) {
            if values.is_null() {
                return;
            }
            let (Ok(offset), Ok(count)) = (usize::try_from(offset), usize::try_from(count)) else {
                return;
            };
            let src = unsafe { std::slice::from_raw_parts(values, count) };
            write_with(refcon, |a| a.$write_fn(offset, src))
        }
    };
}

vector_trampolines!(read_int_vector, write_int_vector, c_int, int_count, read_ints, write_ints);
vector_trampolines!(read_float_vector, write_float_vector, f32, float_count, read_floats, write_floats);
vector_trampolines!(read_byte_vector_raw, write_byte_vector_raw, u8, byte_count, read_bytes, write_bytes);

unsafe extern "C" fn read_byte_vector(refcon: Refcon, values: *mut c_void, offset: c_int, max: c_int) -> c_int {
    unsafe { read_byte_vector_raw(refcon, values.cast(), offset, max) }
}

unsafe extern "C" fn write_byte_vector(refcon: Refcon, values: *mut c_void, offset: c_int, count: c_int) {
    unsafe { write_byte_vector_raw(refcon, values.cast(), offset, count) }
}

/// A dataref this plugin provides. Unregistered on [`destroy`](Self::destroy) or drop.
pub struct DataRefRegistration<A: Accessor + 'static> {
    data_ref: DataRef,
    accessor: Rc<RefCell<A>>,
    ctx: CallbackId,
    released: bool,
}

impl<A: TypedAccessor + 'static> DataRefRegistration<A> {
    /// Registers with the types the accessor serves.
    #[inline]
    pub fn new(name: &str, writable: bool, accessor: A) -> XplmResult<Self> {
        Self::register(name, A::TYPES, writable, accessor)
    }
}

impl<A: Accessor + 'static> DataRefRegistration<A> {
    pub fn register(name: &str, types: DataTypes, writable: bool, accessor: A) -> XplmResult<Self> {
        let name = to_cstring(name)?;
        let accessor = Rc::new(RefCell::new(accessor));
        let shared: Rc<AccessorCell> = accessor.clone();
        let ctx = ACCESSORS.with(|a| a.insert(shared));

        let refcon = ctx.to_refcon();
        let w = |t: DataTypes| writable && types.contains(t);
        let raw = unsafe {
            (xplm().register_data_accessor)(
                name.as_ptr(),
                types.bits(),
                writable as c_int,
                types.contains(DataTypes::INT).then_some(read_int as _),
                w(DataTypes::INT).then_some(write_int as _),
                types.contains(DataTypes::FLOAT).then_some(read_float as _),
                w(DataTypes::FLOAT).then_some(write_float as _),
                types.contains(DataTypes::DOUBLE).then_some(read_double as _),
                w(DataTypes::DOUBLE).then_some(write_double as _),
                types.contains(DataTypes::INT_ARRAY).then_some(read_int_vector as _),
                w(DataTypes::INT_ARRAY).then_some(write_int_vector as _),
                types.contains(DataTypes::FLOAT_ARRAY).then_some(read_float_vector as _),
                w(DataTypes::FLOAT_ARRAY).then_some(write_float_vector as _),
                types.contains(DataTypes::DATA).then_some(read_byte_vector as _),
                w(DataTypes::DATA).then_some(write_byte_vector as _),
                refcon,
                if writable { refcon } else { std::ptr::null_mut() },
            )
        };

        match DataRefId::from_raw(raw) {
            Some(id) => {
                log::debug!(target: "fbw_xplm", "registered dataref {name:?} types={types:?}");
                Ok(Self {
                    data_ref: DataRef { id },
                    accessor,
                    ctx,
                    released: false,
                })
            }
            None => {
                ACCESSORS.with(|a| a.remove(ctx));
                Err(XplmError::create_failed("dataref"))
            }
        }
    }

    #[inline]
    pub fn data_ref(&self) -> DataRef {
        self.data_ref
    }

    /// Borrows the accessor. Must not be called from inside one of its own callbacks.
    pub fn with_accessor<R>(&self, f: impl FnOnce(&mut A) -> R) -> R {
        f(&mut self.accessor.borrow_mut())
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
        unsafe { (xplm().unregister_data_accessor)(self.data_ref.raw()) };
        ACCESSORS.with(|a| a.remove(self.ctx));
    }
}

impl<A: Accessor + 'static> Drop for DataRefRegistration<A> {
    fn drop(&mut self) {
        self.release();
    }
}

unsafe extern "C" fn shared_data_changed(refcon: Refcon) {
    guard("shared data notification", (), || {
        let Some(ctx) = SHARED.with(|a| a.resolve(refcon)) else {
            return;
        };
        if let Ok(mut notify) = ctx.try_borrow_mut() {
            notify();
        };
    })
}

/// A subscription to a dataref shared between plugins.
pub struct SharedData {
    name: CString,
    types: DataTypes,
    ctx: CallbackId,
    released: bool,
}

impl SharedData {
    /// Returns `None` when the name is already shared with a different type.
    pub fn share(name: &str, types: DataTypes, notify: impl FnMut() + 'static) -> XplmResult<Option<Self>> {
        let name = to_cstring(name)?;
        let notify: Box<dyn FnMut()> = Box::new(notify);
        let ctx = SHARED.with(|a| a.insert(Rc::new(RefCell::new(notify))));

        let ok = unsafe {
            (xplm().share_data)(name.as_ptr(), types.bits(), Some(shared_data_changed), ctx.to_refcon())
        };
        if ok == 0 {
            SHARED.with(|a| a.remove(ctx));
            return Ok(None);
        }
        Ok(Some(Self {
            name,
            types,
            ctx,
            released: false,
        }))
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.name.to_str().unwrap_or_default()
    }

    #[inline]
    pub fn types(&self) -> DataTypes {
        self.types
    }

    #[inline]
    pub fn find_data_ref(&self) -> Option<DataRef> {
        let raw = unsafe { (xplm().find_data_ref)(self.name.as_ptr()) };
        DataRefId::from_raw(raw).map(|id| DataRef { id })
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
        unsafe {
            (xplm().unshare_data)(
                self.name.as_ptr(),
                self.types.bits(),
                Some(shared_data_changed),
                self.ctx.to_refcon(),
            )
        };
        SHARED.with(|a| a.remove(self.ctx));
    }
}

impl Drop for SharedData {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_host::{FakeValue, TestHost};
    use bytemuck::Zeroable;
    use std::cell::Cell;

    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
    struct Tcas {
        bearing: f32,
        distance: f32,
        altitude: f32,
        flags: u32,
    }

    #[test]
    fn missing_dataref_is_none() {
        let _host = TestHost::new();
        assert!(DataRef::find("sim/does/not/exist").is_none());
        assert!(DataRef::find("bad\0name").is_none());
    }

    #[test]
    fn scalars_read_and_write_through_host() {
        let host = TestHost::new();
        host.define_data("sim/cockpit/autopilot/altitude", FakeValue::Float(5000.0), true);
        host.define_data("sim/time/zulu_time_sec", FakeValue::Double(3600.5), false);
        host.define_data("sim/aircraft/engine/acf_num_engines", FakeValue::Int(2), false);

        let alt = DataRef::find("sim/cockpit/autopilot/altitude").unwrap();
        assert!(alt.can_write());
        assert!(alt.is_good());
        assert_eq!(alt.types(), DataTypes::FLOAT);
        alt.set_float(7000.0);
        assert_eq!(alt.get_float(), 7000.0);

        let zulu = DataRef::find("sim/time/zulu_time_sec").unwrap();
        assert!(!zulu.can_write());
        assert_eq!(zulu.get_double(), 3600.5);

        assert_eq!(DataRef::find("sim/aircraft/engine/acf_num_engines").unwrap().get_int(), 2);
    }

    #[test]
    fn vector_probe_returns_count_without_a_destination() {
        let host = TestHost::new();
        host.define_data("test/ints", FakeValue::Ints(vec![1, 2, 3, 4]), true);
        host.define_data("test/floats", FakeValue::Floats(vec![0.5; 6]), true);
        host.define_data("test/bytes", FakeValue::Bytes(vec![7; 10]), true);

        let ints = DataRef::find("test/ints").unwrap().int_vector(2);
        let floats = DataRef::find("test/floats").unwrap().float_vector(0);
        let bytes = DataRef::find("test/bytes").unwrap().byte_vector(5);

        assert_eq!(ints.read(&mut []), 4);
        assert_eq!(floats.read(&mut []), 6);
        assert_eq!(bytes.read(&mut []), 10);
        assert_eq!(host.null_vector_probes(), 3);

        assert_eq!(ints.count(), 4);
        assert_eq!(host.null_vector_probes(), 4);
    }

    #[test]
    fn vector_read_and_write_honor_offset() {
        let host = TestHost::new();
        host.define_data("test/ints", FakeValue::Ints(vec![10, 20, 30, 40]), true);
        let dr = DataRef::find("test/ints").unwrap();

        let mut dst = [0; 8];
        assert_eq!(dr.int_vector(1).read(&mut dst), 3);
        assert_eq!(&dst[..3], &[20, 30, 40]);

        dr.int_vector(2).write(&[-3, -4]);
        assert_eq!(host.data_value("test/ints"), Some(FakeValue::Ints(vec![10, 20, -3, -4])));

        host.define_data("test/floats", FakeValue::Floats(vec![0.0; 4]), true);
        let floats = DataRef::find("test/floats").unwrap().float_vector(0);
        floats.write(&[1.5, 2.5]);
        let mut out = [0.0; 2];
        assert_eq!(floats.read(&mut out), 2);
        assert_eq!(out, [1.5, 2.5]);
    }

    #[test]
    fn strings_and_pod_structs_go_through_byte_arrays() {
        let host = TestHost::new();
        host.define_data("sim/aircraft/view/acf_tailnum", FakeValue::Bytes(vec![0; 40]), true);
        let tail = DataRef::find("sim/aircraft/view/acf_tailnum").unwrap();
        tail.set_string("D-EFLY");
        assert_eq!(tail.get_string(), "D-EFLY");
        tail.set_string("N1");
        assert_eq!(tail.get_string(), "N1");

        host.define_data("test/tcas", FakeValue::Bytes(vec![0; 16]), true);
        let tcas = DataRef::find("test/tcas").unwrap();
        let v = Tcas {
            bearing: 12.5,
            distance: 3.0,
            altitude: -200.0,
            flags: 3,
        };
        tcas.set_data(&v);
        assert_eq!(tcas.get_data::<Tcas>(), v);
    }

    #[test]
    fn registered_int_accessor_serves_all_scalar_types() {
        let host = TestHost::new();
        let before = live_callbacks();
        let reg = DataRefRegistration::new("fbw/test/mode", true, IntAccessor { value: 4 }).unwrap();
        assert_eq!(live_callbacks(), before + 1);

        let dr = DataRef::find("fbw/test/mode").unwrap();
        assert_eq!(dr, reg.data_ref());
        assert_eq!(dr.types(), DataTypes::INT | DataTypes::FLOAT | DataTypes::DOUBLE);
        assert_eq!(dr.get_int(), 4);
        assert_eq!(dr.get_double(), 4.0);
        dr.set_float(9.7);
        assert_eq!(reg.with_accessor(|a| a.value), 9);
        reg.with_accessor(|a| a.value = -1);
        assert_eq!(dr.get_int(), -1);

        reg.destroy();
        assert_eq!(host.calls("XPLMUnregisterDataAccessor"), 1);
        assert_eq!(live_callbacks(), before);
        assert!(DataRef::find("fbw/test/mode").is_none());
    }

    #[test]
    fn read_only_registration_passes_no_write_callbacks() {
        let host = TestHost::new();
        let reg = DataRefRegistration::new("fbw/test/ro", false, FloatAccessor { value: 1.25 }).unwrap();
        assert!(!host.accessor_has_write_refcon("fbw/test/ro"));

        let dr = reg.data_ref();
        assert!(!dr.can_write());
        dr.set_float(3.0);
        assert_eq!(dr.get_float(), 1.25);
    }

    #[test]
    fn array_accessors_clamp_host_requests() {
        let _host = TestHost::new();
        let reg = DataRefRegistration::new(
            "fbw/test/array",
            true,
            FloatArrayAccessor {
                values: vec![1.0, 2.0, 3.0],
            },
        )
        .unwrap();
        let dr = reg.data_ref();

        assert_eq!(dr.float_vector(0).count(), 3);
        let mut dst = [0.0; 8];
        assert_eq!(dr.float_vector(2).read(&mut dst), 1);
        assert_eq!(dst[0], 3.0);
        assert_eq!(dr.float_vector(7).read(&mut dst), 0);

        dr.float_vector(1).write(&[9.0, 9.5, 10.0, 11.0]);
        assert_eq!(reg.with_accessor(|a| a.values.clone()), vec![1.0, 9.0, 9.5]);
        dr.float_vector(5).write(&[4.0]);
        assert_eq!(reg.with_accessor(|a| a.values.len()), 3);
    }

    #[test]
    fn pod_accessor_serves_struct_bytes() {
        let _host = TestHost::new();
        let value = Tcas {
            bearing: 90.0,
            distance: 1.5,
            altitude: 300.0,
            flags: 1,
        };
        let reg = DataRefRegistration::new("fbw/test/pod", false, PodAccessor { value }).unwrap();
        assert_eq!(reg.data_ref().byte_vector(0).count(), 16);
        assert_eq!(reg.data_ref().get_data::<Tcas>(), value);
    }

    #[test]
    fn panicking_accessor_reads_as_zero() {
        struct Broken;
        impl Accessor for Broken {
            fn int(&self) -> i32 {
                panic!("sensor offline")
            }
        }

        let host = TestHost::new();
        let reg = DataRefRegistration::register("fbw/test/broken", DataTypes::INT, false, Broken).unwrap();
        assert_eq!(reg.data_ref().get_int(), 0);
        assert!(host.debug_log().contains("sensor offline"));
    }

    #[test]
    fn registration_release_happens_once() {
        let host = TestHost::new();
        {
            let reg = DataRefRegistration::new("fbw/test/once", true, IntAccessor::default()).unwrap();
            reg.destroy();
        }
        assert_eq!(host.calls("XPLMUnregisterDataAccessor"), 1);

        host.refuse_creation(true);
        let before = live_callbacks();
        assert!(DataRefRegistration::new("fbw/test/refused", true, IntAccessor::default()).is_err());
        assert_eq!(live_callbacks(), before);
    }

    #[test]
    fn shared_data_notifies_and_unshares() {
        let host = TestHost::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let share = SharedData::share("fbw/shared/flaps", DataTypes::FLOAT, move || h.set(h.get() + 1))
            .unwrap()
            .unwrap();
        assert_eq!(share.name(), "fbw/shared/flaps");
        assert_eq!(host.shared_subscribers("fbw/shared/flaps"), 1);

        assert!(SharedData::share("fbw/shared/flaps", DataTypes::INT, || {}).unwrap().is_none());

        share.find_data_ref().unwrap().set_float(0.5);
        assert_eq!(hits.get(), 1);

        let before = live_callbacks();
        share.destroy();
        assert_eq!(host.shared_subscribers("fbw/shared/flaps"), 0);
        assert_eq!(live_callbacks(), before - 1);
    }
}
