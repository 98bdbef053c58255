//! C ABI over [`crate::compat`].
//!
//! Buffers returned by the `*_raw` loaders stay registered until handed to
//! [`pixload_free`]. Freeing a pointer that is unknown or already freed is
//! logged and ignored.

use std::collections::HashMap;
use std::ffi::{c_char, c_int, c_void, CString};
use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::color::Channels;
use crate::compat;
use crate::error::{Error, Result};
use crate::pixels::{PixelImage, Sample};

// never read, the variants only keep the allocation alive until pixload_free
#[allow(dead_code)]
enum OwnedBuffer {
    U8(Vec<u8>),
    F32(Vec<f32>),
}

static LIVE: OnceLock<Mutex<HashMap<usize, OwnedBuffer>>> = OnceLock::new();
static REASON: Mutex<Option<CString>> = parking_lot::const_mutex(None);

fn live() -> &'static Mutex<HashMap<usize, OwnedBuffer>> {
    LIVE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Null or non-positive lengths read as an empty buffer, which every decoder
/// rejects.
unsafe fn input<'a>(data: *const u8, len: i64) -> &'a [u8] {
    if data.is_null() || len <= 0 {
        return &[];
    }
    std::slice::from_raw_parts(data, len as usize)
}

unsafe fn output<'a, T>(dst: *mut T, len: usize) -> &'a mut [T] {
    if dst.is_null() || len == 0 {
        return &mut [];
    }
    std::slice::from_raw_parts_mut(dst, len)
}

unsafe fn write(out: *mut c_int, value: c_int) {
    if !out.is_null() {
        *out = value;
    }
}

/// Dimensions as C ints. Anything past `c_int::MAX` is rejected rather than
/// wrapped.
fn c_dims(width: u32, height: u32, channels: Channels) -> Result<[c_int; 3]> {
    match (c_int::try_from(width), c_int::try_from(height)) {
        (Ok(w), Ok(h)) => Ok([w, h, channels.count() as c_int]),
        _ => Err(Error::DimensionOverflow { width, height }),
    }
}

unsafe fn write_dims(w: *mut c_int, h: *mut c_int, channels: *mut c_int, dims: [c_int; 3]) {
    write(w, dims[0]);
    write(h, dims[1]);
    write(channels, dims[2]);
}

/// Native dimensions of a decoded image, checked before it is handed out.
fn checked<T: Sample>(img: PixelImage<T>) -> Result<(PixelImage<T>, [c_int; 3])> {
    let dims = c_dims(img.width(), img.height(), img.source_channels())?;
    Ok((img, dims))
}

fn register<T: Sample>(img: PixelImage<T>, wrap: impl FnOnce(Vec<T>) -> OwnedBuffer) -> *mut T {
    let mut pixels = img.into_pixels();
    let ptr = pixels.as_mut_ptr();
    log::trace!("registered {} samples at {ptr:p}", pixels.len());
    live().lock().insert(ptr as usize, wrap(pixels));
    ptr
}

/// Read width, height and native channel count.
///
/// # Safety
/// `data` must point to `len` readable bytes. Output pointers may be null.
#[no_mangle]
pub unsafe extern "C" fn pixload_info(
    data: *const u8,
    len: i64,
    w: *mut c_int,
    h: *mut c_int,
    channels: *mut c_int,
) -> bool {
    let data = input(data, len);
    let dims = compat::info(data).and_then(|info| c_dims(info.width, info.height, info.channels));
    match compat::record(data, dims) {
        Ok(dims) => {
            write_dims(w, h, channels, dims);
            true
        }
        Err(_) => false,
    }
}

/// # Safety
/// `data` must point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn pixload_is_hdr(data: *const u8, len: i64) -> bool {
    compat::is_hdr(input(data, len))
}

/// Decode 8-bit samples into `dst`, which must hold at least
/// `width * height * channels` bytes for the requested channel count.
///
/// # Safety
/// `data` must point to `len` readable bytes and `dst` to `dst_len`
/// writable bytes.
#[no_mangle]
pub unsafe extern "C" fn pixload_load_into(
    dst: *mut u8,
    dst_len: usize,
    data: *const u8,
    len: i64,
    desired_channels: c_int,
) -> bool {
    compat::load_into(
        input(data, len),
        desired_channels as i64,
        output(dst, dst_len),
    )
    .is_ok()
}

/// Float counterpart of [`pixload_load_into`]; `dst_len` counts samples.
///
/// # Safety
/// `data` must point to `len` readable bytes and `dst` to `dst_len`
/// writable floats.
#[no_mangle]
pub unsafe extern "C" fn pixload_load_float_into(
    dst: *mut f32,
    dst_len: usize,
    data: *const u8,
    len: i64,
    desired_channels: c_int,
) -> bool {
    compat::load_float_into(
        input(data, len),
        desired_channels as i64,
        output(dst, dst_len),
    )
    .is_ok()
}

/// Decode into a newly allocated buffer, or return null on failure. The
/// reported channel count is the image's native one. Release the buffer with
/// [`pixload_free`].
///
/// # Safety
/// `data` must point to `len` readable bytes. Output pointers may be null.
#[no_mangle]
pub unsafe extern "C" fn pixload_load_raw(
    data: *const u8,
    len: i64,
    w: *mut c_int,
    h: *mut c_int,
    channels: *mut c_int,
    desired_channels: c_int,
) -> *mut u8 {
    let data = input(data, len);
    let loaded = compat::load(data, desired_channels as i64).and_then(checked);
    match compat::record(data, loaded) {
        Ok((img, dims)) => {
            write_dims(w, h, channels, dims);
            register(img, OwnedBuffer::U8)
        }
        Err(_) => std::ptr::null_mut(),
    }
}

/// Float counterpart of [`pixload_load_raw`].
///
/// # Safety
/// `data` must point to `len` readable bytes. Output pointers may be null.
#[no_mangle]
pub unsafe extern "C" fn pixload_load_float_raw(
    data: *const u8,
    len: i64,
    w: *mut c_int,
    h: *mut c_int,
    channels: *mut c_int,
    desired_channels: c_int,
) -> *mut f32 {
    let data = input(data, len);
    let loaded = compat::load_float(data, desired_channels as i64).and_then(checked);
    match compat::record(data, loaded) {
        Ok((img, dims)) => {
            write_dims(w, h, channels, dims);
            register(img, OwnedBuffer::F32)
        }
        Err(_) => std::ptr::null_mut(),
    }
}

/// Release a buffer returned by one of the `*_raw` loaders. Null is a no-op.
///
/// # Safety
/// The buffer must not be used after this call.
#[no_mangle]
pub unsafe extern "C" fn pixload_free(pixels: *mut c_void) {
    if pixels.is_null() {
        return;
    }
    if live().lock().remove(&(pixels as usize)).is_none() {
        log::warn!("pixload_free: {pixels:p} is not a live pixel buffer");
    }
}

#[no_mangle]
pub extern "C" fn pixload_set_flip_vertically_on_load(flip: bool) {
    compat::set_flip_on_load(flip);
}

/// Most recent failure as a NUL-terminated string, or null if nothing has
/// failed yet. The pointer stays valid until the next call.
#[no_mangle]
pub extern "C" fn pixload_failure_reason() -> *const c_char {
    let mut reason = REASON.lock();
    *reason = compat::failure_reason().map(|msg| {
        CString::new(msg.replace('\0', " ")).unwrap_or_default()
    });
    reason.as_ref().map_or(std::ptr::null(), |msg| msg.as_ptr())
}
