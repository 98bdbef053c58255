//! Stateful loader API with process-wide settings.
//!
//! This mirrors the classic single-header loader surface: desired channels as
//! a plain integer (0 = native), a global flip-on-load flag read at the start
//! of every call, and an out-of-band failure reason. The state is shared by
//! every thread in the process. It is never torn, but concurrent callers see
//! whichever flag value or failure was written last. Use [`crate::decode`]
//! with explicit [`DecodeOptions`] when that matters.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::error::{ErrorKind, Result};
use crate::format::{self, DecoderPath};
use crate::info::ImageInfo;
use crate::options::DecodeOptions;
use crate::pixels::{self, Layout, PixelImage};

static FLIP_ON_LOAD: AtomicBool = AtomicBool::new(false);
static LAST_CALL: Mutex<LastCall> = parking_lot::const_mutex(LastCall {
    decoder: None,
    failure: None,
});

struct LastCall {
    decoder: Option<DecoderPath>,
    failure: Option<(ErrorKind, String)>,
}

#[cfg(test)]
pub(crate) static TEST_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Flip every subsequently decoded image vertically, until changed again.
pub fn set_flip_on_load(flip: bool) {
    FLIP_ON_LOAD.store(flip, Ordering::Relaxed);
}

pub fn flip_on_load() -> bool {
    FLIP_ON_LOAD.load(Ordering::Relaxed)
}

/// Message of the most recent failure. Successful calls leave it in place.
pub fn failure_reason() -> Option<String> {
    LAST_CALL.lock().failure.as_ref().map(|(_, message)| message.clone())
}

pub fn failure_kind() -> Option<ErrorKind> {
    LAST_CALL.lock().failure.as_ref().map(|(kind, _)| *kind)
}

/// Decoder path exercised by the most recent call.
pub fn last_decoder() -> Option<DecoderPath> {
    LAST_CALL.lock().decoder
}

pub(crate) fn record<T>(data: &[u8], result: Result<T>) -> Result<T> {
    let mut last = LAST_CALL.lock();
    last.decoder = Some(format::sniff(data));
    if let Err(err) = &result {
        log::debug!("{} failure: {err}", err.kind());
        last.failure = Some((err.kind(), err.to_string()));
    }
    result
}

fn options(desired: i64) -> Result<DecodeOptions> {
    DecodeOptions::from_desired(desired, flip_on_load())
}

pub fn info(data: &[u8]) -> Result<ImageInfo> {
    record(data, crate::info(data))
}

pub fn is_hdr(data: &[u8]) -> bool {
    let hdr = format::is_hdr(data);
    LAST_CALL.lock().decoder = Some(format::sniff(data));
    hdr
}

pub fn load(data: &[u8], desired: i64) -> Result<PixelImage<u8>> {
    let result = options(desired).and_then(|options| pixels::decode(data, &options));
    record(data, result)
}

pub fn load_float(data: &[u8], desired: i64) -> Result<PixelImage<f32>> {
    let result = options(desired).and_then(|options| pixels::decode_float(data, &options));
    record(data, result)
}

pub fn load_into(data: &[u8], desired: i64, dst: &mut [u8]) -> Result<Layout> {
    let result = options(desired).and_then(|options| pixels::decode_into(data, &options, dst));
    record(data, result)
}

pub fn load_float_into(data: &[u8], desired: i64, dst: &mut [f32]) -> Result<Layout> {
    let result =
        options(desired).and_then(|options| pixels::decode_float_into(data, &options, dst));
    record(data, result)
}
