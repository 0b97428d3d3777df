//! FFI bindings for clutch-window
//!
//! This module provides C-compatible functions for calling the engine from other
//! languages. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `clutch_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::pipeline::ClutchProcessor;
use crate::types::Vendor;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Build a processor from an optional JSON config; NULL means defaults
unsafe fn processor_from_config(config_json: *const c_char) -> Result<ClutchProcessor, String> {
    if config_json.is_null() {
        return Ok(ClutchProcessor::default());
    }
    let config = cstr_to_string(config_json).ok_or("Invalid config string pointer")?;
    ClutchProcessor::from_config_json(&config).map_err(|e| e.to_string())
}

fn run(processor: &ClutchProcessor, json: String, vendor: String) -> *mut c_char {
    let result = vendor
        .parse::<Vendor>()
        .and_then(|vendor| processor.process(&json, vendor));

    match result {
        Ok(payload) => string_to_cstr(&payload),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Analyze one play-by-play payload and return the encoded report JSON.
///
/// # Safety
/// - `json` and `vendor` must be valid null-terminated C strings.
/// - `config_json` must be a valid null-terminated C string or NULL (defaults).
/// - Returns a newly allocated string that must be freed with `clutch_free_string`.
/// - Returns NULL on error; call `clutch_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn clutch_analyze_game(
    json: *const c_char,
    vendor: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let vendor_str = match cstr_to_string(vendor) {
        Some(s) => s,
        None => {
            set_last_error("Invalid vendor string pointer");
            return ptr::null_mut();
        }
    };

    let processor = match processor_from_config(config_json) {
        Ok(p) => p,
        Err(msg) => {
            set_last_error(&msg);
            return ptr::null_mut();
        }
    };

    run(&processor, json_str, vendor_str)
}

// ============================================================================
// Processor API
// ============================================================================

/// Opaque handle to a ClutchProcessor
pub struct ClutchProcessorHandle {
    processor: ClutchProcessor,
}

/// Create a processor from a JSON config, or with defaults when `config_json` is NULL.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string or NULL.
/// - Must be freed with `clutch_processor_free`.
/// - Returns NULL on error; call `clutch_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn clutch_processor_new(
    config_json: *const c_char,
) -> *mut ClutchProcessorHandle {
    clear_last_error();

    match processor_from_config(config_json) {
        Ok(processor) => Box::into_raw(Box::new(ClutchProcessorHandle { processor })),
        Err(msg) => {
            set_last_error(&msg);
            ptr::null_mut()
        }
    }
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `clutch_processor_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn clutch_processor_free(processor: *mut ClutchProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Analyze a payload with a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `clutch_processor_new`.
/// - `json` and `vendor` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `clutch_free_string`.
/// - Returns NULL on error; call `clutch_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn clutch_processor_analyze(
    processor: *const ClutchProcessorHandle,
    json: *const c_char,
    vendor: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let vendor_str = match cstr_to_string(vendor) {
        Some(s) => s,
        None => {
            set_last_error("Invalid vendor string pointer");
            return ptr::null_mut();
        }
    };

    run(&handle.processor, json_str, vendor_str)
}

/// Return the processor's effective configuration as JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `clutch_processor_new`.
/// - Returns a newly allocated string that must be freed with `clutch_free_string`.
/// - Returns NULL on error; call `clutch_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn clutch_processor_config(
    processor: *const ClutchProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    match handle.processor.config().to_json() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by clutch functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a clutch function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn clutch_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next clutch function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn clutch_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn clutch_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
