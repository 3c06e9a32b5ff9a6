//! Binding to the system UnRAR library through `unrar_sys`.
//!
//! The library keeps one callback per handle. It is registered again before
//! every call, pointing at a `Bridge` that lives on the caller's stack for
//! the duration of that call only, and cleared afterwards.

#![allow(unsafe_code)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use std::ffi::c_int;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::ptr::NonNull;
use std::time::SystemTime;

use chrono::NaiveDate;
use tracing::trace;
use tracing::warn;
use unrar_sys as native;
use widestring::WideCStr;
use widestring::WideCString;
use widestring::WideChar;

use super::Backend;
use super::CallbackFault;
use super::Directive;
use super::HeaderRecord;
use super::NativeArchive;
use super::NativeCode;
use super::NativeError;
use super::NativeResult;
use super::OpenMode;
use super::RedirType;
use crate::callback::Callback;

const COMMENT_BUFFER_SIZE: usize = 64 * 1024;
// Longest path the library reports since 5.00.
const PATH_BUFFER_SIZE: usize = 2048;

const ERAR_END_ARCHIVE: c_int = 10;

const FLAG_SPLIT_BEFORE: u32 = 0x01;
const FLAG_SPLIT_AFTER: u32 = 0x02;
const FLAG_ENCRYPTED: u32 = 0x04;
const FLAG_DIRECTORY: u32 = 0x20;

/// Decoder backed by the UnRAR shared library.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnrarBackend;

impl UnrarBackend {
    /// Creates the backend.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Backend for UnrarBackend {
    type Archive = UnrarHandle;

    fn open(
        &self,
        path: &Path,
        mode: OpenMode,
        want_comment: bool,
        callback: &mut dyn Callback,
    ) -> NativeResult<(UnrarHandle, Option<Vec<u8>>)> {
        let name = WideCString::from_os_str(path).map_err(|_| NativeCode::EOpen)?;
        let mut bridge = Bridge::new(callback, None);
        let mut comment = want_comment.then(|| vec![0u8; COMMENT_BUFFER_SIZE]);

        let mut data = native::OpenArchiveDataEx::new(name.as_ptr().cast(), open_mode(mode));
        if let Some(buffer) = comment.as_mut() {
            data.cmt_buf = buffer.as_mut_ptr().cast();
            data.cmt_buf_size = COMMENT_BUFFER_SIZE as u32;
        }
        data.callback = Some(bridge_callback);
        data.user_data = std::ptr::from_mut(&mut bridge) as native::LPARAM;

        // SAFETY: `name`, the comment buffer and `bridge` outlive the call.
        let raw = unsafe { native::RAROpenArchiveEx(&raw mut data) };
        let handle = NonNull::new(raw.cast_mut());
        let code = data.open_result as c_int;

        match (handle, bridge.fault.take(), NativeCode::from_raw(code)) {
            (Some(handle), None, None) => {
                let comment = comment.map(|mut buffer| {
                    buffer.truncate(comment_len(&data));
                    buffer
                });
                Ok((UnrarHandle::new(handle), comment))
            }
            (handle, fault, code) => {
                if let Some(handle) = handle {
                    drop(UnrarHandle::new(handle));
                }
                Err(fault.map_or_else(
                    || NativeError::Code(code.unwrap_or(NativeCode::EOpen)),
                    NativeError::Callback,
                ))
            }
        }
    }

    fn version(&self) -> u32 {
        // SAFETY: no arguments, no preconditions.
        (unsafe { native::RARGetDllVersion() }) as u32
    }
}

/// An archive opened by the UnRAR library.
#[derive(Debug)]
pub struct UnrarHandle {
    handle: Option<NonNull<native::Handle>>,
}

impl UnrarHandle {
    const fn new(handle: NonNull<native::Handle>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Runs `op` with `bridge` registered as the library callback.
    fn call(
        &mut self,
        bridge: &mut Bridge<'_>,
        op: impl FnOnce(*const native::Handle) -> c_int,
    ) -> NativeResult<c_int> {
        let handle = self.handle.ok_or(NativeCode::Unknown)?.as_ptr().cast_const();
        // SAFETY: the handle is open and `bridge` outlives the registration,
        // which is cleared before returning.
        unsafe {
            native::RARSetCallback(
                handle,
                Some(bridge_callback),
                std::ptr::from_mut(bridge) as native::LPARAM,
            );
        }
        let code = op(handle);
        // SAFETY: as above.
        unsafe { native::RARSetCallback(handle, None, 0) };

        match bridge.fault.take() {
            Some(fault) => Err(fault.into()),
            None => Ok(code),
        }
    }
}

impl NativeArchive for UnrarHandle {
    fn read_next_header(
        &mut self,
        callback: &mut dyn Callback,
    ) -> NativeResult<Option<HeaderRecord>> {
        let mut redir_name: Vec<WideChar> = vec![0; PATH_BUFFER_SIZE];
        let mut header = native::HeaderDataEx::default();
        header.redir_name = redir_name.as_mut_ptr().cast();
        header.redir_name_size = PATH_BUFFER_SIZE as u32;

        let mut bridge = Bridge::new(callback, None);
        // SAFETY: `header` and `redir_name` outlive the call.
        let code = self.call(&mut bridge, |handle| unsafe {
            native::RARReadHeaderEx(handle, &raw mut header)
        })?;

        match code {
            0 => Ok(Some(header_record(&header, &redir_name))),
            ERAR_END_ARCHIVE => Ok(None),
            code => Err(failure(code)),
        }
    }

    fn process_entry(
        &mut self,
        directive: Directive<'_>,
        callback: &mut dyn Callback,
    ) -> NativeResult<()> {
        trace!(directive = directive.name(), "processing entry");
        let (operation, file) = match directive {
            Directive::Skip => (native::RAR_SKIP, None),
            Directive::Test => (native::RAR_TEST, None),
            Directive::TestToFile(file) => (native::RAR_TEST, Some(file)),
        };

        let mut bridge = Bridge::new(callback, file);
        // SAFETY: null destination paths are accepted for skip and test.
        let code = self.call(&mut bridge, |handle| unsafe {
            native::RARProcessFileW(handle, operation, std::ptr::null(), std::ptr::null())
        })?;
        check(code)
    }

    fn close(&mut self) -> NativeResult<()> {
        let handle = self.handle.take().ok_or(NativeCode::EClose)?;
        // SAFETY: taken out of `self`, so it is closed only once.
        check(unsafe { native::RARCloseArchive(handle.as_ptr().cast_const()) })
    }
}

impl Drop for UnrarHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            // SAFETY: taken out of `self`, so it is closed only once.
            unsafe { native::RARCloseArchive(handle.as_ptr().cast_const()) };
        }
    }
}

/// Per-call state reachable from the library callback.
struct Bridge<'c> {
    callback: &'c mut dyn Callback,
    file: Option<&'c mut File>,
    fault: Option<CallbackFault>,
}

impl<'c> Bridge<'c> {
    fn new(callback: &'c mut dyn Callback, file: Option<&'c mut File>) -> Self {
        Self {
            callback,
            file,
            fault: None,
        }
    }

    fn fail(&mut self, fault: CallbackFault) -> c_int {
        self.fault = Some(fault);
        -1
    }

    fn password(&mut self, buffer: &mut [WideChar]) -> c_int {
        let Some(password) = self.callback.supply_password() else {
            return -1;
        };
        let Ok(wide) = WideCString::from_str(&password) else {
            return -1;
        };
        let chars = wide.as_slice();
        let len = chars.len().min(buffer.len().saturating_sub(1));
        buffer[..len].copy_from_slice(&chars[..len]);
        if let Some(end) = buffer.get_mut(len) {
            *end = 0;
        }
        1
    }

    fn data(&mut self, chunk: &[u8]) -> c_int {
        if let Some(file) = self.file.as_deref_mut() {
            return match file.write_all(chunk) {
                Ok(()) => 1,
                Err(err) => self.fail(CallbackFault::WriteFailed(err.to_string())),
            };
        }
        if self.callback.accept_data(chunk) {
            1
        } else {
            self.fail(CallbackFault::Cancelled)
        }
    }
}

extern "C" fn bridge_callback(
    msg: native::UINT,
    user_data: native::LPARAM,
    p1: native::LPARAM,
    p2: native::LPARAM,
) -> c_int {
    if user_data == 0 {
        return 0;
    }
    // SAFETY: `user_data` is the `Bridge` registered for the running call.
    let bridge = unsafe { &mut *(user_data as *mut Bridge<'_>) };
    match msg {
        native::UCM_NEEDPASSWORDW => {
            if p1 == 0 || p2 <= 0 {
                return -1;
            }
            // SAFETY: the library hands over a writable buffer of `p2` chars.
            let buffer = unsafe { std::slice::from_raw_parts_mut(p1 as *mut WideChar, p2 as usize) };
            bridge.password(buffer)
        }
        native::UCM_PROCESSDATA => {
            if p2 < 0 {
                return bridge.fail(CallbackFault::InvalidBuffer(p2 as i64));
            }
            if p1 == 0 || p2 == 0 {
                return 1;
            }
            // SAFETY: the library hands over `p2` readable bytes.
            let chunk = unsafe { std::slice::from_raw_parts(p1 as *const u8, p2 as usize) };
            bridge.data(chunk)
        }
        native::UCM_CHANGEVOLUMEW if p2 == native::RAR_VOL_ASK => {
            bridge.fail(CallbackFault::MissingVolume)
        }
        _ => 0,
    }
}

const fn open_mode(mode: OpenMode) -> u32 {
    match mode {
        OpenMode::List => native::RAR_OM_LIST,
        OpenMode::ListIncSplit => native::RAR_OM_LIST_INCSPLIT,
        OpenMode::Extract => native::RAR_OM_EXTRACT,
    }
}

fn check(code: c_int) -> NativeResult<()> {
    match NativeCode::from_raw(code) {
        None => Ok(()),
        Some(code) => Err(code.into()),
    }
}

fn failure(code: c_int) -> NativeError {
    NativeCode::from_raw(code)
        .unwrap_or(NativeCode::Other(code))
        .into()
}

fn comment_len(data: &native::OpenArchiveDataEx) -> usize {
    // cmt_state 1 is a complete comment, ERAR_SMALL_BUF a truncated one.
    match data.cmt_state {
        1 | 20 => (data.cmt_size as usize)
            .saturating_sub(1)
            .min(COMMENT_BUFFER_SIZE),
        _ => 0,
    }
}

fn header_record(raw: &native::HeaderDataEx, redir_name: &[WideChar]) -> HeaderRecord {
    // SAFETY: the library NUL-terminates the name inside its fixed buffer.
    let filename = unsafe {
        WideCString::from_ptr_truncate(raw.filename_w.as_ptr().cast(), raw.filename_w.len())
    };
    let redir_type = RedirType::from_raw(raw.redir_type);
    let redir_name = if redir_type.is_redirection() {
        WideCStr::from_slice_truncate(redir_name)
            .ok()
            .map(|name| name.to_string_lossy())
            .filter(|name| !name.is_empty())
    } else {
        None
    };

    let mut record = HeaderRecord::new(filename.to_string_lossy());
    record.is_dir = raw.flags & FLAG_DIRECTORY != 0;
    record.redir_type = redir_type;
    record.redir_name = redir_name;
    record.file_crc = raw.file_crc;
    record.unpack_size = combine(raw.unp_size, raw.unp_size_high);
    record.pack_size = combine(raw.pack_size, raw.pack_size_high);
    record.file_time = dos_time(raw.file_time);
    record.encrypted = raw.flags & FLAG_ENCRYPTED != 0;
    record.split_before = raw.flags & FLAG_SPLIT_BEFORE != 0;
    record.split_after = raw.flags & FLAG_SPLIT_AFTER != 0;
    record
}

fn combine(low: u32, high: u32) -> u64 {
    (u64::from(high) << 32) | u64::from(low)
}

/// Converts an MS-DOS date and time, read as UTC. Fields that do not form a
/// valid date map to the Unix epoch.
fn dos_time(raw: u32) -> SystemTime {
    let second = (raw & 0x1f) * 2;
    let minute = (raw >> 5) & 0x3f;
    let hour = (raw >> 11) & 0x1f;
    let day = (raw >> 16) & 0x1f;
    let month = (raw >> 21) & 0x0f;
    let year = (raw >> 25) as i32 + 1980;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map_or_else(
            || {
                warn!(raw, "invalid DOS timestamp in header");
                SystemTime::UNIX_EPOCH
            },
            |time| time.and_utc().into(),
        )
}
