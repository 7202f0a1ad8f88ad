//! Host-facing contract of a character device node.
//!
//! A host dispatches open/read/write/llseek/ioctl requests to a driver
//! through the traits defined here.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod number;

pub use number::DeviceNumber;

use alloc::boxed::Box;
use core::fmt;

/// Represent a character device operation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharDeviceError {
    /// The position is beyond the end of the device (`ENXIO`).
    NoSuchDeviceOrAddress,

    /// A request parameter was rejected (`EINVAL`).
    InvalidArgument,

    /// The driver could not allocate memory (`ENOMEM`).
    OutOfMemory,

    /// A user buffer could not be accessed (`EFAULT`).
    BadAddress,

    /// The resource is already in use (`EBUSY`).
    Busy,

    /// Driver specific error.
    Custom { name: &'static str },
}

impl CharDeviceError {
    pub const ENXIO: isize = 6;
    pub const EIO: isize = 5;
    pub const ENOMEM: isize = 12;
    pub const EFAULT: isize = 14;
    pub const EBUSY: isize = 16;
    pub const EINVAL: isize = 22;

    /// Return the negative error code a host expects from a failed request.
    pub fn errno(self) -> isize {
        match self {
            CharDeviceError::NoSuchDeviceOrAddress => -Self::ENXIO,
            CharDeviceError::InvalidArgument => -Self::EINVAL,
            CharDeviceError::OutOfMemory => -Self::ENOMEM,
            CharDeviceError::BadAddress => -Self::EFAULT,
            CharDeviceError::Busy => -Self::EBUSY,
            CharDeviceError::Custom { .. } => -Self::EIO,
        }
    }
}

impl fmt::Display for CharDeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharDeviceError::NoSuchDeviceOrAddress => write!(f, "no such device or address"),
            CharDeviceError::InvalidArgument => write!(f, "invalid argument"),
            CharDeviceError::OutOfMemory => write!(f, "out of memory"),
            CharDeviceError::BadAddress => write!(f, "bad address"),
            CharDeviceError::Busy => write!(f, "device or resource busy"),
            CharDeviceError::Custom { name } => write!(f, "{}", name),
        }
    }
}

/// Represent a character device operation result.
pub type CharDeviceResult<T> = core::result::Result<T, CharDeviceError>;

/// Origin of a seek request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekWhence {
    /// Relative to the start of the device.
    Start,

    /// Relative to the current position.
    Current,

    /// Relative to the end of the device.
    End,
}

impl SeekWhence {
    pub const SEEK_SET: i32 = 0;
    pub const SEEK_CUR: i32 = 1;
    pub const SEEK_END: i32 = 2;

    /// Decode a raw host whence value.
    pub fn from_raw(raw: i32) -> Option<SeekWhence> {
        match raw {
            Self::SEEK_SET => Some(SeekWhence::Start),
            Self::SEEK_CUR => Some(SeekWhence::Current),
            Self::SEEK_END => Some(SeekWhence::End),
            _ => None,
        }
    }
}

/// Operations available on an opened device node.
///
/// Dropping the session is the release operation.
pub trait OpenFile {
    /// Read from the current position into ``buf``, returning the amount of bytes produced.
    fn read(&mut self, buf: &mut [u8]) -> CharDeviceResult<usize>;

    /// Write ``buf`` at the current position, returning the amount of bytes consumed.
    fn write(&mut self, buf: &[u8]) -> CharDeviceResult<usize>;

    /// Move the current position and return the new one.
    fn llseek(&mut self, offset: i64, whence: SeekWhence) -> CharDeviceResult<u64>;

    /// Issue a device specific control request.
    fn ioctl(&mut self, cmd: u32, arg: u64) -> CharDeviceResult<()>;
}

/// A driver able to hand out sessions on its device node.
pub trait CharDevice {
    /// Open a new session on the device.
    fn open<'a>(&'a self) -> CharDeviceResult<Box<dyn OpenFile + 'a>>;
}
