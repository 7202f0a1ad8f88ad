use core::fmt;

/// Represent a virtual disk operation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// A transfer was requested at or beyond the end of the device.
    OutOfRange,

    /// A seek offset, seek origin, control command or caller buffer was rejected.
    InvalidArgument,

    /// The device storage could not be allocated.
    AllocationFailure,
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::OutOfRange => write!(f, "position out of range"),
            DeviceError::InvalidArgument => write!(f, "invalid argument"),
            DeviceError::AllocationFailure => write!(f, "allocation failure"),
        }
    }
}

/// Represent a virtual disk operation result.
pub type DeviceResult<T> = core::result::Result<T, DeviceError>;
