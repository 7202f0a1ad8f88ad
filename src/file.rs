//! libchardev compatibility layer around the virtual disk.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::convert::TryFrom;

use libchardev::{CharDevice, CharDeviceError, CharDeviceResult, OpenFile, SeekWhence};

use crate::device::Device;
use crate::error::DeviceError;
use crate::handle::Handle;

/// Generic from implementation for DeviceError to CharDeviceError conversion.
trait IntoCharDeviceError<T> {
    /// Convert a type to another one.
    fn from_driver(_: T) -> Self;
}

impl IntoCharDeviceError<DeviceError> for CharDeviceError {
    fn from_driver(error: DeviceError) -> Self {
        match error {
            DeviceError::OutOfRange => CharDeviceError::NoSuchDeviceOrAddress,
            DeviceError::InvalidArgument => CharDeviceError::InvalidArgument,
            DeviceError::AllocationFailure => CharDeviceError::OutOfMemory,
        }
    }
}

impl From<DeviceError> for CharDeviceError {
    fn from(error: DeviceError) -> Self {
        CharDeviceError::from_driver(error)
    }
}

/// A virtual disk session implementing ``OpenFile``.
pub struct VirtualDiskFile<'a> {
    /// The session on the device.
    handle: Handle<'a>,
}

impl<'a> VirtualDiskFile<'a> {
    pub fn new(handle: Handle<'a>) -> Self {
        VirtualDiskFile { handle }
    }
}

impl<'a> OpenFile for VirtualDiskFile<'a> {
    fn read(&mut self, buf: &mut [u8]) -> CharDeviceResult<usize> {
        self.handle.read(buf).map_err(CharDeviceError::from_driver)
    }

    fn write(&mut self, buf: &[u8]) -> CharDeviceResult<usize> {
        self.handle.write(buf).map_err(CharDeviceError::from_driver)
    }

    fn llseek(&mut self, offset: i64, whence: SeekWhence) -> CharDeviceResult<u64> {
        self.handle
            .seek(offset, whence)
            .map_err(CharDeviceError::from_driver)
    }

    fn ioctl(&mut self, cmd: u32, arg: u64) -> CharDeviceResult<()> {
        self.handle
            .control(cmd, arg)
            .map_err(CharDeviceError::from_driver)
    }
}

impl CharDevice for Device {
    fn open<'a>(&'a self) -> CharDeviceResult<Box<dyn OpenFile + 'a>> {
        let res = Box::new(VirtualDiskFile::new(Device::open(self)));

        Ok(res as Box<dyn OpenFile + 'a>)
    }
}

/// A raw request as delivered by the host.
#[derive(Debug)]
pub enum Request<'b> {
    /// Read into a user buffer of the given length.
    Read(&'b mut [u8]),

    /// Write a user buffer.
    Write(&'b [u8]),

    /// Seek with a raw whence value.
    Llseek(i64, i32),

    /// Control request with its argument.
    Ioctl(u32, u64),
}

/// Convert a result into the integer a host returns to its caller.
fn into_host_return(result: CharDeviceResult<isize>) -> isize {
    match result {
        Ok(value) => value,
        Err(err) => err.errno(),
    }
}

/// Run a raw host request on an opened session.
///
/// Returns the amount of bytes transferred, the new position or zero on success, a negative
/// error code on failure.
pub fn dispatch<'a>(file: &mut (dyn OpenFile + 'a), request: Request<'_>) -> isize {
    let result = match request {
        Request::Read(buf) => file.read(buf).map(|count| count as isize),
        Request::Write(buf) => file.write(buf).map(|count| count as isize),
        Request::Llseek(offset, raw_whence) => match SeekWhence::from_raw(raw_whence) {
            Some(whence) => file.llseek(offset, whence).and_then(|position| {
                isize::try_from(position).map_err(|_| CharDeviceError::InvalidArgument)
            }),
            None => {
                warn!("llseek: unknown whence {}", raw_whence);
                Err(CharDeviceError::InvalidArgument)
            }
        },
        Request::Ioctl(cmd, arg) => file.ioctl(cmd, arg).map(|_| 0),
    };

    into_host_return(result)
}

/// Read the whole device through a fresh session.
pub fn read_all(device: &dyn CharDevice) -> CharDeviceResult<Vec<u8>> {
    let mut file = device.open()?;
    let mut contents = vec![0u8; crate::CAPACITY];
    let count = file.read(&mut contents)?;
    contents.truncate(count);

    Ok(contents)
}
