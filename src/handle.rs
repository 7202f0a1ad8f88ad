//! Per-session cursor into the shared device.

use core::convert::TryFrom;

use libchardev::SeekWhence;

use crate::device::{Device, CAPACITY, CAPACITY_I64, CAPACITY_U64};
use crate::error::{DeviceError, DeviceResult};

/// An opened session on a [`Device`].
///
/// Closing the session (explicitly or by dropping it) releases it from the device.
pub struct Handle<'a> {
    /// The device shared by every session.
    device: &'a Device,

    /// Current offset into the device memory.
    position: u64,
}

impl<'a> Handle<'a> {
    pub(crate) fn new(device: &'a Device) -> Self {
        Handle {
            device,
            position: 0,
        }
    }

    /// Return the current offset into the device memory.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Close the session.
    pub fn close(self) {}

    /// Compute the amount of bytes a transfer of ``requested`` bytes moves.
    ///
    /// A transfer always covers everything between the position and the end of the device,
    /// so the caller buffer must be at least that large.
    fn transfer_len(&self, requested: usize) -> DeviceResult<usize> {
        if self.position >= CAPACITY_U64 {
            if requested == 0 {
                return Ok(0);
            }

            warn!(
                "transfer of {} byte(s) at {} is out of range",
                requested, self.position
            );
            return Err(DeviceError::OutOfRange);
        }

        let count = CAPACITY - self.position as usize;
        if requested < count {
            warn!(
                "buffer of {} byte(s) cannot hold the {} byte(s) left from {}",
                requested, count, self.position
            );
            return Err(DeviceError::InvalidArgument);
        }

        Ok(count)
    }

    /// Read everything from the position to the end of the device into ``buf``.
    ///
    /// ``buf`` must be able to hold all the remaining bytes. Returns the amount of bytes read.
    pub fn read(&mut self, buf: &mut [u8]) -> DeviceResult<usize> {
        trace!("read: enter");

        let count = self.transfer_len(buf.len())?;
        if count == 0 {
            return Ok(0);
        }

        let start = self.position as usize;
        self.device.with_state(|state| {
            buf[..count].copy_from_slice(&state.memory[start..start + count]);
        });
        self.position += count as u64;

        debug!("read {} byte(s) from {}", count, start);
        Ok(count)
    }

    /// Overwrite the device from the position to its end with the front of ``data``.
    ///
    /// ``data`` must cover all the remaining bytes. Returns the amount of bytes written.
    pub fn write(&mut self, data: &[u8]) -> DeviceResult<usize> {
        trace!("write: enter");

        let count = self.transfer_len(data.len())?;
        if count == 0 {
            return Ok(0);
        }

        let start = self.position as usize;
        self.device.with_state(|state| {
            state.memory[start..start + count].copy_from_slice(&data[..count]);
        });
        self.position += count as u64;

        debug!("written {} byte(s) from {}", count, start);
        Ok(count)
    }

    /// Move the position and return the new one.
    ///
    /// For ``SeekWhence::Current`` the bound applies to the magnitude of ``offset`` itself,
    /// not to the resulting position, which may end past the end of the device.
    pub fn seek(&mut self, offset: i64, whence: SeekWhence) -> DeviceResult<u64> {
        trace!("seek: enter (offset {}, whence {:?})", offset, whence);

        let new_position = match whence {
            SeekWhence::Start => {
                if offset < 0 {
                    warn!("seek: offset {} is negative", offset);
                    return Err(DeviceError::InvalidArgument);
                }

                if offset > CAPACITY_I64 {
                    warn!("seek: offset {} is too large", offset);
                    return Err(DeviceError::InvalidArgument);
                }

                offset as u64
            }
            SeekWhence::Current => {
                if offset.unsigned_abs() > CAPACITY_U64 {
                    warn!("seek: offset {} is too large", offset);
                    return Err(DeviceError::InvalidArgument);
                }

                let target = i64::try_from(self.position)
                    .ok()
                    .and_then(|position| position.checked_add(offset))
                    .ok_or(DeviceError::InvalidArgument)?;

                if target < 0 {
                    warn!("seek: {} + {} is before the device start", self.position, offset);
                    return Err(DeviceError::InvalidArgument);
                }

                target as u64
            }
            SeekWhence::End => {
                warn!("seek: unsupported whence {:?}", whence);
                return Err(DeviceError::InvalidArgument);
            }
        };

        self.position = new_position;
        Ok(new_position)
    }

    /// Execute a raw control request on the device.
    pub fn control(&self, command: u32, argument: u64) -> DeviceResult<()> {
        self.device.control(command, argument)
    }
}

impl<'a> Drop for Handle<'a> {
    fn drop(&mut self) {
        self.device.release();
    }
}
