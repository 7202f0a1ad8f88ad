//! The shared device state: memory, control registers and open sessions.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::convert::{TryFrom, TryInto};
use core::sync::atomic::{AtomicUsize, Ordering};

use spin::Mutex;

use crate::command::ControlCommand;
use crate::error::{DeviceError, DeviceResult};
use crate::handle::Handle;

/// The size of the device memory in bytes.
pub const CAPACITY: usize = 0x200;

/// The size of the device memory in bytes as a 64 bits unsigned value.
pub(crate) const CAPACITY_U64: u64 = CAPACITY as u64;

/// The size of the device memory in bytes as a 64 bits signed value.
pub(crate) const CAPACITY_I64: i64 = CAPACITY as i64;

/// Everything guarded by the device lock.
pub(crate) struct DeviceState {
    /// The device memory, never reallocated.
    pub(crate) memory: Box<[u8; CAPACITY]>,

    /// First control register.
    pub(crate) port1: i32,

    /// Second control register.
    pub(crate) port2: i64,
}

/// A memory backed virtual disk.
///
/// Every session opened with [`Device::open`] shares the same memory and registers.
pub struct Device {
    /// Memory and registers.
    state: Mutex<DeviceState>,

    /// Number of sessions currently opened.
    open_count: AtomicUsize,
}

/// Allocate zeroed device memory without aborting on exhaustion.
fn allocate_memory() -> DeviceResult<Box<[u8; CAPACITY]>> {
    let mut memory = Vec::new();
    memory
        .try_reserve_exact(CAPACITY)
        .map_err(|_| DeviceError::AllocationFailure)?;
    memory.resize(CAPACITY, 0u8);

    memory
        .into_boxed_slice()
        .try_into()
        .map_err(|_| DeviceError::AllocationFailure)
}

impl Device {
    /// Create a new device with zeroed memory and registers.
    pub fn new() -> DeviceResult<Device> {
        let memory = allocate_memory().map_err(|err| {
            error!("cannot allocate {} bytes of device memory", CAPACITY);
            err
        })?;

        debug!("device created ({} bytes)", CAPACITY);

        Ok(Device {
            state: Mutex::new(DeviceState {
                memory,
                port1: 0,
                port2: 0,
            }),
            open_count: AtomicUsize::new(0),
        })
    }

    /// Release the device and its memory.
    pub fn destroy(self) {
        debug!("device destroyed");
    }

    /// Open a new session positioned at the start of the device.
    pub fn open(&self) -> Handle<'_> {
        trace!("open: enter");
        self.update_count(|count| count.saturating_add(1));

        Handle::new(self)
    }

    /// Called by a session being closed.
    pub(crate) fn release(&self) {
        trace!("release: enter");
        self.update_count(|count| count.saturating_sub(1));
    }

    fn update_count(&self, f: impl Fn(usize) -> usize) {
        self.open_count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| Some(f(count)))
            .ok();
    }

    /// Return the number of sessions currently opened.
    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }

    /// Return the value of the first control register.
    pub fn control_a(&self) -> i32 {
        self.state.lock().port1
    }

    /// Return the value of the second control register.
    pub fn control_b(&self) -> i64 {
        self.state.lock().port2
    }

    /// Copy the whole device memory.
    pub fn snapshot(&self) -> Box<[u8; CAPACITY]> {
        self.state.lock().memory.clone()
    }

    /// Execute a raw control request. ``argument`` is accepted for every command but never used.
    pub fn control(&self, command: u32, argument: u64) -> DeviceResult<()> {
        trace!("control: enter (cmd 0x{:x}, arg 0x{:x})", command, argument);

        let command = ControlCommand::try_from(command).map_err(|err| {
            warn!("control: unknown command 0x{:x}", command);
            err
        })?;

        let mut state = self.state.lock();
        match command {
            ControlCommand::MemClear => {
                for byte in state.memory.iter_mut() {
                    *byte = 0;
                }
            }
            ControlCommand::Port1Set => state.port1 = 0,
            ControlCommand::Port2Set => state.port2 = 0,
        }

        debug!("control: {:?} (0x{:x}) done", command, command.raw());
        Ok(())
    }

    /// Run ``f`` with exclusive access to the device state.
    pub(crate) fn with_state<T>(&self, f: impl FnOnce(&mut DeviceState) -> T) -> T {
        let mut state = self.state.lock();
        f(&mut state)
    }

    #[cfg(test)]
    pub(crate) fn set_registers(&self, port1: i32, port2: i64) {
        let mut state = self.state.lock();
        state.port1 = port1;
        state.port2 = port2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{MEM_CLEAR, PORT1_SET, PORT2_SET};

    #[test]
    fn created_zeroed() {
        let device = Device::new().unwrap();

        assert!(device.snapshot().iter().all(|byte| *byte == 0));
        assert_eq!(device.snapshot().len(), CAPACITY);
        assert_eq!(device.control_a(), 0);
        assert_eq!(device.control_b(), 0);
        assert_eq!(device.open_count(), 0);
    }

    #[test]
    fn open_and_close_track_sessions() {
        let device = Device::new().unwrap();

        let first = device.open();
        let second = device.open();
        assert_eq!(device.open_count(), 2);

        first.close();
        assert_eq!(device.open_count(), 1);

        drop(second);
        assert_eq!(device.open_count(), 0);
    }

    #[test]
    fn release_saturates_at_zero() {
        let device = Device::new().unwrap();

        device.release();
        assert_eq!(device.open_count(), 0);
    }

    #[test]
    fn mem_clear_zeroes_memory() {
        let device = Device::new().unwrap();
        let mut handle = device.open();
        handle.write(&[0xAAu8; CAPACITY]).unwrap();
        handle.seek(100, libchardev::SeekWhence::Start).unwrap();

        device.control(MEM_CLEAR, 0).unwrap();

        assert!(device.snapshot().iter().all(|byte| *byte == 0));
        // The session position is untouched.
        assert_eq!(handle.position(), 100);
    }

    #[test]
    fn port_commands_reset_to_zero_whatever_the_argument() {
        let device = Device::new().unwrap();
        device.set_registers(-42, 0x1234_5678_9ABC);

        device.control(PORT1_SET, 7).unwrap();
        assert_eq!(device.control_a(), 0);
        assert_eq!(device.control_b(), 0x1234_5678_9ABC);

        device.control(PORT2_SET, u64::max_value()).unwrap();
        assert_eq!(device.control_b(), 0);
    }

    #[test]
    fn unknown_command_is_rejected_without_side_effects() {
        let device = Device::new().unwrap();
        device.set_registers(1, 2);
        let mut handle = device.open();
        handle.write(&[0x55u8; CAPACITY]).unwrap();

        assert_eq!(device.control(0, 0), Err(DeviceError::InvalidArgument));
        assert_eq!(device.control(0x42, 0), Err(DeviceError::InvalidArgument));

        assert_eq!(device.control_a(), 1);
        assert_eq!(device.control_b(), 2);
        assert!(device.snapshot().iter().all(|byte| *byte == 0x55));
        assert_eq!(device.open_count(), 1);
    }
}
