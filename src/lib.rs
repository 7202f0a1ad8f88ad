//! A 512 bytes memory backed virtual disk exposed as a character device.
//!
//! Sessions opened on a [`Device`] share its memory and control registers. Transfers
//! always cover everything from the session position to the end of the device.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
extern crate log;

pub mod command;
pub mod device;
pub mod error;
pub mod file;
pub mod handle;
pub mod module;
pub mod registry;

pub use command::{ControlCommand, MEM_CLEAR, PORT1_SET, PORT2_SET};
pub use device::{Device, CAPACITY};
pub use error::{DeviceError, DeviceResult};
pub use file::{dispatch, read_all, Request, VirtualDiskFile};
pub use handle::Handle;
pub use libchardev::SeekWhence;
pub use module::{ModuleConfig, VirtualDiskModule};
pub use registry::{DeviceRegistry, MemoryRegistry};
