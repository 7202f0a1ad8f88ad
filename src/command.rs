use core::convert::TryFrom;

use crate::error::DeviceError;

/// Zero-fill the whole device memory.
pub const MEM_CLEAR: u32 = 0x1;

/// Reset the first control register.
pub const PORT1_SET: u32 = 0x2;

/// Reset the second control register.
pub const PORT2_SET: u32 = 0x3;

/// A control request understood by the virtual disk.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    MemClear,
    Port1Set,
    Port2Set,
}

impl ControlCommand {
    /// Return the raw command number.
    pub fn raw(self) -> u32 {
        match self {
            ControlCommand::MemClear => MEM_CLEAR,
            ControlCommand::Port1Set => PORT1_SET,
            ControlCommand::Port2Set => PORT2_SET,
        }
    }
}

impl TryFrom<u32> for ControlCommand {
    type Error = DeviceError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            MEM_CLEAR => Ok(ControlCommand::MemClear),
            PORT1_SET => Ok(ControlCommand::Port1Set),
            PORT2_SET => Ok(ControlCommand::Port2Set),
            _ => Err(DeviceError::InvalidArgument),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_commands() {
        for command in [
            ControlCommand::MemClear,
            ControlCommand::Port1Set,
            ControlCommand::Port2Set,
        ]
        .iter()
        {
            assert_eq!(ControlCommand::try_from(command.raw()), Ok(*command));
        }
    }

    #[test]
    fn rejects_unknown_commands() {
        assert_eq!(ControlCommand::try_from(0), Err(DeviceError::InvalidArgument));
        assert_eq!(ControlCommand::try_from(0x4), Err(DeviceError::InvalidArgument));
        assert_eq!(
            ControlCommand::try_from(u32::max_value()),
            Err(DeviceError::InvalidArgument)
        );
    }
}
