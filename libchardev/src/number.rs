/// Identifier of a device node as seen by the host: a driver major and a per-device minor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceNumber {
    pub major: u32,
    pub minor: u32,
}

impl DeviceNumber {
    /// Amount of bits holding the minor in the packed representation.
    pub const MINOR_BITS: u32 = 20;

    /// Mask selecting the minor in the packed representation.
    pub const MINOR_MASK: u32 = (1 << Self::MINOR_BITS) - 1;

    pub fn new(major: u32, minor: u32) -> DeviceNumber {
        DeviceNumber { major, minor }
    }

    /// Pack the number the way hosts store it (``MKDEV``).
    pub fn into_raw(self) -> u32 {
        (self.major << Self::MINOR_BITS) | (self.minor & Self::MINOR_MASK)
    }
}
