//! Call flags restricting what a called contract may do.

use bitflags::bitflags;

bitflags! {
    /// Permissions granted to an execution context.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct CallFlags: u8 {
        const NONE = 0;
        const READ_STATES = 0b0000_0001;
        const WRITE_STATES = 0b0000_0010;
        const ALLOW_CALL = 0b0000_0100;
        const ALLOW_NOTIFY = 0b0000_1000;
        const STATES = Self::READ_STATES.bits() | Self::WRITE_STATES.bits();
        const READ_ONLY = Self::READ_STATES.bits() | Self::ALLOW_CALL.bits();
        const ALL = Self::STATES.bits() | Self::ALLOW_CALL.bits() | Self::ALLOW_NOTIFY.bits();
    }
}

impl CallFlags {
    /// Parses a flags value received from a script. Undefined bits are
    /// rejected.
    pub fn from_script_value(value: i64) -> Option<Self> {
        u8::try_from(value).ok().and_then(Self::from_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_flags() {
        assert_eq!(CallFlags::ALL.bits(), 0x0F);
        assert_eq!(CallFlags::READ_ONLY.bits(), 0x05);
        assert!(CallFlags::ALL.contains(CallFlags::STATES));
        assert!(!CallFlags::READ_ONLY.contains(CallFlags::WRITE_STATES));
    }

    #[test]
    fn script_values() {
        assert_eq!(CallFlags::from_script_value(15), Some(CallFlags::ALL));
        assert_eq!(CallFlags::from_script_value(16), None);
        assert_eq!(CallFlags::from_script_value(-1), None);
    }
}
