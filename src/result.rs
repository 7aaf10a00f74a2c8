use core::fmt::{Debug, Display, Formatter, Result as FmtResult};

/// Error type
#[derive(Debug, Clone, PartialEq)]
pub enum Error<E: Sized + Debug> {
    /// Required output or buffer missing
    NullArgument,
    /// Device record used before `init`/`init_solo`
    NotInitialized,
    /// Wire not high
    WireFault,
    /// No presence on wire
    NoPresence,
    /// Computed CRC, CRC byte received from the device
    CrcMismatch(u8, u8),
    /// Resolution is unknown or outside 9..=12 bits
    UnsupportedResolution,
    /// Scratchpad readback differs from the bytes just written
    VerifyMismatch { written: [u8; 3], read: [u8; 3] },
    PortError(E),
}

impl<E: Sized + Debug> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::PortError(e)
    }
}

impl<E: Sized + Debug> Display for Error<E> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Error::NullArgument => f.write_str("missing output argument"),
            Error::NotInitialized => f.write_str("device record not initialised"),
            Error::WireFault => f.write_str("bus line stuck low"),
            Error::NoPresence => f.write_str("device not responding"),
            Error::CrcMismatch(computed, received) => write!(
                f,
                "CRC mismatch: computed 0x{:02x}, received 0x{:02x}",
                computed, received
            ),
            Error::UnsupportedResolution => f.write_str("unsupported resolution"),
            Error::VerifyMismatch { written, read } => write!(
                f,
                "scratchpad verify failed: wrote {:02x?}, read {:02x?}",
                written, read
            ),
            Error::PortError(e) => write!(f, "port error: {:?}", e),
        }
    }
}

/// Returned by operations that do not touch the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotInitialized;

impl NotInitialized {
    /// Lifts into the bus error, `From` would overlap with `From<E>`
    pub fn into_error<E: Sized + Debug>(self) -> Error<E> {
        Error::NotInitialized
    }
}

/// Resolution bit count the decoder cannot handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedResolution(pub u8);

impl UnsupportedResolution {
    pub fn into_error<E: Sized + Debug>(self) -> Error<E> {
        Error::UnsupportedResolution
    }
}
