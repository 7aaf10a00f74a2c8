#![cfg_attr(not(test), no_std)]
#![doc = include_str!("../README.md")]

#[cfg(feature = "alloc")]
extern crate alloc;

mod address;
mod bus;
mod command;
#[cfg(feature = "bitbang")]
mod driver;
pub mod ds18b20;
#[cfg(feature = "bitbang")]
mod iowire;
mod result;
#[cfg(test)]
mod sim;

pub use address::{Address, AddressError};
pub use bus::OneWireBus;
pub use command::{Command, OpCode};
#[cfg(feature = "bitbang")]
pub use driver::Driver;
pub use ds18b20::{Ds18b20, PowerSupply, Resolution, Scratchpad, Timing};
#[cfg(feature = "bitbang")]
pub use iowire::{Inverted, IoWire};
pub use result::{Error, NotInitialized, UnsupportedResolution};

/// Dallas/Maxim CRC-8 (x^8 + x^5 + x^4 + 1, reflected), continuing from `crc`
pub fn compute_partial_crc8(crc: u8, data: &[u8]) -> u8 {
    let mut crc = crc;
    for byte in data.iter() {
        let mut byte = *byte;
        for _ in 0..8 {
            let mix = (crc ^ byte) & 0x01;
            crc >>= 1;
            if mix != 0x00 {
                crc ^= 0x8C;
            }
            byte >>= 1;
        }
    }
    crc
}

/// CRC-8 of a whole block. A block followed by its own CRC computes to zero.
pub fn crc8(data: &[u8]) -> u8 {
    compute_partial_crc8(0, data)
}
