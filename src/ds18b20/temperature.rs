use super::Resolution;
use crate::UnsupportedResolution;
use byteorder::{ByteOrder, LittleEndian};
use log::error;

/// Temperature register in 1/16 °C, with the bits undefined at `resolution`
/// cleared
pub fn decode_raw(lsb: u8, msb: u8, resolution: Resolution) -> i16 {
    LittleEndian::read_i16(&[lsb & resolution.lsb_mask(), msb])
}

/// Temperature register in °C
pub fn decode(lsb: u8, msb: u8, resolution: Resolution) -> f32 {
    decode_raw(lsb, msb, resolution) as f32 / 16_f32
}

/// Like [`decode`] for a resolution given as a bit count. Bit counts outside
/// 9..=12 are logged and rejected; `unwrap_or_default()` turns them into 0.0.
pub fn decode_temperature(lsb: u8, msb: u8, bits: u8) -> Result<f32, UnsupportedResolution> {
    match Resolution::from_bits(bits) {
        Some(resolution) => Ok(decode(lsb, msb, resolution)),
        None => {
            error!("unsupported resolution {}", bits);
            Err(UnsupportedResolution(bits))
        }
    }
}

/// Split a raw value in 1/16 °C into integer and fraction, for targets
/// without floats. The temperature is `integer + fraction / 10000`.
pub fn split_temp(raw: i16) -> (i16, i16) {
    if raw >= 0 {
        (raw >> 4, (raw & 0xF) * 625)
    } else {
        let abs = -(raw as i32);
        (-((abs >> 4) as i16), -625 * (abs & 0xF) as i16)
    }
}
