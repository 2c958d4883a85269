//! Bit reinterpretation between floats, integers and map payloads
//!
//! Map payloads are opaque 64-bit slots. Programs that store floats in a
//! map reinterpret the bits rather than converting the value, and read them
//! back the same way.

/// Reinterpret the bits of an `f32` as an `i32`.
#[inline(always)]
pub fn f32_to_bits(x: f32) -> i32 {
    bytemuck::cast(x)
}

/// Reinterpret the bits of an `i32` as an `f32`.
#[inline(always)]
pub fn f32_from_bits(bits: i32) -> f32 {
    bytemuck::cast(bits)
}

/// Store an `f32` in the low half of a payload.
#[inline(always)]
pub fn payload_from_f32(x: f32) -> u64 {
    u64::from(bytemuck::cast::<f32, u32>(x))
}

/// Read an `f32` back from the low half of a payload.
#[inline(always)]
pub fn payload_to_f32(payload: u64) -> f32 {
    // The high half is unused for f32 payloads.
    bytemuck::cast(payload as u32)
}

/// Store an `f64` in a payload.
#[inline(always)]
pub fn payload_from_f64(x: f64) -> u64 {
    bytemuck::cast(x)
}

/// Read an `f64` back from a payload.
#[inline(always)]
pub fn payload_to_f64(payload: u64) -> f64 {
    bytemuck::cast(payload)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn float_bits() {
        assert_eq!(f32_to_bits(1.0), 0x3f80_0000);
        assert_eq!(f32_from_bits(0x4049_0fdb), std::f32::consts::PI);
        assert_eq!(payload_from_f32(-2.0), 0xc000_0000);
        assert_eq!(payload_to_f32(0xdead_beef_3f80_0000), 1.0);
        assert_eq!(payload_to_f64(payload_from_f64(-0.25)), -0.25);
    }
}
