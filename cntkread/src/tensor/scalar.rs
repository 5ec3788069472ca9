/// IEEE 754 half-precision (F16) scalar storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct F16 {
    pub bits: u16,
}

impl F16 {
    pub fn from_bits(bits: u16) -> Self {
        Self { bits }
    }

    /// Decode by splitting sign, exponent and mantissa.
    pub fn to_f64(self) -> f64 {
        let sign = if self.bits & 0x8000 != 0 { -1.0 } else { 1.0 };
        let exp = ((self.bits & 0x7c00) >> 10) as i32;
        let mant = (self.bits & 0x03ff) as f64 / 1024.0;
        match exp {
            0 => sign * 2f64.powi(-14) * mant,
            0x1f if mant != 0.0 => f64::NAN,
            0x1f => sign * f64::INFINITY,
            _ => sign * 2f64.powi(exp - 15) * (1.0 + mant),
        }
    }

    pub fn to_f32(self) -> f32 {
        self.to_f64() as f32
    }
}
