//! Unbiased bounded-integer sampling for every destination width.
//!
//! Two rejection modes are supported, selected by the caller:
//!
//! - *masked*: draw, mask down to the next power-of-two-minus-one covering
//!   the range, retry while the masked draw exceeds the range;
//! - *unmasked*: Lemire's multiply-and-reject construction, which rejects on
//!   a narrower threshold instead of a bit mask.
//!
//! Neither mode ever reduces by modulo or truncation, so no bias is
//! introduced. Draws narrower than 32 bits are carved out of buffered 32-bit
//! words exactly as the reference does, which keeps the consumed raw stream
//! identical.

use randstate_core::BitSource;

/// Smallest `2^k - 1` mask covering `max`.
#[inline]
fn gen_mask(max: u64) -> u64 {
    let mut mask = max;
    mask |= mask >> 1;
    mask |= mask >> 2;
    mask |= mask >> 4;
    mask |= mask >> 8;
    mask |= mask >> 16;
    mask |= mask >> 32;
    mask
}

/// Shift-down buffer carving sub-32-bit draws out of 32-bit words.
struct WordBuffer {
    buf: u32,
    remaining: u32,
}

impl WordBuffer {
    fn new() -> Self {
        Self {
            buf: 0,
            remaining: 0,
        }
    }

    #[inline]
    fn next_u16<S: BitSource + ?Sized>(&mut self, source: &mut S) -> u16 {
        if self.remaining == 0 {
            self.buf = source.next_u32();
            self.remaining = 1;
        } else {
            self.buf >>= 16;
            self.remaining -= 1;
        }
        self.buf as u16
    }

    #[inline]
    fn next_u8<S: BitSource + ?Sized>(&mut self, source: &mut S) -> u8 {
        if self.remaining == 0 {
            self.buf = source.next_u32();
            self.remaining = 3;
        } else {
            self.buf >>= 8;
            self.remaining -= 1;
        }
        self.buf as u8
    }

    #[inline]
    fn next_bit<S: BitSource + ?Sized>(&mut self, source: &mut S) -> bool {
        if self.remaining == 0 {
            self.buf = source.next_u32();
            self.remaining = 31;
        } else {
            self.buf >>= 1;
            self.remaining -= 1;
        }
        self.buf & 1 != 0
    }
}

#[inline]
fn masked_u64<S: BitSource + ?Sized>(source: &mut S, rng: u64, mask: u64) -> u64 {
    loop {
        let val = source.next_u64() & mask;
        if val <= rng {
            return val;
        }
    }
}

#[inline]
fn masked_u32<S: BitSource + ?Sized>(source: &mut S, rng: u32, mask: u32) -> u32 {
    loop {
        let val = source.next_u32() & mask;
        if val <= rng {
            return val;
        }
    }
}

#[inline]
fn lemire_u64<S: BitSource + ?Sized>(source: &mut S, rng: u64) -> u64 {
    // rng == u64::MAX is handled by the fill-level full-range shortcut.
    let rng_excl = rng + 1;
    let mut m = u128::from(source.next_u64()) * u128::from(rng_excl);
    let mut leftover = m as u64;
    if leftover < rng_excl {
        let threshold = (u64::MAX - rng) % rng_excl;
        while leftover < threshold {
            m = u128::from(source.next_u64()) * u128::from(rng_excl);
            leftover = m as u64;
        }
    }
    (m >> 64) as u64
}

#[inline]
fn lemire_u32<S: BitSource + ?Sized>(source: &mut S, rng: u32) -> u32 {
    let rng_excl = rng + 1;
    let mut m = u64::from(source.next_u32()) * u64::from(rng_excl);
    let mut leftover = m as u32;
    if leftover < rng_excl {
        let threshold = (u32::MAX - rng) % rng_excl;
        while leftover < threshold {
            m = u64::from(source.next_u32()) * u64::from(rng_excl);
            leftover = m as u32;
        }
    }
    (m >> 32) as u32
}

#[inline]
fn lemire_u16<S: BitSource + ?Sized>(source: &mut S, buffer: &mut WordBuffer, rng: u16) -> u16 {
    let rng_excl = rng + 1;
    let mut m = u32::from(buffer.next_u16(source)) * u32::from(rng_excl);
    let mut leftover = m as u16;
    if leftover < rng_excl {
        let threshold = (u16::MAX - rng) % rng_excl;
        while leftover < threshold {
            m = u32::from(buffer.next_u16(source)) * u32::from(rng_excl);
            leftover = m as u16;
        }
    }
    (m >> 16) as u16
}

#[inline]
fn lemire_u8<S: BitSource + ?Sized>(source: &mut S, buffer: &mut WordBuffer, rng: u8) -> u8 {
    let rng_excl = rng + 1;
    let mut m = u16::from(buffer.next_u8(source)) * u16::from(rng_excl);
    let mut leftover = m as u8;
    if leftover < rng_excl {
        let threshold = (u8::MAX - rng) % rng_excl;
        while leftover < threshold {
            m = u16::from(buffer.next_u8(source)) * u16::from(rng_excl);
            leftover = m as u8;
        }
    }
    (m >> 8) as u8
}

/// Fill `out` with uniform draws from the inclusive range `[off, off + rng]`
/// at 64-bit width.
///
/// Ranges fitting 32 bits are served by the 32-bit generator, and the full
/// 64-bit range shortcuts to raw words; both details are part of the
/// replayed stream.
pub fn fill_bounded_u64<S: BitSource + ?Sized>(
    source: &mut S,
    off: u64,
    rng: u64,
    use_masked: bool,
    out: &mut [u64],
) {
    if rng == 0 {
        out.fill(off);
    } else if rng <= u64::from(u32::MAX) {
        let rng32 = rng as u32;
        if rng32 == u32::MAX {
            // Exactly the 32-bit range: raw 32-bit draws, no rejection.
            for slot in out.iter_mut() {
                *slot = off.wrapping_add(u64::from(source.next_u32()));
            }
        } else if use_masked {
            let mask = gen_mask(rng) as u32;
            for slot in out.iter_mut() {
                *slot = off.wrapping_add(u64::from(masked_u32(source, rng32, mask)));
            }
        } else {
            for slot in out.iter_mut() {
                *slot = off.wrapping_add(u64::from(lemire_u32(source, rng32)));
            }
        }
    } else if rng == u64::MAX {
        for slot in out.iter_mut() {
            *slot = off.wrapping_add(source.next_u64());
        }
    } else if use_masked {
        let mask = gen_mask(rng);
        for slot in out.iter_mut() {
            *slot = off.wrapping_add(masked_u64(source, rng, mask));
        }
    } else {
        for slot in out.iter_mut() {
            *slot = off.wrapping_add(lemire_u64(source, rng));
        }
    }
}

/// Fill `out` with uniform draws from `[off, off + rng]` at 32-bit width.
pub fn fill_bounded_u32<S: BitSource + ?Sized>(
    source: &mut S,
    off: u32,
    rng: u32,
    use_masked: bool,
    out: &mut [u32],
) {
    if rng == 0 {
        out.fill(off);
    } else if rng == u32::MAX {
        for slot in out.iter_mut() {
            *slot = off.wrapping_add(source.next_u32());
        }
    } else if use_masked {
        let mask = gen_mask(u64::from(rng)) as u32;
        for slot in out.iter_mut() {
            *slot = off.wrapping_add(masked_u32(source, rng, mask));
        }
    } else {
        for slot in out.iter_mut() {
            *slot = off.wrapping_add(lemire_u32(source, rng));
        }
    }
}

/// Fill `out` with uniform draws from `[off, off + rng]` at 16-bit width.
pub fn fill_bounded_u16<S: BitSource + ?Sized>(
    source: &mut S,
    off: u16,
    rng: u16,
    use_masked: bool,
    out: &mut [u16],
) {
    let mut buffer = WordBuffer::new();
    if rng == 0 {
        out.fill(off);
    } else if rng == u16::MAX {
        for slot in out.iter_mut() {
            *slot = off.wrapping_add(buffer.next_u16(source));
        }
    } else if use_masked {
        let mask = gen_mask(u64::from(rng)) as u16;
        for slot in out.iter_mut() {
            loop {
                let val = buffer.next_u16(source) & mask;
                if val <= rng {
                    *slot = off.wrapping_add(val);
                    break;
                }
            }
        }
    } else {
        for slot in out.iter_mut() {
            *slot = off.wrapping_add(lemire_u16(source, &mut buffer, rng));
        }
    }
}

/// Fill `out` with uniform draws from `[off, off + rng]` at 8-bit width.
pub fn fill_bounded_u8<S: BitSource + ?Sized>(
    source: &mut S,
    off: u8,
    rng: u8,
    use_masked: bool,
    out: &mut [u8],
) {
    let mut buffer = WordBuffer::new();
    if rng == 0 {
        out.fill(off);
    } else if rng == u8::MAX {
        for slot in out.iter_mut() {
            *slot = off.wrapping_add(buffer.next_u8(source));
        }
    } else if use_masked {
        let mask = gen_mask(u64::from(rng)) as u8;
        for slot in out.iter_mut() {
            loop {
                let val = buffer.next_u8(source) & mask;
                if val <= rng {
                    *slot = off.wrapping_add(val);
                    break;
                }
            }
        }
    } else {
        for slot in out.iter_mut() {
            *slot = off.wrapping_add(lemire_u8(source, &mut buffer, rng));
        }
    }
}

/// Fill `out` with uniform booleans from `{off, off + rng}`.
///
/// Bits are carved out of buffered 32-bit words; the mode flag is irrelevant
/// at one-bit width.
pub fn fill_bounded_bool<S: BitSource + ?Sized>(
    source: &mut S,
    off: bool,
    rng: bool,
    _use_masked: bool,
    out: &mut [bool],
) {
    let mut buffer = WordBuffer::new();
    for slot in out.iter_mut() {
        *slot = if !rng {
            off
        } else {
            buffer.next_bit(source) || off
        };
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for bool {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
    impl Sealed for u64 {}
    impl Sealed for i8 {}
    impl Sealed for i16 {}
    impl Sealed for i32 {}
    impl Sealed for i64 {}
}

/// Integer widths servable by the bounded fill.
///
/// Signed types are handled in two's complement: the offset is the low
/// bound's unsigned image and the draw is added with wraparound, which is
/// exactly the reference's cast-and-add.
pub trait BoundedInt: Copy + PartialOrd + sealed::Sealed {
    /// Fill `out` with uniform draws from the inclusive range `[low, high]`.
    ///
    /// Callers guarantee `low <= high`. One call shares one word buffer, so
    /// narrow widths consume the raw stream exactly as one batched fill.
    fn fill_bounded<S: BitSource + ?Sized>(
        source: &mut S,
        low: Self,
        high: Self,
        use_masked: bool,
        out: &mut [Self],
    );

    /// One uniform draw from the inclusive range `[low, high]`.
    fn sample_bounded<S: BitSource + ?Sized>(
        source: &mut S,
        low: Self,
        high: Self,
        use_masked: bool,
    ) -> Self {
        let mut out = [low];
        Self::fill_bounded(source, low, high, use_masked, &mut out);
        out[0]
    }
}

macro_rules! impl_bounded_unsigned {
    ($ty:ty, $fill:ident) => {
        impl BoundedInt for $ty {
            fn fill_bounded<S: BitSource + ?Sized>(
                source: &mut S,
                low: Self,
                high: Self,
                use_masked: bool,
                out: &mut [Self],
            ) {
                $fill(source, low, high - low, use_masked, out);
            }
        }
    };
}

macro_rules! impl_bounded_signed {
    ($ty:ty, $uty:ty, $fill:ident) => {
        impl BoundedInt for $ty {
            fn fill_bounded<S: BitSource + ?Sized>(
                source: &mut S,
                low: Self,
                high: Self,
                use_masked: bool,
                out: &mut [Self],
            ) {
                let off = low as $uty;
                let rng = high.wrapping_sub(low) as $uty;
                let mut scratch = vec![0 as $uty; out.len()];
                $fill(source, off, rng, use_masked, &mut scratch);
                for (slot, &val) in out.iter_mut().zip(&scratch) {
                    *slot = val as $ty;
                }
            }
        }
    };
}

impl_bounded_unsigned!(u8, fill_bounded_u8);
impl_bounded_unsigned!(u16, fill_bounded_u16);
impl_bounded_unsigned!(u32, fill_bounded_u32);
impl_bounded_unsigned!(u64, fill_bounded_u64);
impl_bounded_signed!(i8, u8, fill_bounded_u8);
impl_bounded_signed!(i16, u16, fill_bounded_u16);
impl_bounded_signed!(i32, u32, fill_bounded_u32);
impl_bounded_signed!(i64, u64, fill_bounded_u64);

impl BoundedInt for bool {
    fn fill_bounded<S: BitSource + ?Sized>(
        source: &mut S,
        low: Self,
        high: Self,
        use_masked: bool,
        out: &mut [Self],
    ) {
        fill_bounded_bool(source, low, low != high, use_masked, out);
    }
}
