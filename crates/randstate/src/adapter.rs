//! Width normalisation between an engine's native output and the canonical
//! 32-/64-bit draws every sampler consumes.
//!
//! [`WordSource`] owns the engine plus the word buffer and implements
//! [`BitSource`]. The mapping from native blocks to canonical words is fixed
//! per shape and must never change: it *is* the wire format of the replayed
//! stream.
//!
//! Truncation rule: when one block's total bits are not a multiple of 64
//! (a container with trailing elements that do not fill a word, or a custom
//! width with a partial top limb), the leftover bits are dropped. This is
//! documented behaviour, not an error.

use std::collections::VecDeque;

use randstate_core::BitSource;

use crate::engine::{Engine, OutputShape};
use crate::error::RandstateError;

/// How native blocks are turned into canonical words, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Packing {
    /// Arithmetic scalar of at most 32 bits.
    Narrow,
    /// Arithmetic scalar of 33..=64 bits.
    Wide,
    /// Shift/mask value of at most 32 bits.
    CustomNarrow,
    /// Shift/mask value of 33..=64 bits.
    CustomWide,
    /// Shift/mask value wider than 64 bits, split into low-first limbs.
    Limbs {
        /// Full 64-bit words recovered from one block (partial limb dropped).
        words_per_block: usize,
    },
    /// Fixed container of narrow elements packed low-element-first.
    Container {
        /// Bits per element (8, 16, 32 or 64).
        elem_bits: u32,
    },
}

/// Width-normalising adapter around one engine.
///
/// Serves canonical 32-/64-bit words, 53-bit doubles and raw blocks while
/// guaranteeing no engine bit is lost or duplicated (modulo the documented
/// truncation rule). Leftover words from multi-word blocks wait in a FIFO
/// buffer that is always drained before the engine is called again; a spare
/// high half from a 64-bit draw served as 32 bits is cached separately.
pub struct WordSource<E> {
    engine: E,
    packing: Packing,
    /// Word buffer: whole 64-bit words not yet served, FIFO.
    queue: VecDeque<u64>,
    /// Raw elements of the current block, reused between refills.
    scratch: Vec<u64>,
    /// High half left over from serving a 64-bit word as two 32-bit words.
    spare: Option<u32>,
}

impl<E: Engine> WordSource<E> {
    /// Probe `engine`'s shape and build the adapter.
    ///
    /// Fails when the declared shape cannot yield at least one canonical
    /// word per block.
    pub fn new(engine: E) -> Result<Self, RandstateError> {
        let packing = match engine.shape() {
            OutputShape::Scalar { bits } => match bits {
                1..=32 => Packing::Narrow,
                33..=64 => Packing::Wide,
                _ => {
                    return Err(RandstateError::UnsupportedShape {
                        reason: format!("scalar width {bits} outside 1..=64"),
                    })
                }
            },
            OutputShape::CustomShiftable { bits } => match bits {
                1..=32 => Packing::CustomNarrow,
                33..=64 => Packing::CustomWide,
                _ if bits > 64 => Packing::Limbs {
                    words_per_block: (bits / 64) as usize,
                },
                _ => {
                    return Err(RandstateError::UnsupportedShape {
                        reason: "zero-width custom value".to_string(),
                    })
                }
            },
            OutputShape::FixedContainer { elem_bits, len } => {
                if !matches!(elem_bits, 8 | 16 | 32 | 64) {
                    return Err(RandstateError::UnsupportedShape {
                        reason: format!("container element width {elem_bits} not a byte power"),
                    });
                }
                let per_word = (64 / elem_bits) as usize;
                if len < per_word {
                    return Err(RandstateError::UnsupportedShape {
                        reason: format!(
                            "container of {len} x {elem_bits}-bit elements holds less than one word"
                        ),
                    });
                }
                Packing::Container { elem_bits }
            }
        };
        Ok(Self {
            engine,
            packing,
            queue: VecDeque::new(),
            scratch: Vec::new(),
            spare: None,
        })
    }

    /// Borrow the engine (the facade exposes this under its lock).
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// True when one engine call yields at most 32 significant bits, which
    /// selects the two-call constructions for 64-bit words and doubles.
    #[inline]
    fn is_32bit_source(&self) -> bool {
        matches!(self.packing, Packing::Narrow | Packing::CustomNarrow)
    }

    /// One direct engine call for scalar-like shapes.
    fn produce_one(&mut self) -> u64 {
        self.scratch.clear();
        self.engine.produce(&mut self.scratch);
        // An engine that pushes nothing contributes a zero word; the shape
        // contract makes this unreachable for well-behaved engines.
        self.scratch.first().copied().unwrap_or(0)
    }

    /// Refill the word buffer from one container/wide block.
    fn refill(&mut self) {
        self.scratch.clear();
        self.engine.produce(&mut self.scratch);
        match self.packing {
            Packing::Limbs { words_per_block } => {
                // Low limbs first; a partial top limb past words_per_block
                // is dropped per the truncation rule.
                let take = words_per_block.min(self.scratch.len());
                self.queue.extend(self.scratch[..take].iter().copied());
            }
            Packing::Container { elem_bits } => {
                let per_word = (64 / elem_bits) as usize;
                let mask = if elem_bits == 64 {
                    u64::MAX
                } else {
                    (1u64 << elem_bits) - 1
                };
                let full_words = self.scratch.len() / per_word;
                for w in 0..full_words {
                    let mut value = 0u64;
                    let mut shift = 0u32;
                    for elem in &self.scratch[w * per_word..(w + 1) * per_word] {
                        value |= (elem & mask) << shift;
                        shift += elem_bits;
                    }
                    self.queue.push_back(value);
                }
                // Trailing elements short of a full word are dropped.
            }
            _ => {
                // Scalar-like shapes never refill the buffer.
                debug_assert!(false, "refill called on a scalar packing");
            }
        }
    }
}

impl<E: Engine> BitSource for WordSource<E> {
    fn next_raw(&mut self) -> u64 {
        match self.packing {
            Packing::Narrow | Packing::Wide | Packing::CustomNarrow | Packing::CustomWide => {
                self.produce_one()
            }
            Packing::Limbs { .. } | Packing::Container { .. } => loop {
                if let Some(word) = self.queue.pop_front() {
                    return word;
                }
                self.refill();
            },
        }
    }

    fn next_u32(&mut self) -> u32 {
        if self.is_32bit_source() {
            return self.next_raw() as u32;
        }
        if let Some(high) = self.spare.take() {
            return high;
        }
        let word = self.next_raw();
        self.spare = Some((word >> 32) as u32);
        word as u32
    }

    fn next_u64(&mut self) -> u64 {
        if self.is_32bit_source() {
            // High word drawn first, matching the reference construction.
            let high = self.next_raw();
            let low = self.next_raw();
            (high << 32) | low
        } else {
            self.next_raw()
        }
    }

    fn next_f64(&mut self) -> f64 {
        match self.packing {
            Packing::Narrow => {
                // 27 + 26 bit construction from two narrow calls.
                let a = self.produce_one() >> 5;
                let b = self.produce_one() >> 6;
                (a as f64 * 67108864.0 + b as f64) / 9007199254740992.0
            }
            Packing::Wide => {
                let raw = self.produce_one();
                (raw >> 11) as f64 * (1.0 / 9007199254740992.0)
            }
            _ => {
                let raw = self.next_raw();
                (raw >> 11) as f64 * (1.0 / 9007199254740992.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FnEngine;

    /// Container engine replaying fixed blocks; panics past the script.
    struct ScriptedContainer {
        elem_bits: u32,
        blocks: Vec<Vec<u64>>,
        cursor: usize,
    }

    impl Engine for ScriptedContainer {
        fn shape(&self) -> OutputShape {
            OutputShape::FixedContainer {
                elem_bits: self.elem_bits,
                len: self.blocks[0].len(),
            }
        }

        fn produce(&mut self, out: &mut Vec<u64>) {
            let block = &self.blocks[self.cursor];
            self.cursor += 1;
            out.extend(block.iter().copied());
        }
    }

    /// 128-bit custom value delivered as two low-first limbs.
    struct Wide128 {
        values: Vec<u128>,
        cursor: usize,
    }

    impl Engine for Wide128 {
        fn shape(&self) -> OutputShape {
            OutputShape::CustomShiftable { bits: 128 }
        }

        fn produce(&mut self, out: &mut Vec<u64>) {
            let v = self.values[self.cursor];
            self.cursor += 1;
            out.push(v as u64);
            out.push((v >> 64) as u64);
        }
    }

    #[test]
    fn narrow_scalar_concatenates_high_first() {
        let mut calls = [0xAAAA_AAAA_u32, 0x5555_5555].into_iter();
        let mut source =
            WordSource::new(FnEngine::new(move || calls.next().expect("over-draw"))).unwrap();
        assert_eq!(source.next_u64(), 0xAAAA_AAAA_5555_5555);
    }

    #[test]
    fn wide_scalar_serves_low_half_then_cached_high_half() {
        let mut calls = [0x1111_2222_3333_4444_u64, 0xDEAD_BEEF_CAFE_F00D].into_iter();
        let mut source =
            WordSource::new(FnEngine::new(move || calls.next().expect("over-draw"))).unwrap();
        assert_eq!(source.next_u32(), 0x3333_4444);
        assert_eq!(source.next_u32(), 0x1111_2222);
        // Cache exhausted: the next call pulls a fresh word.
        assert_eq!(source.next_u32(), 0xCAFE_F00D);
    }

    #[test]
    fn narrow_double_uses_27_26_bit_construction() {
        let mut calls = [0x8000_0000_u32, 0x8000_0000].into_iter();
        let mut source =
            WordSource::new(FnEngine::new(move || calls.next().expect("over-draw"))).unwrap();
        // a = 2^26, b = 2^25: (2^52 + 2^25) / 2^53 = 0.5 + 2^-28.
        assert_eq!(source.next_f64(), 0.5 + (2.0_f64).powi(-28));
    }

    #[test]
    fn wide_double_uses_53_bit_construction() {
        let mut calls = [u64::MAX].into_iter();
        let mut source =
            WordSource::new(FnEngine::new(move || calls.next().expect("over-draw"))).unwrap();
        let expected = ((u64::MAX >> 11) as f64) * (1.0 / 9007199254740992.0);
        assert_eq!(source.next_f64(), expected);
        assert!(expected < 1.0);
    }

    #[test]
    fn container_packs_low_element_first() {
        let mut source = WordSource::new(ScriptedContainer {
            elem_bits: 32,
            blocks: vec![vec![0x3F00_0000, 0x4000_0000, 0x1234_5678, 0x9ABC_DEF0]],
            cursor: 0,
        })
        .unwrap();
        assert_eq!(source.next_raw(), 0x4000_0000_3F00_0000);
        assert_eq!(source.next_raw(), 0x9ABC_DEF0_1234_5678);
    }

    #[test]
    fn container_buffer_drained_before_engine_recalled() {
        let mut source = WordSource::new(ScriptedContainer {
            elem_bits: 16,
            blocks: vec![
                vec![0x0001, 0x0002, 0x0003, 0x0004, 0x0005, 0x0006, 0x0007, 0x0008],
                vec![0x1111, 0x2222, 0x3333, 0x4444, 0x5555, 0x6666, 0x7777, 0x8888],
            ],
            cursor: 0,
        })
        .unwrap();
        // One block yields two words; the second word must come from the
        // buffer without a second produce call.
        assert_eq!(source.next_raw(), 0x0004_0003_0002_0001);
        assert_eq!(source.next_raw(), 0x0008_0007_0006_0005);
        assert_eq!(source.next_raw(), 0x4444_3333_2222_1111);
    }

    #[test]
    fn container_truncates_trailing_elements() {
        // Six u16 elements: one full word, trailing two elements dropped.
        let mut source = WordSource::new(ScriptedContainer {
            elem_bits: 16,
            blocks: vec![
                vec![0x000A, 0x000B, 0x000C, 0x000D, 0xFFFF, 0xFFFF],
                vec![0x1111, 0x2222, 0x3333, 0x4444, 0xEEEE, 0xEEEE],
            ],
            cursor: 0,
        })
        .unwrap();
        assert_eq!(source.next_raw(), 0x000D_000C_000B_000A);
        assert_eq!(source.next_raw(), 0x4444_3333_2222_1111);
    }

    #[test]
    fn wide_custom_splits_low_limb_first() {
        let mut source = WordSource::new(Wide128 {
            values: vec![(0xAAAA_u128 << 64) | 0xBBBB],
            cursor: 0,
        })
        .unwrap();
        assert_eq!(source.next_raw(), 0xBBBB);
        assert_eq!(source.next_raw(), 0xAAAA);
    }

    #[test]
    fn rejects_under_full_word_container() {
        let engine = ScriptedContainer {
            elem_bits: 16,
            blocks: vec![vec![1, 2]],
            cursor: 0,
        };
        assert!(matches!(
            WordSource::new(engine),
            Err(RandstateError::UnsupportedShape { .. })
        ));
    }

    #[test]
    fn rejects_odd_element_width() {
        struct OddWidth;
        impl Engine for OddWidth {
            fn shape(&self) -> OutputShape {
                OutputShape::FixedContainer {
                    elem_bits: 24,
                    len: 4,
                }
            }
            fn produce(&mut self, _out: &mut Vec<u64>) {}
        }
        assert!(matches!(
            WordSource::new(OddWidth),
            Err(RandstateError::UnsupportedShape { .. })
        ));
    }
}
