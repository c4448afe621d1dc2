//! Static order-0 arithmetic coding with phase-scanned modeling.
//!
//! The model is a single cumulative frequency table, but it is not always
//! built on byte boundaries: the input is pre-scanned under all eight bit
//! phases and the phase whose histogram has the largest standard deviation
//! is kept.  A more skewed marginal distribution codes tighter under an
//! order-0 model, and text with regular sub-byte patterns can gain several
//! percent from a non-zero phase.  The chosen shift and the eight bits the
//! shifted view elides travel in the container header, so the decoder can
//! splice the stream back together exactly.
//!
//! The coder itself is the classic 32-bit integer range coder: E1/E2/E3
//! renormalization with underflow bits deferred into the writer's pending
//! counter.  All interval arithmetic runs in u64 so the range*frequency
//! products cannot overflow.

use crate::tools::bitstream::{BitReader,BitWriter};
use crate::tools::serialize::{get_u32,get_u64,put_u32,put_u64};
use crate::tools::shifted::{residual_byte,ShiftedBytes};
use crate::Error;

const MAX: u64 = u32::MAX as u64;
const QUARTER: u64 = (MAX>>2) + 1;
const HALF: u64 = QUARTER*2;
const THREE_QUARTERS: u64 = QUARTER*3;

/// u64 length field plus 256 cumulative u32 frequencies
const TABLE_OFFSET: usize = 8;
const HEADER_LEN: usize = 256*4 + 8;
const SHIFT_OFFSET: usize = HEADER_LEN;
const RESIDUAL_OFFSET: usize = HEADER_LEN + 1;
const PAYLOAD_OFFSET: usize = HEADER_LEN + 2;

/// Cumulative frequency table over byte values, built under the most
/// dispersed of the eight bit phases.  `freq[0]` is 0 and `freq[256]` is the
/// denominator.
struct PhaseModel {
    freq: [u32;257],
    shift: u8
}

fn histogram(buf: &[u8],shift: u8) -> [u32;256] {
    let mut counts = [0u32;256];
    let view = ShiftedBytes::new(buf,shift);
    let bound = buf.len().saturating_sub(1).min(u32::MAX as usize);
    for i in 0..bound {
        counts[view.get(i) as usize] += 1;
    }
    counts
}

/// sample standard deviation of the bucket counts (divisor n-1)
fn deviation(counts: &[u32;256]) -> f64 {
    let mean = counts.iter().map(|&c| c as f64).sum::<f64>() / counts.len() as f64;
    let sum = counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>();
    (sum / (counts.len() as f64 - 1.0)).sqrt()
}

impl PhaseModel {
    /// Scan all eight phases and keep the most dispersed histogram.
    /// Ties go to the lower shift.
    fn from_input(buf: &[u8]) -> Self {
        let mut tables = [[0u32;256];8];
        let mut best: usize = 0;
        let mut best_dev = 0.0;
        for shift in 0..8 {
            tables[shift] = histogram(buf,shift as u8);
            let dev = deviation(&tables[shift]);
            log::debug!("phase {} deviation {:.3}",shift,dev);
            if dev > best_dev {
                best_dev = dev;
                best = shift;
            }
        }
        let mut freq = [0u32;257];
        for i in 0..256 {
            freq[i+1] = freq[i] + tables[best][i];
        }
        Self { freq, shift: best as u8 }
    }
    fn denominator(&self) -> u32 {
        self.freq[256]
    }
    fn probability(&self,byte: u8) -> (u32,u32) {
        (self.freq[byte as usize],self.freq[byte as usize + 1])
    }
    /// Find the byte whose cumulative span contains `count`.
    fn symbol_from_count(&self,count: u64) -> Result<(u32,u32,u8),Error> {
        for i in 0..256 {
            if self.freq[i+1] as u64 > count {
                return Ok((self.freq[i],self.freq[i+1],i as u8));
            }
        }
        log::error!("no symbol spans count {}",count);
        Err(Error::BadCompressionStream)
    }
    fn store(&self,buf: &mut [u8]) {
        for i in 1..257 {
            put_u32(buf,TABLE_OFFSET + 4*(i-1),self.freq[i]);
        }
    }
    fn load(buf: &[u8]) -> Self {
        let mut freq = [0u32;257];
        for i in 1..257 {
            freq[i] = get_u32(buf,TABLE_OFFSET + 4*(i-1));
        }
        Self { freq, shift: buf[SHIFT_OFFSET] }
    }
}

/// Main compression function.
/// The coded symbols are the first `len-1` positions of the shifted view;
/// the final byte always travels in the residual, so every coded symbol was
/// seen by the histogram.
pub fn compress(ibuf: &[u8]) -> Result<Vec<u8>,Error> {
    if ibuf.len() as u64 > u32::MAX as u64 + 1 {
        return Err(Error::FileTooLarge);
    }
    let model = PhaseModel::from_input(ibuf);
    log::debug!("phase {} selected, denominator {}",model.shift,model.denominator());
    let view = ShiftedBytes::new(ibuf,model.shift);
    let mut out = BitWriter::new(HEADER_LEN);
    out.put_byte(model.shift);
    out.put_byte(residual_byte(ibuf,model.shift));
    let mut low: u64 = 0;
    let mut high: u64 = MAX;
    let denom = model.denominator() as u64;
    for i in 0..ibuf.len().saturating_sub(1) {
        let range = high - low + 1;
        let (p_low,p_high) = model.probability(view.get(i));
        high = low + range*(p_high as u64)/denom - 1;
        low = low + range*(p_low as u64)/denom;
        loop {
            if high < HALF {
                out.put_bit_with_pending(0);
            } else if low >= HALF {
                out.put_bit_with_pending(1);
            } else if high < THREE_QUARTERS && low >= QUARTER {
                out.inc_pending();
                low -= QUARTER;
                high -= QUARTER;
            } else {
                break;
            }
            // the mask performs the implicit halving subtraction for E2
            high = ((high<<1) | 1) & MAX;
            low = (low<<1) & MAX;
        }
    }
    // flush at least two bits to pin down the final interval
    out.inc_pending();
    if low < QUARTER {
        out.put_bit_with_pending(0);
    } else {
        out.put_bit_with_pending(1);
    }
    let buf = out.as_mut_slice();
    put_u64(buf,0,ibuf.len() as u64);
    model.store(buf);
    Ok(out.into_inner())
}

/// Main decompression function.
pub fn expand(ibuf: &[u8]) -> Result<Vec<u8>,Error> {
    if ibuf.len() < PAYLOAD_OFFSET {
        log::error!("container shorter than its fixed header");
        return Err(Error::BadCompressionStream);
    }
    let size = get_u64(ibuf,0);
    let model = PhaseModel::load(ibuf);
    let shift = model.shift;
    if shift > 7 {
        log::error!("shift {} out of range",shift);
        return Err(Error::BadCompressionStream);
    }
    let residual = ibuf[RESIDUAL_OFFSET];
    if size == 0 {
        return Ok(Vec::new());
    }
    let mut out = BitWriter::new(0);
    // the low `shift` bits of the residual are the leading bits of the
    // original first byte
    for i in 0..shift {
        out.put_bit((residual>>(shift-1-i))&1);
    }
    if size > 1 {
        let denom = model.denominator() as u64;
        if denom == 0 {
            log::error!("empty frequency table with nonzero length");
            return Err(Error::BadCompressionStream);
        }
        let mut reader = BitReader::new(ibuf,PAYLOAD_OFFSET);
        let mut low: u64 = 0;
        let mut high: u64 = MAX;
        let mut value: u64 = 0;
        for _i in 0..32 {
            value = (value<<1) | reader.get_bit() as u64;
        }
        let mut remaining = size;
        while remaining > 1 {
            let range = high - low + 1;
            let count = ((value - low + 1)*denom - 1)/range;
            let (p_low,p_high,byte) = model.symbol_from_count(count)?;
            out.put_byte(byte);
            high = low + range*(p_high as u64)/denom - 1;
            low = low + range*(p_low as u64)/denom;
            loop {
                if high < HALF {
                    // shift only
                } else if low >= HALF {
                    value -= HALF;
                    low -= HALF;
                    high -= HALF;
                } else if high < THREE_QUARTERS && low >= QUARTER {
                    value -= QUARTER;
                    low -= QUARTER;
                    high -= QUARTER;
                } else {
                    break;
                }
                low <<= 1;
                high = (high<<1) | 1;
                value = (value<<1) | reader.get_bit() as u64;
            }
            remaining -= 1;
        }
    }
    // tail of the last original byte
    for i in 0..8-shift {
        out.put_bit((residual>>(7-i))&1);
    }
    out.truncate_one();
    Ok(out.into_inner())
}

// *************** TESTS *****************

#[test]
fn single_symbol_container_is_exact() {
    // "AAAA": every phase sees the same three-count histogram, so the tie
    // break keeps phase 0; the coder emits only the two termination bits
    let compressed = compress(b"AAAA").expect("compression failed");
    let mut expected = vec![0u8;PAYLOAD_OFFSET+1];
    expected[0] = 4; // length
    for i in 0x41..256 {
        put_u32(&mut expected,TABLE_OFFSET + 4*i,3);
    }
    expected[SHIFT_OFFSET] = 0;
    expected[RESIDUAL_OFFSET] = 0x41;
    expected[PAYLOAD_OFFSET] = 0b01000000;
    assert_eq!(compressed,expected);
    assert_eq!(expand(&compressed).expect("expansion failed"),b"AAAA");
}

#[test]
fn all_same_byte_run_stays_tiny() {
    // a constant run never narrows the interval, so the payload is exactly
    // the two termination bits regardless of length
    let data = vec![0x7fu8;100_000];
    let compressed = compress(&data).expect("compression failed");
    assert_eq!(compressed.len(),PAYLOAD_OFFSET+1);
    assert_eq!(expand(&compressed).expect("expansion failed"),data);
}

#[test]
fn sequential_bytes_histogram() {
    let data: Vec<u8> = (0u8..=255).collect();
    let counts = histogram(&data,0);
    // the final byte is outside the scan
    assert_eq!(counts[255],0);
    assert_eq!(counts.iter().map(|&c| c as u64).sum::<u64>(),255);
    let compressed = compress(&data).expect("compression failed");
    assert_eq!(expand(&compressed).expect("expansion failed"),data);
}

#[test]
fn invertibility() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let compressed = compress(test_data).expect("compression failed");
    let expanded = expand(&compressed).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);
}

#[test]
fn invertibility_tiny_inputs() {
    for data in [vec![],vec![0x00u8],vec![0xffu8],vec![0x12,0x34]] {
        let compressed = compress(&data).expect("compression failed");
        let expanded = expand(&compressed).expect("expansion failed");
        assert_eq!(data,expanded);
    }
}

#[test]
fn invertibility_one_spike() {
    // near-degenerate distribution: a single 0xff in a megabyte of zeros
    let mut data = vec![0u8;1<<20];
    data[1<<19] = 0xff;
    let compressed = compress(&data).expect("compression failed");
    assert!(compressed.len() < data.len()/100);
    let expanded = expand(&compressed).expect("expansion failed");
    assert_eq!(data,expanded);
}

#[test]
fn invertibility_mixed_phases() {
    // patterns that reward a nonzero phase as well as plain text
    let mut data = Vec::new();
    for i in 0..4000u32 {
        data.push((i.wrapping_mul(2654435761)>>13) as u8 & 0x55);
    }
    let compressed = compress(&data).expect("compression failed");
    let expanded = expand(&compressed).expect("expansion failed");
    assert_eq!(data,expanded);
}

#[test]
fn determinism() {
    let data = b"the quick brown fox jumps over the lazy dog";
    assert_eq!(compress(data).unwrap(),compress(data).unwrap());
}

#[test]
fn truncated_container_is_rejected() {
    assert!(matches!(expand(&[0u8;16]),Err(Error::BadCompressionStream)));
    let compressed = compress(b"some reasonable input").unwrap();
    assert!(matches!(expand(&compressed[..PAYLOAD_OFFSET-1]),Err(Error::BadCompressionStream)));
}

#[test]
fn corrupt_payload_never_panics() {
    let compressed = compress(b"Hello, world!\n").expect("compression failed");
    for bit in 0..(compressed.len()-PAYLOAD_OFFSET)*8 {
        let mut bent = compressed.clone();
        bent[PAYLOAD_OFFSET + bit/8] ^= 0x80>>(bit%8);
        // wrong output or a clean error, never a crash
        let _ = expand(&bent);
    }
}
