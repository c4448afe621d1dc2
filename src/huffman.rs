//! Static Huffman coding over whole buffers.
//!
//! The tree is an arena of nodes addressed by index, built bottom-up from a
//! frequency map with a deterministic merge order: the working queue is
//! stable-sorted by weight each round, so ties resolve first to freshly
//! merged branches and then to ascending symbol order.  Encoder and decoder
//! run the same build on the same map and therefore agree on every code
//! without the codes ever being serialized.
//!
//! Code words are assigned by a systematic leaf-walk: descend left to a
//! leaf, then repeatedly flip the deepest left turn to a right turn and
//! descend left again.  That visits the leaves left to right and hands each
//! its root-to-leaf path as a prefix-free code.
//!
//! The tree is generic over the symbol type; the container below fixes
//! symbols at one byte and weights at eight.

use bit_vec::BitVec;
use num_traits::PrimInt;
use std::collections::BTreeMap;
use crate::tools::bitstream::{BitReader,BitWriter};
use crate::tools::serialize::{get_u16,get_u64,put_u16,put_u64};
use crate::Error;

/// u16 payload offset plus u64 uncompressed length
const PAIRS_OFFSET: usize = 10;
/// symbol byte plus u64 frequency
const PAIR_LEN: usize = 9;

enum Node<S> {
    Leaf { sym: S, weight: u64 },
    Branch { left: usize, right: usize, weight: u64 }
}

impl<S> Node<S> {
    fn weight(&self) -> u64 {
        match self {
            Node::Leaf { weight, .. } => *weight,
            Node::Branch { weight, .. } => *weight
        }
    }
}

pub struct HuffmanTree<S> {
    nodes: Vec<Node<S>>,
    root: usize
}

impl<S: PrimInt> HuffmanTree<S> {
    /// Build the tree for a frequency map, or nothing for an empty map.
    /// A lone symbol still gets a branch above it so its code is one bit.
    pub fn build(freqs: &BTreeMap<S,u64>) -> Option<Self> {
        if freqs.is_empty() {
            return None;
        }
        let mut nodes: Vec<Node<S>> = Vec::new();
        let mut queue: Vec<usize> = Vec::new();
        for (&sym,&weight) in freqs {
            nodes.push(Node::Leaf { sym, weight });
            queue.push(nodes.len()-1);
        }
        if queue.len() == 1 {
            let (sym,weight) = match &nodes[0] {
                Node::Leaf { sym, weight } => (*sym,*weight),
                _ => unreachable!()
            };
            nodes.push(Node::Leaf { sym, weight });
            queue.push(1);
        }
        while queue.len() > 1 {
            queue.sort_by_key(|&n| nodes[n].weight());
            let left = queue.remove(0);
            let right = queue.remove(0);
            let weight = nodes[left].weight() + nodes[right].weight();
            nodes.push(Node::Branch { left, right, weight });
            queue.insert(0,nodes.len()-1);
        }
        Some(Self { nodes, root: queue[0] })
    }
    /// Follow a bit path from the root, 0 = left.  None if the path runs
    /// through a leaf.
    fn node_at(&self,path: &BitVec) -> Option<usize> {
        let mut curs = self.root;
        for branch in path.iter() {
            match self.nodes[curs] {
                Node::Branch { left, right, .. } => curs = if branch { right } else { left },
                Node::Leaf { .. } => return None
            }
        }
        Some(curs)
    }
    fn descend_left(&self,path: &mut BitVec) {
        while let Some(curs) = self.node_at(path) {
            match self.nodes[curs] {
                Node::Branch { .. } => path.push(false),
                Node::Leaf { .. } => break
            }
        }
    }
    /// Assign a code to every leaf by the left-first walk.
    pub fn codes(&self) -> BTreeMap<S,BitVec> {
        let mut table = BTreeMap::new();
        let mut path = BitVec::new();
        self.descend_left(&mut path);
        loop {
            if let Some(curs) = self.node_at(&path) {
                if let Node::Leaf { sym, .. } = self.nodes[curs] {
                    table.insert(sym,path.clone());
                }
            }
            // back up to the deepest left turn and take the right branch
            let mut turn = None;
            for i in (0..path.len()).rev() {
                if path.get(i) == Some(false) {
                    turn = Some(i);
                    break;
                }
            }
            match turn {
                Some(i) => {
                    path.truncate(i+1);
                    path.set(i,true);
                    self.descend_left(&mut path);
                },
                None => break
            }
        }
        table
    }
}

fn frequency_map(buf: &[u8]) -> BTreeMap<u8,u64> {
    let mut freqs = BTreeMap::new();
    for &byte in buf {
        *freqs.entry(byte).or_insert(0u64) += 1;
    }
    freqs
}

/// Main compression function.
pub fn compress(ibuf: &[u8]) -> Vec<u8> {
    let freqs = frequency_map(ibuf);
    log::debug!("{} distinct symbols over {} bytes",freqs.len(),ibuf.len());
    let mut pairs: Vec<(u8,u64)> = freqs.iter().map(|(&sym,&weight)| (sym,weight)).collect();
    pairs.sort_by_key(|&(sym,weight)| (weight,sym));
    let mindex = PAIRS_OFFSET + PAIR_LEN*pairs.len();
    let mut out = BitWriter::new(mindex);
    {
        let buf = out.as_mut_slice();
        put_u16(buf,0,mindex as u16);
        put_u64(buf,2,ibuf.len() as u64);
        let mut index = PAIRS_OFFSET;
        for &(sym,weight) in &pairs {
            buf[index] = sym;
            put_u64(buf,index+1,weight);
            index += PAIR_LEN;
        }
    }
    if let Some(tree) = HuffmanTree::build(&freqs) {
        let table = tree.codes();
        for &sym in ibuf {
            for bit in table[&sym].iter() {
                out.put_bit(bit as u8);
            }
        }
    }
    out.into_inner()
}

/// Main decompression function.
pub fn expand(ibuf: &[u8]) -> Result<Vec<u8>,Error> {
    if ibuf.len() < PAIRS_OFFSET {
        log::error!("container shorter than its fixed header");
        return Err(Error::BadCompressionStream);
    }
    let mindex = get_u16(ibuf,0) as usize;
    let size = get_u64(ibuf,2);
    if mindex < PAIRS_OFFSET || mindex > ibuf.len() || (mindex-PAIRS_OFFSET)%PAIR_LEN != 0 {
        log::error!("symbol table does not fit the container");
        return Err(Error::BadCompressionStream);
    }
    let mut freqs = BTreeMap::new();
    let mut index = PAIRS_OFFSET;
    while index < mindex {
        freqs.insert(ibuf[index],get_u64(ibuf,index+1));
        index += PAIR_LEN;
    }
    let mut ans: Vec<u8> = Vec::new();
    if size == 0 {
        return Ok(ans);
    }
    let tree = match HuffmanTree::build(&freqs) {
        Some(tree) => tree,
        None => {
            log::error!("no symbols in table but nonzero length");
            return Err(Error::BadCompressionStream);
        }
    };
    let mut reader = BitReader::new(ibuf,mindex);
    let mut path = BitVec::new();
    while (ans.len() as u64) < size {
        path.push(reader.get_bit() != 0);
        match tree.node_at(&path) {
            Some(curs) => {
                if let Node::Leaf { sym, .. } = tree.nodes[curs] {
                    ans.push(sym);
                    path.truncate(0);
                }
            },
            None => {
                log::error!("bit path ran off the tree");
                return Err(Error::BadCompressionStream);
            }
        }
    }
    Ok(ans)
}

// *************** TESTS *****************

#[test]
fn codes_follow_merge_order() {
    // weights a:1 b:1 c:2 merge a+b first, so c sits one level up
    let mut freqs: BTreeMap<u8,u64> = BTreeMap::new();
    freqs.insert(b'a',1);
    freqs.insert(b'b',1);
    freqs.insert(b'c',2);
    let tree = HuffmanTree::build(&freqs).expect("build failed");
    let table = tree.codes();
    let render = |sym: u8| -> String {
        table[&sym].iter().map(|b| if b {'1'} else {'0'}).collect()
    };
    assert_eq!(render(b'a'),"00");
    assert_eq!(render(b'b'),"01");
    assert_eq!(render(b'c'),"1");
}

#[test]
fn codes_are_prefix_free() {
    let data = b"the quick brown fox jumps over the lazy dog";
    let tree = HuffmanTree::build(&frequency_map(data)).expect("build failed");
    let table = tree.codes();
    assert_eq!(table.len(),frequency_map(data).len());
    let words: Vec<BitVec> = table.values().cloned().collect();
    for (i,a) in words.iter().enumerate() {
        for (j,b) in words.iter().enumerate() {
            if i != j {
                let head: BitVec = b.iter().take(a.len()).collect();
                assert_ne!(*a,head,"one code prefixes another");
            }
        }
    }
}

#[test]
fn single_symbol_container_is_exact() {
    // one distinct symbol still gets a one-bit code through the extra branch
    let compressed = compress(b"AAAA");
    let expected = hex::decode("13000400000000000000410400000000000000f0").unwrap();
    assert_eq!(compressed,expected);
    assert_eq!(expand(&compressed).expect("expansion failed"),b"AAAA");
}

#[test]
fn pairs_are_sorted_by_frequency_then_symbol() {
    let compressed = compress(b"ccbba");
    // a:1 b:2 c:2 -> a, then b before c on the symbol tie break
    assert_eq!(get_u16(&compressed,0),10+9*3);
    assert_eq!(compressed[10],b'a');
    assert_eq!(get_u64(&compressed,11),1);
    assert_eq!(compressed[19],b'b');
    assert_eq!(get_u64(&compressed,20),2);
    assert_eq!(compressed[28],b'c');
    assert_eq!(get_u64(&compressed,29),2);
}

#[test]
fn invertibility() {
    let test_data = "Hello, world!\n".as_bytes();
    let compressed = compress(test_data);
    let mindex = get_u16(&compressed,0) as usize;
    assert!(mindex <= PAIRS_OFFSET + PAIR_LEN*14);
    let expanded = expand(&compressed).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);
}

#[test]
fn invertibility_tiny_inputs() {
    for data in [vec![],vec![0x00u8],vec![0xffu8],vec![0x12,0x34]] {
        let compressed = compress(&data);
        let expanded = expand(&compressed).expect("expansion failed");
        assert_eq!(data,expanded);
    }
}

#[test]
fn invertibility_all_byte_values() {
    let mut data: Vec<u8> = (0u8..=255).collect();
    data.extend(std::iter::repeat(0x20u8).take(5000));
    let compressed = compress(&data);
    let expanded = expand(&compressed).expect("expansion failed");
    assert_eq!(data,expanded);
}

#[test]
fn determinism() {
    let data = b"abracadabra abracadabra";
    assert_eq!(compress(data),compress(data));
}

#[test]
fn truncated_container_is_rejected() {
    assert!(matches!(expand(&[0u8;4]),Err(Error::BadCompressionStream)));
    // mindex pointing past the end
    let mut bad = compress(b"abc");
    bad[0] = 0xff;
    bad[1] = 0xff;
    assert!(matches!(expand(&bad),Err(Error::BadCompressionStream)));
}
