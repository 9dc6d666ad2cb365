//! Compressed character trie for the BDIC word section
//!
//! The trie is built over the byte-sorted UTF-8 words, with exactly one byte
//! on each edge.  Every node then picks one of four storage layouts under
//! strict size thresholds, and a second depth-first pass emits the chosen
//! layouts into the output buffer, back-patching child offsets as the
//! children land.
//!
//! Layouts and identifier bytes follow Chromium's `bdict.h`, which is the
//! authority on what the spell-check engine will accept.  List offsets are
//! relative to the start of the node's child region, lookup offsets are
//! relative to the start of the node itself, all little endian.
//!
//! Word sets needing more than 16 bit offsets cannot be represented; the
//! serializer rejects them rather than emit a dictionary that reads back
//! wrong.

use crate::Error;

// identifier byte encodings from Chromium's bdict.h
pub const LEAF_NODE_ADDITIONAL_VALUE: u8 = 0x40;
pub const LEAF_NODE_FOLLOWING_VALUE: u8 = 0x20;
pub const LEAF_NODE_FIRST_BYTE_AFFIX_MASK: u8 = 0x1F;
pub const LOOKUP_NODE_TYPE_VALUE: u8 = 0xC0;
pub const LOOKUP_NODE_0TH_VALUE: u8 = 0xC1;
pub const LOOKUP_NODE_32BIT_VALUE: u8 = 0xC2;
pub const LIST_NODE_TYPE_VALUE: u8 = 0xE0;
pub const LIST_NODE_16BIT_VALUE: u8 = 0xF0;
pub const LIST_NODE_COUNT_MASK: u8 = 0x0F;

// size thresholds used by the storage planner
const LIST_HEADER_SIZE: usize = 1;
const LIST_THRESHOLD: usize = 16;
const TABLE_HEADER_SIZE: usize = 2;

/// Storage layout chosen for a node by `compute_trie_storage`
#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub enum Storage {
    Leaf,
    LeafMore,
    List8,
    List16,
    Lookup16,
    Lookup32
}

/// One trie node.  `addition` is the byte on the edge from the parent (0 at
/// the root), children are ordered by their `addition` ascending, and a
/// zeroth child (`addition == 0`) marks a word ending at the parent's depth.
/// A fresh node is a bare `Leaf` until the planner says otherwise.
pub struct DicNode {
    addition: u8,
    children: Vec<DicNode>,
    leaf_addition: Vec<u8>,
    storage: Storage
}

/// Shape of a lookup node's table, shared by the planner and the serializer
struct LookupStrategy {
    has_0th_item: bool,
    first_item: u8,
    list_size: usize
}

fn compute_lookup_strategy(children: &[DicNode]) -> LookupStrategy {
    let mut strategy = LookupStrategy {
        has_0th_item: false,
        first_item: 0,
        list_size: 0
    };
    if children.is_empty() {
        return strategy;
    }
    let mut first_offset = 0;
    if children[0].addition == 0 {
        strategy.has_0th_item = true;
        first_offset += 1;
    }
    if children.len() == first_offset {
        return strategy;
    }
    strategy.first_item = children[first_offset].addition;
    let last_item = children[children.len()-1].addition;
    strategy.list_size = usize::from(last_item - strategy.first_item) + 1;
    strategy
}

impl DicNode {
    pub fn new() -> Self {
        Self {
            addition: 0,
            children: Vec::new(),
            leaf_addition: Vec::new(),
            storage: Storage::Leaf
        }
    }
    /// Build the subtree for the word range `[begin,end)` at the given depth.
    /// Words must be sorted by byte value and deduplicated.  Returns the index
    /// one past the last word consumed by this subtree.
    pub fn build(&mut self, words: &[&[u8]], begin: usize, end: usize, depth: usize) -> usize {
        let begin_str = words[begin];
        if begin_str.len() < depth {
            // word ends exactly at the parent's depth, zeroth child
            self.addition = 0;
            return begin + 1;
        }
        let match_count: usize;
        if depth == 0 {
            match_count = end - begin;
            self.addition = 0;
        } else {
            self.addition = begin_str[depth-1];
            let mut count = 0;
            while begin + count < end && words[begin+count].get(depth-1) == Some(&self.addition) {
                count += 1;
            }
            match_count = count;
        }
        if match_count == 1 {
            self.leaf_addition = begin_str[depth..].to_vec();
            return begin + 1;
        }
        let mut i = begin;
        while i < begin + match_count {
            let mut cur = DicNode::new();
            i = cur.build(words, i, begin + match_count, depth + 1);
            self.children.push(cur);
        }
        begin + match_count
    }
    /// Emit this node and its subtree.  `compute_trie_storage` must have run
    /// over the tree first.
    pub fn serialize(&self, output: &mut Vec<u8>) -> Result<(),Error> {
        match self.storage {
            Storage::Leaf | Storage::LeafMore => {
                self.serialize_leaf(output);
                Ok(())
            },
            Storage::List8 | Storage::List16 => self.serialize_list(output),
            Storage::Lookup16 => self.serialize_lookup(output),
            // 32 bit offsets would be absolute, which the appending assembler
            // cannot know at this layer
            Storage::Lookup32 => Err(Error::UnsupportedTrieSize)
        }
    }
    fn serialize_leaf(&self, output: &mut Vec<u8>) {
        // affix indices beyond the degenerate 0 are never emitted, but the
        // identifier byte keeps its slots for them
        let first_affix: u16 = 0;
        let mut id_byte = ((first_affix >> 8) as u8) & LEAF_NODE_FIRST_BYTE_AFFIX_MASK;
        if self.storage == Storage::LeafMore {
            id_byte |= LEAF_NODE_ADDITIONAL_VALUE;
        }
        output.push(id_byte);
        output.push((first_affix & 0xFF) as u8);
        if self.storage == Storage::LeafMore {
            output.extend_from_slice(&self.leaf_addition);
            output.push(0);
        }
    }
    fn serialize_list(&self, output: &mut Vec<u8>) -> Result<(),Error> {
        let is_8_bit = self.storage == Storage::List8;
        let mut id_byte = LIST_NODE_TYPE_VALUE;
        if !is_8_bit {
            id_byte |= LIST_NODE_16BIT_VALUE;
        }
        id_byte |= (self.children.len() as u8) & LIST_NODE_COUNT_MASK;
        output.push(id_byte);
        let bytes_per_entry = match is_8_bit { true => 2, false => 3 };
        let table_begin = output.len();
        output.resize(output.len() + self.children.len()*bytes_per_entry, 0);
        let children_begin = output.len();
        for (i,child) in self.children.iter().enumerate() {
            let idx = table_begin + i*bytes_per_entry;
            output[idx] = child.addition;
            let offset = output.len() - children_begin;
            if is_8_bit {
                output[idx+1] = (offset & 0xFF) as u8;
            } else {
                output[idx+1..idx+3].copy_from_slice(&(offset as u16).to_le_bytes());
            }
            child.serialize(output)?;
        }
        Ok(())
    }
    fn serialize_lookup(&self, output: &mut Vec<u8>) -> Result<(),Error> {
        // only the 16 bit flavor reaches this point
        let strategy = compute_lookup_strategy(&self.children);
        let mut id_byte = LOOKUP_NODE_TYPE_VALUE;
        if strategy.has_0th_item {
            id_byte |= LOOKUP_NODE_0TH_VALUE;
        }
        let begin_offset = output.len();
        output.push(id_byte);
        output.push(strategy.first_item);
        output.push(strategy.list_size as u8);
        let bytes_per_entry = 2;
        let zeroth_item_offset = output.len();
        if strategy.has_0th_item {
            output.resize(output.len() + bytes_per_entry, 0);
        }
        let table_begin = output.len();
        output.resize(output.len() + strategy.list_size*bytes_per_entry, 0);
        for (i,child) in self.children.iter().enumerate() {
            let offset_offset = match i == 0 && strategy.has_0th_item {
                true => zeroth_item_offset,
                false => {
                    let table_index = usize::from(child.addition - strategy.first_item);
                    table_begin + table_index*bytes_per_entry
                }
            };
            let rel = output.len() - begin_offset;
            output[offset_offset..offset_offset+bytes_per_entry]
                .copy_from_slice(&(rel as u16).to_le_bytes());
            child.serialize(output)?;
        }
        Ok(())
    }
}

/// Post-order walk assigning every node its storage layout.  Returns the
/// node's planned size in bytes.  The thresholds are evaluated in order
/// List8, List16, Lookup16, Lookup32; the first that fits wins.
pub fn compute_trie_storage(node: &mut DicNode) -> usize {
    if node.children.is_empty() {
        if node.leaf_addition.is_empty() {
            node.storage = Storage::Leaf;
            return 2;
        }
        node.storage = Storage::LeafMore;
        return 3 + node.leaf_addition.len();
    }
    let mut child_size = 0;
    for child in node.children.iter_mut() {
        child_size += compute_trie_storage(child);
    }
    if node.children.len() < LIST_THRESHOLD && child_size <= 0xFF {
        node.storage = Storage::List8;
        return LIST_HEADER_SIZE + node.children.len()*2 + child_size;
    }
    if node.children.len() < LIST_THRESHOLD && child_size <= 0xFFFF {
        node.storage = Storage::List16;
        return LIST_HEADER_SIZE + node.children.len()*3 + child_size;
    }
    let strategy = compute_lookup_strategy(&node.children);
    let zeroth_item_size = match strategy.has_0th_item { true => 2, false => 0 };
    if child_size + TABLE_HEADER_SIZE + zeroth_item_size + strategy.list_size*2 < 0xFFFF {
        node.storage = Storage::Lookup16;
        return TABLE_HEADER_SIZE + zeroth_item_size + strategy.list_size*2 + child_size;
    }
    node.storage = Storage::Lookup32;
    let zeroth_item_size = match strategy.has_0th_item { true => 4, false => 0 };
    TABLE_HEADER_SIZE + zeroth_item_size + strategy.list_size*4 + child_size
}

/// Build, plan, and emit the trie for the given words, appending to `output`.
/// Sorting and deduplication happen here, callers can pass words in any order.
pub fn dic_bytes(words: &[&str], output: &mut Vec<u8>) -> Result<(),Error> {
    let mut bytewords: Vec<&[u8]> = words.iter().map(|w| w.as_bytes()).collect();
    bytewords.sort();
    bytewords.dedup();
    let mut root = DicNode::new();
    if !bytewords.is_empty() {
        root.build(&bytewords, 0, bytewords.len(), 0);
    }
    compute_trie_storage(&mut root);
    root.serialize(output)
}

// *************** TESTS *****************

#[test]
fn empty_word_set() {
    let mut output = Vec::new();
    dic_bytes(&[],&mut output).expect("trie failed");
    assert_eq!(output,hex::decode("0000").unwrap());
}

#[test]
fn single_word() {
    let mut output = Vec::new();
    dic_bytes(&["ab"],&mut output).expect("trie failed");
    assert_eq!(output,hex::decode("4000616200").unwrap());
}

#[test]
fn shared_prefix_list() {
    // root holds one List8 for `a`, which holds back to back leaves for
    // `b` and `c` at child region offsets 0 and 2
    let mut output = Vec::new();
    dic_bytes(&["ab","ac"],&mut output).expect("trie failed");
    let trie_str = "E1 61 00 E2 62 00 63 02 00 00 00 00";
    assert_eq!(output,hex::decode(trie_str.replace(" ","")).unwrap());
}

#[test]
fn zeroth_item_in_list() {
    // `a` terminates under the same node that branches to `b`
    let mut output = Vec::new();
    dic_bytes(&["a","ab"],&mut output).expect("trie failed");
    let trie_str = "E1 61 00 E2 00 00 62 02 00 00 00 00";
    assert_eq!(output,hex::decode(trie_str.replace(" ","")).unwrap());
}

#[test]
fn sixteen_bit_list() {
    let w0 = ["a","x".repeat(120).as_str()].concat();
    let w1 = ["b","x".repeat(120).as_str()].concat();
    let w2 = ["c","x".repeat(120).as_str()].concat();
    let mut root = DicNode::new();
    let bytewords: Vec<&[u8]> = vec![w0.as_bytes(),w1.as_bytes(),w2.as_bytes()];
    root.build(&bytewords,0,3,0);
    assert_eq!(compute_trie_storage(&mut root),1 + 3*3 + 3*123);
    assert_eq!(root.storage,Storage::List16);
    let mut output = Vec::new();
    root.serialize(&mut output).expect("trie failed");
    assert_eq!(output.len(),1 + 3*3 + 3*123);
    assert_eq!(output[0],0xF3);
    // table entries carry the edge byte and a 16 bit child region offset
    assert_eq!(output[1..4],[0x61,0,0]);
    assert_eq!(output[4],0x62);
    assert_eq!(output[5..7],123u16.to_le_bytes());
    assert_eq!(output[7],0x63);
    assert_eq!(output[8..10],246u16.to_le_bytes());
    // first child is a LeafMore spelling 120 x's
    assert_eq!(output[10..12],[0x40,0]);
    assert_eq!(output[12..132],*"x".repeat(120).as_bytes());
    assert_eq!(output[132],0);
}

#[test]
fn lookup_table() {
    // `a` plus `aa`..`aq` puts 18 children under the `a` node, too many
    // for a list
    let mut words: Vec<String> = vec!["a".to_string()];
    for c in b'a'..=b'q' {
        words.push(format!("a{}",c as char));
    }
    let word_refs: Vec<&str> = words.iter().map(|w| w.as_str()).collect();
    let mut output = Vec::new();
    dic_bytes(&word_refs,&mut output).expect("trie failed");
    // root is a List8 holding the lookup node at child region offset 0
    assert_eq!(output[0..3],[0xE1,0x61,0]);
    // lookup header: id with zeroth flag, first item `a`, 17 slots
    assert_eq!(output[3..6],[0xC1,0x61,0x11]);
    // zeroth item offset and table offsets are relative to the node start
    let children_begin = 3 + 3 + 2 + 34;
    assert_eq!(output[6..8],((children_begin - 3) as u16).to_le_bytes());
    assert_eq!(output[8..10],((children_begin + 2 - 3) as u16).to_le_bytes());
    assert_eq!(output[40..42],((children_begin + 34 - 3) as u16).to_le_bytes());
    // 18 bare leaves back to back
    assert_eq!(output[children_begin..],[0;36]);
    assert_eq!(output.len(),children_begin + 36);
}

#[test]
fn planner_thresholds() {
    // 253 + 2 child bytes stays in an 8 bit list
    let big = ["a","x".repeat(250).as_str()].concat();
    let mut root = DicNode::new();
    let bytewords: Vec<&[u8]> = vec![big.as_bytes(),b"b"];
    root.build(&bytewords,0,2,0);
    assert_eq!(compute_trie_storage(&mut root),1 + 2*2 + 255);
    assert_eq!(root.storage,Storage::List8);
    // one more tail byte forces the 16 bit list
    let big = ["a","x".repeat(251).as_str()].concat();
    let mut root = DicNode::new();
    let bytewords: Vec<&[u8]> = vec![big.as_bytes(),b"b"];
    root.build(&bytewords,0,2,0);
    assert_eq!(compute_trie_storage(&mut root),1 + 2*3 + 256);
    assert_eq!(root.storage,Storage::List16);
}

#[test]
fn oversized_word_set_rejected() {
    // enough long words under one prefix to overflow 16 bit offsets
    let mut words: Vec<String> = Vec::new();
    for i in 0..600 {
        words.push(format!("q{:03}{}",i,"x".repeat(110)));
    }
    let word_refs: Vec<&str> = words.iter().map(|w| w.as_str()).collect();
    let mut output = Vec::new();
    assert_eq!(dic_bytes(&word_refs,&mut output),Err(Error::UnsupportedTrieSize));
}

#[test]
fn duplicates_collapse() {
    let mut plain = Vec::new();
    dic_bytes(&["ab","ac"],&mut plain).expect("trie failed");
    let mut doubled = Vec::new();
    dic_bytes(&["ac","ab","ac","ab"],&mut doubled).expect("trie failed");
    assert_eq!(plain,doubled);
}
