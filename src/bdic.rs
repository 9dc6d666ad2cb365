//! BDIC file assembly
//!
//! A BDIC file is a fixed 32 byte header followed by the affix block and the
//! trie block:
//!
//! ```text
//! offset size
//! 0      4    magic "BDic"
//! 4      4    version, 2
//! 8      4    affix block offset, always 32
//! 12     4    trie block offset
//! 16     16   MD5 over everything from offset 32
//! 32     ...  affix block
//! ...    ...  trie block
//! ```
//!
//! All integers are little endian.  The header is reserved up front and its
//! trie offset and digest are patched in once the payload is complete.

use md5::{Md5,Digest};
use crate::aff;
use crate::dic;
use crate::Error;

pub const MAGIC: [u8;4] = *b"BDic";
pub const VERSION: u32 = 2;
pub const HEADER_SIZE: usize = 32;

/// the Qt dictionary converter fails on anything longer
const MAX_WORD_BYTES: usize = 127;

fn validate_words(words: &[&str], have_aff: bool) -> Result<(),Error> {
    for word in words {
        if word.is_empty() || word.len() > MAX_WORD_BYTES {
            return Err(Error::InvalidWord(word.to_string()));
        }
        // without caller rules the slash would read as an affix flag marker
        if !have_aff && word.contains('/') {
            return Err(Error::InvalidWord(word.to_string()));
        }
    }
    Ok(())
}

/// Create the contents of a BDIC file from the given words and optional
/// Hunspell aff text.  Words may arrive in any order and with duplicates;
/// each must be non-empty and at most 127 bytes of UTF-8.  When `aff_text`
/// is `None` a default rule set is generated from the words themselves.
pub fn create_bdic(words: &[&str], aff_text: Option<&str>) -> Result<Vec<u8>,Error> {
    validate_words(words,aff_text.is_some())?;
    let mut output: Vec<u8> = Vec::new();
    output.extend_from_slice(&MAGIC);
    output.extend_from_slice(&VERSION.to_le_bytes());
    output.extend_from_slice(&(HEADER_SIZE as u32).to_le_bytes());
    output.extend_from_slice(&[0;4]);
    output.extend_from_slice(&[0;16]);
    let mut aff = aff::Aff::new();
    match aff_text {
        Some(text) => aff.parse(text)?,
        None => {
            // scan the words in sorted order so the generated rules do not
            // depend on how the caller happened to order the list
            let mut sorted: Vec<&str> = words.to_vec();
            sorted.sort();
            sorted.dedup();
            aff.parse(&aff::default_aff_string(&sorted))?
        }
    };
    aff::serialize_aff(&aff,&mut output);
    let dic_start = output.len() as u32;
    dic::dic_bytes(words,&mut output)?;
    output[12..16].copy_from_slice(&dic_start.to_le_bytes());
    let digest = Md5::digest(&output[HEADER_SIZE..]);
    output[16..HEADER_SIZE].copy_from_slice(digest.as_slice());
    Ok(output)
}

/// Extract words from Hunspell `.dic` text: one word per line, the first
/// line skipped when it is the customary word count, blank lines dropped.
pub fn words_from_dic(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.lines().map(str::trim).collect();
    if let Some(first) = lines.first() {
        if first.parse::<usize>().is_ok() {
            lines.remove(0);
        }
    }
    lines.into_iter().filter(|line| !line.is_empty()).collect()
}

// *************** TESTS *****************

#[test]
fn header_integrity() {
    let file = create_bdic(&["ab","ac","banana"],None).expect("build failed");
    assert_eq!(file[0..4],*b"BDic");
    assert_eq!(file[4..8],2u32.to_le_bytes());
    assert_eq!(file[8..12],32u32.to_le_bytes());
    let dic_start = u32::from_le_bytes([file[12],file[13],file[14],file[15]]) as usize;
    let mut trie = Vec::new();
    dic::dic_bytes(&["ab","ac","banana"],&mut trie).expect("trie failed");
    assert_eq!(file[dic_start..],*trie);
    assert_eq!(file[16..32],*Md5::digest(&file[32..]).as_slice());
}

#[test]
fn single_word_file() {
    let file = create_bdic(&["ab"],None).expect("build failed");
    let dic_start = u32::from_le_bytes([file[12],file[13],file[14],file[15]]) as usize;
    assert_eq!(file[dic_start..],*hex::decode("4000616200").unwrap());
}

#[test]
fn deterministic_and_order_free() {
    let sorted = create_bdic(&["alpha","beta","gamma"],None).expect("build failed");
    let same = create_bdic(&["alpha","beta","gamma"],None).expect("build failed");
    assert_eq!(sorted,same);
    // the builder sorts internally, and duplicates do not change the bytes
    let shuffled = create_bdic(&["gamma","alpha","beta","alpha"],None).expect("build failed");
    assert_eq!(sorted,shuffled);
    // characters outside the base TRY alphabet extend it in the same order
    // no matter how the words arrive
    let extended = create_bdic(&["aä","aö"],None).expect("build failed");
    let reordered = create_bdic(&["aö","aä"],None).expect("build failed");
    assert_eq!(extended,reordered);
}

#[test]
fn word_guardrails() {
    assert_eq!(create_bdic(&[""],None),Err(Error::InvalidWord("".to_string())));
    let long = "x".repeat(128);
    assert_eq!(create_bdic(&[long.as_str()],None),Err(Error::InvalidWord(long.clone())));
    assert_eq!(create_bdic(&["miss/ES"],None),Err(Error::InvalidWord("miss/ES".to_string())));
    // with caller rules the slash is legitimate flag syntax
    assert!(create_bdic(&["miss/ES"],Some("SET UTF-8\nTRY abc")).is_ok());
}

#[test]
fn words_from_dic_text() {
    assert_eq!(words_from_dic("3\nab\nac\n\nbanana\n"),vec!["ab","ac","banana"]);
    // no count line, nothing skipped
    assert_eq!(words_from_dic("hello\n  world  "),vec!["hello","world"]);
}
