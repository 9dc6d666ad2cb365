//! # BDIC Writer Library
//!
//! Build compiled spell-check dictionaries in the BDIC format consumed by
//! Chromium and QtWebEngine.
//! * `aff` parses a restricted Hunspell `.aff` grammar and serializes the affix block
//! * `dic` builds a compressed character trie over the words and serializes it
//! * `bdic` assembles the final file: fixed header, affix block, trie block, MD5 digest
//!
//! A build is a single synchronous call; all structures live and die inside it.
//!
//! ## Buffer Example
//!
//! ```rs
//! use bdicwriter::bdic;
//! let file = bdic::create_bdic(&["colour","honour"],None).expect("build failed");
//! std::fs::write("en_custom.bdic",file).expect("write failed");
//! ```
//!
//! ## Aff Example
//!
//! ```rs
//! use bdicwriter::bdic;
//! let rules = std::fs::read_to_string("en_custom.aff").expect("open failed");
//! let file = bdic::create_bdic(&["colour","honour"],Some(&rules)).expect("build failed");
//! ```

pub mod aff;
pub mod dic;
pub mod bdic;

/// Dictionary writer errors
#[derive(thiserror::Error,Debug,PartialEq)]
pub enum Error {
    #[error("word set needs 32 bit offsets, split it into smaller files")]
    UnsupportedTrieSize,
    #[error("aff directive `{0}` is not supported")]
    UnsupportedAffDirective(String),
    #[error("malformed affix rule `{0}`")]
    MalformedAffRule(String),
    #[error("invalid word `{0}`")]
    InvalidWord(String)
}
