//! Affix block for the BDIC prelude
//!
//! This parses a restricted subset of the Hunspell `.aff` grammar, one
//! directive per line, and serializes the result as a 16 byte offset header
//! followed by null terminated string tables.  Offsets in the header are
//! measured from the start of the assembled file.
//!
//! Most directives pass through verbatim.  `SFX`/`PFX` rules are reformatted
//! so the engine can read their flags without tokenizing, allocating affix
//! group indices on demand when a rule carries `/flags` and no `AF` table
//! was declared.  `IGNORE` and `COMPLEXPREFIXES` change how the words
//! themselves must be interpreted and are refused.

use crate::Error;

const AFF_HEADER_SIZE: usize = 16;

/// Parsed affix rule set.  `parse` fills it, `serialize_aff` writes it out.
pub struct Aff {
    intro_comment: String,
    encoding: String,
    affix_groups: Vec<String>,
    has_indexed_affixes: bool,
    affix_rules: Vec<String>,
    replacements: Vec<(String,String)>,
    other_commands: Vec<String>
}

/// cut the line at the first `#` and trim surrounding whitespace
fn strip_comments(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => line[..idx].trim(),
        None => line.trim()
    }
}

fn collapse_duplicate_spaces(line: &str) -> String {
    let mut ans = String::with_capacity(line.len());
    let mut prev_space = false;
    for c in line.chars() {
        if c == ' ' {
            if !prev_space {
                ans.push(c);
            }
            prev_space = true;
        } else {
            ans.push(c);
            prev_space = false;
        }
    }
    ans
}

impl Aff {
    pub fn new() -> Self {
        Self {
            intro_comment: String::new(),
            encoding: String::new(),
            affix_groups: Vec::new(),
            has_indexed_affixes: false,
            affix_rules: Vec::new(),
            replacements: Vec::new(),
            other_commands: Vec::new()
        }
    }
    /// Character encoding named by the `SET` directive, if any
    pub fn encoding(&self) -> &str {
        &self.encoding
    }
    /// Read the whole aff text.  Leading `#` lines are kept as an intro
    /// comment; the first `AF` and `REP` lines are count headers and carry
    /// no rule of their own.
    pub fn parse(&mut self, aff_str: &str) -> Result<(),Error> {
        let mut got_command = false;
        let mut got_first_af = false;
        let mut got_first_rep = false;
        self.has_indexed_affixes = false;
        for raw_line in aff_str.split('\n') {
            if !got_command && raw_line.starts_with('#') {
                self.intro_comment.push_str(raw_line);
                self.intro_comment.push('\n');
                continue;
            }
            let line = strip_comments(raw_line);
            if line.is_empty() {
                continue;
            }
            got_command = true;
            if let Some(enc) = line.strip_prefix("SET ") {
                self.encoding = enc.trim().to_string();
            } else if let Some(rule) = line.strip_prefix("AF ") {
                self.has_indexed_affixes = true;
                if got_first_af {
                    self.add_affix_group(rule);
                } else {
                    got_first_af = true;
                }
            } else if line.starts_with("SFX ") || line.starts_with("PFX ") {
                self.add_affix(line)?;
            } else if let Some(rule) = line.strip_prefix("REP ") {
                if got_first_rep {
                    self.add_replacement(rule)?;
                } else {
                    got_first_rep = true;
                }
            } else if line.starts_with("TRY ") || line.starts_with("MAP ") {
                self.other_commands.push(line.to_string());
            } else if line.starts_with("IGNORE ") {
                return Err(Error::UnsupportedAffDirective("IGNORE".to_string()));
            } else if line.starts_with("COMPLEXPREFIXES") {
                return Err(Error::UnsupportedAffDirective("COMPLEXPREFIXES".to_string()));
            } else {
                self.other_commands.push(line.to_string());
            }
        }
        Ok(())
    }
    fn add_affix_group(&mut self, rule: &str) -> usize {
        self.affix_groups.push(rule.trim().to_string());
        self.affix_groups.len()
    }
    /// 1-based index of the group, allocating a new one on first sight
    fn get_af_index_for_af_string(&mut self, af_string: &str) -> usize {
        match self.affix_groups.iter().position(|g| g == af_string) {
            Some(idx) => idx + 1,
            None => self.add_affix_group(af_string)
        }
    }
    /// Take in an `SFX`/`PFX` line.  Everything from the third space (or the
    /// third token, when that token is not a Y/N cross-product marker) is the
    /// rule part, which gets reformatted in place.
    fn add_affix(&mut self, rule: &str) -> Result<(),Error> {
        let rule = collapse_duplicate_spaces(rule.trim());
        let bytes = rule.as_bytes();
        let mut found_spaces = 0;
        let mut token_len = 0;
        let mut split_at: Option<usize> = None;
        for i in 0..bytes.len() {
            if bytes[i] == b' ' {
                found_spaces += 1;
                if found_spaces == 3 {
                    split_at = match bytes[i-token_len] {
                        b'Y' | b'N' => Some(i),
                        _ => Some(i - token_len)
                    };
                    break;
                }
                token_len = 0;
            } else {
                token_len += 1;
            }
        }
        let final_rule = match split_at {
            Some(part_start) => {
                let mut part = rule[part_start..].to_string();
                if part.contains('-') {
                    // character range rules list their terms out of order for
                    // the engine, reorder and null terminate them
                    let tokens: Vec<String> = part.split(' ').map(|t| t.trim().to_string()).collect();
                    if tokens.len() >= 5 {
                        part = format!("{}\0 {}\0/{}\0 {}\0",tokens[0],tokens[1],tokens[4],tokens[2]);
                    }
                }
                if let Some(slash_index) = part.find('/') {
                    if !self.has_indexed_affixes {
                        // inline flags become a reference into the affix
                        // group table, allocated on demand
                        let before_flags = part[..slash_index+1].to_string();
                        let mut after_slash: Vec<String> = part[slash_index+1..]
                            .split(' ')
                            .map(|t| t.trim().to_string())
                            .collect();
                        if after_slash.is_empty() {
                            return Err(Error::MalformedAffRule(part));
                        }
                        if after_slash.len() == 1 {
                            log::warn!("found 1 term after slash in affix rule '{}' but expected at least 2, adding '.'",part);
                            after_slash.push(".".to_string());
                        }
                        let af_index = self.get_af_index_for_af_string(&after_slash[0]);
                        part = format!("{}\0{} {}\0",before_flags,af_index,after_slash[1]);
                    }
                }
                format!("{}{}",&rule[..part_start],part)
            },
            None => rule
        };
        self.affix_rules.push(final_rule);
        Ok(())
    }
    fn add_replacement(&mut self, rule: &str) -> Result<(),Error> {
        let rule = collapse_duplicate_spaces(rule.trim());
        match rule.split_once(' ') {
            Some((from,to)) => {
                // underscores stand in for spaces in replacement pairs
                self.replacements.push((from.replace('_'," "),to.replace('_'," ")));
                Ok(())
            },
            None => Err(Error::MalformedAffRule(rule))
        }
    }
}

fn serialize_string_list(strings: &[String], output: &mut Vec<u8>) {
    for string in strings {
        // an empty entry becomes a single space so it cannot be mistaken
        // for the list terminator
        if string.is_empty() {
            output.push(b' ');
        } else {
            output.extend_from_slice(string.as_bytes());
        }
        output.push(0);
    }
    output.push(0);
}

fn serialize_replacements(replacements: &[(String,String)], output: &mut Vec<u8>) {
    for (from,to) in replacements {
        output.extend_from_slice(from.as_bytes());
        output.push(0);
        output.extend_from_slice(to.as_bytes());
        output.push(0);
    }
    output.push(0);
}

/// Append the affix block: offset header, intro comment, then the four
/// string tables.  Header offsets are absolute, so `output` must already
/// hold everything that precedes the block in the file.
pub fn serialize_aff(aff: &Aff, output: &mut Vec<u8>) {
    let header_offset = output.len();
    output.resize(output.len() + AFF_HEADER_SIZE, 0);
    output.push(b'\n');
    output.extend_from_slice(aff.intro_comment.as_bytes());
    output.push(b'\n');
    let affix_group_offset = output.len();
    output.extend_from_slice(format!("AF {}",aff.affix_groups.len()).as_bytes());
    output.push(0);
    serialize_string_list(&aff.affix_groups,output);
    let affix_rule_offset = output.len();
    serialize_string_list(&aff.affix_rules,output);
    let rep_offset = output.len();
    serialize_replacements(&aff.replacements,output);
    let other_offset = output.len();
    serialize_string_list(&aff.other_commands,output);
    output[header_offset..header_offset+4].copy_from_slice(&(affix_group_offset as u32).to_le_bytes());
    output[header_offset+4..header_offset+8].copy_from_slice(&(affix_rule_offset as u32).to_le_bytes());
    output[header_offset+8..header_offset+12].copy_from_slice(&(rep_offset as u32).to_le_bytes());
    output[header_offset+12..header_offset+16].copy_from_slice(&(other_offset as u32).to_le_bytes());
}

/// Default aff text for callers who supply none: UTF-8, a `TRY` alphabet of
/// English letters and apostrophe extended with any further characters the
/// words use in first-encounter order, and the right single quote mapped to
/// apostrophe.  Pass the words in a fixed order when the output must not
/// depend on how they arrived.
pub fn default_aff_string(words: &[&str]) -> String {
    let mut try_chars = String::from("esianrtolcdugmphbyfvkwzESIANRTOLCDUGMPHBYFVKWZ'");
    for word in words {
        for c in word.chars() {
            if !try_chars.contains(c) {
                try_chars.push(c);
            }
        }
    }
    format!("SET UTF-8\nTRY {}\nICONV 1\nICONV ’ '",try_chars)
}

// *************** TESTS *****************

#[test]
fn default_aff_block() {
    let mut aff = Aff::new();
    aff.parse(&default_aff_string(&[])).expect("parse failed");
    assert_eq!(aff.encoding(),"UTF-8");
    // the block lands at file offset 32, right after the BDIC header
    let mut output = vec![0;32];
    serialize_aff(&aff,&mut output);
    let aff_str = "32 00 00 00 38 00 00 00 39 00 00 00 3A 00 00 00 0A 0A 41 46 20 30 00 00 00 00 54 52 59 20 65 73 69 61 6E 72 74 6F 6C 63 64 75 67 6D 70 68 62 79 66 76 6B 77 7A 45 53 49 41 4E 52 54 4F 4C 43 44 55 47 4D 50 48 42 59 46 56 4B 57 5A 27 00 49 43 4F 4E 56 20 31 00 49 43 4F 4E 56 20 E2 80 99 20 27 00 00";
    assert_eq!(output[32..],*hex::decode(aff_str.replace(" ","")).unwrap());
}

#[test]
fn try_alphabet_extension() {
    let aff_str = default_aff_string(&["häuser","ähre"]);
    assert!(aff_str.contains("TRY esianrtolcdugmphbyfvkwzESIANRTOLCDUGMPHBYFVKWZ'ä\n"));
}

#[test]
fn slash_rule_indexes_affix_group() {
    let mut aff = Aff::new();
    aff.parse("SFX A Y 1\nSFX A 0 s/X").expect("parse failed");
    assert_eq!(aff.affix_groups,vec!["X"]);
    assert!(!aff.has_indexed_affixes);
    assert_eq!(aff.affix_rules[0],"SFX A Y 1");
    // one term after the slash, so `.` is appended
    assert_eq!(aff.affix_rules[1],"SFX A 0 s/\u{0}1 .\u{0}");
}

#[test]
fn indexed_affixes_left_alone() {
    let mut aff = Aff::new();
    aff.parse("AF 1\nAF X\nSFX A 0 s/X y").expect("parse failed");
    assert!(aff.has_indexed_affixes);
    assert_eq!(aff.affix_groups,vec!["X"]);
    assert_eq!(aff.affix_rules,vec!["SFX A 0 s/X y"]);
}

#[test]
fn range_rule_reordered() {
    let mut aff = Aff::new();
    aff.parse("AF 1\nAF X\nSFX N 0 foo - bar baz").expect("parse failed");
    assert_eq!(aff.affix_rules,vec!["SFX N 0\u{0} foo\u{0}/baz\u{0} -\u{0}"]);
}

#[test]
fn replacements_and_counts() {
    let mut aff = Aff::new();
    aff.parse("REP 2\nREP a_b c\nREP x y").expect("parse failed");
    assert_eq!(aff.replacements,vec![
        ("a b".to_string(),"c".to_string()),
        ("x".to_string(),"y".to_string())
    ]);
}

#[test]
fn intro_comment_and_other_commands() {
    let mut aff = Aff::new();
    aff.parse("# hand made\n# rules\nSET UTF-8\nTRY abc\nWORDCHARS 0123456789").expect("parse failed");
    assert_eq!(aff.intro_comment,"# hand made\n# rules\n");
    assert_eq!(aff.other_commands,vec!["TRY abc","WORDCHARS 0123456789"]);
}

#[test]
fn unsupported_directives() {
    let mut aff = Aff::new();
    assert_eq!(aff.parse("SET UTF-8\nIGNORE a"),
        Err(Error::UnsupportedAffDirective("IGNORE".to_string())));
    let mut aff = Aff::new();
    assert_eq!(aff.parse("COMPLEXPREFIXES"),
        Err(Error::UnsupportedAffDirective("COMPLEXPREFIXES".to_string())));
}
