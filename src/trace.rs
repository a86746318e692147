//! Trace-line tokenizing. Lines are whitespace-delimited; 5 tokens is a
//! non-branch, 7 tokens is a branch. Malformed lines are skipped with a
//! warning, matching the source driver's silent-skip behavior (just logged
//! here instead of dropped on the floor).

use std::io::BufRead;

use crate::instruction::Instruction;
use crate::types::{FuClass, RegIndex, Tag};

pub struct TraceReader<R> {
    reader: R,
    next_tag: u32,
    exhausted: bool,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        TraceReader {
            reader,
            next_tag: 0,
            exhausted: false,
        }
    }

    /// True once the underlying reader has hit EOF or an I/O error.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Reads up to `max` valid instructions, skipping malformed lines as it
    /// goes. Returns fewer than `max` (possibly zero) at end of input.
    pub fn next_batch(&mut self, max: usize) -> Vec<Instruction> {
        let mut batch = Vec::with_capacity(max);
        if self.exhausted {
            return batch;
        }
        while batch.len() < max {
            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    self.exhausted = true;
                    break;
                }
                Ok(_) => {
                    if let Some(instr) = self.parse_line(&line) {
                        batch.push(instr);
                    }
                }
                Err(_) => {
                    self.exhausted = true;
                    break;
                }
            }
        }
        batch
    }

    fn parse_line(&mut self, line: &str) -> Option<Instruction> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let is_branch = match tokens.len() {
            5 => false,
            7 => true,
            0 => return None,
            n => {
                log::warn!("skipping malformed trace line with {n} tokens: {line:?}");
                return None;
            }
        };

        let pc = match u64::from_str_radix(tokens[0].trim_start_matches("0x"), 16) {
            Ok(v) => v,
            Err(_) => {
                log::warn!("skipping trace line with unparseable pc: {line:?}");
                return None;
            }
        };
        let fu_raw: i64 = match tokens[1].parse() {
            Ok(v) => v,
            Err(_) => {
                log::warn!("skipping trace line with unparseable fu class: {line:?}");
                return None;
            }
        };
        let fu_class = match FuClass::from_token(fu_raw) {
            Some(c) => c,
            None => {
                log::warn!("skipping trace line with unknown fu class {fu_raw}: {line:?}");
                return None;
            }
        };
        let dest_raw: i64 = tokens[2].parse().ok()?;
        let src1_raw: i64 = tokens[3].parse().ok()?;
        let src2_raw: i64 = tokens[4].parse().ok()?;

        let (taken, _unused_hex_token) = if is_branch {
            let unused = u64::from_str_radix(tokens[5].trim_start_matches("0x"), 16).unwrap_or(0);
            let taken: i64 = tokens[6].parse().unwrap_or(0);
            (taken != 0, unused)
        } else {
            (false, 0)
        };

        let tag = Tag(self.next_tag);
        self.next_tag += 1;

        Some(Instruction::new(
            tag,
            pc,
            fu_class,
            RegIndex::new(dest_raw),
            RegIndex::new(src1_raw),
            RegIndex::new(src2_raw),
            is_branch,
            taken,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_non_branch_five_token_line() {
        let mut r = TraceReader::new(Cursor::new("0x1000 0 5 -1 -1\n"));
        let batch = r.next_batch(10);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].dest_tag, Tag(0));
        assert!(!batch[0].is_branch);
        assert_eq!(batch[0].pc, 0x1000);
    }

    #[test]
    fn parses_seven_token_branch_line() {
        let mut r = TraceReader::new(Cursor::new("0x2000 1 -1 3 4 0x0 1\n"));
        let batch = r.next_batch(10);
        assert_eq!(batch.len(), 1);
        assert!(batch[0].is_branch);
        assert!(batch[0].taken);
    }

    #[test]
    fn skips_malformed_lines() {
        let mut r = TraceReader::new(Cursor::new("garbage line here\n0x10 0 1 -1 -1\n"));
        let batch = r.next_batch(10);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].dest_tag, Tag(0));
    }

    #[test]
    fn tags_are_monotone_across_batches() {
        let mut r = TraceReader::new(Cursor::new(
            "0x0 0 1 -1 -1\n0x4 0 2 -1 -1\n0x8 0 3 -1 -1\n",
        ));
        let first = r.next_batch(2);
        let second = r.next_batch(2);
        assert_eq!(first[0].dest_tag, Tag(0));
        assert_eq!(first[1].dest_tag, Tag(1));
        assert_eq!(second[0].dest_tag, Tag(2));
    }

    #[test]
    fn absent_registers_map_to_none() {
        let mut r = TraceReader::new(Cursor::new("0x0 0 -1 -1 -1\n"));
        let batch = r.next_batch(1);
        assert_eq!(batch[0].dest_reg, None);
    }
}
