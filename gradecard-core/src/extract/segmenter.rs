//! Splits page lines into per-student blocks.
//!
//! A block opens on a record-start line (seat number followed by the first
//! letter of a name) and collects every following non-noise line until the
//! next record start or the end of the page.

use crate::config::NoiseConfig;
use crate::error::GradecardResult;
use crate::types::Catalog;
use regex::Regex;
use std::collections::HashSet;

/// Contiguous lines belonging to one student. `lines[0]` is the header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// 1-based page number the block was read from
    pub page: usize,
    pub lines: Vec<String>,
}

impl Block {
    pub fn header(&self) -> &str {
        self.lines.first().map(String::as_str).unwrap_or_default()
    }
}

/// Recognised page furniture: header/footer substrings plus subject banners
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    substrings: Vec<String>,
    subject_codes: HashSet<String>,
}

impl NoiseFilter {
    pub fn new(config: &NoiseConfig, catalog: &Catalog) -> Self {
        let subject_codes = if config.filter_subject_banners {
            catalog.codes().map(str::to_string).collect()
        } else {
            HashSet::new()
        };
        Self {
            substrings: config.header_footer_substrings.clone(),
            subject_codes,
        }
    }

    pub fn is_noise(&self, line: &str) -> bool {
        self.substrings.iter().any(|s| line.contains(s.as_str())) || self.is_subject_banner(line)
    }

    /// Repeated per-page banner such as `10411 : Applied Mathematics-I ...`
    fn is_subject_banner(&self, line: &str) -> bool {
        line.split_whitespace()
            .next()
            .map(|token| self.subject_codes.contains(token.strip_suffix(':').unwrap_or(token)))
            .unwrap_or(false)
    }
}

enum State {
    Idle,
    InBlock(Vec<String>),
}

pub struct BlockSegmenter<'a> {
    record_start: Regex,
    noise: &'a NoiseFilter,
    state: State,
    page: usize,
    blocks: Vec<Block>,
}

impl<'a> BlockSegmenter<'a> {
    pub fn new(noise: &'a NoiseFilter) -> GradecardResult<Self> {
        Ok(Self {
            record_start: Regex::new(r"^\d{7}\s+[A-Z]")?,
            noise,
            state: State::Idle,
            page: 0,
            blocks: Vec::new(),
        })
    }

    pub fn is_record_start(&self, line: &str) -> bool {
        self.record_start.is_match(line)
    }

    /// Feed one page. Any block still open at the end of the page is flushed.
    pub fn push_page<S: AsRef<str>>(&mut self, page: usize, lines: &[S]) {
        self.page = page;
        for line in lines {
            self.push_line(line.as_ref());
        }
        self.flush();
    }

    fn push_line(&mut self, line: &str) {
        if self.is_record_start(line) {
            self.flush();
            self.state = State::InBlock(vec![line.to_string()]);
            return;
        }

        if let State::InBlock(lines) = &mut self.state {
            if !self.noise.is_noise(line) {
                lines.push(line.to_string());
            }
        }
    }

    fn flush(&mut self) {
        if let State::InBlock(lines) = std::mem::replace(&mut self.state, State::Idle) {
            self.blocks.push(Block {
                page: self.page,
                lines,
            });
        }
    }

    pub fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }
}
