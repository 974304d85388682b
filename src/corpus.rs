
// imports
use crate::config::files_handling::ReadFile;
use crate::error::{PipelineError, Result};
use crate::vocab::Vocabulary;

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use flate2::read::GzDecoder;
use log::debug;


// defines the behavior needed for tokenizing a corpus record
pub trait Tokenizer {
    fn tokenize<'a>(&self, record: &'a str) -> Vec<&'a str>;
}

/// Splits a record on a single delimiter, surrounding whitespace is trimmed
/// and empty tokens between repeated delimiters are skipped.
pub struct DelimiterTokenizer {
    sep: char,
}

impl DelimiterTokenizer {
    pub fn new(sep: u8) -> DelimiterTokenizer {
        DelimiterTokenizer { sep: sep as char }
    }
}

impl Tokenizer for DelimiterTokenizer {
    fn tokenize<'a>(&self, record: &'a str) -> Vec<&'a str> {
        record
        .trim()
        .split(self.sep)
        .filter(|tok| !tok.is_empty())
        .collect()
    }
}


/// The raw token sequence, every record's tokens concatenated in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    tokens: Vec<String>,
}

impl Corpus {

    fn accumulate<T: Tokenizer>(&mut self, record: &str, tokenizer: &T) {
        self.tokens.extend(tokenizer.tokenize(record).into_iter().map(str::to_owned));
    }

    fn load<R: Read, T: Tokenizer>(reader: R, path: &Path, tokenizer: &T) -> Result<Corpus> {

        let mut corpus = Corpus::default();
        for line in BufReader::new(reader).lines() {
            let line = line.map_err(|e| PipelineError::io(path, e))?;
            corpus.accumulate(&line, tokenizer);
        }
        Ok(corpus)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> + '_ {
        self.tokens.iter().map(String::as_str)
    }
}

impl ReadFile for Corpus {

    // gzipped corpora are decompressed on the fly
    fn read_file(path: &Path, sep: u8) -> Result<Self> {

        let tokenizer = DelimiterTokenizer::new(sep);
        let f = File::open(path).map_err(|e| PipelineError::io(path, e))?;
        let gzipped = path.extension().map_or(false, |ext| ext == "gz");

        let corpus = if gzipped {
            Corpus::load(GzDecoder::new(f), path, &tokenizer)?
        } else {
            Corpus::load(f, path, &tokenizer)?
        };

        debug!("read {} tokens from {} (gzipped: {})", corpus.len(), path.display(), gzipped);
        Ok(corpus)
    }
}


/// Map tokens to vocabulary ids. Tokens outside the vocabulary are dropped,
/// they never show up as a placeholder id, so the result is a subsequence
/// of the retained tokens and windows close over the gap.
pub fn encode<'a, I>(tokens: I, vocab: &Vocabulary) -> Vec<usize>
where
    I: IntoIterator<Item = &'a str> {

    tokens
    .into_iter()
    .filter_map(|tok| vocab.id(tok))
    .collect()
}
