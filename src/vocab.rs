
// imports
use crate::config::files_handling::{ReadFile, SaveFile};
use crate::error::{PipelineError, Result};

use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use log::{debug, info};


/// Frequency filtered vocabulary with dense ids.
///
/// Ids run over `0..len()` in non-increasing count order. Once built it is
/// never mutated, the encoder, the sampler and the training writer all borrow it.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    words: Vec<String>,
    counts: Vec<u64>,
    w2i: HashMap<String, usize>,
}

impl Vocabulary {

    fn accumulate<'a, I>(tokens: I) -> HashMap<&'a str, u64>
    where
        I: IntoIterator<Item = &'a str> {

        // how many times each token appears in the corpus
        let mut token2count: HashMap<&str, u64> = HashMap::new();
        for tok in tokens {
            *token2count.entry(tok).or_insert(0) += 1;
        }
        token2count
    }

    /// Count `tokens`, keep those seen at least `wc_limit` times and number
    /// them by descending count. Equal counts are ordered by word so that two
    /// builds over the same corpus agree on every id.
    pub fn build<'a, I>(tokens: I, wc_limit: u64) -> Vocabulary
    where
        I: IntoIterator<Item = &'a str> {

        let token2count = Vocabulary::accumulate(tokens);
        let distinct = token2count.len();

        let mut tup = token2count
        .into_iter()
        .filter(|(_, c)| *c >= wc_limit)
        .collect::<Vec<(&str, u64)>>();
        tup.sort_unstable_by(|(word_a, count_a), (word_b, count_b)| {
            count_b.cmp(count_a).then_with(|| word_a.cmp(word_b))
        });

        info!("keeping {} of {} distinct tokens (wc_limit {})", tup.len(), distinct, wc_limit);

        let entries = tup.into_iter().map(|(w, c)| (w.to_owned(), c));
        Vocabulary::from_sorted(entries)
    }

    fn from_sorted<I>(entries: I) -> Vocabulary
    where
        I: IntoIterator<Item = (String, u64)> {

        let mut words = Vec::new();
        let mut counts = Vec::new();
        let mut w2i = HashMap::new();
        for (i, (word, count)) in entries.into_iter().enumerate() {
            w2i.insert(word.clone(), i);
            words.push(word);
            counts.push(count);
        }
        Vocabulary { words, counts, w2i }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn id(&self, word: &str) -> Option<usize> {
        self.w2i.get(word).copied()
    }

    pub fn word(&self, id: usize) -> Option<&str> {
        self.words.get(id).map(String::as_str)
    }

    /// Counts indexed by id, this is what the negative sampler is built from.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn total_count(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// `(id, word, count)` in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str, u64)> + '_ {
        self.words
        .iter()
        .zip(&self.counts)
        .enumerate()
        .map(|(i, (w, c))| (i, w.as_str(), *c))
    }
}


impl SaveFile for Vocabulary {

    fn save_file(&self, path: &Path, sep: u8) -> Result<()> {

        let f = File::create(path).map_err(|e| PipelineError::io(path, e))?;
        let mut wrt = WriterBuilder::new()
        .delimiter(sep)
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(BufWriter::new(f));

        for (i, word, count) in self.iter() {
            wrt.serialize((i, word, count))?;
        }
        wrt.flush().map_err(|e| PipelineError::io(path, e))?;

        debug!("wrote {} vocabulary records to {}", self.len(), path.display());
        Ok(())
    }
}

impl ReadFile for Vocabulary {

    // reads back what `save_file` wrote, ids must come in order 0, 1, 2, ...
    fn read_file(path: &Path, sep: u8) -> Result<Self> {

        let f = File::open(path).map_err(|e| PipelineError::io(path, e))?;
        let mut rdr = ReaderBuilder::new()
        .delimiter(sep)
        .has_headers(false)
        .quoting(false)
        .from_reader(f);

        let mut entries: Vec<(String, u64)> = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();
        for (line, record) in rdr.records().enumerate() {

            let record = record?;
            let line = line as u64 + 1;
            let malformed = |reason: String| PipelineError::MalformedVocabulary { line, reason };

            if record.len() != 3 {
                return Err(malformed(format!("expected 3 fields, found {}", record.len())));
            }
            let id: usize = record[0].parse().map_err(|_| malformed(format!("bad id `{}`", &record[0])))?;
            let word = record[1].to_owned();
            let count: u64 = record[2].parse().map_err(|_| malformed(format!("bad count `{}`", &record[2])))?;

            if id != entries.len() {
                return Err(malformed(format!("id {} out of order, expected {}", id, entries.len())));
            }
            if count == 0 {
                return Err(malformed(format!("word `{}` has a zero count", word)));
            }
            if let Some(prev) = entries.last() {
                if prev.1 < count {
                    return Err(malformed(format!("count {} exceeds the count of id {}", count, id - 1)));
                }
            }
            if let Some(other) = seen.insert(word.clone(), id) {
                return Err(malformed(format!("word `{}` already has id {}", word, other)));
            }
            entries.push((word, count));
        }

        Ok(Vocabulary::from_sorted(entries))
    }
}
