
// imports
use crate::config::SamplingParams;
use crate::config::files_handling::create_parent;
use crate::error::{PipelineError, Result};
use crate::sampler::NegativeSampler;
use crate::vocab::Vocabulary;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use log::debug;
use rand::Rng;


/// One training example, all three fields are vocabulary ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triple {
    pub target: usize,
    pub context: usize,
    pub negative: usize,
}

// where generated triples go, in generation order
pub trait TripleSink {
    fn accept(&mut self, triple: Triple) -> Result<()>;
}

impl TripleSink for Vec<Triple> {
    fn accept(&mut self, triple: Triple) -> Result<()> {
        self.push(triple);
        Ok(())
    }
}


/// Writes triples as `target<sep>context<sep>negative` words, one per line.
pub struct TrainingWriter<'v, W: Write> {
    wrt: csv::Writer<W>,
    vocab: &'v Vocabulary,
    written: u64,
}

impl<'v> TrainingWriter<'v, BufWriter<File>> {

    /// Opens `path` for this run only, an existing file is truncated.
    pub fn create(path: &Path, sep: u8, vocab: &'v Vocabulary) -> Result<Self> {
        create_parent(path)?;
        let f = File::create(path).map_err(|e| PipelineError::io(path, e))?;
        Ok(TrainingWriter::from_writer(BufWriter::new(f), sep, vocab))
    }
}

impl<'v, W: Write> TrainingWriter<'v, W> {

    pub fn from_writer(writer: W, sep: u8, vocab: &'v Vocabulary) -> Self {
        let wrt = WriterBuilder::new()
        .delimiter(sep)
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);
        TrainingWriter { wrt, vocab, written: 0 }
    }

    fn lookup(&self, id: usize) -> Result<&'v str> {
        let vocab: &'v Vocabulary = self.vocab;
        vocab.word(id).ok_or_else(|| PipelineError::Sampling(format!("id {} is outside the vocabulary of {} words", id, vocab.len())))
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flushes everything written so far and hands back the inner writer.
    pub fn finish(self) -> Result<W> {
        self.wrt.into_inner().map_err(|e| PipelineError::Csv(e.into_error().into()))
    }
}

impl<'v, W: Write> TripleSink for TrainingWriter<'v, W> {
    fn accept(&mut self, triple: Triple) -> Result<()> {
        let record = [self.lookup(triple.target)?, self.lookup(triple.context)?, self.lookup(triple.negative)?];
        self.wrt.write_record(record)?;
        self.written += 1;
        Ok(())
    }
}


// fixed capacity ring buffer, `head` is the slot the next push overwrites,
// which once the window is full is also the oldest id
struct Window {
    buf: Box<[usize]>,
    head: usize,
    filled: usize,
}

impl Window {

    fn new(span: usize) -> Window {
        Window { buf: vec![0; span].into_boxed_slice(), head: 0, filled: 0 }
    }

    fn span(&self) -> usize {
        self.buf.len()
    }

    fn push(&mut self, id: usize) {
        self.buf[self.head] = id;
        self.head = (self.head + 1) % self.span();
        if self.filled < self.span() {
            self.filled += 1;
        }
    }

    fn is_full(&self) -> bool {
        self.filled == self.span()
    }

    // offset 0 is the oldest id in a full window
    fn get(&self, offset: usize) -> usize {
        self.buf[(self.head + offset) % self.span()]
    }
}


/// Slides a `2 * skip_win + 1` window over an encoded corpus and emits
/// `(target, context, negative)` triples.
pub struct PairGenerator<'s> {
    sampler: &'s NegativeSampler,
    skip_win: usize,
    skip_num: usize,
    ns_cnt: usize,
    span: usize,
}

impl<'s> PairGenerator<'s> {

    pub fn new(sampler: &'s NegativeSampler, params: &SamplingParams) -> Result<PairGenerator<'s>> {

        // skip_num <= 2 * skip_win, every window has enough free offsets
        params.validate()?;

        Ok(PairGenerator {
            sampler,
            skip_win: params.skip_win,
            skip_num: params.skip_num,
            ns_cnt: params.ns_cnt,
            span: params.span()?,
        })
    }

    pub fn span(&self) -> usize {
        self.span
    }

    /// Fails when `len` ids cannot fill a single window.
    pub fn check_len(&self, len: usize) -> Result<()> {
        if len < self.span {
            return Err(PipelineError::InsufficientData { len, span: self.span });
        }
        Ok(())
    }

    /// Number of triples `generate` emits for `len` ids.
    pub fn expected_triples(&self, len: usize) -> u64 {
        let windows = len.saturating_sub(self.span - 1) as u64;
        windows * self.skip_num as u64 * self.ns_cnt as u64
    }

    /// Streams every triple of `ids` into `sink` and returns how many were emitted.
    ///
    /// Per window the centre id is the target and `skip_num` distinct
    /// non-centre offsets are drawn as positive contexts. A context may hold
    /// the same word as the target when that word repeats nearby, only the
    /// centre position itself is excluded. Every positive pair then gets
    /// `ns_cnt` negatives that differ from the positive context.
    pub fn generate<R, S>(&self, ids: &[usize], rng: &mut R, sink: &mut S) -> Result<u64>
    where
        R: Rng,
        S: TripleSink {

        self.check_len(ids.len())?;

        let mut window = Window::new(self.span);
        let mut free: Vec<usize> = Vec::with_capacity(self.span - 1);
        let mut emitted: u64 = 0;

        for &id in ids {

            window.push(id);
            if !window.is_full() {
                continue;
            }

            let target = window.get(self.skip_win);

            // offsets not drawn yet, the centre is never among them
            free.clear();
            free.extend((0..self.span).filter(|offset| *offset != self.skip_win));

            // each draw removes one of the 2 * skip_win offsets, validation
            // keeps skip_num within that, so the range is never empty
            for _ in 0..self.skip_num {

                let offset = free.swap_remove(rng.gen_range(0..free.len()));
                let context = window.get(offset);

                for _ in 0..self.ns_cnt {
                    let negative = self.sampler.sample(rng, context)?;
                    sink.accept(Triple { target, context, negative })?;
                    emitted += 1;
                }
            }
        }

        debug!("emitted {} triples over {} windows", emitted, ids.len() + 1 - self.span);

        Ok(emitted)
    }
}
