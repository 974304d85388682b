
// imports
use crate::config::{files_handling, Params};
use crate::corpus::{self, Corpus};
use crate::error::Result;
use crate::generator::{PairGenerator, TrainingWriter};
use crate::sampler::NegativeSampler;
use crate::vocab::Vocabulary;

use std::time::Instant;
use log::{info, warn};
use rand::{rngs::StdRng, SeedableRng};


/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub corpus_len: usize,
    pub encoded_len: usize,
    pub vocab_size: usize,
    pub triples: u64,
}

pub struct Pipeline {}

impl Pipeline {

    // runs the four phases in order, each consumes the full output of the previous one
    // -> vocabulary building (or loading a saved one)
    // -> corpus encoding
    // -> negative sampler table
    // -> triple generation

    pub fn run(params: &Params) -> Result<Summary> {

        let timer = Instant::now();
        info!("{}", params);

        let corpus: Corpus = files_handling::read_input(&params.corpus_file, params.sep)?;
        if corpus.is_empty() {
            warn!("{} holds no tokens", params.corpus_file.display());
        }
        let vocab = Pipeline::vocabulary(params, &corpus)?;
        info!("vocabulary ready with {} words covering {} tokens, took {} ms", vocab.len(), vocab.total_count(), timer.elapsed().as_millis());

        // filter low frequency words and move to ids
        info!("before filtering the corpus holds {} tokens", corpus.len());
        let ids = corpus::encode(corpus.tokens(), &vocab);
        info!("after filtering the corpus holds {} ids", ids.len());
        let corpus_len = corpus.len();
        drop(corpus);

        let sampler = NegativeSampler::new(vocab.counts(), params.sampling.ns_exponent)?;
        let generator = PairGenerator::new(&sampler, &params.sampling)?;

        // nothing is written unless a full window fits
        generator.check_len(ids.len())?;

        let mut rng = match params.sampling.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let timer = Instant::now();
        info!("starting generation, {} triples expected", generator.expected_triples(ids.len()));
        let mut writer = TrainingWriter::create(&params.train_file, params.sep, &vocab)?;
        let triples = generator.generate(&ids, &mut rng, &mut writer)?;
        writer.finish()?;
        info!("wrote {} triples to {}, took {} ms", triples, params.train_file.display(), timer.elapsed().as_millis());

        Ok(Summary {
            corpus_len,
            encoded_len: ids.len(),
            vocab_size: vocab.len(),
            triples,
        })
    }

    fn vocabulary(params: &Params, corpus: &Corpus) -> Result<Vocabulary> {

        // a saved vocabulary keeps ids stable across corpora and runs
        if params.saved_vocab == Some(true) {
            info!("loading saved vocabulary from {}", params.vocab_file.display());
            return files_handling::read_input(&params.vocab_file, params.sep);
        }

        info!("starting vocab building...");
        let vocab = Vocabulary::build(corpus.tokens(), params.sampling.wc_limit);
        files_handling::save_output(&params.vocab_file, params.sep, &vocab)?;
        Ok(vocab)
    }
}


#[cfg(test)]
mod tests {

    use super::{Pipeline, Summary};
    use crate::config::{Params, SamplingParams};
    use crate::error::PipelineError;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;

    fn params(dir: &Path, corpus: &str) -> Params {
        let corpus_file = dir.join("corpus.txt");
        fs::write(&corpus_file, corpus).unwrap();
        Params {
            corpus_file,
            vocab_file: dir.join("out").join("vocab.txt"),
            train_file: dir.join("out").join("train.txt"),
            sep: b' ',
            saved_vocab: None,
            sampling: SamplingParams { wc_limit: 1, skip_win: 1, skip_num: 2, ns_cnt: 1, ns_exponent: 0.75, seed: Some(17) },
        }
    }

    #[test]
    fn toy_run_writes_vocabulary_and_triples() {

        let dir = tempfile::tempdir().unwrap();
        let params = params(dir.path(), "a b a c\na b d\na c b\n");

        let summary = Pipeline::run(&params).unwrap();
        assert_eq!(summary, Summary { corpus_len: 10, encoded_len: 10, vocab_size: 4, triples: 16 });

        let vocab = fs::read_to_string(&params.vocab_file).unwrap();
        assert_eq!(vocab, "0 a 4\n1 b 3\n2 c 2\n3 d 1\n");

        let train = fs::read_to_string(&params.train_file).unwrap();
        let lines: Vec<&str> = train.lines().collect();
        assert_eq!(lines.len(), 16);
        for line in lines {
            let fields: Vec<&str> = line.split(' ').collect();
            assert_eq!(fields.len(), 3);
            assert_ne!(fields[0], fields[1]);
            assert_ne!(fields[1], fields[2]);
        }
    }

    #[test]
    fn existing_training_file_is_replaced() {

        let dir = tempfile::tempdir().unwrap();
        let params = params(dir.path(), "a b a c a b d a c b");
        fs::create_dir_all(params.train_file.parent().unwrap()).unwrap();
        fs::write(&params.train_file, "stale\n".repeat(100)).unwrap();

        Pipeline::run(&params).unwrap();
        let train = fs::read_to_string(&params.train_file).unwrap();
        assert_eq!(train.lines().count(), 16);
        assert!(!train.contains("stale"));
    }

    #[test]
    fn single_word_vocabulary_cannot_sample() {

        let dir = tempfile::tempdir().unwrap();
        let mut params = params(dir.path(), "a b a c d e f g");
        params.sampling.wc_limit = 2;

        // only `a` survives, there is nothing left once it is excluded
        match Pipeline::run(&params) {
            Err(PipelineError::Sampling(_)) => {},
            other => panic!("unexpected result {:?}", other),
        }
        assert!(!params.train_file.exists());
    }

    #[test]
    fn insufficient_data_writes_no_training_file() {

        let dir = tempfile::tempdir().unwrap();
        let mut params = params(dir.path(), "a b a c a b d a c b");
        params.sampling.skip_win = 5;
        params.sampling.skip_num = 6;

        match Pipeline::run(&params) {
            Err(PipelineError::InsufficientData { len, span }) => assert_eq!((len, span), (10, 11)),
            other => panic!("unexpected result {:?}", other),
        }
        assert!(!params.train_file.exists());
    }

    #[test]
    fn saved_vocabulary_is_reused() {

        let dir = tempfile::tempdir().unwrap();
        let first = params(dir.path(), "a b a c a b d a c b");
        Pipeline::run(&first).unwrap();
        let saved = fs::read_to_string(&first.vocab_file).unwrap();

        // a different corpus, words outside the saved vocabulary are dropped
        let mut second = params(dir.path(), "d c b a z z z z z d c b a");
        second.saved_vocab = Some(true);
        let summary = Pipeline::run(&second).unwrap();
        assert_eq!(summary.vocab_size, 4);
        assert_eq!(summary.corpus_len, 13);
        assert_eq!(summary.encoded_len, 8);
        assert_eq!(fs::read_to_string(&second.vocab_file).unwrap(), saved);

        let ids: HashMap<&str, usize> = saved
        .lines()
        .map(|l| {
            let f: Vec<&str> = l.split(' ').collect();
            (f[1], f[0].parse().unwrap())
        })
        .collect();
        assert_eq!(ids["a"], 0);
    }
}
