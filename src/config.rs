
use crate::error::{PipelineError, Result};

use serde_json::Value;
use std::{fs::{self, File}, fmt::Display, path::PathBuf};


#[derive(Clone, Debug, PartialEq)]
pub struct SamplingParams {
    pub wc_limit: u64,
    pub skip_win: usize,
    pub skip_num: usize,
    pub ns_cnt: usize,
    pub ns_exponent: f64,
    pub seed: Option<u64>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            wc_limit: 10,
            skip_win: 5,
            skip_num: 6,
            ns_cnt: 5,
            ns_exponent: 0.75,
            seed: None,
        }
    }
}

impl SamplingParams {

    /// Rejects combinations the generator cannot honour: a window without
    /// context, more positives than non-centre offsets, an unusable exponent.
    pub fn validate(&self) -> Result<()> {

        if self.skip_win == 0 {
            return Err(PipelineError::config("skip_win", "must be at least 1"));
        }
        let offsets = self.span()? - 1;
        if self.skip_num > offsets {
            return Err(PipelineError::config(
                "skip_num",
                format!("{} exceeds the {} context offsets of a window with skip_win {}", self.skip_num, offsets, self.skip_win),
            ));
        }
        if !self.ns_exponent.is_finite() || self.ns_exponent < 0.0 {
            return Err(PipelineError::config("ns_exponent", format!("{} is not a finite non-negative number", self.ns_exponent)));
        }
        Ok(())
    }

    /// Window width `2 * skip_win + 1`, an error when it does not fit a `usize`.
    pub fn span(&self) -> Result<usize> {
        self.skip_win
        .checked_mul(2)
        .and_then(|w| w.checked_add(1))
        .ok_or_else(|| PipelineError::config("skip_win", format!("{} makes the window wider than usize::MAX", self.skip_win)))
    }
}

impl Display for SamplingParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sampling hyper parameters:
        wc_limit: {},
        skip_win: {},
        skip_num: {},
        ns_cnt: {},
        ns_exponent: {},
        seed: {:?}",
        self.wc_limit, self.skip_win, self.skip_num, self.ns_cnt, self.ns_exponent, self.seed
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Params {
    pub corpus_file: PathBuf,
    pub vocab_file: PathBuf,
    pub train_file: PathBuf,
    pub sep: u8,
    pub saved_vocab: Option<bool>,
    pub sampling: SamplingParams,
}

impl Display for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "using params:
        corpus_file: {}
        vocab_file: {}
        train_file: {}
        sep: {:?}
        saved_vocab: {:?},
        Using {}",
        self.corpus_file.display(), self.vocab_file.display(), self.train_file.display(), self.sep as char, self.saved_vocab, self.sampling)
    }
}

pub struct Config {
    params: Params
}

impl Config {

    pub fn get_params(&self) -> Params {
        self.params.clone()
    }

    pub fn new(args: &[String]) -> Result<Config> {

        if args.len() != 2 {
            return Err(PipelineError::config("args", "input should be a path to json file only"));
        }

        // parse input json
        let f = File::open(&args[1]).map_err(|e| PipelineError::io(&args[1], e))?;
        let json: Value = serde_json::from_reader(f)?;
        Config::from_json(&json)
    }

    pub fn from_json(json: &Value) -> Result<Config> {

        // validate input and outputs in json
        let corpus_file = PathBuf::from(required_str(json, "corpus_file")?);
        let vocab_file = PathBuf::from(required_str(json, "vocab_file")?);
        let train_file = PathBuf::from(required_str(json, "train_file")?);

        // handle default vs input parameters
        let defaults = SamplingParams::default();
        let sampling = SamplingParams {
            wc_limit: optional_u64(json, "wc_limit")?.unwrap_or(defaults.wc_limit),
            skip_win: optional_usize(json, "skip_win")?.unwrap_or(defaults.skip_win),
            skip_num: optional_usize(json, "skip_num")?.unwrap_or(defaults.skip_num),
            ns_cnt: optional_usize(json, "ns_cnt")?.unwrap_or(defaults.ns_cnt),
            ns_exponent: match json.get("ns_exponent") {
                Some(v) => v.as_f64().ok_or_else(|| PipelineError::config("ns_exponent", "given value is not numeric"))?,
                None => defaults.ns_exponent
            },
            seed: optional_u64(json, "seed")?,
        };
        let sep = match json.get("sep") {
            Some(v) => parse_sep(v.as_str().ok_or_else(|| PipelineError::config("sep", "given value is not a string"))?)?,
            None => b'\t'
        };
        let saved_vocab = match json.get("saved_vocab") {
            Some(v) => Some(v.as_bool().ok_or_else(|| PipelineError::config("saved_vocab", "given value is not boolean"))?),
            None => None
        };

        let params = Params { corpus_file, vocab_file, train_file, sep, saved_vocab, sampling };
        Config::validate(&params)?;

        Ok(Self { params })
    }

    // everything that can be checked before reading the corpus is checked here
    fn validate(params: &Params) -> Result<()> {

        params.sampling.validate()?;

        // the corpus must exist and be readable
        let meta = fs::metadata(&params.corpus_file)
        .map_err(|e| PipelineError::config("corpus_file", format!("{}: {}", params.corpus_file.display(), e)))?;
        if !meta.is_file() {
            return Err(PipelineError::config("corpus_file", format!("{} is not a file", params.corpus_file.display())));
        }
        File::open(&params.corpus_file)
        .map_err(|e| PipelineError::config("corpus_file", format!("{} is unreadable: {}", params.corpus_file.display(), e)))?;

        if params.saved_vocab == Some(true) && !params.vocab_file.is_file() {
            return Err(PipelineError::config("vocab_file", format!("saved_vocab is set but {} does not exist", params.vocab_file.display())));
        }

        for (name, path) in [("vocab_file", &params.vocab_file), ("train_file", &params.train_file)] {
            if path == &params.corpus_file {
                return Err(PipelineError::config(name, "must differ from corpus_file"));
            }
            if path.is_dir() {
                return Err(PipelineError::config(name, format!("{} is a directory", path.display())));
            }
        }
        if params.vocab_file == params.train_file {
            return Err(PipelineError::config("train_file", "must differ from vocab_file"));
        }
        Ok(())
    }
}

fn required_str<'a>(json: &'a Value, key: &str) -> Result<&'a str> {
    let value = json.get(key).ok_or_else(|| PipelineError::config(key, "was not supplied through json"))?;
    let s = value.as_str().ok_or_else(|| PipelineError::config(key, "cannot cast to string"))?;
    if s.is_empty() {
        return Err(PipelineError::config(key, "path is empty"));
    }
    Ok(s)
}

fn optional_u64(json: &Value, key: &str) -> Result<Option<u64>> {
    match json.get(key) {
        Some(v) => v.as_u64().map(Some).ok_or_else(|| PipelineError::config(key, "given value is not a non-negative integer")),
        None => Ok(None)
    }
}

fn optional_usize(json: &Value, key: &str) -> Result<Option<usize>> {
    match optional_u64(json, key)? {
        Some(v) => usize::try_from(v).map(Some).map_err(|_| PipelineError::config(key, format!("{} does not fit in usize", v))),
        None => Ok(None)
    }
}

// the csv layer needs a single byte delimiter
fn parse_sep(sep: &str) -> Result<u8> {
    match sep.as_bytes() {
        [b] if b.is_ascii() && *b != b'\n' && *b != b'\r' => Ok(*b),
        _ => Err(PipelineError::config("sep", format!("{:?} is not a single ascii character", sep))),
    }
}


pub mod files_handling {

    use crate::error::{PipelineError, Result};
    use std::fs;
    use std::path::Path;

    pub fn read_input<R: ReadFile>(path: &Path, sep: u8) -> Result<R> {
        R::read_file(path, sep)
    }

    pub fn save_output<S: SaveFile>(path: &Path, sep: u8, item: &S) -> Result<()> {

        // create output folder
        create_parent(path)?;
        item.save_file(path, sep)
    }

    pub fn create_parent(path: &Path) -> Result<()> {
        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))
            },
            _ => Ok(())
        }
    }

    pub trait ReadFile: Sized {
        fn read_file(path: &Path, sep: u8) -> Result<Self>;
    }

    pub trait SaveFile {
        fn save_file(&self, path: &Path, sep: u8) -> Result<()>;
    }
}


#[cfg(test)]
mod tests {

    use super::{Config, SamplingParams};
    use crate::error::PipelineError;
    use serde_json::json;
    use std::fs;

    fn corpus_dir() -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus.txt");
        fs::write(&corpus, "a\tb\ta\n").unwrap();
        let corpus = corpus.to_str().unwrap().to_owned();
        (dir, corpus)
    }

    fn param_of(err: PipelineError) -> String {
        match err {
            PipelineError::Configuration { param, .. } => param,
            other => panic!("expected a configuration error, got {:?}", other),
        }
    }

    #[test]
    fn defaults_are_applied() {

        let (dir, corpus) = corpus_dir();
        let json = json!({
            "corpus_file": corpus,
            "vocab_file": dir.path().join("vocab.txt"),
            "train_file": dir.path().join("train.txt"),
        });
        let params = Config::from_json(&json).unwrap().get_params();
        assert_eq!(params.sampling, SamplingParams::default());
        assert_eq!(params.sep, b'\t');
        assert_eq!(params.saved_vocab, None);
    }

    #[test]
    fn overrides_are_read() {

        let (dir, corpus) = corpus_dir();
        let json = json!({
            "corpus_file": corpus,
            "vocab_file": dir.path().join("vocab.txt"),
            "train_file": dir.path().join("train.txt"),
            "wc_limit": 1, "skip_win": 2, "skip_num": 3, "ns_cnt": 4,
            "ns_exponent": 0.5, "sep": " ", "seed": 7
        });
        let params = Config::from_json(&json).unwrap().get_params();
        assert_eq!(params.sep, b' ');
        assert_eq!(params.sampling.wc_limit, 1);
        assert_eq!(params.sampling.span().unwrap(), 5);
        assert_eq!(params.sampling.skip_num, 3);
        assert_eq!(params.sampling.ns_cnt, 4);
        assert_eq!(params.sampling.seed, Some(7));
    }

    #[test]
    fn too_many_positives_are_rejected() {

        let (dir, corpus) = corpus_dir();
        let json = json!({
            "corpus_file": corpus,
            "vocab_file": dir.path().join("vocab.txt"),
            "train_file": dir.path().join("train.txt"),
            "skip_win": 1, "skip_num": 3
        });
        let err = Config::from_json(&json).err().unwrap();
        assert_eq!(param_of(err), "skip_num");
    }

    #[test]
    fn window_width_overflow_is_rejected() {

        let huge = SamplingParams { skip_win: 1 << (usize::BITS - 1), skip_num: 1, ..SamplingParams::default() };
        assert_eq!(param_of(huge.span().err().unwrap()), "skip_win");
        assert_eq!(param_of(huge.validate().err().unwrap()), "skip_win");

        // largest window that still fits
        let widest = SamplingParams { skip_win: usize::MAX / 2, skip_num: 1, ..SamplingParams::default() };
        assert_eq!(widest.span().unwrap(), usize::MAX);
        assert!(widest.validate().is_ok());
    }

    #[test]
    fn zero_window_is_rejected() {

        let zero = SamplingParams { skip_win: 0, skip_num: 0, ..SamplingParams::default() };
        assert_eq!(param_of(zero.validate().err().unwrap()), "skip_win");
    }

    #[test]
    fn missing_corpus_is_rejected() {

        let dir = tempfile::tempdir().unwrap();
        let json = json!({
            "corpus_file": dir.path().join("nope.txt"),
            "vocab_file": dir.path().join("vocab.txt"),
            "train_file": dir.path().join("train.txt"),
        });
        let err = Config::from_json(&json).err().unwrap();
        assert_eq!(param_of(err), "corpus_file");
    }

    #[test]
    fn bad_values_name_their_key() {

        let (dir, corpus) = corpus_dir();
        let base = json!({
            "corpus_file": corpus,
            "vocab_file": dir.path().join("vocab.txt"),
            "train_file": dir.path().join("train.txt"),
        });

        for (key, value) in [("sep", json!("::")), ("wc_limit", json!(-1)), ("ns_exponent", json!("x")), ("saved_vocab", json!(1))] {
            let mut json = base.clone();
            json[key] = value;
            let err = Config::from_json(&json).err().unwrap();
            assert_eq!(param_of(err), key);
        }

        let mut json = base.clone();
        json.as_object_mut().unwrap().remove("train_file");
        assert_eq!(param_of(Config::from_json(&json).err().unwrap()), "train_file");
    }

    #[test]
    fn args_must_hold_one_path() {

        let args = vec!["bin".to_string()];
        assert!(matches!(Config::new(&args), Err(PipelineError::Configuration { .. })));
    }
}
