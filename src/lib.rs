
mod config;
mod corpus;
mod error;
mod generator;
mod pipeline;
mod sampler;
mod vocab;

pub use config::{files_handling, Config, Params, SamplingParams};
pub use corpus::{encode, Corpus, DelimiterTokenizer, Tokenizer};
pub use error::{PipelineError, Result};
pub use generator::{PairGenerator, TrainingWriter, Triple, TripleSink};
pub use pipeline::{Pipeline, Summary};
pub use sampler::{NegativeSampler, DOMAIN};
pub use vocab::Vocabulary;
