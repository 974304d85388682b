use skipgram_sampler::{Config, Pipeline};

use std::env;
use std::process;
use env_logger::Env;
use log::error;


fn init_logging() {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}

fn main() {

    init_logging();

    // a single argument, the path to the json configuration
    let args: Vec<String> = env::args().collect();
    let params = match Config::new(&args) {
        Ok(config) => config.get_params(),
        Err(e) => {
            error!("{}", e);
            process::exit(2);
        }
    };

    if let Err(e) = Pipeline::run(&params) {
        error!("{}", e);
        process::exit(1);
    }
}
