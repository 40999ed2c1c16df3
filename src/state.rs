use std::sync::Arc;

use super::{
    config::Config,
    sink::{VoteSink, init_sink},
    store::BallotStore,
};

pub struct State {
    pub store: BallotStore,
    pub config: Config,
    pub sink: Box<dyn VoteSink>,
}

impl State {
    pub fn new() -> Arc<Self> {
        let config = Config::load();

        let store = BallotStore::new(config.video_count);
        let sink = init_sink(&config);

        Arc::new(Self {
            store,
            config,
            sink,
        })
    }
}
