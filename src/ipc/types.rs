use crate::clock::Clock;
use crate::config::Config;
use crate::store::EntityStore;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub store: EntityStore,
    pub clock: Clock,
    pub config: Config,
}

impl AppState {
    pub fn new(store: EntityStore, config: Config) -> Self {
        Self {
            store,
            clock: config.clock(),
            config,
        }
    }
}
