use std::sync::Arc;

use super::{
    analytics::{EventQueue, EventSink, UmamiSink},
    config::Config,
    database::{ProtestStore, SupabaseStore},
    turnstile::{BotCheck, Turnstile},
};

pub struct State {
    pub config: Config,
    pub store: Arc<dyn ProtestStore>,
    pub bot_check: Arc<dyn BotCheck>,
    pub analytics: Arc<EventQueue>,
}

impl State {
    pub fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let store = SupabaseStore::new(
            &config.supabase_url,
            &config.supabase_key,
            config.store_timeout,
        )?;
        let bot_check = Turnstile::new(config.turnstile_secret.clone(), config.turnstile_timeout)?;

        let sink = match &config.umami {
            Some(umami) => Some(Arc::new(UmamiSink::new(umami.clone())?) as Arc<dyn EventSink>),
            None => None,
        };
        let analytics = Arc::new(EventQueue::new(sink, config.analytics_capacity));

        Ok(Self::with_parts(
            config,
            Arc::new(store),
            Arc::new(bot_check),
            analytics,
        ))
    }

    pub fn with_parts(
        config: Config,
        store: Arc<dyn ProtestStore>,
        bot_check: Arc<dyn BotCheck>,
        analytics: Arc<EventQueue>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            store,
            bot_check,
            analytics,
        })
    }
}
