//! # Analytics
//!
//! Submission funnel events for Umami. Events carry counts and outcomes, never form contents.
//!
//! Tracking only enqueues. The queue is bounded, when full the oldest event is dropped. Nothing leaves
//! the queue until it is marked ready, after that a background task flushes it on an interval.
//!
//! With no Umami settings the queue has no sink and tracking is a no-op.
use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::{sync::Mutex, task::JoinHandle, time::interval};
use tracing::{info, warn};

use crate::config::UmamiConfig;

pub const SUBMIT_SUCCESS: &str = "form_submit_success";
pub const SUBMIT_INVALID: &str = "form_submit_invalid";
pub const SUBMIT_BOT_REJECTED: &str = "form_submit_bot_rejected";
pub const SUBMIT_FAILED: &str = "form_submit_failed";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsEvent {
    pub name: String,
    pub data: Value,
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Sink rejected event with {0}")]
    Rejected(StatusCode),
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, event: &AnalyticsEvent) -> Result<(), SinkError>;
}

pub struct EventQueue {
    sink: Option<Arc<dyn EventSink>>,
    capacity: usize,
    events: Mutex<VecDeque<AnalyticsEvent>>,
    ready: AtomicBool,
    dropped: AtomicU64,
}

impl EventQueue {
    pub fn new(sink: Option<Arc<dyn EventSink>>, capacity: usize) -> Self {
        Self {
            sink,
            capacity: capacity.max(1),
            events: Mutex::new(VecDeque::new()),
            ready: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None, 1)
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub async fn track(&self, name: &str, data: Value) {
        if self.sink.is_none() {
            return;
        }

        let mut events = self.events.lock().await;
        if events.len() >= self.capacity {
            events.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }

        events.push_back(AnalyticsEvent {
            name: name.to_string(),
            data,
        });
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub async fn len(&self) -> usize {
        self.events.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.lock().await.is_empty()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Logs events lost to a full queue since `reported`, returning the new total.
    fn report_dropped(&self, reported: u64) -> u64 {
        let dropped = self.dropped();
        if dropped > reported {
            warn!(
                "Analytics queue full, dropped {} events ({dropped} total)",
                dropped - reported
            );
        }
        dropped
    }

    /// Sends everything queued, in order. Returns how many the sink accepted. Failed events are not retried.
    pub async fn flush(&self) -> usize {
        let Some(sink) = &self.sink else {
            return 0;
        };
        if !self.is_ready() {
            return 0;
        }

        let pending: Vec<AnalyticsEvent> = self.events.lock().await.drain(..).collect();
        let mut sent = 0;

        for event in &pending {
            match sink.send(event).await {
                Ok(()) => sent += 1,
                Err(e) => warn!("Failed to send analytics event {}: {e}", event.name),
            }
        }

        sent
    }

    pub fn spawn_flusher(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(every);
            let mut reported = 0;

            loop {
                ticker.tick().await;

                let sent = self.flush().await;
                if sent > 0 {
                    info!("Flushed {sent} analytics events");
                }

                reported = self.report_dropped(reported);
            }
        })
    }
}

pub struct UmamiSink {
    client: Client,
    config: UmamiConfig,
}

impl UmamiSink {
    pub fn new(config: UmamiConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder()
                .user_agent(concat!("crowdcount/", env!("CARGO_PKG_VERSION")))
                .timeout(Duration::from_secs(5))
                .build()?,
            config,
        })
    }

    fn body(&self, event: &AnalyticsEvent) -> Value {
        json!({
            "type": "event",
            "payload": {
                "website": self.config.website_id,
                "hostname": self.config.hostname,
                "url": "/form",
                "name": event.name,
                "data": event.data,
            }
        })
    }
}

#[async_trait]
impl EventSink for UmamiSink {
    async fn send(&self, event: &AnalyticsEvent) -> Result<(), SinkError> {
        let response = self
            .client
            .post(format!("{}/api/send", self.config.url))
            .json(&self.body(event))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SinkError::Rejected(response.status()));
        }

        Ok(())
    }
}
