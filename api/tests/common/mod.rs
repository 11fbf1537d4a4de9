//! Shared fixtures for the API integration tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use actix_web::{
    body::BoxBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App,
};
use async_trait::async_trait;
use roomly_api::{configure_app, AppState};
use roomly_core::{
    InMemoryOtpRepository, InMemoryRateLimiter, NotificationSender, OtpManager,
    OtpManagerConfig, Purpose,
};
use roomly_shared::RateLimitPolicy;

pub type TestState = AppState<InMemoryOtpRepository, InMemoryRateLimiter, RecordingSender>;

/// Keeps the last code sent to each destination
#[derive(Default)]
pub struct RecordingSender {
    codes: Mutex<HashMap<String, String>>,
    deliveries: AtomicUsize,
    failing: AtomicBool,
}

impl RecordingSender {
    pub fn last_code(&self, destination: &str) -> Option<String> {
        self.codes.lock().unwrap().get(destination).cloned()
    }

    pub fn deliveries(&self) -> usize {
        self.deliveries.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn record(&self, destination: &str, code: &str) -> Result<String, String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err("provider unavailable".to_string());
        }
        self.deliveries.fetch_add(1, Ordering::SeqCst);
        self.codes
            .lock()
            .unwrap()
            .insert(destination.to_string(), code.to_string());
        Ok("test-message".to_string())
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send_email(&self, address: &str, code: &str, _purpose: Purpose) -> Result<String, String> {
        self.record(address, code)
    }

    async fn send_sms(&self, number: &str, code: &str, _purpose: Purpose) -> Result<String, String> {
        self.record(number, code)
    }
}

pub struct Backends {
    pub sender: Arc<RecordingSender>,
    pub state: web::Data<TestState>,
}

/// In-memory backends with the production budgets (3 sends and 5 verifies per 15 minutes)
pub fn backends() -> Backends {
    backends_with(RateLimitPolicy::new(3, 900), RateLimitPolicy::new(5, 900))
}

pub fn backends_with(issue: RateLimitPolicy, verify: RateLimitPolicy) -> Backends {
    let sender = Arc::new(RecordingSender::default());
    let manager = OtpManager::new(
        Arc::new(InMemoryOtpRepository::new()),
        Arc::new(InMemoryRateLimiter::new(issue)),
        Arc::new(InMemoryRateLimiter::new(verify)),
        sender.clone(),
        OtpManagerConfig::default(),
    );

    Backends {
        sender,
        state: web::Data::new(AppState::new(Arc::new(manager))),
    }
}

pub fn test_app(
    backends: &Backends,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<BoxBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(backends.state.clone())
        .configure(|cfg| {
            configure_app::<InMemoryOtpRepository, InMemoryRateLimiter, RecordingSender>(
                cfg,
                64 * 1024,
            )
        })
}
