//! Tests for the log transport: codes only reach the log when revealing is enabled

use std::io;
use std::sync::{Arc, Mutex};

use roomly_core::domain::entities::otp_record::Purpose;
use roomly_core::services::notification::NotificationSender;
use roomly_shared::{Environment, NotificationConfig, OtpConfig};
use tracing::subscriber::DefaultGuard;

use crate::notification::{
    create_notification_dispatcher, EmailMessage, EmailTransport, LogTransport, SmsTransport,
};

const CODE: &str = "482913";
const NUMBER: &str = "+14155552671";
const ADDRESS: &str = "student@example.com";

/// Log output written by the thread-local subscriber
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .without_time()
        .with_writer(move || writer.clone())
        .finish();
    (logs, tracing::subscriber::set_default(subscriber))
}

fn email(body: &str) -> EmailMessage {
    EmailMessage {
        to: ADDRESS.to_string(),
        subject: "Your Roomly code".to_string(),
        text_body: body.to_string(),
    }
}

#[tokio::test]
async fn test_hidden_sms_logs_masked_destination_only() {
    let (logs, _guard) = capture_logs();

    LogTransport::new(false)
        .send_sms(NUMBER, &format!("Your Roomly code is {}", CODE))
        .await
        .unwrap();

    let output = logs.contents();
    assert!(output.contains("[log transport] sms"));
    assert!(!output.contains(CODE));
    assert!(!output.contains(NUMBER));
}

#[tokio::test]
async fn test_hidden_email_omits_body() {
    let (logs, _guard) = capture_logs();

    LogTransport::new(false)
        .send_email(&email(&format!("Your code is {}", CODE)))
        .await
        .unwrap();

    let output = logs.contents();
    assert!(output.contains("[log transport] email"));
    assert!(!output.contains(CODE));
    assert!(!output.contains(ADDRESS));
}

#[tokio::test]
async fn test_revealing_transport_logs_body() {
    let (logs, _guard) = capture_logs();

    LogTransport::new(true)
        .send_sms(NUMBER, &format!("Your Roomly code is {}", CODE))
        .await
        .unwrap();

    assert!(logs.contents().contains(CODE));
}

#[tokio::test]
async fn test_production_dispatcher_never_logs_codes() {
    let mut otp = OtpConfig {
        reveal_codes: true,
        ..OtpConfig::default()
    };
    otp.restrict_for(Environment::Production);
    let dispatcher = create_notification_dispatcher(&NotificationConfig::default(), &otp);

    let (logs, _guard) = capture_logs();
    dispatcher.send_sms(NUMBER, CODE, Purpose::Login).await.unwrap();
    dispatcher.send_email(ADDRESS, CODE, Purpose::Signup).await.unwrap();

    let output = logs.contents();
    assert!(output.contains("[log transport] sms"));
    assert!(output.contains("[log transport] email"));
    assert!(!output.contains(CODE));
}
