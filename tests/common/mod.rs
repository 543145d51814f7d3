//! Shared helpers for integration tests

#![allow(dead_code)]

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use stereobind::test_utils::{MockFormatHandler, MockProtocolHandler};
use stereobind::{BindingFactory, FieldSchema, Stereotype};

/// Install a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// In-memory log sink shared between the subscriber and the test
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a scoped subscriber and return its WARN+ output
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();

    let out = tracing::subscriber::with_default(subscriber, f);
    (out, logs.contents())
}

/// `events` stereotype on the `file` protocol with a declared schema
pub fn events() -> Stereotype {
    Stereotype::builder("events")
        .default_protocol("file")
        .default_format("csv")
        .fields(FieldSchema::typed([("id", "int"), ("ts", "long")]))
        .build()
        .unwrap()
}

/// Factory with text formats over `file` and `s3`
pub fn factory() -> BindingFactory {
    init_tracing();

    let mut factory = BindingFactory::new();
    factory.add_format_handler(Arc::new(MockFormatHandler::new("text", ["csv", "tsv", "json"])));
    factory.add_protocol_handler(Arc::new(MockProtocolHandler::new("local", ["file"])));
    factory.add_protocol_handler(Arc::new(MockProtocolHandler::new("object-store", ["s3"])));
    factory
}
