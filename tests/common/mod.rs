//! Capturing console, sender and sink for the integration tests.

#![allow(dead_code)]

use std::{
    io,
    sync::{Arc, Mutex},
};

use reportkit::{
    Reporter,
    email::{Address, Email, SendError},
    sink::WriterSink,
};

/// A cloneable in-memory writer.
#[derive(Clone, Default)]
pub struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Buffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Records every email handed to it, or fails every send.
#[derive(Clone, Default)]
pub struct Outbox {
    sent: Arc<Mutex<Vec<Email>>>,
    failure: Option<&'static str>,
}

impl Outbox {
    pub fn failing(message: &'static str) -> Self {
        Self {
            failure: Some(message),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sender(&self) -> impl Fn(&Email) -> Result<(), SendError> + Send + Sync + 'static {
        let outbox = self.clone();
        move |email: &Email| match outbox.failure {
            Some(message) => Err(message.into()),
            None => {
                outbox.sent.lock().unwrap().push(email.clone());
                Ok(())
            }
        }
    }
}

pub struct Harness {
    pub reporter: Reporter,
    pub console: Buffer,
    pub log: Buffer,
    pub outbox: Outbox,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_outbox(Outbox::default())
    }

    pub fn with_outbox(outbox: Outbox) -> Self {
        let console = Buffer::default();
        let log = Buffer::default();
        let reporter = Reporter::builder("reportkit")
            .email(
                outbox.sender(),
                Address::with_name("Shop", "shop@example.com"),
                [
                    Address::new("oncall@example.com"),
                    Address::new("dev@example.com"),
                ],
            )
            .log_sink(WriterSink::new(log.clone()))
            .console(console.clone())
            .build();

        Self {
            reporter,
            console,
            log,
            outbox,
        }
    }
}

/// Drops the leading timestamp line, checking its `dd.mm.yyyy hh:mm:ss` shape.
pub fn strip_timestamp(block: &str) -> &str {
    let (stamp, rest) = block.split_once('\n').unwrap();
    let bytes = stamp.as_bytes();
    assert_eq!(bytes.len(), 19, "unexpected timestamp {stamp:?}");
    for (i, byte) in bytes.iter().enumerate() {
        match i {
            2 | 5 => assert_eq!(*byte, b'.'),
            10 => assert_eq!(*byte, b' '),
            13 | 16 => assert_eq!(*byte, b':'),
            _ => assert!(byte.is_ascii_digit(), "unexpected timestamp {stamp:?}"),
        }
    }
    rest
}

pub fn separator() -> String {
    "—".repeat(70)
}
