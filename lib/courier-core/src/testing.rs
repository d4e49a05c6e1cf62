//! Recording connection used by unit tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::rc::Rc;

use crate::connection::{Connection, Connector};

/// Everything a [`MockConnection`] was asked to do.
#[derive(Debug, Clone, Default)]
pub(crate) struct CallLog {
    pub urls: Vec<String>,
    pub methods: Vec<String>,
    pub header_calls: Vec<(String, String)>,
    pub output_enabled: bool,
    pub output_requests: usize,
    pub written: Vec<u8>,
    pub status_reads: usize,
    pub message_reads: usize,
    pub input_reads: usize,
    pub error_reads: usize,
    pub disconnects: usize,
}

/// Canned response served by a [`MockConnection`].
#[derive(Debug, Clone)]
pub(crate) struct MockResponse {
    pub status: u16,
    pub message: String,
    pub body: Option<Vec<u8>>,
    pub error_body: Option<Vec<u8>>,
    pub fail_status: bool,
    pub fail_output: bool,
}

impl MockResponse {
    pub fn new(status: u16, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
            body: None,
            error_body: None,
            fail_status: false,
            fail_output: false,
        }
    }

    pub fn body(mut self, body: &[u8]) -> Self {
        self.body = Some(body.to_vec());
        self
    }

    pub fn error_body(mut self, body: &[u8]) -> Self {
        self.error_body = Some(body.to_vec());
        self
    }

    pub fn fail_status(mut self) -> Self {
        self.fail_status = true;
        self
    }

    pub fn fail_output(mut self) -> Self {
        self.fail_output = true;
        self
    }
}

/// Connection serving a [`MockResponse`] and recording calls into a shared log.
#[derive(Debug)]
pub(crate) struct MockConnection {
    response: MockResponse,
    headers: HashMap<String, String>,
    log: Rc<RefCell<CallLog>>,
}

impl MockConnection {
    pub fn new(response: MockResponse, log: Rc<RefCell<CallLog>>) -> Self {
        Self {
            response,
            headers: HashMap::new(),
            log,
        }
    }

    /// A `200 OK` connection with the given body and a private log.
    pub fn ok(body: &[u8]) -> Self {
        Self::new(
            MockResponse::new(200, "OK").body(body),
            Rc::default(),
        )
    }

    /// Snapshot of the recorded calls.
    pub fn log(&self) -> CallLog {
        self.log.borrow().clone()
    }
}

struct LogWriter(Rc<RefCell<CallLog>>);

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Connection for MockConnection {
    fn set_method(&mut self, method: &str) -> io::Result<()> {
        self.log.borrow_mut().methods.push(method.to_string());
        Ok(())
    }

    fn set_header(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.log
            .borrow_mut()
            .header_calls
            .push((name.to_string(), value.to_string()));
        self.headers.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    fn enable_output(&mut self) {
        self.log.borrow_mut().output_enabled = true;
    }

    fn output_stream(&mut self) -> io::Result<Box<dyn Write + '_>> {
        self.log.borrow_mut().output_requests += 1;
        if self.response.fail_output {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"));
        }
        Ok(Box::new(LogWriter(Rc::clone(&self.log))))
    }

    fn response_code(&mut self) -> io::Result<u16> {
        self.log.borrow_mut().status_reads += 1;
        if self.response.fail_status {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ));
        }
        Ok(self.response.status)
    }

    fn response_message(&mut self) -> io::Result<String> {
        self.log.borrow_mut().message_reads += 1;
        Ok(self.response.message.clone())
    }

    fn input_stream(&mut self) -> io::Result<Option<Box<dyn Read + '_>>> {
        self.log.borrow_mut().input_reads += 1;
        Ok(self
            .response
            .body
            .as_deref()
            .map(|body| Box::new(body) as Box<dyn Read + '_>))
    }

    fn error_stream(&mut self) -> io::Result<Option<Box<dyn Read + '_>>> {
        self.log.borrow_mut().error_reads += 1;
        Ok(self
            .response
            .error_body
            .as_deref()
            .map(|body| Box::new(body) as Box<dyn Read + '_>))
    }

    fn disconnect(&mut self) {
        self.log.borrow_mut().disconnects += 1;
    }
}

/// Connector handing out [`MockConnection`]s that share one log.
#[derive(Debug)]
pub(crate) struct MockConnector {
    response: MockResponse,
    log: Rc<RefCell<CallLog>>,
    refuse: bool,
}

impl MockConnector {
    pub fn new(response: MockResponse) -> Self {
        Self {
            response,
            log: Rc::default(),
            refuse: false,
        }
    }

    /// A connector whose `connect` always fails.
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::new(MockResponse::new(200, "OK"))
        }
    }

    pub fn log(&self) -> CallLog {
        self.log.borrow().clone()
    }
}

impl Connector for MockConnector {
    type Connection = MockConnection;

    fn connect(&self, url: &str) -> io::Result<Self::Connection> {
        self.log.borrow_mut().urls.push(url.to_string());
        if self.refuse {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ));
        }
        Ok(MockConnection::new(
            self.response.clone(),
            Rc::clone(&self.log),
        ))
    }
}
