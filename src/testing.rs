//! Scripted stand-ins for the network, the link and the output collaborators.

use crate::api::transport::{RawResponse, Transport};
use crate::api::Error;
use crate::display::DisplaySink;
use crate::link::Link;
use crate::model::{ConnectivityState, PowerReading};
use crate::status::{Status, StatusIndicator};
use http::StatusCode;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    PostForm {
        url: String,
        form: Vec<(String, String)>,
    },
    Get {
        url: String,
        cookie: String,
    },
}

#[derive(Default)]
struct Script {
    responses: VecDeque<Result<RawResponse, Error>>,
    requests: Vec<Request>,
}

/// Answers requests from a fixed list, in order.
#[derive(Clone, Default)]
pub struct FakeTransport {
    script: Rc<RefCell<Script>>,
}

impl FakeTransport {
    pub fn new(responses: Vec<Result<RawResponse, Error>>) -> Self {
        FakeTransport {
            script: Rc::new(RefCell::new(Script {
                responses: responses.into(),
                requests: Vec::new(),
            })),
        }
    }

    pub fn respond(
        status: StatusCode,
        cookies: &[&str],
        body: &str,
    ) -> Result<RawResponse, Error> {
        Ok(RawResponse {
            status,
            cookies: cookies.iter().map(|c| c.to_string()).collect(),
            body: body.to_string(),
        })
    }

    pub fn requests(&self) -> Vec<Request> {
        self.script.borrow().requests.clone()
    }

    fn next(&self, request: Request) -> Result<RawResponse, Error> {
        let mut script = self.script.borrow_mut();
        script.requests.push(request);
        script
            .responses
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response left"))
    }
}

impl Transport for FakeTransport {
    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<RawResponse, Error> {
        self.next(Request::PostForm {
            url: url.to_string(),
            form: form
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }

    async fn get(&self, url: &str, cookie: &str) -> Result<RawResponse, Error> {
        self.next(Request::Get {
            url: url.to_string(),
            cookie: cookie.to_string(),
        })
    }
}

/// Link whose probe results are scripted; once the script runs out it reports the
/// current state. `connect` and `reset` always succeed.
#[derive(Debug, Default)]
pub struct FakeLink {
    probes: VecDeque<bool>,
    state: ConnectivityState,
    connects: usize,
    resets: usize,
}

impl FakeLink {
    pub fn connected() -> Self {
        FakeLink {
            state: ConnectivityState { connected: true },
            ..Default::default()
        }
    }

    pub fn with_probes(probes: Vec<bool>) -> Self {
        FakeLink {
            probes: probes.into(),
            ..Self::connected()
        }
    }

    pub fn connects(&self) -> usize {
        self.connects
    }

    pub fn resets(&self) -> usize {
        self.resets
    }
}

impl Link for FakeLink {
    async fn is_connected(&mut self) -> bool {
        if let Some(up) = self.probes.pop_front() {
            self.state.connected = up;
        }
        self.state.connected
    }

    async fn connect(&mut self) {
        self.connects += 1;
        self.state.connected = true;
    }

    async fn reset(&mut self) {
        self.resets += 1;
        self.state.connected = false;
        self.connect().await;
    }
}

#[derive(Debug, Default)]
pub struct RecordingStatus {
    history: RefCell<Vec<Status>>,
}

impl RecordingStatus {
    pub fn history(&self) -> Vec<Status> {
        self.history.borrow().clone()
    }
}

impl StatusIndicator for RecordingStatus {
    fn show(&self, status: Status) {
        self.history.borrow_mut().push(status);
    }
}

#[derive(Default)]
struct Rendered {
    placeholders: usize,
    readings: Vec<PowerReading>,
}

#[derive(Clone, Default)]
pub struct FakeDisplay {
    rendered: Rc<RefCell<Rendered>>,
}

impl FakeDisplay {
    pub fn readings(&self) -> Vec<PowerReading> {
        self.rendered.borrow().readings.clone()
    }

    pub fn placeholders(&self) -> usize {
        self.rendered.borrow().placeholders
    }
}

impl DisplaySink for FakeDisplay {
    fn placeholder(&mut self) {
        self.rendered.borrow_mut().placeholders += 1;
    }

    fn render(&mut self, reading: &PowerReading) {
        self.rendered.borrow_mut().readings.push(*reading);
    }
}
