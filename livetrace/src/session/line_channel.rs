//! Newline-delimited JSON transport.
//!
//! Each request is written as one JSON object per line. A background reader
//! thread parses inbound lines into [`Envelope`]s and forwards them over a
//! bounded crossbeam channel; they reach listeners only when the owning
//! thread calls [`BackendChannel::dispatch_pending`].

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, TryRecvError};
use livetrace_common::{Envelope, Request};
use log::{debug, info, warn};
use std::cell::{Cell, RefCell};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::thread::JoinHandle;
use std::time::Duration;

use super::channel::{BackendChannel, Listener, ListenerId, ListenerRegistry};
use crate::domain::ChannelError;

/// Inbound messages buffered between the reader thread and dispatch.
const INBOUND_CAPACITY: usize = 256;

pub struct LineChannel<W: Write> {
    writer: RefCell<W>,
    inbound: Receiver<Envelope>,
    listeners: ListenerRegistry,
    closed: Cell<bool>,
    _reader: JoinHandle<()>,
}

impl LineChannel<TcpStream> {
    /// Connect to a backend listening on `addr`.
    ///
    /// # Errors
    /// Returns [`ChannelError::ConnectFailed`] if the connection cannot be made
    pub fn connect(addr: &str) -> Result<Self, ChannelError> {
        let connect_failed = |source| ChannelError::ConnectFailed { addr: addr.to_string(), source };
        let stream = TcpStream::connect(addr).map_err(connect_failed)?;
        stream.set_nodelay(true)?;
        let reader = stream.try_clone().map_err(connect_failed)?;
        info!("Connected to backend at {addr}");
        Ok(Self::new(reader, stream))
    }
}

impl<W: Write> LineChannel<W> {
    /// Build a channel over an arbitrary reader/writer pair.
    pub fn new<R>(reader: R, writer: W) -> Self
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = bounded(INBOUND_CAPACITY);
        let handle = std::thread::spawn(move || {
            for (index, line) in BufReader::new(reader).lines().enumerate() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Backend read failed: {e}");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Envelope>(&line) {
                    Ok(envelope) => {
                        if tx.send(envelope).is_err() {
                            // Channel dropped
                            break;
                        }
                    }
                    Err(e) => warn!("Skipping malformed message on line {}: {e}", index + 1),
                }
            }
            debug!("Backend reader finished");
        });

        Self {
            writer: RefCell::new(writer),
            inbound: rx,
            listeners: ListenerRegistry::new(),
            closed: Cell::new(false),
            _reader: handle,
        }
    }

    /// Wait up to `timeout` for at least one message, then dispatch everything queued.
    pub fn dispatch_blocking(&self, timeout: Duration) -> usize {
        match self.inbound.recv_timeout(timeout) {
            Ok(envelope) => {
                self.listeners.dispatch(&envelope);
                1 + self.dispatch_pending()
            }
            Err(RecvTimeoutError::Timeout) => 0,
            Err(RecvTimeoutError::Disconnected) => {
                self.closed.set(true);
                0
            }
        }
    }

    /// Take back the writer, e.g. to inspect what was sent.
    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write> BackendChannel for LineChannel<W> {
    fn post(&self, request: &Request) -> Result<(), ChannelError> {
        if self.closed.get() {
            return Err(ChannelError::Closed);
        }
        let mut line = serde_json::to_vec(request)?;
        line.push(b'\n');

        let mut writer = self.writer.borrow_mut();
        writer.write_all(&line)?;
        writer.flush()?;
        Ok(())
    }

    fn watch(&self, listener: Listener) -> ListenerId {
        self.listeners.register(listener)
    }

    fn unwatch(&self, id: ListenerId) {
        self.listeners.unregister(id);
    }

    fn dispatch_pending(&self) -> usize {
        let mut delivered = 0;
        loop {
            match self.inbound.try_recv() {
                Ok(envelope) => {
                    self.listeners.dispatch(&envelope);
                    delivered += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.closed.replace(true) {
                        info!("Backend closed the connection");
                    }
                    break;
                }
            }
        }
        delivered
    }

    /// True once the backend has closed its side and every message was dispatched.
    fn is_closed(&self) -> bool {
        self.closed.get()
    }
}
