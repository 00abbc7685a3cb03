//! # Vision Client
//!
//! The vision client subscribes to the detection batches published by the vision equipment, one
//! per processed frame. Only the most recent batch is of interest, so every read drains all
//! pending messages and discards all but the last.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;

use comms_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
    eqpt::vision::DetectionBatch
};

use crate::track_ctrl::VisionSource;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The vision client
pub struct VisionClient {
    socket: MonitoredSocket
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum VisionClientError {

    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("The client is not connected to the vision equipment")]
    NotConnected,

    #[error("Could not recieve a message from the vision equipment: {0}")]
    RecvError(zmq::Error),

    #[error("The vision equipment sent a message which was not valid UTF-8")]
    NonUtf8Message,

    #[error("Could not deserialize the detection batch: {0}")]
    DeserializeError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VisionClient {
    /// Create a new instance of the vision client.
    ///
    /// This function will not block until the vision equipment connects.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, VisionClientError> {
        // Create the socket options
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 0,
            ..Default::default()
        };

        // Connect the socket
        let socket = MonitoredSocket::new(
            ctx,
            zmq::SUB,
            socket_options,
            &params.vision_endpoint
        ).map_err(VisionClientError::SocketError)?;

        Ok(Self {
            socket
        })
    }

    /// Returns true if the vision equipment is connected.
    pub fn is_connected(&self) -> bool {
        self.socket.connected()
    }

    /// Receive the most recent detection batch.
    ///
    /// All pending batches are read and only the newest is returned. Malformed messages are
    /// skipped with a warning. If no batch has arrived since the last call `None` is returned.
    pub fn recieve_latest(&mut self) -> Result<Option<DetectionBatch>, VisionClientError> {
        if !self.socket.connected() {
            return Err(VisionClientError::NotConnected)
        }

        let mut latest = None;

        loop {
            match self.recieve_one() {
                Ok(Some(b)) => latest = Some(b),
                Ok(None) => break,
                Err(VisionClientError::RecvError(e)) => return Err(VisionClientError::RecvError(e)),
                Err(e) => warn!("Discarding message from the vision equipment: {}", e)
            }
        }

        Ok(latest)
    }

    /// Read a single message from the socket without blocking.
    fn recieve_one(&mut self) -> Result<Option<DetectionBatch>, VisionClientError> {
        let msg_str = match self.socket.recv_string(zmq::DONTWAIT) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => return Err(VisionClientError::NonUtf8Message),
            Err(zmq::Error::EAGAIN) => return Ok(None),
            Err(e) => return Err(VisionClientError::RecvError(e))
        };

        serde_json::from_str(&msg_str)
            .map(Some)
            .map_err(VisionClientError::DeserializeError)
    }
}

impl VisionSource for VisionClient {
    /// Errors are logged and treated as no new frame, so that tracking control sees the target
    /// as lost rather than stopping the exec.
    fn read_latest_batch(&mut self) -> DetectionBatch {
        match self.recieve_latest() {
            Ok(Some(b)) => b,
            Ok(None) | Err(VisionClientError::NotConnected) => DetectionBatch::empty(),
            Err(e) => {
                warn!("Could not read from the vision equipment: {}", e);
                DetectionBatch::empty()
            }
        }
    }
}
