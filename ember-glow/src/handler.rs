//! Application callbacks
//!
//! The reader reports every complete entity through a [`GlowHandler`]. All
//! methods have empty default implementations, so an application only
//! overrides what it is interested in. The handler value itself is the
//! application state.

use ember_ber::BerTag;

use crate::error::EmberError;
use crate::fields::GlowFieldFlags;
use crate::types::{
    GlowCommand, GlowConnection, GlowFunction, GlowInvocationResult, GlowMatrix, GlowNode,
    GlowParameter, GlowSignal, GlowStreamEntry,
};

/// Kind of record being read when an unsupported field was met
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlowReaderPosition {
    NodeContents,
    ParameterContents,
    Command,
    StreamEntry,
    MatrixContents,
    Target,
    Source,
    Connection,
    FunctionContents,
    InvocationResult,
    /// Outside of any record (collections, root, unknown elements)
    Tree,
}

/// A field or element the reader does not decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedField {
    /// What was being read
    pub position: GlowReaderPosition,
    /// Tag of the skipped field or element
    pub tag: BerTag,
}

/// Receiver of decoded Glow entities
///
/// `path` holds the element numbers from the tree root down. For nodes,
/// parameters, matrices and functions the layout follows the configured
/// [`PathConvention`](crate::PathConvention); commands, signals and
/// connections get the path of the element containing them.
#[cfg_attr(test, mockall::automock)]
pub trait GlowHandler {
    /// A node has been read
    fn on_node(&mut self, _node: &GlowNode, _fields: GlowFieldFlags, _path: &[u32]) {}

    /// A parameter has been read
    fn on_parameter(&mut self, _parameter: &GlowParameter, _fields: GlowFieldFlags, _path: &[u32]) {}

    /// A command has been read
    fn on_command(&mut self, _command: &GlowCommand, _fields: GlowFieldFlags, _path: &[u32]) {}

    /// A stream entry has been read
    fn on_stream_entry(&mut self, _entry: &GlowStreamEntry, _fields: GlowFieldFlags, _path: &[u32]) {}

    /// A matrix has been read
    fn on_matrix(&mut self, _matrix: &GlowMatrix, _fields: GlowFieldFlags, _path: &[u32]) {}

    /// A matrix target has been read
    fn on_target(&mut self, _target: &GlowSignal, _fields: GlowFieldFlags, _path: &[u32]) {}

    /// A matrix source has been read
    fn on_source(&mut self, _source: &GlowSignal, _fields: GlowFieldFlags, _path: &[u32]) {}

    /// A matrix connection has been read
    fn on_connection(&mut self, _connection: &GlowConnection, _fields: GlowFieldFlags, _path: &[u32]) {}

    /// A function has been read
    fn on_function(&mut self, _function: &GlowFunction, _fields: GlowFieldFlags, _path: &[u32]) {}

    /// An invocation result has been read
    fn on_invocation_result(
        &mut self,
        _result: &GlowInvocationResult,
        _fields: GlowFieldFlags,
        _path: &[u32],
    ) {
    }

    /// A field or element was skipped
    fn on_unsupported(&mut self, _field: &UnsupportedField, _path: &[u32]) {}

    /// A framed message arrived, before it is decoded (framed reader only)
    fn on_package_received(&mut self, _payload: &[u8]) {}

    /// A keep-alive request arrived (framed reader only)
    fn on_keep_alive_request(&mut self, _slot: u8) {}

    /// A keep-alive response arrived (framed reader only)
    fn on_keep_alive_response(&mut self, _slot: u8) {}

    /// A framing error or a decoding error of one message (framed reader only)
    fn on_error(&mut self, _error: &EmberError) {}
}

/// A recorded handler callback
#[derive(Debug, Clone, PartialEq)]
pub enum GlowEvent {
    Node {
        node: GlowNode,
        fields: GlowFieldFlags,
        path: Vec<u32>,
    },
    Parameter {
        parameter: GlowParameter,
        fields: GlowFieldFlags,
        path: Vec<u32>,
    },
    Command {
        command: GlowCommand,
        fields: GlowFieldFlags,
        path: Vec<u32>,
    },
    StreamEntry {
        entry: GlowStreamEntry,
        fields: GlowFieldFlags,
        path: Vec<u32>,
    },
    Matrix {
        matrix: GlowMatrix,
        fields: GlowFieldFlags,
        path: Vec<u32>,
    },
    Target {
        target: GlowSignal,
        fields: GlowFieldFlags,
        path: Vec<u32>,
    },
    Source {
        source: GlowSignal,
        fields: GlowFieldFlags,
        path: Vec<u32>,
    },
    Connection {
        connection: GlowConnection,
        fields: GlowFieldFlags,
        path: Vec<u32>,
    },
    Function {
        function: GlowFunction,
        fields: GlowFieldFlags,
        path: Vec<u32>,
    },
    InvocationResult {
        result: GlowInvocationResult,
        fields: GlowFieldFlags,
        path: Vec<u32>,
    },
    Unsupported {
        field: UnsupportedField,
        path: Vec<u32>,
    },
    PackageReceived(Vec<u8>),
    KeepAliveRequest {
        slot: u8,
    },
    KeepAliveResponse {
        slot: u8,
    },
    Error(EmberError),
}

impl GlowEvent {
    /// Path delivered with the callback, if any
    pub fn path(&self) -> Option<&[u32]> {
        match self {
            Self::Node { path, .. }
            | Self::Parameter { path, .. }
            | Self::Command { path, .. }
            | Self::StreamEntry { path, .. }
            | Self::Matrix { path, .. }
            | Self::Target { path, .. }
            | Self::Source { path, .. }
            | Self::Connection { path, .. }
            | Self::Function { path, .. }
            | Self::InvocationResult { path, .. }
            | Self::Unsupported { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Field flags delivered with an entity
    pub fn fields(&self) -> Option<GlowFieldFlags> {
        match self {
            Self::Node { fields, .. }
            | Self::Parameter { fields, .. }
            | Self::Command { fields, .. }
            | Self::StreamEntry { fields, .. }
            | Self::Matrix { fields, .. }
            | Self::Target { fields, .. }
            | Self::Source { fields, .. }
            | Self::Connection { fields, .. }
            | Self::Function { fields, .. }
            | Self::InvocationResult { fields, .. } => Some(*fields),
            _ => None,
        }
    }

    /// Check if the event reports a decoded entity
    #[must_use]
    pub fn is_entity(&self) -> bool {
        self.fields().is_some()
    }
}

/// Handler recording every callback in order
#[derive(Debug, Clone, Default)]
pub struct GlowEventCollector {
    events: Vec<GlowEvent>,
}

impl GlowEventCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events
    pub fn events(&self) -> &[GlowEvent] {
        &self.events
    }

    /// Take the recorded events, leaving the collector empty
    pub fn take(&mut self) -> Vec<GlowEvent> {
        std::mem::take(&mut self.events)
    }

    /// Recorded entity events only
    pub fn entities(&self) -> impl Iterator<Item = &GlowEvent> {
        self.events.iter().filter(|event| event.is_entity())
    }
}

impl GlowHandler for GlowEventCollector {
    fn on_node(&mut self, node: &GlowNode, fields: GlowFieldFlags, path: &[u32]) {
        self.events.push(GlowEvent::Node {
            node: node.clone(),
            fields,
            path: path.to_vec(),
        });
    }

    fn on_parameter(&mut self, parameter: &GlowParameter, fields: GlowFieldFlags, path: &[u32]) {
        self.events.push(GlowEvent::Parameter {
            parameter: parameter.clone(),
            fields,
            path: path.to_vec(),
        });
    }

    fn on_command(&mut self, command: &GlowCommand, fields: GlowFieldFlags, path: &[u32]) {
        self.events.push(GlowEvent::Command {
            command: command.clone(),
            fields,
            path: path.to_vec(),
        });
    }

    fn on_stream_entry(&mut self, entry: &GlowStreamEntry, fields: GlowFieldFlags, path: &[u32]) {
        self.events.push(GlowEvent::StreamEntry {
            entry: entry.clone(),
            fields,
            path: path.to_vec(),
        });
    }

    fn on_matrix(&mut self, matrix: &GlowMatrix, fields: GlowFieldFlags, path: &[u32]) {
        self.events.push(GlowEvent::Matrix {
            matrix: matrix.clone(),
            fields,
            path: path.to_vec(),
        });
    }

    fn on_target(&mut self, target: &GlowSignal, fields: GlowFieldFlags, path: &[u32]) {
        self.events.push(GlowEvent::Target {
            target: *target,
            fields,
            path: path.to_vec(),
        });
    }

    fn on_source(&mut self, source: &GlowSignal, fields: GlowFieldFlags, path: &[u32]) {
        self.events.push(GlowEvent::Source {
            source: *source,
            fields,
            path: path.to_vec(),
        });
    }

    fn on_connection(&mut self, connection: &GlowConnection, fields: GlowFieldFlags, path: &[u32]) {
        self.events.push(GlowEvent::Connection {
            connection: connection.clone(),
            fields,
            path: path.to_vec(),
        });
    }

    fn on_function(&mut self, function: &GlowFunction, fields: GlowFieldFlags, path: &[u32]) {
        self.events.push(GlowEvent::Function {
            function: function.clone(),
            fields,
            path: path.to_vec(),
        });
    }

    fn on_invocation_result(
        &mut self,
        result: &GlowInvocationResult,
        fields: GlowFieldFlags,
        path: &[u32],
    ) {
        self.events.push(GlowEvent::InvocationResult {
            result: result.clone(),
            fields,
            path: path.to_vec(),
        });
    }

    fn on_unsupported(&mut self, field: &UnsupportedField, path: &[u32]) {
        self.events.push(GlowEvent::Unsupported {
            field: *field,
            path: path.to_vec(),
        });
    }

    fn on_package_received(&mut self, payload: &[u8]) {
        self.events.push(GlowEvent::PackageReceived(payload.to_vec()));
    }

    fn on_keep_alive_request(&mut self, slot: u8) {
        self.events.push(GlowEvent::KeepAliveRequest { slot });
    }

    fn on_keep_alive_response(&mut self, slot: u8) {
        self.events.push(GlowEvent::KeepAliveResponse { slot });
    }

    fn on_error(&mut self, error: &EmberError) {
        self.events.push(GlowEvent::Error(error.clone()));
    }
}
