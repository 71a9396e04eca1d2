//! Glow semantic mapper over the incremental BER reader
//!
//! The mapper follows the structural events of [`BerReader`] with a stack of
//! scopes, one per open container, and fills a single working record.
//!
//! ```text
//! Root [A-0]
//! └── RootElementCollection [A-11]
//!     └── [C-0] ── Node [A-3]
//!                  ├── [C-0] number          -> pushed onto the path
//!                  ├── [C-1] SET contents    -> record fields
//!                  └── [C-2] children        -> record delivered, then
//!                      └── ElementCollection    children are read
//! ```
//!
//! An element is delivered exactly once: when its children (or matrix
//! targets, sources, connections) start, or when it ends. Parents are
//! therefore always reported before their children. Fields or elements the
//! mapper does not know are reported through
//! [`GlowHandler::on_unsupported`] and skipped with their whole subtree.

use ember_ber::{
    BerHandler, BerItem, BerLength, BerReader, BerTag, BerTagClass, universal,
};

use crate::config::{GlowReaderConfig, PathConvention};
use crate::error::{EmberError, EmberResult};
use crate::fields::GlowFieldFlags;
use crate::handler::{GlowHandler, GlowReaderPosition, UnsupportedField};
use crate::path::GlowPath;
use crate::tags::{self, app, element};
use crate::types::{
    CommandType, ConnectionDisposition, ConnectionOperation, GlowCommand, GlowConnection,
    GlowFunction, GlowInvocationResult, GlowLabel, GlowMatrix, GlowMinMax, GlowNode,
    GlowParameter, GlowSignal, GlowStreamEntry, GlowTupleItemDescription, GlowValue,
    MatrixAddressingMode, MatrixType, ParameterAccess, ParameterType, ParametersLocation,
    StreamFormat, StringIntegerPair,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementKind {
    Node,
    Parameter,
    Matrix,
    Function,
}

impl ElementKind {
    /// Element kind and qualified flag of an element tag
    fn from_tag(tag: &BerTag) -> Option<(Self, bool)> {
        if tag.class() != BerTagClass::Application {
            return None;
        }
        match tag.number() {
            app::NODE => Some((Self::Node, false)),
            app::PARAMETER => Some((Self::Parameter, false)),
            app::MATRIX => Some((Self::Matrix, false)),
            app::FUNCTION => Some((Self::Function, false)),
            app::QUALIFIED_NODE => Some((Self::Node, true)),
            app::QUALIFIED_PARAMETER => Some((Self::Parameter, true)),
            app::QUALIFIED_MATRIX => Some((Self::Matrix, true)),
            app::QUALIFIED_FUNCTION => Some((Self::Function, true)),
            _ => None,
        }
    }

    fn contents(self) -> RecordKind {
        match self {
            Self::Node => RecordKind::NodeContents,
            Self::Parameter => RecordKind::ParameterContents,
            Self::Matrix => RecordKind::MatrixContents,
            Self::Function => RecordKind::FunctionContents,
        }
    }
}

/// `SEQUENCE OF [0] item` containers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collection {
    Elements,
    Streams,
    EnumMap,
    Labels,
    Arguments,
    Results,
    Targets,
    Sources,
    Connections,
    InvocationArguments,
    InvocationResults,
}

/// Containers made of `[n]` fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordKind {
    NodeContents,
    ParameterContents,
    MatrixContents,
    FunctionContents,
    Command,
    Invocation,
    StreamEntry,
    Target,
    Source,
    Connection,
    InvocationResult,
    StringIntegerPair,
    StreamDescription,
    Label,
    Argument,
    ResultItem,
}

impl RecordKind {
    /// Records delivered on their own when they close
    fn is_entity(self) -> bool {
        matches!(
            self,
            Self::Command
                | Self::StreamEntry
                | Self::Target
                | Self::Source
                | Self::Connection
                | Self::InvocationResult
        )
    }

    /// Field numbers run from 0 to `field_count() - 1`
    fn field_count(self) -> u32 {
        match self {
            Self::NodeContents => 6,
            Self::ParameterContents => 19,
            Self::MatrixContents => 13,
            Self::FunctionContents => 5,
            Self::Command => 3,
            Self::Connection => 4,
            Self::InvocationResult => 3,
            Self::Target | Self::Source => 1,
            Self::Invocation
            | Self::StreamEntry
            | Self::StringIntegerPair
            | Self::StreamDescription
            | Self::Label
            | Self::Argument
            | Self::ResultItem => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ElementScope {
    kind: ElementKind,
    qualified: bool,
    /// Path length when the element was entered
    path_len: usize,
    has_number: bool,
    flushed: bool,
}

/// What an open container means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Root,
    Collection(Collection),
    /// `[0]` item wrapper inside a collection
    Slot(Collection),
    Element(ElementScope),
    /// `[n]` directly inside an element
    ElementField(u32),
    Record(RecordKind),
    /// `[n]` inside a record
    Field { record: RecordKind, number: u32 },
    Skip,
}

/// The entity being read
#[derive(Debug, Default)]
enum WorkingRecord {
    #[default]
    None,
    Node(GlowNode),
    Parameter(GlowParameter),
    Command(GlowCommand),
    StreamEntry(GlowStreamEntry),
    Matrix(GlowMatrix),
    Target(GlowSignal),
    Source(GlowSignal),
    Connection(GlowConnection),
    Function(GlowFunction),
    InvocationResult(GlowInvocationResult),
}

impl WorkingRecord {
    fn for_element(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Node => Self::Node(GlowNode::default()),
            ElementKind::Parameter => Self::Parameter(GlowParameter::default()),
            ElementKind::Matrix => Self::Matrix(GlowMatrix::default()),
            ElementKind::Function => Self::Function(GlowFunction::default()),
        }
    }

    fn for_entity(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Command => Self::Command(GlowCommand::default()),
            RecordKind::StreamEntry => Self::StreamEntry(GlowStreamEntry::default()),
            RecordKind::Target => Self::Target(GlowSignal::default()),
            RecordKind::Source => Self::Source(GlowSignal::default()),
            RecordKind::Connection => Self::Connection(GlowConnection::default()),
            RecordKind::InvocationResult => Self::InvocationResult(GlowInvocationResult::default()),
            _ => Self::None,
        }
    }

    fn set_number(&mut self, number: u32) {
        match self {
            Self::Node(node) => node.number = number,
            Self::Parameter(parameter) => parameter.number = number,
            Self::Matrix(matrix) => matrix.number = number,
            Self::Function(function) => function.number = number,
            _ => {}
        }
    }

    fn position(&self) -> GlowReaderPosition {
        match self {
            Self::None => GlowReaderPosition::Tree,
            Self::Node(_) => GlowReaderPosition::NodeContents,
            Self::Parameter(_) => GlowReaderPosition::ParameterContents,
            Self::Command(_) => GlowReaderPosition::Command,
            Self::StreamEntry(_) => GlowReaderPosition::StreamEntry,
            Self::Matrix(_) => GlowReaderPosition::MatrixContents,
            Self::Target(_) => GlowReaderPosition::Target,
            Self::Source(_) => GlowReaderPosition::Source,
            Self::Connection(_) => GlowReaderPosition::Connection,
            Self::Function(_) => GlowReaderPosition::FunctionContents,
            Self::InvocationResult(_) => GlowReaderPosition::InvocationResult,
        }
    }
}

fn unknown_field(number: u32) -> EmberError {
    EmberError::InvalidData(format!("Unknown field [{}]", number))
}

fn decode_value(item: &BerItem<'_>) -> EmberResult<GlowValue> {
    GlowValue::from_ber(item.decode()?)
}

fn decode_enum<T>(item: &BerItem<'_>, from: fn(i64) -> Option<T>, name: &str) -> EmberResult<T> {
    let value = item.as_integer()?;
    from(value).ok_or_else(|| EmberError::InvalidData(format!("{} {} out of range", name, value)))
}

fn last_entry<T>(entries: &mut [T]) -> EmberResult<&mut T> {
    entries
        .last_mut()
        .ok_or_else(|| EmberError::InvalidData("Field outside its record".to_string()))
}

fn apply_node_field(node: &mut GlowNode, number: u32, item: &BerItem<'_>) -> EmberResult<GlowFieldFlags> {
    use tags::node_contents::*;

    let flag = match number {
        IDENTIFIER => {
            node.identifier = item.as_string()?;
            GlowFieldFlags::IDENTIFIER
        }
        DESCRIPTION => {
            node.description = item.as_string()?;
            GlowFieldFlags::DESCRIPTION
        }
        IS_ROOT => {
            node.is_root = item.as_boolean()?;
            GlowFieldFlags::IS_ROOT
        }
        IS_ONLINE => {
            node.is_online = item.as_boolean()?;
            GlowFieldFlags::IS_ONLINE
        }
        SCHEMA_IDENTIFIERS => {
            node.schema_identifiers = item.as_string()?;
            GlowFieldFlags::SCHEMA_IDENTIFIERS
        }
        TEMPLATE_REFERENCE => {
            node.template_reference = item.as_relative_oid()?;
            GlowFieldFlags::TEMPLATE_REFERENCE
        }
        _ => return Err(unknown_field(number)),
    };
    Ok(flag)
}

fn apply_parameter_field(
    parameter: &mut GlowParameter,
    number: u32,
    item: &BerItem<'_>,
) -> EmberResult<GlowFieldFlags> {
    use tags::parameter_contents::*;

    let flag = match number {
        IDENTIFIER => {
            parameter.identifier = item.as_string()?;
            GlowFieldFlags::IDENTIFIER
        }
        DESCRIPTION => {
            parameter.description = item.as_string()?;
            GlowFieldFlags::DESCRIPTION
        }
        VALUE => {
            parameter.value = decode_value(item)?;
            GlowFieldFlags::VALUE
        }
        MINIMUM => {
            parameter.minimum = GlowMinMax::from_ber(item.decode()?)?;
            GlowFieldFlags::MINIMUM
        }
        MAXIMUM => {
            parameter.maximum = GlowMinMax::from_ber(item.decode()?)?;
            GlowFieldFlags::MAXIMUM
        }
        ACCESS => {
            parameter.access = decode_enum(item, ParameterAccess::from_i64, "Access")?;
            GlowFieldFlags::ACCESS
        }
        FORMAT => {
            parameter.format = item.as_string()?;
            GlowFieldFlags::FORMAT
        }
        ENUMERATION => {
            parameter.enumeration = item.as_string()?;
            GlowFieldFlags::ENUMERATION
        }
        FACTOR => {
            parameter.factor = item.as_integer()?;
            GlowFieldFlags::FACTOR
        }
        IS_ONLINE => {
            parameter.is_online = item.as_boolean()?;
            GlowFieldFlags::IS_ONLINE
        }
        FORMULA => {
            parameter.formula = item.as_string()?;
            GlowFieldFlags::FORMULA
        }
        STEP => {
            parameter.step = item.as_integer()?;
            GlowFieldFlags::STEP
        }
        DEFAULT => {
            parameter.default_value = decode_value(item)?;
            GlowFieldFlags::DEFAULT
        }
        TYPE => {
            parameter.parameter_type = decode_enum(item, ParameterType::from_i64, "Parameter type")?;
            GlowFieldFlags::TYPE
        }
        STREAM_IDENTIFIER => {
            parameter.stream_identifier = item.as_integer()?;
            GlowFieldFlags::STREAM_IDENTIFIER
        }
        SCHEMA_IDENTIFIERS => {
            parameter.schema_identifiers = item.as_string()?;
            GlowFieldFlags::SCHEMA_IDENTIFIERS
        }
        TEMPLATE_REFERENCE => {
            parameter.template_reference = item.as_relative_oid()?;
            GlowFieldFlags::TEMPLATE_REFERENCE
        }
        _ => return Err(unknown_field(number)),
    };
    Ok(flag)
}

fn apply_matrix_field(matrix: &mut GlowMatrix, number: u32, item: &BerItem<'_>) -> EmberResult<GlowFieldFlags> {
    use tags::matrix_contents::*;

    let flag = match number {
        IDENTIFIER => {
            matrix.identifier = item.as_string()?;
            GlowFieldFlags::IDENTIFIER
        }
        DESCRIPTION => {
            matrix.description = item.as_string()?;
            GlowFieldFlags::DESCRIPTION
        }
        TYPE => {
            matrix.matrix_type = decode_enum(item, MatrixType::from_i64, "Matrix type")?;
            GlowFieldFlags::MATRIX_TYPE
        }
        ADDRESSING_MODE => {
            matrix.addressing_mode =
                decode_enum(item, MatrixAddressingMode::from_i64, "Addressing mode")?;
            GlowFieldFlags::ADDRESSING_MODE
        }
        TARGET_COUNT => {
            matrix.target_count = item.as_integer()?;
            GlowFieldFlags::TARGET_COUNT
        }
        SOURCE_COUNT => {
            matrix.source_count = item.as_integer()?;
            GlowFieldFlags::SOURCE_COUNT
        }
        MAXIMUM_TOTAL_CONNECTS => {
            matrix.maximum_total_connects = item.as_integer()?;
            GlowFieldFlags::MAXIMUM_TOTAL_CONNECTS
        }
        MAXIMUM_CONNECTS_PER_TARGET => {
            matrix.maximum_connects_per_target = item.as_integer()?;
            GlowFieldFlags::MAXIMUM_CONNECTS_PER_TARGET
        }
        PARAMETERS_LOCATION => {
            matrix.parameters_location = if item.tag().is_universal(universal::RELATIVE_OID) {
                ParametersLocation::BasePath(item.as_relative_oid()?)
            } else {
                ParametersLocation::Inline(item.as_integer()?)
            };
            GlowFieldFlags::PARAMETERS_LOCATION
        }
        GAIN_PARAMETER_NUMBER => {
            matrix.gain_parameter_number = item.as_integer()?;
            GlowFieldFlags::GAIN_PARAMETER_NUMBER
        }
        SCHEMA_IDENTIFIERS => {
            matrix.schema_identifiers = item.as_string()?;
            GlowFieldFlags::SCHEMA_IDENTIFIERS
        }
        TEMPLATE_REFERENCE => {
            matrix.template_reference = item.as_relative_oid()?;
            GlowFieldFlags::TEMPLATE_REFERENCE
        }
        _ => return Err(unknown_field(number)),
    };
    Ok(flag)
}

fn apply_function_field(
    function: &mut GlowFunction,
    number: u32,
    item: &BerItem<'_>,
) -> EmberResult<GlowFieldFlags> {
    use tags::function_contents::*;

    let flag = match number {
        IDENTIFIER => {
            function.identifier = item.as_string()?;
            GlowFieldFlags::IDENTIFIER
        }
        DESCRIPTION => {
            function.description = item.as_string()?;
            GlowFieldFlags::DESCRIPTION
        }
        TEMPLATE_REFERENCE => {
            function.template_reference = item.as_relative_oid()?;
            GlowFieldFlags::TEMPLATE_REFERENCE
        }
        _ => return Err(unknown_field(number)),
    };
    Ok(flag)
}

fn apply_tuple_item_field(
    description: &mut GlowTupleItemDescription,
    number: u32,
    item: &BerItem<'_>,
) -> EmberResult<()> {
    match number {
        tags::tuple_item_description::TYPE => {
            description.item_type = decode_enum(item, ParameterType::from_i64, "Item type")?
        }
        tags::tuple_item_description::NAME => description.name = item.as_string()?,
        _ => return Err(unknown_field(number)),
    }
    Ok(())
}

fn apply_connection_field(
    connection: &mut GlowConnection,
    number: u32,
    item: &BerItem<'_>,
) -> EmberResult<GlowFieldFlags> {
    use tags::connection::*;

    let flag = match number {
        TARGET => {
            connection.target = item.as_integer()?;
            GlowFieldFlags::empty()
        }
        SOURCES => {
            connection.sources = item.as_relative_oid()?;
            GlowFieldFlags::SOURCES
        }
        OPERATION => {
            connection.operation = decode_enum(item, ConnectionOperation::from_i64, "Operation")?;
            GlowFieldFlags::OPERATION
        }
        DISPOSITION => {
            connection.disposition =
                decode_enum(item, ConnectionDisposition::from_i64, "Disposition")?;
            GlowFieldFlags::DISPOSITION
        }
        _ => return Err(unknown_field(number)),
    };
    Ok(flag)
}

/// Scope stack, path and working record
#[derive(Debug)]
struct GlowMapper {
    convention: PathConvention,
    path: GlowPath,
    /// Paths to restore when qualified elements close
    saved_paths: Vec<Vec<u32>>,
    scopes: Vec<Scope>,
    record: WorkingRecord,
    fields: GlowFieldFlags,
}

impl GlowMapper {
    fn new(config: &GlowReaderConfig) -> Self {
        Self {
            convention: config.path_convention,
            path: GlowPath::new(config.max_tree_depth),
            saved_paths: Vec::new(),
            scopes: Vec::with_capacity(config.ber.max_depth),
            record: WorkingRecord::None,
            fields: GlowFieldFlags::empty(),
        }
    }

    fn reset(&mut self) {
        self.path.clear();
        self.saved_paths.clear();
        self.scopes.clear();
        self.record = WorkingRecord::None;
        self.fields = GlowFieldFlags::empty();
    }

    fn current_element(&self) -> Option<ElementScope> {
        self.scopes.iter().rev().find_map(|scope| match scope {
            Scope::Element(element) => Some(*element),
            _ => None,
        })
    }

    fn current_element_mut(&mut self) -> Option<&mut ElementScope> {
        self.scopes.iter_mut().rev().find_map(|scope| match scope {
            Scope::Element(element) => Some(element),
            _ => None,
        })
    }

    fn report<H: GlowHandler>(&mut self, tag: BerTag, handler: &mut H) {
        let field = UnsupportedField {
            position: self.record.position(),
            tag,
        };
        log::debug!(
            "Unsupported {} in {:?} at {:?}",
            tag,
            field.position,
            self.path.as_slice()
        );
        handler.on_unsupported(&field, self.path.as_slice());
    }

    fn unsupported<H: GlowHandler>(&mut self, tag: BerTag, handler: &mut H) -> Scope {
        self.report(tag, handler);
        Scope::Skip
    }

    /// Hand the working record to the handler and clear it
    fn dispatch<H: GlowHandler>(&mut self, strip_own_number: bool, handler: &mut H) {
        let record = std::mem::take(&mut self.record);
        let fields = std::mem::take(&mut self.fields);
        let full = self.path.as_slice();
        let path = if strip_own_number {
            &full[..full.len().saturating_sub(1)]
        } else {
            full
        };

        log::trace!("Glow {:?} at {:?}", record.position(), path);
        match record {
            WorkingRecord::None => {}
            WorkingRecord::Node(node) => handler.on_node(&node, fields, path),
            WorkingRecord::Parameter(parameter) => handler.on_parameter(&parameter, fields, path),
            WorkingRecord::Command(command) => handler.on_command(&command, fields, path),
            WorkingRecord::StreamEntry(entry) => handler.on_stream_entry(&entry, fields, path),
            WorkingRecord::Matrix(matrix) => handler.on_matrix(&matrix, fields, path),
            WorkingRecord::Target(target) => handler.on_target(&target, fields, path),
            WorkingRecord::Source(source) => handler.on_source(&source, fields, path),
            WorkingRecord::Connection(connection) => handler.on_connection(&connection, fields, path),
            WorkingRecord::Function(function) => handler.on_function(&function, fields, path),
            WorkingRecord::InvocationResult(result) => {
                handler.on_invocation_result(&result, fields, path)
            }
        }
    }

    /// Deliver the innermost element unless already done
    fn flush_element<H: GlowHandler>(&mut self, handler: &mut H) {
        let convention = self.convention;
        let Some(element) = self.current_element_mut() else {
            return;
        };
        if element.flushed {
            return;
        }
        element.flushed = true;
        let strip = element.has_number && convention == PathConvention::Exclusive;
        self.dispatch(strip, handler);
    }

    fn begin_element(&mut self, kind: ElementKind, qualified: bool) -> Scope {
        if qualified {
            self.saved_paths.push(self.path.as_slice().to_vec());
        }
        self.record = WorkingRecord::for_element(kind);
        self.fields = GlowFieldFlags::empty();
        Scope::Element(ElementScope {
            kind,
            qualified,
            path_len: self.path.len(),
            has_number: false,
            flushed: false,
        })
    }

    fn begin_entity(&mut self, kind: RecordKind) -> Scope {
        self.record = WorkingRecord::for_entity(kind);
        self.fields = GlowFieldFlags::empty();
        Scope::Record(kind)
    }

    fn container_entered<H: GlowHandler>(&mut self, tag: BerTag, handler: &mut H) {
        let scope = match self.scopes.last().copied() {
            None if tag.is_application(app::ROOT) => Scope::Root,
            None => self.unsupported(tag, handler),
            Some(Scope::Skip) => Scope::Skip,
            Some(Scope::Root) => {
                if tag.is_application(app::ROOT_ELEMENT_COLLECTION)
                    || tag.is_application(app::ELEMENT_COLLECTION)
                {
                    Scope::Collection(Collection::Elements)
                } else if tag.is_application(app::STREAM_COLLECTION) {
                    Scope::Collection(Collection::Streams)
                } else if tag.is_application(app::INVOCATION_RESULT) {
                    self.begin_entity(RecordKind::InvocationResult)
                } else {
                    self.unsupported(tag, handler)
                }
            }
            Some(Scope::Collection(collection)) => {
                if tag.is_context(tags::COLLECTION_ITEM) {
                    Scope::Slot(collection)
                } else {
                    self.unsupported(tag, handler)
                }
            }
            Some(Scope::Slot(collection)) => self.enter_slot(collection, tag, handler),
            Some(Scope::Element(scope)) => self.enter_element_field(scope, tag, handler),
            Some(Scope::ElementField(number)) => self.enter_element_value(number, tag, handler),
            Some(Scope::Record(record)) => {
                if tag.class() == BerTagClass::ContextSpecific && tag.number() < record.field_count() {
                    Scope::Field {
                        record,
                        number: tag.number(),
                    }
                } else {
                    self.unsupported(tag, handler)
                }
            }
            Some(Scope::Field { record, number }) => self.enter_field_value(record, number, tag, handler),
        };
        self.scopes.push(scope);
    }

    /// Item of a collection
    fn enter_slot<H: GlowHandler>(&mut self, collection: Collection, tag: BerTag, handler: &mut H) -> Scope {
        match collection {
            Collection::Elements => {
                if let Some((kind, qualified)) = ElementKind::from_tag(&tag) {
                    return self.begin_element(kind, qualified);
                }
                if tag.is_application(app::COMMAND) {
                    return self.begin_entity(RecordKind::Command);
                }
            }
            Collection::Streams if tag.is_application(app::STREAM_ENTRY) => {
                return self.begin_entity(RecordKind::StreamEntry);
            }
            Collection::Targets if tag.is_application(app::TARGET) => {
                return self.begin_entity(RecordKind::Target);
            }
            Collection::Sources if tag.is_application(app::SOURCE) => {
                return self.begin_entity(RecordKind::Source);
            }
            Collection::Connections if tag.is_application(app::CONNECTION) => {
                return self.begin_entity(RecordKind::Connection);
            }
            Collection::EnumMap if tag.is_application(app::STRING_INTEGER_PAIR) => {
                if let WorkingRecord::Parameter(parameter) = &mut self.record {
                    parameter.enum_map.push(StringIntegerPair::default());
                    return Scope::Record(RecordKind::StringIntegerPair);
                }
            }
            Collection::Labels if tag.is_application(app::LABEL) => {
                if let WorkingRecord::Matrix(matrix) = &mut self.record {
                    matrix.labels.push(GlowLabel::default());
                    return Scope::Record(RecordKind::Label);
                }
            }
            Collection::Arguments if tag.is_application(app::TUPLE_ITEM_DESCRIPTION) => {
                if let WorkingRecord::Function(function) = &mut self.record {
                    function.arguments.push(GlowTupleItemDescription::default());
                    return Scope::Record(RecordKind::Argument);
                }
            }
            Collection::Results if tag.is_application(app::TUPLE_ITEM_DESCRIPTION) => {
                if let WorkingRecord::Function(function) = &mut self.record {
                    function.result.push(GlowTupleItemDescription::default());
                    return Scope::Record(RecordKind::ResultItem);
                }
            }
            _ => {}
        }
        self.unsupported(tag, handler)
    }

    /// `[n]` directly inside an element
    fn enter_element_field<H: GlowHandler>(&mut self, scope: ElementScope, tag: BerTag, handler: &mut H) -> Scope {
        if tag.class() != BerTagClass::ContextSpecific {
            return self.unsupported(tag, handler);
        }
        match tag.number() {
            element::NUMBER | element::CONTENTS => Scope::ElementField(tag.number()),
            element::CHILDREN => {
                self.flush_element(handler);
                Scope::ElementField(tag.number())
            }
            element::TARGETS | element::SOURCES | element::CONNECTIONS
                if scope.kind == ElementKind::Matrix =>
            {
                self.flush_element(handler);
                Scope::ElementField(tag.number())
            }
            _ => self.unsupported(tag, handler),
        }
    }

    /// Container inside an element's `[n]`
    fn enter_element_value<H: GlowHandler>(&mut self, number: u32, tag: BerTag, handler: &mut H) -> Scope {
        let sequence = tag.is_universal(universal::SEQUENCE);
        match number {
            element::CONTENTS if tag.is_universal(universal::SET) => match self.current_element() {
                Some(element) if !element.flushed => Scope::Record(element.kind.contents()),
                _ => self.unsupported(tag, handler),
            },
            element::CHILDREN if tag.is_application(app::ELEMENT_COLLECTION) => {
                Scope::Collection(Collection::Elements)
            }
            element::TARGETS if sequence => Scope::Collection(Collection::Targets),
            element::SOURCES if sequence => Scope::Collection(Collection::Sources),
            element::CONNECTIONS if sequence => Scope::Collection(Collection::Connections),
            _ => self.unsupported(tag, handler),
        }
    }

    /// Container inside a record's `[n]`
    fn enter_field_value<H: GlowHandler>(
        &mut self,
        record: RecordKind,
        number: u32,
        tag: BerTag,
        handler: &mut H,
    ) -> Scope {
        let sequence = tag.is_universal(universal::SEQUENCE);
        let (scope, flag) = match (record, number) {
            (RecordKind::ParameterContents, tags::parameter_contents::ENUM_MAP)
                if tag.is_application(app::STRING_INTEGER_COLLECTION) =>
            {
                (Scope::Collection(Collection::EnumMap), GlowFieldFlags::ENUM_MAP)
            }
            (RecordKind::ParameterContents, tags::parameter_contents::STREAM_DESCRIPTOR)
                if tag.is_application(app::STREAM_DESCRIPTION) =>
            {
                (
                    Scope::Record(RecordKind::StreamDescription),
                    GlowFieldFlags::STREAM_DESCRIPTOR,
                )
            }
            (RecordKind::MatrixContents, tags::matrix_contents::LABELS) if sequence => {
                (Scope::Collection(Collection::Labels), GlowFieldFlags::LABELS)
            }
            (RecordKind::FunctionContents, tags::function_contents::ARGUMENTS) if sequence => {
                (Scope::Collection(Collection::Arguments), GlowFieldFlags::ARGUMENTS)
            }
            (RecordKind::FunctionContents, tags::function_contents::RESULT) if sequence => {
                (Scope::Collection(Collection::Results), GlowFieldFlags::RESULT)
            }
            (RecordKind::Command, tags::command::INVOCATION)
                if tag.is_application(app::INVOCATION) =>
            {
                (Scope::Record(RecordKind::Invocation), GlowFieldFlags::INVOCATION)
            }
            (RecordKind::Invocation, tags::invocation::ARGUMENTS) if sequence => (
                Scope::Collection(Collection::InvocationArguments),
                GlowFieldFlags::empty(),
            ),
            (RecordKind::InvocationResult, tags::invocation_result::RESULT) if sequence => {
                (Scope::Collection(Collection::InvocationResults), GlowFieldFlags::RESULT)
            }
            _ => return self.unsupported(tag, handler),
        };
        self.fields.insert(flag);
        scope
    }

    fn item_ready<H: GlowHandler>(&mut self, item: &BerItem<'_>, handler: &mut H) -> EmberResult<()> {
        match self.scopes.last().copied() {
            Some(Scope::Skip) => {}
            Some(Scope::ElementField(element::NUMBER)) => self.read_element_number(item, handler)?,
            Some(Scope::Field { record, number }) => match self.apply_field(record, number, item) {
                Ok(flag) => self.fields.insert(flag),
                Err(e) => {
                    log::debug!("Skipping field [{}] of {:?}: {}", number, record, e);
                    self.report(BerTag::context_specific(true, number), handler);
                }
            },
            Some(Scope::Slot(
                collection @ (Collection::InvocationArguments | Collection::InvocationResults),
            )) => match decode_value(item) {
                Ok(value) => self.push_tuple_value(collection, value),
                Err(_) => self.report(item.tag(), handler),
            },
            _ => self.report(item.tag(), handler),
        }
        Ok(())
    }

    fn read_element_number<H: GlowHandler>(&mut self, item: &BerItem<'_>, handler: &mut H) -> EmberResult<()> {
        let Some(scope) = self.current_element() else {
            self.report(item.tag(), handler);
            return Ok(());
        };
        if scope.has_number {
            self.report(item.tag(), handler);
            return Ok(());
        }

        let number = if scope.qualified {
            match item.as_relative_oid() {
                Ok(path) => {
                    self.path.replace(&path)?;
                    path.last().copied()
                }
                Err(_) => {
                    self.report(item.tag(), handler);
                    return Ok(());
                }
            }
        } else {
            match item.as_integer().map(u32::try_from) {
                Ok(Ok(number)) => {
                    self.path.push(number)?;
                    Some(number)
                }
                _ => {
                    self.report(item.tag(), handler);
                    return Ok(());
                }
            }
        };

        if let Some(number) = number {
            self.record.set_number(number);
            if let Some(element) = self.current_element_mut() {
                element.has_number = true;
            }
        }
        Ok(())
    }

    fn push_tuple_value(&mut self, collection: Collection, value: GlowValue) {
        match (collection, &mut self.record) {
            (Collection::InvocationArguments, WorkingRecord::Command(command)) => {
                command.invocation.arguments.push(value)
            }
            (Collection::InvocationResults, WorkingRecord::InvocationResult(result)) => {
                result.result.push(value)
            }
            _ => {}
        }
    }

    /// Decode a primitive field into the working record
    ///
    /// Returns the presence flag to set, which is empty for mandatory fields
    /// and for fields of nested records.
    fn apply_field(&mut self, record: RecordKind, number: u32, item: &BerItem<'_>) -> EmberResult<GlowFieldFlags> {
        let none = GlowFieldFlags::empty();

        match (record, &mut self.record) {
            (RecordKind::NodeContents, WorkingRecord::Node(node)) => apply_node_field(node, number, item),
            (RecordKind::ParameterContents, WorkingRecord::Parameter(parameter)) => {
                apply_parameter_field(parameter, number, item)
            }
            (RecordKind::StringIntegerPair, WorkingRecord::Parameter(parameter)) => {
                let pair = last_entry(&mut parameter.enum_map)?;
                match number {
                    tags::string_integer_pair::ENTRY_STRING => pair.name = item.as_string()?,
                    _ => pair.value = item.as_integer()?,
                }
                Ok(none)
            }
            (RecordKind::StreamDescription, WorkingRecord::Parameter(parameter)) => {
                let descriptor = &mut parameter.stream_descriptor;
                match number {
                    tags::stream_description::FORMAT => {
                        descriptor.format = decode_enum(item, StreamFormat::from_i64, "Stream format")?
                    }
                    _ => descriptor.offset = item.as_integer()?,
                }
                Ok(none)
            }
            (RecordKind::MatrixContents, WorkingRecord::Matrix(matrix)) => apply_matrix_field(matrix, number, item),
            (RecordKind::Label, WorkingRecord::Matrix(matrix)) => {
                let label = last_entry(&mut matrix.labels)?;
                match number {
                    tags::label::BASE_PATH => label.base_path = item.as_relative_oid()?,
                    _ => label.description = item.as_string()?,
                }
                Ok(none)
            }
            (RecordKind::FunctionContents, WorkingRecord::Function(function)) => {
                apply_function_field(function, number, item)
            }
            (RecordKind::Argument, WorkingRecord::Function(function)) => {
                apply_tuple_item_field(last_entry(&mut function.arguments)?, number, item)?;
                Ok(none)
            }
            (RecordKind::ResultItem, WorkingRecord::Function(function)) => {
                apply_tuple_item_field(last_entry(&mut function.result)?, number, item)?;
                Ok(none)
            }
            (RecordKind::Command, WorkingRecord::Command(command)) => match number {
                tags::command::NUMBER => {
                    command.number = decode_enum(item, CommandType::from_i64, "Command")?;
                    Ok(none)
                }
                tags::command::DIR_FIELD_MASK => {
                    command.dir_field_mask = item.as_integer()?;
                    Ok(GlowFieldFlags::DIR_FIELD_MASK)
                }
                _ => Err(unknown_field(number)),
            },
            (RecordKind::Invocation, WorkingRecord::Command(command)) => match number {
                tags::invocation::INVOCATION_ID => {
                    command.invocation.invocation_id = item.as_integer()?;
                    Ok(none)
                }
                _ => Err(unknown_field(number)),
            },
            (RecordKind::StreamEntry, WorkingRecord::StreamEntry(entry)) => match number {
                tags::stream_entry::STREAM_IDENTIFIER => {
                    entry.stream_identifier = item.as_integer()?;
                    Ok(GlowFieldFlags::STREAM_IDENTIFIER)
                }
                _ => {
                    entry.value = decode_value(item)?;
                    Ok(GlowFieldFlags::VALUE)
                }
            },
            (RecordKind::Target, WorkingRecord::Target(signal))
            | (RecordKind::Source, WorkingRecord::Source(signal)) => {
                signal.number = item.as_integer()?;
                Ok(none)
            }
            (RecordKind::Connection, WorkingRecord::Connection(connection)) => {
                apply_connection_field(connection, number, item)
            }
            (RecordKind::InvocationResult, WorkingRecord::InvocationResult(result)) => match number {
                tags::invocation_result::INVOCATION_ID => {
                    result.invocation_id = item.as_integer()?;
                    Ok(none)
                }
                tags::invocation_result::SUCCESS => {
                    result.success = item.as_boolean()?;
                    Ok(GlowFieldFlags::SUCCESS)
                }
                _ => Err(unknown_field(number)),
            },
            _ => Err(EmberError::InvalidData(format!(
                "Field [{}] of {:?} outside its record",
                number, record
            ))),
        }
    }

    fn container_left<H: GlowHandler>(&mut self, handler: &mut H) -> EmberResult<()> {
        match self.scopes.pop() {
            Some(Scope::Element(scope)) => {
                if !scope.flushed {
                    let strip = scope.has_number && self.convention == PathConvention::Exclusive;
                    self.dispatch(strip, handler);
                }
                if scope.qualified {
                    if let Some(saved) = self.saved_paths.pop() {
                        self.path.replace(&saved)?;
                    }
                } else {
                    self.path.truncate(scope.path_len);
                }
            }
            Some(Scope::Record(kind)) if kind.is_entity() => self.dispatch(false, handler),
            _ => {}
        }
        Ok(())
    }
}

/// Binds the mapper and the application handler for one `read_bytes` call
struct Dispatcher<'a, H> {
    mapper: &'a mut GlowMapper,
    handler: &'a mut H,
}

impl<H: GlowHandler> BerHandler for Dispatcher<'_, H> {
    fn on_container_entered(&mut self, tag: BerTag, _length: BerLength) -> EmberResult<()> {
        self.mapper.container_entered(tag, &mut *self.handler);
        Ok(())
    }

    fn on_item_ready(&mut self, item: &BerItem<'_>) -> EmberResult<()> {
        self.mapper.item_ready(item, &mut *self.handler)
    }

    fn on_container_left(&mut self, _tag: BerTag) -> EmberResult<()> {
        self.mapper.container_left(&mut *self.handler)
    }
}

/// Glow reader for unframed BER data
///
/// Feed bytes with [`read_bytes`](Self::read_bytes) in any chunking; the
/// handler is called synchronously as entities complete.
///
/// # Error Handling
/// Structural errors (malformed BER, path or container depth exceeded) are
/// returned and stop the reader until [`reset`](Self::reset). Unknown or
/// malformed fields never stop it; they go to
/// [`GlowHandler::on_unsupported`].
///
/// # Usage Example
///
/// ```rust
/// use ember_glow::{GlowEventCollector, NonFramingGlowReader};
///
/// let mut reader = NonFramingGlowReader::new(GlowEventCollector::new());
/// // Root { RootElementCollection { [0] Node { [0] 1 } } }
/// let bytes = [
///     0x60, 0x0B, 0x6B, 0x09, 0xA0, 0x07, 0x63, 0x05, 0xA0, 0x03, 0x02, 0x01, 0x01,
/// ];
/// reader.read_bytes(&bytes).unwrap();
/// assert_eq!(reader.handler().events()[0].path(), Some(&[1u32][..]));
/// ```
#[derive(Debug)]
pub struct NonFramingGlowReader<H> {
    config: GlowReaderConfig,
    ber: BerReader,
    mapper: GlowMapper,
    handler: H,
}

impl<H: GlowHandler> NonFramingGlowReader<H> {
    /// Create a reader with the default configuration
    pub fn new(handler: H) -> Self {
        Self::with_config(handler, GlowReaderConfig::default())
    }

    /// Create a reader with a custom configuration
    pub fn with_config(handler: H, config: GlowReaderConfig) -> Self {
        Self {
            config,
            ber: BerReader::with_config(config.ber),
            mapper: GlowMapper::new(&config),
            handler,
        }
    }

    /// Feed unframed BER bytes
    ///
    /// # Errors
    /// Returns the structural error that faulted the reader, or
    /// `ReaderFaulted` for calls after it.
    pub fn read_bytes(&mut self, bytes: &[u8]) -> EmberResult<()> {
        let mut dispatcher = Dispatcher {
            mapper: &mut self.mapper,
            handler: &mut self.handler,
        };
        self.ber.read_bytes(bytes, &mut dispatcher)
    }

    /// Decode one complete message from a fresh state
    ///
    /// Errors, including a message ending inside an open container, are
    /// passed to [`GlowHandler::on_error`]. Package notification belongs to
    /// the framed reader.
    pub fn read_message(&mut self, payload: &[u8]) {
        self.reset();

        if let Err(e) = self.read_bytes(payload) {
            self.handler.on_error(&e);
        } else if !self.ber.is_idle() {
            log::warn!(
                "Glow message of {} bytes ends inside {} open containers",
                payload.len(),
                self.ber.depth()
            );
            self.handler.on_error(&EmberError::BerDecoding(
                "Message ends inside an open container".to_string(),
            ));
        }
    }

    /// Clear all decoding state; the handler is kept
    pub fn reset(&mut self) {
        self.ber.reset();
        self.mapper.reset();
    }

    /// Check if the reader sits between two top-level values
    pub fn is_idle(&self) -> bool {
        self.ber.is_idle()
    }

    /// Check if the reader stopped on a structural error
    pub fn is_faulted(&self) -> bool {
        self.ber.is_faulted()
    }

    /// Path of the element currently being read
    pub fn path(&self) -> &[u32] {
        self.mapper.path.as_slice()
    }

    /// Reader configuration
    pub fn config(&self) -> &GlowReaderConfig {
        &self.config
    }

    /// Get the handler
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Get the handler mutably
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Give back the handler
    pub fn into_handler(self) -> H {
        self.handler
    }
}
