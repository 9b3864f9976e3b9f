//! Streaming XML→JSON Translator (spec §4.7)
//!
//! Consumes a compiled [`TranslationModel`] and an instance XML document and
//! emits a tree of JSON objects plus a `@context` extension map. Per-call
//! state (`stack`, `text_buffer`, `working_bindings`, `used_uris`,
//! `metadata_ids`, `objects_awaiting_metadata`) is allocated fresh for each
//! call, so one [`Translator`] may process many documents sequentially and
//! many `Translator`s may run in parallel against the same shared, immutable
//! model (spec §5) — nothing here is shared mutable state.
//!
//! Grounded in spirit (not code) on the teacher's `converters::base`
//! (`ElementData`/`ContentItem`, array-promotion on repeated keys), adapted
//! from a generic, pluggable XML<->JSON convention into the single
//! model-driven convention this spec defines.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::model::{is_structures_namespace, TranslationModel};
use crate::namespaces::{NamespaceBindings, QName};
use crate::schema::builtins::{self, CoercionClass};

const XML_NAMESPACE: &str = crate::XML_NAMESPACE;
const XSI_NAMESPACE: &str = crate::XSI_NAMESPACE;

/// A node of the intermediate translation tree
///
/// Objects are reference-counted and interior-mutable so that the object
/// carrying a `structures:metadata` placeholder keeps a stable identity
/// across augmentation flattening and add-or-collect array promotion: the
/// end-of-document metadata pass mutates it in place, wherever it has
/// ended up in the tree, rather than needing to re-find it.
#[derive(Debug, Clone)]
enum Node {
    Object(ObjRef),
    Array(Vec<Node>),
    Scalar(Value),
}

type ObjRef = Rc<RefCell<IndexMap<String, Node>>>;

fn new_obj() -> ObjRef {
    Rc::new(RefCell::new(IndexMap::new()))
}

/// Insert `value` under `key`, preserving input-document order for repeat
/// occurrences (spec §5's ordering guarantee, §8 invariant 6): absent ->
/// insert; present and not an array -> promote to `[old, new]`; present and
/// an array -> append.
fn add_or_collect(map: &mut IndexMap<String, Node>, key: String, value: Node) {
    match map.entry(key) {
        indexmap::map::Entry::Occupied(mut e) => {
            let existing = e.get_mut();
            if let Node::Array(arr) = existing {
                arr.push(value);
            } else {
                let old = std::mem::replace(existing, Node::Array(Vec::new()));
                if let Node::Array(arr) = existing {
                    arr.push(old);
                    arr.push(value);
                }
            }
        }
        indexmap::map::Entry::Vacant(e) => {
            e.insert(value);
        }
    }
}

fn freeze(node: &Node) -> Value {
    match node {
        Node::Scalar(v) => v.clone(),
        Node::Array(items) => Value::Array(items.iter().map(freeze).collect()),
        Node::Object(obj) => {
            let mut out = Map::new();
            for (k, v) in obj.borrow().iter() {
                out.insert(k.clone(), freeze(v));
            }
            Value::Object(out)
        }
    }
}

struct Frame {
    object: ObjRef,
    local_name: String,
    component_iri: String,
    key: String,
    text_buffer: String,
    awaiting_metadata: bool,
    metadata_tokens: Vec<String>,
    /// Keys written into `object` by an attribute rather than a child element.
    /// Augmentation flattening drops these (spec §9 open question 3: baseline is drop).
    attribute_keys: HashSet<String>,
}

/// Result bit flags (spec §4.7 `result_flags`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultFlags {
    /// Set if any observed namespace was not in the model's context
    pub extended: bool,
}

/// The output of one [`Translator::translate`] call
#[derive(Debug, Clone)]
pub struct TranslationOutput {
    /// The translated message body
    pub data: Value,
    /// Extra prefix -> namespace-URI pairs observed in the input but not
    /// present in the model's context (spec §4.7)
    pub context_extension: Vec<(String, String)>,
    /// The document element's component IRI, if any element was seen
    pub message_format_id: Option<String>,
    /// Non-fatal result flags
    pub flags: ResultFlags,
}

/// A streaming XML instance document to linked-JSON converter
///
/// Holds only a reference to an immutable [`TranslationModel`]; all
/// per-document state lives on the stack of [`Translator::translate`].
pub struct Translator<'m> {
    model: &'m TranslationModel,
    limits: Limits,
}

impl<'m> Translator<'m> {
    /// A new translator bound to `model`, with default resource limits
    pub fn new(model: &'m TranslationModel) -> Self {
        Self {
            model,
            limits: Limits::default(),
        }
    }

    /// Use stricter or more permissive resource limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Translate one instance XML document into JSON data plus a context
    /// extension map (spec §4.7)
    pub fn translate(&self, xml: &str) -> Result<TranslationOutput> {
        self.limits.check_xml_size(xml.len())?;

        let mut working_bindings = NamespaceBindings::new();
        for (prefix, uri) in &self.model.context_bindings {
            working_bindings.assign(uri.clone(), prefix.clone());
        }

        let mut used_uris: IndexSet<String> = IndexSet::new();
        let mut metadata_ids: HashMap<String, String> = HashMap::new();
        let mut awaiting_metadata: Vec<(ObjRef, Vec<String>)> = Vec::new();
        let mut stack: Vec<Frame> = Vec::new();
        let mut root: Option<Node> = None;
        let mut message_format_id: Option<String> = None;
        let mut depth: usize = 0;

        let mut reader = NsReader::from_str(xml);
        let mut buf = Vec::new();

        loop {
            let (ns_result, event) = reader
                .read_resolved_event_into(&mut buf)
                .map_err(Error::from)?;

            match event {
                Event::Start(ref e) => {
                    depth += 1;
                    self.limits.check_xml_depth(depth)?;
                    self.handle_start(
                        &reader,
                        e,
                        ns_result,
                        &mut working_bindings,
                        &mut used_uris,
                        &mut metadata_ids,
                        &mut stack,
                        &mut message_format_id,
                    )?;
                }
                Event::Empty(ref e) => {
                    depth += 1;
                    self.limits.check_xml_depth(depth)?;
                    self.handle_start(
                        &reader,
                        e,
                        ns_result,
                        &mut working_bindings,
                        &mut used_uris,
                        &mut metadata_ids,
                        &mut stack,
                        &mut message_format_id,
                    )?;
                    depth -= 1;
                    self.handle_end(&mut stack, &mut awaiting_metadata, &mut root)?;
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    self.handle_end(&mut stack, &mut awaiting_metadata, &mut root)?;
                }
                Event::Text(ref t) => {
                    if let Some(frame) = stack.last_mut() {
                        let text = t.unescape().map_err(Error::from)?;
                        frame.text_buffer.push_str(&text);
                    }
                }
                Event::CData(ref t) => {
                    if let Some(frame) = stack.last_mut() {
                        let text = String::from_utf8_lossy(t.as_ref()).into_owned();
                        frame.text_buffer.push_str(&text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        self.resolve_metadata(&awaiting_metadata, &metadata_ids);

        let data = match &root {
            Some(node) => freeze(node),
            None => Value::Object(Map::new()),
        };

        let mut context_extension = Vec::new();
        let mut extended = false;
        for uri in &used_uris {
            if self
                .model
                .context_bindings
                .iter()
                .any(|(_, bound_uri)| bound_uri == uri)
            {
                continue;
            }
            let prefix = working_bindings.prefix_of(uri).unwrap_or("").to_string();
            context_extension.push((prefix, uri.clone()));
            extended = true;
        }

        Ok(TranslationOutput {
            data,
            context_extension,
            message_format_id,
            flags: ResultFlags { extended },
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_start(
        &self,
        reader: &NsReader<&[u8]>,
        e: &quick_xml::events::BytesStart,
        ns_result: ResolveResult,
        working_bindings: &mut NamespaceBindings,
        used_uris: &mut IndexSet<String>,
        metadata_ids: &mut HashMap<String, String>,
        stack: &mut Vec<Frame>,
        message_format_id: &mut Option<String>,
    ) -> Result<()> {
        // Pass 1: absorb this element's own namespace declarations before
        // resolving anything against `working_bindings` (spec: "extended on
        // the fly by startPrefixMapping events", which in real SAX precede
        // the element-start callback).
        for attr in e.attributes() {
            let attr = attr.map_err(Error::from)?;
            let raw_key = attr.key.as_ref();
            if raw_key == b"xmlns" {
                let uri = attr.unescape_value().map_err(Error::from)?.into_owned();
                working_bindings.assign(uri, String::new());
            } else if let Some(prefix) = raw_key.strip_prefix(b"xmlns:") {
                let uri = attr.unescape_value().map_err(Error::from)?.into_owned();
                working_bindings.assign(uri, String::from_utf8_lossy(prefix).into_owned());
            }
        }

        let namespace_uri: Option<String> = match ns_result {
            ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
            ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
        };
        let local_name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

        if let Some(ns) = &namespace_uri {
            used_uris.insert(ns.clone());
        }

        let prefix = match &namespace_uri {
            None => String::new(),
            Some(ns) => match working_bindings.prefix_of(ns) {
                Some(p) => p.to_string(),
                None => working_bindings.assign(ns.clone(), "ns".to_string()),
            },
        };

        let key = if prefix.is_empty() {
            local_name.clone()
        } else {
            format!("{}:{}", prefix, local_name)
        };
        let component_iri = match &namespace_uri {
            Some(ns) => QName::namespaced(ns.clone(), local_name.clone()).component_iri(),
            None => local_name.clone(),
        };

        if stack.is_empty() {
            *message_format_id = Some(component_iri.clone());
        }

        let object = new_obj();
        stack.push(Frame {
            object: object.clone(),
            local_name,
            component_iri,
            key,
            text_buffer: String::new(),
            awaiting_metadata: false,
            metadata_tokens: Vec::new(),
            attribute_keys: HashSet::new(),
        });

        // Pass 2: ordinary attribute handling.
        for attr in e.attributes() {
            let attr = attr.map_err(Error::from)?;
            let raw_key = attr.key.as_ref();
            if raw_key == b"xmlns" || raw_key.starts_with(b"xmlns:") {
                continue;
            }

            let (attr_ns_result, attr_local_qname) = reader.resolve_attribute(attr.key);
            let attr_local =
                String::from_utf8_lossy(attr_local_qname.local_name().as_ref()).into_owned();
            let attr_ns: Option<String> = match attr_ns_result {
                ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
                ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
            };
            let value = attr.unescape_value().map_err(Error::from)?.into_owned();

            let frame = stack.last_mut().expect("frame just pushed");

            match attr_ns.as_deref() {
                Some(ns) if ns == XML_NAMESPACE && attr_local == "base" => {
                    frame
                        .object
                        .borrow_mut()
                        .insert("@base".to_string(), Node::Scalar(Value::String(value)));
                    frame.attribute_keys.insert("@base".to_string());
                }
                Some(ns) if ns == XML_NAMESPACE && (attr_local == "lang" || attr_local == "space") => {
                    // reserved for future extension; no-op in baseline (spec §9 open question 1)
                }
                Some(ns) if is_structures_namespace(ns) => {
                    used_uris.insert(ns.to_string());
                    match attr_local.as_str() {
                        "id" | "ref" | "uri" => {
                            let id_value = if attr_local == "uri" {
                                value.clone()
                            } else {
                                format!("#{}", value)
                            };
                            frame
                                .object
                                .borrow_mut()
                                .insert("@id".to_string(), Node::Scalar(Value::String(id_value)));
                            frame.attribute_keys.insert("@id".to_string());
                            if frame.local_name.ends_with("Metadata") {
                                metadata_ids.insert(value.clone(), frame.key.clone());
                            }
                        }
                        "metadata" => {
                            for token in value.split_whitespace() {
                                let hashed = if token.starts_with('#') {
                                    token.to_string()
                                } else {
                                    format!("#{}", token)
                                };
                                frame.metadata_tokens.push(hashed);
                            }
                            frame.awaiting_metadata = true;
                        }
                        _ => {}
                    }
                }
                Some(ns) if ns == XSI_NAMESPACE => {
                    // xsi:type, xsi:nil, ... ignored
                }
                _ => {
                    let attr_prefix = match &attr_ns {
                        Some(ns) if !ns.is_empty() => match working_bindings.prefix_of(ns) {
                            Some(p) => p.to_string(),
                            None => working_bindings.assign(ns.clone(), "ns".to_string()),
                        },
                        _ => String::new(),
                    };
                    let tkey = if attr_prefix.is_empty() {
                        attr_local.clone()
                    } else {
                        format!("{}:{}", attr_prefix, attr_local)
                    };
                    let component = match &attr_ns {
                        Some(ns) if !ns.is_empty() => {
                            QName::namespaced(ns.clone(), attr_local.clone()).component_iri()
                        }
                        _ => attr_local.clone(),
                    };
                    let type_token = self.model.attribute_type(&component).unwrap_or("string");
                    let coerced = coerce(&value, type_token);
                    frame.attribute_keys.insert(tkey.clone());
                    add_or_collect(&mut frame.object.borrow_mut(), tkey, Node::Scalar(coerced));
                    if let Some(ns) = &attr_ns {
                        if !ns.is_empty() {
                            used_uris.insert(ns.clone());
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn handle_end(
        &self,
        stack: &mut Vec<Frame>,
        awaiting_metadata: &mut Vec<(ObjRef, Vec<String>)>,
        root: &mut Option<Node>,
    ) -> Result<()> {
        let frame = stack
            .pop()
            .ok_or_else(|| Error::Xml("unbalanced end tag".to_string()))?;

        let upward = match self.model.simple_element_type(&frame.component_iri) {
            Some(token) => {
                let text = frame.text_buffer.trim();
                let val = coerce(text, token);
                let has_other_keys = !frame.object.borrow().is_empty();
                if has_other_keys {
                    add_or_collect(
                        &mut frame.object.borrow_mut(),
                        "rdf:value".to_string(),
                        Node::Scalar(val),
                    );
                    Node::Object(frame.object.clone())
                } else {
                    Node::Scalar(val)
                }
            }
            None => Node::Object(frame.object.clone()),
        };

        if frame.awaiting_metadata {
            if let Node::Object(obj) = &upward {
                awaiting_metadata.push((obj.clone(), frame.metadata_tokens.clone()));
            }
        }

        match stack.last_mut() {
            None => *root = Some(upward),
            Some(parent) => {
                if frame.local_name.ends_with("Augmentation") {
                    if let Node::Object(obj) = &upward {
                        let entries: Vec<(String, Node)> = obj
                            .borrow()
                            .iter()
                            .filter(|(k, _)| !frame.attribute_keys.contains(*k))
                            .map(|(k, v)| (k.clone(), v.clone()))
                            .collect();
                        for (k, v) in entries {
                            add_or_collect(&mut parent.object.borrow_mut(), k, v);
                        }
                    } else {
                        add_or_collect(&mut parent.object.borrow_mut(), frame.key.clone(), upward);
                    }
                } else {
                    add_or_collect(&mut parent.object.borrow_mut(), frame.key.clone(), upward);
                }
            }
        }

        Ok(())
    }

    fn resolve_metadata(
        &self,
        awaiting_metadata: &[(ObjRef, Vec<String>)],
        metadata_ids: &HashMap<String, String>,
    ) {
        for (obj, tokens) in awaiting_metadata {
            for token in tokens {
                let raw = token.strip_prefix('#').unwrap_or(token);
                if let Some(key) = metadata_ids.get(raw) {
                    let mut meta = IndexMap::new();
                    meta.insert("@id".to_string(), Node::Scalar(Value::String(token.clone())));
                    add_or_collect(
                        &mut obj.borrow_mut(),
                        key.clone(),
                        Node::Object(Rc::new(RefCell::new(meta))),
                    );
                }
            }
        }
    }
}

/// `coerce(text, type_token)` — spec §4.7
///
/// Unknown tokens fall back to a string literal; `list/<item>` splits on
/// whitespace and recurses, collapsing a single token to a scalar (spec §8
/// invariant 8).
pub fn coerce(text: &str, type_token: &str) -> Value {
    if let Some(item_token) = type_token.strip_prefix("list/") {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        return if tokens.len() == 1 {
            coerce(tokens[0], item_token)
        } else {
            Value::Array(tokens.into_iter().map(|t| coerce(t, item_token)).collect())
        };
    }

    match builtins::coercion_class(type_token) {
        CoercionClass::Boolean => coerce_boolean(text),
        CoercionClass::Double | CoercionClass::Float => coerce_float(text),
        CoercionClass::Decimal if type_token == "decimal" => coerce_decimal(text),
        CoercionClass::Decimal => coerce_integer(text),
        CoercionClass::String => Value::String(text.to_string()),
    }
}

fn coerce_boolean(text: &str) -> Value {
    match text.trim() {
        "true" | "1" => Value::Bool(true),
        "false" | "0" => Value::Bool(false),
        other => Value::String(other.to_string()),
    }
}

fn coerce_float(text: &str) -> Value {
    match text.trim().parse::<f64>() {
        Ok(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(text.to_string())),
        Err(_) => Value::String(text.to_string()),
    }
}

fn coerce_decimal(text: &str) -> Value {
    let trimmed = text.trim();
    match Decimal::from_str(trimmed) {
        Ok(d) => {
            let canonical = d.to_string();
            match serde_json::Number::from_str(&canonical) {
                Ok(n) => Value::Number(n),
                Err(_) => Value::String(canonical),
            }
        }
        Err(_) => Value::String(trimmed.to_string()),
    }
}

fn coerce_integer(text: &str) -> Value {
    let trimmed = text.trim();
    match normalize_integer_text(trimmed) {
        Some(norm) => match serde_json::Number::from_str(&norm) {
            Ok(n) => Value::Number(n),
            Err(_) => Value::String(trimmed.to_string()),
        },
        None => Value::String(trimmed.to_string()),
    }
}

/// Normalize XSD integer lexical text (optional sign, optional leading
/// zeros) to the JSON number grammar (no leading `+`, no extra leading
/// zeros).
fn normalize_integer_text(text: &str) -> Option<String> {
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.strip_prefix('+').unwrap_or(text)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let trimmed = digits.trim_start_matches('0');
    let normalized = if trimmed.is_empty() { "0" } else { trimmed };
    if normalized == "0" {
        Some("0".to_string())
    } else {
        Some(format!("{}{}", sign, normalized))
    }
}
