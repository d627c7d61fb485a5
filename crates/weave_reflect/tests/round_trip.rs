use std::any::Any;
use std::borrow::Cow;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use weave_reflect::archive::{DocumentReader, DocumentWriter, Node, NodeKind, ParseError, Scalar};
use weave_reflect::info::TypeInfo;
use weave_reflect::registry::{BitMaskBuilder, EnumBuilder, EnumValue, GetTypeInfo, StructBuilder};
use weave_reflect::traverse::{CloneDriver, ReadDriver, TraverseConfig, WriteDriver};
use weave_reflect::traverse::{from_document, from_json, to_document};
use weave_reflect::{Presence, ReflectError, TypeRegistry, Variant};

// -----------------------------------------------------------------------------
// Fixtures

#[derive(Debug, Default, Clone, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

impl GetTypeInfo for Point {
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed("Point")
    }

    fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
        StructBuilder::<Self>::new(registry)
            .field("x", |p| &p.x, |p| &mut p.x)
            .field("y", |p| &p.y, |p| &mut p.y)
            .build()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[repr(i32)]
enum Color {
    #[default]
    Red = 0,
    Green = 1,
    /// Has no symbolic form.
    Blue = 2,
}

impl EnumValue for Color {
    type Repr = i32;

    fn to_repr(self) -> i32 {
        self as i32
    }

    fn from_repr(repr: i32) -> Option<Self> {
        match repr {
            0 => Some(Self::Red),
            1 => Some(Self::Green),
            2 => Some(Self::Blue),
            _ => None,
        }
    }
}

impl GetTypeInfo for Color {
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed("Color")
    }

    fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
        EnumBuilder::<Self>::new(registry)
            .variant("Red", Color::Red)
            .variant("Green", Color::Green)
            .build()
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Layers: u32 {
        const GROUND = 1;
        const WATER = 2;
        const AIR = 4;
    }
}

impl Default for Layers {
    fn default() -> Self {
        Self::empty()
    }
}

impl GetTypeInfo for Layers {
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed("Layers")
    }

    fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
        BitMaskBuilder::<Self>::from_flags(registry).build()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Entity {
    id: u32,
}

impl GetTypeInfo for Entity {
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed("Entity")
    }

    fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
        StructBuilder::<Self>::new(registry)
            .field("id", |e| &e.id, |e| &mut e.id)
            .build()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Actor {
    entity: Entity,
    name: String,
    position: Point,
    color: Color,
    layers: Layers,
    tags: Vec<String>,
    scores: BTreeMap<String, f64>,
    history: VecDeque<(u8, bool)>,
    home: Rc<Point>,
    target: Option<Point>,
    slots: [u16; 3],
    payload: Variant,
}

impl GetTypeInfo for Actor {
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed("Actor")
    }

    fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
        StructBuilder::<Self>::new(registry)
            .parent(|a| &a.entity, |a| &mut a.entity)
            .field("name", |a| &a.name, |a| &mut a.name)
            .field("position", |a| &a.position, |a| &mut a.position)
            .field("color", |a| &a.color, |a| &mut a.color)
            .field("layers", |a| &a.layers, |a| &mut a.layers)
            .field("tags", |a| &a.tags, |a| &mut a.tags)
            .field("scores", |a| &a.scores, |a| &mut a.scores)
            .field("history", |a| &a.history, |a| &mut a.history)
            .field("home", |a| &a.home, |a| &mut a.home)
            .field("target", |a| &a.target, |a| &mut a.target)
            .field("slots", |a| &a.slots, |a| &mut a.slots)
            .field("payload", |a| &a.payload, |a| &mut a.payload)
            .build()
    }
}

fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register::<Actor>();
    registry
}

fn actor(registry: &TypeRegistry) -> Actor {
    Actor {
        entity: Entity { id: 42 },
        name: String::from("scout"),
        position: Point { x: -3, y: 8 },
        color: Color::Green,
        layers: Layers::GROUND | Layers::AIR,
        tags: vec![String::from("fast"), String::from("small")],
        scores: BTreeMap::from([(String::from("speed"), 2.25), (String::from("armor"), 0.5)]),
        history: VecDeque::from([(1, true), (7, false)]),
        home: Rc::new(Point { x: 1, y: 1 }),
        target: Some(Point { x: 5, y: 0 }),
        slots: [3, 0, 9],
        payload: Variant::new(registry, "bonus", Point { x: 2, y: 2 }).unwrap(),
    }
}

fn materializing() -> TraverseConfig {
    TraverseConfig {
        materialize_null_pointers: true,
        ..TraverseConfig::default()
    }
}

fn write<T: Any>(registry: &TypeRegistry, value: &T) -> Node {
    let mut writer = DocumentWriter::new("root");
    WriteDriver::new(registry).write_typed(value, &mut writer).unwrap();
    writer.finish()
}

fn read<T: Any>(registry: &TypeRegistry, config: TraverseConfig, value: &mut T, doc: &Node) -> Presence {
    ReadDriver::with_config(registry, config)
        .read_typed(value, &mut DocumentReader::new(doc))
        .unwrap()
}

// -----------------------------------------------------------------------------
// Tests

#[test]
fn point_writes_named_scalars() {
    let registry = registry();
    let doc = to_document(&registry, &Point { x: 3, y: 4 }, "point").unwrap();

    assert_eq!(doc.name(), "point");
    assert_eq!(doc.kind(), NodeKind::Object);
    let names: Vec<_> = doc.children().iter().map(Node::name).collect();
    assert_eq!(names, ["x", "y"]);
    assert_eq!(doc.child("x").and_then(Node::value), Some(&Scalar::Int(3)));
    assert_eq!(doc.child("y").and_then(Node::value), Some(&Scalar::Int(4)));

    let mut point = Point::default();
    assert_eq!(from_document(&registry, &mut point, &doc).unwrap(), Presence::Present);
    assert_eq!(point, Point { x: 3, y: 4 });
}

#[test]
fn own_properties_come_before_parents() {
    let registry = registry();
    let doc = write(&registry, &actor(&registry));

    let names: Vec<_> = doc.children().iter().map(Node::name).collect();
    assert_eq!(
        names,
        [
            "name", "position", "color", "layers", "tags", "scores", "history", "home", "target",
            "slots", "payload", "id"
        ]
    );
}

#[test]
fn every_shape_round_trips() {
    let registry = registry();
    let original = actor(&registry);
    let doc = write(&registry, &original);

    let mut copy = Actor::default();
    assert_eq!(read(&registry, materializing(), &mut copy, &doc), Presence::Present);
    assert_eq!(copy, original);
}

#[test]
fn documents_survive_json() {
    let registry = registry();
    let original = actor(&registry);
    let doc = write(&registry, &original);

    let json = serde_json::to_string(&doc).unwrap();
    let parsed: Node = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.children().len(), doc.children().len());

    let mut copy = Actor::default();
    let _ = read(&registry, materializing(), &mut copy, &parsed);
    assert_eq!(copy, original);
}

#[test]
fn truncated_json_fails_before_reading() {
    let registry = registry();
    let original = actor(&registry);
    let json = serde_json::to_string_pretty(&write(&registry, &original)).unwrap();

    let mut copy = original.clone();
    let cut = &json[..json.len() / 2];
    let err = from_json(&registry, &mut copy, cut).unwrap_err();
    let ReflectError::Parse(ParseError { line, column, .. }) = err else {
        panic!("expected a parse error, got {err:?}");
    };
    assert!(line > 1);
    assert!(column > 0);
    assert_eq!(copy, original);

    let mut point = Point { x: 1, y: 2 };
    let presence = from_json(&registry, &mut point, r#"{"name":"p","object":[{"name":"x","value":9}]}"#);
    assert_eq!(presence.unwrap(), Presence::Present);
    assert_eq!(point, Point { x: 9, y: 2 });
}

#[test]
fn symbolic_forms() {
    let registry = registry();
    let doc = write(&registry, &actor(&registry));

    assert_eq!(doc.child("color").and_then(Node::value), Some(&Scalar::Text("Green".into())));
    assert_eq!(
        doc.child("layers").and_then(Node::value),
        Some(&Scalar::Text("GROUND|AIR".into()))
    );

    let payload = doc.child("payload").unwrap();
    assert_eq!(payload.child("type").and_then(Node::value), Some(&Scalar::Text("Point".into())));
    assert_eq!(payload.child("name").and_then(Node::value), Some(&Scalar::Text("bonus".into())));
}

#[test]
fn unnamed_enum_values_fail_to_write() {
    let registry = registry();
    let mut writer = DocumentWriter::new("color");
    let err = WriteDriver::new(&registry)
        .write_typed(&Color::Blue, &mut writer)
        .unwrap_err();
    assert!(matches!(err, ReflectError::EncodingFailure { .. }));
}

#[test]
fn unknown_enum_names_fail_to_read() {
    let registry = registry();
    let doc = Node::scalar("color", "Purple");
    let mut color = Color::Green;

    let err = ReadDriver::new(&registry)
        .read_typed(&mut color, &mut DocumentReader::new(&doc))
        .unwrap_err();
    assert!(matches!(err, ReflectError::EncodingFailure { .. }));
    assert_eq!(color, Color::Green);
}

#[test]
fn bitmask_tokens_are_trimmed_and_unioned() {
    let registry = registry();
    let doc = Node::scalar("layers", " WATER |AIR| SPACE |");

    let mut layers = Layers::GROUND;
    let _ = read(&registry, TraverseConfig::default(), &mut layers, &doc);
    assert_eq!(layers, Layers::WATER | Layers::AIR);

    let strict = TraverseConfig {
        strict_bitmask: true,
        ..TraverseConfig::default()
    };
    let err = ReadDriver::with_config(&registry, strict)
        .read_typed(&mut layers, &mut DocumentReader::new(&doc))
        .unwrap_err();
    assert!(matches!(err, ReflectError::EncodingFailure { .. }));
}

#[test]
fn empty_bitmask_is_empty_text() {
    let registry = registry();
    let doc = write(&registry, &Layers::empty());
    assert_eq!(doc.value(), Some(&Scalar::Text(String::new())));

    let mut layers = Layers::all();
    let _ = read(&registry, TraverseConfig::default(), &mut layers, &doc);
    assert_eq!(layers, Layers::empty());
}

#[test]
fn containers_are_cleared_before_reading() {
    let registry = registry();
    let doc = write(&registry, &vec![String::from("a")]);

    let mut tags = vec![String::from("x"), String::from("y"), String::from("z")];
    let _ = read(&registry, TraverseConfig::default(), &mut tags, &doc);
    assert_eq!(tags, ["a"]);

    let empty = write(&registry, &Vec::<String>::new());
    let _ = read(&registry, TraverseConfig::default(), &mut tags, &empty);
    assert!(tags.is_empty());
}

#[test]
fn missing_fields_are_tolerated() {
    let registry = registry();
    let doc = Node::object(
        "actor",
        vec![
            Node::scalar("name", "renamed"),
            Node::object("position", vec![Node::scalar("y", 10_i64)]),
        ],
    );

    let mut value = actor(&registry);
    let expected = Actor {
        name: String::from("renamed"),
        position: Point { x: -3, y: 10 },
        ..value.clone()
    };

    let mut driver = ReadDriver::new(&registry);
    let presence = driver
        .read_typed(&mut value, &mut DocumentReader::new(&doc))
        .unwrap();

    assert_eq!(presence, Presence::Present);
    assert_eq!(value, expected);
    assert!(driver.absent_properties().iter().any(|path| path == "position.x"));
    assert!(driver.absent_properties().iter().any(|path| path == "id"));
}

#[test]
fn empty_documents_are_absent() {
    let registry = registry();
    let mut point = Point { x: 1, y: 2 };
    let presence = from_document(&registry, &mut point, &Node::new("point")).unwrap();
    assert_eq!(presence, Presence::Absent);
    assert_eq!(point, Point { x: 1, y: 2 });
}

#[test]
fn unknown_variant_types_fail() {
    let registry = registry();
    let doc = Node::object(
        "payload",
        vec![
            Node::scalar("type", "Missing"),
            Node::scalar("name", "n"),
            Node::scalar("value", 1_i64),
        ],
    );

    let mut variant = Variant::new(&registry, "kept", 5_i32).unwrap();
    let err = from_document(&registry, &mut variant, &doc).unwrap_err();
    assert!(matches!(err, ReflectError::UnknownTypeName(name) if name == "Missing"));
    assert_eq!(variant.name(), "kept");
    assert_eq!(variant.get::<i32>(), Some(&5));
}

#[test]
fn clones_are_independent() {
    let registry = registry();
    let original = actor(&registry);

    let mut copy = Actor::default();
    CloneDriver::with_config(&registry, materializing())
        .clone_typed(&original, &mut copy)
        .unwrap();
    assert_eq!(copy, original);
    assert!(!Rc::ptr_eq(&copy.home, &original.home));

    copy.tags.push(String::from("changed"));
    copy.payload.get_mut::<Point>().unwrap().x = 100;
    assert_eq!(original.tags.len(), 2);
    assert_eq!(original.payload.get::<Point>(), Some(&Point { x: 2, y: 2 }));
}

#[test]
fn registry_equality_uses_the_method_table() {
    let registry = registry();
    let a = actor(&registry);
    let mut b = a.clone();

    let id = std::any::TypeId::of::<Actor>();
    assert!(registry.equals(&a, &b, id).unwrap());
    b.slots[1] = 1;
    assert!(!registry.equals(&a, &b, id).unwrap());
}
