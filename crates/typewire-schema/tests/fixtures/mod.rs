//! Shared fixture types for the integration suites: a small zoo of record
//! shapes covering scalars, collections, unions, recursion, defaults,
//! computed properties, and a custom registered scalar codec.

#![allow(dead_code)]

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde_json::{json, Value};
use uuid::Uuid;

use typewire_schema::{
    CodecRegistry, Datum, DecodeError, EncodeError, Engine, EnumDescriptor, FieldDescriptor,
    RecordDescriptor, RecordValue, ScalarCodec, TypeExpr, TypeRegistry, WireEnum, WireRecord,
};

fn expected(kind: &str, found: &Datum) -> DecodeError {
    DecodeError::TypeMismatch {
        expected: kind.to_owned(),
        found: found.type_label(),
    }
}

/// UK-style postcode, wire-constrained to 5..=8 characters.
#[derive(Debug)]
pub struct PostcodeCodec;

impl ScalarCodec for PostcodeCodec {
    fn schema(&self) -> Value {
        json!({"type": "string", "minLength": 5, "maxLength": 8})
    }

    fn encode(&self, value: &Datum) -> Result<Value, EncodeError> {
        match value {
            Datum::Str(s) => Ok(json!(s)),
            other => Err(EncodeError::TypeMismatch {
                expected: "postcode string".to_owned(),
                found: other.type_label(),
            }),
        }
    }

    fn decode(&self, value: &Value) -> Result<Datum, DecodeError> {
        match value {
            Value::String(s) => Ok(Datum::Str(s.clone())),
            other => Err(DecodeError::TypeMismatch {
                expected: "postcode string".to_owned(),
                found: typewire_schema::json_type_label(other),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
}

impl WireEnum for Weekday {
    fn type_name() -> &'static str {
        "Weekday"
    }

    fn descriptor() -> EnumDescriptor {
        EnumDescriptor::new("Weekday")
            .member("Mon", json!("Monday"))
            .member("Tue", json!("Tuesday"))
            .member("Wed", json!("Wednesday"))
            .member("Thu", json!("Thursday"))
            .member("Fri", json!("Friday"))
    }

    fn member_name(&self) -> &'static str {
        match self {
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
        }
    }

    fn from_member_name(name: &str) -> Option<Self> {
        match name {
            "Mon" => Some(Weekday::Mon),
            "Tue" => Some(Weekday::Tue),
            "Wed" => Some(Weekday::Wed),
            "Thu" => Some(Weekday::Thu),
            "Fri" => Some(Weekday::Fri),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl WireRecord for Point {
    fn type_name() -> &'static str {
        "Point"
    }

    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::new("Point")
            .description("A point in the plane")
            .field(
                FieldDescriptor::new("x", TypeExpr::number())
                    .wire_name("z")
                    .description("Point x coordinate"),
            )
            .field(FieldDescriptor::new("y", TypeExpr::number()).description("Point y coordinate"))
    }

    fn to_datum(&self) -> RecordValue {
        RecordValue::new("Point")
            .with_field("x", self.x)
            .with_field("y", self.y)
    }

    fn from_datum(value: &RecordValue) -> Result<Self, DecodeError> {
        let x = value.expect_field("x")?;
        let y = value.expect_field("y")?;
        Ok(Point {
            x: x.as_f64().ok_or_else(|| expected("number", x))?,
            y: y.as_f64().ok_or_else(|| expected("number", y))?,
        })
    }
}

/// One field of every composite kind, including a remapped nested record,
/// a custom scalar, and a transparently wrapped record reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Foo {
    pub a: DateTime<FixedOffset>,
    pub b: Option<Vec<Point>>,
    pub c: BTreeMap<String, i64>,
    pub d: Weekday,
    pub f: (String, i64),
    pub g: Vec<String>,
    pub e: Option<String>,
    pub h: Option<Point>,
}

impl WireRecord for Foo {
    fn type_name() -> &'static str {
        "Foo"
    }

    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::new("Foo")
            .description("A foo that foos")
            .field(FieldDescriptor::new("a", TypeExpr::datetime()))
            .field(FieldDescriptor::new(
                "b",
                TypeExpr::option(TypeExpr::sequence(TypeExpr::record("Point"))),
            ))
            .field(FieldDescriptor::new(
                "c",
                TypeExpr::mapping(TypeExpr::string(), TypeExpr::integer()),
            ))
            .field(FieldDescriptor::new("d", TypeExpr::enumeration("Weekday")).no_init())
            .field(FieldDescriptor::new(
                "f",
                TypeExpr::tuple(vec![TypeExpr::string(), TypeExpr::integer()]),
            ))
            .field(FieldDescriptor::new(
                "g",
                TypeExpr::variadic_tuple(TypeExpr::string()),
            ))
            .field(
                FieldDescriptor::new("e", TypeExpr::option(TypeExpr::scalar("Postcode")))
                    .default_value(Datum::Absent),
            )
            .field(
                FieldDescriptor::new(
                    "h",
                    TypeExpr::option(TypeExpr::wrapped(TypeExpr::record("Point"))),
                )
                .default_value(Datum::Absent),
            )
    }

    fn to_datum(&self) -> RecordValue {
        RecordValue::new("Foo")
            .with_field("a", Datum::Timestamp(self.a))
            .with_field(
                "b",
                match &self.b {
                    Some(points) => Datum::List(
                        points.iter().map(|p| Datum::Record(p.to_datum())).collect(),
                    ),
                    None => Datum::Absent,
                },
            )
            .with_field(
                "c",
                Datum::Map(
                    self.c
                        .iter()
                        .map(|(k, v)| (Datum::Str(k.clone()), Datum::Int(*v)))
                        .collect(),
                ),
            )
            .with_field("d", self.d.to_datum())
            .with_field(
                "f",
                Datum::Tuple(vec![Datum::Str(self.f.0.clone()), Datum::Int(self.f.1)]),
            )
            .with_field(
                "g",
                Datum::Tuple(self.g.iter().map(|s| Datum::Str(s.clone())).collect()),
            )
            .with_field("e", Datum::from_option(self.e.clone()))
            .with_field(
                "h",
                match &self.h {
                    Some(point) => Datum::Record(point.to_datum()),
                    None => Datum::Absent,
                },
            )
    }

    fn from_datum(value: &RecordValue) -> Result<Self, DecodeError> {
        let a = value.expect_field("a")?;
        let a = a
            .as_timestamp()
            .copied()
            .ok_or_else(|| expected("timestamp", a))?;

        let b = match value.expect_field("b")? {
            Datum::Absent => None,
            Datum::List(items) => Some(
                items
                    .iter()
                    .map(|item| {
                        let record = item.as_record().ok_or_else(|| expected("point", item))?;
                        Point::from_datum(record)
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            other => return Err(expected("list of points", other)),
        };

        let c = match value.expect_field("c")? {
            Datum::Map(pairs) => pairs
                .iter()
                .map(|(k, v)| {
                    Ok((
                        k.as_str().ok_or_else(|| expected("string key", k))?.to_owned(),
                        v.as_i64().ok_or_else(|| expected("integer", v))?,
                    ))
                })
                .collect::<Result<BTreeMap<_, _>, DecodeError>>()?,
            other => return Err(expected("map", other)),
        };

        let d = Weekday::from_datum(value.expect_field("d")?)?;

        let f = match value.expect_field("f")? {
            Datum::Tuple(items) => match items.as_slice() {
                [Datum::Str(s), Datum::Int(i)] => (s.clone(), *i),
                _ => return Err(expected("(string, integer)", value.expect_field("f")?)),
            },
            other => return Err(expected("tuple", other)),
        };

        let g = match value.expect_field("g")? {
            Datum::Tuple(items) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_owned)
                        .ok_or_else(|| expected("string", item))
                })
                .collect::<Result<Vec<_>, _>>()?,
            other => return Err(expected("tuple", other)),
        };

        let e = match value.expect_field("e")? {
            Datum::Absent => None,
            Datum::Str(s) => Some(s.clone()),
            other => return Err(expected("postcode", other)),
        };

        let h = match value.expect_field("h")? {
            Datum::Absent => None,
            Datum::Record(record) => Some(Point::from_datum(record)?),
            other => return Err(expected("point", other)),
        };

        Ok(Foo { a, b, c, d, f, g, e, h })
    }
}

/// The two sides of `Union[Weekday, Point]`.
#[derive(Debug, Clone, PartialEq)]
pub enum WeekdayOrPoint {
    Weekday(Weekday),
    Point(Point),
}

/// A record with a single union field.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub a: WeekdayOrPoint,
}

impl WireRecord for Bar {
    fn type_name() -> &'static str {
        "Bar"
    }

    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::new("Bar")
            .description("Type with union field")
            .field(FieldDescriptor::new(
                "a",
                TypeExpr::union(vec![
                    TypeExpr::enumeration("Weekday"),
                    TypeExpr::record("Point"),
                ]),
            ))
    }

    fn to_datum(&self) -> RecordValue {
        let a = match &self.a {
            WeekdayOrPoint::Weekday(day) => day.to_datum(),
            WeekdayOrPoint::Point(point) => Datum::Record(point.to_datum()),
        };
        RecordValue::new("Bar").with_field("a", a)
    }

    fn from_datum(value: &RecordValue) -> Result<Self, DecodeError> {
        let a = match value.expect_field("a")? {
            datum @ Datum::Enum(_) => WeekdayOrPoint::Weekday(Weekday::from_datum(datum)?),
            Datum::Record(record) => WeekdayOrPoint::Point(Point::from_datum(record)?),
            other => return Err(expected("weekday or point", other)),
        };
        Ok(Bar { a })
    }
}

/// A record whose field defaults to a nested record value.
#[derive(Debug, Clone, PartialEq)]
pub struct Baz {
    pub a: Point,
}

impl WireRecord for Baz {
    fn type_name() -> &'static str {
        "Baz"
    }

    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::new("Baz")
            .description("Type with nested default value")
            .field(
                FieldDescriptor::new("a", TypeExpr::record("Point")).default_value(Datum::Record(
                    RecordValue::new("Point")
                        .with_field("x", 0.0)
                        .with_field("y", 0.0),
                )),
            )
    }

    fn to_datum(&self) -> RecordValue {
        RecordValue::new("Baz").with_field("a", Datum::Record(self.a.to_datum()))
    }

    fn from_datum(value: &RecordValue) -> Result<Self, DecodeError> {
        let a = value.expect_field("a")?;
        let record = a.as_record().ok_or_else(|| expected("point", a))?;
        Ok(Baz {
            a: Point::from_datum(record)?,
        })
    }
}

/// A self-referential record.
#[derive(Debug, Clone, PartialEq)]
pub struct Recursive {
    pub a: String,
    pub b: Option<Box<Recursive>>,
}

impl WireRecord for Recursive {
    fn type_name() -> &'static str {
        "Recursive"
    }

    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::new("Recursive")
            .description("A recursive data-structure")
            .field(FieldDescriptor::new("a", TypeExpr::string()))
            .field(
                FieldDescriptor::new("b", TypeExpr::option(TypeExpr::record("Recursive")))
                    .default_value(Datum::Absent),
            )
    }

    fn to_datum(&self) -> RecordValue {
        RecordValue::new("Recursive")
            .with_field("a", self.a.clone())
            .with_field(
                "b",
                match &self.b {
                    Some(inner) => Datum::Record(inner.to_datum()),
                    None => Datum::Absent,
                },
            )
    }

    fn from_datum(value: &RecordValue) -> Result<Self, DecodeError> {
        let a = value.expect_field("a")?;
        let b = match value.expect_field("b")? {
            Datum::Absent => None,
            Datum::Record(record) => Some(Box::new(Recursive::from_datum(record)?)),
            other => return Err(expected("recursive", other)),
        };
        Ok(Recursive {
            a: a.as_str().map(str::to_owned).ok_or_else(|| expected("string", a))?,
            b,
        })
    }
}

/// Structure with unconstrained member types.
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueData {
    pub a: Vec<Datum>,
    pub b: Vec<(String, Datum)>,
}

impl WireRecord for OpaqueData {
    fn type_name() -> &'static str {
        "OpaqueData"
    }

    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::new("OpaqueData")
            .description("Structure with unknown types")
            .field(FieldDescriptor::new("a", TypeExpr::sequence(TypeExpr::any())))
            .field(FieldDescriptor::new(
                "b",
                TypeExpr::mapping(TypeExpr::string(), TypeExpr::any()),
            ))
    }

    fn to_datum(&self) -> RecordValue {
        RecordValue::new("OpaqueData")
            .with_field("a", Datum::List(self.a.clone()))
            .with_field(
                "b",
                Datum::Map(
                    self.b
                        .iter()
                        .map(|(k, v)| (Datum::Str(k.clone()), v.clone()))
                        .collect(),
                ),
            )
    }

    fn from_datum(value: &RecordValue) -> Result<Self, DecodeError> {
        let a = value.expect_field("a")?;
        let b = value.expect_field("b")?;
        Ok(OpaqueData {
            a: a.as_list().map(<[Datum]>::to_vec).ok_or_else(|| expected("list", a))?,
            b: b.as_map()
                .ok_or_else(|| expected("map", b))?
                .iter()
                .map(|(k, v)| {
                    Ok((
                        k.as_str().ok_or_else(|| expected("string key", k))?.to_owned(),
                        v.clone(),
                    ))
                })
                .collect::<Result<Vec<_>, DecodeError>>()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub name: String,
    pub cost: f64,
}

impl WireRecord for Product {
    fn type_name() -> &'static str {
        "Product"
    }

    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::new("Product")
            .field(FieldDescriptor::new("name", TypeExpr::string()))
            .field(FieldDescriptor::new("cost", TypeExpr::number()).default_value(20.0))
    }

    fn to_datum(&self) -> RecordValue {
        RecordValue::new("Product")
            .with_field("name", self.name.clone())
            .with_field("cost", self.cost)
    }

    fn from_datum(value: &RecordValue) -> Result<Self, DecodeError> {
        let name = value.expect_field("name")?;
        let cost = value.expect_field("cost")?;
        Ok(Product {
            name: name.as_str().map(str::to_owned).ok_or_else(|| expected("string", name))?,
            cost: cost.as_f64().ok_or_else(|| expected("number", cost))?,
        })
    }
}

/// A record with a computed serialised property: total cost appears in the
/// wire form and schema (read-only) but is never decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ShoppingCart {
    pub items: Vec<Product>,
}

impl ShoppingCart {
    pub fn cost(&self) -> f64 {
        self.items.iter().map(|item| item.cost).sum()
    }
}

impl WireRecord for ShoppingCart {
    fn type_name() -> &'static str {
        "ShoppingCart"
    }

    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::new("ShoppingCart")
            .field(FieldDescriptor::new(
                "items",
                TypeExpr::sequence(TypeExpr::record("Product")),
            ))
            .field(FieldDescriptor::new("cost", TypeExpr::number()).computed())
    }

    fn to_datum(&self) -> RecordValue {
        RecordValue::new("ShoppingCart")
            .with_field(
                "items",
                Datum::List(
                    self.items
                        .iter()
                        .map(|item| Datum::Record(item.to_datum()))
                        .collect(),
                ),
            )
            .with_field("cost", self.cost())
    }

    fn from_datum(value: &RecordValue) -> Result<Self, DecodeError> {
        let items = match value.expect_field("items")? {
            Datum::List(items) => items
                .iter()
                .map(|item| {
                    let record = item.as_record().ok_or_else(|| expected("product", item))?;
                    Product::from_datum(record)
                })
                .collect::<Result<Vec<_>, _>>()?,
            other => return Err(expected("list of products", other)),
        };
        Ok(ShoppingCart { items })
    }
}

/// UUID-keyed mapping of products.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductList {
    pub products: Vec<(Uuid, Product)>,
}

impl WireRecord for ProductList {
    fn type_name() -> &'static str {
        "ProductList"
    }

    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::new("ProductList").field(FieldDescriptor::new(
            "products",
            TypeExpr::mapping(TypeExpr::uuid(), TypeExpr::record("Product")),
        ))
    }

    fn to_datum(&self) -> RecordValue {
        RecordValue::new("ProductList").with_field(
            "products",
            Datum::Map(
                self.products
                    .iter()
                    .map(|(id, product)| (Datum::Uuid(*id), Datum::Record(product.to_datum())))
                    .collect(),
            ),
        )
    }

    fn from_datum(value: &RecordValue) -> Result<Self, DecodeError> {
        let products = match value.expect_field("products")? {
            Datum::Map(pairs) => pairs
                .iter()
                .map(|(k, v)| {
                    let id = k.as_uuid().copied().ok_or_else(|| expected("uuid key", k))?;
                    let record = v.as_record().ok_or_else(|| expected("product", v))?;
                    Ok((id, Product::from_datum(record)?))
                })
                .collect::<Result<Vec<_>, DecodeError>>()?,
            other => return Err(expected("map", other)),
        };
        Ok(ProductList { products })
    }
}

/// A record whose only field has a default factory.
#[derive(Debug, Clone, PartialEq)]
pub struct Zoo {
    pub animal_types: Option<BTreeMap<String, String>>,
}

impl WireRecord for Zoo {
    fn type_name() -> &'static str {
        "Zoo"
    }

    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::new("Zoo").description("A zoo").field(
            FieldDescriptor::new(
                "animal_types",
                TypeExpr::option(TypeExpr::mapping(TypeExpr::string(), TypeExpr::string())),
            )
            .default_factory(|| Datum::Map(Vec::new())),
        )
    }

    fn to_datum(&self) -> RecordValue {
        RecordValue::new("Zoo").with_field(
            "animal_types",
            match &self.animal_types {
                Some(map) => Datum::Map(
                    map.iter()
                        .map(|(k, v)| (Datum::Str(k.clone()), Datum::Str(v.clone())))
                        .collect(),
                ),
                None => Datum::Absent,
            },
        )
    }

    fn from_datum(value: &RecordValue) -> Result<Self, DecodeError> {
        let animal_types = match value.expect_field("animal_types")? {
            Datum::Absent => None,
            Datum::Map(pairs) => Some(
                pairs
                    .iter()
                    .map(|(k, v)| {
                        Ok((
                            k.as_str().ok_or_else(|| expected("string key", k))?.to_owned(),
                            v.as_str().ok_or_else(|| expected("string", v))?.to_owned(),
                        ))
                    })
                    .collect::<Result<BTreeMap<_, _>, DecodeError>>()?,
            ),
            other => return Err(expected("map", other)),
        };
        Ok(Zoo { animal_types })
    }
}

/// An engine over every fixture type plus the Postcode scalar codec.
pub fn engine() -> Engine {
    let mut types = TypeRegistry::new();
    types.register_wire_enum::<Weekday>().unwrap();
    types.register_record::<Point>().unwrap();
    types.register_record::<Foo>().unwrap();
    types.register_record::<Bar>().unwrap();
    types.register_record::<Baz>().unwrap();
    types.register_record::<Recursive>().unwrap();
    types.register_record::<OpaqueData>().unwrap();
    types.register_record::<Product>().unwrap();
    types.register_record::<ShoppingCart>().unwrap();
    types.register_record::<ProductList>().unwrap();
    types.register_record::<Zoo>().unwrap();

    let mut codecs = CodecRegistry::with_builtins();
    codecs.register("Postcode", PostcodeCodec);
    Engine::with_codecs(types, codecs)
}
