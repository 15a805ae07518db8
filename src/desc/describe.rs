use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;

use super::{FloatWidth, IntWidth, TypeDesc};

/// Types that can describe their own shape for schema generation.
///
/// Implemented here for primitives, wrappers and std collections. Composite
/// types implement it by returning a [`super::StructDesc`]:
///
/// ```
/// use json_typeschema::desc::{Describe, StructDesc, TypeDesc};
///
/// struct Note { body: String, pinned: Option<bool> }
///
/// impl Describe for Note {
///     fn describe() -> TypeDesc {
///         StructDesc::of::<Self>()
///             .field::<String>("Body", r#"json:"body" required:"true""#)
///             .field::<Option<bool>>("Pinned", r#"json:"pinned,omitempty""#)
///             .into()
///     }
/// }
/// ```
pub trait Describe {
    fn describe() -> TypeDesc;
}

macro_rules! describe_as {
    ($desc:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Describe for $ty {
                fn describe() -> TypeDesc { $desc }
            }
        )+
    };
}

describe_as!(TypeDesc::Bool => bool);
describe_as!(TypeDesc::Integer(IntWidth::I8) => i8);
describe_as!(TypeDesc::Integer(IntWidth::I16) => i16);
describe_as!(TypeDesc::Integer(IntWidth::I32) => i32);
describe_as!(TypeDesc::Integer(IntWidth::I64) => i64);
describe_as!(TypeDesc::Integer(IntWidth::ISize) => isize);
describe_as!(TypeDesc::Integer(IntWidth::U8) => u8);
describe_as!(TypeDesc::Integer(IntWidth::U16) => u16);
describe_as!(TypeDesc::Integer(IntWidth::U32) => u32);
describe_as!(TypeDesc::Integer(IntWidth::U64) => u64);
describe_as!(TypeDesc::Integer(IntWidth::USize) => usize);
describe_as!(TypeDesc::Number(FloatWidth::F32) => f32);
describe_as!(TypeDesc::Number(FloatWidth::F64) => f64);
describe_as!(TypeDesc::String => String, str, char);
describe_as!(TypeDesc::DateTime => chrono::NaiveDateTime);
describe_as!(TypeDesc::Any => serde_json::Value);
describe_as!(TypeDesc::Map(Box::new(TypeDesc::Any)) => serde_json::Map<String, serde_json::Value>);

impl<Tz: chrono::TimeZone> Describe for chrono::DateTime<Tz> {
    fn describe() -> TypeDesc {
        TypeDesc::DateTime
    }
}

impl<T: Describe> Describe for Option<T> {
    fn describe() -> TypeDesc {
        TypeDesc::Optional(Box::new(T::describe()))
    }
}

macro_rules! describe_pointer {
    ($($ptr:ident),+) => {
        $(
            impl<T: Describe + ?Sized> Describe for $ptr<T> {
                fn describe() -> TypeDesc {
                    TypeDesc::Pointer(Box::new(T::describe()))
                }
            }
        )+
    };
}

describe_pointer!(Box, Rc, Arc);

impl<T: Describe + ?Sized> Describe for &T {
    fn describe() -> TypeDesc {
        TypeDesc::Pointer(Box::new(T::describe()))
    }
}

impl<T: Describe> Describe for [T] {
    fn describe() -> TypeDesc {
        TypeDesc::Seq(Box::new(T::describe()))
    }
}

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn describe() -> TypeDesc {
        TypeDesc::Seq(Box::new(T::describe()))
    }
}

macro_rules! describe_seq {
    ($($seq:ident),+) => {
        $(
            impl<T: Describe> Describe for $seq<T> {
                fn describe() -> TypeDesc {
                    TypeDesc::Seq(Box::new(T::describe()))
                }
            }
        )+
    };
}

describe_seq!(Vec, VecDeque, BTreeSet);

impl<T: Describe, S> Describe for HashSet<T, S> {
    fn describe() -> TypeDesc {
        TypeDesc::Seq(Box::new(T::describe()))
    }
}

impl<V: Describe, S> Describe for HashMap<String, V, S> {
    fn describe() -> TypeDesc {
        TypeDesc::Map(Box::new(V::describe()))
    }
}

impl<V: Describe> Describe for BTreeMap<String, V> {
    fn describe() -> TypeDesc {
        TypeDesc::Map(Box::new(V::describe()))
    }
}

impl<V: Describe, S> Describe for IndexMap<String, V, S> {
    fn describe() -> TypeDesc {
        TypeDesc::Map(Box::new(V::describe()))
    }
}
