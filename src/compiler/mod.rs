//! IDL compiler: type registry, type mapping, binary layouts and field codecs

pub mod codec;
pub mod layout;
pub mod registry;
pub mod type_mapper;
pub mod value;
pub mod wire;

pub use self::codec::{evaluate_record, Accessor, EncodableExpr, EncodableKind, FieldCodec};
pub use self::layout::{LayoutBuilder, LayoutNode};
pub use self::registry::TypeRegistry;
pub use self::type_mapper::{TargetDef, TargetField, TargetType, TypeMapper};
pub use self::value::{EnumFields, Value};
