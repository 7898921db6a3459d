//! Provider-independent snapshots of library members.

use serde::Serialize;
use smallvec::SmallVec;
use uuid::Uuid;

use crate::types::{Constant, InvokeKind, MemberId, ParamFlags, TypeKind, VarType};

/// Type of a field, parameter or return value
///
/// User-defined types are resolved one level: the target's name and kind are
/// recorded, its contents are not.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType
{
    /// Terminal automation type
    Primitive(VarType),
    /// Pointer to the inner type
    Pointer(Box<ModelType>),
    /// `SAFEARRAY` of the inner type
    SafeArray(Box<ModelType>),
    /// Fixed-size array, one element count per dimension
    CArray
    {
        element: Box<ModelType>,
        dims: SmallVec<[u32; 2]>,
    },
    /// Another library member
    Named
    {
        name: String,
        kind: TypeKind,
        /// Name of the library the type lives in, when it is not the one
        /// being described
        library: Option<String>,
    },
}

impl ModelType
{
    /// Pointee of a pointer; any other type unchanged.
    #[must_use]
    pub fn pointee(&self) -> &ModelType
    {
        match self {
            Self::Pointer(inner) => inner,
            other => other,
        }
    }

    /// Whether this is `void` (or carries no value at all).
    pub fn is_void(&self) -> bool
    {
        matches!(self, Self::Primitive(vt) if matches!(*vt, VarType::VOID | VarType::EMPTY))
    }
}

/// One enumerator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumValue
{
    pub name: String,
    pub value: i64,
}

/// Enumeration (`TKIND_ENUM`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enum
{
    pub name: String,
    pub doc: String,
    pub values: Vec<EnumValue>,
}

/// One record field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field
{
    pub name: String,
    pub ty: ModelType,
}

/// Structure or union (`TKIND_RECORD`, `TKIND_UNION`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record
{
    pub name: String,
    pub doc: String,
    pub union: bool,
    pub fields: Vec<Field>,
}

impl Record
{
    /// C++ keyword introducing the record.
    pub fn keyword(&self) -> &'static str
    {
        if self.union { "union" } else { "struct" }
    }
}

/// One method parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param
{
    pub name: String,
    pub ty: ModelType,
    pub flags: ParamFlags,
    pub default: Option<Constant>,
}

/// One method or property accessor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Method
{
    /// Member name without accessor prefix
    pub name: String,
    pub doc: String,
    /// Dispatch id
    pub id: MemberId,
    pub invoke: InvokeKind,
    /// Effective return type: the `[out, retval]` pointee when there is one
    pub returns: ModelType,
    /// Parameters, without the `[out, retval]` parameter
    pub params: Vec<Param>,
}

impl Method
{
    /// Generated member name (`get_Name`, `put_Name`, `Name`).
    pub fn cpp_name(&self) -> String
    {
        format!("{}{}", self.invoke.accessor_prefix(), self.name)
    }
}

/// Dispinterface or dual interface (`TKIND_DISPATCH`, dual `TKIND_INTERFACE`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interface
{
    pub name: String,
    pub doc: String,
    pub guid: Uuid,
    /// Dual interface (vtable and dispatch)
    pub dual: bool,
    /// Implemented or inherited interfaces, in declaration order
    pub bases: Vec<String>,
    pub methods: Vec<Method>,
}

/// Everything emitted for one library
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeLibDescription
{
    /// Documented library name, also the import header name
    pub name: String,
    pub doc: String,
    pub guid: Uuid,
    pub version: (u16, u16),
    pub enums: Vec<Enum>,
    pub records: Vec<Record>,
    pub interfaces: Vec<Interface>,
}

impl TypeLibDescription
{
    /// Stable identifier used for file names: the upper-case hyphenated GUID.
    pub fn library_id(&self) -> String
    {
        self.guid.hyphenated().to_string().to_ascii_uppercase()
    }

    /// Number of entities of each kind: `(enums, records, interfaces)`.
    pub fn counts(&self) -> (usize, usize, usize)
    {
        (self.enums.len(), self.records.len(), self.interfaces.len())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_library_id_is_upper_case()
    {
        let description = TypeLibDescription {
            name: "Shapes".into(),
            doc: String::new(),
            guid: Uuid::parse_str("5a0e1f2c-3b4d-4e6f-8a9b-0c1d2e3f4a5b").unwrap(),
            version: (1, 0),
            enums: Vec::new(),
            records: Vec::new(),
            interfaces: Vec::new(),
        };
        assert_eq!(description.library_id(), "5A0E1F2C-3B4D-4E6F-8A9B-0C1D2E3F4A5B");
    }

    #[test]
    fn test_method_names_carry_accessor_prefix()
    {
        let method = Method {
            name: "Volume".into(),
            doc: String::new(),
            id: 7,
            invoke: InvokeKind::PROPERTYPUT,
            returns: ModelType::Primitive(VarType::VOID),
            params: Vec::new(),
        };
        assert_eq!(method.cpp_name(), "put_Volume");
        assert!(method.returns.is_void());
    }

    #[test]
    fn test_model_serializes_to_json()
    {
        let ty = ModelType::Pointer(Box::new(ModelType::Named {
            name: "Point".into(),
            kind: TypeKind::Record,
            library: None,
        }));
        let json = serde_json::to_value(&ty).unwrap();
        assert_eq!(json["pointer"]["named"]["kind"], "record");
        assert_eq!(
            serde_json::to_value(ModelType::Primitive(VarType::I4)).unwrap(),
            serde_json::json!({ "primitive": "VT_I4" })
        );
    }
}
