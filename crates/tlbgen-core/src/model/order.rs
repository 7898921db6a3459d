//! Declaration order of emitted entities.
//!
//! C++ needs a record complete before another record embeds it by value, and
//! a class complete before another class derives from it. Both orders are
//! computed here from names in the same library; references to other
//! libraries and pointers impose no order.

use std::collections::HashMap;

use super::entities::{Interface, ModelType, Record};

/// Reorder `items` so that every item follows the items listed for it in
/// `depends`. Items keep their relative order otherwise; a cycle is broken at
/// the item reached first.
fn dependency_order<T>(items: Vec<T>, depends: &[Vec<usize>]) -> Vec<T>
{
    fn visit(index: usize, depends: &[Vec<usize>], state: &mut [u8], order: &mut Vec<usize>)
    {
        if state[index] != 0 {
            return;
        }
        state[index] = 1;
        for &dep in &depends[index] {
            visit(dep, depends, state, order);
        }
        state[index] = 2;
        order.push(index);
    }

    let mut state = vec![0_u8; items.len()];
    let mut order = Vec::with_capacity(items.len());
    for index in 0..items.len() {
        visit(index, depends, &mut state, &mut order);
    }

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    order.into_iter().filter_map(|index| slots[index].take()).collect()
}

/// Name of the same-library member a value of `ty` embeds, if any.
fn embedded(ty: &ModelType) -> Option<&str>
{
    match ty {
        ModelType::Named { name, library: None, .. } => Some(name.as_str()),
        ModelType::CArray { element, .. } => embedded(element),
        _ => None,
    }
}

/// Records ordered so that each follows the records it embeds by value.
pub(crate) fn order_records(records: Vec<Record>) -> Vec<Record>
{
    let depends: Vec<Vec<usize>> = {
        let index: HashMap<&str, usize> = records.iter().enumerate().map(|(i, r)| (r.name.as_str(), i)).collect();
        records
            .iter()
            .map(|record| {
                record
                    .fields
                    .iter()
                    .filter_map(|field| embedded(&field.ty))
                    .filter_map(|name| index.get(name).copied())
                    .collect()
            })
            .collect()
    };
    dependency_order(records, &depends)
}

/// Interfaces ordered so that each follows its bases.
pub(crate) fn order_interfaces(interfaces: Vec<Interface>) -> Vec<Interface>
{
    let depends: Vec<Vec<usize>> = {
        let index: HashMap<&str, usize> =
            interfaces.iter().enumerate().map(|(i, item)| (item.name.as_str(), i)).collect();
        interfaces
            .iter()
            .map(|item| item.bases.iter().filter_map(|base| index.get(base.as_str()).copied()).collect())
            .collect()
    };
    dependency_order(interfaces, &depends)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::model::Field;
    use crate::types::{TypeKind, VarType};

    fn record(name: &str, fields: &[(&str, ModelType)]) -> Record
    {
        Record {
            name: name.into(),
            doc: String::new(),
            union: false,
            fields: fields
                .iter()
                .map(|(n, ty)| Field {
                    name: (*n).into(),
                    ty: ty.clone(),
                })
                .collect(),
        }
    }

    fn named(name: &str, library: Option<&str>) -> ModelType
    {
        ModelType::Named {
            name: name.into(),
            kind: TypeKind::Record,
            library: library.map(Into::into),
        }
    }

    fn names(records: &[Record]) -> Vec<&str>
    {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_embedded_records_come_first()
    {
        let records = vec![
            record("Outer", &[("inner", named("Inner", None))]),
            record("Grid", &[("cells", ModelType::CArray {
                element: Box::new(named("Cell", None)),
                dims: [2, 2].into_iter().collect(),
            })]),
            record("Inner", &[("cell", named("Cell", None))]),
            record("Cell", &[("x", ModelType::Primitive(VarType::I4))]),
        ];
        assert_eq!(names(&order_records(records)), ["Cell", "Inner", "Outer", "Grid"]);
    }

    #[test]
    fn test_pointers_and_foreign_types_keep_order()
    {
        let records = vec![
            record("Node", &[("next", ModelType::Pointer(Box::new(named("List", None))))]),
            record("Wrapper", &[("guid", named("GUID", Some("stdole")))]),
            record("List", &[("head", ModelType::Pointer(Box::new(named("Node", None))))]),
        ];
        assert_eq!(names(&order_records(records)), ["Node", "Wrapper", "List"]);
    }

    #[test]
    fn test_cycle_keeps_every_record()
    {
        let records = vec![
            record("A", &[("b", named("B", None))]),
            record("B", &[("a", named("A", None))]),
        ];
        assert_eq!(names(&order_records(records)), ["B", "A"]);
    }
}
