//! Object and reference buffers
//!
//! Items are validated before they are appended, so a failed `add` never
//! leaves a partially-built entry behind.

use serde_json::{json, Value};
use uuid::Uuid;
use weavelink_domain::beacon::{
    capitalize_first_letter, object_beacon, parse_object_uuid, property_beacon,
};
use weavelink_domain::{ObjectItem, ReferenceItem, Result, WeaveError};

/// Pending object upserts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectBatch {
    items: Vec<ObjectItem>,
}

impl ObjectBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and appends one object, returning its id.
    ///
    /// `id` may be a plain UUID, a beacon or an object URL; a fresh v4 UUID
    /// is generated when it is absent.
    ///
    /// # Errors
    /// Returns [`WeaveError::InvalidInput`] for an empty class name,
    /// properties that are not a JSON object, or an id without a UUID.
    pub fn add(
        &mut self,
        class_name: &str,
        properties: &Value,
        id: Option<&str>,
        vector: Option<Vec<f32>>,
    ) -> Result<Uuid> {
        let class_name = required("class_name", class_name)?;
        let Value::Object(properties) = properties else {
            return Err(WeaveError::InvalidInput(format!(
                "Object properties must be a JSON object, given: {properties}"
            )));
        };
        let id = match id {
            Some(id) => parse_object_uuid(id)?,
            None => Uuid::new_v4(),
        };

        self.items.push(ObjectItem {
            class_name: capitalize_first_letter(class_name),
            properties: properties.clone(),
            id,
            vector,
        });
        Ok(id)
    }

    /// Removes and returns the item at `index`, or the last one.
    ///
    /// # Errors
    /// Returns [`WeaveError::IndexOutOfRange`] when there is no such item.
    pub fn pop(&mut self, index: Option<usize>) -> Result<ObjectItem> {
        pop_at(&mut self.items, index)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[ObjectItem] {
        &self.items
    }

    /// Items as sent on the wire.
    ///
    /// # Errors
    /// Returns [`WeaveError::Serialization`] when an item cannot be encoded.
    pub fn item_values(&self) -> Result<Vec<Value>> {
        self.items.iter().map(|item| serde_json::to_value(item).map_err(WeaveError::from)).collect()
    }

    /// `{"fields": ["ALL"], "objects": [...]}`.
    ///
    /// # Errors
    /// Returns [`WeaveError::Serialization`] when an item cannot be encoded.
    pub fn request_body(&self) -> Result<Value> {
        Ok(json!({ "fields": ["ALL"], "objects": self.item_values()? }))
    }

    /// Puts previously taken items back in front of the current ones.
    pub(crate) fn restore(&mut self, mut taken: Self) {
        taken.items.append(&mut self.items);
        self.items = taken.items;
    }
}

/// Pending cross-references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceBatch {
    items: Vec<ReferenceItem>,
}

impl ReferenceBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and appends one reference from
    /// `<from_class>/<from_id>/<from_property>` to `[<to_class>/]<to_id>`.
    ///
    /// # Errors
    /// Returns [`WeaveError::InvalidInput`] for empty names or ids without a
    /// UUID.
    pub fn add(
        &mut self,
        from_class: &str,
        from_id: &str,
        from_property: &str,
        to_class: Option<&str>,
        to_id: &str,
    ) -> Result<()> {
        let from_class = capitalize_first_letter(required("from_class", from_class)?);
        let from_property = required("from_property", from_property)?;
        let from_id = parse_object_uuid(from_id)?;
        let to_id = parse_object_uuid(to_id)?;
        let to_class = match to_class {
            Some(name) => Some(capitalize_first_letter(required("to_class", name)?)),
            None => None,
        };

        self.items.push(ReferenceItem {
            from: property_beacon(&from_class, &from_id, from_property),
            to: object_beacon(to_class.as_deref(), &to_id),
        });
        Ok(())
    }

    /// Removes and returns the item at `index`, or the last one.
    ///
    /// # Errors
    /// Returns [`WeaveError::IndexOutOfRange`] when there is no such item.
    pub fn pop(&mut self, index: Option<usize>) -> Result<ReferenceItem> {
        pop_at(&mut self.items, index)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[ReferenceItem] {
        &self.items
    }

    /// The plain array of `{from, to}` pairs.
    ///
    /// # Errors
    /// Returns [`WeaveError::Serialization`] when an item cannot be encoded.
    pub fn request_body(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.items)?)
    }

    pub(crate) fn restore(&mut self, mut taken: Self) {
        taken.items.append(&mut self.items);
        self.items = taken.items;
    }
}

fn required<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(WeaveError::InvalidInput(format!("'{name}' must be a non-empty string")));
    }
    Ok(value)
}

fn pop_at<T>(items: &mut Vec<T>, index: Option<usize>) -> Result<T> {
    let len = items.len();
    let index = match index {
        Some(index) => index,
        None => len.checked_sub(1).ok_or(WeaveError::IndexOutOfRange { index: 0, len })?,
    };
    if index >= len {
        return Err(WeaveError::IndexOutOfRange { index, len });
    }
    Ok(items.remove(index))
}
