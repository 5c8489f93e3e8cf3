//! Link collection document shape
//!
//! The collection belongs to the link manager and is handled as raw JSON: an
//! array of groups, each carrying a `links` array of record objects. Only a
//! record's string `value` and its `icon` are interpreted here. Groups and
//! records that do not fit that shape are skipped and written back untouched.

use serde_json::{Map, Value};

pub const LINKS_FIELD: &str = "links";
pub const VALUE_FIELD: &str = "value";
pub const ICON_FIELD: &str = "icon";

/// Mutable view over one link record object
#[derive(Debug)]
pub struct LinkRecord<'a> {
    fields: &'a mut Map<String, Value>,
}

impl LinkRecord<'_> {
    /// The link target URL, when it is a string
    pub fn value(&self) -> Option<&str> {
        self.fields.get(VALUE_FIELD).and_then(Value::as_str)
    }

    pub fn icon(&self) -> Option<&str> {
        self.fields.get(ICON_FIELD).and_then(Value::as_str)
    }

    pub fn set_icon(&mut self, icon: Option<&str>) {
        let icon = icon.map_or(Value::Null, |icon| Value::String(icon.to_string()));
        self.fields.insert(ICON_FIELD.to_string(), icon);
    }
}

/// Every record object in the collection, in document order
pub fn records_mut(collection: &mut Value) -> impl Iterator<Item = LinkRecord<'_>> {
    collection
        .as_array_mut()
        .into_iter()
        .flatten()
        .filter_map(|group| group.get_mut(LINKS_FIELD))
        .filter_map(Value::as_array_mut)
        .flatten()
        .filter_map(Value::as_object_mut)
        .map(|fields| LinkRecord { fields })
}
