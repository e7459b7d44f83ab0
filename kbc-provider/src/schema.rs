//! Declarative description of the configuration a resource accepts.

/// Value type of a configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Bool,
    /// Ordered list of strings.
    StringList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    /// A change to this field cannot be applied in place; the resource has to be replaced.
    pub force_new: bool,
}

impl FieldSchema {
    pub const fn required(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: true,
            force_new: false,
        }
    }

    pub const fn optional(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
            force_new: false,
        }
    }

    pub const fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSchema {
    pub type_name: &'static str,
    pub fields: Vec<FieldSchema>,
}

impl ResourceSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// A resource without any in-place updatable field only supports create, read and delete.
    pub fn is_immutable(&self) -> bool {
        self.fields.iter().all(|f| f.force_new)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter().filter(|f| f.required)
    }
}
