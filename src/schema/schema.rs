use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Integer,
    FullText,
    Boolean,
}

/// Field definition: a name bound to the indexing strategy for its values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
}

/// Ordered field name -> type mapping, fixed for the lifetime of a collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<FieldDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Schema { fields: Vec::new() }
    }

    /// Adds a field, replacing the type of an existing field with the same name.
    pub fn add_field(mut self, name: &str, field_type: FieldType) -> Self {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => existing.field_type = field_type,
            None => self.fields.push(FieldDefinition {
                name: name.to_string(),
                field_type,
            }),
        }
        self
    }

    pub fn add_string_field(self, name: &str) -> Self {
        self.add_field(name, FieldType::String)
    }

    pub fn add_integer_field(self, name: &str) -> Self {
        self.add_field(name, FieldType::Integer)
    }

    pub fn add_text_field(self, name: &str) -> Self {
        self.add_field(name, FieldType::FullText)
    }

    pub fn add_boolean_field(self, name: &str) -> Self {
        self.add_field(name, FieldType::Boolean)
    }

    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.field_type)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field_type(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, FieldType)> for Schema {
    fn from_iter<I: IntoIterator<Item = (&'a str, FieldType)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Schema::new(), |schema, (name, field_type)| schema.add_field(name, field_type))
    }
}
