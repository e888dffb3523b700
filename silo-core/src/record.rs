use crate::{AsValue, Result, ScalarKind, Value};
use anyhow::anyhow;
use std::{
    any::Any,
    collections::HashMap,
    fmt,
    sync::Arc,
};

/// A typed setter for one field of a record, resolved once at registration
/// time. The closure owns the traversal into nested records, so a field
/// path like `contact.email` costs nothing extra per row.
pub struct FieldAccessor {
    path: String,
    kind: ScalarKind,
    set: Arc<dyn Fn(&mut (dyn Any + Send), Value) -> Result<()> + Send + Sync>,
}

impl FieldAccessor {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    pub(crate) fn set(&self, record: &mut (dyn Any + Send), value: Value) -> Result<()> {
        (self.set)(record, value)
    }
}

impl fmt::Debug for FieldAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Column-to-field binding table for one record type, built once when the
/// type is registered on a data source. Statement compilation resolves
/// result maps and direct-record shapes against it; nothing is introspected
/// per row.
pub struct RecordDescriptor {
    type_name: String,
    instantiate: Box<dyn Fn() -> Box<dyn Any + Send> + Send + Sync>,
    fields: HashMap<String, Arc<FieldAccessor>>,
    // lowercased path -> accessor, for implicit column matching
    normalized: HashMap<String, Arc<FieldAccessor>>,
}

impl RecordDescriptor {
    /// Start describing `R`. The type name is how definition documents
    /// refer to the record.
    pub fn of<R: Default + Send + 'static>(type_name: impl Into<String>) -> RecordBuilder<R> {
        RecordBuilder {
            type_name: type_name.into(),
            fields: Vec::new(),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub(crate) fn new_record(&self) -> Box<dyn Any + Send> {
        (self.instantiate)()
    }

    /// Exact lookup by declared field path.
    pub fn field(&self, path: &str) -> Option<&Arc<FieldAccessor>> {
        self.fields.get(path)
    }

    /// Case-normalized lookup by column name, for direct-record shapes.
    pub fn field_for_column(&self, column: &str) -> Option<&Arc<FieldAccessor>> {
        self.normalized.get(&column.to_lowercase())
    }
}

impl fmt::Debug for RecordDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordDescriptor")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

pub struct RecordBuilder<R> {
    type_name: String,
    fields: Vec<(String, Arc<FieldAccessor>)>,
    _marker: std::marker::PhantomData<fn() -> R>,
}

impl<R: Default + Send + 'static> RecordBuilder<R> {
    /// Register a field. `V` fixes the column kind read from the row; the
    /// closure writes the converted value into the record, traversing into
    /// nested records as needed. Use an `Option` field together with a
    /// result-map nil sentinel to carry an absent signal.
    pub fn field<V: AsValue + 'static>(
        mut self,
        path: impl Into<String>,
        apply: impl Fn(&mut R, V) + Send + Sync + 'static,
    ) -> Self {
        let path = path.into();
        let accessor = FieldAccessor {
            path: path.clone(),
            kind: V::kind(),
            set: Arc::new(move |target: &mut (dyn Any + Send), value: Value| {
                let record = target
                    .downcast_mut::<R>()
                    .ok_or_else(|| anyhow!("record instance does not match its descriptor"))?;
                apply(record, V::try_from_value(value)?);
                Ok(())
            }),
        };
        self.fields.push((path, Arc::new(accessor)));
        self
    }

    pub fn build(self) -> RecordDescriptor {
        let mut fields = HashMap::with_capacity(self.fields.len());
        let mut normalized = HashMap::with_capacity(self.fields.len());
        for (path, accessor) in self.fields {
            normalized.insert(path.to_lowercase(), accessor.clone());
            fields.insert(path, accessor);
        }
        RecordDescriptor {
            type_name: self.type_name,
            instantiate: Box::new(|| Box::new(R::default()) as Box<dyn Any + Send>),
            fields,
            normalized,
        }
    }
}
