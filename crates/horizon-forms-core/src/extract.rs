//! Attribute extraction across the inheritance chain.
//!
//! [`extract`] walks a schema and every parent it extends, producing one
//! [`AttributeDescriptor`] per attribute: the type's own attributes first,
//! then the parent's, then the grandparent's, up to the root. Declaration
//! order is kept within each type.
//!
//! A descriptor remembers how to reach its declaring struct from the object
//! the walk started at, so it can read and write the attribute given only
//! that object.

use std::fmt;
use std::sync::Arc;

use crate::error::{FormError, Result};
use crate::schema::{Bindable, BindingMeta, FieldMeta, FormMeta, ParentLink};
use crate::value::{AnyValue, FieldShape, TypeKey};

/// One attribute of a bound object, resolved for a generation pass.
///
/// Identity is the pair (declaring type, attribute name).
#[derive(Clone)]
pub struct AttributeDescriptor {
    field: &'static FieldMeta,
    lineage: Arc<[&'static ParentLink]>,
    bound: TypeKey,
}

impl AttributeDescriptor {
    /// Attribute name as declared.
    pub fn name(&self) -> &'static str {
        self.field.name()
    }

    /// The type that declares the attribute.
    pub fn owner(&self) -> TypeKey {
        self.field.owner()
    }

    /// The type the extraction started from. Differs from [`owner`](Self::owner)
    /// for inherited attributes.
    pub fn bound_type(&self) -> TypeKey {
        self.bound
    }

    /// The declared type of the attribute.
    pub fn declared_type(&self) -> TypeKey {
        self.field.shape().key()
    }

    pub fn shape(&self) -> &FieldShape {
        self.field.shape()
    }

    pub fn binding(&self) -> &BindingMeta {
        self.field.binding()
    }

    /// Returns `true` if the attribute is declared on a parent type.
    pub fn is_inherited(&self) -> bool {
        !self.lineage.is_empty()
    }

    fn resolve<'a>(&self, object: &'a dyn Bindable) -> Result<&'a dyn Bindable> {
        self.check_bound(object)?;
        let mut current = object;
        for link in self.lineage.iter() {
            current = link.access().project(current)?;
        }
        Ok(current)
    }

    fn resolve_mut<'a>(&self, object: &'a mut dyn Bindable) -> Result<&'a mut dyn Bindable> {
        self.check_bound(object)?;
        let mut current = object;
        for link in self.lineage.iter() {
            current = link.access().project_mut(current)?;
        }
        Ok(current)
    }

    fn check_bound(&self, object: &dyn Bindable) -> Result<()> {
        if object.form_meta().key() == self.bound {
            Ok(())
        } else {
            Err(FormError::attribute_access(
                object.form_meta().key().name(),
                self.name(),
                format!("attribute was extracted from {}", self.bound),
            ))
        }
    }

    /// Reads the attribute from `object`, the object the extraction started at.
    pub fn read(&self, object: &dyn Bindable) -> Result<Option<AnyValue>> {
        let owner = self.resolve(object)?;
        self.field.access().read(owner)
    }

    /// Writes the attribute on `object`.
    pub fn write(&self, object: &mut dyn Bindable, value: Option<AnyValue>) -> Result<()> {
        let owner = self.resolve_mut(object)?;
        self.field.access().write(owner, value)
    }

    /// The nested object held by a composite attribute.
    pub fn nested<'a>(&self, object: &'a dyn Bindable) -> Result<Option<&'a dyn Bindable>> {
        let owner = self.resolve(object)?;
        self.field.access().nested(owner)
    }

    /// Mutable access to the nested object held by a composite attribute.
    pub fn nested_mut<'a>(
        &self,
        object: &'a mut dyn Bindable,
    ) -> Result<Option<&'a mut dyn Bindable>> {
        let owner = self.resolve_mut(object)?;
        self.field.access().nested_mut(owner)
    }
}

impl PartialEq for AttributeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.owner() == other.owner() && self.name() == other.name()
    }
}

impl Eq for AttributeDescriptor {}

impl fmt::Debug for AttributeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeDescriptor")
            .field("name", &self.name())
            .field("owner", &self.owner())
            .field("declared", &self.declared_type())
            .field("inherited", &self.is_inherited())
            .finish()
    }
}

impl fmt::Display for AttributeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner().short_name(), self.name())
    }
}

/// Collects every attribute of `schema` and its ancestors.
///
/// Own attributes come first, then each parent's in turn. Fails with
/// [`FormError::AttributeAccess`] if the parent chain loops back on itself.
pub fn extract(schema: &'static FormMeta) -> Result<Vec<AttributeDescriptor>> {
    let mut attributes = Vec::new();
    let mut lineage: Vec<&'static ParentLink> = Vec::new();
    let mut visited = vec![schema.key()];
    let mut current = schema;

    loop {
        let path: Arc<[&'static ParentLink]> = lineage.clone().into();
        attributes.extend(current.fields().iter().map(|field| AttributeDescriptor {
            field,
            lineage: path.clone(),
            bound: schema.key(),
        }));

        let Some(link) = current.parent() else {
            break;
        };
        let parent = link.schema();
        if visited.contains(&parent.key()) {
            return Err(FormError::attribute_access(
                current.key().name(),
                link.field(),
                format!("inheritance chain revisits {}", parent.key()),
            ));
        }
        visited.push(parent.key());
        lineage.push(link);
        current = parent;
    }

    tracing::trace!(
        target: crate::logging::targets::GENERATE,
        bound = schema.key().name(),
        count = attributes.len(),
        "extracted attributes"
    );
    Ok(attributes)
}

/// Collects the attributes of a live object.
pub fn extract_for(object: &dyn Bindable) -> Result<Vec<AttributeDescriptor>> {
    extract(object.form_meta())
}
