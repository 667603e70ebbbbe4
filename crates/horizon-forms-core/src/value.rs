//! Type-erased attribute values and the traits that classify field types.
//!
//! Every attribute slot of a [`Bindable`](crate::Bindable) type implements
//! [`FormField`]. The trait reports the slot's [`FieldShape`] (which drives
//! widget selection) and moves values in and out as [`AnyValue`] boxes.
//!
//! Implementations ship for the numeric primitives, `String`, `bool`, `char`,
//! [`Decimal`] and `Option<T>` of any of them. Enumerations get theirs from
//! `#[derive(FormEnum)]`, nested objects from `#[derive(Bindable)]`, and any
//! other plain value type from [`form_value!`](crate::form_value).

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::convert::{Codec, EnumCodec};
use crate::error::{FormError, ParseError, Result};
use crate::schema::{Bindable, FormMeta};

/// A type-erased attribute value.
pub type AnyValue = Box<dyn Any + Send + Sync>;

/// Identifies a declared attribute type.
///
/// Equality and hashing use only the [`TypeId`]; the name is carried for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// The key for `T`.
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Key for a runtime type id whose name is not known.
    pub(crate) fn erased(id: TypeId) -> Self {
        Self {
            id,
            name: "<unnamed type>",
        }
    }

    /// The underlying type id.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The full type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type name without its module path.
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        match base.rfind("::") {
            Some(idx) => &self.name[idx + 2..],
            None => self.name,
        }
    }

    /// Returns `true` if this key names `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The numeric primitives a stepper can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
}

impl NumericKind {
    /// Whether values of this kind have no fractional part.
    pub fn is_integral(self) -> bool {
        !matches!(self, Self::F32 | Self::F64)
    }

    /// Default stepper bounds for this kind.
    ///
    /// Integer kinds use their own range, limited to what [`Decimal`] can
    /// hold. Floating kinds use the `i32` range.
    pub fn bounds(self) -> (Decimal, Decimal) {
        match self {
            Self::I8 => (Decimal::from(i8::MIN), Decimal::from(i8::MAX)),
            Self::I16 => (Decimal::from(i16::MIN), Decimal::from(i16::MAX)),
            Self::I32 | Self::F32 | Self::F64 => (Decimal::from(i32::MIN), Decimal::from(i32::MAX)),
            Self::I64 => (Decimal::from(i64::MIN), Decimal::from(i64::MAX)),
            Self::Isize => (
                Decimal::from(isize::MIN as i64),
                Decimal::from(isize::MAX as i64),
            ),
            Self::I128 => (Decimal::MIN, Decimal::MAX),
            Self::U8 => (Decimal::ZERO, Decimal::from(u8::MAX)),
            Self::U16 => (Decimal::ZERO, Decimal::from(u16::MAX)),
            Self::U32 => (Decimal::ZERO, Decimal::from(u32::MAX)),
            Self::U64 => (Decimal::ZERO, Decimal::from(u64::MAX)),
            Self::Usize => (Decimal::ZERO, Decimal::from(usize::MAX as u64)),
            Self::U128 => (Decimal::ZERO, Decimal::MAX),
        }
    }

    /// Reads a boxed value of this kind as a [`Decimal`].
    ///
    /// Returns `None` when the value is of another type or cannot be
    /// represented (NaN, infinities, magnitudes beyond `Decimal`).
    pub fn to_decimal(self, value: &dyn Any) -> Option<Decimal> {
        fn int<T: Copy + Into<i128> + 'static>(value: &dyn Any) -> Option<Decimal> {
            value
                .downcast_ref::<T>()
                .and_then(|v| Decimal::from_i128((*v).into()))
        }
        fn float<T: fmt::Display + 'static>(value: &dyn Any) -> Option<Decimal> {
            value
                .downcast_ref::<T>()
                .and_then(|v| Decimal::from_str(&v.to_string()).ok())
        }

        match self {
            Self::I8 => int::<i8>(value),
            Self::I16 => int::<i16>(value),
            Self::I32 => int::<i32>(value),
            Self::I64 => int::<i64>(value),
            Self::I128 => int::<i128>(value),
            Self::Isize => value
                .downcast_ref::<isize>()
                .and_then(|v| Decimal::from_isize(*v)),
            Self::U8 => int::<u8>(value),
            Self::U16 => int::<u16>(value),
            Self::U32 => int::<u32>(value),
            Self::U64 => int::<u64>(value),
            Self::U128 => value
                .downcast_ref::<u128>()
                .and_then(|v| Decimal::from_u128(*v)),
            Self::Usize => value
                .downcast_ref::<usize>()
                .and_then(|v| Decimal::from_usize(*v)),
            Self::F32 => float::<f32>(value),
            Self::F64 => float::<f64>(value),
        }
    }
}

/// How a plain value slot is presented and converted.
#[derive(Debug, Clone, Copy)]
pub enum ValueKind {
    /// A numeric primitive, edited with a stepper.
    Numeric(NumericKind),
    /// An enumeration, edited with a choice list.
    Enum(EnumMeta),
    /// `String`.
    Text,
    /// `bool`.
    Boolean,
    /// `char`.
    Character,
    /// [`Decimal`].
    Decimal,
    /// A type declared with [`form_value!`](crate::form_value); needs a codec
    /// registered with the context.
    Custom,
}

/// The shape of an attribute slot.
#[derive(Debug, Clone, Copy)]
pub enum FieldShape {
    /// A single value converted to and from text.
    Value { key: TypeKey, kind: ValueKind },
    /// A composite object rendered as an embedded sub-form.
    Nested {
        key: TypeKey,
        schema: fn() -> &'static FormMeta,
    },
}

impl FieldShape {
    /// The declared type of the slot.
    pub fn key(&self) -> TypeKey {
        match self {
            Self::Value { key, .. } | Self::Nested { key, .. } => *key,
        }
    }

    /// Returns `true` for nested objects.
    pub fn is_nested(&self) -> bool {
        matches!(self, Self::Nested { .. })
    }
}

/// A type that can occupy an attribute slot.
pub trait FormField: Send + Sync + 'static {
    /// Classifies the slot type.
    fn shape() -> FieldShape
    where
        Self: Sized;

    /// The current value, `None` when absent.
    fn read(&self) -> Option<AnyValue>;

    /// Builds a slot value from a type-erased value.
    fn from_value(value: AnyValue) -> Result<Self>
    where
        Self: Sized;

    /// Replaces the slot value. `None` clears optional slots and is
    /// rejected by required ones.
    fn write(&mut self, value: Option<AnyValue>) -> Result<()>
    where
        Self: Sized,
    {
        match value {
            Some(value) => {
                *self = Self::from_value(value)?;
                Ok(())
            }
            None => Err(ParseError::required(std::any::type_name::<Self>()).into()),
        }
    }

    /// The nested object, for composite slots.
    fn nested(&self) -> Option<&dyn Bindable> {
        None
    }

    /// Mutable access to the nested object, for composite slots.
    fn nested_mut(&mut self) -> Option<&mut dyn Bindable> {
        None
    }
}

/// Unboxes a type-erased value into `T`.
pub fn downcast_value<T: Any>(value: AnyValue) -> Result<T> {
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| FormError::type_mismatch(std::any::type_name::<T>(), "a value of another type"))
}

impl<T: FormField> FormField for Option<T> {
    fn shape() -> FieldShape {
        T::shape()
    }

    fn read(&self) -> Option<AnyValue> {
        self.as_ref().and_then(FormField::read)
    }

    fn from_value(value: AnyValue) -> Result<Self> {
        T::from_value(value).map(Some)
    }

    fn write(&mut self, value: Option<AnyValue>) -> Result<()> {
        match (self.as_mut(), value) {
            (_, None) => {
                *self = None;
                Ok(())
            }
            (Some(inner), Some(value)) => inner.write(Some(value)),
            (None, Some(value)) => {
                *self = Some(T::from_value(value)?);
                Ok(())
            }
        }
    }

    fn nested(&self) -> Option<&dyn Bindable> {
        self.as_ref().and_then(FormField::nested)
    }

    fn nested_mut(&mut self) -> Option<&mut dyn Bindable> {
        self.as_mut().and_then(FormField::nested_mut)
    }
}

macro_rules! plain_field {
    ($($ty:ty => $kind:expr),* $(,)?) => {
        $(
            impl FormField for $ty {
                fn shape() -> FieldShape {
                    FieldShape::Value {
                        key: TypeKey::of::<$ty>(),
                        kind: $kind,
                    }
                }

                fn read(&self) -> Option<AnyValue> {
                    Some(Box::new(self.clone()))
                }

                fn from_value(value: AnyValue) -> Result<Self> {
                    downcast_value::<$ty>(value)
                }
            }
        )*
    };
}

plain_field! {
    i8 => ValueKind::Numeric(NumericKind::I8),
    i16 => ValueKind::Numeric(NumericKind::I16),
    i32 => ValueKind::Numeric(NumericKind::I32),
    i64 => ValueKind::Numeric(NumericKind::I64),
    i128 => ValueKind::Numeric(NumericKind::I128),
    isize => ValueKind::Numeric(NumericKind::Isize),
    u8 => ValueKind::Numeric(NumericKind::U8),
    u16 => ValueKind::Numeric(NumericKind::U16),
    u32 => ValueKind::Numeric(NumericKind::U32),
    u64 => ValueKind::Numeric(NumericKind::U64),
    u128 => ValueKind::Numeric(NumericKind::U128),
    usize => ValueKind::Numeric(NumericKind::Usize),
    f32 => ValueKind::Numeric(NumericKind::F32),
    f64 => ValueKind::Numeric(NumericKind::F64),
    String => ValueKind::Text,
    bool => ValueKind::Boolean,
    char => ValueKind::Character,
    Decimal => ValueKind::Decimal,
}

/// Implements [`FormField`] for plain value types edited as text.
///
/// The types must be `Clone + Send + Sync + 'static`, and a codec for each
/// has to be registered with the form context before a form that uses it is
/// generated.
///
/// ```
/// use horizon_forms_core::form_value;
///
/// #[derive(Clone)]
/// struct Hostname(String);
///
/// form_value!(Hostname);
/// ```
#[macro_export]
macro_rules! form_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::FormField for $ty {
                fn shape() -> $crate::FieldShape {
                    $crate::FieldShape::Value {
                        key: $crate::TypeKey::of::<$ty>(),
                        kind: $crate::ValueKind::Custom,
                    }
                }

                fn read(&self) -> ::std::option::Option<$crate::AnyValue> {
                    ::std::option::Option::Some(::std::boxed::Box::new(
                        ::std::clone::Clone::clone(self),
                    ))
                }

                fn from_value(value: $crate::AnyValue) -> $crate::Result<Self> {
                    $crate::value::downcast_value::<$ty>(value)
                }
            }
        )+
    };
}

/// An enumeration whose variants can be offered in a choice list.
///
/// Usually derived with `#[derive(FormEnum)]` on a fieldless enum.
pub trait FormEnum: Clone + Send + Sync + 'static {
    /// All variants in declaration order.
    fn variants() -> &'static [Self];

    /// The display name of this variant.
    fn variant_name(&self) -> &'static str;

    /// Position of this variant in [`variants`](Self::variants).
    fn variant_index(&self) -> usize {
        let name = self.variant_name();
        Self::variants()
            .iter()
            .position(|v| v.variant_name() == name)
            .unwrap_or(0)
    }

    /// Looks a variant up by its display name.
    fn from_variant_name(name: &str) -> Option<Self> {
        Self::variants()
            .iter()
            .find(|v| v.variant_name() == name)
            .cloned()
    }
}

/// Type-erased description of a [`FormEnum`] type.
#[derive(Clone, Copy)]
pub struct EnumMeta {
    key: TypeKey,
    names: fn() -> Vec<&'static str>,
    value_at: fn(usize) -> Option<AnyValue>,
    index_of: fn(&dyn Any) -> Option<usize>,
    codec: fn() -> Arc<dyn Codec>,
}

impl EnumMeta {
    /// Describes `E`.
    pub fn of<E: FormEnum>() -> Self {
        fn names<E: FormEnum>() -> Vec<&'static str> {
            E::variants().iter().map(FormEnum::variant_name).collect()
        }
        fn value_at<E: FormEnum>(index: usize) -> Option<AnyValue> {
            E::variants()
                .get(index)
                .map(|v| Box::new(v.clone()) as AnyValue)
        }
        fn index_of<E: FormEnum>(value: &dyn Any) -> Option<usize> {
            value.downcast_ref::<E>().map(FormEnum::variant_index)
        }
        fn codec<E: FormEnum>() -> Arc<dyn Codec> {
            Arc::new(EnumCodec::<E>::new())
        }

        Self {
            key: TypeKey::of::<E>(),
            names: names::<E>,
            value_at: value_at::<E>,
            index_of: index_of::<E>,
            codec: codec::<E>,
        }
    }

    /// The enum type.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Variant names in declaration order.
    pub fn variant_names(&self) -> Vec<&'static str> {
        (self.names)()
    }

    /// The variant at `index`, boxed.
    pub fn value_at(&self, index: usize) -> Option<AnyValue> {
        (self.value_at)(index)
    }

    /// The index of a boxed variant.
    pub fn index_of(&self, value: &dyn Any) -> Option<usize> {
        (self.index_of)(value)
    }

    /// A fresh text codec for the enum.
    pub fn codec(&self) -> Arc<dyn Codec> {
        (self.codec)()
    }
}

impl fmt::Debug for EnumMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumMeta")
            .field("key", &self.key)
            .field("variants", &self.variant_names())
            .finish()
    }
}
