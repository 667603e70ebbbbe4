//! Bidirectional text conversion for attribute values.
//!
//! A [`ConverterRegistry`] maps each declared [`TypeKey`] to one [`Codec`].
//! Widgets display values through [`ConverterRegistry::to_text`] and commit
//! user input through [`ConverterRegistry::from_text`] or
//! [`ConverterRegistry::from_object`].
//!
//! `String` never needs a codec: it passes through unchanged in both
//! directions. Codecs for enumerations are registered lazily the first time a
//! form meets the enum type. Registration is first-writer-wins.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::error::{FormError, ParseError, Result};
use crate::logging::targets;
use crate::value::{AnyValue, EnumMeta, FormEnum, TypeKey};

/// Converts values of one type to and from text.
pub trait Codec: Send + Sync {
    /// Renders a value. Fails with [`FormError::TypeMismatch`] when handed a
    /// value of another type.
    fn to_text(&self, value: &dyn Any) -> Result<String>;

    /// Parses text. Blank input yields `Ok(None)`.
    fn from_text(&self, text: &str) -> Result<Option<AnyValue>>;
}

/// Codec for any `FromStr + Display` type.
pub struct ParseCodec<T>(PhantomData<fn() -> T>);

impl<T> ParseCodec<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for ParseCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Codec for ParseCodec<T>
where
    T: FromStr + fmt::Display + Send + Sync + 'static,
    T::Err: fmt::Display,
{
    fn to_text(&self, value: &dyn Any) -> Result<String> {
        value
            .downcast_ref::<T>()
            .map(ToString::to_string)
            .ok_or_else(|| FormError::type_mismatch(std::any::type_name::<T>(), "another type"))
    }

    fn from_text(&self, text: &str) -> Result<Option<AnyValue>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed
            .parse::<T>()
            .map(|value| Some(Box::new(value) as AnyValue))
            .map_err(|err| ParseError::new(std::any::type_name::<T>(), text, err.to_string()).into())
    }
}

/// `bool` codec accepting `true`/`false` in any letter case.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoolCodec;

impl Codec for BoolCodec {
    fn to_text(&self, value: &dyn Any) -> Result<String> {
        value
            .downcast_ref::<bool>()
            .map(ToString::to_string)
            .ok_or_else(|| FormError::type_mismatch("bool", "another type"))
    }

    fn from_text(&self, text: &str) -> Result<Option<AnyValue>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if trimmed.eq_ignore_ascii_case("true") {
            Ok(Some(Box::new(true)))
        } else if trimmed.eq_ignore_ascii_case("false") {
            Ok(Some(Box::new(false)))
        } else {
            Err(ParseError::new("bool", text, "expected true or false").into())
        }
    }
}

type Formatter<T> = Box<dyn Fn(&T) -> String + Send + Sync>;
type Parser<T> = Box<dyn Fn(&str) -> std::result::Result<T, String> + Send + Sync>;

/// Codec built from a pair of closures.
///
/// ```
/// use horizon_forms_core::convert::FnCodec;
///
/// let codec = FnCodec::new(
///     |v: &u8| format!("{v:#04x}"),
///     |s| u8::from_str_radix(s.trim_start_matches("0x"), 16).map_err(|e| e.to_string()),
/// );
/// # let _ = codec;
/// ```
pub struct FnCodec<T> {
    format: Formatter<T>,
    parse: Parser<T>,
}

impl<T: Send + Sync + 'static> FnCodec<T> {
    pub fn new<F, P>(format: F, parse: P) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
        P: Fn(&str) -> std::result::Result<T, String> + Send + Sync + 'static,
    {
        Self {
            format: Box::new(format),
            parse: Box::new(parse),
        }
    }
}

impl<T: Send + Sync + 'static> Codec for FnCodec<T> {
    fn to_text(&self, value: &dyn Any) -> Result<String> {
        value
            .downcast_ref::<T>()
            .map(|v| (self.format)(v))
            .ok_or_else(|| FormError::type_mismatch(std::any::type_name::<T>(), "another type"))
    }

    fn from_text(&self, text: &str) -> Result<Option<AnyValue>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        (self.parse)(text)
            .map(|value| Some(Box::new(value) as AnyValue))
            .map_err(|message| ParseError::new(std::any::type_name::<T>(), text, message).into())
    }
}

/// Codec mapping enum variants to their names.
pub struct EnumCodec<E>(PhantomData<fn() -> E>);

impl<E> EnumCodec<E> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E> Default for EnumCodec<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: FormEnum> Codec for EnumCodec<E> {
    fn to_text(&self, value: &dyn Any) -> Result<String> {
        value
            .downcast_ref::<E>()
            .map(|v| v.variant_name().to_owned())
            .ok_or_else(|| FormError::type_mismatch(std::any::type_name::<E>(), "another type"))
    }

    fn from_text(&self, text: &str) -> Result<Option<AnyValue>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        E::from_variant_name(trimmed)
            .map(|v| Some(Box::new(v) as AnyValue))
            .ok_or_else(|| {
                ParseError::new(std::any::type_name::<E>(), text, "no such variant").into()
            })
    }
}

/// Registry of per-type codecs.
pub struct ConverterRegistry {
    codecs: RwLock<HashMap<TypeKey, Arc<dyn Codec>>>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterRegistry {
    /// A registry holding the built-in codecs.
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register::<i8>(ParseCodec::<i8>::new());
        registry.register::<i16>(ParseCodec::<i16>::new());
        registry.register::<i32>(ParseCodec::<i32>::new());
        registry.register::<i64>(ParseCodec::<i64>::new());
        registry.register::<i128>(ParseCodec::<i128>::new());
        registry.register::<isize>(ParseCodec::<isize>::new());
        registry.register::<u8>(ParseCodec::<u8>::new());
        registry.register::<u16>(ParseCodec::<u16>::new());
        registry.register::<u32>(ParseCodec::<u32>::new());
        registry.register::<u64>(ParseCodec::<u64>::new());
        registry.register::<u128>(ParseCodec::<u128>::new());
        registry.register::<usize>(ParseCodec::<usize>::new());
        registry.register::<f32>(ParseCodec::<f32>::new());
        registry.register::<f64>(ParseCodec::<f64>::new());
        registry.register::<char>(ParseCodec::<char>::new());
        registry.register::<Decimal>(ParseCodec::<Decimal>::new());
        registry.register::<bool>(BoolCodec);
        registry
    }

    /// A registry with no codecs at all.
    pub fn empty() -> Self {
        Self {
            codecs: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a codec unless one is already registered for `key`.
    ///
    /// Returns `true` if the codec was inserted.
    pub fn add_converter(&self, key: TypeKey, codec: Arc<dyn Codec>) -> bool {
        let mut codecs = self.codecs.write();
        if codecs.contains_key(&key) {
            return false;
        }
        codecs.insert(key, codec);
        true
    }

    /// Typed form of [`add_converter`](Self::add_converter).
    pub fn register<T: Any>(&self, codec: impl Codec + 'static) -> bool {
        self.add_converter(TypeKey::of::<T>(), Arc::new(codec))
    }

    /// Registers the codec for an enum type if it has none yet.
    pub fn ensure_enum(&self, meta: &EnumMeta) -> bool {
        if self.contains(meta.key()) {
            return false;
        }
        let inserted = self.add_converter(meta.key(), meta.codec());
        if inserted {
            tracing::debug!(target: targets::CONVERT, enum_type = meta.key().name(), "registered enum codec");
        }
        inserted
    }

    pub fn contains(&self, key: TypeKey) -> bool {
        key.is::<String>() || self.codecs.read().contains_key(&key)
    }

    /// The codec for `key`, if any.
    pub fn codec(&self, key: TypeKey) -> Option<Arc<dyn Codec>> {
        self.codecs.read().get(&key).cloned()
    }

    /// Number of registered codecs.
    pub fn len(&self) -> usize {
        self.codecs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.read().is_empty()
    }

    fn require(&self, key: TypeKey) -> Result<Arc<dyn Codec>> {
        self.codec(key).ok_or_else(|| FormError::no_converter(key.name()))
    }

    /// Renders a value of the declared type `key`. Absent values render as
    /// the empty string.
    pub fn to_text(&self, key: TypeKey, value: Option<&dyn Any>) -> Result<String> {
        let Some(value) = value else {
            return Ok(String::new());
        };
        if key.is::<String>() {
            return value
                .downcast_ref::<String>()
                .cloned()
                .ok_or_else(|| FormError::type_mismatch("String", "another type"));
        }
        self.require(key)?.to_text(value)
    }

    /// Parses text into the declared type `key`.
    pub fn from_text(&self, key: TypeKey, text: Option<&str>) -> Result<Option<AnyValue>> {
        let Some(text) = text else {
            return Ok(None);
        };
        if key.is::<String>() {
            return Ok(Some(Box::new(text.to_owned())));
        }
        self.require(key)?.from_text(text)
    }

    /// Converts an arbitrary value into the declared type `key`.
    ///
    /// Values already of that type pass through. Others are rendered with
    /// their own type's codec and parsed with the declared type's codec.
    pub fn from_object(&self, key: TypeKey, value: Option<AnyValue>) -> Result<Option<AnyValue>> {
        let Some(value) = value else {
            return Ok(None);
        };
        let source = TypeKey::erased((*value).type_id());
        if source == key {
            return Ok(Some(value));
        }

        let text = if let Some(text) = value.downcast_ref::<String>() {
            text.clone()
        } else {
            let codec = self
                .codec(source)
                .ok_or_else(|| FormError::no_converter(format!("{:?}", source.id())))?;
            codec.to_text(&*value)?
        };
        tracing::trace!(target: targets::CONVERT, declared = key.name(), %text, "converting through text");
        self.from_text(key, Some(&text))
    }

    /// Typed form of [`to_text`](Self::to_text).
    pub fn to_text_typed<T: Any>(&self, value: Option<&T>) -> Result<String> {
        self.to_text(TypeKey::of::<T>(), value.map(|v| v as &dyn Any))
    }

    /// Typed form of [`from_text`](Self::from_text).
    pub fn from_text_typed<T: Any>(&self, text: Option<&str>) -> Result<Option<T>> {
        match self.from_text(TypeKey::of::<T>(), text)? {
            Some(value) => crate::value::downcast_value::<T>(value).map(Some),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codecs = self.codecs.read();
        let mut names: Vec<_> = codecs.keys().map(TypeKey::name).collect();
        names.sort_unstable();
        f.debug_struct("ConverterRegistry").field("codecs", &names).finish()
    }
}
