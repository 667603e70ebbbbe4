//! Procedural macros for Horizon Forms schemas.
//!
//! This crate provides `#[derive(Bindable)]`, which builds the static form
//! schema of a struct, and `#[derive(FormEnum)]`, which lets a fieldless enum
//! be edited with a choice list.
//!
//! # Attributes
//!
//! ## `#[form]` on fields
//!
//! Only fields carrying `#[form]` take part in form generation:
//!
//! ```ignore
//! #[derive(Bindable)]
//! #[form(on_change = "changed")]
//! struct Receiver {
//!     #[form(extends)]
//!     base: Device,
//!
//!     #[form(tooltip = "UDP port to listen on")]
//!     port: u16,
//!
//!     #[form(options("low", "high"))]
//!     gain: String,
//!
//!     #[form(multiline)]
//!     notes: String,
//!
//!     #[form(read_only)]
//!     serial: String,
//!
//!     cache: Vec<u8>,
//! }
//! ```
//!
//! Field attributes:
//! - `editable = false` or `read_only`: the widget does not accept edits
//! - `options("a", "b")` or `options = ["a", "b"]`: offer a fixed choice list
//! - `multiline` or `widget = "text_area"`: pick the text widget
//! - `tooltip = "..."`: tooltip text for the label and the widget
//! - `extends`: inherit the attributes of this embedded parent object
//!
//! ## `#[form]` on the struct
//!
//! - `on_change = "method"`: call `self.method(&AttributeDescriptor)` after
//!   every committed change. Repeatable. The method may return `()` or
//!   `Result<(), E>` with a displayable `E`.
//! - `crate = "path"`: path of the core crate, when it is not a direct
//!   dependency under its own name.
//!
//! ## `#[form(rename = "...")]` on enum variants
//!
//! Sets the text shown in the choice list.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::parse::Parse;
use syn::{
    Attribute, Data, DeriveInput, Expr, ExprArray, ExprLit, Field, Fields, Ident, Lit, LitBool,
    LitStr, Path, Token, Type, parse_macro_input,
};

/// Derive `Bindable` and `FormField` for a struct with named fields.
///
/// This macro generates:
/// - A lazily built static `FormMeta` listing the `#[form]` fields in
///   declaration order
/// - Implementation of the `Bindable` trait
/// - Implementation of `FormField`, so the struct can itself be a nested
///   attribute of another bindable struct
///
/// # Example
///
/// ```ignore
/// use horizon_forms::prelude::*;
///
/// #[derive(Bindable, Default)]
/// #[form(on_change = "port_changed")]
/// struct Endpoint {
///     #[form]
///     host: String,
///
///     #[form(tooltip = "1-65535")]
///     port: u16,
/// }
///
/// impl Endpoint {
///     fn port_changed(&mut self, attribute: &AttributeDescriptor) {
///         println!("{} changed", attribute.name());
///     }
/// }
/// ```
#[proc_macro_derive(Bindable, attributes(form))]
pub fn derive_bindable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match impl_derive_bindable(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derive `FormEnum` and `FormField` for a fieldless enum.
///
/// The enum must also implement `Clone`.
///
/// ```ignore
/// #[derive(FormEnum, Clone, Debug, PartialEq)]
/// enum Parity {
///     None,
///     Even,
///     #[form(rename = "Odd parity")]
///     Odd,
/// }
/// ```
#[proc_macro_derive(FormEnum, attributes(form))]
pub fn derive_form_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match impl_derive_form_enum(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Parsed struct-level `#[form(...)]` attributes.
struct StructAttrs {
    handlers: Vec<LitStr>,
    krate: Path,
}

/// Parsed attribute field information.
struct AttributeInfo {
    field_name: Ident,
    field_type: Type,
    editable: bool,
    options: Vec<LitStr>,
    widget: Option<LitStr>,
    tooltip: Option<LitStr>,
    extends: bool,
}

fn impl_derive_bindable(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Bindable derive does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Bindable derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Bindable derive only supports structs",
            ));
        }
    };

    let struct_attrs = parse_struct_attrs(&input.attrs)?;
    let krate = &struct_attrs.krate;

    let mut attributes = Vec::new();
    for field in fields.iter() {
        if let Some(info) = parse_attribute_field(field)? {
            attributes.push(info);
        }
    }

    let parents: Vec<&AttributeInfo> = attributes.iter().filter(|a| a.extends).collect();
    if let [_, second, ..] = parents.as_slice() {
        return Err(syn::Error::new_spanned(
            &second.field_name,
            "only one field may be marked #[form(extends)]",
        ));
    }

    let field_calls = attributes
        .iter()
        .map(|info| generate_field_call(struct_name, krate, info));
    let handler_calls = struct_attrs
        .handlers
        .iter()
        .map(|method| generate_handler_call(struct_name, krate, method));

    Ok(quote! {
        impl #krate::Bindable for #struct_name {
            fn schema() -> &'static #krate::FormMeta {
                static META: ::std::sync::OnceLock<#krate::FormMeta> = ::std::sync::OnceLock::new();
                META.get_or_init(|| {
                    #krate::FormMeta::builder::<#struct_name>()
                        #(#field_calls)*
                        #(#handler_calls)*
                        .build()
                })
            }

            fn form_meta(&self) -> &'static #krate::FormMeta {
                <Self as #krate::Bindable>::schema()
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
        }

        impl #krate::FormField for #struct_name {
            fn shape() -> #krate::FieldShape {
                #krate::FieldShape::Nested {
                    key: #krate::TypeKey::of::<Self>(),
                    schema: <Self as #krate::Bindable>::schema,
                }
            }

            fn read(&self) -> ::std::option::Option<#krate::AnyValue> {
                ::std::option::Option::None
            }

            fn from_value(value: #krate::AnyValue) -> #krate::Result<Self> {
                #krate::value::downcast_value::<Self>(value)
            }

            fn nested(&self) -> ::std::option::Option<&dyn #krate::Bindable> {
                ::std::option::Option::Some(self)
            }

            fn nested_mut(&mut self) -> ::std::option::Option<&mut dyn #krate::Bindable> {
                ::std::option::Option::Some(self)
            }
        }
    })
}

/// Parse struct-level #[form(...)] attributes.
fn parse_struct_attrs(attrs: &[Attribute]) -> syn::Result<StructAttrs> {
    let mut result = StructAttrs {
        handlers: Vec::new(),
        krate: syn::parse_quote!(::horizon_forms_core),
    };

    for attr in attrs {
        if !attr.path().is_ident("form") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("on_change") {
                result.handlers.push(meta.value()?.parse()?);
            } else if meta.path.is_ident("crate") {
                let path: LitStr = meta.value()?.parse()?;
                result.krate = path.parse()?;
            } else {
                return Err(meta.error("unknown struct-level form attribute"));
            }
            Ok(())
        })?;
    }

    Ok(result)
}

/// Parse a field with #[form] attribute.
fn parse_attribute_field(field: &Field) -> syn::Result<Option<AttributeInfo>> {
    let field_name = match &field.ident {
        Some(name) => name.clone(),
        None => return Ok(None),
    };

    let mut info = AttributeInfo {
        field_name,
        field_type: field.ty.clone(),
        editable: true,
        options: Vec::new(),
        widget: None,
        tooltip: None,
        extends: false,
    };
    let mut has_form_attr = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("form") {
            continue;
        }
        has_form_attr = true;

        // Bare #[form] carries no arguments.
        if !matches!(attr.meta, syn::Meta::List(_)) {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("editable") {
                let value: LitBool = meta.value()?.parse()?;
                info.editable = value.value;
            } else if meta.path.is_ident("read_only") {
                info.editable = false;
            } else if meta.path.is_ident("options") {
                if meta.input.peek(Token![=]) {
                    let array: ExprArray = meta.value()?.parse()?;
                    info.options = array
                        .elems
                        .iter()
                        .map(string_literal)
                        .collect::<syn::Result<_>>()?;
                } else {
                    let content;
                    syn::parenthesized!(content in meta.input);
                    info.options = content
                        .parse_terminated(<LitStr as Parse>::parse, Token![,])?
                        .into_iter()
                        .collect();
                }
            } else if meta.path.is_ident("multiline") || meta.path.is_ident("multi_line") {
                info.widget = Some(LitStr::new("multi_line", meta.path.require_ident()?.span()));
            } else if meta.path.is_ident("widget") {
                info.widget = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("tooltip") {
                info.tooltip = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("extends") {
                info.extends = true;
            } else {
                return Err(meta.error("unknown form attribute"));
            }
            Ok(())
        })?;
    }

    Ok(has_form_attr.then_some(info))
}

fn string_literal(expr: &Expr) -> syn::Result<LitStr> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(lit_str),
            ..
        }) => Ok(lit_str.clone()),
        other => Err(syn::Error::new_spanned(other, "expected a string literal")),
    }
}

/// Generate the builder call that registers one field.
fn generate_field_call(struct_name: &Ident, krate: &Path, info: &AttributeInfo) -> TokenStream2 {
    let field_name = &info.field_name;
    let field_type = &info.field_type;
    let name_str = field_name.to_string();

    if info.extends {
        return quote! {
            .extends::<#field_type>(
                #name_str,
                |obj: &#struct_name| &obj.#field_name,
                |obj: &mut #struct_name| &mut obj.#field_name,
            )
        };
    }

    let editable = info.editable;
    let options = if info.options.is_empty() {
        quote! {}
    } else {
        let options = &info.options;
        quote! { .with_options([#(#options),*]) }
    };
    let widget = info
        .widget
        .as_ref()
        .map(|hint| quote! { .with_widget(#hint) });
    let tooltip = info
        .tooltip
        .as_ref()
        .map(|text| quote! { .with_tooltip(#text) });

    quote! {
        .field::<#field_type>(
            #name_str,
            #krate::BindingMeta::new()
                .with_editable(#editable)
                #options
                #widget
                #tooltip,
            |obj: &#struct_name| &obj.#field_name,
            |obj: &mut #struct_name| &mut obj.#field_name,
        )
    }
}

/// Generate the builder call that registers one change handler.
fn generate_handler_call(struct_name: &Ident, krate: &Path, method: &LitStr) -> TokenStream2 {
    let name = method.value();
    let method_ident = format_ident!("{}", name, span = method.span());

    quote! {
        .on_change(#name, |obj: &mut #struct_name, attribute: &#krate::AttributeDescriptor| {
            #krate::IntoHandlerResult::into_handler_result(obj.#method_ident(attribute))
        })
    }
}

fn impl_derive_form_enum(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let enum_name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "FormEnum derive does not support generic enums",
        ));
    }

    let variants = match &input.data {
        Data::Enum(data) => &data.variants,
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "FormEnum derive only supports enums",
            ));
        }
    };

    let mut idents = Vec::new();
    let mut names = Vec::new();
    for variant in variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "FormEnum derive only supports fieldless variants",
            ));
        }
        idents.push(&variant.ident);
        names.push(variant_display_name(variant)?);
    }

    let krate = parse_enum_crate(&input.attrs)?;

    Ok(quote! {
        impl #krate::FormEnum for #enum_name {
            fn variants() -> &'static [Self] {
                const VARIANTS: &[#enum_name] = &[#(#enum_name::#idents),*];
                VARIANTS
            }

            fn variant_name(&self) -> &'static str {
                match *self {
                    #(#enum_name::#idents => #names,)*
                }
            }
        }

        impl #krate::FormField for #enum_name {
            fn shape() -> #krate::FieldShape {
                #krate::FieldShape::Value {
                    key: #krate::TypeKey::of::<Self>(),
                    kind: #krate::ValueKind::Enum(#krate::EnumMeta::of::<Self>()),
                }
            }

            fn read(&self) -> ::std::option::Option<#krate::AnyValue> {
                ::std::option::Option::Some(::std::boxed::Box::new(
                    ::std::clone::Clone::clone(self),
                ))
            }

            fn from_value(value: #krate::AnyValue) -> #krate::Result<Self> {
                #krate::value::downcast_value::<Self>(value)
            }
        }
    })
}

/// The display name of a variant: its `rename`, or its identifier.
fn variant_display_name(variant: &syn::Variant) -> syn::Result<String> {
    let mut name = variant.ident.to_string();
    for attr in &variant.attrs {
        if !attr.path().is_ident("form") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                name = value.value();
                Ok(())
            } else {
                Err(meta.error("unknown variant form attribute"))
            }
        })?;
    }
    Ok(name)
}

fn parse_enum_crate(attrs: &[Attribute]) -> syn::Result<Path> {
    let mut krate: Path = syn::parse_quote!(::horizon_forms_core);
    for attr in attrs {
        if !attr.path().is_ident("form") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("crate") {
                let path: LitStr = meta.value()?.parse()?;
                krate = path.parse()?;
                Ok(())
            } else {
                Err(meta.error("unknown enum-level form attribute"))
            }
        })?;
    }
    Ok(krate)
}
