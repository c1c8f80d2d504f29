//! Accessor generation macros for the node sum type
//!
//! These macros eliminate repetitive match code when working with `Node`.
//! All macros use `paste` internally for identifier concatenation.

/// Generate is_xxx, as_xxx, as_xxx_mut for enums with typed variants
///
/// Uses paste's `:camel` modifier to convert method name to variant name.
/// # Generated methods per variant:
/// - `is_xxx(&self) -> bool`
/// - `as_xxx(&self) -> Option<&Type<H>>`
/// - `as_xxx_mut(&mut self) -> Option<&mut Type<H>>`
///
/// # Example
/// ```ignore
/// impl<H> Node<H> {
///     // element -> Element, text -> Text, doc_type -> DocType
///     impl_enum_accessors!(H; element, text, comment, doc_type);
/// }
/// ```
macro_rules! impl_enum_accessors {
    ($handle:ty; $($variant:ident),* $(,)?) => {
        ::paste::paste! {
            $(
                #[doc = "Check if this is a " [<$variant:camel>] " node"]
                pub fn [<is_ $variant>](&self) -> bool {
                    matches!(self, Self::[<$variant:camel>](_))
                }

                #[doc = "Try to get as " $variant " reference"]
                pub fn [<as_ $variant>](&self) -> Option<&[<$variant:camel>]<$handle>> {
                    match self { Self::[<$variant:camel>](v) => Some(v), _ => None }
                }

                #[doc = "Try to get as mutable " $variant " reference"]
                pub fn [<as_ $variant _mut>](&mut self) -> Option<&mut [<$variant:camel>]<$handle>> {
                    match self { Self::[<$variant:camel>](v) => Some(v), _ => None }
                }
            )*
        }
    };
}

/// Generate a method that reads the same field from every variant
///
/// # Example
/// ```ignore
/// impl_variant_field_get!(handle, handle, &H, Element, Text, Comment, DocType);
/// // Expands to: pub fn handle(&self) -> &H { match self { Self::Element(v) => &v.handle, ... } }
/// ```
macro_rules! impl_variant_field_get {
    ($method:ident, $field:ident, $ret:ty, $($variant:ident),* $(,)?) => {
        #[doc = concat!("Get `", stringify!($field), "` from any node variant")]
        pub fn $method(&self) -> $ret {
            match self {
                $(Self::$variant(v) => &v.$field,)*
            }
        }
    };
}
