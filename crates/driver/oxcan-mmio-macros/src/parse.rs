//! Parser for the `register_block!` DSL.

use syn::parse::{Parse, ParseStream};
use syn::{Attribute, Ident, LitInt, Token, Visibility, braced, bracketed};

/// A parsed register block definition.
pub struct RegisterBlock {
    /// Doc attributes on the generated struct.
    pub attrs: Vec<Attribute>,
    /// Visibility of the generated struct.
    pub vis: Visibility,
    /// Name of the generated struct.
    pub name: Ident,
    /// The registers, in declaration order.
    pub registers: Vec<RegisterDef>,
}

/// Register access mode.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Readable only.
    ReadOnly,
    /// Writable only.
    WriteOnly,
    /// Readable and writable.
    ReadWrite,
}

/// Register width. The ascan-class devices this crate serves expose at most
/// 32-bit registers, so `u64` is intentionally unsupported.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Width {
    /// 8-bit register.
    U8,
    /// 16-bit register.
    U16,
    /// 32-bit register.
    U32,
}

impl Width {
    /// The Rust integer type spelled by this width.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
        }
    }
}

/// One `[offset; width; access] name,` line.
pub struct RegisterDef {
    /// Doc attributes on the register.
    pub attrs: Vec<Attribute>,
    /// Byte offset from the block base.
    pub offset: LitInt,
    /// Register width.
    pub width: Width,
    /// Access mode.
    pub access: Access,
    /// Register name.
    pub name: Ident,
}

impl Parse for RegisterBlock {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let vis: Visibility = input.parse()?;
        let name: Ident = input.parse()?;

        let body;
        braced!(body in input);

        let mut registers = Vec::new();
        while !body.is_empty() {
            registers.push(body.call(parse_register)?);
        }

        Ok(Self {
            attrs,
            vis,
            name,
            registers,
        })
    }
}

fn parse_register(input: ParseStream) -> syn::Result<RegisterDef> {
    let attrs = input.call(Attribute::parse_outer)?;

    let spec;
    bracketed!(spec in input);

    let offset: LitInt = spec.parse()?;
    spec.parse::<Token![;]>()?;

    let width_ident: Ident = spec.parse()?;
    let width = match width_ident.to_string().as_str() {
        "u8" => Width::U8,
        "u16" => Width::U16,
        "u32" => Width::U32,
        _ => {
            return Err(syn::Error::new(
                width_ident.span(),
                "expected register width: u8, u16, or u32",
            ));
        }
    };
    spec.parse::<Token![;]>()?;

    let access_ident: Ident = spec.parse()?;
    let access = match access_ident.to_string().as_str() {
        "ro" => Access::ReadOnly,
        "wo" => Access::WriteOnly,
        "rw" => Access::ReadWrite,
        _ => {
            return Err(syn::Error::new(
                access_ident.span(),
                "expected access mode: ro, wo, or rw",
            ));
        }
    };

    let name: Ident = input.parse()?;

    // Trailing comma is optional on the last line.
    let _ = input.parse::<Option<Token![,]>>();

    Ok(RegisterDef {
        attrs,
        offset,
        width,
        access,
        name,
    })
}
