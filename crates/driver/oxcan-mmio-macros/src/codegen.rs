//! Code generation for the `register_block!` macro.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::parse::{Access, RegisterBlock, RegisterDef};

/// Emits the struct and accessor impl for a parsed register block.
pub fn generate(block: &RegisterBlock) -> TokenStream {
    let vis = &block.vis;
    let name = &block.name;
    let attrs = &block.attrs;

    let accessors: Vec<TokenStream> = block.registers.iter().map(generate_accessors).collect();

    quote! {
        #(#attrs)*
        #vis struct #name {
            base: VirtAddr,
        }

        impl #name {
            /// Creates an accessor over a mapped register block.
            ///
            /// # Safety
            ///
            /// `base` must point to a live MMIO (or equivalently writable)
            /// mapping that covers every register declared in the block.
            #vis unsafe fn new(base: VirtAddr) -> Self {
                Self { base }
            }

            /// Returns the base address of the block.
            #[must_use]
            #vis fn base(&self) -> VirtAddr {
                self.base
            }

            #(#accessors)*
        }
    }
}

fn generate_accessors(reg: &RegisterDef) -> TokenStream {
    let mut out = TokenStream::new();
    if reg.access != Access::WriteOnly {
        out.extend(generate_read(reg));
    }
    if reg.access != Access::ReadOnly {
        out.extend(generate_write(reg));
    }
    out
}

fn generate_read(reg: &RegisterDef) -> TokenStream {
    let name = &reg.name;
    let offset = &reg.offset;
    let ty = width_type(reg);
    let attrs = &reg.attrs;

    quote! {
        #(#attrs)*
        #[inline]
        pub fn #name(&self) -> #ty {
            // SAFETY: `new` promised a valid mapping covering this offset.
            unsafe {
                core::ptr::read_volatile((self.base.as_u64() + #offset) as *const #ty)
            }
        }
    }
}

fn generate_write(reg: &RegisterDef) -> TokenStream {
    let name = &reg.name;
    let setter = format_ident!("set_{}", name);
    let offset = &reg.offset;
    let ty = width_type(reg);

    // Write-only registers have no reader, so their doc attributes would
    // otherwise be lost; hang them on the setter.
    let attrs = if reg.access == Access::WriteOnly {
        reg.attrs.clone()
    } else {
        Vec::new()
    };
    let doc = format!("Writes the `{name}` register.");

    quote! {
        #(#attrs)*
        #[doc = #doc]
        #[inline]
        pub fn #setter(&self, value: #ty) {
            // SAFETY: `new` promised a valid mapping covering this offset.
            unsafe {
                core::ptr::write_volatile((self.base.as_u64() + #offset) as *mut #ty, value);
            }
        }
    }
}

fn width_type(reg: &RegisterDef) -> TokenStream {
    let ident = format_ident!("{}", reg.width.type_name());
    quote! { #ident }
}
