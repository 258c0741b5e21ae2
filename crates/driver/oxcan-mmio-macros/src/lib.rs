//! Proc-macro crate for the `register_block!` MMIO register DSL.
//!
//! Turns a declarative register layout into a struct with typed volatile
//! accessors. The only `unsafe` surface is the generated `new()`; every
//! read/write method it produces is safe to call.

mod codegen;
mod parse;

use proc_macro::TokenStream;
use syn::parse_macro_input;

use crate::parse::RegisterBlock;

/// Generates a typed MMIO register block struct with safe accessors.
///
/// # Syntax
///
/// ```ignore
/// register_block! {
///     /// Doc comment for the struct.
///     pub StructName {
///         /// Doc comment for the register.
///         [offset; width; access] name,
///     }
/// }
/// ```
///
/// - `offset` — byte offset from the block base (integer literal)
/// - `width` — `u8`, `u16`, or `u32`
/// - `access` — `ro` (read-only), `wo` (write-only), `rw` (read-write)
/// - `name` — register name; readers are `name()`, writers `set_name()`
///
/// The generated struct stores a `VirtAddr` base; the invoking module must
/// have `VirtAddr` in scope.
///
/// # Example
///
/// ```ignore
/// use oxcan_mmio::register_block;
///
/// register_block! {
///     /// Virtual CAN adapter registers.
///     pub AscanRegs {
///         /// Target bus index.
///         [0x04; u32; wo] busid,
///         /// Command register.
///         [0x1C; u32; wo] cmd,
///     }
/// }
/// ```
#[proc_macro]
pub fn register_block(input: TokenStream) -> TokenStream {
    let block = parse_macro_input!(input as RegisterBlock);
    codegen::generate(&block).into()
}
