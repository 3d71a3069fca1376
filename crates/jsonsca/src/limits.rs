//! Limits applied while walking value graphs and node trees.
//!
//! Both the encoder and the decoder recurse once per composite level, so
//! nesting is bounded to keep untrusted input from exhausting the stack.

/// Default maximum nesting of composites (arrays, objects) in one pass.
pub const MAX_DEPTH: usize = 1024;
