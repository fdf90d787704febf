//! Tagged serialization engine
//!
//! One struct, several wire shapes. Each field declares the name it uses in the
//! read, create, update, apply and frame namespaces; encoding and decoding only
//! ever look at the namespace of the action being performed.
//!
//! - [`tags`] - field tag tables, per-namespace encode/decode
//! - [`frame`] - `{kind, apiVersion, spec}` envelopes for persisted documents

pub mod frame;
pub mod tags;

pub use frame::{decode_frame, encode_frame, peek_kind, Frame, FrameFormat, FrameHeader, FrameRegistry, Framed};
pub use tags::{
    decode_for_read, decode_into, encode_for, encode_for_apply, encode_for_create, encode_for_update, EncodeBody,
    FieldTag, Namespace, Tagged,
};
