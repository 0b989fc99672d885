//! Wire protocol: JSON request bodies and the unified reply decoder.

pub mod codec;
pub mod messages;

pub use codec::{
    decode_reply, encode_login, encode_register, DecodeError, DecodeErrorKind, EncodeError,
};
pub use messages::{AuthReply, ReplyShape};
