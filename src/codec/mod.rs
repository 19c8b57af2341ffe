//! The gRPC wire framing codec: [`MessageReader`] decodes a backpressured
//! byte stream into protobuf messages; [`MessageWriter`] is its encoder
//! counterpart.

pub mod length_prefix;
pub mod reader;
pub mod writer;

pub use length_prefix::LengthPrefix;
pub use reader::MessageReader;
pub use writer::MessageWriter;
