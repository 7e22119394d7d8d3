//! MongoDB wire-protocol framing: opcodes, message headers, command
//! builders, and response parsing.
//!
//! The write path assembles complete request messages into a
//! [`BsonWriter`](crate::BsonWriter) using its raw append helpers around
//! ordinary document building, then back-patches the message length. The
//! read path is a thin overlay on the streaming parser: a fixed 36-byte
//! header followed by `number_returned` documents, with
//! [`OpResponseParser`] distilling command replies into an
//! [`OperationResponse`].

mod command;
mod op_response;
mod response;

pub use self::{
    command::{
        fill_delete_op,
        fill_get_more_op,
        fill_insert_op,
        fill_insert_range_op,
        fill_is_master_op,
        fill_kill_cursors_op,
        fill_query_op,
        fill_query_with_selector_op,
        fill_update_op,
        WriteFields,
    },
    op_response::{CmdError, CmdErrorKind, OpResponseParser, OperationResponse},
    response::{
        ResponseHeader,
        ResponseParser,
        ResponseSink,
        ValueResponseParser,
        ValueSink,
        RESPONSE_HEADER_LEN,
    },
};

/// Request type carried in every message header.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Reply to a client request.
    Reply = 1,
    /// Generic message followed by a string.
    Msg = 1000,
    Update = 2001,
    Insert = 2002,
    Query = 2004,
    /// Fetch more data from an open cursor.
    GetMore = 2005,
    Delete = 2006,
    /// Tell the database the client is done with a cursor.
    KillCursors = 2007,
}

/// Set on a getMore when the cursor id is no longer valid at the server.
pub const RESPONSE_FLAG_CURSOR_NOT_FOUND: i32 = 1;
/// Set when the query failed; the single returned document carries an
/// `$err` field.
pub const RESPONSE_FLAG_QUERY_FAILURE: i32 = 2;
/// Only mongos ever sees this; drivers ignore it.
pub const RESPONSE_FLAG_SHARD_CONFIG_STALE: i32 = 4;
/// Set when the server supports the AwaitData query option.
pub const RESPONSE_FLAG_AWAIT_CAPABLE: i32 = 8;

/// The maximum number of documents allowed in one write command.
///
/// Can be obtained from the db via `db.isMaster().maxWriteBatchSize`.
pub const MAX_WRITE_BATCH_SIZE: usize = 1000;
