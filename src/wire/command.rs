//! Builders for the request side of the wire protocol.
//!
//! Each `fill_*_op` appends one complete message to the writer and patches
//! the message length into its first four bytes. The caller supplies
//! document bodies through [`WriteFields`].

use super::{Opcode, MAX_WRITE_BATCH_SIZE};
use crate::{
    error::{Error, Result},
    writer::BsonWriter,
};

/// Writes the fields of one document body. Implemented by command and query
/// types; also implemented for closures, which is convenient for one-off
/// queries:
///
/// ```
/// use bsonwire::{wire, BsonWriter, Result};
///
/// let mut w = BsonWriter::new();
/// let query = |w: &mut BsonWriter| -> Result<()> {
///     w.element("name", "ferris");
///     Ok(())
/// };
/// wire::fill_query_op(&mut w, 1, "db", "coll", &query, 10).unwrap();
/// ```
pub trait WriteFields {
    fn write_fields(&self, w: &mut BsonWriter) -> Result<()>;
}

impl<T: WriteFields + ?Sized> WriteFields for &T {
    fn write_fields(&self, w: &mut BsonWriter) -> Result<()> {
        (**self).write_fields(w)
    }
}

impl<F> WriteFields for F
where
    F: Fn(&mut BsonWriter) -> Result<()>,
{
    fn write_fields(&self, w: &mut BsonWriter) -> Result<()> {
        self(w)
    }
}

fn append_msg_header(w: &mut BsonWriter, request_id: i32, op: Opcode) {
    w.append_i32(0); // message length, patched by flush_len
    w.append_i32(request_id);
    w.append_i32(0); // response_to
    w.append_i32(op as i32);
}

// Commands are sent as queries against the magic `$cmd` collection.
fn append_command_header(w: &mut BsonWriter, request_id: i32, db: &str) {
    append_msg_header(w, request_id, Opcode::Query);
    w.append_i32(0); // flags
    w.append_bytes(db.as_bytes());
    w.append_cstr(b".$cmd");
    w.append_i32(0); // number to skip
    w.append_i32(-1); // number to return
}

fn append_write_concern(w: &mut BsonWriter) {
    w.push_document("WriteConcern");
    w.element("wtimeout", 100i32);
    w.element("w", 1i32);
    w.pop();
}

/// Builds an insert command for a batch of documents. Fails with
/// [`Error::TooManyDocuments`] when the batch exceeds
/// [`MAX_WRITE_BATCH_SIZE`]; use [`fill_insert_range_op`] to batch larger
/// streams.
pub fn fill_insert_op<T: WriteFields>(
    w: &mut BsonWriter,
    request_id: i32,
    db: &str,
    collection: &str,
    documents: &[T],
) -> Result<()> {
    if documents.len() > MAX_WRITE_BATCH_SIZE {
        return Err(Error::TooManyDocuments(documents.len()));
    }
    fill_insert_range_op(w, request_id, db, collection, documents.iter()).map(|_| ())
}

/// Builds an insert command from an iterator, consuming at most
/// [`MAX_WRITE_BATCH_SIZE`] documents, and returns how many were written.
/// Pass the iterator by `&mut` to keep the remainder for the next batch.
pub fn fill_insert_range_op<T, I>(
    w: &mut BsonWriter,
    request_id: i32,
    db: &str,
    collection: &str,
    documents: I,
) -> Result<usize>
where
    T: WriteFields,
    I: IntoIterator<Item = T>,
{
    append_command_header(w, request_id, db);

    w.document();
    w.element("insert", collection);
    w.push_array("documents");
    let mut count = 0usize;
    for doc in documents.into_iter().take(MAX_WRITE_BATCH_SIZE) {
        w.push_document(count as i32);
        doc.write_fields(w)?;
        w.pop();
        count += 1;
    }
    w.pop();
    append_write_concern(w);
    w.pop();

    w.flush_len();
    Ok(count)
}

/// Builds a query message. A positive `limit` is sent negated, which the
/// wire protocol reads as a hard batch cap.
pub fn fill_query_op<T: WriteFields>(
    w: &mut BsonWriter,
    request_id: i32,
    db: &str,
    collection: &str,
    query: &T,
    limit: i32,
) -> Result<()> {
    append_query_prefix(w, request_id, db, collection, limit);

    w.document();
    query.write_fields(w)?;
    w.pop();

    w.flush_len();
    Ok(())
}

/// Like [`fill_query_op`] with a trailing field-selector document.
pub fn fill_query_with_selector_op<T: WriteFields, F: WriteFields>(
    w: &mut BsonWriter,
    request_id: i32,
    db: &str,
    collection: &str,
    query: &T,
    selector: &F,
    limit: i32,
) -> Result<()> {
    append_query_prefix(w, request_id, db, collection, limit);

    w.document();
    query.write_fields(w)?;
    w.pop();

    w.document();
    selector.write_fields(w)?;
    w.pop();

    w.flush_len();
    Ok(())
}

fn append_query_prefix(
    w: &mut BsonWriter,
    request_id: i32,
    db: &str,
    collection: &str,
    limit: i32,
) {
    append_msg_header(w, request_id, Opcode::Query);
    w.append_i32(0); // flags
    w.append_bytes(db.as_bytes());
    w.append_bytes(b".");
    w.append_cstr(collection.as_bytes());

    let limit = if limit > 0 { -limit } else { limit };
    w.append_i32(0); // number to skip
    w.append_i32(limit); // number to return
}

/// Builds an update command for a single `{q, u}` pair.
pub fn fill_update_op<Q: WriteFields, U: WriteFields>(
    w: &mut BsonWriter,
    request_id: i32,
    db: &str,
    collection: &str,
    query: &Q,
    update: &U,
    upsert: bool,
) -> Result<()> {
    append_command_header(w, request_id, db);

    w.document();
    w.element("update", collection);
    w.push_array("updates");
    w.push_document(0);
    w.push_document("q");
    query.write_fields(w)?;
    w.pop();
    w.push_document("u");
    update.write_fields(w)?;
    w.pop();
    if upsert {
        w.element("upsert", true);
    }
    w.pop();
    w.pop();
    append_write_concern(w);
    w.pop();

    w.flush_len();
    Ok(())
}

/// Builds a delete command removing every document matching `query`.
pub fn fill_delete_op<T: WriteFields>(
    w: &mut BsonWriter,
    request_id: i32,
    db: &str,
    collection: &str,
    query: &T,
) -> Result<()> {
    append_command_header(w, request_id, db);

    w.document();
    w.element("delete", collection);
    w.push_array("deletes");
    w.push_document(0);
    w.push_document("q");
    query.write_fields(w)?;
    w.pop();
    w.element("limit", 0i32);
    w.pop();
    w.pop();
    append_write_concern(w);
    w.pop();

    w.flush_len();
    Ok(())
}

/// Builds a getMore message for an open cursor.
pub fn fill_get_more_op(
    w: &mut BsonWriter,
    request_id: i32,
    db: &str,
    collection: &str,
    cursor_id: i64,
) {
    append_msg_header(w, request_id, Opcode::GetMore);
    w.append_i32(0); // reserved
    w.append_bytes(db.as_bytes());
    w.append_bytes(b".");
    w.append_cstr(collection.as_bytes());
    w.append_i32(0); // number to return
    w.append_i64(cursor_id);
    w.flush_len();
}

/// Builds a killCursors message for one cursor.
pub fn fill_kill_cursors_op(w: &mut BsonWriter, request_id: i32, cursor_id: i64) {
    append_msg_header(w, request_id, Opcode::KillCursors);
    w.append_i32(0); // reserved
    w.append_i32(1); // number of cursors
    w.append_i64(cursor_id);
    w.flush_len();
}

/// Builds the isMaster handshake command.
pub fn fill_is_master_op(w: &mut BsonWriter, request_id: i32) {
    append_command_header(w, request_id, "admin");
    w.document();
    w.element("ismaster", 1i32);
    w.pop();
    w.flush_len();
}
