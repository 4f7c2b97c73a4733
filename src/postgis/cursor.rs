use std::collections::VecDeque;

use gdal::vector::Geometry;
use postgres::{Client, Row};
use tracing::debug;

use crate::errors::Result;

const CURSOR_NAME: &str = "geomcompare_geometries";
const FETCH_SIZE: usize = 2000;

/// The connection a [`PgGeometries`] reads from.
enum ClientHandle<'c> {
    /// Owned by the caller, never closed here.
    Borrowed(&'c mut Client),
    /// Opened from connection parameters, closed once the rows are read.
    Owned(Client),
    Released,
}

impl ClientHandle<'_> {
    fn get(&mut self) -> Option<&mut Client> {
        match self {
            ClientHandle::Borrowed(client) => Some(&mut **client),
            ClientHandle::Owned(client) => Some(client),
            ClientHandle::Released => None,
        }
    }

    fn release(&mut self) -> Result<()> {
        if let ClientHandle::Owned(client) = std::mem::replace(self, ClientHandle::Released) {
            debug!("closing database connection");
            client.close()?;
        }
        Ok(())
    }
}

/// Lazy, forward-only sequence of the geometries selected by
/// [`fetch_geometries`](super::fetch_geometries).
///
/// Rows are pulled from a server-side cursor in batches, inside a
/// transaction that lasts until the cursor is exhausted. The connection
/// must stay usable for the whole iteration; an error ends the sequence.
pub struct PgGeometries<'c> {
    client: ClientHandle<'c>,
    buffer: VecDeque<Row>,
    cursor_open: bool,
}

impl<'c> PgGeometries<'c> {
    pub(crate) fn open_owned(client: Client, query: &str) -> Result<Self> {
        Self::open(ClientHandle::Owned(client), query)
    }

    pub(crate) fn open_borrowed(client: &'c mut Client, query: &str) -> Result<Self> {
        Self::open(ClientHandle::Borrowed(client), query)
    }

    fn open(mut client: ClientHandle<'c>, query: &str) -> Result<Self> {
        if let Some(conn) = client.get() {
            debug!("declaring cursor for: {query}");
            let declared = conn.batch_execute(&format!(
                "BEGIN; DECLARE {CURSOR_NAME} NO SCROLL CURSOR FOR {query}"
            ));
            if let Err(err) = declared {
                let _ = conn.batch_execute("ROLLBACK");
                let _ = client.release();
                return Err(err.into());
            }
        }
        Ok(Self {
            client,
            buffer: VecDeque::new(),
            cursor_open: true,
        })
    }

    /// Ends the iteration early, closing the cursor and any connection
    /// opened for it.
    pub fn close(mut self) -> Result<()> {
        self.buffer.clear();
        self.finish()
    }

    fn fetch(&mut self) -> Result<()> {
        let Some(client) = self.client.get() else {
            self.cursor_open = false;
            return Ok(());
        };
        let rows = client.query(&format!("FETCH FORWARD {FETCH_SIZE} FROM {CURSOR_NAME}"), &[])?;
        debug!("fetched {} row(s)", rows.len());
        let exhausted = rows.len() < FETCH_SIZE;
        self.buffer.extend(rows);
        if exhausted {
            self.finish()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.cursor_open {
            self.cursor_open = false;
            if let Some(client) = self.client.get() {
                client.batch_execute(&format!("CLOSE {CURSOR_NAME}; COMMIT"))?;
            }
        }
        self.client.release()
    }

    /// Best-effort cleanup after an error or an early drop.
    fn abort(&mut self) {
        self.buffer.clear();
        if self.cursor_open {
            self.cursor_open = false;
            if let Some(client) = self.client.get() {
                let _ = client.batch_execute("ROLLBACK");
            }
        }
        let _ = self.client.release();
    }
}

fn decode_row(row: &Row) -> Result<Geometry> {
    let wkb: Vec<u8> = row.try_get(0)?;
    Ok(Geometry::from_wkb(&wkb)?)
}

impl Iterator for PgGeometries<'_> {
    type Item = Result<Geometry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.buffer.pop_front() {
                let geometry = decode_row(&row);
                if geometry.is_err() {
                    self.abort();
                }
                return Some(geometry);
            }
            if !self.cursor_open {
                return None;
            }
            if let Err(err) = self.fetch() {
                self.abort();
                return Some(Err(err));
            }
        }
    }
}

impl Drop for PgGeometries<'_> {
    fn drop(&mut self) {
        self.abort();
    }
}
