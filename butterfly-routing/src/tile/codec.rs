//! Binary layout of a network tile
//!
//! ```text
//! u32 magic "BNTL" | u16 version
//! var tile_id | var zoom | var edge type version | var turn cost type version
//! vertices        var count, (f64 lon, f64 lat, u8 has_elevation, [f32 elevation])*
//! first edges     var pointer per vertex
//! attribute sets  var count, (var len, (string key, string value)*)*
//! shapes          var count, location*
//! edges           var count, record*
//! turn cost attrs var count, attribute set*
//! turn tables     var count, (var vertex, var entries, entry*)*
//! u64 CRC-64 of everything above
//! ```
//!
//! Optional values and pointers are written as `value + 1`, zero meaning none.

use butterfly_common::{EdgeId, Error, Location, Result, VertexId};
use butterfly_io::{ChecksumReader, ChecksumWriter, ReadExt, WriteExt};
use std::io::{Read, Write};

use super::{EdgeRecord, NetworkTile, TurnCostEntry, NO_EDGE};
use crate::type_index::{read_attributes, write_attributes};

pub const MAGIC: u32 = 0x424E_544C; // "BNTL"
pub const VERSION: u16 = 1;

/// Refuse to preallocate more than this many items from an untrusted count.
const MAX_PREALLOC: usize = 1 << 16;

impl NetworkTile {
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        let mut w = ChecksumWriter::new(&mut *writer);

        w.write_u32_le(MAGIC)?;
        w.write_u16_le(VERSION)?;
        w.write_var_u32(self.tile_id)?;
        w.write_var_u32(self.zoom)?;
        w.write_var_u32(self.edge_type_map_version)?;
        w.write_var_u32(self.turn_cost_type_map_version)?;

        w.write_var_u32(self.locations.len() as u32)?;
        for location in &self.locations {
            write_location(&mut w, location)?;
        }
        for &first in &self.first_edges {
            write_pointer(&mut w, edge_pointer(first))?;
        }

        w.write_var_u32(self.attribute_sets.len() as u32)?;
        for set in &self.attribute_sets {
            write_attributes(&mut w, set)?;
        }

        w.write_var_u32(self.shapes.len() as u32)?;
        for location in &self.shapes {
            write_location(&mut w, location)?;
        }

        w.write_var_u32(self.edges.len() as u32)?;
        for record in &self.edges {
            write_record(&mut w, record)?;
        }

        w.write_var_u32(self.turn_cost_attributes.len() as u32)?;
        for set in &self.turn_cost_attributes {
            write_attributes(&mut w, set)?;
        }

        let mut vertices: Vec<&u32> = self.turn_costs.keys().collect();
        vertices.sort_unstable();
        w.write_var_u32(vertices.len() as u32)?;
        for vertex in vertices {
            let entries = &self.turn_costs[vertex];
            w.write_var_u32(*vertex)?;
            w.write_var_u32(entries.len() as u32)?;
            for entry in entries {
                write_turn_cost(&mut w, entry)?;
            }
        }

        let (crc, inner) = w.finish();
        inner.write_u64_le(crc)?;
        Ok(())
    }

    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut r = ChecksumReader::new(&mut *reader);

        let magic = r.read_u32_le()?;
        if magic != MAGIC {
            return Err(Error::Format(format!("invalid tile magic {magic:#010x}")));
        }
        let version = r.read_u16_le()?;
        if version != VERSION {
            return Err(Error::Format(format!("unsupported tile version {version}")));
        }

        let tile_id = r.read_var_u32()?;
        let zoom = r.read_var_u32()?;
        let mut tile = NetworkTile::with_versions(tile_id, zoom, r.read_var_u32()?, r.read_var_u32()?);

        let count = r.read_var_u32()? as usize;
        tile.locations.reserve(count.min(MAX_PREALLOC));
        for _ in 0..count {
            tile.locations.push(read_location(&mut r)?);
        }
        for _ in 0..count {
            tile.first_edges.push(read_pointer(&mut r)?.unwrap_or(NO_EDGE));
        }

        let count = r.read_var_u32()?;
        for _ in 0..count {
            tile.attribute_sets.push(read_attributes(&mut r)?);
        }

        let count = r.read_var_u32()? as usize;
        tile.shapes.reserve(count.min(MAX_PREALLOC));
        for _ in 0..count {
            tile.shapes.push(read_location(&mut r)?);
        }

        let count = r.read_var_u32()? as usize;
        tile.edges.reserve(count.min(MAX_PREALLOC));
        for _ in 0..count {
            tile.edges.push(read_record(&mut r)?);
        }

        let count = r.read_var_u32()?;
        for _ in 0..count {
            tile.turn_cost_attributes.push(read_attributes(&mut r)?);
        }

        let count = r.read_var_u32()?;
        for _ in 0..count {
            let vertex = r.read_var_u32()?;
            let len = r.read_var_u32()? as usize;
            let mut entries = Vec::with_capacity(len.min(MAX_PREALLOC));
            for _ in 0..len {
                entries.push(read_turn_cost(&mut r)?);
            }
            tile.turn_costs.insert(vertex, entries);
        }

        let (computed, inner) = r.finish();
        let stored = inner.read_u64_le()?;
        if computed != stored {
            return Err(Error::Format(format!(
                "tile {tile_id} checksum mismatch: computed {computed:#018x}, stored {stored:#018x}"
            )));
        }

        validate(&tile)?;
        Ok(tile)
    }
}

fn edge_pointer(pos: u32) -> Option<u32> {
    (pos != NO_EDGE).then_some(pos)
}

fn write_pointer<W: Write + ?Sized>(w: &mut W, value: Option<u32>) -> Result<()> {
    w.write_var_u64(value.map_or(0, |v| v as u64 + 1))?;
    Ok(())
}

fn read_pointer<R: Read + ?Sized>(r: &mut R) -> Result<Option<u32>> {
    match r.read_var_u64()? {
        0 => Ok(None),
        v => u32::try_from(v - 1)
            .map(Some)
            .map_err(|_| Error::Format(format!("pointer {v} out of range"))),
    }
}

fn write_location<W: Write + ?Sized>(w: &mut W, location: &Location) -> Result<()> {
    w.write_f64_le(location.lon)?;
    w.write_f64_le(location.lat)?;
    match location.elevation {
        Some(elevation) => {
            w.write_u8(1)?;
            w.write_f32_le(elevation)?;
        }
        None => w.write_u8(0)?,
    }
    Ok(())
}

fn read_location<R: Read + ?Sized>(r: &mut R) -> Result<Location> {
    let lon = r.read_f64_le()?;
    let lat = r.read_f64_le()?;
    let elevation = match r.read_u8()? {
        0 => None,
        1 => Some(r.read_f32_le()?),
        flag => return Err(Error::Format(format!("invalid elevation flag {flag}"))),
    };
    Ok(Location { lon, lat, elevation })
}

fn write_edge_id<W: Write + ?Sized>(w: &mut W, tile_id: u32, local_id: u32) -> Result<()> {
    w.write_var_u32(tile_id)?;
    w.write_var_u32(local_id)?;
    Ok(())
}

fn write_record<W: Write + ?Sized>(w: &mut W, record: &EdgeRecord) -> Result<()> {
    write_edge_id(w, record.id.tile_id, record.id.local_id)?;
    write_edge_id(w, record.vertex1.tile_id, record.vertex1.local_id)?;
    write_edge_id(w, record.vertex2.tile_id, record.vertex2.local_id)?;
    write_pointer(w, edge_pointer(record.next1))?;
    write_pointer(w, edge_pointer(record.next2))?;
    w.write_var_u32(record.length_cm)?;
    write_pointer(w, record.edge_type_id)?;
    w.write_var_u32(record.shape_start)?;
    w.write_var_u32(record.shape_len)?;
    write_pointer(w, record.attributes)?;
    w.write_u8(record.turn_orders)?;
    Ok(())
}

fn read_record<R: Read + ?Sized>(r: &mut R) -> Result<EdgeRecord> {
    Ok(EdgeRecord {
        id: EdgeId::new(r.read_var_u32()?, r.read_var_u32()?),
        vertex1: VertexId::new(r.read_var_u32()?, r.read_var_u32()?),
        vertex2: VertexId::new(r.read_var_u32()?, r.read_var_u32()?),
        next1: read_pointer(r)?.unwrap_or(NO_EDGE),
        next2: read_pointer(r)?.unwrap_or(NO_EDGE),
        length_cm: r.read_var_u32()?,
        edge_type_id: read_pointer(r)?,
        shape_start: r.read_var_u32()?,
        shape_len: r.read_var_u32()?,
        attributes: read_pointer(r)?,
        turn_orders: r.read_u8()?,
    })
}

fn write_turn_cost<W: Write + ?Sized>(w: &mut W, entry: &TurnCostEntry) -> Result<()> {
    w.write_var_u32(entry.turn_cost_type_id)?;
    w.write_u8(entry.from_order)?;
    w.write_u8(entry.to_order)?;
    w.write_var_u32(entry.cost)?;
    w.write_var_u32(entry.attributes)?;
    w.write_var_u32(entry.prefix.len() as u32)?;
    for edge in &entry.prefix {
        write_edge_id(w, edge.tile_id, edge.local_id)?;
    }
    Ok(())
}

fn read_turn_cost<R: Read + ?Sized>(r: &mut R) -> Result<TurnCostEntry> {
    let turn_cost_type_id = r.read_var_u32()?;
    let from_order = r.read_u8()?;
    let to_order = r.read_u8()?;
    let cost = r.read_var_u32()?;
    let attributes = r.read_var_u32()?;
    let len = r.read_var_u32()? as usize;
    let mut prefix = Vec::with_capacity(len.min(MAX_PREALLOC));
    for _ in 0..len {
        prefix.push(EdgeId::new(r.read_var_u32()?, r.read_var_u32()?));
    }
    Ok(TurnCostEntry {
        turn_cost_type_id,
        from_order,
        to_order,
        cost,
        attributes,
        prefix,
    })
}

/// Pointer sanity checks so that a decoded tile never indexes out of bounds.
fn validate(tile: &NetworkTile) -> Result<()> {
    let edges = tile.edges.len() as u32;
    let out_of_range = |what: &str, value: u32| {
        Err(Error::Format(format!(
            "tile {}: {what} {value} out of range",
            tile.tile_id
        )))
    };

    for &first in &tile.first_edges {
        if first != NO_EDGE && first >= edges {
            return out_of_range("first edge", first);
        }
    }
    for record in &tile.edges {
        for next in [record.next1, record.next2] {
            if next != NO_EDGE && next >= edges {
                return out_of_range("next edge", next);
            }
        }
        for vertex in [record.vertex1, record.vertex2] {
            if vertex.tile_id == tile.tile_id && !tile.has_vertex(vertex) {
                return out_of_range("vertex", vertex.local_id);
            }
        }
        let shape_end = record.shape_start as u64 + record.shape_len as u64;
        if shape_end > tile.shapes.len() as u64 {
            return out_of_range("shape", record.shape_start);
        }
        if let Some(ptr) = record.attributes {
            if ptr as usize >= tile.attribute_sets.len() {
                return out_of_range("attribute set", ptr);
            }
        }
    }

    // every forward-star only links incident records and ends within
    // `edges` steps
    for local_id in 0..tile.first_edges.len() as u32 {
        let vertex = VertexId::new(tile.tile_id, local_id);
        let mut steps = 0;
        for pos in tile.star(vertex) {
            let record = &tile.edges[pos as usize];
            if record.vertex1 != vertex && record.vertex2 != vertex {
                return Err(Error::Format(format!(
                    "tile {}: edge record {pos} is linked to vertex {local_id} without touching it",
                    tile.tile_id
                )));
            }
            steps += 1;
            if steps > edges {
                return Err(Error::Format(format!(
                    "tile {}: forward-star of vertex {local_id} loops",
                    tile.tile_id
                )));
            }
        }
    }

    for (&vertex, entries) in &tile.turn_costs {
        if vertex as usize >= tile.locations.len() {
            return out_of_range("turn table vertex", vertex);
        }
        for entry in entries {
            if entry.attributes as usize >= tile.turn_cost_attributes.len() {
                return out_of_range("turn cost attributes", entry.attributes);
            }
        }
    }
    Ok(())
}
