//! Chunked (de)serialization boundary for track data.
//!
//! A track travels as one `TRCK` chunk containing a `NAME` chunk followed
//! by zero or more `KEYF` chunks; each keyframe decomposes into `TIME`
//! (f64 seconds), `TRNS` (3 f32), `ROTA` (quaternion, 4 f32) and `SCAL`
//! (3 f32) sub-chunks. Every chunk is framed as little-endian `magic: u32`,
//! `size: u32`, payload.
//!
//! Parsing is strict: the first malformed or truncated sub-chunk aborts the
//! enclosing chunk with an error naming the failed field; there is no
//! partial recovery. The surrounding container format (files, archives) is
//! somebody else's concern.

use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::{Quat, Vec3};

use crate::animation::track::{KeyFrame, Track};
use crate::errors::{OrreryError, Result};

pub const TRACK_MAGIC: u32 = u32::from_le_bytes(*b"TRCK");
pub const NAME_MAGIC: u32 = u32::from_le_bytes(*b"NAME");
pub const KEYFRAME_MAGIC: u32 = u32::from_le_bytes(*b"KEYF");
pub const TIME_MAGIC: u32 = u32::from_le_bytes(*b"TIME");
pub const TRANSLATE_MAGIC: u32 = u32::from_le_bytes(*b"TRNS");
pub const ROTATE_MAGIC: u32 = u32::from_le_bytes(*b"ROTA");
pub const SCALE_MAGIC: u32 = u32::from_le_bytes(*b"SCAL");

/// Preallocation cap for a chunk payload. The declared size is untrusted
/// input; anything beyond this only grows the buffer as bytes actually
/// arrive.
const MAX_CHUNK_PREALLOC: usize = 64 * 1024;

struct RawChunk {
    magic: u32,
    data: Vec<u8>,
}

impl RawChunk {
    fn read<R: Read>(rdr: &mut R) -> Result<RawChunk> {
        let magic = rdr.read_u32::<LittleEndian>()?;
        let size = rdr.read_u32::<LittleEndian>()?;
        let mut data = Vec::with_capacity((size as usize).min(MAX_CHUNK_PREALLOC));
        rdr.take(u64::from(size)).read_to_end(&mut data)?;
        if data.len() < size as usize {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
        }
        Ok(RawChunk { magic, data })
    }

    fn magic_str(&self) -> String {
        String::from_utf8_lossy(&self.magic.to_le_bytes()).into_owned()
    }
}

fn expect_chunk<R: Read>(rdr: &mut R, magic: u32, label: &'static str) -> Result<RawChunk> {
    let chunk = RawChunk::read(rdr).map_err(|e| {
        log::error!("Animation track: failed to read {label} chunk: {e}");
        e
    })?;
    if chunk.magic != magic {
        log::error!(
            "Animation track: expected {label} chunk, found '{}'",
            chunk.magic_str()
        );
        return Err(OrreryError::UnexpectedChunk {
            expected: label,
            found: chunk.magic_str(),
        });
    }
    Ok(chunk)
}

fn check_size(chunk: &RawChunk, expected: usize, field: &'static str) -> Result<()> {
    if chunk.data.len() != expected {
        log::error!(
            "Animation track: {field} payload has {} bytes, expected {expected}",
            chunk.data.len()
        );
        return Err(OrreryError::ChunkSizeMismatch {
            field,
            expected,
            actual: chunk.data.len(),
        });
    }
    Ok(())
}

fn read_vec3(chunk: &RawChunk, field: &'static str) -> Result<Vec3> {
    check_size(chunk, 12, field)?;
    let mut cur = Cursor::new(chunk.data.as_slice());
    Ok(Vec3::new(
        cur.read_f32::<LittleEndian>()?,
        cur.read_f32::<LittleEndian>()?,
        cur.read_f32::<LittleEndian>()?,
    ))
}

fn read_quat(chunk: &RawChunk, field: &'static str) -> Result<Quat> {
    check_size(chunk, 16, field)?;
    let mut cur = Cursor::new(chunk.data.as_slice());
    Ok(Quat::from_xyzw(
        cur.read_f32::<LittleEndian>()?,
        cur.read_f32::<LittleEndian>()?,
        cur.read_f32::<LittleEndian>()?,
        cur.read_f32::<LittleEndian>()?,
    ))
}

fn read_keyframe(data: &[u8]) -> Result<KeyFrame> {
    let mut cur = Cursor::new(data);

    let time_chunk = expect_chunk(&mut cur, TIME_MAGIC, "TIME")?;
    check_size(&time_chunk, 8, "TIME")?;
    let time = Cursor::new(time_chunk.data.as_slice()).read_f64::<LittleEndian>()?;

    let translate = read_vec3(&expect_chunk(&mut cur, TRANSLATE_MAGIC, "TRNS")?, "TRNS")?;
    let rotate = read_quat(&expect_chunk(&mut cur, ROTATE_MAGIC, "ROTA")?, "ROTA")?;
    let scale = read_vec3(&expect_chunk(&mut cur, SCALE_MAGIC, "SCAL")?, "SCAL")?;

    let mut keyframe = KeyFrame::new(time as f32);
    keyframe.set_position(translate);
    keyframe.set_rotation(rotate);
    keyframe.set_scale(scale);
    Ok(keyframe)
}

/// Reads one `TRCK` chunk from the stream and rebuilds the track.
pub fn read_track<R: Read>(rdr: &mut R) -> Result<Track> {
    let track_chunk = expect_chunk(rdr, TRACK_MAGIC, "TRCK")?;
    let mut cur = Cursor::new(track_chunk.data.as_slice());

    let name_chunk = expect_chunk(&mut cur, NAME_MAGIC, "NAME")?;
    let name = String::from_utf8(name_chunk.data).map_err(|e| {
        log::error!("Animation track: name chunk is not valid UTF-8");
        OrreryError::from(e)
    })?;

    let mut track = Track::new(name);
    while (cur.position() as usize) < track_chunk.data.len() {
        let kf_chunk = expect_chunk(&mut cur, KEYFRAME_MAGIC, "KEYF")?;
        track.add_keyframe(read_keyframe(&kf_chunk.data)?);
    }
    Ok(track)
}

fn write_chunk<W: Write>(wtr: &mut W, magic: u32, payload: &[u8]) -> Result<()> {
    wtr.write_u32::<LittleEndian>(magic)?;
    wtr.write_u32::<LittleEndian>(payload.len() as u32)?;
    wtr.write_all(payload)?;
    Ok(())
}

fn write_vec3(buf: &mut Vec<u8>, magic: u32, value: Vec3) -> Result<()> {
    let mut payload = Vec::with_capacity(12);
    payload.write_f32::<LittleEndian>(value.x)?;
    payload.write_f32::<LittleEndian>(value.y)?;
    payload.write_f32::<LittleEndian>(value.z)?;
    write_chunk(buf, magic, &payload)
}

fn write_keyframe(buf: &mut Vec<u8>, keyframe: &KeyFrame) -> Result<()> {
    let mut payload = Vec::new();

    let mut time = Vec::with_capacity(8);
    time.write_f64::<LittleEndian>(f64::from(keyframe.time()))?;
    write_chunk(&mut payload, TIME_MAGIC, &time)?;

    write_vec3(&mut payload, TRANSLATE_MAGIC, keyframe.position())?;

    let mut rot = Vec::with_capacity(16);
    let q = keyframe.rotation();
    rot.write_f32::<LittleEndian>(q.x)?;
    rot.write_f32::<LittleEndian>(q.y)?;
    rot.write_f32::<LittleEndian>(q.z)?;
    rot.write_f32::<LittleEndian>(q.w)?;
    write_chunk(&mut payload, ROTATE_MAGIC, &rot)?;

    write_vec3(&mut payload, SCALE_MAGIC, keyframe.scale())?;

    write_chunk(buf, KEYFRAME_MAGIC, &payload)
}

/// Writes the track as one `TRCK` chunk.
pub fn write_track<W: Write>(wtr: &mut W, track: &Track) -> Result<()> {
    let mut payload = Vec::new();
    write_chunk(&mut payload, NAME_MAGIC, track.name().as_bytes())?;
    for keyframe in track.keyframes() {
        write_keyframe(&mut payload, keyframe)?;
    }
    write_chunk(wtr, TRACK_MAGIC, &payload)
}
