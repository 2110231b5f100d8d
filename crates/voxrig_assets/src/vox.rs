//! # MagicaVoxel `.vox` Files
//!
//! ```text
//! "VOX " magic, version (150..=200)
//! MAIN
//! ├── SIZE  x, y, z                model dimensions
//! ├── XYZI  n, n x (x, y, z, i)    voxels with palette index
//! └── RGBA  255 x (r, g, b, a)     palette (optional)
//! ```
//!
//! VOX is Z-up. [`VoxFile::to_grid`] swaps Y and Z so imported models stand
//! on the Y-up body frame. Palette index 0 is the empty color.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use voxrig_core::{GridSize, VoxelCoord};

use crate::error::{VoxError, VoxResult};

const VOX_MAGIC: [u8; 4] = *b"VOX ";

/// MagicaVoxel's per-axis model limit.
const MAX_MODEL_SIZE: u32 = 256;

/// Upper bound on the XYZI preallocation; longer lists still grow.
const MAX_PREALLOCATED_VOXELS: usize = 1 << 16;

/// Version written by [`VoxFile::to_bytes`].
pub const VOX_VERSION: u32 = 150;

/// Default MagicaVoxel palette, packed as `0xAABBGGRR`.
static DEFAULT_PALETTE: &[u32; 256] = &[
    0x00000000, 0xffffffff, 0xffccffff, 0xff99ffff, 0xff66ffff, 0xff33ffff, 0xff00ffff, 0xffffccff,
    0xffccccff, 0xff99ccff, 0xff66ccff, 0xff33ccff, 0xff00ccff, 0xffff99ff, 0xffcc99ff, 0xff9999ff,
    0xff6699ff, 0xff3399ff, 0xff0099ff, 0xffff66ff, 0xffcc66ff, 0xff9966ff, 0xff6666ff, 0xff3366ff,
    0xff0066ff, 0xffff33ff, 0xffcc33ff, 0xff9933ff, 0xff6633ff, 0xff3333ff, 0xff0033ff, 0xffff00ff,
    0xffcc00ff, 0xff9900ff, 0xff6600ff, 0xff3300ff, 0xff0000ff, 0xffffffcc, 0xffccffcc, 0xff99ffcc,
    0xff66ffcc, 0xff33ffcc, 0xff00ffcc, 0xffffcccc, 0xffcccccc, 0xff99cccc, 0xff66cccc, 0xff33cccc,
    0xff00cccc, 0xffff99cc, 0xffcc99cc, 0xff9999cc, 0xff6699cc, 0xff3399cc, 0xff0099cc, 0xffff66cc,
    0xffcc66cc, 0xff9966cc, 0xff6666cc, 0xff3366cc, 0xff0066cc, 0xffff33cc, 0xffcc33cc, 0xff9933cc,
    0xff6633cc, 0xff3333cc, 0xff0033cc, 0xffff00cc, 0xffcc00cc, 0xff9900cc, 0xff6600cc, 0xff3300cc,
    0xff0000cc, 0xffffff99, 0xffccff99, 0xff99ff99, 0xff66ff99, 0xff33ff99, 0xff00ff99, 0xffffcc99,
    0xffcccc99, 0xff99cc99, 0xff66cc99, 0xff33cc99, 0xff00cc99, 0xffff9999, 0xffcc9999, 0xff999999,
    0xff669999, 0xff339999, 0xff009999, 0xffff6699, 0xffcc6699, 0xff996699, 0xff666699, 0xff336699,
    0xff006699, 0xffff3399, 0xffcc3399, 0xff993399, 0xff663399, 0xff333399, 0xff003399, 0xffff0099,
    0xffcc0099, 0xff990099, 0xff660099, 0xff330099, 0xff000099, 0xffffff66, 0xffccff66, 0xff99ff66,
    0xff66ff66, 0xff33ff66, 0xff00ff66, 0xffffcc66, 0xffcccc66, 0xff99cc66, 0xff66cc66, 0xff33cc66,
    0xff00cc66, 0xffff9966, 0xffcc9966, 0xff999966, 0xff669966, 0xff339966, 0xff009966, 0xffff6666,
    0xffcc6666, 0xff996666, 0xff666666, 0xff336666, 0xff006666, 0xffff3366, 0xffcc3366, 0xff993366,
    0xff663366, 0xff333366, 0xff003366, 0xffff0066, 0xffcc0066, 0xff990066, 0xff660066, 0xff330066,
    0xff000066, 0xffffff33, 0xffccff33, 0xff99ff33, 0xff66ff33, 0xff33ff33, 0xff00ff33, 0xffffcc33,
    0xffcccc33, 0xff99cc33, 0xff66cc33, 0xff33cc33, 0xff00cc33, 0xffff9933, 0xffcc9933, 0xff999933,
    0xff669933, 0xff339933, 0xff009933, 0xffff6633, 0xffcc6633, 0xff996633, 0xff666633, 0xff336633,
    0xff006633, 0xffff3333, 0xffcc3333, 0xff993333, 0xff663333, 0xff333333, 0xff003333, 0xffff0033,
    0xffcc0033, 0xff990033, 0xff660033, 0xff330033, 0xff000033, 0xffffff00, 0xffccff00, 0xff99ff00,
    0xff66ff00, 0xff33ff00, 0xff00ff00, 0xffffcc00, 0xffcccc00, 0xff99cc00, 0xff66cc00, 0xff33cc00,
    0xff00cc00, 0xffff9900, 0xffcc9900, 0xff999900, 0xff669900, 0xff339900, 0xff009900, 0xffff6600,
    0xffcc6600, 0xff996600, 0xff666600, 0xff336600, 0xff006600, 0xffff3300, 0xffcc3300, 0xff993300,
    0xff663300, 0xff333300, 0xff003300, 0xffff0000, 0xffcc0000, 0xff990000, 0xff660000, 0xff330000,
    0xff0000ee, 0xff0000dd, 0xff0000bb, 0xff0000aa, 0xff000088, 0xff000077, 0xff000055, 0xff000044,
    0xff000022, 0xff000011, 0xff00ee00, 0xff00dd00, 0xff00bb00, 0xff00aa00, 0xff008800, 0xff007700,
    0xff005500, 0xff004400, 0xff002200, 0xff001100, 0xffee0000, 0xffdd0000, 0xffbb0000, 0xffaa0000,
    0xff880000, 0xff770000, 0xff550000, 0xff440000, 0xff220000, 0xff110000, 0xffeeeeee, 0xffdddddd,
    0xffbbbbbb, 0xffaaaaaa, 0xff888888, 0xff777777, 0xff555555, 0xff444444, 0xff222222, 0xff111111,
];

/// Palette entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoxColor {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl VoxColor {
    /// Unpacks a `0xAABBGGRR` value.
    #[inline]
    #[must_use]
    pub const fn from_packed(packed: u32) -> Self {
        Self {
            r: (packed & 0xFF) as u8,
            g: ((packed >> 8) & 0xFF) as u8,
            b: ((packed >> 16) & 0xFF) as u8,
            a: ((packed >> 24) & 0xFF) as u8,
        }
    }

    /// As RGBA8.
    #[inline]
    #[must_use]
    pub const fn to_rgba8(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// 256-entry palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxPalette {
    /// Color entries; index 0 is unused.
    pub colors: [VoxColor; 256],
}

impl Default for VoxPalette {
    fn default() -> Self {
        Self { colors: DEFAULT_PALETTE.map(VoxColor::from_packed) }
    }
}

impl VoxPalette {
    /// Color at `index`.
    #[inline]
    #[must_use]
    pub fn get(&self, index: u8) -> VoxColor {
        self.colors[index as usize]
    }
}

/// One voxel in file axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoxVoxel {
    /// File X (right).
    pub x: u8,
    /// File Y (depth).
    pub y: u8,
    /// File Z (up).
    pub z: u8,
    /// Palette index (1-255).
    pub color_index: u8,
}

/// A parsed model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxFile {
    /// Model name (file stem).
    pub name: String,
    /// Declared size in file axes (x, y, z).
    pub size: [u32; 3],
    /// Voxels in file order.
    pub voxels: Vec<VoxVoxel>,
    /// Palette.
    pub palette: VoxPalette,
}

impl VoxFile {
    /// Grid dimensions in body axes (Y and Z swapped).
    #[must_use]
    pub fn grid_size(&self) -> GridSize {
        GridSize::new(self.size[0], self.size[2], self.size[1])
    }

    /// Grid coordinate of a voxel in body axes.
    #[inline]
    #[must_use]
    pub fn to_grid(voxel: &VoxVoxel) -> VoxelCoord {
        VoxelCoord::new(u32::from(voxel.x), u32::from(voxel.z), u32::from(voxel.y))
    }

    /// Number of voxels.
    #[inline]
    #[must_use]
    pub fn voxel_count(&self) -> usize {
        self.voxels.len()
    }

    /// Encodes the model as a version-150 file with a full palette.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut children = Vec::new();
        write_chunk(&mut children, b"SIZE", |c| {
            for s in self.size {
                c.extend_from_slice(&s.to_le_bytes());
            }
        });
        write_chunk(&mut children, b"XYZI", |c| {
            c.extend_from_slice(&(self.voxels.len() as u32).to_le_bytes());
            for v in &self.voxels {
                c.extend_from_slice(&[v.x, v.y, v.z, v.color_index]);
            }
        });
        write_chunk(&mut children, b"RGBA", |c| {
            // Entry i of the chunk is palette index i + 1.
            for color in self.palette.colors.iter().skip(1) {
                c.extend_from_slice(&color.to_rgba8());
            }
            c.extend_from_slice(&[0; 4]);
        });

        let mut out = Vec::with_capacity(children.len() + 20);
        out.extend_from_slice(&VOX_MAGIC);
        out.extend_from_slice(&VOX_VERSION.to_le_bytes());
        out.extend_from_slice(b"MAIN");
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(children.len() as u32).to_le_bytes());
        out.extend_from_slice(&children);
        out
    }

    /// Writes [`Self::to_bytes`] to `writer`.
    ///
    /// # Errors
    ///
    /// Returns the writer's error.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }
}

fn write_chunk(out: &mut Vec<u8>, id: &[u8; 4], content: impl FnOnce(&mut Vec<u8>)) {
    let mut body = Vec::new();
    content(&mut body);
    out.extend_from_slice(id);
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&body);
}

/// `.vox` reader.
pub struct VoxLoader;

impl VoxLoader {
    /// Loads a file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed.
    pub fn load<P: AsRef<Path>>(path: P) -> VoxResult<VoxFile> {
        let path = path.as_ref();
        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed").to_string();
        let mut reader = io::BufReader::new(File::open(path)?);
        Self::parse(&mut reader, name)
    }

    /// Loads a file from memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is malformed.
    pub fn load_from_bytes(data: &[u8], name: impl Into<String>) -> VoxResult<VoxFile> {
        Self::parse(&mut io::Cursor::new(data), name.into())
    }

    fn parse<R: Read + Seek>(reader: &mut R, name: String) -> VoxResult<VoxFile> {
        let magic = Self::read_id(reader)?;
        if magic != VOX_MAGIC {
            return Err(VoxError::InvalidFormat(format!(
                "expected 'VOX ', got '{}'",
                String::from_utf8_lossy(&magic)
            )));
        }

        let version = Self::read_u32(reader)?;
        if !(150..=200).contains(&version) {
            return Err(VoxError::UnsupportedVersion(version));
        }

        if Self::read_id(reader)? != *b"MAIN" {
            return Err(VoxError::InvalidFormat("expected MAIN chunk".to_string()));
        }
        let main_content = Self::read_u32(reader)?;
        let main_children = Self::read_u32(reader)?;
        reader.seek(SeekFrom::Current(i64::from(main_content)))?;

        let mut size: Option<[u32; 3]> = None;
        let mut voxels: Option<Vec<VoxVoxel>> = None;
        let mut palette = VoxPalette::default();

        let end = reader.stream_position()? + u64::from(main_children);
        while reader.stream_position()? < end {
            let id = Self::read_id(reader)?;
            let content = Self::read_u32(reader)?;
            let children = Self::read_u32(reader)?;
            match &id {
                // Only the first model of a multi-model file is read.
                b"SIZE" if size.is_none() => {
                    size = Some([Self::read_u32(reader)?, Self::read_u32(reader)?, Self::read_u32(reader)?]);
                    reader.seek(SeekFrom::Current(i64::from(content) - 12 + i64::from(children)))?;
                }
                b"XYZI" if voxels.is_none() => {
                    let n = Self::read_u32(reader)?;
                    let mut list = Vec::with_capacity((n as usize).min(MAX_PREALLOCATED_VOXELS));
                    for _ in 0..n {
                        let [x, y, z, color_index] = Self::read_id(reader)?;
                        list.push(VoxVoxel { x, y, z, color_index });
                    }
                    voxels = Some(list);
                    let read = 4 + i64::from(n) * 4;
                    reader.seek(SeekFrom::Current(i64::from(content) - read + i64::from(children)))?;
                }
                b"RGBA" => {
                    for i in 1..256 {
                        let [r, g, b, a] = Self::read_id(reader)?;
                        palette.colors[i] = VoxColor { r, g, b, a };
                    }
                    let _ = Self::read_u32(reader)?;
                    reader.seek(SeekFrom::Current(i64::from(content) - 1024 + i64::from(children)))?;
                }
                _ => {
                    reader.seek(SeekFrom::Current(i64::from(content) + i64::from(children)))?;
                }
            }
        }

        let size = size.filter(|s| s.iter().all(|&d| d > 0)).ok_or(VoxError::MissingChunk("SIZE"))?;
        if size.iter().any(|&d| d > MAX_MODEL_SIZE) {
            return Err(VoxError::InvalidFormat(format!("model size {size:?} exceeds {MAX_MODEL_SIZE} per axis")));
        }
        let voxels = voxels.ok_or(VoxError::MissingChunk("XYZI"))?;
        if let Some(v) =
            voxels.iter().find(|v| u32::from(v.x) >= size[0] || u32::from(v.y) >= size[1] || u32::from(v.z) >= size[2])
        {
            return Err(VoxError::VoxelOutOfBounds { x: v.x, y: v.y, z: v.z, size });
        }

        tracing::debug!(name = %name, voxels = voxels.len(), version, "vox file parsed");
        Ok(VoxFile { name, size, voxels, palette })
    }

    fn read_u32<R: Read>(reader: &mut R) -> VoxResult<u32> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_id<R: Read>(reader: &mut R) -> VoxResult<[u8; 4]> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(buf)
    }
}
