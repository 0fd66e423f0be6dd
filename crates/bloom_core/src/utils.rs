use crate::errors::{BloomError, Result};
use byteorder::{LittleEndian as LE, WriteBytesExt};
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::debug;

pub fn write_u64<W: Write>(w: &mut W, v: u64) -> io::Result<()> { w.write_u64::<LE>(v) }
pub fn write_u16<W: Write>(w: &mut W, v: u16) -> io::Result<()> { w.write_u16::<LE>(v) }
pub fn write_f64<W: Write>(w: &mut W, v: f64) -> io::Result<()> { w.write_f64::<LE>(v) }

/// A failed load read reports the step it was on, whether the source ran
/// out or the read itself failed.
pub fn read_failed(e: io::Error, step: BloomError) -> BloomError {
    if e.kind() != io::ErrorKind::UnexpectedEof {
        debug!(error = %e, code = step.code(), "read failed");
    }
    step
}

/// `read_exact`, but a failed read becomes `step` instead of an I/O error.
pub fn read_exact_or<R: Read>(r: &mut R, buf: &mut [u8], step: BloomError) -> Result<()> {
    r.read_exact(buf).map_err(|e| read_failed(e, step))
}

/// Opens `path` for reading, telling a missing file apart from other failures.
pub fn open_read(path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => BloomError::MissingFile { path: path.to_path_buf() },
        _ => BloomError::Open { path: path.to_path_buf(), source: e },
    })
}

/// Directory holding `path`; `.` for a bare file name.
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

#[cfg(unix)]
pub fn fsync_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    let dir = parent_dir(path);
    let f = std::fs::OpenOptions::new().read(true).custom_flags(libc::O_DIRECTORY).open(dir)?;
    f.sync_all()
}
#[cfg(not(unix))]
pub fn fsync_dir(_path: &Path) -> io::Result<()> { Ok(()) }

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn short_read_maps_to_given_error() {
        let mut r = Cursor::new(vec![1u8, 2, 3]);
        let mut buf = [0u8; 4];
        let err = read_exact_or(&mut r, &mut buf, BloomError::MagicShort).unwrap_err();
        assert!(matches!(err, BloomError::MagicShort));
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "device gone"))
        }
    }

    #[test]
    fn failed_read_reports_its_step() {
        let mut buf = [0u8; 2];
        let err = read_exact_or(&mut Broken, &mut buf, BloomError::SizeFieldShort).unwrap_err();
        assert_eq!(err.code(), 6);
    }

    #[test]
    fn missing_file_is_distinct() {
        let tmp = tempfile::tempdir().unwrap();
        let err = open_read(&tmp.path().join("nope")).unwrap_err();
        assert!(matches!(err, BloomError::MissingFile { .. }));
    }

    #[test]
    fn little_endian_fields() {
        let mut out = Vec::new();
        write_u16(&mut out, 44).unwrap();
        write_u64(&mut out, 1).unwrap();
        write_f64(&mut out, 0.5).unwrap();
        assert_eq!(&out[..10], &[44, 0, 1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&out[10..], &0.5f64.to_le_bytes());
    }

    #[test]
    fn bare_file_name_lives_in_cwd() {
        assert_eq!(parent_dir(Path::new("f.blm")), Path::new("."));
        assert_eq!(parent_dir(Path::new("a/f.blm")), Path::new("a"));
    }
}
