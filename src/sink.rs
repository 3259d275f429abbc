use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use http::{Method, StatusCode};

use crate::error::Error;

const CHUNK_SIZE: usize = 8192;

/// Where the body of one attempt goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ResponseSink<'a> {
    /// HEAD responses carry no body.
    Discard,
    /// A `200` with a save path streams straight to disk.
    File(&'a Path),
    Memory,
}

impl<'a> ResponseSink<'a> {
    pub(crate) fn select(method: &Method, save_path: Option<&'a Path>, status: StatusCode) -> Self {
        if *method == Method::HEAD {
            return Self::Discard;
        }
        match save_path {
            Some(path) if status == StatusCode::OK => Self::File(path),
            _ => Self::Memory,
        }
    }

    pub(crate) fn consume<R, F>(self, reader: &mut R, map_read_error: F) -> crate::Result<SinkOutput>
    where
        R: Read + ?Sized,
        F: Fn(std::io::Error) -> Error,
    {
        match self {
            Self::Discard => Ok(SinkOutput::Discarded),
            Self::Memory => {
                let mut collected = Vec::new();
                reader
                    .read_to_end(&mut collected)
                    .map_err(&map_read_error)?;
                Ok(SinkOutput::Buffered(Bytes::from(collected)))
            }
            Self::File(path) => {
                stream_to_file(reader, path, &map_read_error)?;
                Ok(SinkOutput::Saved(path.to_path_buf()))
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum SinkOutput {
    Discarded,
    Buffered(Bytes),
    Saved(PathBuf),
}

impl SinkOutput {
    pub(crate) fn into_parts(self) -> (Option<Bytes>, Option<PathBuf>) {
        match self {
            Self::Discarded => (None, None),
            Self::Buffered(body) => (Some(body), None),
            Self::Saved(path) => (None, Some(path)),
        }
    }
}

/// The directory a save path points into must exist before any attempt runs.
pub(crate) fn ensure_parent_directory(path: &Path) -> crate::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return Ok(()),
    };
    if parent.is_dir() {
        Ok(())
    } else {
        Err(Error::MissingParentDirectory {
            path: path.to_path_buf(),
        })
    }
}

fn stream_to_file<R, F>(reader: &mut R, path: &Path, map_read_error: &F) -> crate::Result<u64>
where
    R: Read + ?Sized,
    F: Fn(std::io::Error) -> Error,
{
    let save_error = |source| Error::SaveFile {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::create(path).map_err(save_error)?;
    let mut chunk = [0_u8; CHUNK_SIZE];
    let mut written = 0_u64;

    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => read,
            Err(error) if error.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(map_read_error(error)),
        };
        file.write_all(&chunk[..read]).map_err(save_error)?;
        written = written.saturating_add(read as u64);
    }

    file.flush().map_err(save_error)?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};
    use std::path::Path;

    use bytes::Bytes;
    use http::{Method, StatusCode};

    use super::{ResponseSink, SinkOutput, ensure_parent_directory};
    use crate::error::Error;

    fn read_error(source: std::io::Error) -> Error {
        Error::ReadBody {
            method: Method::GET,
            uri: "http://example.com/".to_owned(),
            source: Box::new(source),
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::ConnectionReset))
        }
    }

    #[test]
    fn head_never_reads_a_body() {
        let path = Path::new("out.bin");
        assert_eq!(
            ResponseSink::select(&Method::HEAD, Some(path), StatusCode::OK),
            ResponseSink::Discard
        );
    }

    #[test]
    fn file_sink_only_for_200_with_save_path() {
        let path = Path::new("out.bin");
        assert_eq!(
            ResponseSink::select(&Method::GET, Some(path), StatusCode::OK),
            ResponseSink::File(path)
        );
        assert_eq!(
            ResponseSink::select(&Method::POST, Some(path), StatusCode::NOT_FOUND),
            ResponseSink::Memory
        );
        assert_eq!(
            ResponseSink::select(&Method::GET, None, StatusCode::OK),
            ResponseSink::Memory
        );
    }

    #[test]
    fn memory_sink_buffers_whole_body() {
        let mut reader = Cursor::new(b"payload".to_vec());
        let output = ResponseSink::Memory
            .consume(&mut reader, read_error)
            .expect("buffered body");
        assert_eq!(output, SinkOutput::Buffered(Bytes::from_static(b"payload")));
    }

    #[test]
    fn file_sink_writes_exact_bytes() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("download.bin");
        let payload: Vec<u8> = (0..20_000_u32).map(|value| (value % 251) as u8).collect();

        let output = ResponseSink::File(&path)
            .consume(&mut Cursor::new(payload.clone()), read_error)
            .expect("saved body");

        assert_eq!(output.into_parts(), (None, Some(path.clone())));
        assert_eq!(std::fs::read(&path).expect("read saved file"), payload);
    }

    #[test]
    fn read_failures_are_mapped_by_caller() {
        let error = ResponseSink::Memory
            .consume(&mut FailingReader, read_error)
            .expect_err("read should fail");
        assert!(matches!(error, Error::ReadBody { .. }));
        assert!(error.is_retryable());
    }

    #[test]
    fn parent_directory_must_exist() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(ensure_parent_directory(&dir.path().join("file.txt")).is_ok());
        assert!(ensure_parent_directory(Path::new("relative.txt")).is_ok());

        let missing = dir.path().join("missing").join("file.txt");
        let error = ensure_parent_directory(&missing).expect_err("parent is missing");
        assert!(matches!(error, Error::MissingParentDirectory { path } if path == missing));
    }
}
