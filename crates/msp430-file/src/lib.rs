//! `msp430_file` is a thin crate to manipulate files.
//!
//! The toolchain built on top of this crate is a batch process (see the
//! top-level design notes on concurrency): every tool reads its inputs once,
//! computes, and writes its outputs, with no suspension points. This crate
//! therefore exposes a synchronous [`FileReader`] rather than the
//! asynchronous reader a multi-file, long-running service would want.

#![deny(unused)]
#![deny(warnings)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_rust_codeblocks)]

use std::{
    fs,
    io::{Read, Result},
    path::Path,
};

/// Define what a file reader should look like.
pub trait FileReader: Sized {
    /// Open a file.
    fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>;

    /// Read the entire file content.
    fn read_as_bytes(self) -> Result<Vec<u8>>;

    /// Read the entire file content as UTF-8 text.
    fn read_as_string(self) -> Result<String>;
}

/// A file reader based on the standard library's file system calls.
pub struct File {
    inner: fs::File,
}

impl FileReader for File {
    fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        Ok(Self { inner: fs::File::open(path)? })
    }

    fn read_as_bytes(mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.inner.read_to_end(&mut buffer)?;

        Ok(buffer)
    }

    fn read_as_string(self) -> Result<String> {
        let bytes = self.read_as_bytes()?;

        String::from_utf8(bytes)
            .map_err(|error| std::io::Error::new(std::io::ErrorKind::InvalidData, error))
    }
}

/// File picker.
///
/// This type opens a file path with the default file reader. It exists as a
/// single indirection point so a different backend can be slotted in without
/// touching call sites.
pub struct Picker;

impl Picker {
    /// Open a file by using [`File`].
    pub fn open<P>(path: P) -> Result<File>
    where
        P: AsRef<Path>,
    {
        File::open(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picker() -> Result<()> {
        let file = Picker::open("tests/hello.txt")?;
        let content = file.read_as_bytes()?;

        assert_eq!(content, b"abcdef"[..]);

        Ok(())
    }
}
