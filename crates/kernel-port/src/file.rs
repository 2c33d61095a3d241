//! File ports: an OS file opened for reading or writing (spec §6 "File
//! ports wrap an OS file"). Input uses a `BufReader` so `peek_char` can
//! look at the next character without consuming it (`BufRead::fill_buf`
//! doesn't advance the cursor); output uses a `BufWriter` so byte-at-a-time
//! writes from `write-char`/`write-u8` don't each cost a syscall.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use kernel_gc::object::PortBackend;

enum Backing {
    Read(BufReader<File>),
    Write(BufWriter<File>),
}

pub struct FilePort {
    backing: Backing,
}

impl FilePort {
    pub fn open_read(path: &Path) -> io::Result<Self> {
        Ok(FilePort { backing: Backing::Read(BufReader::new(File::open(path)?)) })
    }

    pub fn open_write(path: &Path, append: bool) -> io::Result<Self> {
        let file = OpenOptions::new().write(true).create(true).append(append).truncate(!append).open(path)?;
        Ok(FilePort { backing: Backing::Write(BufWriter::new(file)) })
    }
}

/// How many continuation bytes follow a UTF-8 leading byte.
fn utf8_extra_len(lead: u8) -> usize {
    if lead < 0x80 {
        0
    } else if lead & 0xE0 == 0xC0 {
        1
    } else if lead & 0xF0 == 0xE0 {
        2
    } else if lead & 0xF8 == 0xF0 {
        3
    } else {
        0
    }
}

impl PortBackend for FilePort {
    fn read_char(&mut self) -> io::Result<Option<char>> {
        match &mut self.backing {
            Backing::Read(r) => read_char_from(r),
            Backing::Write(_) => Err(io::Error::new(io::ErrorKind::Other, "not an input port")),
        }
    }

    fn peek_char(&mut self) -> io::Result<Option<char>> {
        match &mut self.backing {
            Backing::Read(r) => {
                let buf = r.fill_buf()?;
                if buf.is_empty() {
                    return Ok(None);
                }
                let len = 1 + utf8_extra_len(buf[0]);
                let bytes = &buf[..len.min(buf.len())];
                Ok(std::str::from_utf8(bytes).ok().and_then(|s| s.chars().next()))
            }
            Backing::Write(_) => Err(io::Error::new(io::ErrorKind::Other, "not an input port")),
        }
    }

    fn write_char(&mut self, ch: char) -> io::Result<()> {
        match &mut self.backing {
            Backing::Write(w) => {
                let mut buf = [0u8; 4];
                w.write_all(ch.encode_utf8(&mut buf).as_bytes())
            }
            Backing::Read(_) => Err(io::Error::new(io::ErrorKind::Other, "not an output port")),
        }
    }

    fn write_u8(&mut self, byte: u8) -> io::Result<()> {
        match &mut self.backing {
            Backing::Write(w) => w.write_all(&[byte]),
            Backing::Read(_) => Err(io::Error::new(io::ErrorKind::Other, "not an output port")),
        }
    }

    fn read_u8(&mut self) -> io::Result<Option<u8>> {
        match &mut self.backing {
            Backing::Read(r) => {
                let mut buf = [0u8; 1];
                match r.read(&mut buf)? {
                    0 => Ok(None),
                    _ => Ok(Some(buf[0])),
                }
            }
            Backing::Write(_) => Err(io::Error::new(io::ErrorKind::Other, "not an input port")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.backing {
            Backing::Write(w) => w.flush(),
            Backing::Read(_) => Ok(()),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}

fn read_char_from(r: &mut BufReader<File>) -> io::Result<Option<char>> {
    let buf = r.fill_buf()?;
    if buf.is_empty() {
        return Ok(None);
    }
    let len = (1 + utf8_extra_len(buf[0])).min(buf.len());
    let mut bytes = [0u8; 4];
    bytes[..len].copy_from_slice(&buf[..len]);
    let c = std::str::from_utf8(&bytes[..len]).ok().and_then(|s| s.chars().next());
    r.consume(len);
    Ok(c)
}
